// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Command-line entry point for the mock array server.
// Author: Lukas Bower

use std::net::TcpListener;
use std::sync::Arc;

use anyhow::{Context, Result};
use array_server_mock::{serve, MockArrayServer};
use clap::Parser;
use env_logger::Env;
use log::LevelFilter;

/// Serve the array command set from host memory.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Address to bind.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
    /// Port to bind.
    #[arg(long, default_value_t = 5555)]
    port: u16,
    /// Enable debug logging.
    #[arg(long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let mut builder =
        env_logger::Builder::from_env(Env::default().default_filter_or(default_level.as_str()));
    builder.format_timestamp_millis();
    let _ = builder.try_init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    let listener = TcpListener::bind((args.host.as_str(), args.port))
        .with_context(|| format!("failed to bind {}:{}", args.host, args.port))?;
    serve(listener, Arc::new(MockArrayServer::new())).context("array server stopped")
}
