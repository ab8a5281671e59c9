// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Measure or verify bigint array transfers against an array server.
// Author: Lukas Bower

use std::process::ExitCode;

use anyhow::{Context, Result};
use array_gateway::{
    check_bigint_transfer, time_bigint_transfer, GatewayConfig, MaxBits, TimingReport,
    TransferReport,
};
use clap::Parser;
use env_logger::Env;
use log::{info, LevelFilter};

/// Measure the performance of transferring bigint arrays.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Hostname of the array server.
    hostname: String,
    /// Port of the array server.
    port: u16,
    /// Problem size: length of array.
    #[arg(short = 'n', long, default_value_t = 1_000_000)]
    size: usize,
    /// Number of times to run the benchmark.
    #[arg(short = 't', long, default_value_t = 6)]
    trials: usize,
    /// Maximum number of bits; larger values wrap around. -1 means no maximum.
    #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
    max_bits: i64,
    /// Only check correctness, not performance.
    #[arg(long)]
    correctness_only: bool,
    /// Value to initialise the random number generator.
    #[arg(short = 's', long)]
    seed: Option<u64>,
    /// Optional gateway config file; the positional address still wins.
    #[arg(long)]
    config: Option<std::path::PathBuf>,
    /// Enable debug logging.
    #[arg(long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    let mut builder =
        env_logger::Builder::from_env(Env::default().default_filter_or(default_level.as_str()));
    builder.format_timestamp_millis();
    let _ = builder.try_init();
}

/// Format `value` with comma thousands separators.
fn group_thousands(value: usize) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn print_correctness(report: &TransferReport) {
    match report.first_mismatch {
        None => println!(
            "bigint transfer correct: {} values, max_bits = {}",
            group_thousands(report.size),
            report.max_bits
        ),
        Some(index) => println!(
            "bigint transfer FAILED: {} of {} values differ, first at index {index}",
            report.mismatches,
            group_thousands(report.size)
        ),
    }
}

fn print_timing(report: &TimingReport) {
    println!(
        "Average bigint upload time = {:.4} sec",
        report.avg_upload.as_secs_f64()
    );
    println!("Average bigint upload rate = {:.4} GiB/sec", report.upload_rate());
    println!(
        "Average bigint download time = {:.4} sec",
        report.avg_download.as_secs_f64()
    );
    println!(
        "Average bigint download rate = {:.4} GiB/sec",
        report.download_rate()
    );
}

fn run(args: &Args) -> Result<bool> {
    let mut config = match &args.config {
        Some(path) => GatewayConfig::load(path)?,
        None => GatewayConfig::default(),
    };
    config.server.host = args.hostname.clone();
    config.server.port = args.port;
    let max_bits = MaxBits::from_wire(args.max_bits).context("invalid --max-bits")?;
    let mut gateway = config
        .connect()
        .with_context(|| format!("failed to connect to {}:{}", args.hostname, args.port))?;
    info!("connected to {}:{}", args.hostname, args.port);

    if args.correctness_only {
        let report = check_bigint_transfer(&mut gateway, args.size, args.seed, max_bits)
            .context("correctness check failed to run")?;
        print_correctness(&report);
        return Ok(report.passed());
    }

    println!("array size = {}", group_thousands(args.size));
    println!("number of trials = {}", args.trials);
    let report = time_bigint_transfer(&mut gateway, args.size, args.trials, args.seed, max_bits)
        .context("timed transfer failed")?;
    print_timing(&report);
    Ok(true)
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    init_logging(args.verbose);
    if run(&args)? {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use array_server_mock::{spawn, MockArrayServer};

    #[test]
    fn thousands_are_grouped() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1_000), "1,000");
        assert_eq!(group_thousands(1_000_000), "1,000,000");
        assert_eq!(group_thousands(12_345_678), "12,345,678");
    }

    #[test]
    fn flags_follow_the_benchmark_interface() {
        let args = Args::try_parse_from([
            "bench", "node7", "5555", "-n", "100", "-t", "2", "--max-bits", "-1", "-s", "9",
            "--correctness-only",
        ])
        .unwrap();
        assert_eq!(args.hostname, "node7");
        assert_eq!(args.port, 5555);
        assert_eq!(args.size, 100);
        assert_eq!(args.trials, 2);
        assert_eq!(args.max_bits, -1);
        assert_eq!(args.seed, Some(9));
        assert!(args.correctness_only);

        let defaults = Args::try_parse_from(["bench", "localhost", "5555"]).unwrap();
        assert_eq!(defaults.size, 1_000_000);
        assert_eq!(defaults.trials, 6);
        assert_eq!(defaults.max_bits, -1);
        assert!(defaults.seed.is_none());
    }

    #[test]
    fn run_against_mock_server() {
        let (addr, _thread) = spawn("127.0.0.1:0", Arc::new(MockArrayServer::new())).unwrap();
        let port = addr.port().to_string();
        let base = ["bench", "127.0.0.1", port.as_str(), "-n", "40", "-t", "2", "-s", "1"];

        let timed = Args::try_parse_from(base).unwrap();
        assert!(run(&timed).unwrap());

        let mut check = base.to_vec();
        check.extend(["--max-bits", "72", "--correctness-only"]);
        assert!(run(&Args::try_parse_from(check).unwrap()).unwrap());
    }
}
