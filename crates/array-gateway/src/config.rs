// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Load gateway connection settings and operation rule overrides.
// Author: Lukas Bower

//! Gateway configuration.
//!
//! Settings come from a TOML file, then `ARRAY_GATEWAY_HOST` and
//! `ARRAY_GATEWAY_PORT` override the server address. Rules under
//! `[operations.<name>]` replace the matching standard rule.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use log::debug;
use serde::Deserialize;

use crate::transport::TcpTransport;
use crate::validate::OperationTable;
use crate::{Gateway, TransportError};

/// Environment variable overriding the server host.
pub const HOST_ENV: &str = "ARRAY_GATEWAY_HOST";
/// Environment variable overriding the server port.
pub const PORT_ENV: &str = "ARRAY_GATEWAY_PORT";

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 5555;
const DEFAULT_IO_TIMEOUT_MS: u64 = 30_000;

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        /// File that was read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The file was not valid TOML for the schema.
    #[error("invalid config TOML: {0}")]
    Toml(#[from] toml::de::Error),
    /// An environment override did not parse.
    #[error("invalid {key} value '{value}': {reason}")]
    Env {
        /// Variable name.
        key: &'static str,
        /// Raw value.
        value: String,
        /// Parse failure.
        reason: String,
    },
}

/// Address and timeout of the array server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ServerConfig {
    /// Server host name or address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Socket read/write timeout in milliseconds; `0` disables it.
    pub io_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_owned(),
            port: DEFAULT_PORT,
            io_timeout_ms: DEFAULT_IO_TIMEOUT_MS,
        }
    }
}

impl ServerConfig {
    /// Socket timeout, `None` when disabled.
    #[must_use]
    pub fn io_timeout(&self) -> Option<Duration> {
        (self.io_timeout_ms > 0).then(|| Duration::from_millis(self.io_timeout_ms))
    }
}

/// Complete gateway configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct GatewayConfig {
    /// Server connection settings.
    pub server: ServerConfig,
    /// Rules replacing standard ones, keyed by operation name.
    pub operations: Option<OperationTable>,
}

impl GatewayConfig {
    /// Configuration for `host:port` with default timeout and rules.
    #[must_use]
    pub fn for_server(host: impl Into<String>, port: u16) -> Self {
        Self {
            server: ServerConfig {
                host: host.into(),
                port,
                ..ServerConfig::default()
            },
            operations: None,
        }
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Read configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&contents)?;
        debug!("loaded gateway config from {}", path.display());
        Ok(config)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| env::var(key).ok())
    }

    /// Apply overrides from `lookup`; blank values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = non_blank(lookup(HOST_ENV)) {
            self.server.host = host;
        }
        if let Some(port) = parse_override::<u16>(PORT_ENV, lookup(PORT_ENV))? {
            self.server.port = port;
        }
        Ok(())
    }

    /// Standard rules with any configured overrides applied.
    #[must_use]
    pub fn operation_table(&self) -> OperationTable {
        match &self.operations {
            Some(overrides) => OperationTable::standard().merged(overrides),
            None => OperationTable::standard(),
        }
    }

    /// Open a TCP gateway to the configured server.
    pub fn connect(&self) -> Result<Gateway<TcpTransport>, TransportError> {
        let transport =
            TcpTransport::connect(&self.server.host, self.server.port, self.server.io_timeout())?;
        Ok(Gateway::with_table(transport, self.operation_table()))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_owned())
        .filter(|trimmed| !trimmed.is_empty())
}

fn parse_override<T>(key: &'static str, value: Option<String>) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match non_blank(value) {
        None => Ok(None),
        Some(trimmed) => trimmed.parse::<T>().map(Some).map_err(|err| ConfigError::Env {
            key,
            reason: err.to_string(),
            value: trimmed,
        }),
    }
}
