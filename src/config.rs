//! Configuration management for the Relayboard server

use std::env;
use std::path::PathBuf;

use serde::Deserialize;

use crate::upload::{DEFAULT_RECEIVING_TIMEOUT_SECS, DEFAULT_RETENTION_SECS};

/// Largest accepted text snippet, in bytes.
pub const DEFAULT_TEXT_LIMIT_BYTES: usize = 16 * 1024;

/// How often the background reaper runs.
pub const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 300;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub board: BoardConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding uploaded file bytes, one file per session token.
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BoardConfig {
    /// Seconds a finished upload stays downloadable.
    pub retention_secs: i64,

    /// Seconds before an abandoned receiving session is reaped.
    pub receiving_timeout_secs: i64,

    /// Seconds between reaper runs.
    pub cleanup_interval_secs: u64,

    /// Maximum accepted text snippet size in bytes.
    pub text_limit_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            storage: StorageConfig {
                data_dir: PathBuf::from("./data"),
            },
            board: BoardConfig {
                retention_secs: DEFAULT_RETENTION_SECS,
                receiving_timeout_secs: DEFAULT_RECEIVING_TIMEOUT_SECS,
                cleanup_interval_secs: DEFAULT_CLEANUP_INTERVAL_SECS,
                text_limit_bytes: DEFAULT_TEXT_LIMIT_BYTES,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Config::default();

        Config {
            server: ServerConfig {
                host: env::var("RELAYBOARD_HOST").unwrap_or(defaults.server.host),
                port: env::var("RELAYBOARD_PORT")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.server.port),
            },
            storage: StorageConfig {
                data_dir: env::var("RELAYBOARD_DATA_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.storage.data_dir),
            },
            board: BoardConfig {
                retention_secs: env::var("RELAYBOARD_RETENTION_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.board.retention_secs),
                receiving_timeout_secs: env::var("RELAYBOARD_RECEIVING_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.board.receiving_timeout_secs),
                cleanup_interval_secs: env::var("RELAYBOARD_CLEANUP_INTERVAL_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.board.cleanup_interval_secs),
                text_limit_bytes: env::var("RELAYBOARD_TEXT_LIMIT")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.board.text_limit_bytes),
            },
        }
    }
}
