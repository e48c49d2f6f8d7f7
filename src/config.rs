// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Hilum

//! # Runtime Configuration
//!
//! Environment variable names and default values, loaded once at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DATA_DIR` | Directory holding the encrypted kiosk database | `/data` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `BOOKING_API_BASE_URL` | Booking service API root | staging instance |
//! | `IDLE_TIMEOUT_SECS` | Idle countdown before returning home | `45` |
//! | `KEEP_ALIVE_TIMEOUT_SECS` | "Are you still there?" countdown | `120` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

/// Environment variable name for the kiosk data directory.
///
/// The encrypted clinic database lives at `<DATA_DIR>/kiosk.redb`.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

const DEFAULT_DATA_DIR: &str = "/data";
const DEFAULT_BOOKING_API_BASE_URL: &str = "https://staging.telelink.wosler.ca/api/";

/// Resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct KioskConfig {
    pub data_dir: PathBuf,
    pub host: String,
    pub port: u16,
    pub booking_api_base_url: String,
    pub idle_timeout: Duration,
    pub keep_alive_timeout: Duration,
}

impl KioskConfig {
    pub fn from_env() -> Self {
        Self {
            data_dir: PathBuf::from(env_or(DATA_DIR_ENV, DEFAULT_DATA_DIR)),
            host: env_or("HOST", "0.0.0.0"),
            port: parsed_env_or("PORT", 8080),
            booking_api_base_url: env_or("BOOKING_API_BASE_URL", DEFAULT_BOOKING_API_BASE_URL),
            idle_timeout: Duration::from_secs(parsed_env_or("IDLE_TIMEOUT_SECS", 45)),
            keep_alive_timeout: Duration::from_secs(parsed_env_or("KEEP_ALIVE_TIMEOUT_SECS", 120)),
        }
    }

    /// Path of the encrypted kiosk database.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("kiosk.redb")
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parsed_env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(value) => value.parse().unwrap_or_else(|_| {
            warn!("invalid {key} value {value:?}, using default");
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_environment() {
        // Only inspect keys this test does not set; other tests may mutate
        // the process environment concurrently.
        let config = KioskConfig::from_env();
        assert_eq!(config.idle_timeout, Duration::from_secs(45));
        assert_eq!(config.keep_alive_timeout, Duration::from_secs(120));
        assert!(config.database_path().ends_with("kiosk.redb"));
    }
}
