//! Server configuration
//!
//! # Environment variables
//!
//! | Variable | Default | Purpose |
//! |----------|---------|---------|
//! | WORK_DIR | ./work_dir | Database and log files |
//! | HTTP_PORT | 3000 | HTTP API port |
//! | HOLD_TTL_SECS | 300 | TTL for uncommitted slot holds |
//! | SWEEP_INTERVAL_SECS | 60 | Period of the hold-expiry sweep |
//! | CATALOG_PATH | (unset) | JSON seed file with consultants |
//! | LOG_LEVEL | info | Default tracing level |
//! | ENVIRONMENT | development | development \| staging \| production |

use std::path::PathBuf;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory for database and logs
    pub work_dir: String,
    /// HTTP API port
    pub http_port: u16,
    /// TTL for uncommitted slot holds, seconds
    pub hold_ttl_secs: u64,
    /// Period of the hold-expiry sweep, seconds
    pub sweep_interval_secs: u64,
    /// JSON seed file with the consultant directory
    pub catalog_path: Option<String>,
    /// Default tracing level when RUST_LOG is unset
    pub log_level: String,
    /// Running environment: development | staging | production
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./work_dir".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            hold_ttl_secs: std::env::var("HOLD_TTL_SECS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(crate::booking::DEFAULT_HOLD_TTL_SECS),
            sweep_interval_secs: std::env::var("SWEEP_INTERVAL_SECS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(60),
            catalog_path: std::env::var("CATALOG_PATH").ok(),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
        }
    }

    /// Directory holding the redb database file
    pub fn database_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("database")
    }

    /// Directory holding rotated log files
    pub fn logs_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }

    /// Create the work directory layout if missing
    pub fn ensure_work_dir_structure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.database_dir())?;
        std::fs::create_dir_all(self.logs_dir())?;
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_layout() {
        let config = Config {
            work_dir: "/tmp/consult-test".to_string(),
            http_port: 3000,
            hold_ttl_secs: 300,
            sweep_interval_secs: 60,
            catalog_path: None,
            log_level: "info".to_string(),
            environment: "development".to_string(),
        };
        assert_eq!(
            config.database_dir(),
            PathBuf::from("/tmp/consult-test/database")
        );
        assert_eq!(config.logs_dir(), PathBuf::from("/tmp/consult-test/logs"));
        assert!(config.is_development());
        assert!(!config.is_production());
    }
}
