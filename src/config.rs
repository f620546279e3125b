//! Configuration for getty.
//!
//! Settings come from an optional TOML file, `/etc/getty.toml` unless the
//! `GETTY_CONFIG` environment variable names another path. Every field has a
//! built-in default. A missing file means "use defaults"; a malformed one is
//! reported to the caller, which falls back to defaults once logging is up.
//!
//! ```toml
//! # Banner shown before the prompt
//! issue_path = "/etc/issue"
//!
//! # Programs started once a name has been entered
//! login_path = "/bin/login"
//! shell_path = "/bin/sh"
//!
//! # Prefix for TTY arguments
//! dev_dir = "/dev/"
//!
//! # Speed when none is given on the command line
//! default_speed = 38400
//!
//! # Username buffer size, including the terminator
//! name_capacity = 30
//!
//! log_path = "/var/log/getty.log"
//! ignored_signals = ["SIGHUP", "SIGINT", "SIGQUIT"]
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::core::prompt::DEFAULT_CAPACITY;
use crate::core::speed::LineSpeed;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/getty.toml";
pub const DEFAULT_ISSUE_PATH: &str = "/etc/issue";
pub const DEFAULT_LOGIN_PATH: &str = "/bin/login";
pub const DEFAULT_SHELL_PATH: &str = "/bin/sh";
pub const DEFAULT_DEV_DIR: &str = "/dev/";
pub const DEFAULT_LOG_PATH: &str = "/var/log/getty.log";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Main configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Banner-definition file
    pub issue_path: PathBuf,
    /// Login program
    pub login_path: PathBuf,
    /// Shell used if login cannot be started
    pub shell_path: PathBuf,
    /// Device directory prefix for TTY arguments
    pub dev_dir: PathBuf,
    /// Baud rate used when no SPEED argument is given
    pub default_speed: u64,
    /// Username buffer size, one slot of which is the terminator
    pub name_capacity: usize,
    /// Log file; logging is off if it cannot be opened
    pub log_path: PathBuf,
    /// Signals ignored while the prompt is up
    pub ignored_signals: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            issue_path: PathBuf::from(DEFAULT_ISSUE_PATH),
            login_path: PathBuf::from(DEFAULT_LOGIN_PATH),
            shell_path: PathBuf::from(DEFAULT_SHELL_PATH),
            dev_dir: PathBuf::from(DEFAULT_DEV_DIR),
            default_speed: 38400,
            name_capacity: DEFAULT_CAPACITY,
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
            ignored_signals: vec![
                "SIGHUP".to_string(),
                "SIGINT".to_string(),
                "SIGQUIT".to_string(),
            ],
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::get_config_path())
    }

    /// Load `path`; a file that does not exist yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Get config file path
    fn get_config_path() -> PathBuf {
        std::env::var_os("GETTY_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    /// Speed to use without a SPEED argument.
    pub fn default_line_speed(&self) -> LineSpeed {
        let speed = LineSpeed::resolve(&self.default_speed.to_string());
        if speed.is_usable() {
            speed
        } else {
            warn!("Configured default speed {} unusable, using 38400", self.default_speed);
            LineSpeed::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn test_partial_config() {
        let config = Config::parse(
            r#"
            issue_path = "/etc/issue.net"
            default_speed = 115200
            ignored_signals = ["SIGINT"]
            "#,
        )
        .unwrap();
        assert_eq!(config.issue_path, PathBuf::from("/etc/issue.net"));
        assert_eq!(config.default_line_speed(), LineSpeed::B115200);
        assert_eq!(config.ignored_signals, vec!["SIGINT".to_string()]);
        assert_eq!(config.login_path, PathBuf::from(DEFAULT_LOGIN_PATH));
        assert_eq!(config.name_capacity, 30);
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        assert!(Config::parse("default_speed = \"fast\"").is_err());
        assert!(Config::parse("[[[[").is_err());
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("getty.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_malformed_file_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("getty.toml");
        fs::write(&path, "default_speed = \"fast\"").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().starts_with(&format!("malformed config {}", path.display())));
    }

    #[test]
    fn test_unusable_default_speed_falls_back() {
        let config = Config::parse("default_speed = 0").unwrap();
        assert_eq!(config.default_line_speed(), LineSpeed::B38400);
        let config = Config::parse("default_speed = 12345").unwrap();
        assert_eq!(config.default_line_speed(), LineSpeed::B38400);
    }
}
