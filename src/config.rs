//! Configuration management for the phonebook repository.
//!
//! This module handles loading and validating configuration from environment variables.
//! A `.env` file is honoured if present; nothing is printed to stdout, which the MCP
//! server uses for protocol traffic.

use crate::domain::validate_group_name;
use crate::error::{ConfigError, ConfigResult};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default storage directory (matches the container volume).
pub const DEFAULT_PHONEBOOK_DIR: &str = "/app/data";

/// Default phonebook file name inside the storage directory.
pub const DEFAULT_PHONEBOOK_FILENAME: &str = "rem.xml";

/// Default bucket for imported rows with a blank department.
pub const DEFAULT_UNGROUPED_GROUP: &str = "Ungrouped";

/// What an import does with a row that has a name or number but no department.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UngroupedPolicy {
    /// Put the row into the named group.
    Bucket(String),
    /// Fail the whole import with `MissingGroup`.
    Reject,
}

impl Default for UngroupedPolicy {
    fn default() -> Self {
        Self::Bucket(DEFAULT_UNGROUPED_GROUP.to_string())
    }
}

/// Configuration for the phonebook repository and server.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the phonebook file (default: /app/data)
    pub phonebook_dir: PathBuf,

    /// Phonebook file name inside the directory (default: rem.xml)
    pub phonebook_filename: String,

    /// How long a writer waits for the file lock, in milliseconds (default: 5000)
    pub lock_timeout_ms: u64,

    /// Handling of imported rows with a blank department (default: bucket "Ungrouped")
    pub ungrouped_policy: UngroupedPolicy,

    /// JSON file remembering the directory chosen at runtime
    pub settings_file: Option<PathBuf>,

    /// Log level (default: "info")
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Optional environment variables:
    /// - `PHONEBOOK_DIR`: storage directory (default: /app/data)
    /// - `PHONEBOOK_FILENAME`: file name, no path separators (default: rem.xml)
    /// - `PHONEBOOK_LOCK_TIMEOUT_MS`: writer lock timeout (default: 5000)
    /// - `PHONEBOOK_UNGROUPED_POLICY`: `bucket` or `reject` (default: bucket)
    /// - `PHONEBOOK_UNGROUPED_GROUP`: bucket for department-less import rows (default: Ungrouped)
    /// - `PHONEBOOK_SETTINGS_FILE`: where a runtime directory change is saved
    /// - `LOG_LEVEL`: logging level (default: "info")
    pub fn from_env() -> ConfigResult<Self> {
        // Try to load .env file if it exists (but don't fail if it doesn't)
        let _ = dotenvy::dotenv();

        let phonebook_dir = env::var("PHONEBOOK_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_PHONEBOOK_DIR));
        if phonebook_dir.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                var: "PHONEBOOK_DIR".to_string(),
                reason: "Cannot be empty".to_string(),
            });
        }

        let phonebook_filename = env::var("PHONEBOOK_FILENAME")
            .unwrap_or_else(|_| DEFAULT_PHONEBOOK_FILENAME.to_string());
        Self::validate_filename(&phonebook_filename)?;

        let lock_timeout_ms = Self::parse_env_u64("PHONEBOOK_LOCK_TIMEOUT_MS", 5000)?;

        let ungrouped_policy = Self::parse_ungrouped_policy()?;

        let settings_file = env::var("PHONEBOOK_SETTINGS_FILE")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Config {
            phonebook_dir,
            phonebook_filename,
            lock_timeout_ms,
            ungrouped_policy,
            settings_file,
            log_level,
        })
    }

    /// Writer lock timeout as a duration.
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    fn parse_ungrouped_policy() -> ConfigResult<UngroupedPolicy> {
        let policy = env::var("PHONEBOOK_UNGROUPED_POLICY").unwrap_or_else(|_| "bucket".to_string());
        match policy.trim().to_lowercase().as_str() {
            "reject" => Ok(UngroupedPolicy::Reject),
            "bucket" => {
                let name = env::var("PHONEBOOK_UNGROUPED_GROUP")
                    .map(|name| name.trim().to_string())
                    .unwrap_or_else(|_| DEFAULT_UNGROUPED_GROUP.to_string());
                validate_group_name(&name).map_err(|e| ConfigError::InvalidValue {
                    var: "PHONEBOOK_UNGROUPED_GROUP".to_string(),
                    reason: e.to_string(),
                })?;
                Ok(UngroupedPolicy::Bucket(name))
            }
            other => Err(ConfigError::InvalidValue {
                var: "PHONEBOOK_UNGROUPED_POLICY".to_string(),
                reason: format!("Must be 'bucket' or 'reject', got: {}", other),
            }),
        }
    }

    /// The file name must name a file directly inside the storage directory.
    fn validate_filename(name: &str) -> ConfigResult<()> {
        let reason = if name.trim().is_empty() {
            Some("Cannot be empty")
        } else if name.contains('/') || name.contains('\\') {
            Some("Must be a bare file name without path separators")
        } else if name == "." || name == ".." {
            Some("Must name a file")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(ConfigError::InvalidValue {
                var: "PHONEBOOK_FILENAME".to_string(),
                reason: reason.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Parse an environment variable as u64 with a default value.
    fn parse_env_u64(var_name: &str, default: u64) -> ConfigResult<u64> {
        match env::var(var_name) {
            Ok(val) => val.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                var: var_name.to_string(),
                reason: format!("Must be a positive number, got: {}", val),
            }),
            Err(_) => Ok(default),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            phonebook_dir: PathBuf::from(DEFAULT_PHONEBOOK_DIR),
            phonebook_filename: DEFAULT_PHONEBOOK_FILENAME.to_string(),
            lock_timeout_ms: 5000,
            ungrouped_policy: UngroupedPolicy::default(),
            settings_file: None,
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    const VARS: [&str; 7] = [
        "PHONEBOOK_DIR",
        "PHONEBOOK_FILENAME",
        "PHONEBOOK_LOCK_TIMEOUT_MS",
        "PHONEBOOK_UNGROUPED_POLICY",
        "PHONEBOOK_UNGROUPED_GROUP",
        "PHONEBOOK_SETTINGS_FILE",
        "LOG_LEVEL",
    ];

    // Helper to set and unset env vars for testing
    struct EnvGuard {
        vars: Vec<String>,
    }

    impl EnvGuard {
        /// Start from a clean slate for every phonebook variable.
        fn new() -> Self {
            for var in VARS {
                env::remove_var(var);
            }
            EnvGuard { vars: Vec::new() }
        }

        fn set(&mut self, key: &str, value: &str) {
            env::set_var(key, value);
            self.vars.push(key.to_string());
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for var in &self.vars {
                env::remove_var(var);
            }
        }
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.phonebook_dir, PathBuf::from("/app/data"));
        assert_eq!(config.phonebook_filename, "rem.xml");
        assert_eq!(config.lock_timeout(), Duration::from_secs(5));
        assert_eq!(
            config.ungrouped_policy,
            UngroupedPolicy::Bucket("Ungrouped".to_string())
        );
    }

    #[test]
    #[serial]
    fn test_config_from_env_defaults() {
        let _guard = EnvGuard::new();
        let config = Config::from_env().unwrap();
        assert_eq!(config.phonebook_filename, "rem.xml");
        assert_eq!(config.lock_timeout_ms, 5000);
    }

    #[test]
    #[serial]
    fn test_config_from_env_valid() {
        let mut guard = EnvGuard::new();
        guard.set("PHONEBOOK_DIR", "/srv/phones");
        guard.set("PHONEBOOK_FILENAME", "RemotePhonebook.xml");
        guard.set("PHONEBOOK_LOCK_TIMEOUT_MS", "250");
        guard.set("PHONEBOOK_UNGROUPED_GROUP", "  No department ");
        guard.set("PHONEBOOK_SETTINGS_FILE", "/etc/phonebook/settings.json");

        let config = Config::from_env().unwrap();
        assert_eq!(config.phonebook_dir, PathBuf::from("/srv/phones"));
        assert_eq!(config.phonebook_filename, "RemotePhonebook.xml");
        assert_eq!(config.lock_timeout(), Duration::from_millis(250));
        assert_eq!(
            config.ungrouped_policy,
            UngroupedPolicy::Bucket("No department".to_string())
        );
        assert_eq!(
            config.settings_file,
            Some(PathBuf::from("/etc/phonebook/settings.json"))
        );
    }

    #[test]
    #[serial]
    fn test_config_rejects_filename_with_separator() {
        let mut guard = EnvGuard::new();
        guard.set("PHONEBOOK_FILENAME", "../escape.xml");

        match Config::from_env() {
            Err(ConfigError::InvalidValue { var, .. }) => assert_eq!(var, "PHONEBOOK_FILENAME"),
            other => panic!("Expected InvalidValue error, got: {:?}", other),
        }
    }

    #[test]
    #[serial]
    fn test_config_rejects_bad_timeout() {
        let mut guard = EnvGuard::new();
        guard.set("PHONEBOOK_LOCK_TIMEOUT_MS", "soon");

        let result = Config::from_env();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { ref var, .. }) if var == "PHONEBOOK_LOCK_TIMEOUT_MS"
        ));
    }

    #[test]
    #[serial]
    fn test_config_ungrouped_policy_reject() {
        let mut guard = EnvGuard::new();
        guard.set("PHONEBOOK_UNGROUPED_POLICY", "Reject");
        assert_eq!(
            Config::from_env().unwrap().ungrouped_policy,
            UngroupedPolicy::Reject
        );

        guard.set("PHONEBOOK_UNGROUPED_POLICY", "merge");
        assert!(Config::from_env().is_err());
    }

    #[test]
    #[serial]
    fn test_config_rejects_overlong_ungrouped_name() {
        let mut guard = EnvGuard::new();
        guard.set("PHONEBOOK_UNGROUPED_GROUP", &"x".repeat(100));
        assert!(Config::from_env().is_err());
    }

    #[test]
    #[serial]
    fn test_parse_env_u64() {
        let mut guard = EnvGuard::new();
        guard.set("TEST_PHONEBOOK_U64", "42");

        assert_eq!(Config::parse_env_u64("TEST_PHONEBOOK_U64", 10).unwrap(), 42);
        assert_eq!(Config::parse_env_u64("NONEXISTENT_PHONEBOOK", 10).unwrap(), 10);
    }
}
