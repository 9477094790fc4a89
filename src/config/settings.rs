//! User configuration settings
//!
//! Layered configuration: defaults → config file → environment variables

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Error, Result};

/// Environment variable prefix, e.g. `REMOTE_GIT_CONNECTION__HOST`
pub const ENV_PREFIX: &str = "REMOTE_GIT_";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Enable debug logging
    pub debug: bool,

    /// Log file path (if set, logs to file instead of stderr)
    pub log_file: Option<PathBuf>,

    /// Remote host connection settings
    pub connection: ConnectionConfig,
}

/// How to authenticate against the remote host.
///
/// Each variant carries exactly the credential it needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum AuthMethod {
    Password {
        password: String,
    },
    Key {
        key_path: PathBuf,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        passphrase: Option<String>,
    },
}

impl Default for AuthMethod {
    fn default() -> Self {
        AuthMethod::Password {
            password: String::new(),
        }
    }
}

/// Which server host keys are trusted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum HostKeyPolicy {
    /// Verify against an OpenSSH `known_hosts` file (`~/.ssh/known_hosts` when unset)
    KnownHosts {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<PathBuf>,
    },
    /// Accept exactly one key, given as `SHA256:<base64>` like `ssh-keygen -l` prints it
    Fingerprint { sha256: String },
    /// Accept any host key. Insecure; must be chosen explicitly.
    AcceptAny,
}

impl Default for HostKeyPolicy {
    fn default() -> Self {
        HostKeyPolicy::KnownHosts { path: None }
    }
}

/// Everything needed to reach and work on the remote host
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Remote host name or address
    pub host: String,

    /// SSH port
    pub port: u16,

    /// Remote user name
    pub user: String,

    /// Remote directory under which all managed repositories live
    pub working_dir: String,

    /// GitHub personal access token injected into github.com HTTPS URLs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_token: Option<String>,

    /// Timeout for establishing and authenticating the SSH session
    pub connect_timeout_secs: u64,

    /// Authentication method and its credential
    pub auth: AuthMethod,

    /// Host key trust policy
    pub host_key: HostKeyPolicy,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 22,
            user: "root".to_string(),
            working_dir: "/root/projects".to_string(),
            github_token: None,
            connect_timeout_secs: 10,
            auth: AuthMethod::default(),
            host_key: HostKeyPolicy::default(),
        }
    }
}

impl ConnectionConfig {
    /// The configured token, treating an empty string as absent
    pub fn token(&self) -> Option<&str> {
        self.github_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// `host:port` for display and dialing
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Check the values a connection attempt cannot do without
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(invalid("connection.host", "host is not set"));
        }
        if self.user.trim().is_empty() {
            return Err(invalid("connection.user", "user is not set"));
        }
        if self.port == 0 {
            return Err(invalid("connection.port", "port must be non-zero"));
        }
        if let AuthMethod::Key { key_path, .. } = &self.auth {
            if key_path.as_os_str().is_empty() {
                return Err(invalid("connection.auth.key_path", "key path is not set"));
            }
        }
        if let HostKeyPolicy::Fingerprint { sha256 } = &self.host_key {
            if !sha256.starts_with("SHA256:") {
                return Err(invalid(
                    "connection.host_key.sha256",
                    "expected a fingerprint of the form SHA256:<base64>",
                ));
            }
        }
        Ok(())
    }
}

fn invalid(key: &str, reason: &str) -> Error {
    Error::Config(ConfigError::InvalidValue {
        key: key.to_string(),
        reason: reason.to_string(),
    })
}

impl Config {
    /// Load configuration from all sources
    pub fn load() -> Result<Self> {
        let config_path = Self::config_file_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration using a specific config file
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let config: Config = Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Config::default()))
            // Layer config file if it exists
            .merge(Toml::file(config_path))
            // Layer environment variables (REMOTE_GIT_CONNECTION__HOST, etc.)
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        Ok(config)
    }

    /// Whether enough is configured to attempt a connection
    pub fn is_configured(&self) -> bool {
        !self.connection.host.trim().is_empty()
    }

    /// Get the configuration file path
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = Self::project_dirs()?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Save current configuration to the default file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_file_path()?;
        self.save_to(&config_path)
    }

    /// Save current configuration to a specific file
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|_e| {
                Error::Config(ConfigError::DirectoryCreationFailed(parent.to_path_buf()))
            })?;
        }

        let toml = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SaveFailed(e.to_string()))?;

        std::fs::write(config_path, toml).map_err(|e| ConfigError::SaveFailed(e.to_string()))?;

        Ok(())
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("com", "remote-git", "remote-git").ok_or_else(|| {
            Error::Config(ConfigError::LoadFailed(
                "Could not determine home directory".to_string(),
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.connection.port, 22);
        assert_eq!(config.connection.user, "root");
        assert_eq!(config.connection.working_dir, "/root/projects");
        assert_eq!(config.connection.connect_timeout_secs, 10);
        assert_eq!(config.connection.host_key, HostKeyPolicy::KnownHosts { path: None });
        assert!(!config.is_configured());
    }

    #[test]
    fn test_empty_token_is_absent() {
        let mut conn = ConnectionConfig::default();
        assert_eq!(conn.token(), None);

        conn.github_token = Some("  ".to_string());
        assert_eq!(conn.token(), None);

        conn.github_token = Some("abc123".to_string());
        assert_eq!(conn.token(), Some("abc123"));
    }

    #[test]
    fn test_validate_requires_host() {
        let conn = ConnectionConfig::default();
        assert!(conn.validate().is_err());

        let conn = ConnectionConfig {
            host: "example.com".to_string(),
            ..Default::default()
        };
        assert!(conn.validate().is_ok());
    }

    #[test]
    fn test_validate_fingerprint_format() {
        let conn = ConnectionConfig {
            host: "example.com".to_string(),
            host_key: HostKeyPolicy::Fingerprint {
                sha256: "deadbeef".to_string(),
            },
            ..Default::default()
        };
        assert!(conn.validate().is_err());
    }

    #[test]
    fn test_save_load_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        let mut config = Config::default();
        config.connection.host = "10.0.0.5".to_string();
        config.connection.auth = AuthMethod::Key {
            key_path: PathBuf::from("/home/me/.ssh/id_ed25519"),
            passphrase: None,
        };
        config.connection.github_token = Some("abc123".to_string());
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.connection.host, "10.0.0.5");
        assert_eq!(loaded.connection.auth, config.connection.auth);
        assert_eq!(loaded.connection.token(), Some("abc123"));
        assert!(loaded.is_configured());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::load_from(&temp_dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.connection.port, 22);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("working_dir"));
        assert!(toml.contains("method = \"password\""));
        assert!(toml.contains("mode = \"known_hosts\""));
    }
}
