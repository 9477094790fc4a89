//! Error types for remote-git
//!
//! Uses `thiserror` for ergonomic error definitions with automatic `Display` and `Error` impls.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Top-level error type for remote-git
#[derive(Error, Debug)]
pub enum Error {
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error("Execution error: {0}")]
    Exec(#[from] ExecError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Output captured from the remote side before the failure, if any
    pub fn output(&self) -> Option<&str> {
        match self {
            Error::Exec(ExecError::NonZeroExit { output, .. }) => Some(output),
            _ => None,
        }
    }
}

/// SSH connection errors
#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("SSH connection not established")]
    NotConnected,

    #[error("SSH key read failed for {path}: {source}")]
    KeyRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("SSH key parse failed for {path}: {reason}")]
    KeyParse { path: PathBuf, reason: String },

    #[error("SSH connection to {address} failed: {reason}")]
    Transport { address: String, reason: String },

    #[error("SSH authentication rejected for user '{0}'")]
    AuthRejected(String),

    #[error("Host key {fingerprint} rejected by trust policy")]
    HostKeyRejected { fingerprint: String },

    #[error("SSH connection timed out after {0:?}")]
    Timeout(Duration),
}

/// Remote command execution errors
#[derive(Error, Debug)]
pub enum ExecError {
    #[error("Remote command failed with exit status {status}: {command}")]
    NonZeroExit {
        command: String,
        status: u32,
        output: String,
    },

    #[error("Remote command ended without exit status: {0}")]
    NoExitStatus(String),

    #[error("Failed to open remote channel: {0}")]
    Channel(String),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("Failed to save configuration: {0}")]
    SaveFailed(String),

    #[error("Invalid configuration value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Failed to create config directory: {0}")]
    DirectoryCreationFailed(PathBuf),
}

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConnectionError::NotConnected;
        assert!(err.to_string().contains("not established"));

        let err = ConnectionError::KeyParse {
            path: PathBuf::from("/tmp/id_ed25519"),
            reason: "bad".to_string(),
        };
        assert!(err.to_string().contains("/tmp/id_ed25519"));

        let err = ExecError::NonZeroExit {
            command: "git pull".to_string(),
            status: 1,
            output: "fatal: not a git repository".to_string(),
        };
        assert!(err.to_string().contains("git pull"));
    }

    #[test]
    fn test_error_output_is_preserved() {
        let err: Error = ExecError::NonZeroExit {
            command: "git commit -m x".to_string(),
            status: 1,
            output: "nothing to commit".to_string(),
        }
        .into();
        assert_eq!(err.output(), Some("nothing to commit"));

        let err: Error = ConnectionError::NotConnected.into();
        assert_eq!(err.output(), None);
    }
}
