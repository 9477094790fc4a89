//! Remote execution over a single SSH session
//!
//! - `ConnectionManager` - Owns the one authenticated session and runs commands on it
//! - `RemoteCommand` - Quoted command construction from argument arrays
//! - `RemoteShell` - The seam orchestration code depends on
//! - `normalize_path` - POSIX path conversion ahead of any path-bearing command

mod command;
mod connection;
mod path;

pub use command::*;
pub use connection::*;
pub use path::*;

use async_trait::async_trait;

use crate::error::{ExecError, Result};

/// Outcome of one remote command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    /// The rendered command line that was run
    pub command: String,
    /// Merged stdout and stderr, in arrival order
    pub output: String,
    /// Remote exit status, if the server reported one
    pub exit_status: Option<u32>,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.exit_status == Some(0)
    }

    /// Convert into the output string, or an error carrying that output
    pub fn into_result(self) -> Result<String> {
        match self.exit_status {
            Some(0) => Ok(self.output),
            Some(status) => Err(ExecError::NonZeroExit {
                command: self.command,
                status,
                output: self.output,
            }
            .into()),
            None => Err(ExecError::NoExitStatus(self.command).into()),
        }
    }
}

/// A remote POSIX shell reachable over one session
#[async_trait]
pub trait RemoteShell: Send + Sync {
    /// Whether a session handle currently exists (not whether it is healthy)
    async fn is_connected(&self) -> bool;

    /// Establish the session if no handle exists
    async fn ensure_connected(&self) -> Result<()>;

    /// Run one command on its own channel.
    ///
    /// Fails with `NotConnected` when there is no session; never reconnects.
    /// A non-zero exit is not an error here; see [`CommandResult::into_result`].
    async fn run(&self, command: &RemoteCommand) -> Result<CommandResult>;

    /// Run a command and treat a non-zero exit as an error carrying the output
    async fn execute(&self, command: &RemoteCommand) -> Result<String> {
        self.run(command).await?.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn result(status: Option<u32>) -> CommandResult {
        CommandResult {
            command: "git push".to_string(),
            output: "rejected".to_string(),
            exit_status: status,
        }
    }

    #[test]
    fn test_success_requires_zero_exit() {
        assert!(result(Some(0)).success());
        assert!(!result(Some(1)).success());
        assert!(!result(None).success());
    }

    #[test]
    fn test_into_result_keeps_output_on_failure() {
        let err = result(Some(128)).into_result().unwrap_err();
        assert_eq!(err.output(), Some("rejected"));
        assert!(matches!(
            err,
            Error::Exec(ExecError::NonZeroExit { status: 128, .. })
        ));

        assert_eq!(result(Some(0)).into_result().unwrap(), "rejected");
    }
}
