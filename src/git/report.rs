//! Results of git operations
//!
//! Every operation hands back its transcript and its error together; the
//! transcript is kept even when the operation failed.

use std::fmt;

use crate::error::Error;

/// Which workflow produced a report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Clone,
    Pull,
    Push,
    Status,
    Remove,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clone => write!(f, "clone"),
            Self::Pull => write!(f, "pull"),
            Self::Push => write!(f, "push"),
            Self::Status => write!(f, "status"),
            Self::Remove => write!(f, "remove"),
        }
    }
}

/// Outcome of the best-effort `origin` URL rewrite ahead of pull and push.
///
/// Never aborts the operation; reported so callers can tell a push that ran
/// with rewritten credentials from one that did not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteRewrite {
    /// No token configured
    Skipped,
    /// `origin` is not a GitHub HTTPS URL, or already carries credentials
    Unchanged,
    /// `origin` now embeds the token
    Applied,
    /// Reading or setting `origin` failed; the reason has the token redacted
    Failed(String),
}

impl fmt::Display for RemoteRewrite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skipped => write!(f, "skipped (no token configured)"),
            Self::Unchanged => write!(f, "unchanged"),
            Self::Applied => write!(f, "applied"),
            Self::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Transcript and outcome of one git operation
#[derive(Debug)]
pub struct OperationReport {
    pub kind: OperationKind,
    /// Combined output of every step that ran
    pub output: String,
    /// Present for pull and push only
    pub remote_rewrite: Option<RemoteRewrite>,
    pub error: Option<Error>,
}

impl OperationReport {
    pub fn new(kind: OperationKind, output: impl Into<String>, error: Option<Error>) -> Self {
        Self {
            kind,
            output: output.into(),
            remote_rewrite: None,
            error,
        }
    }

    /// Report for an operation that could not start because there was no session
    pub fn not_started(kind: OperationKind, error: Error) -> Self {
        Self::new(kind, String::new(), Some(error))
    }

    pub fn with_rewrite(mut self, rewrite: RemoteRewrite) -> Self {
        self.remote_rewrite = Some(rewrite);
        self
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConnectionError;

    #[test]
    fn test_report_success() {
        let report = OperationReport::new(OperationKind::Status, "clean", None);
        assert!(report.is_success());
        assert_eq!(report.output, "clean");
    }

    #[test]
    fn test_report_failure_keeps_output() {
        let report = OperationReport::new(
            OperationKind::Pull,
            "fatal: couldn't find remote ref",
            Some(ConnectionError::NotConnected.into()),
        )
        .with_rewrite(RemoteRewrite::Skipped);

        assert!(!report.is_success());
        assert_eq!(report.output, "fatal: couldn't find remote ref");
        assert_eq!(report.remote_rewrite, Some(RemoteRewrite::Skipped));
        assert!(report.error.is_some());
    }

    #[test]
    fn test_display() {
        assert_eq!(OperationKind::Push.to_string(), "push");
        assert_eq!(
            RemoteRewrite::Failed("no origin".to_string()).to_string(),
            "failed: no origin"
        );
    }
}
