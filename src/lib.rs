//! remote-git - Drive git workflows on a remote host over one SSH connection
//!
//! An operator clones, pulls, pushes, inspects and removes repositories that
//! live under a working directory on a remote machine. Everything runs through
//! a single authenticated SSH session, the remote POSIX shell, and the remote
//! `git` binary.
//!
//! # Modules
//!
//! - [`remote`] - SSH session lifecycle, quoted command construction and execution
//! - [`listing`] - Project discovery and directory listings parsed from `find`/`ls`
//! - [`git`] - Clone/pull/push/status/remove pipelines with GitHub token injection
//! - [`config`] - Layered configuration
//! - [`error`] - Error types

pub mod config;
pub mod error;
pub mod git;
pub mod listing;
pub mod remote;

pub use config::{AuthMethod, Config, ConnectionConfig, HostKeyPolicy};
pub use error::{Error, Result};
pub use git::{GitOperations, OperationKind, OperationReport, RemoteRewrite};
pub use listing::{Discovery, FileInfo, Project};
pub use remote::{CommandResult, ConnectionManager, RemoteCommand, RemoteShell};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
