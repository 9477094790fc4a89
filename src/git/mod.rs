//! Git workflows over the remote shell
//!
//! - `GitOperations` - Clone, pull, push, status and remove pipelines
//! - `inject_token` - GitHub token injection into HTTPS URLs
//! - `OperationReport` - Transcript plus error of one workflow

mod operations;
mod report;
mod token;

pub use operations::*;
pub use report::*;
pub use token::*;
