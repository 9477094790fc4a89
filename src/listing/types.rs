//! Records derived from remote listings
//!
//! Both types are recomputed on every listing request and never cached.

use serde::{Deserialize, Serialize};

/// A git repository found under the working directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Final path segment of the repository directory
    pub name: String,
    /// Repository directory (parent of its `.git`)
    pub path: String,
}

impl Project {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// One entry of a remote directory listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub name: String,
    pub path: String,
    pub is_dir: bool,
    /// Size column of the listing, 0 when it could not be read
    pub size: u64,
    /// Date columns of the listing as printed, e.g. `Mar 4 10:12`
    pub mod_time: String,
}
