//! Configuration module
//!
//! Handles the user configuration (`config.toml` in the platform config
//! directory), layered with `REMOTE_GIT_*` environment variables.

mod settings;

pub use settings::*;
