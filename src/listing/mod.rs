//! Remote listings turned into structured records
//!
//! - `Discovery` - Issues `find`/`ls` commands over the session
//! - `parse_projects` / `parse_file_listing` - Pure output parsers
//! - `Project` / `FileInfo` - The derived records

mod discovery;
mod parse;
mod types;

pub use discovery::*;
pub use parse::*;
pub use types::*;
