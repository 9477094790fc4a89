//! Parsers for remote `find` and `ls` output
//!
//! Pure functions: the discovery layer feeds them raw command output.
//! Lines that do not look like listing rows are dropped, never reported.

use tracing::{debug, trace};

use super::{FileInfo, Project};
use crate::remote::{base_name, join, normalize_path, parent_dir};

/// Minimum whitespace-separated columns of an `ls -l` row
pub const LISTING_COLUMNS: usize = 9;

/// Parse `find <dir> -maxdepth 2 -name .git -type d` output into projects.
///
/// Each project is the parent of a `.git` match. Blank lines and names that
/// are empty or hidden are skipped. Order follows the input.
pub fn parse_projects(output: &str) -> Vec<Project> {
    let mut projects = Vec::new();

    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let git_dir = normalize_path(line);
        let path = parent_dir(&git_dir);
        let name = base_name(path);

        if name.is_empty() || name.starts_with('.') {
            trace!(line, "skipping hidden or unnamed repository");
            continue;
        }

        debug!(name, path, "project found");
        projects.push(Project::new(name, path));
    }

    projects
}

/// Parse `ls -la` / `ls -ld` rows for the entries of `dir`.
///
/// Rows with fewer than [`LISTING_COLUMNS`] fields are dropped, as are `.`
/// and `..`. The listing command never emits `dir` itself, so every other
/// row is an entry. A row is a directory when it starts with the `d` type
/// marker.
pub fn parse_file_listing(output: &str, dir: &str) -> Vec<FileInfo> {
    let mut files = Vec::new();

    for line in output.lines() {
        if line.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < LISTING_COLUMNS {
            trace!(line, "dropping malformed listing row");
            continue;
        }

        let mut entry = fields[LISTING_COLUMNS - 1..].join(" ");
        if line.starts_with('l') {
            if let Some((link, _target)) = entry.split_once(" -> ") {
                entry = link.to_string();
            }
        }

        let name = base_name(&entry);
        if name.is_empty() || name == "." || name == ".." {
            continue;
        }

        files.push(FileInfo {
            name: name.to_string(),
            path: join(dir, name),
            is_dir: line.starts_with('d'),
            size: fields[4].parse().unwrap_or(0),
            mod_time: fields[5..8].join(" "),
        });
    }

    files
}
