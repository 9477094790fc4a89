//! Remote path helpers
//!
//! The remote side is always POSIX; paths typed on other platforms are
//! converted before they reach a command line.

/// Convert foreign (`\`) separators to `/` and anchor paths that start
/// with `-` as `./-...`, so no remote program reads them as an option.
///
/// Idempotent: normalizing an already-normalized path returns it unchanged.
pub fn normalize_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    if path.starts_with('-') {
        format!("./{path}")
    } else {
        path
    }
}

/// Parent directory of a POSIX path, like `dirname`
pub fn parent_dir(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return if path.starts_with('/') { "/" } else { "." };
    }
    match trimmed.rfind('/') {
        Some(0) => "/",
        Some(idx) => trimmed[..idx].trim_end_matches('/'),
        None => ".",
    }
}

/// Final segment of a POSIX path, like `basename`. Empty for `/`.
pub fn base_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    }
}

/// Join a directory and an entry name with a single `/`
pub fn join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        return name.to_string();
    }
    format!("{}/{}", dir.trim_end_matches('/'), name.trim_start_matches('/'))
}
