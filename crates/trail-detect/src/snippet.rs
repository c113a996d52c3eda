use std::path::{Path, PathBuf};

/// Literal source line `line` (1-based) of `path`, trimmed.
///
/// `None` when the file cannot be read, the line is out of range, or the line is blank.
pub fn read_snippet(path: &Path, line: u32) -> Option<String> {
    if line == 0 {
        return None;
    }
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "Snippet unavailable");
            return None;
        }
    };
    let content = String::from_utf8_lossy(&bytes);
    content
        .lines()
        .nth(line as usize - 1)
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(ToOwned::to_owned)
}

/// Render `path` relative to `root` when it lives under it; otherwise unchanged.
pub fn display_path(root: &Path, path: &Path) -> String {
    let absolute: PathBuf = if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    };
    let shown = absolute.strip_prefix(root).unwrap_or(path).to_string_lossy();
    if shown.is_empty() {
        ".".to_string()
    } else {
        shown.to_string()
    }
}

/// Resolve a reported file path against the invocation root.
pub fn resolve_path(root: &Path, reported: &str) -> PathBuf {
    let path = Path::new(reported);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}
