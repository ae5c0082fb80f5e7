//! Cache key normalization.

use std::path::{Component, Path, PathBuf};

/// Turn a path into the canonical cache key.
///
/// Relative paths are resolved against the current directory and `.`/`..`
/// components are folded lexically. The filesystem is never consulted, so a
/// cache hit costs no I/O.
pub fn normalize_path(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path.to_path_buf(),
        }
    };

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
