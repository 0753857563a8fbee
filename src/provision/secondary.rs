//! Locating and preparing the bundled secondary executable.

use std::io;
use std::path::{Path, PathBuf};

/// Path printed by the resolution query: its last non-empty line.
///
/// Packages sometimes log before printing the path, so earlier lines are
/// ignored.
pub fn resolve_path(stdout: &str) -> Option<PathBuf> {
    stdout
        .lines()
        .map(str::trim)
        .rfind(|line| !line.is_empty())
        .map(PathBuf::from)
}

/// Set the execute bits on `path` (`mode |= 0o111`).
///
/// Idempotent. On platforms without mode bits this only checks that the
/// file exists.
#[cfg(unix)]
pub fn ensure_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut permissions = std::fs::metadata(path)?.permissions();
    let mode = permissions.mode();
    if mode & 0o111 != 0o111 {
        permissions.set_mode(mode | 0o111);
        std::fs::set_permissions(path, permissions)?;
    }
    Ok(())
}

/// Set the execute bits on `path` (`mode |= 0o111`).
///
/// Idempotent. On platforms without mode bits this only checks that the
/// file exists.
#[cfg(not(unix))]
pub fn ensure_executable(path: &Path) -> io::Result<()> {
    std::fs::metadata(path).map(|_| ())
}
