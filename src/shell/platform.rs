//! Platform conventions: CI detection, executable naming, PATH handling
//! and exit status truncation.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Check if running in a CI environment.
///
/// Used to select the non-interactive UI in `main()`.
/// Checks common CI environment variables: `CI`, `GITHUB_ACTIONS`,
/// `GITLAB_CI`, `CIRCLECI`, `TRAVIS`, `JENKINS_URL`.
pub fn is_ci() -> bool {
    std::env::var("CI").is_ok()
        || std::env::var("GITHUB_ACTIONS").is_ok()
        || std::env::var("GITLAB_CI").is_ok()
        || std::env::var("CIRCLECI").is_ok()
        || std::env::var("TRAVIS").is_ok()
        || std::env::var("JENKINS_URL").is_ok()
}

/// Directory inside a virtual environment that holds its executables.
pub fn venv_bin_dir(venv_root: &Path) -> PathBuf {
    if cfg!(target_os = "windows") {
        venv_root.join("Scripts")
    } else {
        venv_root.join("bin")
    }
}

/// Platform file name for an executable.
pub fn executable_name(name: &str) -> String {
    if cfg!(target_os = "windows") && !name.ends_with(".exe") {
        format!("{}.exe", name)
    } else {
        name.to_string()
    }
}

/// Build a PATH value with `first` ahead of the existing entries.
///
/// `first` is not duplicated if it is already present.
pub fn prepend_path(first: &Path, existing: Option<OsString>) -> OsString {
    let mut entries = vec![first.to_path_buf()];
    if let Some(existing) = existing {
        entries.extend(std::env::split_paths(&existing).filter(|p| p != first));
    }
    std::env::join_paths(entries).unwrap_or_else(|_| first.as_os_str().to_os_string())
}

/// Truncate an exit code to the byte a process can actually return.
///
/// A non-zero code whose low byte is zero (e.g. 256) would read as success
/// after truncation, so it becomes 1.
pub fn exit_status_byte(code: i32) -> u8 {
    if code == 0 {
        return 0;
    }
    match (code & 0xff) as u8 {
        0 => 1,
        byte => byte,
    }
}
