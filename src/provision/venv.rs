//! Scoped virtual environment activation.
//!
//! Activation never touches provisor's own process environment. It is an
//! overlay (`VIRTUAL_ENV`, a `PATH` with the venv's bin directory first, no
//! `PYTHONHOME`) applied to each child process, so it ends when the
//! procedure does.

use crate::shell::{executable_name, prepend_path, venv_bin_dir, CommandOptions};
use std::collections::{BTreeMap, HashMap};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// The environment every step after venv creation runs in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveEnvironment {
    python: PathBuf,
    venv: Option<PathBuf>,
    env: BTreeMap<String, String>,
    env_remove: Vec<String>,
}

impl ActiveEnvironment {
    /// Use `interpreter` directly, with no venv.
    pub fn system(interpreter: &Path, extra_env: &BTreeMap<String, String>) -> Self {
        Self {
            python: interpreter.to_path_buf(),
            venv: None,
            env: extra_env.clone(),
            env_remove: Vec::new(),
        }
    }

    /// Activate the venv rooted at `root`, on top of the current `PATH`.
    pub fn activate(root: &Path, extra_env: &BTreeMap<String, String>) -> Self {
        Self::activate_with_path(root, extra_env, std::env::var_os("PATH"))
    }

    /// Activate the venv rooted at `root` on top of `base_path`.
    pub fn activate_with_path(
        root: &Path,
        extra_env: &BTreeMap<String, String>,
        base_path: Option<OsString>,
    ) -> Self {
        let bin = venv_bin_dir(root);
        let mut env = extra_env.clone();
        env.insert("VIRTUAL_ENV".to_string(), root.display().to_string());
        env.insert(
            "PATH".to_string(),
            prepend_path(&bin, base_path).to_string_lossy().to_string(),
        );

        Self {
            python: bin.join(executable_name("python")),
            venv: Some(root.to_path_buf()),
            env,
            env_remove: vec!["PYTHONHOME".to_string()],
        }
    }

    /// Interpreter used for pip and the secondary query.
    pub fn python(&self) -> &Path {
        &self.python
    }

    /// Venv root, if one is active.
    pub fn venv(&self) -> Option<&Path> {
        self.venv.as_deref()
    }

    /// Directory holding the venv's executables.
    pub fn bin_dir(&self) -> Option<PathBuf> {
        self.venv.as_deref().map(venv_bin_dir)
    }

    /// Variables set on every child.
    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    /// Command options for a child running inside this environment.
    pub fn command_options(&self, cwd: Option<&Path>, capture: bool) -> CommandOptions {
        CommandOptions {
            cwd: cwd.map(Path::to_path_buf),
            env: self
                .env
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect::<HashMap<_, _>>(),
            env_remove: self.env_remove.clone(),
            capture_stdout: capture,
            capture_stderr: capture,
        }
    }
}
