//! Shell discovery and command execution
//!
//! Commands are handed as a single string to a resolved shell
//! (`<shell> -c <command>`). The shell is chosen once per run: the
//! `REMAKE_SHELL` override wins, then the user's `$SHELL`, then a `sh` found
//! on `PATH`, then `/bin/sh`. Child processes inherit stdio and the full
//! environment.

use crate::error::{ExecutionError, ExecutionResult};
use std::env;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// A resolved command interpreter: executable plus invocation prefix
#[derive(Debug, Clone)]
pub struct Shell {
    pub bin: PathBuf,
    pub args: Vec<String>,
    /// How the shell was chosen, for diagnostics
    pub detail: String,
}

/// The user's preferred interactive shell, if discoverable
pub fn user_shell() -> Option<String> {
    if cfg!(windows) {
        return env::var("COMSPEC").ok().filter(|v| !v.trim().is_empty());
    }
    env::var("SHELL").ok().filter(|v| !v.trim().is_empty())
}

/// Resolve the shell used to run task commands
pub fn task_shell() -> Shell {
    if cfg!(windows) {
        let bin = env::var("COMSPEC").unwrap_or_else(|_| "cmd".to_string());
        return Shell {
            detail: format!("{} /C", bin),
            bin: PathBuf::from(bin),
            args: vec!["/C".to_string()],
        };
    }

    if let Ok(shell) = env::var("REMAKE_SHELL") {
        let shell = shell.trim();
        if !shell.is_empty() {
            if let Some(path) = lookup_path(shell) {
                return Shell {
                    detail: format!("{} -c (REMAKE_SHELL)", path.display()),
                    bin: path,
                    args: vec!["-c".to_string()],
                };
            }
        }
    }

    if let Some(shell) = user_shell() {
        if let Some(path) = lookup_path(&shell) {
            return Shell {
                detail: format!("{} -c", path.display()),
                bin: path,
                args: vec!["-c".to_string()],
            };
        }
    }

    if let Some(path) = lookup_path("sh") {
        return Shell {
            detail: format!("{} -c (fallback)", path.display()),
            bin: path,
            args: vec!["-c".to_string()],
        };
    }

    Shell {
        detail: "/bin/sh -c (fallback)".to_string(),
        bin: PathBuf::from("/bin/sh"),
        args: vec!["-c".to_string()],
    }
}

/// Locate an executable: an explicit path is used as-is when it exists,
/// otherwise PATH is searched.
pub fn lookup_path(name: &str) -> Option<PathBuf> {
    let candidate = Path::new(name);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }

    let path_var = env::var_os("PATH")?;
    env::split_paths(&path_var)
        .map(|dir| dir.join(name))
        .find(|p| p.is_file())
}

/// Run one command string to completion in `dir`, inheriting stdio and the
/// process environment. A non-zero exit or a failed spawn is an error
/// attributed to `task`.
pub fn run_command(shell: &Shell, text: &str, dir: &Path, task: &str) -> ExecutionResult<()> {
    let status = Command::new(&shell.bin)
        .args(&shell.args)
        .arg(text)
        .current_dir(dir)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map_err(|e| ExecutionError::Spawn {
            task: task.to_string(),
            command: text.to_string(),
            source: e,
        })?;

    if !status.success() {
        return Err(ExecutionError::CommandFailed {
            task: task.to_string(),
            command: text.to_string(),
            code: status.code(),
        });
    }
    Ok(())
}

/// Run a probe command quietly and return its first line of output
pub fn probe_output(bin: &Path, args: &[&str]) -> Option<String> {
    let output = Command::new(bin)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8_lossy(&output.stdout);
    let line = text.lines().next()?.trim();
    if line.is_empty() {
        None
    } else {
        Some(line.to_string())
    }
}
