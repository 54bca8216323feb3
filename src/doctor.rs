//! Environment diagnostics for `remake doctor`
//!
//! Produces a severity-tagged report of the runtime, the working directory,
//! common tooling, the resolved shell, and the health of the remake file.

use crate::config;
use crate::runner::command;
use std::env;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Ok,
    Warn,
    Fail,
}

#[derive(Debug, Clone)]
pub struct Check {
    pub severity: Severity,
    pub name: &'static str,
    pub detail: String,
}

#[derive(Debug, Clone, Default)]
pub struct Report {
    pub checks: Vec<Check>,
}

impl Report {
    pub fn counts(&self) -> (usize, usize, usize) {
        let mut ok = 0;
        let mut warn = 0;
        let mut fail = 0;
        for check in &self.checks {
            match check.severity {
                Severity::Ok => ok += 1,
                Severity::Warn => warn += 1,
                Severity::Fail => fail += 1,
            }
        }
        (ok, warn, fail)
    }

    fn push(&mut self, severity: Severity, name: &'static str, detail: String) {
        self.checks.push(Check {
            severity,
            name,
            detail,
        });
    }
}

/// Run every check against the given config file path
pub fn run(version: &str, config_path: &Path) -> Report {
    let mut report = Report::default();

    report.push(
        Severity::Ok,
        "runtime",
        format!(
            "remake={} os={} arch={}",
            version,
            env::consts::OS,
            env::consts::ARCH
        ),
    );

    match env::current_dir() {
        Ok(cwd) => report.push(Severity::Ok, "cwd", cwd.display().to_string()),
        Err(e) => report.push(Severity::Fail, "cwd", e.to_string()),
    }

    report.checks.push(check_tool("git", &["--version"]));
    report.checks.push(check_shell());
    report.checks.push(check_config(config_path));
    report.checks.push(check_update_repo());

    report
}

fn check_tool(name: &'static str, probe_args: &[&str]) -> Check {
    let Some(path) = command::lookup_path(name) else {
        return Check {
            severity: Severity::Warn,
            name,
            detail: format!("{} not found in PATH", name),
        };
    };

    match command::probe_output(&path, probe_args) {
        Some(line) => Check {
            severity: Severity::Ok,
            name,
            detail: line,
        },
        None => Check {
            severity: Severity::Warn,
            name,
            detail: format!("{} found at {}, version probe failed", name, path.display()),
        },
    }
}

fn check_shell() -> Check {
    let user = command::user_shell().unwrap_or_else(|| "(unknown)".to_string());
    let shell = command::task_shell();

    let mut detail = format!("user={} task={}", user, shell.detail);
    if let Some(version) = command::probe_output(&shell.bin, &["--version"]) {
        detail.push_str(&format!(" ({})", version));
    }

    let mut severity = Severity::Ok;
    if user != "(unknown)" {
        let user_base = Path::new(&user).file_name().map(|n| n.to_ascii_lowercase());
        let task_base = shell.bin.file_name().map(|n| n.to_ascii_lowercase());
        if user_base != task_base {
            severity = Severity::Warn;
            detail.push_str(" [different shells]");
        }
    }

    Check {
        severity,
        name: "shell",
        detail,
    }
}

fn check_config(path: &Path) -> Check {
    if !path.exists() {
        return Check {
            severity: Severity::Warn,
            name: "remakefile",
            detail: format!("{} does not exist", path.display()),
        };
    }

    match config::load_file(path) {
        Ok(file) => Check {
            severity: Severity::Ok,
            name: "remakefile",
            detail: format!(
                "{} parsed: tasks={} default={}",
                file.path.display(),
                file.order.len(),
                file.default_target()
            ),
        },
        Err(e) => Check {
            severity: Severity::Fail,
            name: "remakefile",
            detail: format!("load failed: {}", e),
        },
    }
}

fn check_update_repo() -> Check {
    let repo = env::var("REMAKE_UPDATE_REPO").unwrap_or_default();
    let repo = repo.trim();
    if repo.is_empty() {
        return Check {
            severity: Severity::Warn,
            name: "update",
            detail: "REMAKE_UPDATE_REPO is empty".to_string(),
        };
    }
    if repo.matches('/').count() != 1 {
        return Check {
            severity: Severity::Warn,
            name: "update",
            detail: format!("REMAKE_UPDATE_REPO='{}' should look like owner/repo", repo),
        };
    }
    Check {
        severity: Severity::Ok,
        name: "update",
        detail: format!("REMAKE_UPDATE_REPO={}", repo),
    }
}
