//! Timestamp-based staleness evaluation
//!
//! Decides whether a task's declared outputs are already up to date relative
//! to its declared inputs, and produces a human-readable reason either way.
//! Inputs may contain glob patterns; missing inputs are ignored, missing
//! outputs force a run.

use crate::config::{File, Task};
use crate::error::{ExecutionError, ExecutionResult};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// The evaluator's verdict for one task
#[derive(Debug, Clone, Copy)]
pub struct Freshness {
    pub up_to_date: bool,
    pub reason: &'static str,
}

impl Freshness {
    fn stale(reason: &'static str) -> Self {
        Freshness {
            up_to_date: false,
            reason,
        }
    }

    fn fresh(reason: &'static str) -> Self {
        Freshness {
            up_to_date: true,
            reason,
        }
    }
}

/// Evaluate one task against the filesystem.
///
/// Rules, in order: no outputs -> always stale; any output missing -> stale;
/// no inputs -> fresh; no input path exists -> fresh; newest existing input
/// strictly newer than oldest output -> stale; otherwise fresh. Stat failures
/// other than not-found abort the evaluation.
pub fn evaluate(file: &File, task: &Task) -> ExecutionResult<Freshness> {
    let outputs = file.expand_list(&task.outputs);
    let inputs = file.expand_list(&task.inputs);

    if outputs.is_empty() {
        return Ok(Freshness::stale("no outputs"));
    }

    let mut oldest_output: Option<SystemTime> = None;
    for out in &outputs {
        let full = absolutize(&file.dir, out);
        match modified_time(&full) {
            Ok(Some(mtime)) => {
                oldest_output = Some(match oldest_output {
                    Some(current) => current.min(mtime),
                    None => mtime,
                });
            }
            Ok(None) => return Ok(Freshness::stale("missing output")),
            Err(e) => {
                return Err(ExecutionError::Stat {
                    task: task.name.clone(),
                    path: full,
                    source: e,
                })
            }
        }
    }
    let Some(oldest_output) = oldest_output else {
        return Ok(Freshness::stale("missing output"));
    };

    if inputs.is_empty() {
        return Ok(Freshness::fresh("outputs exist"));
    }

    let mut newest_input: Option<SystemTime> = None;
    for input in &inputs {
        for path in resolve_input_paths(&file.dir, input, &task.name)? {
            match modified_time(&path) {
                Ok(Some(mtime)) => {
                    newest_input = Some(match newest_input {
                        Some(current) => current.max(mtime),
                        None => mtime,
                    });
                }
                Ok(None) => continue,
                Err(e) => {
                    return Err(ExecutionError::Stat {
                        task: task.name.clone(),
                        path,
                        source: e,
                    })
                }
            }
        }
    }

    match newest_input {
        None => Ok(Freshness::fresh("no matching inputs")),
        Some(newest) if newest > oldest_output => {
            Ok(Freshness::stale("input newer than output"))
        }
        Some(_) => Ok(Freshness::fresh("outputs newer than inputs")),
    }
}

/// Expand one declared input into filesystem paths: a literal path maps to
/// itself; a path containing a glob metacharacter expands to all current
/// matches (zero matches is fine).
fn resolve_input_paths(
    base_dir: &Path,
    value: &str,
    task: &str,
) -> ExecutionResult<Vec<PathBuf>> {
    let full = absolutize(base_dir, value);
    if !has_glob(value) {
        return Ok(vec![full]);
    }

    let pattern = full.to_string_lossy();
    let paths = glob::glob(&pattern).map_err(|e| ExecutionError::InvalidPattern {
        task: task.to_string(),
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })?;
    Ok(paths.filter_map(std::result::Result::ok).collect())
}

fn has_glob(value: &str) -> bool {
    value.chars().any(|c| matches!(c, '*' | '?' | '['))
}

fn absolutize(base_dir: &Path, value: &str) -> PathBuf {
    let path = Path::new(value);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

/// Modification time of a path, or None when it does not exist
fn modified_time(path: &Path) -> io::Result<Option<SystemTime>> {
    match fs::metadata(path) {
        Ok(meta) => meta.modified().map(Some),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use std::thread;
    use std::time::Duration;
    use tempfile::TempDir;

    fn file_in(dir: &Path) -> File {
        File {
            path: dir.join("remake.yml"),
            dir: dir.to_path_buf(),
            default: String::new(),
            order: Vec::new(),
            tasks: HashMap::new(),
            raw_vars: HashMap::new(),
            var_order: Vec::new(),
            vars: HashMap::new(),
        }
    }

    fn task(inputs: &[&str], outputs: &[&str]) -> Task {
        Task {
            name: "t".to_string(),
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            outputs: outputs.iter().map(|s| s.to_string()).collect(),
            ..Task::default()
        }
    }

    // mtime ordering between successive writes needs a visible gap
    fn pause() {
        thread::sleep(Duration::from_millis(25));
    }

    #[test]
    fn test_no_outputs_always_stale() {
        let tmp = TempDir::new().unwrap();
        let file = file_in(tmp.path());
        let fresh = evaluate(&file, &task(&[], &[])).unwrap();
        assert!(!fresh.up_to_date);
        assert_eq!(fresh.reason, "no outputs");
    }

    #[test]
    fn test_missing_output_is_stale() {
        let tmp = TempDir::new().unwrap();
        let file = file_in(tmp.path());
        let fresh = evaluate(&file, &task(&[], &["out.bin"])).unwrap();
        assert!(!fresh.up_to_date);
        assert_eq!(fresh.reason, "missing output");
    }

    #[test]
    fn test_outputs_without_inputs_are_fresh() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("out.bin"), "x").unwrap();
        let file = file_in(tmp.path());
        let fresh = evaluate(&file, &task(&[], &["out.bin"])).unwrap();
        assert!(fresh.up_to_date);
        assert_eq!(fresh.reason, "outputs exist");
    }

    #[test]
    fn test_no_matching_inputs_is_fresh() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("out.bin"), "x").unwrap();
        let file = file_in(tmp.path());
        let fresh = evaluate(&file, &task(&["absent.c", "*.nope"], &["out.bin"])).unwrap();
        assert!(fresh.up_to_date);
        assert_eq!(fresh.reason, "no matching inputs");
    }

    #[test]
    fn test_newer_input_is_stale() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("out.bin"), "x").unwrap();
        pause();
        fs::write(tmp.path().join("main.c"), "y").unwrap();
        let file = file_in(tmp.path());
        let fresh = evaluate(&file, &task(&["main.c"], &["out.bin"])).unwrap();
        assert!(!fresh.up_to_date);
        assert_eq!(fresh.reason, "input newer than output");
    }

    #[test]
    fn test_older_input_is_fresh() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("main.c"), "y").unwrap();
        pause();
        fs::write(tmp.path().join("out.bin"), "x").unwrap();
        let file = file_in(tmp.path());
        let fresh = evaluate(&file, &task(&["main.c"], &["out.bin"])).unwrap();
        assert!(fresh.up_to_date);
        assert_eq!(fresh.reason, "outputs newer than inputs");
    }

    #[test]
    fn test_glob_input_matches() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("out.bin"), "x").unwrap();
        pause();
        fs::write(tmp.path().join("a.c"), "y").unwrap();
        let file = file_in(tmp.path());
        let fresh = evaluate(&file, &task(&["*.c"], &["out.bin"])).unwrap();
        assert!(!fresh.up_to_date);
        assert_eq!(fresh.reason, "input newer than output");
    }

    #[test]
    fn test_oldest_output_governs() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("old.bin"), "x").unwrap();
        pause();
        fs::write(tmp.path().join("main.c"), "y").unwrap();
        pause();
        fs::write(tmp.path().join("new.bin"), "z").unwrap();
        let file = file_in(tmp.path());
        let fresh = evaluate(&file, &task(&["main.c"], &["new.bin", "old.bin"])).unwrap();
        assert!(!fresh.up_to_date);
        assert_eq!(fresh.reason, "input newer than output");
    }

    #[test]
    fn test_variable_expanded_output_path() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("app.bin"), "x").unwrap();
        let mut file = file_in(tmp.path());
        file.vars.insert("NAME".to_string(), "app".to_string());
        let fresh = evaluate(&file, &task(&[], &["${NAME}.bin"])).unwrap();
        assert!(fresh.up_to_date);
    }
}
