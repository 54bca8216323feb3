//! Concurrent task scheduler
//!
//! One coordinating thread owns every piece of mutable scheduling state:
//! per-task dependency counters, the ready queue, and the completion count.
//! A bounded pool of worker threads receives task names over an intake
//! channel and reports outcomes back over a result channel, so workers never
//! touch scheduler state and no locking discipline is needed beyond the
//! channels themselves.
//!
//! Failure policy is best-effort completion, first-error-wins: a failed task
//! prunes its dependents (they resolve as blocked, without a worker slot),
//! while independent subgraphs continue to completion. The run's result is
//! the first error discovered, or success.

use crate::config::File;
use crate::error::{ConfigError, ExecutionError, RemakeError, Result};
use crate::runner::{command, graph, staleness};
use colored::Colorize;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;

/// Cooperative cancellation flag for a run.
///
/// The scheduler creates one per run and workers check it between commands.
/// The scheduler itself never sets it on task failure: already-started and
/// independent work drains to completion. Embedders may cancel from another
/// thread to stop between commands.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Per-task scheduling state, owned by the coordinator
struct TaskState {
    /// Not-yet-resolved in-subset dependencies
    remaining: usize,
    /// A dependency chain has failed; resolve without executing
    failed_dep: bool,
    /// A terminal outcome has been recorded
    done: bool,
}

struct TaskReport {
    name: String,
    result: Result<()>,
}

/// Drives one run: subset extraction, readiness tracking, and the worker pool
pub struct Runner {
    pub file: File,
    /// Maximum concurrently running tasks; 0 means one per available core
    pub jobs: usize,
}

impl Runner {
    pub fn new(file: File) -> Self {
        Runner { file, jobs: 0 }
    }

    /// Run `target` (or the file's default) and its dependency subset
    pub fn run(&self, target: Option<&str>) -> Result<()> {
        let requested = match target {
            Some(t) if !t.trim().is_empty() => self.file.expand(t),
            _ => self.file.default_target(),
        };
        if !self.file.tasks.contains_key(&requested) {
            return Err(ConfigError::UnknownTarget(requested).into());
        }

        let subset = graph::collect_subset(&self.file, &requested)?;
        let jobs = if self.jobs > 0 {
            self.jobs
        } else {
            thread::available_parallelism().map(|p| p.get()).unwrap_or(4)
        };

        self.schedule(&subset, jobs)
    }

    /// The dispatch loop. Mutable state lives entirely in this stack frame;
    /// workers only see task names and report outcomes.
    fn schedule(&self, subset: &HashSet<String>, jobs: usize) -> Result<()> {
        let mut dependents: HashMap<String, Vec<String>> = HashMap::with_capacity(subset.len());
        let mut state: HashMap<String, TaskState> = HashMap::with_capacity(subset.len());
        for name in subset {
            let Some(task) = self.file.tasks.get(name) else {
                continue;
            };
            let mut remaining = 0;
            for dep in self.file.expand_list(&task.deps) {
                if subset.contains(&dep) {
                    remaining += 1;
                    dependents.entry(dep).or_default().push(name.clone());
                }
            }
            state.insert(
                name.clone(),
                TaskState {
                    remaining,
                    failed_dep: false,
                    done: false,
                },
            );
        }

        // initial ready set in declaration order, for a deterministic start
        let mut ready: VecDeque<String> = self
            .file
            .order
            .iter()
            .filter(|name| matches!(state.get(*name), Some(st) if st.remaining == 0))
            .cloned()
            .collect();

        let total = state.len();
        let cancel = CancelToken::new();
        let shell = command::task_shell();

        let (task_tx, task_rx) = mpsc::channel::<String>();
        let task_rx = Arc::new(Mutex::new(task_rx));
        let (report_tx, report_rx) = mpsc::channel::<TaskReport>();

        thread::scope(|scope| {
            for _ in 0..jobs {
                let task_rx = Arc::clone(&task_rx);
                let report_tx = report_tx.clone();
                let cancel = cancel.clone();
                let file = &self.file;
                let shell = &shell;
                scope.spawn(move || loop {
                    let received = {
                        let Ok(guard) = task_rx.lock() else { break };
                        guard.recv()
                    };
                    let Ok(name) = received else { break };
                    let result = execute_task(file, shell, &name, &cancel);
                    if report_tx.send(TaskReport { name, result }).is_err() {
                        break;
                    }
                });
            }
            drop(report_tx);

            let mut completed = 0usize;
            let mut running = 0usize;
            let mut first_err: Option<RemakeError> = None;

            while completed < total {
                // dispatch: fill free worker slots; blocked tasks resolve here
                while running < jobs && !ready.is_empty() {
                    let Some(name) = ready.pop_front() else { break };
                    let Some(st) = state.get_mut(&name) else {
                        continue;
                    };
                    if st.done {
                        continue;
                    }

                    if st.failed_dep {
                        st.done = true;
                        completed += 1;
                        if first_err.is_none() {
                            first_err =
                                Some(ExecutionError::Blocked(name.clone()).into());
                        }
                        for dependent in dependents.get(&name).cloned().unwrap_or_default() {
                            if let Some(next) = state.get_mut(&dependent) {
                                next.remaining -= 1;
                                next.failed_dep = true;
                                if next.remaining == 0 {
                                    ready.push_back(dependent);
                                }
                            }
                        }
                        continue;
                    }

                    running += 1;
                    if task_tx.send(name).is_err() {
                        running -= 1;
                        break;
                    }
                }

                if completed >= total {
                    break;
                }
                // nothing running and nothing ready should be unreachable
                // given upstream cycle detection
                if running == 0 && ready.is_empty() {
                    break;
                }

                let Ok(report) = report_rx.recv() else { break };
                running -= 1;

                let failed = report.result.is_err();
                let Some(st) = state.get_mut(&report.name) else {
                    continue;
                };
                if st.done {
                    continue;
                }
                st.done = true;
                completed += 1;

                if let Err(err) = report.result {
                    if first_err.is_none() {
                        first_err = Some(err);
                    }
                }

                for dependent in dependents.get(&report.name).cloned().unwrap_or_default() {
                    if let Some(next) = state.get_mut(&dependent) {
                        next.remaining -= 1;
                        if failed {
                            next.failed_dep = true;
                        }
                        if next.remaining == 0 {
                            ready.push_back(dependent);
                        }
                    }
                }
            }

            drop(task_tx);
            match first_err {
                Some(err) => Err(err),
                None => Ok(()),
            }
        })
    }
}

/// Worker body for one dispatched task: consult the staleness evaluator,
/// then run the command sequence if needed.
fn execute_task(file: &File, shell: &command::Shell, name: &str, cancel: &CancelToken) -> Result<()> {
    let Some(task) = file.tasks.get(name) else {
        return Ok(());
    };

    let fresh = staleness::evaluate(file, task)?;
    if fresh.up_to_date {
        println!("{} {} ({})", "[skip]".yellow(), name, fresh.reason);
        return Ok(());
    }

    println!("{} {}", "[run]".blue(), name);

    let dir = task_dir(file, task.dir.as_deref());
    for raw in &task.cmds {
        if cancel.is_cancelled() {
            break;
        }
        let expanded = file.expand(raw);
        let text = expanded.trim();
        if text.is_empty() {
            continue;
        }
        println!("  {} {}", "$".dimmed(), text);
        command::run_command(shell, text, &dir, name)?;
    }
    Ok(())
}

fn task_dir(file: &File, dir: Option<&str>) -> PathBuf {
    let expanded = dir.map(|d| file.expand(d)).unwrap_or_default();
    let expanded = expanded.trim();
    if expanded.is_empty() {
        return file.dir.clone();
    }
    let path = PathBuf::from(expanded);
    if path.is_absolute() {
        path
    } else {
        file.dir.join(path)
    }
}
