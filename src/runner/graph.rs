//! Dependency subset extraction
//!
//! Given a target, walk the variable-expanded dependency edges to collect the
//! minimal closed set of tasks to schedule. Three-color visitation (absent /
//! on-stack / finished) with an explicit path stack, so a cycle is reported
//! with the full offending chain.

use crate::config::File;
use crate::error::{ConfigError, ConfigResult};
use std::collections::{HashMap, HashSet};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    OnStack,
    Finished,
}

/// Collect `target` and every transitive dependency.
///
/// Fails with the full path on a cycle, and immediately on a dependency name
/// that is not a declared task. Diamond dependencies are visited once.
pub fn collect_subset(file: &File, target: &str) -> ConfigResult<HashSet<String>> {
    let mut subset = HashSet::new();
    let mut visit = HashMap::new();
    let mut stack = Vec::new();
    dfs(file, target, &mut subset, &mut visit, &mut stack)?;
    Ok(subset)
}

fn dfs(
    file: &File,
    name: &str,
    subset: &mut HashSet<String>,
    visit: &mut HashMap<String, Visit>,
    stack: &mut Vec<String>,
) -> ConfigResult<()> {
    match visit.get(name) {
        Some(Visit::OnStack) => {
            return Err(ConfigError::DependencyCycle(format!(
                "{} -> {}",
                stack.join(" -> "),
                name
            )));
        }
        Some(Visit::Finished) => return Ok(()),
        None => {}
    }

    let Some(task) = file.tasks.get(name) else {
        return Err(ConfigError::UndefinedTask(name.to_string()));
    };

    visit.insert(name.to_string(), Visit::OnStack);
    stack.push(name.to_string());
    subset.insert(name.to_string());

    for dep in file.expand_list(&task.deps) {
        dfs(file, &dep, subset, visit, stack)?;
    }

    stack.pop();
    visit.insert(name.to_string(), Visit::Finished);
    Ok(())
}
