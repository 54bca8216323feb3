//! Configuration validation
//!
//! Structural checks applied at load time, before any task is scheduled:
//! name syntax, duplicate detection, and reference checks against the
//! resolved variable set.

use crate::config::types::{Document, File};
use crate::error::{ConfigError, ConfigResult};
use regex::Regex;
use std::collections::HashSet;

/// Check whether a string is a legal task name
pub fn is_task_name(name: &str) -> bool {
    let re = Regex::new(r"^[A-Za-z0-9_.-]+$").unwrap();
    re.is_match(name)
}

/// Validate the raw document: name syntax, duplicates, non-empty task set
pub fn validate_document(doc: &Document) -> ConfigResult<()> {
    if doc.tasks.is_empty() {
        return Err(ConfigError::NoTasks);
    }

    let mut seen_vars = HashSet::new();
    for (name, _) in &doc.vars {
        if !crate::runner::interpolate::is_identifier(name) {
            return Err(ConfigError::InvalidVarName(name.clone()));
        }
        if !seen_vars.insert(name.clone()) {
            return Err(ConfigError::DuplicateVar(name.clone()));
        }
    }

    let mut seen_tasks = HashSet::new();
    for (name, _) in &doc.tasks {
        if !is_task_name(name) {
            return Err(ConfigError::InvalidTaskName(name.clone()));
        }
        if !seen_tasks.insert(name.clone()) {
            return Err(ConfigError::DuplicateTask(name.clone()));
        }
    }

    Ok(())
}

/// Validate references that only make sense once variables are resolved:
/// every expanded dependency and the expanded default must name a task.
pub fn check_references(file: &File) -> ConfigResult<()> {
    let default = file.default_target();
    if !file.tasks.contains_key(&default) {
        return Err(ConfigError::DefaultNotDefined(default));
    }

    for name in &file.order {
        let Some(task) = file.tasks.get(name) else {
            continue;
        };
        for dep in file.expand_list(&task.deps) {
            if !file.tasks.contains_key(&dep) {
                return Err(ConfigError::UndefinedDependency {
                    task: name.clone(),
                    dependency: dep,
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::TaskEntry;

    fn doc_with_tasks(names: &[&str]) -> Document {
        Document {
            default: None,
            vars: Vec::new(),
            tasks: names
                .iter()
                .map(|n| (n.to_string(), TaskEntry::default()))
                .collect(),
        }
    }

    #[test]
    fn test_task_name_syntax() {
        assert!(is_task_name("build"));
        assert!(is_task_name("release-assets"));
        assert!(is_task_name("lib.core_v2"));
        assert!(!is_task_name(""));
        assert!(!is_task_name("bad name"));
        assert!(!is_task_name("no/slash"));
    }

    #[test]
    fn test_empty_document_rejected() {
        let doc = doc_with_tasks(&[]);
        assert!(matches!(validate_document(&doc), Err(ConfigError::NoTasks)));
    }

    #[test]
    fn test_duplicate_task_rejected() {
        let doc = doc_with_tasks(&["a", "b", "a"]);
        assert!(matches!(
            validate_document(&doc),
            Err(ConfigError::DuplicateTask(name)) if name == "a"
        ));
    }

    #[test]
    fn test_invalid_var_name_rejected() {
        let mut doc = doc_with_tasks(&["a"]);
        doc.vars.push(("1BAD".to_string(), "x".to_string()));
        assert!(matches!(
            validate_document(&doc),
            Err(ConfigError::InvalidVarName(_))
        ));
    }
}
