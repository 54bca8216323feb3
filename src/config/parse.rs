//! Configuration file parsing and discovery

use crate::config::schema;
use crate::config::types::{Document, File, Task};
use crate::error::{ConfigError, ConfigResult, RemakeError, Result};
use crate::runner::interpolate;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Default configuration file names to search for
pub const CONFIG_FILE_NAMES: &[&str] = &["remake.yml", "remake.yaml"];

/// Find the configuration file by searching current and parent directories
pub fn find_config_file() -> ConfigResult<PathBuf> {
    find_config_file_from(env::current_dir().map_err(|e| {
        ConfigError::Invalid(format!("Failed to get current directory: {}", e))
    })?)
}

/// Find the configuration file starting from a specific directory
pub fn find_config_file_from(start_dir: PathBuf) -> ConfigResult<PathBuf> {
    let mut current_dir = start_dir;
    let mut searched_paths = Vec::new();

    loop {
        for file_name in CONFIG_FILE_NAMES {
            let config_path = current_dir.join(file_name);
            searched_paths.push(config_path.display().to_string());

            if config_path.is_file() {
                return Ok(config_path);
            }
        }

        match current_dir.parent() {
            Some(parent) => current_dir = parent.to_path_buf(),
            None => return Err(ConfigError::NotFound(searched_paths.join(", "))),
        }
    }
}

/// Parse a document from YAML text
pub fn parse_document(yaml: &str) -> Result<Document> {
    let doc: Document = serde_yaml::from_str(yaml)?;
    Ok(doc)
}

/// Load, parse, and finalize a config file into the runtime model
pub fn load_file(path: &Path) -> Result<File> {
    let contents = fs::read_to_string(path)
        .map_err(|e| ConfigError::Invalid(format!("Failed to read {}: {}", path.display(), e)))?;
    let doc = parse_document(&contents)?;

    let abs = path
        .canonicalize()
        .unwrap_or_else(|_| path.to_path_buf());
    build_file(doc, &abs)
}

/// Find the config file automatically and load it
pub fn load_auto() -> Result<File> {
    let path = find_config_file()?;
    load_file(&path)
}

/// Turn a parsed document into the runtime model, enforcing every load-time
/// invariant: valid names, no duplicates, resolvable variables, and
/// dependency/default references that name existing tasks.
pub fn build_file(doc: Document, path: &Path) -> Result<File> {
    schema::validate_document(&doc)?;

    let mut raw_vars = HashMap::with_capacity(doc.vars.len());
    let mut var_order = Vec::with_capacity(doc.vars.len());
    for (name, value) in doc.vars {
        raw_vars.insert(name.clone(), value);
        var_order.push(name);
    }
    let vars = interpolate::resolve_vars(&raw_vars, &var_order)?;

    let mut tasks = HashMap::with_capacity(doc.tasks.len());
    let mut order = Vec::with_capacity(doc.tasks.len());
    for (name, entry) in doc.tasks {
        let cmds: Vec<String> = entry.cmd.into_iter().chain(entry.cmds).collect();
        tasks.insert(
            name.clone(),
            Task {
                name: name.clone(),
                desc: entry.desc,
                deps: entry.deps,
                inputs: entry.inputs,
                outputs: entry.outputs,
                cmds,
                dir: entry.dir,
            },
        );
        order.push(name);
    }

    let default = match doc.default {
        Some(d) => d,
        None => order
            .first()
            .cloned()
            .ok_or(ConfigError::NoTasks)
            .map_err(RemakeError::from)?,
    };

    let dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    let file = File {
        path: path.to_path_buf(),
        dir,
        default,
        order,
        tasks,
        raw_vars,
        var_order,
        vars,
    };

    schema::check_references(&file)?;
    Ok(file)
}
