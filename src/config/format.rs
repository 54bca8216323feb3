//! Canonical rendering of a loaded config file
//!
//! `remake fmt` rewrites the document from the in-memory model, which
//! normalizes layout and quoting. Variables are rendered from their raw
//! (unresolved) templates so the rewrite never bakes in resolved values.

use crate::config::types::File;
use crate::error::Result;
use serde_yaml::{Mapping, Value};

/// Render the file as canonical YAML, preserving declaration order
pub fn render(file: &File) -> Result<String> {
    let mut root = Mapping::new();
    root.insert(
        Value::String("default".to_string()),
        Value::String(file.default.clone()),
    );

    if !file.var_order.is_empty() {
        let mut vars = Mapping::new();
        for name in &file.var_order {
            let value = file
                .raw_vars
                .get(name)
                .or_else(|| file.vars.get(name))
                .cloned()
                .unwrap_or_default();
            vars.insert(Value::String(name.clone()), Value::String(value));
        }
        root.insert(Value::String("vars".to_string()), Value::Mapping(vars));
    }

    let mut tasks = Mapping::new();
    for name in &file.order {
        let Some(task) = file.tasks.get(name) else {
            continue;
        };
        let mut entry = Mapping::new();
        if let Some(desc) = &task.desc {
            entry.insert(
                Value::String("desc".to_string()),
                Value::String(desc.clone()),
            );
        }
        if !task.deps.is_empty() {
            entry.insert(Value::String("deps".to_string()), string_seq(&task.deps));
        }
        if !task.inputs.is_empty() {
            entry.insert(Value::String("inputs".to_string()), string_seq(&task.inputs));
        }
        if !task.outputs.is_empty() {
            entry.insert(
                Value::String("outputs".to_string()),
                string_seq(&task.outputs),
            );
        }
        if let Some(dir) = &task.dir {
            entry.insert(Value::String("dir".to_string()), Value::String(dir.clone()));
        }
        if !task.cmds.is_empty() {
            entry.insert(Value::String("cmds".to_string()), string_seq(&task.cmds));
        }
        tasks.insert(Value::String(name.clone()), Value::Mapping(entry));
    }
    root.insert(Value::String("tasks".to_string()), Value::Mapping(tasks));

    let text = serde_yaml::to_string(&Value::Mapping(root))?;
    Ok(text)
}

fn string_seq(items: &[String]) -> Value {
    Value::Sequence(items.iter().cloned().map(Value::String).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse::{build_file, parse_document};
    use std::path::Path;

    fn load(yaml: &str) -> File {
        let doc = parse_document(yaml).unwrap();
        build_file(doc, Path::new("/tmp/remake.yml")).unwrap()
    }

    #[test]
    fn test_render_round_trips() {
        let file = load(
            r#"
default: build
vars:
  NAME: app
tasks:
  gen:
    desc: Generate
    cmds: [echo gen]
  build:
    deps: [gen]
    inputs: ["src/*.c"]
    outputs: ["bin/${NAME}"]
    cmds: [make]
"#,
        );
        let rendered = render(&file).unwrap();
        let reloaded = load(&rendered);

        assert_eq!(reloaded.order, file.order);
        assert_eq!(reloaded.var_order, file.var_order);
        assert_eq!(reloaded.default, file.default);
        assert_eq!(
            reloaded.tasks.get("build").unwrap().outputs,
            vec!["bin/${NAME}"]
        );
    }

    #[test]
    fn test_render_is_stable() {
        let file = load(
            r#"
tasks:
  a:
    cmds: [echo a]
  b:
    deps: [a]
"#,
        );
        let first = render(&file).unwrap();
        let second = render(&load(&first)).unwrap();
        assert_eq!(first, second);
    }
}
