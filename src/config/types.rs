//! Core configuration types
//!
//! This module defines the raw document structure parsed from a remake.yml
//! file and the runtime model handed to the execution engine.

use crate::error::VarResult;
use crate::runner::interpolate;
use serde::de::{MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::path::PathBuf;

/// Top-level document structure, as written in remake.yml
///
/// Mappings are deserialized into vectors of pairs so that declaration order
/// survives parsing; duplicate keys are detected during validation.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Document {
    /// Name of the default target (first declared task if omitted)
    #[serde(default)]
    pub default: Option<String>,

    /// Variable declarations, in document order
    #[serde(default, deserialize_with = "ordered_map")]
    pub vars: Vec<(String, String)>,

    /// Task declarations, in document order
    #[serde(default, deserialize_with = "ordered_map")]
    pub tasks: Vec<(String, TaskEntry)>,
}

/// A task as declared in the document
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskEntry {
    /// One-line description shown by `remake list`
    #[serde(default)]
    pub desc: Option<String>,

    /// Working directory for the task's commands
    #[serde(default)]
    pub dir: Option<String>,

    /// Names of tasks that must complete first
    #[serde(default, deserialize_with = "string_or_seq")]
    pub deps: Vec<String>,

    /// Input paths (literal or glob) consulted for staleness
    #[serde(default, deserialize_with = "string_or_seq")]
    pub inputs: Vec<String>,

    /// Output paths consulted for staleness
    #[serde(default, deserialize_with = "string_or_seq")]
    pub outputs: Vec<String>,

    /// A single command; prepended to `cmds` when both are given
    #[serde(default)]
    pub cmd: Option<String>,

    /// Shell commands, executed in sequence
    #[serde(default, deserialize_with = "string_or_seq")]
    pub cmds: Vec<String>,
}

/// Runtime task representation
#[derive(Debug, Clone, Default)]
pub struct Task {
    /// Task name, unique within the file
    pub name: String,

    /// Description for help output
    pub desc: Option<String>,

    /// Dependency name templates
    pub deps: Vec<String>,

    /// Input path templates
    pub inputs: Vec<String>,

    /// Output path templates
    pub outputs: Vec<String>,

    /// Command templates, run in order
    pub cmds: Vec<String>,

    /// Working directory template
    pub dir: Option<String>,
}

/// The loaded model: every task plus the resolved variable set
///
/// Constructed once by the configuration reader and treated as read-only by
/// the scheduler; only variable overrides mutate it, before any task runs.
#[derive(Debug, Clone)]
pub struct File {
    /// Absolute path of the config file
    pub path: PathBuf,

    /// Base directory for relative paths (the config file's parent)
    pub dir: PathBuf,

    /// Default target template
    pub default: String,

    /// Task names in declaration order
    pub order: Vec<String>,

    /// Tasks by name
    pub tasks: HashMap<String, Task>,

    /// Unresolved variable templates
    pub raw_vars: HashMap<String, String>,

    /// Variable names in declaration order
    pub var_order: Vec<String>,

    /// Fully resolved variable values
    pub vars: HashMap<String, String>,
}

impl File {
    /// Expand a template string against the resolved variables (loose mode)
    pub fn expand(&self, input: &str) -> String {
        interpolate::expand_loose(input, &self.vars)
    }

    /// Expand a list of templates, trimming and dropping empty results
    pub fn expand_list(&self, values: &[String]) -> Vec<String> {
        interpolate::expand_loose_list(values, &self.vars)
    }

    /// The expanded name of the default target
    pub fn default_target(&self) -> String {
        self.expand(&self.default)
    }

    /// Re-seed the raw variable set with overrides and re-run strict
    /// resolution, so variables built from overridden ones recompute.
    ///
    /// Declaration order is preserved for pre-existing names; new names are
    /// appended in override order.
    pub fn apply_overrides(&mut self, overrides: &[(String, String)]) -> VarResult<()> {
        if overrides.is_empty() {
            return Ok(());
        }

        let mut raw = self.raw_vars.clone();
        for (name, value) in overrides {
            if !raw.contains_key(name) {
                self.var_order.push(name.clone());
            }
            raw.insert(name.clone(), value.clone());
        }

        let resolved = interpolate::resolve_vars(&raw, &self.var_order)?;
        self.raw_vars = raw;
        self.vars = resolved;
        Ok(())
    }
}

/// Deserialize a YAML mapping into a vector of pairs, preserving document
/// order. Duplicate keys are kept so validation can report them.
fn ordered_map<'de, D, V>(deserializer: D) -> Result<Vec<(String, V)>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    struct OrderedMapVisitor<V>(PhantomData<V>);

    impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedMapVisitor<V> {
        type Value = Vec<(String, V)>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a mapping")
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut entries = Vec::new();
            while let Some((key, value)) = map.next_entry::<String, V>()? {
                entries.push((key, value));
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_any(OrderedMapVisitor(PhantomData))
}

/// Deserialize a scalar string, a sequence of strings, or null into a Vec
fn string_or_seq<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrSeqVisitor;

    impl<'de> Visitor<'de> for StringOrSeqVisitor {
        type Value = Vec<String>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a string or a sequence of strings")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E> {
            Ok(vec![value.to_string()])
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut items = Vec::new();
            while let Some(item) = seq.next_element::<String>()? {
                items.push(item);
            }
            Ok(items)
        }
    }

    deserializer.deserialize_any(StringOrSeqVisitor)
}
