//! Variable resolution and template expansion
//!
//! Templates use the `${NAME}` / `${NAME:-fallback}` syntax. The same scanner
//! serves two modes:
//!
//! - **Strict** resolution runs once at load time over the declared variable
//!   set. Every reference must resolve; cycles and unresolvable references
//!   fail the load before anything is scheduled.
//! - **Loose** expansion runs at scheduling time over task fields. An
//!   unresolved reference is not an error; the original `${...}` token is
//!   left in place for a later shell or tool to interpret.
//!
//! A reference to a variable's own name inside its declaration is resolved
//! against the process environment first, then the fallback, so
//! `VERSION: "${VERSION:-dev}"` means "the VERSION environment variable, or
//! dev".

use crate::error::{VarError, VarResult};
use regex::Regex;
use std::collections::HashMap;
use std::env;

/// Expansion mode: how an unresolved reference is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Unresolved references and unterminated expressions are errors
    Strict,
    /// Unresolved tokens pass through verbatim
    Loose,
}

/// Outcome of resolving a single `${...}` expression
pub enum Resolution {
    /// The reference resolved to a value
    Value(String),
    /// The reference could not be resolved; mode decides what happens
    Unresolved,
}

/// Check whether a string is a syntactically valid variable identifier
pub fn is_identifier(name: &str) -> bool {
    let re = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
    re.is_match(name)
}

/// Split a reference expression into its name and optional fallback
pub fn parse_var_expr(expr: &str) -> (&str, Option<&str>) {
    match expr.split_once(":-") {
        Some((name, fallback)) => (name.trim(), Some(fallback.trim())),
        None => (expr.trim(), None),
    }
}

/// Scan `input` for `${...}` expressions and replace each via `resolver`.
///
/// The scan is non-nesting: an expression ends at the first `}`. The resolver
/// returns a tri-state result (value / unresolved / hard error); only the
/// unresolved case differs between modes.
pub fn expand_template<F>(input: &str, mode: Mode, resolver: &mut F) -> VarResult<String>
where
    F: FnMut(&str) -> VarResult<Resolution>,
{
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            return match mode {
                Mode::Strict => Err(VarError::Unterminated(input.to_string())),
                Mode::Loose => {
                    out.push_str(&rest[start..]);
                    Ok(out)
                }
            };
        };

        let expr = &after[..end];
        let token = &rest[start..start + 2 + end + 1];
        match resolver(expr)? {
            Resolution::Value(value) => out.push_str(&value),
            Resolution::Unresolved => match mode {
                Mode::Strict => return Err(VarError::Unresolved(token.to_string())),
                Mode::Loose => out.push_str(token),
            },
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    Ok(out)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    InProgress,
    Done,
}

/// Strict resolver over a declared variable set.
///
/// Three-color visitation (absent / in-progress / done) with an explicit
/// stack, so a cycle is reported with its full reference chain.
struct StrictResolver<'a> {
    raw: &'a HashMap<String, String>,
    resolved: HashMap<String, String>,
    visit: HashMap<String, Visit>,
    stack: Vec<String>,
}

impl<'a> StrictResolver<'a> {
    fn resolve(&mut self, name: &str) -> VarResult<String> {
        if let Some(value) = self.resolved.get(name) {
            return Ok(value.clone());
        }
        if self.visit.get(name) == Some(&Visit::InProgress) {
            return Err(VarError::Cycle(format!(
                "{} -> {}",
                self.stack.join(" -> "),
                name
            )));
        }

        let Some(raw_value) = self.raw.get(name).cloned() else {
            return Err(VarError::Undefined(name.to_string()));
        };

        self.visit.insert(name.to_string(), Visit::InProgress);
        self.stack.push(name.to_string());
        let value = self.expand(&raw_value, name)?;
        self.stack.pop();
        self.visit.insert(name.to_string(), Visit::Done);
        self.resolved.insert(name.to_string(), value.clone());
        Ok(value)
    }

    fn expand(&mut self, input: &str, current: &str) -> VarResult<String> {
        let current = current.to_string();
        expand_template(input, Mode::Strict, &mut |expr| {
            let (name, fallback) = parse_var_expr(expr);
            if !is_identifier(name) {
                return Ok(Resolution::Unresolved);
            }
            if name == current {
                if let Ok(value) = env::var(name) {
                    return Ok(Resolution::Value(value));
                }
                if let Some(fb) = fallback {
                    return Ok(Resolution::Value(self.expand(fb, &current)?));
                }
                return Err(VarError::SelfReference(name.to_string()));
            }
            if self.raw.contains_key(name) {
                return Ok(Resolution::Value(self.resolve(name)?));
            }
            if let Ok(value) = env::var(name) {
                return Ok(Resolution::Value(value));
            }
            if let Some(fb) = fallback {
                return Ok(Resolution::Value(self.expand(fb, &current)?));
            }
            Ok(Resolution::Unresolved)
        })
    }
}

/// Resolve every declared variable to its final value.
///
/// Resolution is memoized, so shared references are computed once; iteration
/// follows declaration order for deterministic error reporting.
pub fn resolve_vars(
    raw: &HashMap<String, String>,
    order: &[String],
) -> VarResult<HashMap<String, String>> {
    let mut resolver = StrictResolver {
        raw,
        resolved: HashMap::with_capacity(raw.len()),
        visit: HashMap::with_capacity(raw.len()),
        stack: Vec::new(),
    };

    for name in order {
        resolver.resolve(name)?;
    }
    for name in raw.keys() {
        if !resolver.resolved.contains_key(name) {
            resolver.resolve(name)?;
        }
    }
    Ok(resolver.resolved)
}

/// Expand a task-field template against the resolved variable set.
///
/// Lookup order per reference: resolved variables, then the environment,
/// then the fallback expression. Anything else passes through verbatim.
pub fn expand_loose(input: &str, vars: &HashMap<String, String>) -> String {
    let result = expand_template(input, Mode::Loose, &mut |expr| {
        let (name, fallback) = parse_var_expr(expr);
        if !is_identifier(name) {
            return Ok(Resolution::Unresolved);
        }
        if let Some(value) = vars.get(name) {
            return Ok(Resolution::Value(value.clone()));
        }
        if let Ok(value) = env::var(name) {
            return Ok(Resolution::Value(value));
        }
        if let Some(fb) = fallback {
            return Ok(Resolution::Value(expand_loose(fb, vars)));
        }
        Ok(Resolution::Unresolved)
    });
    // loose mode has no failing paths
    result.unwrap_or_else(|_| input.to_string())
}

/// Expand a list of templates, trimming whitespace and dropping entries that
/// expand to nothing
pub fn expand_loose_list(values: &[String], vars: &HashMap<String, String>) -> Vec<String> {
    values
        .iter()
        .map(|v| expand_loose(v, vars).trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}
