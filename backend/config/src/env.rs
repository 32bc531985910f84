//! Environment variable substitution for config values.
//!
//! Supports `${VAR_NAME}` syntax in string values, resolved at load time.
//! Only uppercase `[A-Z_][A-Z0-9_]*` variable names are matched.
//! `$${VAR}` escapes to a literal `${VAR}`.

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};

/// A reference, optionally preceded by the `$` escape.
static ENV_VAR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\$)?\$\{([A-Z_][A-Z0-9_]*)\}").unwrap());

/// A `${VAR}` reference that had no (or an empty) value.
#[derive(Debug, thiserror::Error)]
#[error("Missing env var \"{var_name}\" referenced at config path: {config_path}")]
pub struct MissingEnvVarError {
    pub var_name: String,
    pub config_path: String,
}

/// Substitute `${VAR}` references from the process environment.
///
/// Only string leaves are processed. Unset or empty variables are an error.
pub fn resolve_env_vars(value: &Value) -> Result<Value> {
    let env: HashMap<String, String> = std::env::vars().collect();
    resolve_env_vars_with(value, &env)
}

/// Substitute env vars using a provided map.
pub fn resolve_env_vars_with(value: &Value, env: &HashMap<String, String>) -> Result<Value> {
    let mut resolved = value.clone();
    Resolver { env, path: Vec::new() }.visit(&mut resolved)?;
    Ok(resolved)
}

/// Walks a value tree in place, tracking the dotted path for error reports.
struct Resolver<'a> {
    env: &'a HashMap<String, String>,
    path: Vec<String>,
}

impl Resolver<'_> {
    fn visit(&mut self, value: &mut Value) -> Result<(), MissingEnvVarError> {
        match value {
            Value::String(s) if s.contains('$') => *s = self.substitute(s)?,
            Value::Array(items) => {
                for (i, item) in items.iter_mut().enumerate() {
                    self.path.push(format!("[{i}]"));
                    self.visit(item)?;
                    self.path.pop();
                }
            }
            Value::Object(map) => {
                for (key, item) in map.iter_mut() {
                    self.path.push(key.clone());
                    self.visit(item)?;
                    self.path.pop();
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn config_path(&self) -> String {
        let mut out = String::new();
        for segment in &self.path {
            if !out.is_empty() && !segment.starts_with('[') {
                out.push('.');
            }
            out.push_str(segment);
        }
        out
    }

    fn substitute(&self, s: &str) -> Result<String, MissingEnvVarError> {
        let mut out = String::with_capacity(s.len());
        let mut last = 0;
        for caps in ENV_VAR_PATTERN.captures_iter(s) {
            let Some(whole) = caps.get(0) else { continue };
            out.push_str(&s[last..whole.start()]);
            last = whole.end();

            let var_name = &caps[2];
            if caps.get(1).is_some() {
                out.push_str(&format!("${{{var_name}}}"));
                continue;
            }
            match self.env.get(var_name).filter(|v| !v.is_empty()) {
                Some(val) => out.push_str(val),
                None => {
                    return Err(MissingEnvVarError {
                        var_name: var_name.to_string(),
                        config_path: self.config_path(),
                    })
                }
            }
        }
        out.push_str(&s[last..]);
        Ok(out)
    }
}

/// Names of every unescaped `${VAR}` in the tree, sorted and deduplicated.
pub fn collect_referenced_vars(value: &Value) -> Vec<String> {
    let mut vars = BTreeSet::new();
    let mut pending = vec![value];
    while let Some(current) = pending.pop() {
        match current {
            Value::String(s) => vars.extend(
                ENV_VAR_PATTERN
                    .captures_iter(s)
                    .filter(|caps| caps.get(1).is_none())
                    .map(|caps| caps[2].to_string()),
            ),
            Value::Array(items) => pending.extend(items),
            Value::Object(map) => pending.extend(map.values()),
            _ => {}
        }
    }
    vars.into_iter().collect()
}
