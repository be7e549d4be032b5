//! Environment variables and `${VAR}` expansion
//!
//! Step commands and env values may reference variables with the
//! `${VAR}` syntax. The engine uses the same mechanism to substitute
//! matrix axis values and to expose upstream job outputs.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

static VAR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap());

/// Environment variables available to pipeline steps.
///
/// Values can be resolved with [`resolve`][Environment::resolve], which
/// substitutes `${VAR}` references. Unknown variables are left intact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Environment {
    /// Environment variables as key-value pairs.
    #[serde(flatten)]
    pub vars: HashMap<String, String>,
}

impl Environment {
    /// Creates a new empty environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an environment variable.
    #[must_use]
    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    /// Inserts a variable in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    /// Gets an environment variable by name.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&String> {
        self.vars.get(key)
    }

    /// Merges another environment into this one; `other` wins on conflicts.
    pub fn merge(&mut self, other: &Environment) {
        for (k, v) in &other.vars {
            self.vars.insert(k.clone(), v.clone());
        }
    }

    /// Resolves `${VAR}` references in `value` against this environment.
    ///
    /// References to unknown variables are left as written.
    #[must_use]
    pub fn resolve(&self, value: &str) -> String {
        VAR_PATTERN
            .replace_all(value, |caps: &regex::Captures<'_>| {
                let name = &caps[1];
                self.vars
                    .get(name)
                    .cloned()
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }
}

/// Normalizes an arbitrary name into an environment variable key.
///
/// Uppercases, maps every non-alphanumeric run to a single `_` and trims
/// leading/trailing underscores. Used to expose upstream outputs as
/// `<JOB>_<KEY>` variables.
#[must_use]
pub fn env_key(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_underscore = true;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_uppercase());
            last_underscore = false;
        } else if !last_underscore {
            out.push('_');
            last_underscore = true;
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}
