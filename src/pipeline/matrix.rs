//! Matrix configuration and expansion
//!
//! A matrix fans one job template out into one instance per combination
//! of its axis values. Enumeration order is the declared order of axes
//! and values, so instance identifiers and report ordering are stable.

#![allow(clippy::must_use_candidate, clippy::return_self_not_must_use)]

use super::errors::ValidationError;
use super::types::Validate;
use serde::{Deserialize, Serialize};

/// Configuration for matrix execution
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MatrixConfig {
    /// Axes of the matrix
    pub axes: Vec<MatrixAxis>,
    /// Exclusions from the matrix
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub excludes: Vec<MatrixExclude>,
}

/// A single axis of the matrix
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixAxis {
    /// Name of the axis
    pub name: String,
    /// Values for this axis
    pub values: Vec<String>,
}

/// Exclusion rule for matrix combinations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixExclude {
    /// Axis-value pairs that, when all present, exclude a combination
    pub conditions: Vec<(String, String)>,
}

impl MatrixConfig {
    /// Creates a new empty matrix configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an axis to the matrix
    pub fn add_axis(mut self, name: impl Into<String>, values: Vec<String>) -> Self {
        self.axes.push(MatrixAxis {
            name: name.into(),
            values,
        });
        self
    }

    /// Adds an exclusion rule
    pub fn add_exclude(mut self, conditions: Vec<(String, String)>) -> Self {
        self.excludes.push(MatrixExclude { conditions });
        self
    }

    /// Returns true if no axes are declared
    pub fn is_empty(&self) -> bool {
        self.axes.is_empty()
    }

    /// Generates all combinations of the axes, in declared order,
    /// with exclusions removed
    pub fn combinations(&self) -> Vec<Vec<(String, String)>> {
        if self.axes.is_empty() {
            return vec![];
        }

        let mut combinations = vec![vec![]];

        for axis in &self.axes {
            let mut expanded = vec![];
            for combo in &combinations {
                for value in &axis.values {
                    let mut next = combo.clone();
                    next.push((axis.name.clone(), value.clone()));
                    expanded.push(next);
                }
            }
            combinations = expanded;
        }

        combinations
            .into_iter()
            .filter(|combo| !self.is_excluded(combo))
            .collect()
    }

    fn is_excluded(&self, combo: &[(String, String)]) -> bool {
        self.excludes.iter().any(|exclude| {
            exclude
                .conditions
                .iter()
                .all(|(key, value)| combo.iter().any(|(k, v)| k == key && v == value))
        })
    }
}

/// Formats a combination as a stable instance-id suffix, e.g.
/// `python=3.10` or `python=3.10, os=linux`.
#[must_use]
pub fn leg_suffix(combo: &[(String, String)]) -> String {
    combo
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(", ")
}

impl Validate for MatrixConfig {
    type Error = ValidationError;

    fn validate(&self) -> Result<(), Self::Error> {
        for axis in &self.axes {
            if axis.name.is_empty() {
                return Err(ValidationError::EmptyName);
            }
            if axis.values.is_empty() {
                return Err(ValidationError::EmptyAxis {
                    axis: axis.name.clone(),
                });
            }
        }
        Ok(())
    }
}
