use crate::error::{Result, TransformError};
use serde::{Deserialize, Serialize};

/// A single name/value pair available for placeholder resolution.
///
/// Names are matched case-insensitively. Duplicates are allowed; resolution
/// uses the first match in iteration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub value: String,
}

impl Variable {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Parses a `NAME=VALUE` definition as passed on the command line.
    /// The value may itself contain `=` characters; only the first one splits.
    ///
    /// # Errors
    ///
    /// Returns `TransformError::InvalidVariable` if the definition has no `=`
    /// or an empty name.
    pub fn parse(definition: &str) -> Result<Self> {
        match definition.split_once('=') {
            Some((name, value)) if !name.is_empty() => Ok(Self::new(name, value)),
            _ => Err(TransformError::InvalidVariable {
                definition: definition.to_string(),
            }),
        }
    }
}

/// Looks up a variable by name (case-insensitive, first match wins).
pub fn find_variable<'a>(variables: &'a [Variable], name: &str) -> Option<&'a Variable> {
    variables.iter().find(|v| v.name.eq_ignore_ascii_case(name))
}

/// A record of one placeholder-resolution attempt.
///
/// One usage is created per placeholder occurrence encountered during
/// expansion, including occurrences discovered inside recursively-resolved
/// values and defaults. `resolved` holds the immediately-resolved text
/// (before any recursive expansion of placeholders inside it).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariableUsage {
    pub requested_name: String,
    pub resolved: Option<String>,
    pub missing: bool,
}

impl VariableUsage {
    pub(crate) fn found(name: impl Into<String>, resolved: impl Into<String>) -> Self {
        Self {
            requested_name: name.into(),
            resolved: Some(resolved.into()),
            missing: false,
        }
    }

    pub(crate) fn missing(name: impl Into<String>) -> Self {
        Self {
            requested_name: name.into(),
            resolved: None,
            missing: true,
        }
    }
}
