//! The engine façade: placeholder expansion composed with conditional
//! filtering.
//!
//! A [`Resolver`] is a pure function of its inputs: the variable collection,
//! the injected environment lookup, and the template text. Diagnostics are
//! returned as part of [`TransformOutput`] instead of accumulated on the
//! resolver, so one resolver can transform any number of templates.

use crate::conditional::filter_conditionals;
use crate::error::{Result, TransformError};
use crate::placeholder::{Placeholder, find_bracket_refs, find_placeholders};
use crate::variables::{Variable, VariableUsage, find_variable};
use std::fmt;
use std::fs;
use std::path::Path;

/// Maximum placeholder recursion depth before a circular reference is assumed
pub const MAX_EXPANSION_DEPTH: usize = 64;

/// Environment lookup injected into a [`Resolver`].
///
/// Environment values take precedence over the variable collection, so tests
/// inject a closure here rather than mutating the process environment.
pub type EnvLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Result of one template transformation
#[derive(Debug, Clone)]
pub struct TransformOutput {
    /// The transformed text
    pub text: String,
    /// One usage record per placeholder occurrence, in resolution order
    pub usages: Vec<VariableUsage>,
}

impl TransformOutput {
    /// Usages that could not be resolved from any source
    pub fn missing(&self) -> impl Iterator<Item = &VariableUsage> {
        self.usages.iter().filter(|u| u.missing)
    }

    pub fn has_missing(&self) -> bool {
        self.missing().next().is_some()
    }
}

/// Expands placeholders and filters conditional blocks in template text.
///
/// Resolution precedence for a requested name:
///
/// 1. the environment lookup (overrides everything, deliberately),
/// 2. the variable collection (case-insensitive, first match wins),
/// 3. the inline default value, if present,
/// 4. otherwise the name is missing and a diagnostic marker is emitted.
pub struct Resolver {
    variables: Vec<Variable>,
    env: EnvLookup,
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("variables", &self.variables)
            .finish_non_exhaustive()
    }
}

impl Resolver {
    /// Creates a resolver backed by the process environment
    pub fn new(variables: Vec<Variable>) -> Self {
        Self::with_env_lookup(variables, |name: &str| std::env::var(name).ok())
    }

    /// Creates a resolver with a custom environment lookup
    pub fn with_env_lookup<F>(variables: Vec<Variable>, env: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            variables,
            env: Box::new(env),
        }
    }

    /// Creates a resolver that ignores the environment entirely
    pub fn without_env(variables: Vec<Variable>) -> Self {
        Self::with_env_lookup(variables, |_: &str| None)
    }

    /// Transforms a template: expands all placeholders, then filters
    /// conditional blocks. This is the primary entry point.
    ///
    /// Missing variables are not errors; they render as inline markers and
    /// show up as missing usages in the output.
    ///
    /// # Errors
    ///
    /// - `TransformError::CircularReference` if variable definitions form a
    ///   cycle (expansion exceeds [`MAX_EXPANSION_DEPTH`]).
    /// - `TransformError::Regex` from the conditional tag patterns.
    pub fn transform(&self, template: &str) -> Result<TransformOutput> {
        let mut usages = Vec::new();
        let expanded = self.expand(template, 0, &mut usages)?;
        let text = filter_conditionals(&expanded)?;

        Ok(TransformOutput { text, usages })
    }

    /// Transforms a template read from a file
    ///
    /// # Errors
    ///
    /// - `TransformError::TemplateNotFound` if the path doesn't exist or
    ///   isn't a file.
    /// - Other errors from reading the file or from `transform`.
    pub fn transform_file(&self, path: &Path) -> Result<TransformOutput> {
        if !path.is_file() {
            return Err(TransformError::TemplateNotFound {
                path: path.to_path_buf(),
            });
        }

        let template = fs::read_to_string(path)?;
        self.transform(&template)
    }

    /// Resolves a single variable by name, expanding any placeholders inside
    /// its value.
    ///
    /// This is a direct collection lookup (case-insensitive): unlike
    /// placeholder expansion it does not consult the environment for the
    /// requested name itself, though placeholders *inside* the value resolve
    /// with full precedence. Returns `Ok(None)` when the name is not in the
    /// collection.
    ///
    /// # Errors
    ///
    /// Returns `TransformError::CircularReference` if the value's expansion
    /// exceeds [`MAX_EXPANSION_DEPTH`].
    pub fn resolve(&self, name: &str) -> Result<Option<String>> {
        let Some(variable) = find_variable(&self.variables, name) else {
            return Ok(None);
        };

        let mut usages = Vec::new();
        let value = self.expand(&variable.value, 0, &mut usages)?;

        Ok(Some(value))
    }

    /// Expands every placeholder in `text`, recursing into resolved values
    /// until they are placeholder-free. The text is rebuilt left to right
    /// from the scanner's spans so usages are recorded in document order.
    fn expand(&self, text: &str, depth: usize, usages: &mut Vec<VariableUsage>) -> Result<String> {
        let placeholders = find_placeholders(text);
        if placeholders.is_empty() {
            return Ok(text.to_string());
        }

        let mut out = String::with_capacity(text.len());
        let mut cursor = 0;

        for placeholder in &placeholders {
            out.push_str(&text[cursor..placeholder.start]);
            out.push_str(&self.expand_placeholder(placeholder, depth, usages)?);
            cursor = placeholder.end;
        }
        out.push_str(&text[cursor..]);

        Ok(out)
    }

    fn expand_placeholder(
        &self,
        placeholder: &Placeholder,
        depth: usize,
        usages: &mut Vec<VariableUsage>,
    ) -> Result<String> {
        if depth >= MAX_EXPANSION_DEPTH {
            return Err(TransformError::CircularReference {
                name: placeholder.name.clone(),
            });
        }

        if let Some(value) = self.lookup(&placeholder.name) {
            usages.push(VariableUsage::found(placeholder.name.as_str(), value.as_str()));
            return self.expand(&value, depth + 1, usages);
        }

        match &placeholder.default {
            Some(default) => {
                let substituted = self.expand_default(default, depth, usages)?;
                usages.push(VariableUsage::found(
                    placeholder.name.as_str(),
                    substituted.as_str(),
                ));
                self.expand(&substituted, depth + 1, usages)
            }
            None => {
                usages.push(VariableUsage::missing(placeholder.name.as_str()));
                Ok(missing_marker(&placeholder.name))
            }
        }
    }

    /// Substitutes `$[name]` references inside a default value. Defaults use
    /// the bracket syntax because the outer scan already consumed the first
    /// `}`; the names still resolve through the full precedence chain.
    fn expand_default(
        &self,
        default: &str,
        depth: usize,
        usages: &mut Vec<VariableUsage>,
    ) -> Result<String> {
        let refs = find_bracket_refs(default);
        if refs.is_empty() {
            return Ok(default.to_string());
        }

        let mut out = String::with_capacity(default.len());
        let mut cursor = 0;

        for bracket in &refs {
            out.push_str(&default[cursor..bracket.start]);
            match self.lookup(&bracket.name) {
                Some(value) => {
                    usages.push(VariableUsage::found(bracket.name.as_str(), value.as_str()));
                    out.push_str(&self.expand(&value, depth + 1, usages)?);
                }
                None => {
                    usages.push(VariableUsage::missing(bracket.name.as_str()));
                    out.push_str(&missing_marker(&bracket.name));
                }
            }
            cursor = bracket.end;
        }
        out.push_str(&default[cursor..]);

        Ok(out)
    }

    fn lookup(&self, name: &str) -> Option<String> {
        if let Some(value) = (self.env)(name) {
            return Some(value);
        }

        find_variable(&self.variables, name).map(|v| v.value.clone())
    }
}

fn missing_marker(name: &str) -> String {
    format!("!!Missing variable for {name}!!")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variables::Variable;
    use std::io::Write;

    fn resolver(pairs: &[(&str, &str)]) -> Resolver {
        Resolver::without_env(
            pairs
                .iter()
                .map(|(name, value)| Variable::new(*name, *value))
                .collect(),
        )
    }

    #[test]
    fn test_identity_without_placeholders() {
        let target = Resolver::new(Vec::new());
        let result = target.transform("plain configuration text").unwrap();
        assert_eq!(result.text, "plain configuration text");
        assert!(result.usages.is_empty());
    }

    #[test]
    fn test_resolve_one_variable() {
        let target = resolver(&[("Var1", "Jack Bauer")]);
        let result = target.transform("Hello ${Var1}!").unwrap();
        assert_eq!(result.text, "Hello Jack Bauer!");
    }

    #[test]
    fn test_resolve_multiple_variables() {
        let target = resolver(&[("FirstName", "Jack"), ("LastName", "Bauer")]);
        let result = target.transform("Hello ${FirstName} ${LastName}!").unwrap();
        assert_eq!(result.text, "Hello Jack Bauer!");
    }

    #[test]
    fn test_resolve_on_multiple_lines() {
        let target = resolver(&[
            ("FirstName", "Jack"),
            ("LastName", "Bauer"),
            ("SecondLine", "2"),
        ]);
        let result = target
            .transform("Hello ${FirstName} ${LastName}!\nThis is another line:${SecondLine}")
            .unwrap();
        assert_eq!(result.text, "Hello Jack Bauer!\r\nThis is another line:2");
    }

    #[test]
    fn test_defaults_unused_when_variables_set() {
        let target = resolver(&[("FirstName", "Jack"), ("LastName", "Bauer")]);
        let result = target
            .transform("Hello ${FirstName:Mila} ${LastName:Kunis}!")
            .unwrap();
        assert_eq!(result.text, "Hello Jack Bauer!");
    }

    #[test]
    fn test_defaults_used_when_nothing_resolves() {
        let target = resolver(&[]);
        let result = target
            .transform("Hello ${FirstName:Mila} ${LastName:Kunis}!")
            .unwrap();
        assert_eq!(result.text, "Hello Mila Kunis!");
    }

    #[test]
    fn test_default_with_colons_preserved_whole() {
        let target = resolver(&[]);
        let result = target.transform("Hello ${Fullname:11:00:00}!").unwrap();
        assert_eq!(result.text, "Hello 11:00:00!");
    }

    #[test]
    fn test_variable_in_variable() {
        let target = resolver(&[
            ("FirstName", "Mila"),
            ("LastName", "Kunis"),
            ("Fullname", "${FirstName} ${LastName}"),
        ]);
        let result = target.transform("Hello ${Fullname}!").unwrap();
        assert_eq!(result.text, "Hello Mila Kunis!");
    }

    #[test]
    fn test_variable_chain_fully_flattens() {
        let target = resolver(&[("A", "A + ${B}"), ("B", "B + ${C}"), ("C", "C")]);
        let result = target.transform("${A}").unwrap();
        assert_eq!(result.text, "A + B + C");
    }

    #[test]
    fn test_environment_overrides_collection() {
        let target = Resolver::with_env_lookup(
            vec![Variable::new("Var1", "Jack Bauer")],
            |name: &str| (name == "Var1").then(|| "George Junior".to_string()),
        );
        let result = target.transform("Hello ${Var1}!").unwrap();
        assert_eq!(result.text, "Hello George Junior!");
    }

    #[test]
    fn test_environment_used_without_collection_entry() {
        let target = Resolver::with_env_lookup(Vec::new(), |name: &str| {
            (name == "Host").then(|| "db.example.com".to_string())
        });
        let result = target.transform("host=${Host}").unwrap();
        assert_eq!(result.text, "host=db.example.com");
    }

    #[test]
    fn test_environment_overrides_default() {
        let target = Resolver::with_env_lookup(Vec::new(), |name: &str| {
            (name == "Host").then(|| "db.example.com".to_string())
        });
        let result = target.transform("host=${Host:localhost}").unwrap();
        assert_eq!(result.text, "host=db.example.com");
    }

    #[test]
    fn test_missing_variable_marker_and_usage() {
        let target = resolver(&[("FirstName", "Jack")]);
        let result = target.transform("Hello ${FirstName} ${LastName}!").unwrap();

        assert_eq!(result.text, "Hello Jack !!Missing variable for LastName!!!");
        assert_eq!(result.missing().count(), 1);
        assert_eq!(
            result.missing().next().unwrap().requested_name,
            "LastName"
        );
    }

    #[test]
    fn test_multiple_missing_variables() {
        let target = resolver(&[]);
        let result = target.transform("${a} ${b} ${c}").unwrap();
        assert_eq!(result.missing().count(), 3);
        assert!(result.has_missing());
    }

    #[test]
    fn test_default_with_bracket_refs() {
        let target = resolver(&[("FirstName", "Jack"), ("LastName", "Bauer")]);
        let result = target
            .transform("Hello ${Fullname:$[FirstName] $[LastName]}!")
            .unwrap();
        assert_eq!(result.text, "Hello Jack Bauer!");
    }

    #[test]
    fn test_missing_bracket_ref_renders_marker() {
        let target = resolver(&[]);
        let result = target.transform("${Fullname:$[FirstName]}").unwrap();
        assert_eq!(result.text, "!!Missing variable for FirstName!!");
        assert_eq!(result.missing().count(), 1);
    }

    #[test]
    fn test_escaped_placeholder_passes_through() {
        let target = resolver(&[("Escaped", "should not appear")]);
        let result = target.transform("Hello _$_{Escaped}!").unwrap();
        assert_eq!(result.text, "Hello ${Escaped}!");
        assert!(result.usages.is_empty());
    }

    #[test]
    fn test_case_insensitive_resolution() {
        let target = resolver(&[("FirstName", "Jack")]);
        let result = target.transform("${FIRSTNAME} ${firstname}").unwrap();
        assert_eq!(result.text, "Jack Jack");
    }

    #[test]
    fn test_usages_record_resolution_order() {
        let target = resolver(&[
            ("FirstName", "Mila"),
            ("LastName", "Kunis"),
            ("Fullname", "${FirstName} ${LastName}"),
        ]);
        let result = target.transform("Hello ${Fullname}!").unwrap();

        let names: Vec<&str> = result
            .usages
            .iter()
            .map(|u| u.requested_name.as_str())
            .collect();
        assert_eq!(names, vec!["Fullname", "FirstName", "LastName"]);
        assert_eq!(
            result.usages[0].resolved.as_deref(),
            Some("${FirstName} ${LastName}")
        );
        assert_eq!(result.usages[1].resolved.as_deref(), Some("Mila"));
    }

    #[test]
    fn test_self_referencing_variable_fails() {
        let target = resolver(&[("A", "${A}")]);
        let err = target.transform("${A}").unwrap_err();
        assert!(matches!(
            err,
            TransformError::CircularReference { name } if name == "A"
        ));
    }

    #[test]
    fn test_mutual_cycle_fails() {
        let target = resolver(&[("A", "${B}"), ("B", "${A}")]);
        let err = target.transform("${A}").unwrap_err();
        assert!(matches!(err, TransformError::CircularReference { .. }));
    }

    #[test]
    fn test_transform_applies_conditionals() {
        let target = resolver(&[("condition", "enabled")]);
        let result = target
            .transform("Hello\n<!--[if ${condition}]-->\ntobi!\n<!--[endif]-->")
            .unwrap();
        assert_eq!(result.text, "Hello\r\ntobi!");
    }

    #[test]
    fn test_transform_drops_block_for_false_variable() {
        let target = resolver(&[("condition", "off")]);
        let result = target
            .transform("Hello\n<!--[if ${condition}]-->\ntobi!\n<!--[endif]-->")
            .unwrap();
        assert_eq!(result.text, "Hello");
    }

    #[test]
    fn test_transform_empty_check_on_missing_default() {
        let target = resolver(&[]);
        let result = target
            .transform("<!--[if empty ${flag:}]-->\nno flag set\n<!--[endif]-->")
            .unwrap();
        assert_eq!(result.text, "no flag set");
    }

    #[test]
    fn test_resolve_not_existing_variable_returns_none() {
        let target = resolver(&[("A", "A")]);
        assert_eq!(target.resolve("b").unwrap(), None);
    }

    #[test]
    fn test_resolve_variable_directly() {
        let target = resolver(&[("a", "a${b}"), ("b", "b")]);
        assert_eq!(target.resolve("a").unwrap().as_deref(), Some("ab"));
    }

    #[test]
    fn test_resolve_is_case_insensitive() {
        let target = resolver(&[("Host", "localhost")]);
        assert_eq!(target.resolve("HOST").unwrap().as_deref(), Some("localhost"));
    }

    #[test]
    fn test_resolve_skips_environment_for_requested_name() {
        let target = Resolver::with_env_lookup(
            vec![Variable::new("a", "a${b}"), Variable::new("b", "b")],
            |name: &str| (name == "b").then(|| "ENV".to_string()),
        );

        // nested placeholders still resolve with full precedence
        assert_eq!(target.resolve("a").unwrap().as_deref(), Some("aENV"));
        // but the requested name itself is a direct collection lookup
        assert_eq!(target.resolve("missing").unwrap(), None);
    }

    #[test]
    fn test_resolve_cycle_fails() {
        let target = resolver(&[("A", "${A}")]);
        assert!(matches!(
            target.resolve("A"),
            Err(TransformError::CircularReference { .. })
        ));
    }

    #[test]
    fn test_transform_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "host=${{Host:localhost}}").unwrap();

        let target = resolver(&[]);
        let result = target.transform_file(file.path()).unwrap();
        assert_eq!(result.text, "host=localhost");
    }

    #[test]
    fn test_transform_file_not_found() {
        let dir = tempfile::TempDir::new().unwrap();
        let target = resolver(&[]);
        let err = target
            .transform_file(&dir.path().join("nope.template"))
            .unwrap_err();
        assert!(matches!(err, TransformError::TemplateNotFound { .. }));
    }
}
