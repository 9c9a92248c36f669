//! Placeholder grammar and scanning.
//!
//! A placeholder is `${body}` where `body` runs to the first `}`, so a body
//! can never contain a literal `}`. The body is split on the *first* `:`
//! into a name and an optional default value, which means defaults keep any
//! further colons verbatim (`${Label:11:00:00}` has default `11:00:00`).
//!
//! A `$` that is not immediately followed by `{` is ordinary text; that is
//! what makes the `_$_{...}` escape pass through the scanner untouched.

/// Represents a placeholder found in a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    /// Byte offset of the `$` in the template
    pub start: usize,
    /// Byte offset just past the closing `}`
    pub end: usize,
    /// The requested variable name
    pub name: String,
    /// Inline default value, if the body contained a `:`
    pub default: Option<String>,
}

/// Finds all `${name}` / `${name:default}` placeholders in the given text.
///
/// An empty body (`${}`) is not a placeholder. An unterminated `${` ends the
/// scan; the remainder of the text is literal.
pub fn find_placeholders(text: &str) -> Vec<Placeholder> {
    let bytes = text.as_bytes();
    let mut placeholders = Vec::new();
    let mut i = 0;

    while i + 1 < bytes.len() {
        if bytes[i] != b'$' || bytes[i + 1] != b'{' {
            i += 1;
            continue;
        }

        let Some(close) = text[i + 2..].find('}') else {
            break;
        };

        let body = &text[i + 2..i + 2 + close];
        if body.is_empty() {
            i += 2;
            continue;
        }

        let end = i + 2 + close + 1;
        let (name, default) = match body.split_once(':') {
            Some((name, default)) => (name.to_string(), Some(default.to_string())),
            None => (body.to_string(), None),
        };

        placeholders.push(Placeholder {
            start: i,
            end,
            name,
            default,
        });
        i = end;
    }

    placeholders
}

/// A `$[name]` reference inside a default value.
///
/// Defaults cannot use `${name}` because the outer scan already stopped at
/// the first `}`, so they use square brackets instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BracketRef {
    pub start: usize,
    pub end: usize,
    pub name: String,
}

/// Finds all `$[name]` references in a default value.
pub fn find_bracket_refs(text: &str) -> Vec<BracketRef> {
    let bytes = text.as_bytes();
    let mut refs = Vec::new();
    let mut i = 0;

    while i + 1 < bytes.len() {
        if bytes[i] != b'$' || bytes[i + 1] != b'[' {
            i += 1;
            continue;
        }

        let Some(close) = text[i + 2..].find(']') else {
            break;
        };

        let name = &text[i + 2..i + 2 + close];
        if name.is_empty() {
            i += 2;
            continue;
        }

        let end = i + 2 + close + 1;
        refs.push(BracketRef {
            start: i,
            end,
            name: name.to_string(),
        });
        i = end;
    }

    refs
}
