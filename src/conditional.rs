//! Line-oriented conditional filtering.
//!
//! Templates can gate whole lines behind HTML-comment markers:
//!
//! ```text
//! <!--[if true]-->
//! kept when the condition holds
//! <!--[endif]-->
//! ```
//!
//! Conditions are evaluated against already-expanded literal text: the
//! expression is truthy when it equals one of `true`, `on`, `1`, `enabled`
//! (case-insensitive). The `empty` modifier tests blankness instead, and
//! `not` negates either test. Blocks do not nest; a new `if` simply replaces
//! the current block context, and an unterminated block runs to end of input.

use crate::error::Result;
use regex::Regex;

/// Canonical line ending used for splitting and re-joining filtered text
pub const LINE_ENDING: &str = "\r\n";

/// Expression values that count as true, compared uppercase
const TRUE_STRINGS: [&str; 4] = ["TRUE", "ON", "1", "ENABLED"];

/// Filters conditional blocks out of already-expanded text.
///
/// Lines outside any block, and lines inside a block whose condition holds,
/// are kept; conditional tag lines themselves are never emitted. Lines that
/// look almost like a tag but do not match the grammar are ordinary content.
/// The result is joined with [`LINE_ENDING`], every literal `_$_` is replaced
/// with `$`, and trailing whitespace is trimmed.
///
/// # Errors
///
/// Returns `TransformError::Regex` if there's an error compiling the tag
/// patterns.
pub fn filter_conditionals(input: &str) -> Result<String> {
    let normalize = Regex::new(r"\r\n|\n\r|\n|\r")?;
    let open = Regex::new(r"<!--\s*\[if (?P<negate>not)?\s*(?P<empty>empty)?\s*(?P<expression>[^\]]*)]\s*-->")?;
    let close = Regex::new(r"<!--\s*\[endif]\s*-->")?;

    // normalize line endings in order to be able to split line by line
    let normalized = normalize.replace_all(input, LINE_ENDING);

    let mut kept: Vec<&str> = Vec::new();
    let mut last_condition = false;
    let mut inside_condition = false;

    for line in normalized.split(LINE_ENDING) {
        if let Some(caps) = open.captures(line) {
            let expression = caps.name("expression").map_or("", |m| m.as_str());
            let bool_value = TRUE_STRINGS.contains(&expression.to_uppercase().as_str());
            let empty_value = expression.trim().is_empty();

            let value = if caps.name("empty").is_some() {
                empty_value
            } else {
                bool_value
            };
            last_condition = if caps.name("negate").is_some() {
                !value
            } else {
                value
            };
            inside_condition = true;
        } else if close.is_match(line) {
            inside_condition = false;
        } else if last_condition || !inside_condition {
            kept.push(line);
        }
    }

    Ok(kept
        .join(LINE_ENDING)
        .replace("_$_", "$")
        .trim_end()
        .to_string())
}
