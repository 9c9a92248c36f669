//! # varsubst
//!
//! A template-transformation library and CLI tool for materializing
//! environment-specific configuration files from a single template plus a
//! set of named variables.
//!
//! ## Features
//!
//! - Expand `${name}` and `${name:default}` placeholders
//! - Recursive expansion of variables that reference other variables
//! - Environment variables override supplied variables of the same name
//! - `$[name]` references inside default values
//! - `_$_{...}` escaping for literal `${...}` output
//! - Line-oriented `<!--[if ...]-->` / `<!--[endif]-->` conditional blocks
//! - Missing variables render as visible `!!Missing variable for name!!`
//!   markers and are reported as usage diagnostics
//!
//! ## Usage
//!
//! ### As a Library
//!
//! ```
//! use varsubst::{Resolver, Variable};
//!
//! let variables = vec![Variable::new("Host", "db.example.com")];
//! let resolver = Resolver::without_env(variables);
//!
//! let output = resolver.transform("server=${Host}:${Port:5432}").unwrap();
//! assert_eq!(output.text, "server=db.example.com:5432");
//! assert!(!output.has_missing());
//! ```
//!
//! ### As a CLI Tool
//!
//! ```bash
//! # Transform a template file
//! varsubst app.config.template -s Host=db.example.com
//!
//! # Transform from stdin
//! echo 'host=${Host:localhost}' | varsubst -
//!
//! # Report missing variables without writing output
//! varsubst app.config.template --check
//! ```

pub mod conditional;
pub mod error;
pub mod placeholder;
pub mod resolver;
pub mod variables;

// Re-export main types and functions for convenience
pub use conditional::filter_conditionals;
pub use error::{Result, TransformError};
pub use placeholder::{Placeholder, find_placeholders};
pub use resolver::{MAX_EXPANSION_DEPTH, Resolver, TransformOutput};
pub use variables::{Variable, VariableUsage};
