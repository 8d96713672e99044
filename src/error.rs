//! Error taxonomy.
//!
//! - [`TemplateError`]: the template source is malformed. Raised by
//!   [`Template::compile`](crate::Template::compile) before any input is read.
//! - [`ParseError`]: a rule with an `Error` action matched an input line. The
//!   run is aborted.
//! - [`Error`]: crate-level wrapper used by the convenience API and file
//!   loading.
//!
//! Unmatched input lines and records dropped for a missing `Required` value
//! are policy outcomes and never surface here.

use std::path::PathBuf;

/// A template failed to compile.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("template line {line}: {message}")]
pub struct TemplateError {
    /// 1-based line in the template source (0 when the error is not tied to a line).
    pub line: usize,
    pub message: String,
}

impl TemplateError {
    pub(crate) fn new(line: usize, message: impl Into<String>) -> Self {
        TemplateError { line, message: message.into() }
    }
}

/// An explicit `Error` action was reached while parsing input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("input line {line} in state '{state}': {}", .message.as_deref().unwrap_or("state error raised"))]
pub struct ParseError {
    /// 1-based input line number.
    pub line: usize,
    /// State that was current when the rule matched.
    pub state: String,
    /// Message given to the `Error` action, if any.
    pub message: Option<String>,
    /// The offending input line.
    pub text: String,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("failed to read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
