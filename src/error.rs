//! Error taxonomy for translation runs
//!
//! Every violation detected while translating aborts the run. The first error is
//! carried back to the caller as a [`TranslationError`], which knows where in the
//! source it was raised and can render itself as a single user-facing report.

use std::fmt;
use thiserror::Error;

/// The category of a translation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Input ended where more structure was required
    UnexpectedEof,
    /// A required `{...}` argument was not found
    MissingArgument,
    /// Mixed tabs/spaces, or indentation that is not a multiple of the unit
    InvalidIndentation,
    /// Indentation deeper than permitted, or present where it is forbidden
    UnexpectedIndentation,
    /// Structural violations such as an unmatched `}` or a missing colon
    InvalidSyntax,
    /// A branch the grammar should make unreachable was reached
    InternalError,
    /// Failure reported by the body-executor collaborator
    DependencyError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::UnexpectedEof => "unexpected-eof",
            ErrorKind::MissingArgument => "missing-argument",
            ErrorKind::InvalidIndentation => "invalid-indentation",
            ErrorKind::UnexpectedIndentation => "unexpected-indentation",
            ErrorKind::InvalidSyntax => "invalid-syntax",
            ErrorKind::InternalError => "internal-error",
            ErrorKind::DependencyError => "dependency-error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A position in the source text.
///
/// `offset` is a byte offset; `line` and `column` are 1-based, with the column
/// counted in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl Location {
    /// Compute the location of `offset` inside `text`.
    ///
    /// Offsets past the end of the text are clamped to the end.
    pub fn from_offset(text: &str, offset: usize) -> Self {
        let mut offset = offset.min(text.len());
        while !text.is_char_boundary(offset) {
            offset -= 1;
        }
        let before = &text[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        let column = text[line_start..offset].chars().count() + 1;
        Location {
            offset,
            line,
            column,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// A failed translation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TranslationError {
    pub kind: ErrorKind,
    pub message: String,
    pub location: Option<Location>,
}

impl TranslationError {
    /// Create an error that has not been attached to a source position yet.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        TranslationError {
            kind,
            message: message.into(),
            location: None,
        }
    }

    pub fn internal() -> Self {
        Self::new(ErrorKind::InternalError, "Something went wrong")
    }

    /// Attach a location unless the error already carries one.
    pub fn or_at(mut self, location: Location) -> Self {
        if self.location.is_none() {
            self.location = Some(location);
        }
        self
    }

    /// Render the error as a report against the source it was raised in.
    ///
    /// ```text
    /// error[invalid-syntax]: Unexpected `}`
    ///  --> line 3, column 7
    ///   |
    /// 3 | some}thing
    ///   |     ^
    /// ```
    pub fn report(&self, source: &str) -> String {
        let mut out = format!("error[{}]: {}", self.kind, self.message);
        let Some(location) = self.location else {
            return out;
        };
        let line_text = source.lines().nth(location.line - 1).unwrap_or("");
        let gutter = location.line.to_string().len();
        let pad = " ".repeat(gutter);
        out.push_str(&format!("\n{pad}--> {location}"));
        out.push_str(&format!("\n{pad} |"));
        out.push_str(&format!("\n{} | {}", location.line, line_text));
        out.push_str(&format!(
            "\n{pad} | {}^",
            " ".repeat(location.column.saturating_sub(1))
        ));
        out
    }
}

/// Failure reported by the body-executor collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionFailure {
    /// No executor is configured for this run
    #[error("No code executor is available for this translation")]
    Unavailable,
    /// The executor process could not be started
    #[error("Failed to start the code executor: {0}")]
    Spawn(String),
    /// The executor process died or answered with something unreadable
    #[error("Something went wrong executing this block: {0}")]
    Crashed(String),
    /// The executor cannot run the requested interpreter
    #[error("This executor cannot run `{0}`")]
    Unsupported(String),
    /// The executed code raised an exception
    #[error("Execution failed: {0}")]
    Raised(String),
}

impl From<ExecutionFailure> for TranslationError {
    fn from(failure: ExecutionFailure) -> Self {
        TranslationError::new(ErrorKind::DependencyError, failure.to_string())
    }
}
