//! Per-run translation state
//!
//! A [`TranslationState`] is created at the start of one translation and
//! dropped at its end. It exclusively owns the cursor, the indentation unit,
//! the run's registry copy and the run's body executor; the parsing operations
//! in the sibling modules are implemented as methods on it.

use super::cursor::Cursor;
use super::indentation::IndentationState;
use crate::error::{ErrorKind, Location, TranslationError};
use crate::execution::{BodyExecutor, UnavailableExecutor};
use crate::registry::Registry;

/// Deepest nesting of groups, arguments and environment bodies in one run.
pub const MAX_NESTING: usize = 128;

pub struct TranslationState<'a> {
    pub(crate) cursor: Cursor<'a>,
    pub(crate) indentation: IndentationState,
    pub(crate) registry: Registry,
    /// False while the preamble is being read
    pub(crate) in_document: bool,
    pub(crate) executor: Box<dyn BodyExecutor>,
    depth: usize,
}

impl<'a> TranslationState<'a> {
    /// State over `text` with the built-in registry and no executor.
    pub fn new(text: &'a str) -> Self {
        TranslationState {
            cursor: Cursor::new(text),
            indentation: IndentationState::new(),
            registry: Registry::with_defaults(),
            in_document: false,
            executor: Box::new(UnavailableExecutor),
            depth: 0,
        }
    }

    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_executor(mut self, executor: Box<dyn BodyExecutor>) -> Self {
        self.executor = executor;
        self
    }

    pub fn with_indentation(mut self, indentation: IndentationState) -> Self {
        self.indentation = indentation;
        self
    }

    pub fn cursor(&self) -> &Cursor<'a> {
        &self.cursor
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn indentation(&self) -> &IndentationState {
        &self.indentation
    }

    pub fn in_document(&self) -> bool {
        self.in_document
    }

    pub fn location(&self) -> Location {
        Location::from_offset(self.cursor.text(), self.cursor.pos())
    }

    /// An error located at the cursor.
    pub(crate) fn error(&self, kind: ErrorKind, message: impl Into<String>) -> TranslationError {
        TranslationError::new(kind, message).or_at(self.location())
    }

    /// Locate an error at the cursor unless it already carries a location.
    pub(crate) fn locate(&self, err: TranslationError) -> TranslationError {
        err.or_at(self.location())
    }

    /// Run `parse` one nesting level deeper.
    ///
    /// Fails instead of recursing past [`MAX_NESTING`].
    pub(crate) fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, TranslationError>,
    ) -> Result<T, TranslationError> {
        if self.depth >= MAX_NESTING {
            return Err(self.error(ErrorKind::InvalidSyntax, "Nesting too deep"));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    /// Indentation level of the line at the cursor.
    pub(crate) fn indent_level(&mut self) -> Result<usize, TranslationError> {
        let location = self.location();
        self.indentation
            .indent_level(&self.cursor)
            .map_err(|e| e.or_at(location))
    }
}
