//! Indentation tracking
//!
//! The indentation unit is discovered lazily: the first non-empty indentation
//! seen in a run becomes the unit, and every later indentation is measured in
//! whole multiples of it.

use super::cursor::{is_horizontal_whitespace, Cursor};
use crate::error::{ErrorKind, TranslationError};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndentationState {
    unit: Option<String>,
}

impl IndentationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an already established unit.
    pub fn with_unit(unit: impl Into<String>) -> Self {
        IndentationState {
            unit: Some(unit.into()),
        }
    }

    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    /// The indentation string for `level`; empty while no unit is established.
    pub fn prefix(&self, level: usize) -> String {
        self.unit.as_deref().unwrap_or("").repeat(level)
    }

    /// Measure `indent` in units, establishing the unit on first use.
    pub fn level_of(&mut self, indent: &str) -> Result<usize, TranslationError> {
        validate(indent)?;
        if indent.is_empty() {
            return Ok(0);
        }
        if self.unit.is_none() {
            log::trace!("indentation unit established as {:?}", indent);
        }
        let unit = self.unit.get_or_insert_with(|| indent.to_string());
        if !indent.starts_with(&unit[..1]) {
            return Err(TranslationError::new(
                ErrorKind::InvalidIndentation,
                format!(
                    "Indentation must use the same character as the base indentation {:?}",
                    unit
                ),
            ));
        }
        if indent.len() % unit.len() != 0 {
            return Err(TranslationError::new(
                ErrorKind::InvalidIndentation,
                format!(
                    "Indentation must be in multiples of the base indentation {:?}",
                    unit
                ),
            ));
        }
        Ok(indent.len() / unit.len())
    }

    /// Indentation level of the line starting at the cursor.
    pub fn indent_level(&mut self, cursor: &Cursor<'_>) -> Result<usize, TranslationError> {
        self.level_of(line_indentation(cursor))
    }
}

/// Fail unless `indent` is empty, all spaces or all tabs.
pub fn validate(indent: &str) -> Result<(), TranslationError> {
    if indent.chars().all(|c| c == ' ') || indent.chars().all(|c| c == '\t') {
        Ok(())
    } else {
        Err(TranslationError::new(
            ErrorKind::InvalidIndentation,
            "Indentation must be all spaces or all tabs",
        ))
    }
}

/// The horizontal whitespace at the cursor, without consuming it.
pub fn line_indentation<'a>(cursor: &Cursor<'a>) -> &'a str {
    let rest = cursor.rest();
    let end = rest
        .find(|c: char| !is_horizontal_whitespace(c))
        .unwrap_or(rest.len());
    &rest[..end]
}

/// True if the line at the cursor holds nothing but horizontal whitespace.
pub fn line_is_empty(cursor: &Cursor<'_>) -> bool {
    cursor.rest_of_line().chars().all(is_horizontal_whitespace)
}

/// Consume blank lines starting at the cursor.
///
/// Each consumed line keeps its newline. A trailing whitespace-only line with
/// no newline is consumed as well; otherwise the cursor is left at the start
/// of the next line with content.
pub fn skip_empty_lines<'a>(cursor: &mut Cursor<'a>) -> &'a str {
    let start = cursor.checkpoint();
    loop {
        let line = cursor.checkpoint();
        cursor.skip_while(is_horizontal_whitespace);
        if cursor.is_finished() {
            break;
        }
        if cursor.at('\n') {
            cursor.advance_one();
            continue;
        }
        cursor.restore(line);
        break;
    }
    cursor.since(start)
}
