//! Preamble and document driver
//!
//! The root of a source file is a preamble of control-sequence lines, a
//! delimiter line of three or more `=`, and the document body:
//!
//! ```text
//! \docclass{article}
//! \usepackage{amsmath}
//! ===
//! Text of the document.
//! ```
//!
//! The body becomes `\begin{document}`/`\end{document}`; the preamble is copied
//! through with its control sequences dispatched.

use super::indentation::{line_indentation, line_is_empty, skip_empty_lines};
use super::state::TranslationState;
use crate::error::{ErrorKind, TranslationError};
use crate::registry::builtins::latex_env;
use once_cell::sync::Lazy;
use regex::Regex;

/// Start of a document delimiter line
static DELIMITER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[ \t]*={3,}").unwrap());

/// A complete, well-formed delimiter line
static DELIMITER_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[ \t]*={3,}[ \t]*$").unwrap());

impl<'a> TranslationState<'a> {
    /// Translate a whole source file: preamble, delimiter and document.
    pub fn parse_root(&mut self) -> Result<String, TranslationError> {
        let mut out = String::new();
        loop {
            if DELIMITER.is_match(self.cursor.rest_of_line()) {
                out.push_str(&self.parse_document()?);
                return Ok(out);
            }

            if line_is_empty(&self.cursor) {
                out.push_str(self.cursor.skip_until(|c| c == '\n'));
            } else if !line_indentation(&self.cursor).is_empty() {
                return Err(self.error(
                    ErrorKind::UnexpectedIndentation,
                    "The preamble must not be indented",
                ));
            } else if self.cursor.at('\\') || self.cursor.at('%') {
                out.push_str(&self.parse_line(0)?);
            } else {
                return Err(self.error(
                    ErrorKind::InvalidSyntax,
                    "Only control sequences may appear in the preamble",
                ));
            }

            if self.cursor.is_finished() {
                return Err(self.error(ErrorKind::UnexpectedEof, "Missing document body"));
            }
            self.cursor.advance_one();
            out.push('\n');
        }
    }

    /// The delimiter line and everything after it.
    ///
    /// The cursor must be at the start of the delimiter line.
    pub fn parse_document(&mut self) -> Result<String, TranslationError> {
        if !DELIMITER_LINE.is_match(self.cursor.rest_of_line()) {
            return Err(self.error(
                ErrorKind::InvalidSyntax,
                "Missing newline after document delimiter",
            ));
        }
        self.cursor.skip_until(|c| c == '\n');
        if self.cursor.is_finished() {
            return Err(self.error(ErrorKind::UnexpectedEof, "Missing document body"));
        }
        self.cursor.advance_one();
        self.in_document = true;
        log::trace!("document body starts at offset {}", self.cursor.pos());

        let start = self.cursor.checkpoint();
        let empty = skip_empty_lines(&mut self.cursor);
        let body = if self.cursor.is_finished() {
            self.cursor.restore(start);
            String::new()
        } else if !line_indentation(&self.cursor).is_empty() {
            return Err(self.error(
                ErrorKind::UnexpectedIndentation,
                "The document as a whole must not be indented",
            ));
        } else {
            format!("{}{}", empty, self.parse_block_lines(0)?)
        };

        let trailing = self.cursor.skip_while(|_| true);
        Ok(format!(
            "{}{}",
            latex_env("document", "", &format!("\n{}\n", body)),
            trailing
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root(source: &str) -> Result<String, TranslationError> {
        TranslationState::new(source).parse_root()
    }

    #[test]
    fn test_preamble_and_document() {
        assert_eq!(
            root("\\documentclass{article}\n===\nHey!").unwrap(),
            "\\documentclass{article}\n\\begin{document}\nHey!\n\\end{document}"
        );
    }

    #[test]
    fn test_empty_preamble() {
        assert_eq!(
            root("===\nHey!").unwrap(),
            "\\begin{document}\nHey!\n\\end{document}"
        );
    }

    #[test]
    fn test_blank_lines_are_kept() {
        assert_eq!(
            root("\\documentclass{article}\n\n===\nHey!").unwrap(),
            "\\documentclass{article}\n\n\\begin{document}\nHey!\n\\end{document}"
        );
        assert_eq!(
            root("\\documentclass{article}\n===\n\nHey!").unwrap(),
            "\\documentclass{article}\n\\begin{document}\n\nHey!\n\\end{document}"
        );
    }

    #[test]
    fn test_trailing_whitespace_follows_document() {
        assert_eq!(
            root("===\nHey!\n").unwrap(),
            "\\begin{document}\nHey!\n\\end{document}\n"
        );
        assert_eq!(
            root("===\n  \n").unwrap(),
            "\\begin{document}\n\n\\end{document}  \n"
        );
    }

    #[test]
    fn test_longer_delimiter() {
        assert_eq!(
            root("\\documentclass{article}\n======\n===Hey!\n").unwrap(),
            "\\documentclass{article}\n\\begin{document}\n===Hey!\n\\end{document}\n"
        );
    }

    #[test]
    fn test_preamble_environments() {
        assert_eq!(
            root("\\documentclass{article}\n\\equation:\n    f(x)\n===\nHey!\nHey again!")
                .unwrap(),
            "\\documentclass{article}\n\\begin{equation}\n    f(x)\n\\end{equation}\n\\begin{document}\nHey!\nHey again!\n\\end{document}"
        );
        assert_eq!(
            root("\\documentclass{article}\n\\equation:    f(x)\n===\nHey!").unwrap(),
            "\\documentclass{article}\n\\begin{equation}f(x)\\end{equation}\n\\begin{document}\nHey!\n\\end{document}"
        );
    }

    #[test]
    fn test_preamble_comments() {
        assert_eq!(
            root("% setup\n\\docclass{article} % class\n===\nx").unwrap(),
            "% setup\n\\documentclass{article} % class\n\\begin{document}\nx\n\\end{document}"
        );
    }

    #[test]
    fn test_missing_document() {
        for source in ["\\documentclass{article}\n===", "\\documentclass{article}", ""] {
            let err = root(source).unwrap_err();
            assert_eq!(err.kind, ErrorKind::UnexpectedEof, "{:?}", source);
            assert!(err.message.contains("Missing document body"));
        }
    }

    #[test]
    fn test_text_after_delimiter() {
        let err = root("\\documentclass{article}\n===123").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidSyntax);
        assert_eq!(err.location.unwrap().line, 2);
    }

    #[test]
    fn test_indented_document() {
        let err = root("\\documentclass{article}\n===\n  123").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnexpectedIndentation);
        assert!(err
            .message
            .contains("document as a whole must not be indented"));
    }

    #[test]
    fn test_text_in_preamble() {
        let err = root("Hello\n===\nx").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidSyntax);
        assert!(err.message.contains("Only control sequences"));
    }

    #[test]
    fn test_indented_preamble() {
        let err = root("  \\usepackage{x}\n===\nx").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnexpectedIndentation);
    }

    #[test]
    fn test_document_flag() {
        let mut state = TranslationState::new("===\nx");
        assert!(!state.in_document());
        state.parse_root().unwrap();
        assert!(state.in_document());
    }
}
