//! Blocks and environment bodies
//!
//! A block is a run of lines at one indentation level. Lines are copied through
//! with their control sequences dispatched; an environment opener (`\name:`)
//! either takes the rest of its line as a one-liner body or the following lines
//! indented exactly one level deeper as a block body.
//!
//! Block text never includes the newline that ends it: parsing stops on that
//! newline (before any trailing blank lines) so the enclosing block re-emits it.

use super::cursor::is_horizontal_whitespace;
use super::indentation::skip_empty_lines;
use super::state::TranslationState;
use crate::error::{ErrorKind, TranslationError};
use crate::registry::builtins::latex_env;
use crate::registry::{ControlKind, Environment, GenerateContext};

/// The scanned body of an environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvBody {
    pub text: String,
    /// True for indented block bodies, false for one-liners
    pub block: bool,
}

impl EnvBody {
    fn oneliner(text: impl Into<String>) -> Self {
        EnvBody {
            text: text.into(),
            block: false,
        }
    }

    fn block(text: String) -> Self {
        EnvBody { text, block: true }
    }
}

impl<'a> TranslationState<'a> {
    /// Parse a block starting at the beginning of a line.
    ///
    /// Leading blank lines are kept. The level of the first non-blank line is
    /// the level of the whole block.
    pub fn parse_block(&mut self) -> Result<String, TranslationError> {
        let empty = skip_empty_lines(&mut self.cursor);
        if self.cursor.is_finished() {
            return Ok(empty.to_string());
        }
        let level = self.indent_level()?;
        let block = self.parse_block_lines(level)?;
        Ok(format!("{}{}", empty, block))
    }

    /// Parse lines at `level` until a shallower line or the end of the input.
    pub fn parse_block_lines(&mut self, level: usize) -> Result<String, TranslationError> {
        log::trace!("entering block at level {}", level);
        let mut body = String::new();
        loop {
            body.push_str(&self.parse_line(level)?);
            if self.cursor.is_finished() {
                break;
            }

            let end_of_line = self.cursor.checkpoint();
            self.cursor.advance_one();
            let empty = skip_empty_lines(&mut self.cursor);
            if self.cursor.is_finished() {
                self.cursor.restore(end_of_line);
                break;
            }
            let next = self.indent_level()?;
            if next < level {
                self.cursor.restore(end_of_line);
                break;
            }
            if next > level {
                return Err(self.error(
                    ErrorKind::UnexpectedIndentation,
                    "Indentation should only follow environments",
                ));
            }
            body.push('\n');
            body.push_str(empty);
        }
        log::trace!("leaving block at level {}", level);
        Ok(body)
    }

    /// Parse the rest of the current line, stopping on its newline.
    pub fn parse_line(&mut self, level: usize) -> Result<String, TranslationError> {
        self.nested(|state| state.scan_line(level, false))
    }

    /// Parse a one-liner body.
    ///
    /// Stops before a `%` comment so the comment lands after the closing marker
    /// of the environment.
    pub fn parse_oneliner(&mut self, level: usize) -> Result<String, TranslationError> {
        self.nested(|state| state.scan_line(level, true))
    }

    fn scan_line(&mut self, level: usize, stop_at_comment: bool) -> Result<String, TranslationError> {
        let mut line = String::new();
        loop {
            line.push_str(
                self.cursor
                    .skip_until(|c| matches!(c, '\\' | '\n' | '{' | '}' | '%')),
            );
            match self.cursor.peek() {
                None | Some('\n') => return Ok(line),
                Some('%') if stop_at_comment => return Ok(line),
                Some('%') => {
                    self.cursor.advance_one();
                    line.push_str(&self.parse_comment());
                }
                Some('\\') => line.push_str(&self.parse_block_control(level)?),
                Some('{') => {
                    self.cursor.advance_one();
                    line.push('{');
                    line.push_str(&self.parse_group('}')?);
                    line.push('}');
                }
                Some('}') => return Err(self.error(ErrorKind::InvalidSyntax, "Unexpected `}`")),
                Some(_) => return Err(self.locate(TranslationError::internal())),
            }
        }
    }

    /// Dispatch a control sequence met in a block at `level`.
    ///
    /// The cursor must be on the backslash.
    pub fn parse_block_control(&mut self, level: usize) -> Result<String, TranslationError> {
        self.cursor.advance_one();
        let name = self.parse_control_name()?;
        match self.registry.classify(name) {
            ControlKind::Command(command) => self.parse_custom_command(&command),
            ControlKind::Environment(environment) => {
                self.parse_custom_environment(&environment, level)
            }
            ControlKind::Native => self.parse_native_control(name, level),
        }
    }

    /// An unregistered control sequence: passed through, or wrapped in
    /// `\begin{name}`/`\end{name}` when its arguments are followed by a colon.
    pub fn parse_native_control(
        &mut self,
        name: &str,
        level: usize,
    ) -> Result<String, TranslationError> {
        if !name.chars().all(char::is_alphabetic) {
            return Ok(format!("\\{}", name));
        }
        let argstr = self.parse_argstr()?;
        let start = self.cursor.checkpoint();
        self.cursor.skip_while(is_horizontal_whitespace);
        if !self.cursor.at(':') {
            self.cursor.restore(start);
            return Ok(format!("\\{}{}", name, argstr));
        }
        self.cursor.advance_one();

        log::debug!("opening native environment `{}`", name);
        let body = self.parse_environment_body(level)?;
        let mut text = body.text;
        if body.block {
            text.push('\n');
            text.push_str(&self.indentation.prefix(level));
        }
        Ok(latex_env(name, &argstr, &text))
    }

    /// A registered environment: arguments, colon, body, then generation.
    pub fn parse_custom_environment(
        &mut self,
        environment: &Environment,
        level: usize,
    ) -> Result<String, TranslationError> {
        let args = self.parse_args(environment.name(), environment.params())?;
        self.cursor.skip_while(is_horizontal_whitespace);
        match self.cursor.peek() {
            Some(':') => {
                self.cursor.advance_one();
            }
            None => {
                return Err(self.error(
                    ErrorKind::UnexpectedEof,
                    "Environments must be followed by colons",
                ))
            }
            Some(_) => {
                return Err(self.error(
                    ErrorKind::InvalidSyntax,
                    "Environments must be followed by colons",
                ))
            }
        }

        let body = if environment.is_raw() {
            self.parse_raw_environment_body(level)?
        } else {
            self.parse_environment_body(level)?
        };
        let text = if body.block {
            dedent_body(&body.text, &self.indentation.prefix(level + 1))
        } else {
            body.text
        };

        log::debug!("expanding environment `{}`", environment.name());
        let unit = self.indentation.unit().unwrap_or_default().to_string();
        let generated = {
            let mut ctx = GenerateContext::new(&unit, self.executor.as_mut());
            environment.generate(&mut ctx, &text, &args)
        };
        let output = generated.map_err(|e| self.locate(e))?;
        Ok(indent_after_first_line(
            &output,
            &self.indentation.prefix(level),
        ))
    }

    /// The body following an environment colon, interpreted.
    pub fn parse_environment_body(&mut self, level: usize) -> Result<EnvBody, TranslationError> {
        self.cursor.skip_while(is_horizontal_whitespace);
        match self.cursor.peek() {
            None => {
                return Err(self.error(ErrorKind::UnexpectedEof, "Environment missing body"))
            }
            Some('\n') | Some('%') => {}
            Some(_) => return Ok(EnvBody::oneliner(self.parse_oneliner(level)?)),
        }

        let comment = if self.cursor.at('%') {
            self.cursor.advance_one();
            Some(self.parse_comment())
        } else {
            None
        };
        let (empty, child) = self.enter_block_body(level)?;

        let mut text = String::new();
        if let Some(comment) = comment {
            text.push('\n');
            text.push_str(&self.indentation.prefix(child));
            text.push_str(&comment);
        }
        text.push_str(empty);
        text.push_str(&self.parse_block_lines(child)?);
        Ok(EnvBody::block(text))
    }

    /// The body following an environment colon, taken literally.
    pub fn parse_raw_environment_body(
        &mut self,
        level: usize,
    ) -> Result<EnvBody, TranslationError> {
        self.cursor.skip_while(is_horizontal_whitespace);
        match self.cursor.peek() {
            None => {
                return Err(self.error(ErrorKind::UnexpectedEof, "Environment missing body"))
            }
            Some('\n') => {}
            Some(_) => return Ok(EnvBody::oneliner(self.cursor.skip_until(|c| c == '\n'))),
        }

        let (empty, child) = self.enter_block_body(level)?;
        let lines = self.raw_block_lines(child)?;
        Ok(EnvBody::block(format!("{}{}", empty, lines)))
    }

    /// Skip to the first line of a block body and check it is one level deeper.
    fn enter_block_body(&mut self, level: usize) -> Result<(&'a str, usize), TranslationError> {
        let empty = skip_empty_lines(&mut self.cursor);
        if self.cursor.is_finished() {
            return Err(self.error(ErrorKind::UnexpectedEof, "Environment missing body"));
        }
        let child = self.indent_level()?;
        if child != level + 1 {
            return Err(self.error(
                ErrorKind::InvalidSyntax,
                "Missing indentation after environment",
            ));
        }
        Ok((empty, child))
    }

    /// Lines at `level` taken literally, with interior blank lines.
    ///
    /// Only the indentation is checked: a deeper line is an error, a shallower
    /// one ends the body.
    fn raw_block_lines(&mut self, level: usize) -> Result<&'a str, TranslationError> {
        let start = self.cursor.checkpoint();
        loop {
            self.cursor.skip_until(|c| c == '\n');
            if self.cursor.is_finished() {
                break;
            }
            let end_of_line = self.cursor.checkpoint();
            self.cursor.advance_one();
            skip_empty_lines(&mut self.cursor);
            if self.cursor.is_finished() {
                self.cursor.restore(end_of_line);
                break;
            }
            let next = self.indent_level()?;
            if next < level {
                self.cursor.restore(end_of_line);
                break;
            }
            if next > level {
                return Err(self.error(
                    ErrorKind::UnexpectedIndentation,
                    "Indentation should only follow environments",
                ));
            }
        }
        Ok(self.cursor.since(start))
    }
}

/// Strip `prefix` from every line of a block body.
///
/// The result starts and ends with a newline. Blank lines shorter than the
/// prefix become empty.
fn dedent_body(text: &str, prefix: &str) -> String {
    let mut body = String::new();
    for line in text.split('\n').skip(1) {
        body.push('\n');
        match line.strip_prefix(prefix) {
            Some(rest) => body.push_str(rest),
            None if line.chars().all(is_horizontal_whitespace) => {}
            None => body.push_str(line),
        }
    }
    body.push('\n');
    body
}

/// Prefix every non-empty line after the first with `prefix`.
fn indent_after_first_line(text: &str, prefix: &str) -> String {
    if prefix.is_empty() {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
            if !line.is_empty() {
                out.push_str(prefix);
            }
        }
        out.push_str(line);
    }
    out
}
