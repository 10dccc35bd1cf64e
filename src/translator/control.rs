//! Control sequences, groups and arguments
//!
//! A control sequence is a backslash followed by either a run of letters or a
//! single other character. Groups (`{...}`, `[...]`) are scanned with nested
//! groups, control sequences and comments kept intact; custom commands found
//! inside them are expanded.

use super::cursor::is_horizontal_whitespace;
use super::state::TranslationState;
use crate::error::{ErrorKind, TranslationError};
use crate::registry::{Command, ParamSpec, Presence};

impl<'a> TranslationState<'a> {
    /// Read the name of a control sequence.
    ///
    /// The cursor must be just past the backslash.
    pub fn parse_control_name(&mut self) -> Result<&'a str, TranslationError> {
        if self.cursor.is_finished() {
            return Err(self.error(
                ErrorKind::UnexpectedEof,
                "Unescaped backslashes must be followed by at least one character",
            ));
        }
        let name = self.cursor.skip_while(char::is_alphabetic);
        if !name.is_empty() {
            return Ok(name);
        }
        Ok(self.cursor.advance_one())
    }

    /// A control sequence inside a group or argument.
    ///
    /// Custom commands are expanded together with their arguments; everything
    /// else is passed through by name only.
    pub fn parse_arg_control(&mut self) -> Result<String, TranslationError> {
        let name = self.parse_control_name()?;
        match self.registry.command(name).cloned() {
            Some(command) => self.parse_custom_command(&command),
            None => Ok(format!("\\{}", name)),
        }
    }

    /// A `%` comment up to (not including) the end of the line.
    ///
    /// The cursor must be just past the percent sign.
    pub fn parse_comment(&mut self) -> String {
        format!("%{}", self.cursor.skip_until(|c| c == '\n'))
    }

    /// Scan the inside of a group up to and including the closing `end`.
    pub fn parse_group(&mut self, end: char) -> Result<String, TranslationError> {
        self.nested(|state| state.scan_group(end))
    }

    fn scan_group(&mut self, end: char) -> Result<String, TranslationError> {
        let mut body = String::new();
        loop {
            body.push_str(
                self.cursor
                    .skip_until(|c| c == end || matches!(c, '{' | '}' | '\\' | '%')),
            );
            match self.cursor.peek() {
                None => {
                    return Err(self.error(
                        ErrorKind::UnexpectedEof,
                        format!("Missing closing `{}`", end),
                    ))
                }
                Some(c) if c == end => {
                    self.cursor.advance_one();
                    return Ok(body);
                }
                Some('}') => return Err(self.error(ErrorKind::InvalidSyntax, "Unexpected `}`")),
                Some('{') => {
                    self.cursor.advance_one();
                    body.push('{');
                    body.push_str(&self.parse_group('}')?);
                    body.push('}');
                }
                Some('\\') => {
                    self.cursor.advance_one();
                    body.push_str(&self.parse_arg_control()?);
                }
                Some('%') => {
                    self.cursor.advance_one();
                    body.push_str(&self.parse_comment());
                }
                Some(_) => return Err(self.locate(TranslationError::internal())),
            }
        }
    }

    /// Scan literally up to an unescaped `close`.
    ///
    /// Returns `None` without restoring the cursor if the input (or, for
    /// `single_line`, the line) ends first.
    fn scan_raw(&mut self, close: char, single_line: bool) -> Option<String> {
        let mut body = String::new();
        loop {
            body.push_str(
                self.cursor
                    .skip_until(|c| c == close || c == '\\' || (single_line && c == '\n')),
            );
            match self.cursor.peek() {
                Some('\\') => {
                    body.push_str(self.cursor.advance_one());
                    if !(single_line && self.cursor.at('\n')) {
                        body.push_str(self.cursor.advance_one());
                    }
                }
                Some(c) if c == close => {
                    self.cursor.advance_one();
                    return Some(body);
                }
                _ => return None,
            }
        }
    }

    /// Probe for a `[...]` argument.
    ///
    /// Absence is not an error: if there is no `[`, or the line ends before the
    /// closing `]`, the cursor is restored and `None` is returned.
    pub fn parse_optional_arg(&mut self, raw: bool) -> Result<Option<String>, TranslationError> {
        let start = self.cursor.checkpoint();
        self.cursor.skip_while(is_horizontal_whitespace);
        if !self.cursor.at('[') {
            self.cursor.restore(start);
            return Ok(None);
        }
        self.cursor.advance_one();
        let contents = if raw {
            self.scan_raw(']', true)
        } else {
            self.parse_optional_argstr()?
        };
        if contents.is_none() {
            self.cursor.restore(start);
        }
        Ok(contents)
    }

    /// A `{...}` argument for the control sequence `name`.
    pub fn parse_required_arg(&mut self, name: &str, raw: bool) -> Result<String, TranslationError> {
        self.cursor.skip_while(is_horizontal_whitespace);
        if self.cursor.is_finished() {
            return Err(self.error(
                ErrorKind::UnexpectedEof,
                format!("Missing required argument for `{}`", name),
            ));
        }
        if !self.cursor.at('{') {
            return Err(self.error(
                ErrorKind::MissingArgument,
                format!("Missing required argument for `{}`", name),
            ));
        }
        self.cursor.advance_one();
        if !raw {
            return self.parse_group('}');
        }
        match self.scan_raw('}', false) {
            Some(body) => Ok(body),
            None => Err(self.error(
                ErrorKind::UnexpectedEof,
                format!("Missing closing `}}` for `{}`", name),
            )),
        }
    }

    /// One argument per slot of `spec`, in order.
    pub fn parse_args(
        &mut self,
        name: &str,
        spec: &ParamSpec,
    ) -> Result<Vec<Option<String>>, TranslationError> {
        spec.iter()
            .map(|param| match param.presence {
                Presence::Required => self.parse_required_arg(name, param.is_raw()).map(Some),
                Presence::Optional => self.parse_optional_arg(param.is_raw()),
            })
            .collect()
    }

    /// Inside of an optional argument of a native control sequence.
    ///
    /// Like [`parse_group`](Self::parse_group) for `]`, but gives up (returning
    /// `None`) at a newline, a comment or the end of the input.
    pub fn parse_optional_argstr(&mut self) -> Result<Option<String>, TranslationError> {
        self.nested(|state| state.scan_optional_argstr())
    }

    fn scan_optional_argstr(&mut self) -> Result<Option<String>, TranslationError> {
        let start = self.cursor.checkpoint();
        let mut body = String::new();
        loop {
            body.push_str(
                self.cursor
                    .skip_until(|c| matches!(c, '\n' | '{' | '}' | '\\' | '[' | ']' | '%')),
            );
            match self.cursor.peek() {
                None | Some('\n') | Some('%') => {
                    self.cursor.restore(start);
                    return Ok(None);
                }
                Some(']') => {
                    self.cursor.advance_one();
                    return Ok(Some(body));
                }
                Some('}') => return Err(self.error(ErrorKind::InvalidSyntax, "Unexpected `}`")),
                Some('{') => {
                    self.cursor.advance_one();
                    body.push('{');
                    body.push_str(&self.parse_group('}')?);
                    body.push('}');
                }
                Some('[') => {
                    self.cursor.advance_one();
                    body.push('[');
                    body.push_str(&self.parse_group(']')?);
                    body.push(']');
                }
                Some('\\') => {
                    self.cursor.advance_one();
                    body.push_str(&self.parse_arg_control()?);
                }
                Some(_) => return Err(self.locate(TranslationError::internal())),
            }
        }
    }

    /// The argument text following a native control sequence, kept verbatim.
    ///
    /// Arguments may be separated by horizontal whitespace but not by newlines.
    pub fn parse_argstr(&mut self) -> Result<String, TranslationError> {
        let mut argstr = String::new();
        loop {
            let before = self.cursor.checkpoint();
            let space = self.cursor.skip_while(is_horizontal_whitespace);
            match self.cursor.peek() {
                Some('{') => {
                    self.cursor.advance_one();
                    let group = self.parse_group('}')?;
                    argstr.push_str(space);
                    argstr.push('{');
                    argstr.push_str(&group);
                    argstr.push('}');
                }
                Some('[') => {
                    self.cursor.advance_one();
                    match self.parse_optional_argstr()? {
                        Some(group) => {
                            argstr.push_str(space);
                            argstr.push('[');
                            argstr.push_str(&group);
                            argstr.push(']');
                        }
                        None => {
                            self.cursor.restore(before);
                            return Ok(argstr);
                        }
                    }
                }
                _ => {
                    self.cursor.restore(before);
                    return Ok(argstr);
                }
            }
        }
    }

    /// Parse the arguments of a registered command and generate its output.
    pub fn parse_custom_command(&mut self, command: &Command) -> Result<String, TranslationError> {
        let args = self.parse_args(command.name(), command.params())?;
        log::debug!("expanding command `{}`", command.name());
        command.generate(&args).map_err(|e| self.locate(e))
    }
}
