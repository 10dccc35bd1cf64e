//! Cursor over the source text
//!
//! The cursor owns nothing but an offset into an immutable buffer. It only moves
//! forward through the primitive scans below; speculative parses take a
//! [`Checkpoint`] and restore it explicitly when the thing they probed for is
//! absent.

/// A saved cursor position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint(usize);

#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(text: &'a str) -> Self {
        Cursor { text, pos: 0 }
    }

    pub fn text(&self) -> &'a str {
        self.text
    }

    /// Current byte offset, always on a character boundary.
    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn is_finished(&self) -> bool {
        self.pos >= self.text.len()
    }

    /// The unconsumed part of the text.
    pub fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// True if the next character is `c`.
    pub fn at(&self, c: char) -> bool {
        self.peek() == Some(c)
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.pos)
    }

    pub fn restore(&mut self, checkpoint: Checkpoint) {
        self.pos = checkpoint.0;
    }

    /// Text consumed since `checkpoint`.
    pub fn since(&self, checkpoint: Checkpoint) -> &'a str {
        &self.text[checkpoint.0..self.pos]
    }

    /// Consume a maximal run of characters satisfying `pred`.
    ///
    /// Returns the consumed text, which is empty when nothing matched or the
    /// cursor is at the end of the input.
    pub fn skip_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        let consumed: usize = self
            .rest()
            .chars()
            .take_while(|&c| pred(c))
            .map(char::len_utf8)
            .sum();
        self.pos += consumed;
        &self.text[start..self.pos]
    }

    /// Consume characters up to (not including) the first one satisfying `pred`.
    pub fn skip_until(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        self.skip_while(|c| !pred(c))
    }

    /// Consume exactly one character, or nothing at the end of the input.
    pub fn advance_one(&mut self) -> &'a str {
        match self.peek() {
            Some(c) => {
                let start = self.pos;
                self.pos += c.len_utf8();
                &self.text[start..self.pos]
            }
            None => "",
        }
    }

    /// Byte offset of the start of the line containing the cursor.
    pub fn line_start(&self) -> usize {
        self.text[..self.pos].rfind('\n').map(|i| i + 1).unwrap_or(0)
    }

    /// The rest of the current line, without its newline.
    pub fn rest_of_line(&self) -> &'a str {
        let rest = self.rest();
        match rest.find('\n') {
            Some(end) => &rest[..end],
            None => rest,
        }
    }
}

/// Horizontal whitespace: anything `char::is_whitespace` except the newline.
pub fn is_horizontal_whitespace(c: char) -> bool {
    c.is_whitespace() && c != '\n'
}
