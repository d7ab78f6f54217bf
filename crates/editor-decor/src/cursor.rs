//! A scanning cursor over one line of text, handed to overlay tokenizers.
//!
//! Positions are byte offsets into the line (always on `char` boundaries). The overlay engine
//! converts them to document character offsets when it emits decorations.

use regex::{Captures, Regex};
use unicode_width::UnicodeWidthChar;

/// Something that can accept or reject a single character.
pub trait CharPredicate {
    /// Returns `true` if `ch` is accepted.
    fn accepts(&self, ch: char) -> bool;
}

impl CharPredicate for char {
    fn accepts(&self, ch: char) -> bool {
        *self == ch
    }
}

impl<F> CharPredicate for F
where
    F: Fn(char) -> bool,
{
    fn accepts(&self, ch: char) -> bool {
        self(ch)
    }
}

/// Cursor over the text of a single line.
#[derive(Debug, Clone)]
pub struct LineCursor<'a> {
    text: &'a str,
    pos: usize,
    start: usize,
    tab_size: usize,
    indent_unit: usize,
}

impl<'a> LineCursor<'a> {
    /// Create a cursor at the start of `text`.
    pub fn new(text: &'a str, tab_size: usize, indent_unit: usize) -> Self {
        Self {
            text,
            pos: 0,
            start: 0,
            tab_size: tab_size.max(1),
            indent_unit,
        }
    }

    /// The whole line.
    pub fn text(&self) -> &'a str {
        self.text
    }

    /// Current byte position.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Byte position where the current token started.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Mark the current position as the start of the next token.
    pub(crate) fn begin_token(&mut self) {
        self.start = self.pos;
    }

    /// Tab width in columns.
    pub fn tab_size(&self) -> usize {
        self.tab_size
    }

    /// Indentation unit width in columns.
    pub fn indent_unit(&self) -> usize {
        self.indent_unit
    }

    /// At the end of the line?
    pub fn eol(&self) -> bool {
        self.pos >= self.text.len()
    }

    /// At the start of the line?
    pub fn sol(&self) -> bool {
        self.pos == 0
    }

    /// The next character, without consuming it.
    pub fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    /// Consume and return the next character.
    pub fn next_char(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    /// Consume the next character if `pred` accepts it.
    pub fn eat<P: CharPredicate>(&mut self, pred: P) -> Option<char> {
        self.eat_by(&pred)
    }

    fn eat_by<P: CharPredicate>(&mut self, pred: &P) -> Option<char> {
        let ch = self.peek()?;
        if pred.accepts(ch) {
            self.pos += ch.len_utf8();
            Some(ch)
        } else {
            None
        }
    }

    /// Consume characters while `pred` accepts them; returns `true` if any were consumed.
    pub fn eat_while<P: CharPredicate>(&mut self, pred: P) -> bool {
        let start = self.pos;
        while self.eat_by(&pred).is_some() {}
        self.pos > start
    }

    /// Consume whitespace; returns `true` if any was consumed.
    pub fn eat_space(&mut self) -> bool {
        self.eat_while(char::is_whitespace)
    }

    /// Move to the end of the line.
    pub fn skip_to_end(&mut self) {
        self.pos = self.text.len();
    }

    /// Move to the next occurrence of `ch` (not consuming it); returns `false` if there is none.
    pub fn skip_to(&mut self, ch: char) -> bool {
        match self.text[self.pos..].find(ch) {
            Some(idx) => {
                self.pos += idx;
                true
            }
            None => false,
        }
    }

    /// Test whether the rest of the line starts with `pattern`, consuming it if `consume` is set.
    pub fn match_str(&mut self, pattern: &str, consume: bool, case_insensitive: bool) -> bool {
        let rest = &self.text[self.pos..];
        let Some(head) = rest.get(..pattern.len()) else {
            return false;
        };
        let matched = if case_insensitive {
            head.to_lowercase() == pattern.to_lowercase()
        } else {
            head == pattern
        };
        if matched && consume {
            self.pos += pattern.len();
        }
        matched
    }

    /// Match `regex` against the rest of the line; it must match at the current position.
    ///
    /// `^` anchors at the cursor, not at the line start.
    pub fn match_regex(&mut self, regex: &Regex, consume: bool) -> Option<Captures<'a>> {
        let rest: &'a str = &self.text[self.pos..];
        let captures = regex.captures(rest)?;
        let whole = captures.get(0)?;
        if whole.start() != 0 {
            return None;
        }
        if consume {
            self.pos += whole.end();
        }
        Some(captures)
    }

    /// Move back `n` characters.
    pub fn back_up(&mut self, n: usize) {
        for _ in 0..n {
            match self.text[..self.pos].chars().next_back() {
                Some(ch) => self.pos -= ch.len_utf8(),
                None => break,
            }
        }
    }

    /// Display column of the current token start.
    pub fn column(&self) -> usize {
        count_column(&self.text[..self.start], self.tab_size)
    }

    /// Display column of the first non-whitespace character.
    pub fn indentation(&self) -> usize {
        let indent_end = self
            .text
            .find(|ch: char| !ch.is_whitespace())
            .unwrap_or(self.text.len());
        count_column(&self.text[..indent_end], self.tab_size)
    }

    /// Text of the current token so far.
    pub fn current(&self) -> &'a str {
        &self.text[self.start..self.pos]
    }
}

/// Display width of `text`, expanding tabs to the next multiple of `tab_size`.
pub fn count_column(text: &str, tab_size: usize) -> usize {
    let tab_size = tab_size.max(1);
    text.chars().fold(0, |col, ch| {
        if ch == '\t' {
            col + tab_size - col % tab_size
        } else {
            col + ch.width().unwrap_or(0)
        }
    })
}
