//! Rope-backed document snapshot with line lookup.
//!
//! Line numbers at this level are **one-indexed**, matching how the decoration stores and the
//! overlay engine address lines. The zero-indexed translation happens in the facade.

use crate::changes::ChangeSet;
use crate::error::{DecorError, Result};
use ropey::Rope;

/// A resolved line: its character range (excluding the line break) and one-indexed number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line {
    /// Start character offset.
    pub from: usize,
    /// End character offset, before the line break.
    pub to: usize,
    /// One-indexed line number.
    pub number: usize,
}

impl Line {
    /// Length of the line in characters.
    pub fn len(&self) -> usize {
        self.to - self.from
    }

    /// Returns `true` for an empty line.
    pub fn is_empty(&self) -> bool {
        self.from == self.to
    }
}

/// The document text.
#[derive(Debug, Clone, Default)]
pub struct Document {
    rope: Rope,
}

impl Document {
    /// Build a document from text.
    pub fn new(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
        }
    }

    /// Document length in characters.
    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    /// Returns `true` if the document has no text.
    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    /// Number of lines (an empty document has one line).
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Look up a line by one-indexed number.
    pub fn line(&self, number: usize) -> Result<Line> {
        let line_count = self.line_count();
        if number == 0 || number > line_count {
            return Err(DecorError::LineOutOfRange {
                line: number,
                line_count,
            });
        }

        let idx = number - 1;
        let from = self.rope.line_to_char(idx);
        let slice = self.rope.line(idx);
        let mut len = slice.len_chars();
        if len > 0 && is_line_break(slice.char(len - 1)) {
            len -= 1;
            if slice.char(len) == '\n' && len > 0 && slice.char(len - 1) == '\r' {
                len -= 1;
            }
        }

        Ok(Line {
            from,
            to: from + len,
            number,
        })
    }

    /// Look up the line containing a character offset.
    pub fn line_at(&self, offset: usize) -> Result<Line> {
        let len = self.len_chars();
        if offset > len {
            return Err(DecorError::OffsetOutOfRange { offset, len });
        }
        self.line(self.rope.char_to_line(offset) + 1)
    }

    /// Text of a resolved line, without its line break.
    pub fn line_text(&self, line: &Line) -> String {
        self.rope.slice(line.from..line.to).to_string()
    }

    /// Text of `from..to`.
    pub fn slice(&self, from: usize, to: usize) -> Result<String> {
        if from > to || to > self.len_chars() {
            return Err(DecorError::InvalidRange { from, to });
        }
        Ok(self.rope.slice(from..to).to_string())
    }

    /// The whole text.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Apply a change set produced against this snapshot.
    pub fn apply(&mut self, changes: &ChangeSet) -> Result<()> {
        if changes.len_before() != self.len_chars() {
            return Err(DecorError::InvalidRange {
                from: changes.len_before(),
                to: self.len_chars(),
            });
        }

        for edit in changes.edits() {
            if edit.to > edit.from {
                self.rope.remove(edit.from..edit.to);
            }
            if !edit.insert.is_empty() {
                self.rope.insert(edit.from, &edit.insert);
            }
        }
        Ok(())
    }
}

fn is_line_break(ch: char) -> bool {
    matches!(
        ch,
        '\n' | '\r' | '\u{000B}' | '\u{000C}' | '\u{0085}' | '\u{2028}' | '\u{2029}'
    )
}
