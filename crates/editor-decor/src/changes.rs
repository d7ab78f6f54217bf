//! Change descriptions and position mapping.
//!
//! A [`ChangeSet`] is the immutable description of one document edit. It is expressed in
//! **character offsets** (Unicode scalar values), like every other position in this crate, and
//! is the only thing the decoration stores need to keep their ranges valid: every stored
//! position is pushed through [`ChangeSet::map_pos`] instead of being patched in place.

use crate::error::{DecorError, Result};

/// Which side of an insertion a mapped position sticks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Assoc {
    /// Stay before text inserted at the position.
    #[default]
    Before,
    /// Move after text inserted at the position.
    After,
}

/// A single replacement expressed in character offsets.
///
/// Semantics:
/// - `from..to` is a range in the document **at the time this edit is applied**.
/// - Edits inside a [`ChangeSet`] are applied **in order**; each one sees the document produced
///   by the previous edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEdit {
    /// Start character offset of the replaced range.
    pub from: usize,
    /// Exclusive end character offset of the replaced range.
    pub to: usize,
    /// Inserted text (may be empty).
    pub insert: String,
}

impl ChangeEdit {
    /// Length of the replaced range in characters.
    pub fn deleted_len(&self) -> usize {
        self.to - self.from
    }

    /// Length of `insert` in characters.
    pub fn inserted_len(&self) -> usize {
        self.insert.chars().count()
    }

    fn map_pos(&self, pos: usize, assoc: Assoc) -> usize {
        let inserted = self.inserted_len();
        if pos < self.from {
            pos
        } else if pos == self.from {
            match assoc {
                Assoc::Before => self.from,
                Assoc::After => self.from + inserted,
            }
        } else if pos >= self.to {
            pos - self.deleted_len() + inserted
        } else {
            // Strictly inside the replaced range.
            match assoc {
                Assoc::Before => self.from,
                Assoc::After => self.from + inserted,
            }
        }
    }
}

/// An ordered list of edits that transforms one document snapshot into the next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSet {
    len_before: usize,
    len_after: usize,
    edits: Vec<ChangeEdit>,
}

impl ChangeSet {
    /// An empty change set over a document of `len` characters.
    pub fn empty(len: usize) -> Self {
        Self {
            len_before: len,
            len_after: len,
            edits: Vec::new(),
        }
    }

    /// A change set with a single replacement of `from..to` by `insert`.
    pub fn replace(len: usize, from: usize, to: usize, insert: impl Into<String>) -> Result<Self> {
        let mut changes = Self::empty(len);
        changes.push(ChangeEdit {
            from,
            to,
            insert: insert.into(),
        })?;
        Ok(changes)
    }

    /// A change set inserting `text` at `pos`.
    pub fn insert(len: usize, pos: usize, text: impl Into<String>) -> Result<Self> {
        Self::replace(len, pos, pos, text)
    }

    /// A change set deleting `from..to`.
    pub fn delete(len: usize, from: usize, to: usize) -> Result<Self> {
        Self::replace(len, from, to, "")
    }

    /// Append an edit, expressed against the document produced by the edits so far.
    pub fn push(&mut self, edit: ChangeEdit) -> Result<()> {
        if edit.from > edit.to || edit.to > self.len_after {
            return Err(DecorError::InvalidRange {
                from: edit.from,
                to: edit.to,
            });
        }
        if edit.from == edit.to && edit.insert.is_empty() {
            return Ok(());
        }
        self.len_after = self.len_after - edit.deleted_len() + edit.inserted_len();
        self.edits.push(edit);
        Ok(())
    }

    /// Concatenate `next`, which must start from the document this set produces.
    pub fn compose(mut self, next: ChangeSet) -> Result<Self> {
        if next.len_before != self.len_after {
            return Err(DecorError::InvalidRange {
                from: next.len_before,
                to: self.len_after,
            });
        }
        self.edits.extend(next.edits);
        self.len_after = next.len_after;
        Ok(self)
    }

    /// Map a position in the old document to the new one.
    pub fn map_pos(&self, pos: usize, assoc: Assoc) -> usize {
        self.edits
            .iter()
            .fold(pos, |pos, edit| edit.map_pos(pos, assoc))
    }

    /// Returns `true` if any edit replaces or touches `[from, to]` of the old document.
    pub fn touches(&self, from: usize, to: usize) -> bool {
        let (mut from, mut to) = (from, to);
        for edit in &self.edits {
            if edit.from <= to && edit.to >= from {
                return true;
            }
            from = edit.map_pos(from, Assoc::Before);
            to = edit.map_pos(to, Assoc::After);
        }
        false
    }

    /// Returns `true` if this set contains no edits.
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Character count before the change.
    pub fn len_before(&self) -> usize {
        self.len_before
    }

    /// Character count after the change.
    pub fn len_after(&self) -> usize {
        self.len_after
    }

    /// The ordered edits.
    pub fn edits(&self) -> &[ChangeEdit] {
        &self.edits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_shifts_following_positions() {
        let changes = ChangeSet::insert(10, 3, "abc").unwrap();
        assert_eq!(changes.len_after(), 13);
        assert_eq!(changes.map_pos(2, Assoc::Before), 2);
        assert_eq!(changes.map_pos(3, Assoc::Before), 3);
        assert_eq!(changes.map_pos(3, Assoc::After), 6);
        assert_eq!(changes.map_pos(7, Assoc::Before), 10);
    }

    #[test]
    fn test_delete_collapses_inner_positions() {
        let changes = ChangeSet::delete(10, 2, 6).unwrap();
        assert_eq!(changes.map_pos(4, Assoc::Before), 2);
        assert_eq!(changes.map_pos(4, Assoc::After), 2);
        assert_eq!(changes.map_pos(6, Assoc::Before), 2);
        assert_eq!(changes.map_pos(9, Assoc::Before), 5);
    }

    #[test]
    fn test_replace_inside_maps_by_assoc() {
        let changes = ChangeSet::replace(10, 2, 6, "xy").unwrap();
        assert_eq!(changes.map_pos(3, Assoc::Before), 2);
        assert_eq!(changes.map_pos(3, Assoc::After), 4);
        assert_eq!(changes.map_pos(8, Assoc::Before), 6);
    }

    #[test]
    fn test_sequential_edits_and_compose() {
        let first = ChangeSet::insert(5, 0, "ab").unwrap();
        let second = ChangeSet::delete(7, 4, 6).unwrap();
        let composed = first.compose(second).unwrap();
        assert_eq!(composed.len_before(), 5);
        assert_eq!(composed.len_after(), 5);
        assert_eq!(composed.edits().len(), 2);
        // 1 -> 3 after insertion, untouched by the deletion.
        assert_eq!(composed.map_pos(1, Assoc::Before), 3);
        // 3 -> 5 after insertion, inside 4..6, collapses to 4.
        assert_eq!(composed.map_pos(3, Assoc::Before), 4);
    }

    #[test]
    fn test_compose_rejects_length_mismatch() {
        let first = ChangeSet::insert(5, 0, "ab").unwrap();
        let second = ChangeSet::empty(5);
        assert!(first.compose(second).is_err());
    }

    #[test]
    fn test_out_of_range_edit_is_rejected() {
        assert!(ChangeSet::delete(3, 1, 4).is_err());
        assert!(ChangeSet::replace(3, 2, 1, "x").is_err());
    }

    #[test]
    fn test_noop_edit_is_dropped() {
        let changes = ChangeSet::replace(3, 1, 1, "").unwrap();
        assert!(changes.is_empty());
    }

    #[test]
    fn test_multibyte_insert_counts_chars() {
        let changes = ChangeSet::insert(2, 1, "👋é").unwrap();
        assert_eq!(changes.len_after(), 4);
        assert_eq!(changes.map_pos(2, Assoc::Before), 4);
    }

    #[test]
    fn test_touches_follows_sequential_edits() {
        let mut changes = ChangeSet::insert(10, 0, "ab").unwrap();
        changes
            .push(ChangeEdit {
                from: 9,
                to: 10,
                insert: String::new(),
            })
            .unwrap();

        assert!(changes.touches(0, 0));
        // 7..8 becomes 9..10 after the first edit, which the second edit deletes.
        assert!(changes.touches(7, 8));
        assert!(!changes.touches(2, 5));
    }
}
