//! Typed decoration effects.
//!
//! An effect is a request to change the canonical decoration set, attached to a transaction.
//! Effect positions refer to the document *after* the changes of the spec they were attached
//! to. When specs are combined, or an effect outlives an edit, it is moved with
//! [`StateEffect::map`]: both endpoints are mapped independently and then reordered, since an
//! edit can invert a range. The rule is the same for every kind, so line classes, marks and
//! widgets move identically.

use crate::changes::{Assoc, ChangeSet};
use crate::decorations::{MarkId, Widget};

/// A decoration effect.
#[derive(Debug, Clone, PartialEq)]
pub enum StateEffect {
    /// Add a line class to the line starting at `from`.
    AddLineClass {
        /// Line start.
        from: usize,
        /// Line end.
        to: usize,
        /// Class name.
        class: String,
    },
    /// Remove a line class from the line(s) covered by `from..to`.
    RemoveLineClass {
        /// Range start.
        from: usize,
        /// Range end.
        to: usize,
        /// Class name.
        class: String,
    },
    /// Add a mark over `from..to`.
    AddMark {
        /// Mark start.
        from: usize,
        /// Mark end.
        to: usize,
        /// Class name.
        class: String,
        /// Identity for later removal.
        id: Option<MarkId>,
    },
    /// Remove a mark, by `id` when set, otherwise by class within the covered lines.
    RemoveMark {
        /// Range start.
        from: usize,
        /// Range end.
        to: usize,
        /// Class name.
        class: String,
        /// Identity of the mark to remove.
        id: Option<MarkId>,
    },
    /// Add a widget to the line covering `from..to`.
    AddWidget {
        /// Line start.
        from: usize,
        /// Line end.
        to: usize,
        /// Widget payload.
        widget: Widget,
    },
    /// Remove the widget with the same id as `widget`.
    RemoveWidget {
        /// Line start.
        from: usize,
        /// Line end.
        to: usize,
        /// Widget payload (matched by id).
        widget: Widget,
    },
    /// Ask the overlay engine to recompute.
    RefreshOverlays,
}

impl StateEffect {
    /// The effect's range, if it has one.
    pub fn range(&self) -> Option<(usize, usize)> {
        match self {
            StateEffect::AddLineClass { from, to, .. }
            | StateEffect::RemoveLineClass { from, to, .. }
            | StateEffect::AddMark { from, to, .. }
            | StateEffect::RemoveMark { from, to, .. }
            | StateEffect::AddWidget { from, to, .. }
            | StateEffect::RemoveWidget { from, to, .. } => Some((*from, *to)),
            StateEffect::RefreshOverlays => None,
        }
    }

    /// Returns `true` for the overlay refresh signal.
    pub fn is_refresh(&self) -> bool {
        matches!(self, StateEffect::RefreshOverlays)
    }

    /// Map this effect through `changes`.
    pub fn map(&self, changes: &ChangeSet) -> StateEffect {
        let mut mapped = self.clone();
        match &mut mapped {
            StateEffect::AddLineClass { from, to, .. }
            | StateEffect::RemoveLineClass { from, to, .. }
            | StateEffect::AddMark { from, to, .. }
            | StateEffect::RemoveMark { from, to, .. }
            | StateEffect::AddWidget { from, to, .. }
            | StateEffect::RemoveWidget { from, to, .. } => {
                (*from, *to) = map_range(*from, *to, changes);
            }
            StateEffect::RefreshOverlays => {}
        }
        mapped
    }
}

/// Map both endpoints independently, then restore `from <= to`.
pub fn map_range(from: usize, to: usize, changes: &ChangeSet) -> (usize, usize) {
    let from = changes.map_pos(from, Assoc::Before);
    let to = changes.map_pos(to, Assoc::Before);
    if from <= to { (from, to) } else { (to, from) }
}

/// Map a batch of effects through `changes`.
pub fn map_effects(effects: &[StateEffect], changes: &ChangeSet) -> Vec<StateEffect> {
    if changes.is_empty() {
        return effects.to_vec();
    }
    effects.iter().map(|effect| effect.map(changes)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decorations::{Renderable, WidgetId, WidgetOptions};

    #[test]
    fn test_insert_before_shifts_effect() {
        let effect = StateEffect::AddMark {
            from: 4,
            to: 7,
            class: "x".into(),
            id: Some(MarkId(3)),
        };
        let changes = ChangeSet::insert(10, 0, "ab").unwrap();
        assert_eq!(effect.map(&changes).range(), Some((6, 9)));
    }

    #[test]
    fn test_every_kind_maps_identically() {
        let widget = Widget::new(WidgetId(1), Renderable::new(()), WidgetOptions::default());
        let effects = vec![
            StateEffect::AddLineClass { from: 2, to: 5, class: "a".into() },
            StateEffect::RemoveLineClass { from: 2, to: 5, class: "a".into() },
            StateEffect::AddMark { from: 2, to: 5, class: "a".into(), id: None },
            StateEffect::RemoveMark { from: 2, to: 5, class: "a".into(), id: None },
            StateEffect::AddWidget { from: 2, to: 5, widget: widget.clone() },
            StateEffect::RemoveWidget { from: 2, to: 5, widget },
        ];
        let changes = ChangeSet::delete(10, 3, 8).unwrap();
        for effect in map_effects(&effects, &changes) {
            assert_eq!(effect.range(), Some((2, 3)));
        }
    }

    #[test]
    fn test_refresh_has_no_range() {
        let changes = ChangeSet::insert(1, 0, "x").unwrap();
        let mapped = StateEffect::RefreshOverlays.map(&changes);
        assert!(mapped.is_refresh());
        assert_eq!(mapped.range(), None);
    }

    #[test]
    fn test_inverted_range_is_reordered() {
        let (from, to) = map_range(5, 3, &ChangeSet::empty(10));
        assert_eq!((from, to), (3, 5));
    }
}
