//! The canonical decoration store.
//!
//! [`DecorationStore`] is a small state machine over one [`DecorationSet`]. Each transaction
//! moves it forward exactly once: existing ranges are mapped through the transaction's
//! [`ChangeSet`], then the transaction's effects are folded in, in the order they were attached.

use crate::cache::DecorationCache;
use crate::changes::{Assoc, ChangeSet};
use crate::decorations::{DecoratedRange, Decoration, DecorationSet};
use crate::document::Document;
use crate::effects::StateEffect;
use crate::error::{DecorError, Result};
use std::rc::Rc;

/// Effect-driven decoration state (line classes, marks, widgets).
#[derive(Debug, Default)]
pub struct DecorationStore {
    set: DecorationSet,
}

impl DecorationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current set, valid for the document last passed to [`DecorationStore::apply`].
    pub fn decorations(&self) -> &DecorationSet {
        &self.set
    }

    /// Advance the store by one transaction.
    ///
    /// `doc` is the document *after* `changes`; effect positions refer to it.
    pub fn apply(
        &mut self,
        changes: &ChangeSet,
        effects: &[StateEffect],
        doc: &Document,
        cache: &mut DecorationCache,
    ) -> Result<()> {
        if !changes.is_empty() && !self.set.is_empty() {
            self.set.remap(|range| map_decoration(range, changes, doc));
        }

        for effect in effects {
            self.fold(effect, doc, cache)?;
        }

        if !effects.is_empty() {
            tracing::trace!(
                effects = effects.len(),
                decorations = self.set.len(),
                "folded decoration effects"
            );
        }
        Ok(())
    }

    fn fold(&mut self, effect: &StateEffect, doc: &Document, cache: &mut DecorationCache) -> Result<()> {
        match effect {
            StateEffect::AddLineClass { from, class, .. } => {
                let line = doc.line_at(*from)?;
                self.set.insert(DecoratedRange::new(
                    line.from,
                    line.from,
                    cache.line(class),
                ));
            }
            StateEffect::AddMark {
                from,
                to,
                class,
                id,
            } => {
                check_range(*from, *to, doc)?;
                self.set
                    .insert(DecoratedRange::new(*from, *to, cache.mark(class, *id)));
            }
            StateEffect::RemoveLineClass { from, to, class } => {
                let probe = Decoration::Line {
                    class: class.clone(),
                };
                self.remove_equal_in_lines(*from, *to, &probe, doc)?;
            }
            StateEffect::RemoveMark {
                id: Some(id), ..
            } => {
                self.set.retain(|range| range.value.mark_id() != Some(*id));
            }
            StateEffect::RemoveMark {
                from,
                to,
                class,
                id: None,
            } => {
                let probe = Decoration::Mark {
                    class: class.clone(),
                    id: None,
                };
                self.remove_equal_in_lines(*from, *to, &probe, doc)?;
            }
            StateEffect::AddWidget { from, widget, .. } => {
                let line = doc.line_at(*from)?;
                let anchor = if widget.above() { line.from } else { line.to };
                self.set.insert(DecoratedRange::new(
                    anchor,
                    anchor,
                    Rc::new(Decoration::Widget(widget.clone())),
                ));
            }
            StateEffect::RemoveWidget { widget, .. } => {
                let id = widget.id();
                self.set
                    .retain(|range| range.value.widget().map(|w| w.id()) != Some(id));
            }
            StateEffect::RefreshOverlays => {}
        }
        Ok(())
    }

    /// Remove every decoration equal to `probe` lying inside the lines covering `from..to`.
    ///
    /// This is a value match: all equal decorations in range go, not just one.
    fn remove_equal_in_lines(
        &mut self,
        from: usize,
        to: usize,
        probe: &Decoration,
        doc: &Document,
    ) -> Result<()> {
        let start = doc.line_at(from)?.from;
        let end = doc.line_at(to)?.to;
        self.set.retain(|range| {
            !(range.from >= start && range.to <= end && range.value.as_ref() == probe)
        });
        Ok(())
    }
}

fn check_range(from: usize, to: usize, doc: &Document) -> Result<()> {
    if from > to || to > doc.len_chars() {
        return Err(DecorError::InvalidRange { from, to });
    }
    Ok(())
}

/// Position of a stored decoration after `changes`.
///
/// - line decorations stay before inserted text and re-snap to their line's start
/// - marks do not grow at their edges; a mark whose text is replaced collapses to zero width
/// - widgets above a line stay before inserted text, widgets below move after it
fn map_decoration(range: &DecoratedRange, changes: &ChangeSet, doc: &Document) -> (usize, usize) {
    match range.value.as_ref() {
        Decoration::Line { .. } => {
            let pos = changes.map_pos(range.from, Assoc::Before);
            let start = doc.line_at(pos).map_or(pos, |line| line.from);
            (start, start)
        }
        Decoration::Mark { .. } if range.from == range.to => {
            let pos = changes.map_pos(range.from, Assoc::Before);
            (pos, pos)
        }
        Decoration::Mark { .. } => {
            let from = changes.map_pos(range.from, Assoc::After);
            let to = changes.map_pos(range.to, Assoc::Before);
            if from <= to { (from, to) } else { (to, to) }
        }
        Decoration::Widget(widget) => {
            let assoc = if widget.above() {
                Assoc::Before
            } else {
                Assoc::After
            };
            let pos = changes.map_pos(range.from, assoc);
            (pos, pos)
        }
    }
}
