//! The in-memory host: document, transactions, viewport and the two decoration sources.
//!
//! [`EditorView`] is the smallest host that satisfies what the decoration engine needs:
//!
//! 1. a change description that maps positions ([`ChangeSet`])
//! 2. line lookup by offset and by number ([`Document`])
//! 3. visible ranges
//! 4. a dispatch primitive applying a batch of specs as one transaction
//! 5. a composition point exposing both decoration sets for rendering
//!
//! # Architecture Notes
//!
//! Data flows one way into the canonical store (effects → [`DecorationStore`]) and one way out
//! of the overlay engine (document + viewport → [`OverlayEngine`]). The two sets are only merged
//! when the host asks for [`EditorView::rendered_decorations`].

use crate::cache::DecorationCache;
use crate::changes::{Assoc, ChangeSet};
use crate::config::EditorConfig;
use crate::decorations::{DecoratedRange, DecorationSet};
use crate::document::{Document, Line};
use crate::effects::{StateEffect, map_effects};
use crate::error::{DecorError, Result};
use crate::overlay::OverlayEngine;
use crate::reducer::DecorationStore;
use crate::state::{StateChange, StateChangeType, StateTracker};
use std::ops::Range;
use std::rc::Rc;

/// One part of a dispatch: optional document changes plus effects.
///
/// Effect positions refer to the document after `changes`.
#[derive(Debug, Clone, Default)]
pub struct TransactionSpec {
    /// Changes against the document produced by the previous spec of the batch.
    pub changes: Option<ChangeSet>,
    /// Effects, in attachment order.
    pub effects: Vec<StateEffect>,
}

impl TransactionSpec {
    /// A spec carrying only effects.
    pub fn effects(effects: Vec<StateEffect>) -> Self {
        Self {
            changes: None,
            effects,
        }
    }

    /// A spec carrying only changes.
    pub fn changes(changes: ChangeSet) -> Self {
        Self {
            changes: Some(changes),
            effects: Vec::new(),
        }
    }

    /// Attach another effect.
    pub fn with_effect(mut self, effect: StateEffect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// A resolved batch: one change set, effects in the final document's coordinates.
#[derive(Debug, Clone)]
pub struct Transaction {
    /// Combined changes of every spec.
    pub changes: ChangeSet,
    /// Effects of every spec, mapped through the changes of later specs.
    pub effects: Vec<StateEffect>,
}

impl Transaction {
    /// Combine specs into one transaction against a document of `len` characters.
    pub fn resolve<I>(len: usize, specs: I) -> Result<Self>
    where
        I: IntoIterator<Item = TransactionSpec>,
    {
        let mut changes = ChangeSet::empty(len);
        let mut effects: Vec<StateEffect> = Vec::new();

        for spec in specs {
            if let Some(next) = spec.changes {
                effects = map_effects(&effects, &next);
                changes = changes.compose(next)?;
            }
            effects.extend(spec.effects);
        }

        let len_after = changes.len_after();
        for effect in &effects {
            if let Some((from, to)) = effect.range()
                && (from > to || to > len_after)
            {
                return Err(DecorError::InvalidRange { from, to });
            }
        }

        Ok(Self { changes, effects })
    }

    /// Returns `true` if the document changes.
    pub fn doc_changed(&self) -> bool {
        !self.changes.is_empty()
    }
}

/// Document + canonical decorations + overlays + viewport.
pub struct EditorView {
    doc: Document,
    config: EditorConfig,
    store: DecorationStore,
    overlays: OverlayEngine,
    cache: DecorationCache,
    visible: Vec<Range<usize>>,
    state: StateTracker,
    measure_requests: u64,
}

impl EditorView {
    /// Create a view over `text`; the whole document starts out visible.
    pub fn new(text: &str, config: EditorConfig) -> Self {
        let doc = Document::new(text);
        let visible = vec![0..doc.len_chars()];
        Self {
            doc,
            config,
            store: DecorationStore::new(),
            overlays: OverlayEngine::new(),
            cache: DecorationCache::new(),
            visible,
            state: StateTracker::default(),
            measure_requests: 0,
        }
    }

    /// The current document.
    pub fn doc(&self) -> &Document {
        &self.doc
    }

    /// The configuration.
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Look up a line by one-indexed number.
    pub fn line(&self, number: usize) -> Result<Line> {
        self.doc.line(number)
    }

    /// Look up the line containing `offset`.
    pub fn line_at(&self, offset: usize) -> Result<Line> {
        self.doc.line_at(offset)
    }

    /// The canonical (effect-driven) decoration set.
    pub fn decorations(&self) -> &DecorationSet {
        self.store.decorations()
    }

    /// The overlay decoration set of the last recompute.
    pub fn overlay_decorations(&self) -> &DecorationSet {
        self.overlays.decorations()
    }

    /// The overlay engine.
    pub fn overlays(&self) -> &OverlayEngine {
        &self.overlays
    }

    pub(crate) fn overlays_mut(&mut self) -> &mut OverlayEngine {
        &mut self.overlays
    }

    /// The decoration value cache.
    pub fn cache(&self) -> &DecorationCache {
        &self.cache
    }

    /// Visible ranges, ascending.
    pub fn visible_ranges(&self) -> &[Range<usize>] {
        &self.visible
    }

    /// State version, bumped once per committed dispatch.
    pub fn version(&self) -> u64 {
        self.state.version()
    }

    /// Number of widget re-measure requests so far.
    pub fn measure_requests(&self) -> u64 {
        self.measure_requests
    }

    /// Subscribe to state change notifications.
    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(&StateChange) + 'static,
    {
        self.state.subscribe(Box::new(callback));
    }

    /// Apply a batch of specs as one transaction.
    ///
    /// Nothing is applied if the batch is invalid. An overlay failure is reported after the
    /// transaction itself has been committed; the overlay set is left empty in that case.
    pub fn dispatch<I>(&mut self, specs: I) -> Result<()>
    where
        I: IntoIterator<Item = TransactionSpec>,
    {
        let tr = Transaction::resolve(self.doc.len_chars(), specs)?;
        self.apply(tr)
    }

    fn apply(&mut self, tr: Transaction) -> Result<()> {
        let doc_changed = tr.doc_changed();
        self.doc.apply(&tr.changes)?;
        self.store
            .apply(&tr.changes, &tr.effects, &self.doc, &mut self.cache)?;

        if doc_changed {
            self.map_visible(&tr.changes);
        }

        let refresh = doc_changed || tr.effects.iter().any(StateEffect::is_refresh);
        let decorations_changed = tr.effects.iter().any(|effect| !effect.is_refresh());

        tracing::debug!(
            edits = tr.changes.edits().len(),
            effects = tr.effects.len(),
            refresh,
            version = self.state.version() + 1,
            "dispatching transaction"
        );

        let overlay_result = if refresh {
            self.recompute_overlays()
        } else {
            Ok(())
        };

        let mut changes = Vec::new();
        if doc_changed {
            changes.push(
                StateChange::new(StateChangeType::DocumentChanged, 0, 0)
                    .with_changes(Rc::new(tr.changes)),
            );
        }
        if decorations_changed || (doc_changed && !self.store.decorations().is_empty()) {
            changes.push(StateChange::new(StateChangeType::DecorationsChanged, 0, 0));
        }
        if refresh {
            changes.push(StateChange::new(StateChangeType::OverlaysChanged, 0, 0));
        }
        self.state.commit(changes);

        overlay_result
    }

    /// Replace the visible ranges and recompute overlays.
    pub fn set_visible_ranges(&mut self, mut ranges: Vec<Range<usize>>) -> Result<()> {
        let len = self.doc.len_chars();
        for range in &ranges {
            if range.start > range.end || range.end > len {
                return Err(DecorError::InvalidRange {
                    from: range.start,
                    to: range.end,
                });
            }
        }
        ranges.sort_by_key(|range| (range.start, range.end));
        if ranges == self.visible {
            return Ok(());
        }

        self.visible = ranges;
        let result = self.recompute_overlays();
        self.state.commit(vec![
            StateChange::new(StateChangeType::ViewportChanged, 0, 0),
            StateChange::new(StateChangeType::OverlaysChanged, 0, 0),
        ]);
        result
    }

    /// Ask the host to measure a widget again; touches no decoration state.
    pub fn request_measure(&mut self) {
        self.measure_requests += 1;
        self.state.notify_change(StateChangeType::MeasureRequested);
    }

    /// Canonical and overlay decorations touching `[from, to]`, merged in `(from, to)` order.
    ///
    /// On equal keys canonical decorations come first.
    pub fn rendered_decorations(&self, from: usize, to: usize) -> Vec<&DecoratedRange> {
        let canonical = self.store.decorations().between(from, to);
        let overlay = self.overlays.decorations().between(from, to);

        let mut merged = Vec::with_capacity(canonical.len() + overlay.len());
        let mut canonical = canonical.into_iter().peekable();
        let mut overlay = overlay.into_iter().peekable();
        loop {
            let take_canonical = match (canonical.peek(), overlay.peek()) {
                (Some(a), Some(b)) => (a.from, a.to) <= (b.from, b.to),
                (Some(_), None) => true,
                (None, Some(_)) => false,
                (None, None) => break,
            };
            let next = if take_canonical {
                canonical.next()
            } else {
                overlay.next()
            };
            merged.extend(next);
        }
        merged
    }

    fn recompute_overlays(&mut self) -> Result<()> {
        self.overlays
            .recompute(&self.doc, &self.visible, &self.config, &mut self.cache)
    }

    fn map_visible(&mut self, changes: &ChangeSet) {
        let len = self.doc.len_chars();
        for range in &mut self.visible {
            let start = changes.map_pos(range.start, Assoc::Before).min(len);
            let end = changes.map_pos(range.end, Assoc::After).min(len);
            *range = start..end.max(start);
        }
    }
}
