//! Viewport-scoped syntax overlays.
//!
//! An [`Overlay`] is a line-scanning tokenizer. The [`OverlayEngine`] runs every registered
//! overlay over the lines of the visible ranges and turns the returned class names into
//! decorations:
//!
//! - names starting with the line token prefix (`line-` by default) become zero-width line
//!   decorations at the line start
//! - every other name becomes a mark over the text the token call consumed
//!
//! The result is never persisted: each recompute throws the previous set away and builds a new
//! one, so cost is bounded by visible lines × overlays, not by document size.

use crate::cache::DecorationCache;
use crate::config::EditorConfig;
use crate::cursor::LineCursor;
use crate::decorations::{DecoratedRange, DecorationSet, DecorationSetBuilder};
use crate::document::{Document, Line};
use crate::error::{DecorError, Result};
use std::borrow::Cow;
use std::ops::Range;

/// A line-scanning tokenizer.
///
/// # Example
///
/// ```rust
/// use editor_decor::{LineCursor, Overlay};
/// use std::borrow::Cow;
///
/// /// Highlights `TODO` anywhere in a line.
/// struct Todo;
///
/// impl Overlay for Todo {
///     type State = ();
///
///     fn token(&self, cursor: &mut LineCursor<'_>, _state: &mut ()) -> Option<Cow<'_, str>> {
///         if cursor.match_str("TODO", true, false) {
///             return Some("todo".into());
///         }
///         cursor.next_char();
///         None
///     }
/// }
/// ```
pub trait Overlay {
    /// Scan state carried from line to line within one recompute.
    type State: Default;

    /// Create the scan state at the start of a recompute.
    fn start_state(&self, indent_unit: usize) -> Self::State {
        let _ = indent_unit;
        Self::State::default()
    }

    /// Consume at least one character and return the classes for the consumed text, if any.
    ///
    /// Returning without advancing the cursor aborts the recompute with
    /// [`DecorError::OverlayStalled`].
    fn token(&self, cursor: &mut LineCursor<'_>, state: &mut Self::State) -> Option<Cow<'_, str>>;

    /// Called instead of [`Overlay::token`] for empty lines.
    fn blank_line(&self, state: &mut Self::State) {
        let _ = state;
    }
}

/// Identity of a registered overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OverlayId(pub u64);

/// A visible line and its text, shared by every overlay of one recompute.
struct ScanLine {
    line: Line,
    text: String,
}

/// Everything a scan needs besides the overlay and its lines.
struct ScanContext<'a> {
    overlay: OverlayId,
    config: &'a EditorConfig,
    cache: &'a mut DecorationCache,
    out: &'a mut Vec<DecoratedRange>,
}

impl ScanContext<'_> {
    fn emit(&mut self, token: &str, line: &Line, from: usize, to: usize) {
        for name in token.split_whitespace() {
            match name.strip_prefix(self.config.line_token_prefix.as_str()) {
                Some(line_class) if !line_class.is_empty() => {
                    let value = self.cache.line(&self.config.prefixed(line_class));
                    self.out
                        .push(DecoratedRange::new(line.from, line.from, value));
                }
                _ => {
                    let value = self.cache.mark(&self.config.prefixed(name), None);
                    self.out.push(DecoratedRange::new(from, to, value));
                }
            }
        }
    }
}

/// Object-safe face of [`Overlay`]; the scan state type stays inside the blanket impl.
trait ScanOverlay {
    fn scan(&self, lines: &[ScanLine], ctx: &mut ScanContext<'_>) -> Result<()>;
}

impl<T: Overlay> ScanOverlay for T {
    fn scan(&self, lines: &[ScanLine], ctx: &mut ScanContext<'_>) -> Result<()> {
        let mut state = self.start_state(ctx.config.indent_unit);

        for ScanLine { line, text } in lines {
            if text.is_empty() {
                self.blank_line(&mut state);
                continue;
            }

            let mut cursor = LineCursor::new(text, ctx.config.tab_size, ctx.config.indent_unit);
            // Document offset of `cursor.pos()`.
            let mut offset = line.from;

            while !cursor.eol() {
                cursor.begin_token();
                let before = cursor.pos();
                let token = self.token(&mut cursor, &mut state);
                let after = cursor.pos();

                if after <= before {
                    tracing::warn!(
                        overlay = ctx.overlay.0,
                        line = line.number,
                        column = before,
                        "overlay token did not advance the cursor"
                    );
                    return Err(DecorError::OverlayStalled {
                        overlay: ctx.overlay.0,
                        line: line.number,
                        column: before,
                    });
                }

                let end = offset + text[before..after].chars().count();
                if let Some(token) = token {
                    ctx.emit(&token, line, offset, end);
                }
                offset = end;
            }
        }
        Ok(())
    }
}

struct Registered {
    id: OverlayId,
    overlay: Box<dyn ScanOverlay>,
}

/// Registered overlays plus the decoration set of the last recompute.
#[derive(Default)]
pub struct OverlayEngine {
    overlays: Vec<Registered>,
    next_id: u64,
    set: DecorationSet,
    recomputes: u64,
}

impl OverlayEngine {
    /// Create an engine with no overlays.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an overlay after all existing ones.
    pub fn add<O>(&mut self, overlay: O) -> OverlayId
    where
        O: Overlay + 'static,
    {
        self.next_id += 1;
        let id = OverlayId(self.next_id);
        self.overlays.push(Registered {
            id,
            overlay: Box::new(overlay),
        });
        id
    }

    /// Unregister an overlay; returns `false` if it was not registered.
    pub fn remove(&mut self, id: OverlayId) -> bool {
        let before = self.overlays.len();
        self.overlays.retain(|registered| registered.id != id);
        self.overlays.len() != before
    }

    /// Registered overlay ids, in registration order.
    pub fn ids(&self) -> Vec<OverlayId> {
        self.overlays.iter().map(|registered| registered.id).collect()
    }

    /// Number of registered overlays.
    pub fn len(&self) -> usize {
        self.overlays.len()
    }

    /// Check if no overlay is registered.
    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty()
    }

    /// Decorations of the last successful recompute.
    pub fn decorations(&self) -> &DecorationSet {
        &self.set
    }

    /// Number of recomputes run so far.
    pub fn recompute_count(&self) -> u64 {
        self.recomputes
    }

    /// Rebuild the overlay set for `visible` ranges of `doc`.
    ///
    /// On error the set is left empty: a partial result is never kept.
    pub fn recompute(
        &mut self,
        doc: &Document,
        visible: &[Range<usize>],
        config: &EditorConfig,
        cache: &mut DecorationCache,
    ) -> Result<()> {
        self.recomputes += 1;
        self.set = DecorationSet::new();

        if self.overlays.is_empty() {
            return Ok(());
        }

        let lines = visible_lines(doc, visible)?;
        let mut out = Vec::new();
        for registered in &self.overlays {
            let mut ctx = ScanContext {
                overlay: registered.id,
                config,
                cache: &mut *cache,
                out: &mut out,
            };
            registered.overlay.scan(&lines, &mut ctx)?;
        }

        out.sort_by_key(|range| (range.from, range.to));

        let mut builder = DecorationSetBuilder::new();
        for range in out {
            builder.add(range.from, range.to, range.value)?;
        }
        self.set = builder.finish();

        tracing::debug!(
            overlays = self.overlays.len(),
            lines = lines.len(),
            decorations = self.set.len(),
            "recomputed overlay decorations"
        );
        Ok(())
    }
}

/// Whole lines covering `visible`, ascending, each line once.
fn visible_lines(doc: &Document, visible: &[Range<usize>]) -> Result<Vec<ScanLine>> {
    let mut ranges = visible.to_vec();
    ranges.sort_by_key(|range| (range.start, range.end));

    let mut lines = Vec::new();
    let mut next_number = 1;
    for range in ranges {
        let first = doc.line_at(range.start)?.number;
        let last = doc.line_at(range.end.max(range.start))?.number;
        for number in first.max(next_number)..=last {
            let line = doc.line(number)?;
            let text = doc.line_text(&line);
            lines.push(ScanLine { line, text });
        }
        next_number = next_number.max(last + 1);
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Emits `line-error` for the first character of every line.
    struct FirstChar;

    impl Overlay for FirstChar {
        type State = ();

        fn token(&self, cursor: &mut LineCursor<'_>, _state: &mut ()) -> Option<Cow<'_, str>> {
            if cursor.sol() {
                cursor.next_char();
                return Some("line-error".into());
            }
            cursor.skip_to_end();
            None
        }
    }

    /// Marks each word, counting words across lines in its state.
    struct Words;

    impl Overlay for Words {
        type State = usize;

        fn start_state(&self, indent_unit: usize) -> usize {
            indent_unit * 100
        }

        fn token(&self, cursor: &mut LineCursor<'_>, count: &mut usize) -> Option<Cow<'_, str>> {
            if cursor.eat_space() {
                return None;
            }
            cursor.eat_while(|ch: char| !ch.is_whitespace());
            *count += 1;
            Some(Cow::Owned(format!("word w{count}")))
        }
    }

    struct Stuck;

    impl Overlay for Stuck {
        type State = ();

        fn token(&self, cursor: &mut LineCursor<'_>, _state: &mut ()) -> Option<Cow<'_, str>> {
            if cursor.pos() < 2 {
                cursor.next_char();
            }
            Some("x".into())
        }
    }

    fn run(engine: &mut OverlayEngine, doc: &Document, visible: &[Range<usize>]) -> Result<()> {
        let mut cache = DecorationCache::new();
        engine.recompute(doc, visible, &EditorConfig::default(), &mut cache)
    }

    fn summary(set: &DecorationSet) -> Vec<(usize, usize, String)> {
        set.iter()
            .map(|r| (r.from, r.to, r.value.class().unwrap_or("").to_string()))
            .collect()
    }

    #[test]
    fn test_line_level_tokens() {
        let doc = Document::new("abc\ndef\nghi");
        let mut engine = OverlayEngine::new();
        engine.add(FirstChar);
        run(&mut engine, &doc, &[0..doc.len_chars()]).unwrap();
        assert_eq!(
            summary(engine.decorations()),
            vec![
                (0, 0, "cm-error".to_string()),
                (4, 4, "cm-error".to_string()),
                (8, 8, "cm-error".to_string()),
            ]
        );
    }

    #[test]
    fn test_span_tokens_and_state() {
        let doc = Document::new("ab cd\n\né");
        let mut engine = OverlayEngine::new();
        engine.add(Words);
        run(&mut engine, &doc, &[0..doc.len_chars()]).unwrap();
        assert_eq!(
            summary(engine.decorations()),
            vec![
                (0, 2, "cm-word".to_string()),
                (0, 2, "cm-w201".to_string()),
                (3, 5, "cm-word".to_string()),
                (3, 5, "cm-w202".to_string()),
                (7, 8, "cm-word".to_string()),
                (7, 8, "cm-w203".to_string()),
            ]
        );
    }

    #[test]
    fn test_only_visible_lines_are_scanned() {
        let doc = Document::new("a\nb\nc\nd");
        let mut engine = OverlayEngine::new();
        engine.add(FirstChar);
        run(&mut engine, &doc, &[6..6, 2..3, 2..2]).unwrap();
        let starts: Vec<_> = engine.decorations().iter().map(|r| r.from).collect();
        assert_eq!(starts, vec![2, 6]);
    }

    #[test]
    fn test_stalled_overlay_fails_and_clears() {
        let doc = Document::new("abcd");
        let mut engine = OverlayEngine::new();
        let first = engine.add(FirstChar);
        run(&mut engine, &doc, &[0..4]).unwrap();
        assert_eq!(engine.decorations().len(), 1);

        let stuck = engine.add(Stuck);
        let err = run(&mut engine, &doc, &[0..4]).unwrap_err();
        assert!(matches!(
            err,
            DecorError::OverlayStalled { overlay, line: 1, column: 2 } if overlay == stuck.0
        ));
        assert!(engine.decorations().is_empty());

        assert!(engine.remove(stuck));
        assert!(!engine.remove(stuck));
        assert_eq!(engine.ids(), vec![first]);
    }

    #[test]
    fn test_recompute_is_deterministic() {
        let doc = Document::new("one two\nthree");
        let mut engine = OverlayEngine::new();
        engine.add(Words);
        engine.add(FirstChar);
        run(&mut engine, &doc, &[0..doc.len_chars()]).unwrap();
        let first = summary(engine.decorations());
        run(&mut engine, &doc, &[0..doc.len_chars()]).unwrap();
        assert_eq!(summary(engine.decorations()), first);
        assert!(engine.decorations().is_sorted());
        assert_eq!(engine.recompute_count(), 2);
    }

    #[test]
    fn test_every_line_token_emits_a_decoration() {
        struct EveryChar;
        impl Overlay for EveryChar {
            type State = ();
            fn token(&self, cursor: &mut LineCursor<'_>, _: &mut ()) -> Option<Cow<'_, str>> {
                cursor.next_char();
                Some("line-hot".into())
            }
        }

        let doc = Document::new("abc");
        let mut engine = OverlayEngine::new();
        engine.add(EveryChar);
        run(&mut engine, &doc, &[0..3]).unwrap();
        assert_eq!(
            summary(engine.decorations()),
            vec![
                (0, 0, "cm-hot".to_string()),
                (0, 0, "cm-hot".to_string()),
                (0, 0, "cm-hot".to_string()),
            ]
        );
    }
}
