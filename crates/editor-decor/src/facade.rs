//! The caller-facing decoration API.
//!
//! [`DecorEditor`] translates line-number and range calls into effect dispatches on its
//! [`EditorView`] and answers queries from the decoration sets. Line numbers are
//! **zero-indexed** here and translated to one-indexed document lookups.
//!
//! Handles returned by [`DecorEditor::mark_text`] and [`DecorEditor::add_line_widget`] do not
//! borrow the editor; pass it back in to act on them:
//!
//! ```rust
//! use editor_decor::{DecorEditor, MarkOptions};
//!
//! let mut editor = DecorEditor::new("let answer = 42;");
//! let mut marker = editor.mark_text(4, 10, MarkOptions::new("ident")).unwrap();
//! assert_eq!(marker.find(&editor), Some(4..10));
//!
//! editor.insert(0, "// ").unwrap();
//! assert_eq!(marker.find(&editor), Some(7..13));
//!
//! marker.clear(&mut editor).unwrap();
//! marker.clear(&mut editor).unwrap();
//! assert_eq!(marker.find(&editor), None);
//! ```

use crate::changes::ChangeSet;
use crate::config::EditorConfig;
use crate::decorations::{
    DecoratedRange, Decoration, MarkId, Renderable, Widget, WidgetId, WidgetOptions,
};
use crate::document::Line;
use crate::effects::StateEffect;
use crate::error::{DecorError, Result};
use crate::overlay::{Overlay, OverlayId};
use crate::state::StateChange;
use crate::view::{EditorView, TransactionSpec};
use std::ops::Range;

/// Options for [`DecorEditor::mark_text`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkOptions {
    /// Class applied to the marked text, verbatim.
    pub class_name: String,
}

impl MarkOptions {
    /// Options with the given class.
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
        }
    }
}

/// A mark found by a range query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkInfo {
    /// Start character offset.
    pub from: usize,
    /// End character offset.
    pub to: usize,
    /// Mark class.
    pub class_name: String,
    /// Identity, for marks created through [`DecorEditor::mark_text`].
    pub id: Option<MarkId>,
}

/// Handle to a mark created by [`DecorEditor::mark_text`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMarker {
    id: MarkId,
    class_name: String,
    cleared: bool,
}

impl TextMarker {
    /// Mark identity.
    pub fn id(&self) -> MarkId {
        self.id
    }

    /// Mark class.
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Whether [`TextMarker::clear`] has been called on this handle.
    pub fn is_cleared(&self) -> bool {
        self.cleared
    }

    /// Current range of the mark, or `None` once removed.
    pub fn find(&self, editor: &DecorEditor) -> Option<Range<usize>> {
        editor.find_mark(self.id)
    }

    /// Remove the mark. Calling it again does nothing.
    pub fn clear(&mut self, editor: &mut DecorEditor) -> Result<()> {
        if self.cleared {
            return Ok(());
        }
        let range = editor.find_mark(self.id).unwrap_or(0..0);
        editor.dispatch_effects(vec![StateEffect::RemoveMark {
            from: range.start,
            to: range.end,
            class: self.class_name.clone(),
            id: Some(self.id),
        }])?;
        self.cleared = true;
        Ok(())
    }
}

/// Handle to a line widget.
#[derive(Debug, Clone)]
pub struct LineWidget {
    widget: Widget,
    cleared: bool,
}

impl LineWidget {
    fn new(widget: Widget) -> Self {
        Self {
            widget,
            cleared: false,
        }
    }

    /// Widget identity.
    pub fn id(&self) -> WidgetId {
        self.widget.id()
    }

    /// The host node.
    pub fn node(&self) -> &Renderable {
        self.widget.node()
    }

    /// Widget class, if any.
    pub fn class_name(&self) -> Option<&str> {
        self.widget.options().class_name.as_deref()
    }

    /// Rendering options.
    pub fn options(&self) -> &WidgetOptions {
        self.widget.options()
    }

    /// Whether [`LineWidget::clear`] has been called on this handle.
    pub fn is_cleared(&self) -> bool {
        self.cleared
    }

    /// Zero-indexed line the widget is attached to, or `None` once removed.
    pub fn line(&self, editor: &DecorEditor) -> Option<usize> {
        let anchor = editor.find_widget(self.id())?;
        editor
            .view
            .line_at(anchor)
            .ok()
            .map(|line| line.number - 1)
    }

    /// Remove the widget. Calling it again does nothing.
    pub fn clear(&mut self, editor: &mut DecorEditor) -> Result<()> {
        if self.cleared {
            return Ok(());
        }
        let anchor = editor.find_widget(self.id()).unwrap_or(0);
        editor.dispatch_effects(vec![StateEffect::RemoveWidget {
            from: anchor,
            to: anchor,
            widget: self.widget.clone(),
        }])?;
        self.cleared = true;
        Ok(())
    }

    /// Tell the host the widget's size may have changed.
    pub fn changed(&self, editor: &mut DecorEditor) {
        tracing::trace!(widget = self.id().0, "widget re-measure requested");
        editor.view.request_measure();
    }
}

/// Handle returned by [`DecorEditor::add_overlay`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayHandle {
    id: OverlayId,
}

impl OverlayHandle {
    /// Overlay identity.
    pub fn id(&self) -> OverlayId {
        self.id
    }

    /// Unregister the overlay; returns `false` if it was already removed.
    pub fn dispose(self, editor: &mut DecorEditor) -> Result<bool> {
        editor.remove_overlay(self.id)
    }
}

/// Imperative decoration API over an [`EditorView`].
pub struct DecorEditor {
    view: EditorView,
    next_mark_id: u64,
    next_widget_id: u64,
}

impl DecorEditor {
    /// Create an editor over `text` with the default configuration.
    pub fn new(text: &str) -> Self {
        Self::with_config(text, EditorConfig::default())
    }

    /// Create an editor over `text`.
    pub fn with_config(text: &str, config: EditorConfig) -> Self {
        Self {
            view: EditorView::new(text, config),
            next_mark_id: 0,
            next_widget_id: 0,
        }
    }

    /// The underlying view.
    pub fn view(&self) -> &EditorView {
        &self.view
    }

    /// The document text.
    pub fn text(&self) -> String {
        self.view.doc().text()
    }

    /// Number of lines.
    pub fn line_count(&self) -> usize {
        self.view.doc().line_count()
    }

    /// State version.
    pub fn version(&self) -> u64 {
        self.view.version()
    }

    /// Subscribe to state change notifications.
    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(&StateChange) + 'static,
    {
        self.view.subscribe(callback);
    }

    fn line(&self, line: usize) -> Result<Line> {
        self.view.line(line.saturating_add(1))
    }

    fn dispatch_effects(&mut self, effects: Vec<StateEffect>) -> Result<()> {
        self.view.dispatch([TransactionSpec::effects(effects)])
    }

    /// Character offset of `(line, ch)`, clamped to the line end.
    pub fn index_from_pos(&self, line: usize, ch: usize) -> Result<usize> {
        let line = self.line(line)?;
        Ok(line.from + ch.min(line.len()))
    }

    /// Zero-indexed `(line, ch)` of a character offset.
    pub fn pos_from_index(&self, offset: usize) -> Result<(usize, usize)> {
        let line = self.view.line_at(offset)?;
        Ok((line.number - 1, offset - line.from))
    }

    // ---------------------------------------------------------------- editing

    /// Replace `from..to` with `text`.
    pub fn replace_range(&mut self, from: usize, to: usize, text: &str) -> Result<()> {
        let changes = ChangeSet::replace(self.view.doc().len_chars(), from, to, text)?;
        self.view.dispatch([TransactionSpec::changes(changes)])
    }

    /// Insert `text` at `pos`.
    pub fn insert(&mut self, pos: usize, text: &str) -> Result<()> {
        self.replace_range(pos, pos, text)
    }

    /// Replace the visible ranges.
    pub fn set_visible_ranges(&mut self, ranges: Vec<Range<usize>>) -> Result<()> {
        self.view.set_visible_ranges(ranges)
    }

    /// Make `count` lines starting at zero-indexed `first` the only visible range.
    pub fn scroll_to_lines(&mut self, first: usize, count: usize) -> Result<()> {
        let start = self.line(first)?;
        let last_index = first
            .saturating_add(count.max(1) - 1)
            .min(self.line_count() - 1);
        let end = self.line(last_index)?;
        self.view.set_visible_ranges(vec![start.from..end.to])
    }

    // ---------------------------------------------------------------- overlays

    /// Register an overlay after the existing ones and recompute.
    ///
    /// If the overlay fails its first recompute it is unregistered again and the error returned.
    pub fn add_overlay<O>(&mut self, overlay: O) -> Result<OverlayHandle>
    where
        O: Overlay + 'static,
    {
        let id = self.view.overlays_mut().add(overlay);
        if let Err(err) = self.dispatch_effects(vec![StateEffect::RefreshOverlays]) {
            self.view.overlays_mut().remove(id);
            self.dispatch_effects(vec![StateEffect::RefreshOverlays])?;
            return Err(err);
        }
        Ok(OverlayHandle { id })
    }

    /// Unregister an overlay and recompute; returns `false` if it was not registered.
    pub fn remove_overlay(&mut self, id: OverlayId) -> Result<bool> {
        let removed = self.view.overlays_mut().remove(id);
        self.dispatch_effects(vec![StateEffect::RefreshOverlays])?;
        Ok(removed)
    }

    // ---------------------------------------------------------------- line classes

    /// Add `class` (prefixed with the configured class prefix) to a line.
    ///
    /// `_where` is accepted for interface compatibility and ignored.
    pub fn add_line_class(&mut self, line: usize, _where: &str, class: &str) -> Result<()> {
        let line = self.line(line)?;
        let class = self.view.config().prefixed(class);
        self.dispatch_effects(vec![StateEffect::AddLineClass {
            from: line.from,
            to: line.to,
            class,
        }])
    }

    /// Remove `class` from a line; every equal line class on it goes.
    pub fn remove_line_class(&mut self, line: usize, _where: &str, class: &str) -> Result<()> {
        let line = self.line(line)?;
        let class = self.view.config().prefixed(class);
        self.dispatch_effects(vec![StateEffect::RemoveLineClass {
            from: line.from,
            to: line.to,
            class,
        }])
    }

    /// Classes of the line decorations anchored to a line.
    pub fn get_line_classes(&self, line: usize) -> Result<Vec<String>> {
        let line = self.line(line)?;
        Ok(self
            .view
            .decorations()
            .between(line.from, line.from)
            .into_iter()
            .filter(|range| range.from == line.from && range.value.is_line())
            .filter_map(|range| range.value.class().map(str::to_string))
            .collect())
    }

    // ---------------------------------------------------------------- marks

    /// Mark `from..to` with a class; the returned handle removes exactly this mark.
    pub fn mark_text(&mut self, from: usize, to: usize, options: MarkOptions) -> Result<TextMarker> {
        let len = self.view.doc().len_chars();
        if from > to || to > len {
            return Err(DecorError::InvalidRange { from, to });
        }

        self.next_mark_id += 1;
        let id = MarkId(self.next_mark_id);
        self.dispatch_effects(vec![StateEffect::AddMark {
            from,
            to,
            class: options.class_name.clone(),
            id: Some(id),
        }])?;

        Ok(TextMarker {
            id,
            class_name: options.class_name,
            cleared: false,
        })
    }

    /// Remove every mark of `class` (without identity) inside the lines covering `from..to`.
    pub fn clear_marks(&mut self, from: usize, to: usize, class: &str) -> Result<()> {
        self.dispatch_effects(vec![StateEffect::RemoveMark {
            from,
            to,
            class: class.to_string(),
            id: None,
        }])
    }

    /// Marks touching `[from, to]`.
    pub fn marks_in_range(&self, from: usize, to: usize) -> Vec<MarkInfo> {
        self.view
            .decorations()
            .between(from, to)
            .into_iter()
            .filter_map(mark_info)
            .collect()
    }

    /// Marks covering `pos` (including marks that start or end there).
    pub fn marks_at(&self, pos: usize) -> Vec<MarkInfo> {
        self.marks_in_range(pos, pos)
    }

    fn find_mark(&self, id: MarkId) -> Option<Range<usize>> {
        self.view
            .decorations()
            .iter()
            .find(|range| range.value.mark_id() == Some(id))
            .map(|range| range.from..range.to)
    }

    // ---------------------------------------------------------------- widgets

    /// Attach a widget below a line (or above it with `options.above`).
    pub fn add_line_widget(
        &mut self,
        line: usize,
        node: Renderable,
        options: WidgetOptions,
    ) -> Result<LineWidget> {
        let line = self.line(line)?;
        self.next_widget_id += 1;
        let widget = Widget::new(WidgetId(self.next_widget_id), node, options);
        self.dispatch_effects(vec![StateEffect::AddWidget {
            from: line.from,
            to: line.to,
            widget: widget.clone(),
        }])?;
        Ok(LineWidget::new(widget))
    }

    /// Widgets attached to a line, in render order.
    pub fn get_line_widgets(&self, line: usize) -> Result<Vec<LineWidget>> {
        let line = self.line(line)?;
        Ok(self
            .view
            .decorations()
            .between(line.from, line.to)
            .into_iter()
            .filter_map(|range| range.value.widget().cloned())
            .map(LineWidget::new)
            .collect())
    }

    fn find_widget(&self, id: WidgetId) -> Option<usize> {
        self.view
            .decorations()
            .iter()
            .find(|range| range.value.widget().map(Widget::id) == Some(id))
            .map(|range| range.from)
    }

    // ---------------------------------------------------------------- rendering

    /// Canonical and overlay decorations touching `[from, to]`, in render order.
    pub fn rendered_decorations(&self, from: usize, to: usize) -> Vec<&DecoratedRange> {
        self.view.rendered_decorations(from, to)
    }
}

fn mark_info(range: &DecoratedRange) -> Option<MarkInfo> {
    match range.value.as_ref() {
        Decoration::Mark { class, id } => Some(MarkInfo {
            from: range.from,
            to: range.to,
            class_name: class.clone(),
            id: *id,
        }),
        _ => None,
    }
}
