//! Decoration values and the sorted range set that stores them.
//!
//! Decorations are UI-facing annotations anchored to document character offsets, without
//! modifying the document text:
//!
//! - **line** decorations add a class to a whole line (zero-width, at the line start)
//! - **mark** decorations add a class to a span of text
//! - **widget** decorations carry an opaque host node rendered above or below a line
//!
//! A [`DecorationSet`] is only valid for the document snapshot it was built or mapped against.
//! It is always sorted by `(from, to)`, which is the order the render layer consumes it in.

use crate::error::{DecorError, Result};
use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// Stable identity of a mark, used for precise single-instance removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MarkId(pub u64);

/// Stable identity of a line widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WidgetId(pub u64);

/// An opaque, host-owned renderable node.
///
/// The engine never looks inside; hosts recover their node with [`Renderable::downcast_ref`].
#[derive(Clone)]
pub struct Renderable(Rc<dyn Any>);

impl Renderable {
    /// Wrap a host node.
    pub fn new<T: Any>(node: T) -> Self {
        Self(Rc::new(node))
    }

    /// Borrow the host node as its concrete type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    /// Returns `true` if both handles wrap the same node allocation.
    pub fn ptr_eq(&self, other: &Renderable) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Renderable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Renderable(..)")
    }
}

/// Rendering options for a line widget.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WidgetOptions {
    /// Extra class applied to the widget container.
    pub class_name: Option<String>,
    /// Render above the line (anchored at its start) instead of below (anchored at its end).
    pub above: bool,
    /// Extend the widget over the gutter.
    pub cover_gutter: bool,
    /// Keep the widget fixed during horizontal scrolling.
    pub no_h_scroll: bool,
    /// Let the widget receive mouse events instead of the editor.
    pub handle_mouse_events: bool,
}

/// A line widget payload.
///
/// Equality is by [`WidgetId`] only.
#[derive(Debug, Clone)]
pub struct Widget {
    id: WidgetId,
    node: Renderable,
    options: WidgetOptions,
}

impl Widget {
    /// Create a widget payload.
    pub fn new(id: WidgetId, node: Renderable, options: WidgetOptions) -> Self {
        Self { id, node, options }
    }

    /// Widget identity.
    pub fn id(&self) -> WidgetId {
        self.id
    }

    /// The host node.
    pub fn node(&self) -> &Renderable {
        &self.node
    }

    /// Rendering options.
    pub fn options(&self) -> &WidgetOptions {
        &self.options
    }

    /// Whether the widget renders above its line.
    pub fn above(&self) -> bool {
        self.options.above
    }
}

impl PartialEq for Widget {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// A decoration value.
///
/// Values are immutable and shared (`Rc<Decoration>`) between every range that uses them.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoration {
    /// Whole-line class, anchored zero-width at the line start.
    Line {
        /// Class name.
        class: String,
    },
    /// Class over a span of text.
    Mark {
        /// Class name.
        class: String,
        /// Identity for precise removal; `None` for value-matched marks.
        id: Option<MarkId>,
    },
    /// Block widget above or below a line.
    Widget(Widget),
}

impl Decoration {
    /// Class carried by this decoration (the widget class for widgets).
    pub fn class(&self) -> Option<&str> {
        match self {
            Decoration::Line { class } | Decoration::Mark { class, .. } => Some(class.as_str()),
            Decoration::Widget(widget) => widget.options.class_name.as_deref(),
        }
    }

    /// Mark identity, if any.
    pub fn mark_id(&self) -> Option<MarkId> {
        match self {
            Decoration::Mark { id, .. } => *id,
            _ => None,
        }
    }

    /// Widget payload, if this is a widget decoration.
    pub fn widget(&self) -> Option<&Widget> {
        match self {
            Decoration::Widget(widget) => Some(widget),
            _ => None,
        }
    }

    /// Returns `true` for line decorations.
    pub fn is_line(&self) -> bool {
        matches!(self, Decoration::Line { .. })
    }

    /// Returns `true` for mark decorations.
    pub fn is_mark(&self) -> bool {
        matches!(self, Decoration::Mark { .. })
    }
}

/// A decoration value placed over `[from, to)`.
#[derive(Debug, Clone, PartialEq)]
pub struct DecoratedRange {
    /// Start character offset.
    pub from: usize,
    /// End character offset (equal to `from` for zero-width decorations).
    pub to: usize,
    /// The shared decoration value.
    pub value: Rc<Decoration>,
}

impl DecoratedRange {
    /// Create a decorated range.
    pub fn new(from: usize, to: usize, value: Rc<Decoration>) -> Self {
        Self { from, to, value }
    }

    fn key(&self) -> (usize, usize) {
        (self.from, self.to)
    }
}

/// A sorted, snapshot-bound collection of decorated ranges.
///
/// Sorted by `(from, to)` ascending; ranges with equal keys keep their insertion order.
/// Query complexity: O(log n + k) thanks to a prefix maximum of range ends.
#[derive(Debug, Clone, Default)]
pub struct DecorationSet {
    ranges: Vec<DecoratedRange>,
    /// `prefix_max_end[i] = max(ranges[0..=i].to)`, used to stop backward scans early.
    prefix_max_end: Vec<usize>,
}

impl DecorationSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    fn rebuild_prefix_max_end_from(&mut self, start_idx: usize) {
        if self.prefix_max_end.len() != self.ranges.len() {
            self.prefix_max_end.resize(self.ranges.len(), 0);
        }

        let mut max_end = if start_idx == 0 {
            0
        } else {
            self.prefix_max_end[start_idx - 1]
        };

        for (idx, range) in self.ranges.iter().enumerate().skip(start_idx) {
            max_end = max_end.max(range.to);
            self.prefix_max_end[idx] = max_end;
        }
    }

    /// Insert a range, keeping sort order.
    pub fn insert(&mut self, range: DecoratedRange) {
        let key = range.key();
        let pos = self.ranges.partition_point(|r| r.key() <= key);
        self.ranges.insert(pos, range);
        self.prefix_max_end.insert(pos, 0);
        self.rebuild_prefix_max_end_from(pos);
    }

    /// Keep only ranges matching `keep`; returns how many were removed.
    pub fn retain<F>(&mut self, keep: F) -> usize
    where
        F: FnMut(&DecoratedRange) -> bool,
    {
        let before = self.ranges.len();
        self.ranges.retain(keep);
        let removed = before - self.ranges.len();
        if removed > 0 {
            self.prefix_max_end.truncate(self.ranges.len());
            self.rebuild_prefix_max_end_from(0);
        }
        removed
    }

    /// Move every range through `map` and restore sort order (stable for equal keys).
    pub(crate) fn remap<F>(&mut self, mut map: F)
    where
        F: FnMut(&DecoratedRange) -> (usize, usize),
    {
        for range in &mut self.ranges {
            let (from, to) = map(range);
            range.from = from;
            range.to = to;
        }
        self.ranges.sort_by_key(DecoratedRange::key);
        self.rebuild_prefix_max_end_from(0);
    }

    /// All ranges touching `[from, to]`, in set order.
    ///
    /// Touching is inclusive on both ends so zero-width decorations at either boundary are
    /// reported.
    pub fn between(&self, from: usize, to: usize) -> Vec<&DecoratedRange> {
        let end = self.ranges.partition_point(|r| r.from <= to);
        let mut result = Vec::new();

        for idx in (0..end).rev() {
            // Nothing at or before `idx` reaches `from`.
            if self.prefix_max_end[idx] < from {
                break;
            }
            let range = &self.ranges[idx];
            if range.to >= from {
                result.push(range);
            }
        }

        result.reverse();
        result
    }

    /// Iterate in set order.
    pub fn iter(&self) -> std::slice::Iter<'_, DecoratedRange> {
        self.ranges.iter()
    }

    /// Number of ranges.
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Check the `(from, to)` ordering contract.
    pub fn is_sorted(&self) -> bool {
        self.ranges.windows(2).all(|w| w[0].key() <= w[1].key())
    }
}

impl<'a> IntoIterator for &'a DecorationSet {
    type Item = &'a DecoratedRange;
    type IntoIter = std::slice::Iter<'a, DecoratedRange>;

    fn into_iter(self) -> Self::IntoIter {
        self.ranges.iter()
    }
}

/// Bulk builder for a [`DecorationSet`]; ranges must arrive in non-decreasing `(from, to)` order.
#[derive(Debug, Default)]
pub struct DecorationSetBuilder {
    ranges: Vec<DecoratedRange>,
}

impl DecorationSetBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a range.
    pub fn add(&mut self, from: usize, to: usize, value: Rc<Decoration>) -> Result<()> {
        if from > to {
            return Err(DecorError::InvalidRange { from, to });
        }
        if let Some(prev) = self.ranges.last()
            && prev.key() > (from, to)
        {
            return Err(DecorError::UnsortedDecorations {
                prev_from: prev.from,
                prev_to: prev.to,
                from,
                to,
            });
        }
        self.ranges.push(DecoratedRange::new(from, to, value));
        Ok(())
    }

    /// Finish building.
    pub fn finish(self) -> DecorationSet {
        let mut set = DecorationSet {
            ranges: self.ranges,
            prefix_max_end: Vec::new(),
        };
        set.rebuild_prefix_max_end_from(0);
        set
    }
}
