#![warn(missing_docs)]
//! Editor Decor - Headless Decoration Engine for Code Editors
//!
//! # Overview
//!
//! `editor-decor` keeps visual annotations attached to a text document while it is edited:
//! per-line classes, classed text marks, block widgets between lines, and syntax overlays
//! computed from the visible part of the document. It does not render anything; the host reads
//! the decoration sets and draws them however it likes.
//!
//! # Core Features
//!
//! - **Position Mapping**: decorations follow edits through a [`ChangeSet`], never dropped by mapping
//! - **Effect-Driven Store**: every canonical decoration change is a [`StateEffect`] in a transaction
//! - **Sorted Decoration Sets**: `(from, to)` order with stable ties, O(log n + k) range queries
//! - **Viewport Overlays**: stream tokenizers ([`Overlay`]) rescanned over visible lines only
//! - **State Tracking**: version number mechanism and change notifications
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  DecorEditor (line classes, marks, widgets) │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  EditorView (transactions, viewport)        │  ← Host
//! ├──────────────────────┬──────────────────────┤
//! │  DecorationStore     │  OverlayEngine       │  ← Decoration Sources
//! ├──────────────────────┴──────────────────────┤
//! │  DecorationSet + DecorationCache            │  ← Values & Ranges
//! ├─────────────────────────────────────────────┤
//! │  Document (Rope) + ChangeSet                │  ← Text & Mapping
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use editor_decor::{DecorEditor, LineCursor, Overlay};
//! use std::borrow::Cow;
//!
//! struct Errors;
//!
//! impl Overlay for Errors {
//!     type State = ();
//!
//!     fn token(&self, cursor: &mut LineCursor<'_>, _state: &mut ()) -> Option<Cow<'_, str>> {
//!         cursor.skip_to_end();
//!         Some(Cow::Borrowed("line-error"))
//!     }
//! }
//!
//! let mut editor = DecorEditor::new("a\nb\nc");
//! editor.add_line_class(0, "", "hl").unwrap();
//! assert_eq!(editor.get_line_classes(0).unwrap(), vec!["cm-hl".to_string()]);
//!
//! editor.add_overlay(Errors).unwrap();
//! assert_eq!(editor.view().overlay_decorations().len(), 3);
//! ```
//!
//! # Module Description
//!
//! - [`changes`] - Change sets and position mapping
//! - [`document`] - Rope based document with line lookup
//! - [`decorations`] - Decoration values and sorted decoration sets
//! - [`cache`] - Shared decoration values per class
//! - [`effects`] - State effects and their mapping
//! - [`reducer`] - The effect-driven decoration store
//! - [`cursor`] - Line cursor for overlay tokenizers
//! - [`overlay`] - Overlay trait and the viewport-scoped overlay engine
//! - [`view`] - Transactions, viewport and dispatch
//! - [`facade`] - Line/mark/widget API and handles
//! - [`state`] - Change notifications
//! - [`config`] - Editor configuration

pub mod cache;
pub mod changes;
pub mod config;
pub mod cursor;
pub mod decorations;
pub mod document;
pub mod effects;
pub mod error;
pub mod facade;
pub mod overlay;
pub mod reducer;
pub mod state;
pub mod view;

pub use cache::DecorationCache;
pub use changes::{Assoc, ChangeEdit, ChangeSet};
pub use config::EditorConfig;
pub use cursor::{CharPredicate, LineCursor, count_column};
pub use decorations::{
    DecoratedRange, Decoration, DecorationSet, DecorationSetBuilder, MarkId, Renderable, Widget,
    WidgetId, WidgetOptions,
};
pub use document::{Document, Line};
pub use effects::{StateEffect, map_effects, map_range};
pub use error::{DecorError, Result};
pub use facade::{DecorEditor, LineWidget, MarkInfo, MarkOptions, OverlayHandle, TextMarker};
pub use overlay::{Overlay, OverlayEngine, OverlayId};
pub use reducer::DecorationStore;
pub use state::{StateChange, StateChangeCallback, StateChangeType};
pub use view::{EditorView, Transaction, TransactionSpec};
