//! State change notifications.
//!
//! Every dispatch bumps the view's version number and reports what changed to subscribers,
//! so a host can re-render only what it has to:
//!
//! ```rust
//! use editor_decor::{DecorEditor, StateChangeType};
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let mut editor = DecorEditor::new("abc\ndef");
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let sink = Rc::clone(&seen);
//! editor.subscribe(move |change| sink.borrow_mut().push(change.change_type));
//!
//! editor.add_line_class(0, "", "hl").unwrap();
//! assert_eq!(*seen.borrow(), vec![StateChangeType::DecorationsChanged]);
//! ```

use crate::changes::ChangeSet;
use std::rc::Rc;

/// State change type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateChangeType {
    /// Document text changed.
    DocumentChanged,
    /// Visible ranges changed.
    ViewportChanged,
    /// The effect-driven decoration set changed.
    DecorationsChanged,
    /// The overlay decoration set was recomputed.
    OverlaysChanged,
    /// A widget asked the host to measure it again.
    MeasureRequested,
}

/// State change record
#[derive(Debug, Clone)]
pub struct StateChange {
    /// Change type
    pub change_type: StateChangeType,
    /// Old version number
    pub old_version: u64,
    /// New version number
    pub new_version: u64,
    /// The document change, for [`StateChangeType::DocumentChanged`].
    pub changes: Option<Rc<ChangeSet>>,
}

impl StateChange {
    /// Create a new state change record.
    pub fn new(change_type: StateChangeType, old_version: u64, new_version: u64) -> Self {
        Self {
            change_type,
            old_version,
            new_version,
            changes: None,
        }
    }

    /// Attach the document change to this record.
    pub fn with_changes(mut self, changes: Rc<ChangeSet>) -> Self {
        self.changes = Some(changes);
        self
    }
}

/// State change callback function type
pub type StateChangeCallback = Box<dyn FnMut(&StateChange)>;

/// Subscriber list plus the version counter.
#[derive(Default)]
pub(crate) struct StateTracker {
    version: u64,
    callbacks: Vec<StateChangeCallback>,
}

impl StateTracker {
    pub(crate) fn version(&self) -> u64 {
        self.version
    }

    pub(crate) fn subscribe(&mut self, callback: StateChangeCallback) {
        self.callbacks.push(callback);
    }

    /// Bump the version once and report `changes` under the new version.
    pub(crate) fn commit(&mut self, changes: Vec<StateChange>) {
        if changes.is_empty() {
            return;
        }
        let old_version = self.version;
        self.version += 1;
        for mut change in changes {
            change.old_version = old_version;
            change.new_version = self.version;
            self.notify(&change);
        }
    }

    /// Report a change without bumping the version.
    pub(crate) fn notify_change(&mut self, change_type: StateChangeType) {
        let change = StateChange::new(change_type, self.version, self.version);
        self.notify(&change);
    }

    fn notify(&mut self, change: &StateChange) {
        for callback in &mut self.callbacks {
            callback(change);
        }
    }
}
