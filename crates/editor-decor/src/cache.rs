//! Shared decoration values keyed by class name.
//!
//! Line and mark values with the same class are the same `Rc`, so a decoration set holding
//! thousands of `cm-keyword` marks holds one value. Marks that carry a [`MarkId`] are never
//! cached: each one must stay distinguishable from every other mark of its class.
//!
//! The cache is owned by one facade and dropped with it. It is never evicted; its size is bounded
//! by the number of distinct classes, not by document size or edit count.

use crate::decorations::{Decoration, MarkId};
use std::collections::HashMap;
use std::rc::Rc;

/// Class name → decoration value memo.
#[derive(Debug, Default)]
pub struct DecorationCache {
    lines: HashMap<String, Rc<Decoration>>,
    marks: HashMap<String, Rc<Decoration>>,
}

impl DecorationCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The line decoration value for `class`.
    pub fn line(&mut self, class: &str) -> Rc<Decoration> {
        if let Some(value) = self.lines.get(class) {
            return Rc::clone(value);
        }
        tracing::trace!(class, "caching line decoration");
        let value = Rc::new(Decoration::Line {
            class: class.to_string(),
        });
        self.lines.insert(class.to_string(), Rc::clone(&value));
        value
    }

    /// The mark decoration value for `class`; a fresh value whenever `id` is set.
    pub fn mark(&mut self, class: &str, id: Option<MarkId>) -> Rc<Decoration> {
        if id.is_some() {
            return Rc::new(Decoration::Mark {
                class: class.to_string(),
                id,
            });
        }
        if let Some(value) = self.marks.get(class) {
            return Rc::clone(value);
        }
        tracing::trace!(class, "caching mark decoration");
        let value = Rc::new(Decoration::Mark {
            class: class.to_string(),
            id: None,
        });
        self.marks.insert(class.to_string(), Rc::clone(&value));
        value
    }

    /// Number of cached values.
    pub fn len(&self) -> usize {
        self.lines.len() + self.marks.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.marks.is_empty()
    }

    /// Drop every cached value.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.marks.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_class_shares_value() {
        let mut cache = DecorationCache::new();
        let a = cache.line("cm-hl");
        let b = cache.line("cm-hl");
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);

        let m = cache.mark("cm-hl", None);
        assert!(!Rc::ptr_eq(&a, &m));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_identity_bypasses_cache() {
        let mut cache = DecorationCache::new();
        let a = cache.mark("err", Some(MarkId(1)));
        let b = cache.mark("err", Some(MarkId(1)));
        assert!(!Rc::ptr_eq(&a, &b));
        assert!(cache.is_empty());
        assert_ne!(*a, *cache.mark("err", None));
    }

    #[test]
    fn test_clear() {
        let mut cache = DecorationCache::new();
        cache.line("a");
        cache.mark("b", None);
        cache.clear();
        assert!(cache.is_empty());
    }
}
