//! Relation identity and comparison opt-outs.

use core::fmt;
use core::hash::{Hash, Hasher};
use core::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_RELATION_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a relation node.
///
/// Every constructed relation receives a fresh id. Clones keep it, so a
/// column can tell which relation it was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelationId(u64);

impl RelationId {
    /// Allocates a new id.
    #[must_use]
    pub fn fresh() -> Self {
        Self(NEXT_RELATION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Wraps a field that takes no part in equality or hashing.
#[derive(Clone, Copy, Default)]
pub struct NoCompare<T>(pub T);

impl<T> PartialEq for NoCompare<T> {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl<T> Eq for NoCompare<T> {}

impl<T> Hash for NoCompare<T> {
    fn hash<H: Hasher>(&self, _state: &mut H) {}
}

impl<T> Deref for NoCompare<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: fmt::Debug> fmt::Debug for NoCompare<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_fresh_ids_differ() {
        assert_ne!(RelationId::fresh(), RelationId::fresh());
    }

    #[test]
    fn test_no_compare_is_ignored() {
        assert_eq!(NoCompare(1), NoCompare(2));
        let set: HashSet<_> = [(1, NoCompare("a")), (1, NoCompare("b"))].into_iter().collect();
        assert_eq!(set.len(), 1);
    }
}
