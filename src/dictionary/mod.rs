//! Pattern dictionaries
//!
//! Two tries implement one incremental-descent interface:
//! - [`CritBitTrie`]: binary crit-bit trie, O(pattern count) nodes, the
//!   default for large dictionaries
//! - [`WideTrie`]: 255-way array trie, simple and fast, memory hungry
//!
//! Both are built once and are read-only while scanning.

pub mod crit_bit;
pub mod loader;
pub mod prefix_filter;
pub mod wide_trie;

pub use crit_bit::{CritBitCursor, CritBitTrie};
pub use loader::{classify_line, LineClass, LoadError, LoadStats};
pub use prefix_filter::PrefixFilter;
pub use wide_trie::WideTrie;

/// A trie over canonical byte strings that supports incremental descent.
///
/// A cursor stands for a prefix `p` that at least one stored pattern starts
/// with. Extending the prefix by one byte moves the cursor along one edge;
/// once no stored pattern starts with the prefix the cursor is gone and no
/// longer prefix can match either.
pub trait PatternDictionary {
    /// Short name used in logs and telemetry
    const NAME: &'static str;

    /// Position reached by a descent
    type Cursor<'a>: Copy
    where
        Self: 'a;

    /// Store `pattern`. Returns `true` if it was not already present.
    ///
    /// Empty patterns and patterns containing NUL are not stored.
    fn insert(&mut self, pattern: &[u8]) -> bool;

    /// Number of distinct stored patterns
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cursor for the empty prefix, `None` if nothing is stored
    fn root(&self) -> Option<Self::Cursor<'_>>;

    /// Move `cursor` along the edge labeled by the last byte of `path`.
    ///
    /// `path` is the full prefix from the root: the cursor's own prefix
    /// followed by exactly one new byte.
    fn descend_one_edge<'a>(
        &'a self,
        cursor: Self::Cursor<'a>,
        path: &[u8],
    ) -> Option<Self::Cursor<'a>>;

    /// Whether the cursor's prefix is itself a stored pattern
    fn is_terminal(&self, cursor: Self::Cursor<'_>) -> bool;

    /// Walk `prefix` from the root
    fn descend_from_root<'a>(&'a self, prefix: &[u8]) -> Option<Self::Cursor<'a>> {
        let mut cursor = self.root()?;
        for len in 1..=prefix.len() {
            cursor = self.descend_one_edge(cursor, &prefix[..len])?;
        }
        Some(cursor)
    }

    /// Exact membership test
    fn contains(&self, pattern: &[u8]) -> bool {
        !pattern.is_empty()
            && self
                .descend_from_root(pattern)
                .is_some_and(|cursor| self.is_terminal(cursor))
    }
}

/// Patterns that neither trie can represent
#[inline]
pub(crate) fn is_storable(pattern: &[u8]) -> bool {
    !pattern.is_empty() && !pattern.contains(&0)
}
