//! Prefix pre-filter
//!
//! A hash set of the first [`PREFIX_LEN`] bytes of every stored pattern.
//! A window whose leading bytes are not in the set cannot start with any
//! pattern, so the engine skips the trie walk entirely.
//!
//! # Invariants
//! - Sound: every pattern's prefix is inserted alongside the pattern, so a
//!   window that starts with a stored pattern is always admitted.
//! - False positives only cost a wasted descent.

use std::collections::HashSet;

/// Number of leading bytes the filter keys on
pub const PREFIX_LEN: usize = 4;

/// Set of fixed-length pattern prefixes
#[derive(Clone, Debug, Default)]
pub struct PrefixFilter {
    prefixes: HashSet<u32>,
}

impl PrefixFilter {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline(always)]
    fn key(bytes: &[u8]) -> Option<u32> {
        let prefix: [u8; PREFIX_LEN] = bytes.get(..PREFIX_LEN)?.try_into().ok()?;
        Some(u32::from_le_bytes(prefix))
    }

    /// Record the prefix of `pattern`. Patterns shorter than
    /// [`PREFIX_LEN`] cannot be represented and return `false`.
    pub fn insert(&mut self, pattern: &[u8]) -> bool {
        match Self::key(pattern) {
            Some(key) => {
                self.prefixes.insert(key);
                true
            }
            None => false,
        }
    }

    /// Whether `window` may start with a stored pattern
    #[inline]
    pub fn admits(&self, window: &[u8]) -> bool {
        Self::key(window).is_some_and(|key| self.prefixes.contains(&key))
    }

    /// Number of distinct prefixes
    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }
}
