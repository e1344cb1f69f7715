//! Crit-bit trie
//!
//! A binary trie keyed on the first bit at which two stored strings differ.
//! Branches record that position as a byte index plus a single-bit mask;
//! leaves own the full pattern. A dictionary of `n` patterns has exactly
//! `n - 1` branches regardless of alphabet or pattern length.
//!
//! Bytes past the end of a key read as zero, which is why NUL-containing
//! patterns are refused: with them, a key and its zero extension would be
//! indistinguishable.
//!
//! # Incremental descent
//!
//! Extending a prefix `p` (length `n`) by one byte only changes what the walk
//! sees at byte index `n`. Every branch on `p`'s path that tests an index
//! below `n` therefore sends `p + c` the same way, so a walk for `p + c` can
//! start at the first branch testing index `n` or later: the nearest node.
//! Each cursor remembers that node for its own prefix length.
//!
//! The walk for `p` ends at a leaf that starts with `p` if and only if some
//! stored pattern starts with `p`; that is the cursor's existence test.

use super::{is_storable, PatternDictionary};

#[derive(Debug)]
enum Node {
    Branch(Branch),
    Leaf(Box<[u8]>),
}

#[derive(Debug)]
struct Branch {
    /// Index of the byte holding the critical bit
    byte: u32,
    /// The critical bit itself
    mask: u8,
    /// `[bit clear, bit set]`
    children: Box<[Node; 2]>,
}

impl Branch {
    #[inline(always)]
    fn direction(&self, key: &[u8]) -> usize {
        usize::from(byte_at(key, self.byte as usize) & self.mask != 0)
    }

    /// Whether a new branch at (`byte`, `mask`) belongs below this one
    #[inline]
    fn precedes(&self, byte: u32, mask: u8) -> bool {
        self.byte < byte || (self.byte == byte && self.mask > mask)
    }
}

#[inline(always)]
fn byte_at(key: &[u8], index: usize) -> u8 {
    key.get(index).copied().unwrap_or(0)
}

/// Position of the first differing bit between two keys, as
/// (byte index, single-bit mask). `None` when the keys are equal.
fn critical_bit(a: &[u8], b: &[u8]) -> Option<(u32, u8)> {
    (0..a.len().max(b.len())).find_map(|i| {
        let diff = byte_at(a, i) ^ byte_at(b, i);
        (diff != 0).then(|| (i as u32, 0x80u8 >> diff.leading_zeros()))
    })
}

/// Descent position in a [`CritBitTrie`]
#[derive(Clone, Copy, Debug)]
pub struct CritBitCursor<'a> {
    /// Where the walk for the next longer prefix resumes
    nearest: &'a Node,
    /// Leaf reached by the walk; starts with the cursor's prefix
    leaf: &'a [u8],
    /// Length of the cursor's prefix
    depth: usize,
}

impl CritBitCursor<'_> {
    /// Length of the prefix this cursor stands for
    pub fn depth(&self) -> usize {
        self.depth
    }
}

/// Binary crit-bit trie with exclusively owned nodes
#[derive(Debug, Default)]
pub struct CritBitTrie {
    root: Option<Node>,
    len: usize,
}

impl CritBitTrie {
    pub fn new() -> Self {
        Self::default()
    }

    /// Walk `key` from `start` to a leaf. Returns the first branch whose
    /// byte index is at least `key.len()` (or the leaf when there is none)
    /// together with the leaf's pattern.
    fn walk<'a>(start: &'a Node, key: &[u8]) -> (&'a Node, &'a [u8]) {
        let mut node = start;
        let mut nearest = None;
        loop {
            match node {
                Node::Leaf(leaf) => return (nearest.unwrap_or(node), leaf),
                Node::Branch(branch) => {
                    if nearest.is_none() && branch.byte as usize >= key.len() {
                        nearest = Some(node);
                    }
                    node = &branch.children[branch.direction(key)];
                }
            }
        }
    }

    fn cursor_at<'a>(start: &'a Node, key: &[u8]) -> Option<CritBitCursor<'a>> {
        let (nearest, leaf) = Self::walk(start, key);
        leaf.starts_with(key).then_some(CritBitCursor {
            nearest,
            leaf,
            depth: key.len(),
        })
    }

    fn insert_at(slot: &mut Node, key: &[u8], byte: u32, mask: u8, existing_dir: usize) {
        if let Node::Branch(branch) = slot {
            if branch.precedes(byte, mask) {
                let dir = branch.direction(key);
                return Self::insert_at(&mut branch.children[dir], key, byte, mask, existing_dir);
            }
        }

        let existing = std::mem::replace(slot, Node::Leaf(Box::default()));
        let fresh = Node::Leaf(key.into());
        let children = if existing_dir == 1 {
            [fresh, existing]
        } else {
            [existing, fresh]
        };
        *slot = Node::Branch(Branch {
            byte,
            mask,
            children: Box::new(children),
        });
    }

    /// Number of branch nodes
    pub fn num_branches(&self) -> usize {
        self.len.saturating_sub(1)
    }
}

impl PatternDictionary for CritBitTrie {
    const NAME: &'static str = "crit_bit";

    type Cursor<'a> = CritBitCursor<'a> where Self: 'a;

    fn insert(&mut self, pattern: &[u8]) -> bool {
        if !is_storable(pattern) {
            return false;
        }

        let root = match self.root.as_mut() {
            Some(root) => root,
            None => {
                self.root = Some(Node::Leaf(pattern.into()));
                self.len = 1;
                return true;
            }
        };

        let (_, best) = Self::walk(root, pattern);
        let Some((byte, mask)) = critical_bit(best, pattern) else {
            return false;
        };
        let existing_dir = usize::from(byte_at(best, byte as usize) & mask != 0);

        Self::insert_at(root, pattern, byte, mask, existing_dir);
        self.len += 1;
        true
    }

    fn len(&self) -> usize {
        self.len
    }

    fn root(&self) -> Option<CritBitCursor<'_>> {
        Self::cursor_at(self.root.as_ref()?, &[])
    }

    #[inline]
    fn descend_one_edge<'a>(
        &'a self,
        cursor: CritBitCursor<'a>,
        path: &[u8],
    ) -> Option<CritBitCursor<'a>> {
        debug_assert_eq!(path.len(), cursor.depth + 1);
        Self::cursor_at(cursor.nearest, path)
    }

    #[inline]
    fn is_terminal(&self, cursor: CritBitCursor<'_>) -> bool {
        cursor.leaf.len() == cursor.depth
    }

    fn descend_from_root<'a>(&'a self, prefix: &[u8]) -> Option<CritBitCursor<'a>> {
        Self::cursor_at(self.root.as_ref()?, prefix)
    }
}
