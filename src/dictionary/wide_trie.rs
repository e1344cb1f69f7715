//! Wide array trie
//!
//! Every node holds 255 child slots indexed by `byte - 1` (NUL has no edge)
//! plus a terminal flag. One edge per byte makes incremental descent a
//! single array load, at roughly a kilobyte per node. Nodes live in one
//! pool and refer to each other by index.

use super::{is_storable, PatternDictionary};

/// Slot value for "no child". The root is node 0 and is never a child.
const NO_CHILD: u32 = 0;

const FANOUT: usize = 255;

#[derive(Clone)]
struct WideNode {
    children: [u32; FANOUT],
    terminal: bool,
}

impl WideNode {
    fn new() -> Self {
        Self {
            children: [NO_CHILD; FANOUT],
            terminal: false,
        }
    }
}

/// 255-way trie over canonical bytes
#[derive(Clone)]
pub struct WideTrie {
    /// Node pool; index 0 is the root
    nodes: Vec<WideNode>,
    len: usize,
}

impl WideTrie {
    pub fn new() -> Self {
        Self {
            nodes: vec![WideNode::new()],
            len: 0,
        }
    }

    #[inline(always)]
    fn child(&self, node: u32, byte: u8) -> Option<u32> {
        let slot = (byte as usize).checked_sub(1)?;
        match self.nodes[node as usize].children[slot] {
            NO_CHILD => None,
            child => Some(child),
        }
    }

    /// Number of allocated nodes, root included
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Approximate heap footprint of the node pool
    pub fn heap_bytes(&self) -> usize {
        self.nodes.capacity() * std::mem::size_of::<WideNode>()
    }
}

impl Default for WideTrie {
    fn default() -> Self {
        Self::new()
    }
}

impl PatternDictionary for WideTrie {
    const NAME: &'static str = "wide";

    type Cursor<'a> = u32 where Self: 'a;

    fn insert(&mut self, pattern: &[u8]) -> bool {
        if !is_storable(pattern) {
            return false;
        }

        let mut node = 0usize;
        for &byte in pattern {
            let slot = byte as usize - 1;
            let next = self.nodes[node].children[slot];
            node = if next == NO_CHILD {
                let fresh = self.nodes.len();
                self.nodes.push(WideNode::new());
                self.nodes[node].children[slot] = fresh as u32;
                fresh
            } else {
                next as usize
            };
        }

        let added = !self.nodes[node].terminal;
        self.nodes[node].terminal = true;
        if added {
            self.len += 1;
        }
        added
    }

    fn len(&self) -> usize {
        self.len
    }

    fn root(&self) -> Option<u32> {
        (self.len > 0).then_some(0)
    }

    #[inline]
    fn descend_one_edge<'a>(&'a self, cursor: u32, path: &[u8]) -> Option<u32> {
        self.child(cursor, *path.last()?)
    }

    #[inline]
    fn is_terminal(&self, cursor: u32) -> bool {
        self.nodes[cursor as usize].terminal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_contains() {
        let mut trie = WideTrie::new();
        assert!(trie.insert(b"HELLO"));
        assert!(trie.insert(b"HELP"));
        assert!(trie.contains(b"HELLO"));
        assert!(trie.contains(b"HELP"));
        assert!(!trie.contains(b"HEL"));
        assert_eq!(trie.len(), 2);
    }

    #[test]
    fn test_shared_prefix_nodes() {
        let mut trie = WideTrie::new();
        trie.insert(b"ABCD");
        let after_first = trie.num_nodes();
        trie.insert(b"ABCE");
        // Only one new node for the diverging last byte
        assert_eq!(trie.num_nodes(), after_first + 1);
        assert!(trie.heap_bytes() >= trie.num_nodes() * 1020);
    }

    #[test]
    fn test_duplicate_not_counted() {
        let mut trie = WideTrie::new();
        assert!(trie.insert(b"ABCD"));
        assert!(!trie.insert(b"ABCD"));
        assert_eq!(trie.len(), 1);
    }

    #[test]
    fn test_prefix_of_stored_pattern_is_not_terminal() {
        let mut trie = WideTrie::new();
        trie.insert(b"ABCDEF");
        let cursor = trie.descend_from_root(b"ABCD").unwrap();
        assert!(!trie.is_terminal(cursor));

        trie.insert(b"ABCD");
        let cursor = trie.descend_from_root(b"ABCD").unwrap();
        assert!(trie.is_terminal(cursor));
    }

    #[test]
    fn test_nul_has_no_edge() {
        let mut trie = WideTrie::new();
        trie.insert(b"ABCD");
        let root = trie.root().unwrap();
        assert_eq!(trie.descend_one_edge(root, b"\0"), None);
    }

    #[test]
    fn test_high_bytes() {
        let mut trie = WideTrie::new();
        assert!(trie.insert(&[0xff, 0x01, 0x80, 0x7f]));
        assert!(trie.contains(&[0xff, 0x01, 0x80, 0x7f]));
    }
}
