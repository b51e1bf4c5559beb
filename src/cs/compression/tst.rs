//! Ternary search trie keyed by byte strings.
//!
//! Each node holds one byte of a key and three links: keys whose byte at this
//! depth is smaller, keys that continue past this byte, and keys whose byte
//! is larger. Nodes live in a flat arena and refer to each other by index.
//! No rebalancing is done, so insertion order shapes the trie but never
//! changes the answers it gives.
//!
//! # Example
//!
//! ```
//! use bitcodec::cs::compression::tst::Tst;
//!
//! let mut st = Tst::new();
//! for (i, word) in ["she", "sells", "sea", "shells", "shore"].iter().enumerate() {
//!     st.put(word.as_bytes(), i).unwrap();
//! }
//! assert_eq!(st.get(b"sea").unwrap(), Some(&2));
//! assert_eq!(st.longest_prefix_of(b"shell"), b"she");
//! ```

use crate::cs::error::{Error, Result};

#[derive(Debug, Clone)]
struct Node<V> {
    byte: u8,
    value: Option<V>,
    left: Option<usize>,
    mid: Option<usize>,
    right: Option<usize>,
}

impl<V> Node<V> {
    fn new(byte: u8) -> Self {
        Self {
            byte,
            value: None,
            left: None,
            mid: None,
            right: None,
        }
    }
}

/// Where a node is attached: the root slot or one of a node's three links.
#[derive(Debug, Clone, Copy)]
enum Link {
    Root,
    Left(usize),
    Mid(usize),
    Right(usize),
}

/// A symbol table from non-empty byte strings to values.
#[derive(Debug, Clone)]
pub struct Tst<V> {
    nodes: Vec<Node<V>>,
    root: Option<usize>,
    len: usize,
}

impl<V> Default for Tst<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Tst<V> {
    /// Creates an empty trie.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            root: None,
            len: 0,
        }
    }

    /// Number of keys stored.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the value stored for `key`.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if `key` is empty.
    pub fn get(&self, key: &[u8]) -> Result<Option<&V>> {
        check_key(key)?;
        Ok(self.find(key).and_then(|idx| self.nodes[idx].value.as_ref()))
    }

    /// Whether `key` has a value.
    pub fn contains(&self, key: &[u8]) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if `key` is empty. The trie is left untouched.
    pub fn put(&mut self, key: &[u8], value: V) -> Result<()> {
        check_key(key)?;
        let mut link = Link::Root;
        let mut depth = 0;
        loop {
            let byte = key[depth];
            let idx = match self.target(link) {
                Some(idx) => idx,
                None => {
                    let idx = self.nodes.len();
                    self.nodes.push(Node::new(byte));
                    self.attach(link, idx);
                    idx
                }
            };
            let node_byte = self.nodes[idx].byte;
            if byte < node_byte {
                link = Link::Left(idx);
            } else if byte > node_byte {
                link = Link::Right(idx);
            } else if depth + 1 < key.len() {
                depth += 1;
                link = Link::Mid(idx);
            } else {
                if self.nodes[idx].value.replace(value).is_none() {
                    self.len += 1;
                }
                return Ok(());
            }
        }
    }

    /// Returns the longest stored key that is a prefix of `query`, or an
    /// empty slice when there is none (including when `query` is empty).
    pub fn longest_prefix_of<'q>(&self, query: &'q [u8]) -> &'q [u8] {
        let len = self.longest_prefix_entry(query).map_or(0, |(len, _)| len);
        &query[..len]
    }

    /// Length of the longest stored key that prefixes `query`, with its value.
    pub fn longest_prefix_entry(&self, query: &[u8]) -> Option<(usize, &V)> {
        let mut best = None;
        let mut current = self.root;
        let mut i = 0;
        while let Some(idx) = current {
            if i == query.len() {
                break;
            }
            let node = &self.nodes[idx];
            let byte = query[i];
            if byte < node.byte {
                current = node.left;
            } else if byte > node.byte {
                current = node.right;
            } else {
                i += 1;
                if let Some(value) = node.value.as_ref() {
                    best = Some((i, value));
                }
                current = node.mid;
            }
        }
        best
    }

    fn find(&self, key: &[u8]) -> Option<usize> {
        let mut current = self.root;
        let mut depth = 0;
        while let Some(idx) = current {
            let node = &self.nodes[idx];
            let byte = key[depth];
            if byte < node.byte {
                current = node.left;
            } else if byte > node.byte {
                current = node.right;
            } else if depth + 1 < key.len() {
                depth += 1;
                current = node.mid;
            } else {
                return Some(idx);
            }
        }
        None
    }

    fn target(&self, link: Link) -> Option<usize> {
        match link {
            Link::Root => self.root,
            Link::Left(idx) => self.nodes[idx].left,
            Link::Mid(idx) => self.nodes[idx].mid,
            Link::Right(idx) => self.nodes[idx].right,
        }
    }

    fn attach(&mut self, link: Link, child: usize) {
        let slot = match link {
            Link::Root => &mut self.root,
            Link::Left(idx) => &mut self.nodes[idx].left,
            Link::Mid(idx) => &mut self.nodes[idx].mid,
            Link::Right(idx) => &mut self.nodes[idx].right,
        };
        *slot = Some(child);
    }
}

fn check_key(key: &[u8]) -> Result<()> {
    if key.is_empty() {
        return Err(Error::InvalidInput("TST keys must be non-empty".to_string()));
    }
    Ok(())
}
