//! Huffman compression over bytes.
//!
//! Stream layout:
//!
//! 1. The trie, preorder: a `1` bit followed by the 8-bit symbol for a leaf,
//!    or a `0` bit followed by the left and then the right subtree.
//! 2. The number of encoded symbols as a 32-bit unsigned integer.
//! 3. Each input byte's code, left edges as `0` and right edges as `1`.
//!
//! The input is read twice: once to count frequencies, once to encode.

use crate::cs::compression::bitio::{BitReader, BitWriter};
use crate::cs::compression::{Compression, Result};
use crate::cs::error::Error;
use log::{debug, trace};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap, HashMap};
use std::io::{Read, Write};

/// Bits per encoded symbol.
pub const SYMBOL_BITS: u32 = 8;
/// Bits used for the symbol count.
pub const COUNT_BITS: u32 = 32;

/// Deepest trie a 256-symbol alphabet can produce.
const MAX_DEPTH: usize = 255;
const MAX_LEAVES: usize = 256;

/// A node of the Huffman trie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HuffmanNode {
    /// A leaf holds the byte it decodes to.
    Leaf(u8),
    /// An internal node; `0` selects `left` and `1` selects `right`.
    Internal {
        left: Box<HuffmanNode>,
        right: Box<HuffmanNode>,
    },
}

impl HuffmanNode {
    pub fn is_leaf(&self) -> bool {
        matches!(self, HuffmanNode::Leaf(_))
    }

    /// Symbols of all leaves, left to right.
    pub fn leaves(&self) -> Vec<u8> {
        let mut symbols = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match node {
                HuffmanNode::Leaf(symbol) => symbols.push(*symbol),
                HuffmanNode::Internal { left, right } => {
                    stack.push(right);
                    stack.push(left);
                }
            }
        }
        symbols
    }
}

/// Heap entry ordering nodes by frequency, then by creation order.
///
/// `BinaryHeap` is a max-heap, so the comparison is reversed to pop the
/// rarest (and among equals, the oldest) node first.
#[derive(Debug)]
struct HeapEntry {
    freq: u64,
    seq: usize,
    node: Box<HuffmanNode>,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.freq == other.freq && self.seq == other.seq
    }
}

impl Eq for HeapEntry {}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        (other.freq, other.seq).cmp(&(self.freq, self.seq))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Build a frequency table mapping each byte in `input` to its frequency.
pub fn build_frequency_table(input: &[u8]) -> BTreeMap<u8, u64> {
    let mut freq = BTreeMap::new();
    for &byte in input {
        *freq.entry(byte).or_insert(0) += 1;
    }
    freq
}

/// Build the Huffman trie for a frequency table.
///
/// Leaves enter the heap in ascending symbol order and ties are broken by
/// insertion order, so the same table always yields the same trie.
///
/// A table with fewer than two symbols still yields an internal root: the
/// lone symbol (or byte 0 for an empty table) gets a sibling leaf for
/// `symbol ^ 1` that never occurs in the data.
pub fn build_huffman_tree(freq_table: &BTreeMap<u8, u64>) -> HuffmanNode {
    if freq_table.len() < 2 {
        let symbol = freq_table.keys().next().copied().unwrap_or(0);
        trace!("padding Huffman trie for symbol {} with a sibling", symbol);
        return HuffmanNode::Internal {
            left: Box::new(HuffmanNode::Leaf(symbol)),
            right: Box::new(HuffmanNode::Leaf(symbol ^ 1)),
        };
    }

    let mut heap = BinaryHeap::new();
    let mut seq = 0;
    for (&symbol, &freq) in freq_table {
        heap.push(HeapEntry {
            freq,
            seq,
            node: Box::new(HuffmanNode::Leaf(symbol)),
        });
        seq += 1;
    }
    while heap.len() > 1 {
        let (Some(left), Some(right)) = (heap.pop(), heap.pop()) else {
            unreachable!("heap holds at least two nodes");
        };
        heap.push(HeapEntry {
            freq: left.freq + right.freq,
            seq,
            node: Box::new(HuffmanNode::Internal {
                left: left.node,
                right: right.node,
            }),
        });
        seq += 1;
    }
    match heap.pop() {
        Some(root) => *root.node,
        None => unreachable!("at least two symbols were pushed"),
    }
}

/// Recursively build the code table mapping bytes to their Huffman codes,
/// written as strings of `'0'` and `'1'`.
pub fn build_code_table(node: &HuffmanNode) -> HashMap<u8, String> {
    let mut table = HashMap::new();
    build_code_table_helper(node, String::new(), &mut table);
    table
}

fn build_code_table_helper(node: &HuffmanNode, prefix: String, table: &mut HashMap<u8, String>) {
    match node {
        HuffmanNode::Leaf(symbol) => {
            table.insert(*symbol, prefix);
        }
        HuffmanNode::Internal { left, right } => {
            let mut left_prefix = prefix.clone();
            left_prefix.push('0');
            build_code_table_helper(left, left_prefix, table);
            let mut right_prefix = prefix;
            right_prefix.push('1');
            build_code_table_helper(right, right_prefix, table);
        }
    }
}

/// Serialize `node` in preorder.
pub fn write_trie<W: Write>(node: &HuffmanNode, writer: &mut BitWriter<W>) -> Result<()> {
    match node {
        HuffmanNode::Leaf(symbol) => {
            writer.write_bit(true)?;
            writer.write_bits(u64::from(*symbol), SYMBOL_BITS)?;
        }
        HuffmanNode::Internal { left, right } => {
            writer.write_bit(false)?;
            write_trie(left, writer)?;
            write_trie(right, writer)?;
        }
    }
    Ok(())
}

/// Deserialize a trie written by [`write_trie`].
///
/// # Errors
///
/// `MalformedStream` if the input ends early, the root is a leaf, or the trie
/// is deeper or wider than a byte alphabet allows.
pub fn read_trie<R: Read>(reader: &mut BitReader<R>) -> Result<HuffmanNode> {
    let mut leaves = 0;
    let root = read_trie_at(reader, 0, &mut leaves)?;
    if root.is_leaf() {
        return Err(Error::MalformedStream(
            "Huffman trie root must be an internal node".to_string(),
        ));
    }
    Ok(root)
}

fn read_trie_at<R: Read>(
    reader: &mut BitReader<R>,
    depth: usize,
    leaves: &mut usize,
) -> Result<HuffmanNode> {
    if depth > MAX_DEPTH {
        return Err(Error::MalformedStream(format!(
            "Huffman trie deeper than {} levels",
            MAX_DEPTH
        )));
    }
    let is_leaf = reader.read_bits_exact(1, "Huffman trie node")? == 1;
    if is_leaf {
        *leaves += 1;
        if *leaves > MAX_LEAVES {
            return Err(Error::MalformedStream(format!(
                "Huffman trie has more than {} leaves",
                MAX_LEAVES
            )));
        }
        let symbol = reader.read_bits_exact(SYMBOL_BITS, "Huffman leaf symbol")?;
        return Ok(HuffmanNode::Leaf(symbol as u8));
    }
    let left = read_trie_at(reader, depth + 1, leaves)?;
    let right = read_trie_at(reader, depth + 1, leaves)?;
    Ok(HuffmanNode::Internal {
        left: Box::new(left),
        right: Box::new(right),
    })
}

/// Write the code of every byte of `input`.
///
/// # Panics
///
/// If a code contains anything but `'0'` and `'1'`, or a byte has no code;
/// both mean the table was not built from this input.
pub fn encode<W: Write>(
    input: &[u8],
    code_table: &HashMap<u8, String>,
    writer: &mut BitWriter<W>,
) -> Result<()> {
    for byte in input {
        let code = &code_table[byte];
        for digit in code.chars() {
            match digit {
                '0' => writer.write_bit(false)?,
                '1' => writer.write_bit(true)?,
                other => panic!("illegal digit {:?} in Huffman code {:?}", other, code),
            }
        }
    }
    Ok(())
}

/// Decode `count` symbols by walking `tree` from the root for each one.
pub fn decode<R: Read>(
    reader: &mut BitReader<R>,
    tree: &HuffmanNode,
    count: u64,
) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    for _ in 0..count {
        let mut current = tree;
        while let HuffmanNode::Internal { left, right } = current {
            current = if reader.read_bits_exact(1, "Huffman code")? == 1 {
                right
            } else {
                left
            };
        }
        if let HuffmanNode::Leaf(symbol) = current {
            output.push(*symbol);
        }
    }
    Ok(output)
}

/// Huffman codec with an in-band trie.
///
/// # Example
///
/// ```
/// use bitcodec::cs::compression::huffman::Huffman;
/// use bitcodec::cs::compression::Compression;
///
/// let huffman = Huffman::new();
/// let compressed = huffman.compress(b"ABRACADABRA!").unwrap();
/// assert_eq!(huffman.expand(&compressed).unwrap(), b"ABRACADABRA!");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Huffman;

impl Huffman {
    pub fn new() -> Self {
        Self
    }
}

impl Compression for Huffman {
    fn compress_into(&self, data: &[u8], sink: &mut dyn Write) -> Result<()> {
        let max_length = u32::MAX as usize;
        if data.len() > max_length {
            return Err(Error::InputTooLarge {
                length: data.len(),
                max_length,
            });
        }
        let freq_table = build_frequency_table(data);
        let tree = build_huffman_tree(&freq_table);
        let code_table = build_code_table(&tree);

        let mut writer = BitWriter::new(sink);
        write_trie(&tree, &mut writer)?;
        writer.write_bits(data.len() as u64, COUNT_BITS)?;
        encode(data, &code_table, &mut writer)?;
        writer.finish()?;
        debug!(
            "Huffman compressed {} bytes using {} distinct symbols",
            data.len(),
            freq_table.len()
        );
        Ok(())
    }

    fn expand_into(&self, source: &mut dyn Read, sink: &mut dyn Write) -> Result<()> {
        let mut reader = BitReader::new(source);
        let tree = read_trie(&mut reader)?;
        let count = reader.read_bits_exact(COUNT_BITS, "Huffman symbol count")?;
        let output = decode(&mut reader, &tree, count)?;
        sink.write_all(&output)?;
        debug!("Huffman expanded {} bytes", output.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(input: &[u8]) -> Vec<u8> {
        let huffman = Huffman::new();
        let compressed = huffman.compress(input).unwrap();
        huffman.expand(&compressed).unwrap()
    }

    #[test]
    fn test_frequency_table() {
        let freq = build_frequency_table(b"aabccc");
        assert_eq!(freq.get(&b'a'), Some(&2));
        assert_eq!(freq.get(&b'b'), Some(&1));
        assert_eq!(freq.get(&b'c'), Some(&3));
        assert_eq!(freq.len(), 3);
    }

    #[test]
    fn test_huffman_tree_and_code_table() {
        let input = b"this is an example for huffman encoding";
        let freq = build_frequency_table(input);
        let tree = build_huffman_tree(&freq);
        let code_table = build_code_table(&tree);
        for byte in input {
            assert!(code_table.contains_key(byte), "Missing code for {}", byte);
        }

        let mut leaves = tree.leaves();
        assert_eq!(leaves.len(), freq.len());
        leaves.sort_unstable();
        let total: u64 = leaves.iter().map(|symbol| freq[symbol]).sum();
        assert_eq!(total, input.len() as u64);
    }

    #[test]
    fn test_codes_are_prefix_free() {
        let freq = build_frequency_table(b"abracadabra alakazam");
        let table = build_code_table(&build_huffman_tree(&freq));
        for (a, code_a) in &table {
            for (b, code_b) in &table {
                if a != b {
                    assert!(!code_b.starts_with(code_a.as_str()));
                }
            }
        }
    }

    #[test]
    fn test_rarer_symbols_get_longer_codes() {
        let freq = build_frequency_table(b"aaaaaaaabbbbccd");
        let table = build_code_table(&build_huffman_tree(&freq));
        assert!(table[&b'a'].len() <= table[&b'b'].len());
        assert!(table[&b'b'].len() <= table[&b'c'].len());
        assert!(table[&b'c'].len() <= table[&b'd'].len());
    }

    #[test]
    fn test_tree_is_deterministic() {
        let freq = build_frequency_table(b"equal weights everywhere, equal weights");
        assert_eq!(build_huffman_tree(&freq), build_huffman_tree(&freq));
    }

    #[test]
    fn test_trie_serialization() {
        let freq = build_frequency_table(b"it was the best of times");
        let tree = build_huffman_tree(&freq);
        let mut writer = BitWriter::new(Vec::new());
        write_trie(&tree, &mut writer).unwrap();
        let bytes = writer.finish().unwrap();
        let mut reader = BitReader::new(&bytes[..]);
        assert_eq!(read_trie(&mut reader).unwrap(), tree);
    }

    #[test]
    fn test_two_symbol_format() {
        // the rarer 'b' is popped first and lands on the left:
        // trie 0, 1 'b', 1 'a' (19 bits); count 3; codes a=1 a=1 b=0
        let compressed = Huffman::new().compress(b"aab").unwrap();
        let mut reader = BitReader::new(&compressed[..]);
        assert_eq!(reader.read_bits(1).unwrap(), 0);
        assert_eq!(reader.read_bits(9).unwrap(), 0x100 | u64::from(b'b'));
        assert_eq!(reader.read_bits(9).unwrap(), 0x100 | u64::from(b'a'));
        assert_eq!(reader.read_bits(32).unwrap(), 3);
        assert_eq!(reader.read_bits(3).unwrap(), 0b110);
        assert_eq!(compressed.len(), 7);
    }

    #[test]
    fn test_encode_decode() {
        let input = b"huffman coding in rust is fun!";
        assert_eq!(round_trip(input), input);
    }

    #[test]
    fn test_single_character() {
        let input = b"aaaaaaa";
        let tree = build_huffman_tree(&build_frequency_table(input));
        assert_eq!(
            tree,
            HuffmanNode::Internal {
                left: Box::new(HuffmanNode::Leaf(b'a')),
                right: Box::new(HuffmanNode::Leaf(b'a' ^ 1)),
            }
        );
        assert!(!tree.is_leaf());
        assert_eq!(build_code_table(&tree)[&b'a'], "0");
        assert_eq!(round_trip(input), input);
    }

    #[test]
    fn test_empty_input() {
        let compressed = Huffman::new().compress(b"").unwrap();
        assert_eq!(round_trip(b""), b"");
        // 19 trie bits + 32 count bits
        assert_eq!(compressed.len(), 7);
    }

    #[test]
    fn test_all_byte_values() {
        let input: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
        assert_eq!(round_trip(&input), input);
    }

    #[test]
    fn test_truncated_stream_is_malformed() {
        let huffman = Huffman::new();
        let compressed = huffman.compress(b"a moderately long sentence to truncate").unwrap();
        for cut in [0, 1, 5, compressed.len() - 3] {
            assert!(matches!(
                huffman.expand(&compressed[..cut]),
                Err(Error::MalformedStream(_))
            ));
        }
    }

    #[test]
    fn test_degenerate_trie_is_rejected() {
        // an endless run of internal-node markers
        let zeros = vec![0u8; 64];
        assert!(matches!(
            Huffman::new().expand(&zeros),
            Err(Error::MalformedStream(_))
        ));
    }

    #[test]
    fn test_leaf_root_is_rejected() {
        // a lone leaf for 'a' followed by a huge symbol count
        let mut writer = BitWriter::new(Vec::new());
        writer.write_bit(true).unwrap();
        writer.write_bits(u64::from(b'a'), SYMBOL_BITS).unwrap();
        writer.write_bits(u64::from(u32::MAX), COUNT_BITS).unwrap();
        let bytes = writer.finish().unwrap();
        assert!(matches!(
            Huffman::new().expand(&bytes),
            Err(Error::MalformedStream(_))
        ));
    }

    #[test]
    #[should_panic(expected = "illegal digit")]
    fn test_non_binary_code_panics() {
        let mut table = HashMap::new();
        table.insert(b'x', "01x".to_string());
        let mut writer = BitWriter::new(Vec::new());
        let _ = encode(b"x", &table, &mut writer);
    }
}
