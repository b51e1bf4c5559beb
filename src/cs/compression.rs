//! Compression algorithms implementation.
//!
//! This module provides lossless codecs over arbitrary binary data, built on
//! a shared bit-granular stream layer:
//! - Bit-level readers and writers ([`bitio`])
//! - Ternary search tries keyed by byte strings ([`tst`])
//! - LZW with fixed-width codewords ([`lzw`])
//! - Huffman coding with an in-band trie ([`huffman`])
//! - Run-length coding of bits ([`run_length`])
//!
//! Every codec reads its whole input before choosing any code and works on a
//! single thread; the state built for a call is dropped when it returns.
//!
//! # Examples
//!
//! ```rust
//! use bitcodec::cs::compression::{Compression, Huffman, Lzw, RunLength};
//!
//! let data = b"it was the best of times it was the worst of times";
//! let codecs: [&dyn Compression; 3] = [&RunLength::new(), &Lzw::new(), &Huffman::new()];
//! for codec in codecs {
//!     let compressed = codec.compress(data).unwrap();
//!     assert_eq!(codec.expand(&compressed).unwrap(), data);
//! }
//! ```

use crate::cs::error::Error;
use std::io::{Read, Write};

/// Result type for compression operations
pub type Result<T> = std::result::Result<T, Error>;

/// Trait for compression algorithms
pub trait Compression {
    /// Compress `data`, writing the encoded stream to `sink`
    fn compress_into(&self, data: &[u8], sink: &mut dyn Write) -> Result<()>;

    /// Expand the encoded stream read from `source`, writing the original bytes to `sink`
    fn expand_into(&self, source: &mut dyn Read, sink: &mut dyn Write) -> Result<()>;

    /// Compress the input data
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.compress_into(data, &mut out)?;
        Ok(out)
    }

    /// Expand the compressed data
    fn expand(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut source = data;
        let mut out = Vec::new();
        self.expand_into(&mut source, &mut out)?;
        Ok(out)
    }
}

/// Compress independent inputs in parallel, one call per input.
#[cfg(feature = "parallel")]
pub fn compress_all<C, T>(codec: &C, inputs: &[T]) -> Result<Vec<Vec<u8>>>
where
    C: Compression + Sync + ?Sized,
    T: AsRef<[u8]> + Sync,
{
    use rayon::prelude::*;

    inputs
        .par_iter()
        .map(|input| codec.compress(input.as_ref()))
        .collect()
}

/// Expand independent streams in parallel, one call per stream.
#[cfg(feature = "parallel")]
pub fn expand_all<C, T>(codec: &C, inputs: &[T]) -> Result<Vec<Vec<u8>>>
where
    C: Compression + Sync + ?Sized,
    T: AsRef<[u8]> + Sync,
{
    use rayon::prelude::*;

    inputs
        .par_iter()
        .map(|input| codec.expand(input.as_ref()))
        .collect()
}

pub mod bitio;
pub mod huffman;
pub mod lzw;
pub mod run_length;
pub mod tst;

pub use bitio::{BitReader, BitWriter};
pub use huffman::{
    build_code_table, build_frequency_table, build_huffman_tree, read_trie, write_trie, Huffman,
    HuffmanNode,
};
pub use lzw::Lzw;
pub use run_length::RunLength;
pub use tst::Tst;

#[cfg(test)]
mod tests;
