//! LZW compression with fixed-width codewords.
//!
//! The encoder keeps its dictionary in a [`Tst`] so that the longest known
//! phrase at the front of the remaining input is found in a single descent.
//! The decoder rebuilds the same dictionary as an indexable list, one entry
//! per codeword, so that code `i` always means what the encoder meant by it.
//!
//! Stream layout: a sequence of `code_width`-bit codewords followed by the
//! end-of-file codeword [`EOF_CODE`], zero padded to a whole byte.

use crate::cs::compression::bitio::{BitReader, BitWriter};
use crate::cs::compression::tst::Tst;
use crate::cs::compression::{Compression, Result};
use crate::cs::error::Error;
use log::{debug, trace};
use std::io::{Read, Write};

/// Number of single-byte phrases every dictionary starts with.
pub const ALPHABET_SIZE: u32 = 256;
/// Codeword reserved for end of input.
pub const EOF_CODE: u32 = ALPHABET_SIZE;
/// Codeword width used by [`Lzw::new`].
pub const DEFAULT_CODE_WIDTH: u32 = 12;
/// Narrowest width able to represent [`EOF_CODE`].
pub const MIN_CODE_WIDTH: u32 = 9;
pub const MAX_CODE_WIDTH: u32 = 16;

/// LZW codec parameterised by its codeword width.
///
/// # Example
///
/// ```
/// use bitcodec::cs::compression::lzw::Lzw;
/// use bitcodec::cs::compression::Compression;
///
/// let lzw = Lzw::new();
/// let compressed = lzw.compress(b"TOBEORNOTTOBEORTOBEORNOT").unwrap();
/// assert_eq!(lzw.expand(&compressed).unwrap(), b"TOBEORNOTTOBEORTOBEORNOT");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lzw {
    code_width: u32,
}

impl Default for Lzw {
    fn default() -> Self {
        Self {
            code_width: DEFAULT_CODE_WIDTH,
        }
    }
}

impl Lzw {
    /// Creates a codec with 12-bit codewords (4096 dictionary entries).
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a codec with `code_width`-bit codewords.
    ///
    /// # Errors
    ///
    /// `InvalidInput` unless `code_width` is within
    /// [`MIN_CODE_WIDTH`]`..=`[`MAX_CODE_WIDTH`].
    pub fn with_code_width(code_width: u32) -> Result<Self> {
        if !(MIN_CODE_WIDTH..=MAX_CODE_WIDTH).contains(&code_width) {
            return Err(Error::InvalidInput(format!(
                "LZW code width must be between {} and {} bits, got {}",
                MIN_CODE_WIDTH, MAX_CODE_WIDTH, code_width
            )));
        }
        Ok(Self { code_width })
    }

    pub fn code_width(&self) -> u32 {
        self.code_width
    }

    /// Maximum number of dictionary entries, EOF included.
    pub fn capacity(&self) -> u32 {
        1 << self.code_width
    }
}

/// Encodes `input` as a list of codewords, ending with [`EOF_CODE`].
///
/// Each step emits the code of the longest dictionary phrase that prefixes
/// the remaining input and, while the dictionary has room, registers that
/// phrase extended by the following byte under the next free code.
pub fn compress_codes(input: &[u8], capacity: u32) -> Vec<u32> {
    let mut st = Tst::new();
    for byte in 0..=u8::MAX {
        st.put(&[byte], u32::from(byte)).expect("single-byte keys are non-empty");
    }
    let mut next_code = EOF_CODE + 1;

    let mut codes = Vec::new();
    let mut rest = input;
    while !rest.is_empty() {
        let (len, &code) = match st.longest_prefix_entry(rest) {
            Some(entry) => entry,
            None => unreachable!("every byte is seeded in the dictionary"),
        };
        codes.push(code);
        if len < rest.len() && next_code < capacity {
            st.put(&rest[..=len], next_code).expect("extended phrase is non-empty");
            next_code += 1;
            if next_code == capacity {
                trace!(
                    "LZW dictionary full after {} of {} input bytes",
                    input.len() - rest.len() + len,
                    input.len()
                );
            }
        }
        rest = &rest[len..];
    }
    codes.push(EOF_CODE);
    codes
}

/// Decodes a codeword sequence produced by [`compress_codes`].
///
/// # Errors
///
/// `MalformedStream` if a codeword refers past the dictionary, or if the
/// sequence ends without [`EOF_CODE`].
pub fn expand_codes<I>(codes: I, capacity: u32) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = Result<u32>>,
{
    let mut output = Vec::new();
    let mut codes = codes.into_iter();
    let mut next = || -> Result<u32> {
        codes.next().unwrap_or_else(|| {
            Err(Error::MalformedStream(
                "LZW stream ended without an end-of-file codeword".to_string(),
            ))
        })
    };

    let mut dict: Vec<Vec<u8>> = (0..ALPHABET_SIZE).map(|i| vec![i as u8]).collect();
    // placeholder so that indices line up with the encoder's codes
    dict.push(Vec::new());

    let first = next()?;
    if first == EOF_CODE {
        return Ok(output);
    }
    if first > EOF_CODE {
        return Err(Error::MalformedStream(format!(
            "first LZW codeword {} is not a single byte",
            first
        )));
    }
    let mut previous = dict[first as usize].clone();

    loop {
        output.extend_from_slice(&previous);
        let code = next()?;
        if code == EOF_CODE {
            break;
        }
        let idx = code as usize;
        let current = if idx < dict.len() {
            dict[idx].clone()
        } else if idx == dict.len() {
            // the encoder used the entry it created on the previous step
            let mut phrase = previous.clone();
            phrase.push(previous[0]);
            phrase
        } else {
            return Err(Error::MalformedStream(format!(
                "LZW codeword {} exceeds dictionary size {}",
                code,
                dict.len()
            )));
        };
        if (dict.len() as u32) < capacity {
            let mut entry = previous;
            entry.push(current[0]);
            dict.push(entry);
        }
        previous = current;
    }
    debug!("LZW expanded dictionary to {} entries", dict.len());
    Ok(output)
}

impl Compression for Lzw {
    fn compress_into(&self, data: &[u8], sink: &mut dyn Write) -> Result<()> {
        let codes = compress_codes(data, self.capacity());
        let mut writer = BitWriter::new(sink);
        for &code in &codes {
            writer.write_bits(u64::from(code), self.code_width)?;
        }
        writer.finish()?;
        debug!(
            "LZW compressed {} bytes into {} codewords of {} bits",
            data.len(),
            codes.len(),
            self.code_width
        );
        Ok(())
    }

    fn expand_into(&self, source: &mut dyn Read, sink: &mut dyn Write) -> Result<()> {
        let mut reader = BitReader::new(source);
        let width = self.code_width;
        let codes = std::iter::from_fn(|| {
            Some(
                reader
                    .read_bits_exact(width, "LZW codeword")
                    .map(|code| code as u32),
            )
        });
        let output = expand_codes(codes, self.capacity())?;
        sink.write_all(&output)?;
        debug!("LZW expanded {} bytes", output.len());
        Ok(())
    }
}
