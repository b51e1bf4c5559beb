//! Run-length coding of bits.
//!
//! The input is treated as a bit string, MSB-first within each byte, and
//! replaced by the lengths of its alternating runs. The first count is for
//! a run of `0` bits (possibly empty). A run longer than the largest
//! encodable count is split by writing the maximum count, then an empty run
//! of the other bit, and carrying on counting.

use crate::cs::compression::bitio::{BitReader, BitWriter};
use crate::cs::compression::{Compression, Result};
use crate::cs::error::Error;
use bitvec::prelude::*;
use log::debug;
use std::io::{Read, Write};

/// Count width used by [`RunLength::new`].
pub const DEFAULT_COUNT_WIDTH: u32 = 8;
pub const MAX_COUNT_WIDTH: u32 = 16;

/// Run-length codec parameterised by the width of each count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunLength {
    count_width: u32,
}

impl Default for RunLength {
    fn default() -> Self {
        Self {
            count_width: DEFAULT_COUNT_WIDTH,
        }
    }
}

impl RunLength {
    /// Creates a codec with 8-bit counts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a codec with `count_width`-bit counts.
    ///
    /// # Errors
    ///
    /// `InvalidInput` unless `1 <= count_width <= 16`.
    pub fn with_count_width(count_width: u32) -> Result<Self> {
        if count_width == 0 || count_width > MAX_COUNT_WIDTH {
            return Err(Error::InvalidInput(format!(
                "run-length count width must be between 1 and {} bits, got {}",
                MAX_COUNT_WIDTH, count_width
            )));
        }
        Ok(Self { count_width })
    }

    /// Longest run a single count can describe.
    pub fn max_run(&self) -> u64 {
        (1 << self.count_width) - 1
    }
}

/// Lengths of the alternating runs in `data`, starting with a run of zeros.
pub fn run_lengths(data: &[u8], max_run: u64) -> Vec<u64> {
    let mut counts = Vec::new();
    let mut current = false;
    let mut run = 0u64;
    for bit in data.view_bits::<Msb0>().iter().by_vals() {
        if bit != current {
            counts.push(run);
            run = 0;
            current = bit;
        } else if run == max_run {
            counts.push(run);
            counts.push(0);
            run = 0;
        }
        run += 1;
    }
    counts.push(run);
    counts
}

impl Compression for RunLength {
    fn compress_into(&self, data: &[u8], sink: &mut dyn Write) -> Result<()> {
        let counts = run_lengths(data, self.max_run());
        let mut writer = BitWriter::new(sink);
        for &count in &counts {
            writer.write_bits(count, self.count_width)?;
        }
        writer.finish()?;
        debug!(
            "run-length compressed {} bytes into {} runs",
            data.len(),
            counts.len()
        );
        Ok(())
    }

    fn expand_into(&self, source: &mut dyn Read, sink: &mut dyn Write) -> Result<()> {
        let mut reader = BitReader::new(source);
        let mut writer = BitWriter::new(sink);
        let mut bit = false;
        let mut total = 0u64;
        loop {
            let count = reader.read_bits(self.count_width)?;
            if reader.is_eof() {
                // bits past the end read as zero, so only padding leaves count at 0
                if count != 0 {
                    return Err(Error::MalformedStream(
                        "trailing partial run-length count has non-zero bits".to_string(),
                    ));
                }
                break;
            }
            for _ in 0..count {
                writer.write_bit(bit)?;
            }
            total += count;
            bit = !bit;
        }
        if total % 8 != 0 {
            return Err(Error::MalformedStream(format!(
                "run lengths add up to {} bits, not a whole number of bytes",
                total
            )));
        }
        writer.finish()?;
        debug!("run-length expanded {} bytes", total / 8);
        Ok(())
    }
}
