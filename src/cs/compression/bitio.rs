//! Bit-granular readers and writers over byte streams.
//!
//! Both sides are MSB-first: the first bit written to a byte lands in its
//! most significant position, and the first bit read from a byte is its most
//! significant one. Multi-bit values are likewise written and read most
//! significant bit first.
//!
//! # Examples
//!
//! ```
//! use bitcodec::cs::compression::bitio::{BitReader, BitWriter};
//!
//! let mut writer = BitWriter::new(Vec::new());
//! writer.write_bits(0b101, 3).unwrap();
//! writer.write_bit(true).unwrap();
//! let bytes = writer.finish().unwrap();
//! assert_eq!(bytes, vec![0b1011_0000]);
//!
//! let mut reader = BitReader::new(&bytes[..]);
//! assert_eq!(reader.read_bits(4).unwrap(), 0b1011);
//! assert!(!reader.is_eof());
//! ```

use crate::cs::compression::Result;
use crate::cs::error::Error;
use std::io::{self, ErrorKind, Read, Write};

/// Largest value accepted for `n` by `write_bits` and `read_bits`.
pub const MAX_BITS: u32 = 64;

/// Writes individual bits to a byte sink.
///
/// Bits accumulate in a single byte which is emitted as soon as it is full.
/// A partially filled byte is emitted, zero padded, by [`BitWriter::flush`].
/// Flushing with nothing pending writes nothing, so flushing repeatedly is
/// safe. Dropping the writer performs one last best-effort flush; call
/// [`BitWriter::finish`] to observe errors from it.
pub struct BitWriter<W: Write> {
    accumulator: u8,
    count: u8,
    sink: Option<W>,
}

impl<W: Write> BitWriter<W> {
    /// Creates a writer that emits bytes into `sink`.
    pub fn new(sink: W) -> Self {
        Self {
            accumulator: 0,
            count: 0,
            sink: Some(sink),
        }
    }

    /// Number of bits waiting in the accumulator (0..8).
    pub fn pending_bits(&self) -> u8 {
        self.count
    }

    /// Appends one bit.
    pub fn write_bit(&mut self, bit: bool) -> io::Result<()> {
        if bit {
            self.accumulator |= 1 << (7 - self.count);
        }
        self.count += 1;
        if self.count == 8 {
            self.emit()?;
        }
        Ok(())
    }

    /// Appends the low-order `n` bits of `value`, most significant first.
    ///
    /// # Panics
    ///
    /// If `n` exceeds [`MAX_BITS`].
    pub fn write_bits(&mut self, value: u64, n: u32) -> io::Result<()> {
        assert!(n <= MAX_BITS, "cannot write {} bits at once", n);
        for shift in (0..n).rev() {
            self.write_bit((value >> shift) & 1 == 1)?;
        }
        Ok(())
    }

    /// Emits the pending partial byte, if any, padding its low bits with zeros.
    pub fn flush(&mut self) -> io::Result<()> {
        if self.count > 0 {
            self.emit()?;
        }
        if let Some(sink) = self.sink.as_mut() {
            sink.flush()?;
        }
        Ok(())
    }

    /// Flushes and hands back the underlying sink.
    pub fn finish(mut self) -> io::Result<W> {
        self.flush()?;
        self.sink
            .take()
            .ok_or_else(|| io::Error::new(ErrorKind::Other, "bit writer already finished"))
    }

    fn emit(&mut self) -> io::Result<()> {
        let byte = self.accumulator;
        self.accumulator = 0;
        self.count = 0;
        match self.sink.as_mut() {
            Some(sink) => sink.write_all(&[byte]),
            None => Ok(()),
        }
    }
}

impl<W: Write> Drop for BitWriter<W> {
    fn drop(&mut self) {
        if self.sink.is_some() {
            let _ = self.flush();
        }
    }
}

/// Reads individual bits from a byte source.
///
/// One byte is pulled from the source whenever the buffered bits run out.
/// When the source has nothing left the end-of-input flag is raised and the
/// bit returned by that read is meaningless, so callers must consult
/// [`BitReader::is_eof`] after every logical element before trusting it, or
/// use [`BitReader::read_bits_exact`] which does so for them.
pub struct BitReader<R: Read> {
    accumulator: u8,
    remaining: u8,
    source: R,
    eof: bool,
}

impl<R: Read> BitReader<R> {
    /// Creates a reader pulling bytes from `source`.
    pub fn new(source: R) -> Self {
        Self {
            accumulator: 0,
            remaining: 0,
            source,
            eof: false,
        }
    }

    /// Whether a refill has found the source exhausted.
    pub fn is_eof(&self) -> bool {
        self.eof
    }

    /// Returns the next bit, or `false` with the end-of-input flag raised
    /// once the source is exhausted.
    pub fn read_bit(&mut self) -> io::Result<bool> {
        if self.remaining == 0 && !self.refill()? {
            self.eof = true;
            return Ok(false);
        }
        self.remaining -= 1;
        Ok((self.accumulator >> self.remaining) & 1 == 1)
    }

    /// Reads `n` bits into an unsigned integer; the first bit read is the
    /// most significant.
    ///
    /// # Panics
    ///
    /// If `n` exceeds [`MAX_BITS`].
    pub fn read_bits(&mut self, n: u32) -> io::Result<u64> {
        assert!(n <= MAX_BITS, "cannot read {} bits at once", n);
        let mut value = 0u64;
        for _ in 0..n {
            value = (value << 1) | u64::from(self.read_bit()?);
        }
        Ok(value)
    }

    /// Like [`BitReader::read_bits`], but running out of input is reported as
    /// a malformed stream naming `what` was being read.
    pub fn read_bits_exact(&mut self, n: u32, what: &str) -> Result<u64> {
        let value = self.read_bits(n)?;
        if self.eof {
            return Err(Error::MalformedStream(format!(
                "unexpected end of stream while reading {}",
                what
            )));
        }
        Ok(value)
    }

    /// Consumes the reader, returning the underlying source.
    pub fn into_inner(self) -> R {
        self.source
    }

    fn refill(&mut self) -> io::Result<bool> {
        let mut byte = [0u8; 1];
        loop {
            match self.source.read(&mut byte) {
                Ok(0) => return Ok(false),
                Ok(_) => {
                    self.accumulator = byte[0];
                    self.remaining = 8;
                    return Ok(true);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}
