//! MSB-first bit stream operations for the QIC-122 codec.
//!
//! QIC-122 packs its tokens MSB-first (Most Significant Bit first): the
//! first bit read from byte `b` is its bit 7, and a multi-bit field lands in
//! the result with its first-read bit in the highest position. Bit `k` of
//! byte `b` is stream bit `b*8 + (7-k)`.
//!
//! Exhaustion is a recoverable failure ([`TruncatedBitstream`]); the
//! decompressor turns it into a malformed-stream error for the region pass.
//!
//! [`TruncatedBitstream`]: crate::error::OxiTapeError::TruncatedBitstream

use crate::error::{OxiTapeError, Result};

/// MSB-first bit reader over a byte slice.
#[derive(Debug)]
pub struct BitReader<'a> {
    /// Input data.
    data: &'a [u8],
    /// Current position in bits from the start of `data`.
    bit_pos: usize,
}

impl<'a> BitReader<'a> {
    /// Create a new bit reader at bit position zero.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, bit_pos: 0 }
    }

    /// Current bit position (bits consumed so far).
    pub fn bit_position(&self) -> usize {
        self.bit_pos
    }

    /// Number of bits left in the stream.
    pub fn remaining_bits(&self) -> usize {
        self.data.len() * 8 - self.bit_pos
    }

    /// Read a single bit.
    pub fn read_bit(&mut self) -> Result<bool> {
        if self.bit_pos >= self.data.len() * 8 {
            return Err(OxiTapeError::truncated_bitstream(self.bit_pos));
        }

        let byte_index = self.bit_pos / 8;
        let bit_index = self.bit_pos % 8;
        self.bit_pos += 1;

        Ok((self.data[byte_index] >> (7 - bit_index)) & 0x01 != 0)
    }

    /// Read up to 32 bits, MSB-first.
    ///
    /// The first bit read becomes the highest bit of the `count`-wide field.
    pub fn read_bits(&mut self, count: u8) -> Result<u32> {
        debug_assert!(
            count >= 1 && count <= 32,
            "bit count must be in 1..=32, got {}",
            count
        );

        let mut value = 0u32;
        for _ in 0..count {
            value = (value << 1) | self.read_bit()? as u32;
        }

        Ok(value)
    }
}

/// MSB-first bit writer accumulating into a `Vec<u8>`.
///
/// The restorer never writes archives; the writer exists so the codec tests
/// can synthesize token streams bit for bit.
#[derive(Debug, Default)]
pub struct BitWriter {
    /// Output buffer.
    output: Vec<u8>,
    /// Partial byte being assembled, bits packed from the MSB down.
    buffer: u8,
    /// Number of bits currently in `buffer`.
    bits_in_buffer: u8,
}

impl BitWriter {
    /// Create a new empty bit writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a single bit.
    pub fn write_bit(&mut self, bit: bool) {
        self.buffer = (self.buffer << 1) | bit as u8;
        self.bits_in_buffer += 1;
        if self.bits_in_buffer == 8 {
            self.output.push(self.buffer);
            self.buffer = 0;
            self.bits_in_buffer = 0;
        }
    }

    /// Write the low `count` bits of `value`, MSB-first.
    pub fn write_bits(&mut self, value: u32, count: u8) {
        debug_assert!(
            count >= 1 && count <= 32,
            "bit count must be in 1..=32, got {}",
            count
        );

        for i in (0..count).rev() {
            self.write_bit((value >> i) & 1 != 0);
        }
    }

    /// Pad the final partial byte with zero bits and return the output.
    pub fn into_vec(mut self) -> Vec<u8> {
        if self.bits_in_buffer > 0 {
            self.buffer <<= 8 - self.bits_in_buffer;
            self.output.push(self.buffer);
        }
        self.output
    }
}
