//! Bit-level reader and writer for the entropy-coded stream.
//!
//! The stream is a plain byte buffer interpreted MSB-first within each
//! byte. The final byte is zero-padded; decoding never relies on that
//! padding because every token stream is terminated by an explicit EOF
//! symbol.

use bitvec::prelude::*;

/// Appends variable-length codes to a growing MSB-first bitstream.
#[derive(Debug, Default)]
pub struct BitWriter {
    bits: BitVec<u8, Msb0>,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the low `len` bits of `code`, most significant bit first.
    pub fn write_code(&mut self, code: u32, len: u8) {
        debug_assert!(len <= 32);
        for i in (0..len).rev() {
            self.bits.push((code >> i) & 1 == 1);
        }
    }

    /// Number of bits written so far.
    pub fn bit_len(&self) -> usize {
        self.bits.len()
    }

    /// Finishes the stream, zero-padding the last partial byte.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bits.into_vec()
    }
}

/// Reads single bits from an MSB-first byte buffer.
#[derive(Debug)]
pub struct BitReader<'a> {
    bits: &'a BitSlice<u8, Msb0>,
    pos: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        BitReader {
            bits: bytes.view_bits::<Msb0>(),
            pos: 0,
        }
    }

    /// Reads the next bit, or `None` when the buffer is exhausted.
    pub fn read_bit(&mut self) -> Option<bool> {
        let bit = self.bits.get(self.pos)?;
        self.pos += 1;
        Some(*bit)
    }

    /// Bits remaining in the buffer.
    pub fn remaining(&self) -> usize {
        self.bits.len() - self.pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_read() {
        let mut w = BitWriter::new();
        w.write_code(0b101, 3);
        w.write_code(0b0110, 4);
        let bytes = w.into_bytes();
        assert_eq!(bytes.len(), 1);

        let mut r = BitReader::new(&bytes);
        let read: Vec<bool> = (0..7).map(|_| r.read_bit().unwrap()).collect();
        assert_eq!(
            read,
            vec![true, false, true, false, true, true, false]
        );
        // Padding bit of the final byte.
        assert_eq!(r.remaining(), 1);
    }

    #[test]
    fn test_msb_first_byte_layout() {
        let mut w = BitWriter::new();
        w.write_code(0xA5, 8);
        assert_eq!(w.into_bytes(), vec![0xA5]);
    }

    #[test]
    fn test_exhausted_reader() {
        let mut r = BitReader::new(&[]);
        assert!(r.read_bit().is_none());
    }

    #[test]
    fn test_long_code_spans_bytes() {
        let mut w = BitWriter::new();
        w.write_code(0x1FFFF, 17);
        let bytes = w.into_bytes();
        assert_eq!(bytes, vec![0xFF, 0xFF, 0x80]);
    }
}
