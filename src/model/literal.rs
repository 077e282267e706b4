//! Literal-only Huffman model.
//!
//! No dictionary and no matching: each document byte is entropy-coded
//! directly. This is the fallback the optimizer reaches for when the
//! corpus has no exploitable shared structure, where back-reference
//! overhead only hurts.

use crate::bits::{BitReader, BitWriter};
use crate::docs::DocumentSource;
use crate::error::Result;
use crate::huffman::{smoothed, CodeTable};

/// Token-stream terminator.
const EOF: u32 = 256;
/// 256 literals + EOF.
const LIT_ALPHABET: usize = 257;

/// Alphabet sizes in serialization order.
pub(crate) const ALPHABETS: &[usize] = &[LIT_ALPHABET];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralHuffmanModel {
    literals: CodeTable,
}

impl LiteralHuffmanModel {
    pub fn build<D: DocumentSource + ?Sized>(sample: &D) -> Result<Self> {
        let mut counts = vec![0u64; LIT_ALPHABET];
        for i in 0..sample.len() {
            for &b in sample.doc(i) {
                counts[b as usize] += 1;
            }
            counts[EOF as usize] += 1;
        }
        Ok(LiteralHuffmanModel {
            literals: CodeTable::from_frequencies(&smoothed(&counts)),
        })
    }

    pub(crate) fn from_tables(mut tables: Vec<CodeTable>) -> Self {
        debug_assert_eq!(tables.len(), ALPHABETS.len());
        LiteralHuffmanModel {
            literals: tables.pop().unwrap(),
        }
    }

    pub(crate) fn tables(&self) -> Vec<&CodeTable> {
        vec![&self.literals]
    }

    pub fn encode(&self, document: &[u8]) -> Result<Vec<u8>> {
        let mut writer = BitWriter::new();
        for &b in document {
            self.literals.encode_symbol(&mut writer, b as u32)?;
        }
        self.literals.encode_symbol(&mut writer, EOF)?;
        Ok(writer.into_bytes())
    }

    pub fn decode(&self, compressed: &[u8]) -> Result<Vec<u8>> {
        let mut reader = BitReader::new(compressed);
        let mut out = Vec::new();
        loop {
            let symbol = self.literals.decode_symbol(&mut reader)?;
            if symbol == EOF {
                break;
            }
            out.push(symbol as u8);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> LiteralHuffmanModel {
        let docs: Vec<Vec<u8>> = vec![
            b"the quick brown fox".to_vec(),
            b"jumps over the lazy dog".to_vec(),
        ];
        LiteralHuffmanModel::build(&docs).unwrap()
    }

    #[test]
    fn test_roundtrip() {
        let m = model();
        for doc in [&b"the lazy fox"[..], b"", b"\x00\xff\x80unseen bytes"] {
            let packed = m.encode(doc).unwrap();
            assert_eq!(m.decode(&packed).unwrap(), doc);
        }
    }

    #[test]
    fn test_skewed_text_compresses() {
        let m = model();
        let doc = b"the the the the the the the the ";
        let packed = m.encode(doc).unwrap();
        assert!(packed.len() < doc.len());
    }

    #[test]
    fn test_unterminated_stream_is_error() {
        let m = model();
        assert!(m.decode(&[]).is_err());
    }
}
