//! Dictionary model with 8-bit buckets.
//!
//! Coarser sibling of the nibble model: a reference is flagged by one
//! marker symbol in the literal alphabet, then its length and the two
//! offset bytes are coded from dedicated 256-symbol tables. Fewer, larger
//! alphabets trade per-symbol precision for fewer symbols per token;
//! whether that wins is decided empirically by the optimizer.

use crate::bits::{BitReader, BitWriter};
use crate::docs::DocumentSource;
use crate::error::{Error, Result};
use crate::huffman::{smoothed, CodeTable};
use crate::matcher::{pack, replay_reference, TokenSink};

/// Reference marker in the literal alphabet.
const REF_MARK: u32 = 256;
/// Token-stream terminator.
const EOF: u32 = 257;
/// 256 literals + marker + EOF.
const LIT_ALPHABET: usize = 258;
const BYTE_ALPHABET: usize = 256;

/// Alphabet sizes in serialization order.
pub(crate) const ALPHABETS: &[usize] = &[LIT_ALPHABET, BYTE_ALPHABET, BYTE_ALPHABET, BYTE_ALPHABET];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BytePackedModel {
    dictionary: Vec<u8>,
    /// Literals, reference marker, EOF.
    literals: CodeTable,
    /// Match lengths.
    lengths: CodeTable,
    /// Offset low byte.
    offset_low: CodeTable,
    /// Offset high byte.
    offset_high: CodeTable,
}

impl BytePackedModel {
    pub fn build<D: DocumentSource + ?Sized>(dictionary: Vec<u8>, sample: &D) -> Result<Self> {
        let mut hist = Histograms::new();
        for i in 0..sample.len() {
            pack(&dictionary, sample.doc(i), &mut hist)?;
            hist.literals[EOF as usize] += 1;
        }
        Ok(BytePackedModel {
            literals: CodeTable::from_frequencies(&smoothed(&hist.literals)),
            lengths: CodeTable::from_frequencies(&smoothed(&hist.lengths)),
            offset_low: CodeTable::from_frequencies(&smoothed(&hist.offset_low)),
            offset_high: CodeTable::from_frequencies(&smoothed(&hist.offset_high)),
            dictionary,
        })
    }

    /// Reassembles a model from deserialized parts. Table order and
    /// alphabet sizes follow [`ALPHABETS`].
    pub(crate) fn from_tables(dictionary: Vec<u8>, mut tables: Vec<CodeTable>) -> Self {
        debug_assert_eq!(tables.len(), ALPHABETS.len());
        let offset_high = tables.pop().unwrap();
        let offset_low = tables.pop().unwrap();
        let lengths = tables.pop().unwrap();
        let literals = tables.pop().unwrap();
        BytePackedModel {
            dictionary,
            literals,
            lengths,
            offset_low,
            offset_high,
        }
    }

    pub(crate) fn tables(&self) -> Vec<&CodeTable> {
        vec![
            &self.literals,
            &self.lengths,
            &self.offset_low,
            &self.offset_high,
        ]
    }

    pub fn dictionary(&self) -> &[u8] {
        &self.dictionary
    }

    pub fn encode(&self, document: &[u8]) -> Result<Vec<u8>> {
        let mut writer = BitWriter::new();
        let mut sink = EncodeSink {
            model: self,
            writer: &mut writer,
        };
        pack(&self.dictionary, document, &mut sink)?;
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
            if symbol < REF_MARK {
                out.push(symbol as u8);
                continue;
            }
            let length = self.lengths.decode_symbol(&mut reader)?;
            if length == 0 {
                return Err(Error::CorruptModel(
                    "zero-length reference in stream".to_string(),
                ));
            }
            let low = self.offset_low.decode_symbol(&mut reader)?;
            let high = self.offset_high.decode_symbol(&mut reader)?;
            replay_reference(&self.dictionary, &mut out, low | (high << 8), length)?;
        }
        Ok(out)
    }
}

struct Histograms {
    literals: Vec<u64>,
    lengths: Vec<u64>,
    offset_low: Vec<u64>,
    offset_high: Vec<u64>,
}

impl Histograms {
    fn new() -> Self {
        Histograms {
            literals: vec![0; LIT_ALPHABET],
            lengths: vec![0; BYTE_ALPHABET],
            offset_low: vec![0; BYTE_ALPHABET],
            offset_high: vec![0; BYTE_ALPHABET],
        }
    }
}

impl TokenSink for Histograms {
    fn literal(&mut self, byte: u8) -> Result<()> {
        self.literals[byte as usize] += 1;
        Ok(())
    }

    fn reference(&mut self, offset: u32, length: u32) -> Result<()> {
        self.literals[REF_MARK as usize] += 1;
        self.lengths[length as usize] += 1;
        self.offset_low[(offset & 0xff) as usize] += 1;
        self.offset_high[(offset >> 8) as usize] += 1;
        Ok(())
    }
}

struct EncodeSink<'a, 'w> {
    model: &'a BytePackedModel,
    writer: &'w mut BitWriter,
}

impl TokenSink for EncodeSink<'_, '_> {
    fn literal(&mut self, byte: u8) -> Result<()> {
        self.model.literals.encode_symbol(self.writer, byte as u32)
    }

    fn reference(&mut self, offset: u32, length: u32) -> Result<()> {
        self.model.literals.encode_symbol(self.writer, REF_MARK)?;
        self.model.lengths.encode_symbol(self.writer, length)?;
        self.model
            .offset_low
            .encode_symbol(self.writer, offset & 0xff)?;
        self.model
            .offset_high
            .encode_symbol(self.writer, offset >> 8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dict::build_dictionary;

    fn sample() -> Vec<Vec<u8>> {
        vec![
            b"GET /api/users/1 HTTP/1.1".to_vec(),
            b"GET /api/users/2 HTTP/1.1".to_vec(),
            b"GET /api/orders/7 HTTP/1.1".to_vec(),
        ]
    }

    fn model() -> BytePackedModel {
        let docs = sample();
        let dictionary = build_dictionary(&docs, crate::dict::DEFAULT_MAX_DICT);
        BytePackedModel::build(dictionary, &docs).unwrap()
    }

    #[test]
    fn test_roundtrip() {
        let m = model();
        for doc in [
            &b"GET /api/users/9 HTTP/1.1"[..],
            b"",
            b"POST /unknown",
            b"GET GET GET GET GET GET ",
        ] {
            let packed = m.encode(doc).unwrap();
            assert_eq!(m.decode(&packed).unwrap(), doc, "doc {:?}", doc);
        }
    }

    #[test]
    fn test_shared_prefix_compresses() {
        let m = model();
        let doc = b"GET /api/users/3 HTTP/1.1";
        let packed = m.encode(doc).unwrap();
        assert!(packed.len() < doc.len());
    }

    #[test]
    fn test_table_reassembly_matches() {
        let m = model();
        let tables: Vec<CodeTable> = m.tables().into_iter().cloned().collect();
        let rebuilt = BytePackedModel::from_tables(m.dictionary().to_vec(), tables);
        assert_eq!(m, rebuilt);
    }
}
