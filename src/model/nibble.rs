//! Dictionary model with 4-bit buckets.
//!
//! The flagship configuration. Match lengths split into two nibbles, the
//! low nibble sharing one alphabet with literal bytes (plus the EOF
//! terminator); offsets split into four nibbles, each with its own code
//! table. Six tables in total, all smoothed so any document encodes.

use crate::bits::{BitReader, BitWriter};
use crate::docs::DocumentSource;
use crate::error::{Error, Result};
use crate::huffman::{smoothed, CodeTable};
use crate::matcher::{pack, replay_reference, TokenSink};

/// Length-low-nibble symbols start here in the literal alphabet.
const LEN_LOW_BASE: u32 = 256;
/// Token-stream terminator.
const EOF: u32 = 272;
/// 256 literals + 16 length-low nibbles + EOF.
const LIT_LEN_ALPHABET: usize = 273;
const NIBBLE_ALPHABET: usize = 16;

/// Alphabet sizes in serialization order.
pub(crate) const ALPHABETS: &[usize] = &[
    LIT_LEN_ALPHABET,
    NIBBLE_ALPHABET,
    NIBBLE_ALPHABET,
    NIBBLE_ALPHABET,
    NIBBLE_ALPHABET,
    NIBBLE_ALPHABET,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NibblePackedModel {
    dictionary: Vec<u8>,
    /// Literals, length low nibbles, EOF.
    lit_len: CodeTable,
    /// Length high nibbles.
    len_high: CodeTable,
    /// Offset nibbles, least significant first.
    offsets: [CodeTable; 4],
}

impl NibblePackedModel {
    /// Gathers token statistics over `sample` against `dictionary` and
    /// freezes the code tables.
    pub fn build<D: DocumentSource + ?Sized>(dictionary: Vec<u8>, sample: &D) -> Result<Self> {
        let mut hist = Histograms::new();
        for i in 0..sample.len() {
            pack(&dictionary, sample.doc(i), &mut hist)?;
            hist.lit_len[EOF as usize] += 1;
        }
        Ok(NibblePackedModel {
            lit_len: CodeTable::from_frequencies(&smoothed(&hist.lit_len)),
            len_high: CodeTable::from_frequencies(&smoothed(&hist.len_high)),
            offsets: hist
                .offsets
                .map(|h| CodeTable::from_frequencies(&smoothed(&h))),
            dictionary,
        })
    }

    /// Reassembles a model from deserialized parts. Table order and
    /// alphabet sizes follow [`ALPHABETS`].
    pub(crate) fn from_tables(dictionary: Vec<u8>, mut tables: Vec<CodeTable>) -> Self {
        debug_assert_eq!(tables.len(), ALPHABETS.len());
        let off3 = tables.pop().unwrap();
        let off2 = tables.pop().unwrap();
        let off1 = tables.pop().unwrap();
        let off0 = tables.pop().unwrap();
        let len_high = tables.pop().unwrap();
        let lit_len = tables.pop().unwrap();
        NibblePackedModel {
            dictionary,
            lit_len,
            len_high,
            offsets: [off0, off1, off2, off3],
        }
    }

    pub(crate) fn tables(&self) -> Vec<&CodeTable> {
        let mut t = vec![&self.lit_len, &self.len_high];
        t.extend(self.offsets.iter());
        t
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
        self.lit_len.encode_symbol(&mut writer, EOF)?;
        Ok(writer.into_bytes())
    }

    pub fn decode(&self, compressed: &[u8]) -> Result<Vec<u8>> {
        let mut reader = BitReader::new(compressed);
        let mut out = Vec::new();
        loop {
            let symbol = self.lit_len.decode_symbol(&mut reader)?;
            if symbol == EOF {
                break;
            }
            if symbol < LEN_LOW_BASE {
                out.push(symbol as u8);
                continue;
            }
            let len_low = symbol - LEN_LOW_BASE;
            let len_high = self.len_high.decode_symbol(&mut reader)?;
            let length = len_low | (len_high << 4);
            if length == 0 {
                return Err(Error::CorruptModel(
                    "zero-length reference in stream".to_string(),
                ));
            }
            let mut offset = 0u32;
            for (i, table) in self.offsets.iter().enumerate() {
                offset |= table.decode_symbol(&mut reader)? << (4 * i);
            }
            replay_reference(&self.dictionary, &mut out, offset, length)?;
        }
        Ok(out)
    }
}

struct Histograms {
    lit_len: Vec<u64>,
    len_high: Vec<u64>,
    offsets: [Vec<u64>; 4],
}

impl Histograms {
    fn new() -> Self {
        Histograms {
            lit_len: vec![0; LIT_LEN_ALPHABET],
            len_high: vec![0; NIBBLE_ALPHABET],
            offsets: std::array::from_fn(|_| vec![0; NIBBLE_ALPHABET]),
        }
    }
}

impl TokenSink for Histograms {
    fn literal(&mut self, byte: u8) -> Result<()> {
        self.lit_len[byte as usize] += 1;
        Ok(())
    }

    fn reference(&mut self, offset: u32, length: u32) -> Result<()> {
        self.lit_len[(LEN_LOW_BASE + (length & 0xf)) as usize] += 1;
        self.len_high[((length >> 4) & 0xf) as usize] += 1;
        for (i, hist) in self.offsets.iter_mut().enumerate() {
            hist[((offset >> (4 * i)) & 0xf) as usize] += 1;
        }
        Ok(())
    }
}

struct EncodeSink<'a, 'w> {
    model: &'a NibblePackedModel,
    writer: &'w mut BitWriter,
}

impl TokenSink for EncodeSink<'_, '_> {
    fn literal(&mut self, byte: u8) -> Result<()> {
        self.model.lit_len.encode_symbol(self.writer, byte as u32)
    }

    fn reference(&mut self, offset: u32, length: u32) -> Result<()> {
        self.model
            .lit_len
            .encode_symbol(self.writer, LEN_LOW_BASE + (length & 0xf))?;
        self.model
            .len_high
            .encode_symbol(self.writer, (length >> 4) & 0xf)?;
        for (i, table) in self.model.offsets.iter().enumerate() {
            table.encode_symbol(self.writer, (offset >> (4 * i)) & 0xf)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dict::build_dictionary;

    fn sample() -> Vec<Vec<u8>> {
        vec![
            b"name:Alice,age:30".to_vec(),
            b"name:Bob,age:25".to_vec(),
            b"name:Carol,age:40".to_vec(),
        ]
    }

    fn model() -> NibblePackedModel {
        let docs = sample();
        let dictionary = build_dictionary(&docs, crate::dict::DEFAULT_MAX_DICT);
        NibblePackedModel::build(dictionary, &docs).unwrap()
    }

    #[test]
    fn test_roundtrip() {
        let m = model();
        for doc in [
            &b"name:Dave,age:22"[..],
            b"",
            b"no shared structure at all!",
            b"name:name:name:name:name:name:name:name:",
        ] {
            let packed = m.encode(doc).unwrap();
            assert_eq!(m.decode(&packed).unwrap(), doc, "doc {:?}", doc);
        }
    }

    #[test]
    fn test_shared_fields_compress_well() {
        let m = model();
        let doc = b"name:Dave,age:22";
        let packed = m.encode(doc).unwrap();
        assert!(packed.len() < doc.len());
    }

    #[test]
    fn test_empty_document_is_just_eof() {
        let m = model();
        let packed = m.encode(b"").unwrap();
        assert!(!packed.is_empty());
        assert_eq!(m.decode(&packed).unwrap(), b"");
    }

    #[test]
    fn test_empty_dictionary_degrades_to_literals() {
        let docs = sample();
        let m = NibblePackedModel::build(Vec::new(), &docs).unwrap();
        let doc = b"name:Dave,age:22";
        let packed = m.encode(doc).unwrap();
        assert_eq!(m.decode(&packed).unwrap(), doc);
    }

    #[test]
    fn test_out_of_range_offset_in_stream_is_corrupt() {
        let docs = sample();
        let m = NibblePackedModel::build(Vec::new(), &docs).unwrap();
        // Hand-craft a stream whose first token references history that
        // does not exist (empty dictionary, nothing emitted yet).
        let mut writer = BitWriter::new();
        let mut sink = EncodeSink {
            model: &m,
            writer: &mut writer,
        };
        sink.reference(100, 5).unwrap();
        m.lit_len.encode_symbol(&mut writer, EOF).unwrap();
        let packed = writer.into_bytes();
        assert!(matches!(m.decode(&packed), Err(Error::CorruptModel(_))));
    }

    #[test]
    fn test_table_reassembly_matches() {
        let m = model();
        let tables: Vec<CodeTable> = m.tables().into_iter().cloned().collect();
        let rebuilt = NibblePackedModel::from_tables(m.dictionary().to_vec(), tables);
        assert_eq!(m, rebuilt);
    }
}
