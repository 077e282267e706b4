//! Model persistence.
//!
//! A frozen model serializes to one contiguous blob: header, configuration
//! tag, dictionary bytes, then each code table as its list of canonical
//! code lengths (the codes themselves are reconstructed on load). The
//! format is private to this crate; the version byte guards against
//! reading blobs from an incompatible release.
//!
//! Layout, all integers little-endian:
//!
//! ```text
//! magic b"DOCZ" | version u8 | tag u8
//! dict_len u32  | dictionary bytes
//! per table: symbol_count u32 | code length u8 * symbol_count
//! ```

use crate::error::{Error, Result};
use crate::huffman::CodeTable;
use crate::model::{literal, nibble, wide, Model};

const MAGIC: [u8; 4] = *b"DOCZ";
const VERSION: u8 = 1;

const TAG_NIBBLE: u8 = 1;
const TAG_BYTE: u8 = 2;
const TAG_LITERAL: u8 = 3;

/// Serializes a frozen model to an opaque blob.
pub fn save_model(model: &Model) -> Vec<u8> {
    let (tag, dictionary, tables) = match model {
        Model::NibblePacked(m) => (TAG_NIBBLE, m.dictionary(), m.tables()),
        Model::BytePacked(m) => (TAG_BYTE, m.dictionary(), m.tables()),
        Model::LiteralHuffman(m) => (TAG_LITERAL, &[][..], m.tables()),
    };
    let mut out = Vec::new();
    out.extend_from_slice(&MAGIC);
    out.push(VERSION);
    out.push(tag);
    out.extend_from_slice(&(dictionary.len() as u32).to_le_bytes());
    out.extend_from_slice(dictionary);
    for table in tables {
        out.extend_from_slice(&(table.alphabet_size() as u32).to_le_bytes());
        out.extend_from_slice(table.lengths());
    }
    out
}

/// Restores a model from a blob produced by [`save_model`].
///
/// Every structural property is checked: header, tag, declared sizes
/// against the actual input, expected alphabet sizes for the tag, and the
/// prefix-free validity of each code-length table. Anything off is
/// [`Error::CorruptModel`].
pub fn load_model(bytes: &[u8]) -> Result<Model> {
    let mut reader = Reader { buf: bytes, pos: 0 };
    if reader.take(4)? != MAGIC {
        return Err(Error::CorruptModel("bad magic".to_string()));
    }
    let version = reader.u8()?;
    if version != VERSION {
        return Err(Error::CorruptModel(format!(
            "unsupported model version {}",
            version
        )));
    }
    let tag = reader.u8()?;
    let dict_len = reader.u32()? as usize;
    let dictionary = reader.take(dict_len)?.to_vec();

    let alphabets = match tag {
        TAG_NIBBLE => nibble::ALPHABETS,
        TAG_BYTE => wide::ALPHABETS,
        TAG_LITERAL => literal::ALPHABETS,
        t => return Err(Error::CorruptModel(format!("unknown model tag {}", t))),
    };
    if tag == TAG_LITERAL && !dictionary.is_empty() {
        return Err(Error::CorruptModel(
            "literal-only model carries a dictionary".to_string(),
        ));
    }

    let mut tables = Vec::with_capacity(alphabets.len());
    for &expected in alphabets {
        let count = reader.u32()? as usize;
        if count != expected {
            return Err(Error::CorruptModel(format!(
                "alphabet size {} where {} expected",
                count, expected
            )));
        }
        let lengths = reader.take(count)?.to_vec();
        tables.push(CodeTable::from_lengths(lengths)?);
    }
    if reader.pos != bytes.len() {
        return Err(Error::CorruptModel("trailing bytes after model".to_string()));
    }

    Ok(match tag {
        TAG_NIBBLE => Model::NibblePacked(nibble::NibblePackedModel::from_tables(
            dictionary, tables,
        )),
        TAG_BYTE => Model::BytePacked(wide::BytePackedModel::from_tables(dictionary, tables)),
        _ => Model::LiteralHuffman(literal::LiteralHuffmanModel::from_tables(tables)),
    })
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.buf.len() - self.pos < n {
            return Err(Error::CorruptModel("truncated model blob".to_string()));
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }
}
