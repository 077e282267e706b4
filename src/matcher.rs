//! Greedy longest-match tokenizer.
//!
//! A document is parsed into literal bytes and back-references against the
//! logical concatenation `[dictionary, document-so-far]`. Offsets count
//! backward from the current emit position, so dictionary bytes near the
//! end of the dictionary are the cheapest to reference. The same routine
//! feeds both the training histograms and the runtime encoder, which keeps
//! the code tables aligned with actual symbol usage.

use crate::error::{Error, Result};

/// Shortest match worth a back-reference once coding overhead is counted.
pub const MIN_MATCH: usize = 4;
/// Longest representable match.
pub const MAX_MATCH: usize = 255;
/// Largest representable backward offset.
pub const MAX_OFFSET: usize = 65_535;

const HASH_BITS: u32 = 15;
const HASH_SIZE: usize = 1 << HASH_BITS;
/// Chain positions examined per document position.
const MAX_CHAIN: usize = 64;

/// Consumer of the token stream produced by [`pack`].
pub trait TokenSink {
    fn literal(&mut self, byte: u8) -> Result<()>;

    /// `offset` in `1..=MAX_OFFSET`, `length` in `MIN_MATCH..=MAX_MATCH`.
    fn reference(&mut self, offset: u32, length: u32) -> Result<()>;
}

#[inline]
fn hash4(buf: &[u8], pos: usize) -> usize {
    let v = u32::from_le_bytes([buf[pos], buf[pos + 1], buf[pos + 2], buf[pos + 3]]);
    (v.wrapping_mul(2_654_435_761) >> (32 - HASH_BITS)) as usize
}

/// Parses `document` into tokens against `dictionary` as virtual history.
///
/// At each position the longest match of at least [`MIN_MATCH`] bytes
/// within the last [`MAX_OFFSET`] bytes of history is emitted as a
/// reference and the cursor advances by the match length; otherwise a
/// single literal is emitted. Hash chains over 4-byte prefixes are walked
/// newest-first and only a strictly longer candidate replaces the current
/// best, so equal-length ties keep the smallest offset (a match inside the
/// document itself beats an equally long dictionary match).
pub fn pack<S: TokenSink>(dictionary: &[u8], document: &[u8], sink: &mut S) -> Result<()> {
    let mut buf = Vec::with_capacity(dictionary.len() + document.len());
    buf.extend_from_slice(dictionary);
    buf.extend_from_slice(document);

    let mut head = vec![-1i64; HASH_SIZE];
    let mut prev = vec![-1i64; buf.len()];
    let insert = |pos: usize, head: &mut Vec<i64>, prev: &mut Vec<i64>| {
        if pos + MIN_MATCH <= buf.len() {
            let h = hash4(&buf, pos);
            prev[pos] = head[h];
            head[h] = pos as i64;
        }
    };

    for pos in 0..dictionary.len() {
        insert(pos, &mut head, &mut prev);
    }

    let mut i = dictionary.len();
    while i < buf.len() {
        let mut best_len = 0usize;
        let mut best_pos = 0usize;
        if i + MIN_MATCH <= buf.len() {
            let mut j = head[hash4(&buf, i)];
            let mut tries = MAX_CHAIN;
            while j >= 0 && tries > 0 {
                let cand = j as usize;
                if i - cand > MAX_OFFSET {
                    break;
                }
                let limit = MAX_MATCH.min(buf.len() - i);
                let mut len = 0usize;
                while len < limit && buf[cand + len] == buf[i + len] {
                    len += 1;
                }
                if len >= MIN_MATCH && len > best_len {
                    best_len = len;
                    best_pos = cand;
                }
                j = prev[cand];
                tries -= 1;
            }
        }

        if best_len >= MIN_MATCH {
            sink.reference((i - best_pos) as u32, best_len as u32)?;
            for k in 0..best_len {
                insert(i + k, &mut head, &mut prev);
            }
            i += best_len;
        } else {
            sink.literal(buf[i])?;
            insert(i, &mut head, &mut prev);
            i += 1;
        }
    }
    Ok(())
}

/// Appends the bytes named by a decoded reference to `out`.
///
/// Overlapping copies (`offset < length`) are legal and replayed
/// byte-by-byte. An offset reaching before the start of the dictionary
/// can only come from a corrupted or mismatched model and fails with
/// [`Error::CorruptModel`].
pub fn replay_reference(
    dictionary: &[u8],
    out: &mut Vec<u8>,
    offset: u32,
    length: u32,
) -> Result<()> {
    let history = dictionary.len() + out.len();
    if offset == 0 || offset as usize > history {
        return Err(Error::CorruptModel(format!(
            "reference offset {} outside available history {}",
            offset, history
        )));
    }
    let mut pos = history - offset as usize;
    for _ in 0..length {
        let byte = if pos < dictionary.len() {
            dictionary[pos]
        } else {
            out[pos - dictionary.len()]
        };
        out.push(byte);
        pos += 1;
    }
    Ok(())
}
