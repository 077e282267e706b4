//! Canonical minimum-redundancy codes.
//!
//! Each symbol alphabet (literals, length buckets, offset buckets) gets its
//! own code table built from a frequency table. Construction is the
//! classic heap-based Huffman merge; the resulting bit lengths are then
//! assigned canonically (sorted by length, then symbol value), so a table
//! serializes as a bare list of code lengths and is reconstructed exactly
//! from them.
//!
//! Codes are written and read MSB-first. The maximum code length is 32
//! bits; deeper trees are clamped and the Kraft sum repaired.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::bits::{BitReader, BitWriter};
use crate::error::{Error, Result};

/// Longest permitted code, in bits.
pub const MAX_CODE_LEN: u8 = 32;

/// Raises every zero count to one.
///
/// Training histograms only see the build sample; documents compressed
/// later may contain symbols the sample never produced, so every symbol of
/// every alphabet must end up with a code.
pub fn smoothed(counts: &[u64]) -> Vec<u64> {
    counts.iter().map(|&c| c.max(1)).collect()
}

/// A frozen canonical prefix code over a dense symbol alphabet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeTable {
    /// Code length per symbol; zero means the symbol has no code.
    lengths: Vec<u8>,
    /// Canonical code per symbol, valid where `lengths` is non-zero.
    codes: Vec<u32>,
    /// Symbols ordered by (length, symbol), coded symbols only.
    sorted_symbols: Vec<u32>,
    /// Per bit length: number of codes of that length.
    count_at: Vec<u32>,
    /// Per bit length: canonical code of the first symbol of that length.
    first_code: Vec<u32>,
    /// Per bit length: index into `sorted_symbols` of that first symbol.
    first_index: Vec<u32>,
}

impl CodeTable {
    /// Builds a table from a frequency histogram indexed by symbol.
    ///
    /// Symbols with a zero count receive no code. A histogram with a
    /// single non-zero entry yields a degenerate one-bit code; an all-zero
    /// histogram yields a table with no codes at all.
    pub fn from_frequencies(counts: &[u64]) -> CodeTable {
        let lengths = huffman_lengths(counts);
        // Lengths derived here always satisfy the Kraft inequality.
        Self::assemble(lengths)
    }

    /// Reconstructs a table from serialized code lengths.
    ///
    /// Fails with [`Error::CorruptModel`] if the lengths over-subscribe
    /// the code space (no prefix-free assignment exists) or exceed
    /// [`MAX_CODE_LEN`].
    pub fn from_lengths(lengths: Vec<u8>) -> Result<CodeTable> {
        let mut kraft: u64 = 0;
        for &len in &lengths {
            if len > MAX_CODE_LEN {
                return Err(Error::CorruptModel(format!(
                    "code length {} exceeds maximum {}",
                    len, MAX_CODE_LEN
                )));
            }
            if len > 0 {
                kraft += 1u64 << (MAX_CODE_LEN - len);
            }
        }
        if kraft > 1u64 << MAX_CODE_LEN {
            return Err(Error::CorruptModel(
                "code lengths over-subscribe the code space".to_string(),
            ));
        }
        Ok(Self::assemble(lengths))
    }

    /// Assigns canonical codes and decode tables from validated lengths.
    fn assemble(lengths: Vec<u8>) -> CodeTable {
        let mut order: Vec<u32> = (0..lengths.len() as u32)
            .filter(|&s| lengths[s as usize] > 0)
            .collect();
        order.sort_by_key(|&s| (lengths[s as usize], s));

        let mut codes = vec![0u32; lengths.len()];
        let mut count_at = vec![0u32; MAX_CODE_LEN as usize + 1];
        let mut first_code = vec![0u32; MAX_CODE_LEN as usize + 1];
        let mut first_index = vec![0u32; MAX_CODE_LEN as usize + 1];

        let mut code: u32 = 0;
        let mut prev_len: u8 = 0;
        for (i, &sym) in order.iter().enumerate() {
            let len = lengths[sym as usize];
            // The first symbol's code is zero, so a full-width shift (only
            // possible before anything is assigned) must also yield zero.
            code = code.checked_shl(u32::from(len - prev_len)).unwrap_or(0);
            if count_at[len as usize] == 0 {
                first_code[len as usize] = code;
                first_index[len as usize] = i as u32;
            }
            count_at[len as usize] += 1;
            codes[sym as usize] = code;
            code += 1;
            prev_len = len;
        }

        CodeTable {
            lengths,
            codes,
            sorted_symbols: order,
            count_at,
            first_code,
            first_index,
        }
    }

    /// Code length per symbol, for serialization.
    pub fn lengths(&self) -> &[u8] {
        &self.lengths
    }

    /// Number of symbols in the alphabet.
    pub fn alphabet_size(&self) -> usize {
        self.lengths.len()
    }

    /// Appends the code for `symbol` to the bitstream.
    pub fn encode_symbol(&self, writer: &mut BitWriter, symbol: u32) -> Result<()> {
        let len = self
            .lengths
            .get(symbol as usize)
            .copied()
            .filter(|&l| l > 0)
            .ok_or_else(|| Error::CorruptModel(format!("no code for symbol {}", symbol)))?;
        writer.write_code(self.codes[symbol as usize], len);
        Ok(())
    }

    /// Reads one symbol from the bitstream.
    ///
    /// Fails with [`Error::CorruptModel`] when the stream ends mid-symbol
    /// or the accumulated bits match no code.
    pub fn decode_symbol(&self, reader: &mut BitReader<'_>) -> Result<u32> {
        let mut code: u32 = 0;
        for len in 1..=MAX_CODE_LEN as usize {
            let bit = reader.read_bit().ok_or_else(|| {
                Error::CorruptModel("bitstream ended inside a symbol".to_string())
            })?;
            code = (code << 1) | bit as u32;
            let n = self.count_at[len];
            if n > 0 {
                let fc = self.first_code[len];
                if code >= fc && code - fc < n {
                    let idx = self.first_index[len] + (code - fc);
                    return Ok(self.sorted_symbols[idx as usize]);
                }
            }
        }
        Err(Error::CorruptModel(
            "bit pattern matches no code".to_string(),
        ))
    }
}

/// Derives per-symbol code lengths from a frequency histogram.
fn huffman_lengths(counts: &[u64]) -> Vec<u8> {
    struct Node {
        count: u64,
        symbol: Option<usize>,
        children: Option<(usize, usize)>,
    }

    let mut lengths = vec![0u8; counts.len()];
    let coded: Vec<usize> = (0..counts.len()).filter(|&s| counts[s] > 0).collect();
    match coded.len() {
        0 => return lengths,
        1 => {
            lengths[coded[0]] = 1;
            return lengths;
        }
        _ => {}
    }

    // Arena of tree nodes; the heap orders by (count, insertion id) so
    // ties resolve identically on every run.
    let mut nodes: Vec<Node> = Vec::with_capacity(coded.len() * 2 - 1);
    let mut heap: BinaryHeap<Reverse<(u64, usize)>> = BinaryHeap::new();
    for &sym in &coded {
        let id = nodes.len();
        nodes.push(Node {
            count: counts[sym],
            symbol: Some(sym),
            children: None,
        });
        heap.push(Reverse((counts[sym], id)));
    }
    while heap.len() > 1 {
        let Reverse((c1, a)) = heap.pop().unwrap();
        let Reverse((c2, b)) = heap.pop().unwrap();
        let id = nodes.len();
        nodes.push(Node {
            count: c1 + c2,
            symbol: None,
            children: Some((a, b)),
        });
        heap.push(Reverse((nodes[id].count, id)));
    }
    let root = heap.pop().unwrap().0 .1;

    // Depth-first walk assigning depths as code lengths.
    let mut stack = vec![(root, 0u16)];
    while let Some((id, depth)) = stack.pop() {
        match (nodes[id].symbol, nodes[id].children) {
            (Some(sym), _) => {
                lengths[sym] = depth.min(u16::from(MAX_CODE_LEN)) as u8;
            }
            (None, Some((a, b))) => {
                stack.push((a, depth + 1));
                stack.push((b, depth + 1));
            }
            _ => unreachable!("huffman node is neither leaf nor internal"),
        }
    }

    repair_kraft(&mut lengths);
    lengths
}

/// Restores the Kraft inequality after clamping over-deep codes.
///
/// Repeatedly lengthens the longest code still below the cap (smallest
/// symbol on ties) until the lengths describe a valid prefix-free code.
fn repair_kraft(lengths: &mut [u8]) {
    let max = MAX_CODE_LEN;
    let mut kraft: u64 = lengths
        .iter()
        .filter(|&&l| l > 0)
        .map(|&l| 1u64 << (max - l))
        .sum();
    while kraft > 1u64 << max {
        let mut pick: Option<usize> = None;
        for (sym, &len) in lengths.iter().enumerate() {
            if len > 0 && len < max && pick.map_or(true, |p| len > lengths[p]) {
                pick = Some(sym);
            }
        }
        let Some(sym) = pick else {
            // Every code is already at the cap; cannot happen for any
            // alphabet smaller than 2^32 symbols.
            return;
        };
        kraft -= 1u64 << (max - lengths[sym] - 1);
        lengths[sym] += 1;
    }
}
