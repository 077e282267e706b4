//! Shared dictionary construction.
//!
//! The builder mines repeated substrings across a sample of documents and
//! packs the highest-value ones into a single buffer that every document
//! can reference as virtual preceding history. Value is measured as the
//! bytes a substring saves across its occurrences, net of the estimated
//! cost of coding one back-reference. The most valuable substrings are
//! placed closest to the end of the dictionary, where backward offsets —
//! and therefore their entropy-coded size — are smallest.

use log::debug;

use crate::docs::DocumentSource;
use crate::matcher::MIN_MATCH;

/// Default dictionary size limit: every byte stays addressable by a
/// 16-bit backward offset.
pub const DEFAULT_MAX_DICT: usize = 65_535;

/// Upper bound on the concatenated corpus handed to the suffix sort.
const MAX_MINING_CORPUS: usize = 1 << 20;

/// Estimated entropy-coded size of one back-reference, in bytes.
const REF_COST_BYTES: i64 = 3;

#[derive(Debug)]
struct Candidate {
    pos: usize,
    len: usize,
    count: usize,
    score: i64,
}

/// Builds a dictionary of at most `max_size` bytes from a document sample.
///
/// A corpus no larger than `max_size` is returned whole (deduplicated);
/// otherwise repeated substrings are mined from a suffix array over the
/// corpus. A sample with no repeated substrings of at least
/// [`MIN_MATCH`](crate::matcher::MIN_MATCH) bytes yields an empty
/// dictionary, degrading to pure literal coding. The result is fully
/// determined by the sample contents and `max_size`.
pub fn build_dictionary<D: DocumentSource + ?Sized>(docs: &D, max_size: usize) -> Vec<u8> {
    let (corpus, boundaries) = gather_corpus(docs);
    if corpus.len() <= max_size {
        return corpus;
    }
    if max_size == 0 {
        return Vec::new();
    }

    let candidates = mine_candidates(&corpus, &boundaries);
    debug!(
        "dictionary mining: corpus {} bytes, {} candidate substrings",
        corpus.len(),
        candidates.len()
    );
    let dictionary = select_and_pack(&corpus, candidates, max_size);
    debug!("dictionary packed: {} bytes", dictionary.len());
    dictionary
}

/// Concatenates deduplicated sample documents, recording where each ends.
fn gather_corpus<D: DocumentSource + ?Sized>(docs: &D) -> (Vec<u8>, Vec<usize>) {
    let mut corpus = Vec::new();
    let mut boundaries = Vec::new();
    let mut seen: Vec<&[u8]> = Vec::new();
    for i in 0..docs.len() {
        if corpus.len() >= MAX_MINING_CORPUS {
            break;
        }
        let doc = docs.doc(i);
        if doc.is_empty() || seen.contains(&doc) {
            continue;
        }
        seen.push(doc);
        corpus.extend_from_slice(doc);
        boundaries.push(corpus.len());
    }
    (corpus, boundaries)
}

/// Enumerates maximal repeated substrings with occurrence counts.
///
/// Walks the LCP array with the usual interval stack; every pop yields one
/// (position, length, count) candidate. Candidates are truncated at the
/// document boundary containing their representative position and dropped
/// when the remainder is shorter than the minimum match length or scores
/// no saving.
fn mine_candidates(corpus: &[u8], boundaries: &[usize]) -> Vec<Candidate> {
    let n = corpus.len();
    if n < MIN_MATCH {
        return Vec::new();
    }

    let sa = suffix_array(corpus);
    let lcp = lcp_array(corpus, &sa);

    let mut candidates = Vec::new();
    let mut stack: Vec<(usize, usize)> = Vec::new(); // (run start index, prefix len)
    for i in 1..=n {
        let cur = if i < n { lcp[i] } else { 0 };
        let mut left = i;
        while let Some(&(start, len)) = stack.last() {
            if len <= cur {
                break;
            }
            stack.pop();
            left = start;
            let pos = sa[start - 1] as usize;
            let count = i - start + 1;
            // Clamp to the end of the document holding this occurrence.
            // First boundary strictly past `pos`; `pos` equal to a
            // boundary means the occurrence starts the following document.
            let doc_end = match boundaries.binary_search(&pos) {
                Ok(b) => boundaries[b + 1],
                Err(b) => boundaries[b],
            };
            let len = len.min(doc_end - pos);
            if len < MIN_MATCH {
                continue;
            }
            let score = count as i64 * (len as i64 - REF_COST_BYTES);
            if score > 0 {
                candidates.push(Candidate {
                    pos,
                    len,
                    count,
                    score,
                });
            }
        }
        if cur >= MIN_MATCH && stack.last().map_or(true, |&(_, l)| l < cur) {
            stack.push((left, cur));
        }
    }
    candidates
}

/// Greedily keeps the best-scoring candidates and packs them into one
/// buffer, most valuable last; truncation removes the least valuable
/// front when the budget is exceeded.
fn select_and_pack(corpus: &[u8], mut candidates: Vec<Candidate>, max_size: usize) -> Vec<u8> {
    candidates.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then(b.len.cmp(&a.len))
            .then(a.pos.cmp(&b.pos))
    });

    let mut selected: Vec<&[u8]> = Vec::new();
    let mut total = 0usize;
    for c in &candidates {
        if total >= max_size {
            break;
        }
        let s = &corpus[c.pos..c.pos + c.len];
        if selected.iter().any(|kept| contains(kept, s)) {
            continue;
        }
        debug!(
            "dictionary keep: len {} count {} score {}",
            c.len, c.count, c.score
        );
        selected.push(s);
        total += s.len();
    }

    let mut dictionary = Vec::with_capacity(total.min(max_size));
    for s in selected.iter().rev() {
        dictionary.extend_from_slice(s);
    }
    if dictionary.len() > max_size {
        dictionary.drain(..dictionary.len() - max_size);
    }
    dictionary
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    debug_assert!(!needle.is_empty());
    needle.len() <= haystack.len() && haystack.windows(needle.len()).any(|w| w == needle)
}

/// Suffix array by comparison sort.
fn suffix_array(corpus: &[u8]) -> Vec<u32> {
    let mut sa: Vec<u32> = (0..corpus.len() as u32).collect();
    sa.sort_by(|&a, &b| corpus[a as usize..].cmp(&corpus[b as usize..]));
    sa
}

/// Kasai's LCP construction: `lcp[i]` is the common prefix length of the
/// suffixes at `sa[i - 1]` and `sa[i]`.
fn lcp_array(corpus: &[u8], sa: &[u32]) -> Vec<usize> {
    let n = corpus.len();
    let mut rank = vec![0usize; n];
    for (i, &s) in sa.iter().enumerate() {
        rank[s as usize] = i;
    }
    let mut lcp = vec![0usize; n];
    let mut h = 0usize;
    for i in 0..n {
        if rank[i] > 0 {
            let j = sa[rank[i] - 1] as usize;
            while i + h < n && j + h < n && corpus[i + h] == corpus[j + h] {
                h += 1;
            }
            lcp[rank[i]] = h;
            h = h.saturating_sub(1);
        } else {
            h = 0;
        }
    }
    lcp
}
