//! Two-pass model selection.
//!
//! Training runs in two phases. `build` mines the shared dictionary from
//! the build sample and constructs one model per candidate configuration,
//! each gathering its own token statistics. `optimize` then compresses a
//! validation sample in full under every candidate and keeps the one with
//! the smallest total encoded size. Using a second sample keeps the choice
//! from overfitting the build sample; candidates are independent and are
//! evaluated in parallel, with the winner picked deterministically by
//! `(total, candidate index)`.

use log::{debug, trace};
use rayon::prelude::*;

use crate::dict::{build_dictionary, DEFAULT_MAX_DICT};
use crate::docs::DocumentSource;
use crate::error::{Error, Result};
use crate::model::{BytePackedModel, LiteralHuffmanModel, Model, NibblePackedModel};

/// Dictionary budget for the reduced-dictionary candidate.
const SMALL_DICT: usize = 16 * 1024;

enum Candidate {
    Nibble(Vec<u8>),
    Byte(Vec<u8>),
    Literal,
}

impl Candidate {
    fn describe(&self) -> String {
        match self {
            Candidate::Nibble(d) => format!("nibble-packed, {} byte dictionary", d.len()),
            Candidate::Byte(d) => format!("byte-packed, {} byte dictionary", d.len()),
            Candidate::Literal => "literal-only".to_string(),
        }
    }

    fn build<D: DocumentSource + Sync + ?Sized>(self, sample: &D) -> Result<Model> {
        Ok(match self {
            Candidate::Nibble(dict) => Model::NibblePacked(NibblePackedModel::build(dict, sample)?),
            Candidate::Byte(dict) => Model::BytePacked(BytePackedModel::build(dict, sample)?),
            Candidate::Literal => Model::LiteralHuffman(LiteralHuffmanModel::build(sample)?),
        })
    }
}

/// The two-phase trainer. `build` must precede `optimize`; the model
/// handed out is the best candidate seen so far.
#[derive(Default)]
pub struct Optimizer {
    candidates: Vec<Model>,
    best: usize,
}

impl Optimizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Phase one: builds the dictionary and every candidate model from the
    /// build sample. Fails with [`Error::EmptyCorpus`] on an empty sample.
    pub fn build<D: DocumentSource + Sync + ?Sized>(&mut self, sample: &D) -> Result<()> {
        if sample.is_empty() {
            return Err(Error::EmptyCorpus);
        }
        let dictionary = build_dictionary(sample, DEFAULT_MAX_DICT);
        debug!("build phase: dictionary of {} bytes", dictionary.len());
        // The dictionary tail holds the most valuable substrings, so the
        // reduced-dictionary candidate keeps the tail.
        let small = dictionary[dictionary.len().saturating_sub(SMALL_DICT)..].to_vec();

        let configs = vec![
            Candidate::Nibble(dictionary.clone()),
            Candidate::Nibble(small),
            Candidate::Byte(dictionary),
            Candidate::Literal,
        ];
        for (i, c) in configs.iter().enumerate() {
            debug!("candidate {}: {}", i, c.describe());
        }
        self.candidates = configs
            .into_par_iter()
            .map(|c| c.build(sample))
            .collect::<Result<Vec<Model>>>()?;
        self.best = 0;
        Ok(())
    }

    /// Phase two: measures every candidate on the validation sample and
    /// keeps the smallest total. An empty sample is a no-op; calling this
    /// before [`build`](Optimizer::build) is [`Error::NotBuilt`].
    pub fn optimize<D: DocumentSource + Sync + ?Sized>(&mut self, sample: &D) -> Result<()> {
        if self.candidates.is_empty() {
            return Err(Error::NotBuilt);
        }
        if sample.is_empty() {
            debug!("optimize phase: empty validation sample, keeping build-phase model");
            return Ok(());
        }
        let totals = self
            .candidates
            .par_iter()
            .map(|model| {
                let mut total = 0usize;
                for i in 0..sample.len() {
                    total += model.encoded_len(sample.doc(i))?;
                }
                Ok(total)
            })
            .collect::<Result<Vec<usize>>>()?;
        for (i, total) in totals.iter().enumerate() {
            trace!("candidate {}: {} bytes total", i, total);
        }
        self.best = totals
            .iter()
            .enumerate()
            .min_by_key(|&(i, &total)| (total, i))
            .map(|(i, _)| i)
            .unwrap_or(0);
        debug!(
            "optimize phase: winner is candidate {} at {} bytes",
            self.best, totals[self.best]
        );
        Ok(())
    }

    /// The best model so far, or [`Error::NotBuilt`] before `build`.
    pub fn best_model(&self) -> Result<&Model> {
        self.candidates.get(self.best).ok_or(Error::NotBuilt)
    }

    /// Consumes the optimizer, yielding the winning frozen model.
    pub fn into_model(mut self) -> Result<Model> {
        if self.candidates.is_empty() {
            return Err(Error::NotBuilt);
        }
        Ok(self.candidates.swap_remove(self.best))
    }
}

/// Trains a model end to end: build on `build_docs`, optimize on
/// `validation_docs`, return the winner.
///
/// The two samples may be disjoint, overlapping, or identical; disjoint
/// samples give the most honest model selection.
pub fn train<B, V>(build_docs: &B, validation_docs: &V) -> Result<Model>
where
    B: DocumentSource + Sync + ?Sized,
    V: DocumentSource + Sync + ?Sized,
{
    let mut optimizer = Optimizer::new();
    optimizer.build(build_docs)?;
    optimizer.optimize(validation_docs)?;
    optimizer.into_model()
}
