//! Frozen compression models.
//!
//! A model is the durable unit pairing a shared dictionary with the code
//! tables needed to compress and decompress documents consistently. The
//! variants differ in how match lengths and offsets are bucketed for
//! entropy coding (and whether a dictionary is used at all); the optimizer
//! picks among them by measured compressed size. Once trained, a model is
//! immutable and safe to share across concurrent encode/decode calls.

use crate::docs::DocumentSource;
use crate::error::{Error, Result};
use crate::serialize;

pub mod literal;
pub mod nibble;
pub mod wide;

pub use literal::LiteralHuffmanModel;
pub use nibble::NibblePackedModel;
pub use wide::BytePackedModel;

/// A frozen, trained compression model (tagged by configuration).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Model {
    /// Dictionary model with 4-bit length/offset buckets.
    NibblePacked(NibblePackedModel),
    /// Dictionary model with 8-bit length/offset buckets.
    BytePacked(BytePackedModel),
    /// Literal-only Huffman coding, no dictionary.
    LiteralHuffman(LiteralHuffmanModel),
}

impl Model {
    /// Trains a model: builds candidates from `build_docs`, then keeps the
    /// candidate that compresses `validation_docs` smallest.
    ///
    /// See [`crate::optimizer::train`]; an empty validation sample keeps
    /// the build-phase model, an empty build sample is
    /// [`Error::EmptyCorpus`].
    pub fn train<B, V>(build_docs: &B, validation_docs: &V) -> Result<Model>
    where
        B: DocumentSource + Sync + ?Sized,
        V: DocumentSource + Sync + ?Sized,
    {
        crate::optimizer::train(build_docs, validation_docs)
    }

    /// Compresses one document.
    pub fn compress(&self, document: &[u8]) -> Result<Vec<u8>> {
        match self {
            Model::NibblePacked(m) => m.encode(document),
            Model::BytePacked(m) => m.encode(document),
            Model::LiteralHuffman(m) => m.encode(document),
        }
    }

    /// Decompresses one document previously produced by [`compress`]
    /// under the same model.
    ///
    /// [`compress`]: Model::compress
    pub fn decompress(&self, compressed: &[u8]) -> Result<Vec<u8>> {
        match self {
            Model::NibblePacked(m) => m.decode(compressed),
            Model::BytePacked(m) => m.decode(compressed),
            Model::LiteralHuffman(m) => m.decode(compressed),
        }
    }

    /// Compresses into a caller-supplied buffer.
    ///
    /// Returns the number of bytes written. When the buffer is too small,
    /// fails with [`Error::CapacityExceeded`] carrying the required size
    /// and writes nothing; retrying with that size always succeeds.
    pub fn compress_into(&self, document: &[u8], dest: &mut [u8]) -> Result<usize> {
        fit(self.compress(document)?, dest)
    }

    /// Decompresses into a caller-supplied buffer, with the same capacity
    /// contract as [`compress_into`](Model::compress_into).
    pub fn decompress_into(&self, compressed: &[u8], dest: &mut [u8]) -> Result<usize> {
        fit(self.decompress(compressed)?, dest)
    }

    /// Compressed size of `document` under this model, in bytes.
    pub fn encoded_len(&self, document: &[u8]) -> Result<usize> {
        Ok(self.compress(document)?.len())
    }

    /// The shared dictionary (empty for the literal-only model).
    pub fn dictionary(&self) -> &[u8] {
        match self {
            Model::NibblePacked(m) => m.dictionary(),
            Model::BytePacked(m) => m.dictionary(),
            Model::LiteralHuffman(_) => &[],
        }
    }

    /// Serializes the model to an opaque blob.
    pub fn to_bytes(&self) -> Vec<u8> {
        serialize::save_model(self)
    }

    /// Restores a model from a blob produced by [`to_bytes`](Model::to_bytes).
    pub fn from_bytes(bytes: &[u8]) -> Result<Model> {
        serialize::load_model(bytes)
    }
}

fn fit(output: Vec<u8>, dest: &mut [u8]) -> Result<usize> {
    if output.len() > dest.len() {
        return Err(Error::CapacityExceeded {
            required: output.len(),
            capacity: dest.len(),
        });
    }
    dest[..output.len()].copy_from_slice(&output);
    Ok(output.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Vec<u8>> {
        vec![
            b"name:Alice,age:30".to_vec(),
            b"name:Bob,age:25".to_vec(),
            b"name:Carol,age:40".to_vec(),
        ]
    }

    fn trained() -> Model {
        Model::train(&sample(), &sample()).unwrap()
    }

    #[test]
    fn test_compress_decompress_roundtrip() {
        let model = trained();
        for doc in [
            &b"name:Dave,age:22"[..],
            b"",
            b"x",
            b"completely unrelated content 1234567890",
            b"name:name:name:name:",
        ] {
            let packed = model.compress(doc).unwrap();
            assert_eq!(model.decompress(&packed).unwrap(), doc);
        }
    }

    #[test]
    fn test_compress_into_capacity_contract() {
        let model = trained();
        let doc = b"abcdefghijklmnopqrstuvwxyz0123456789ABCDEFGHIJKLMN"; // 50 bytes, no structure
        let mut tiny = [0u8; 1];
        let err = model.compress_into(doc, &mut tiny).unwrap_err();
        let Error::CapacityExceeded { required, capacity } = err else {
            panic!("expected CapacityExceeded, got {err:?}");
        };
        assert_eq!(capacity, 1);
        assert!(required > 1);
        // Nothing was written.
        assert_eq!(tiny, [0u8; 1]);

        // The reported requirement always succeeds.
        let mut dest = vec![0u8; required];
        let written = model.compress_into(doc, &mut dest).unwrap();
        assert_eq!(written, required);
        assert_eq!(model.decompress(&dest[..written]).unwrap(), doc);
    }

    #[test]
    fn test_decompress_into_capacity_contract() {
        let model = trained();
        let doc = b"name:Dave,age:22";
        let packed = model.compress(doc).unwrap();

        let mut tiny = [0u8; 2];
        let err = model.decompress_into(&packed, &mut tiny).unwrap_err();
        let Error::CapacityExceeded { required, .. } = err else {
            panic!("expected CapacityExceeded, got {err:?}");
        };
        assert_eq!(required, doc.len());

        let mut dest = vec![0u8; required];
        let written = model.decompress_into(&packed, &mut dest).unwrap();
        assert_eq!(&dest[..written], doc);
    }

    #[test]
    fn test_decompress_garbage_fails_cleanly() {
        let model = trained();
        // Unterminated or nonsense streams must error, never panic.
        assert!(model.decompress(&[]).is_err());
        for junk in [&[0xFFu8][..], &[0x00, 0x00, 0x00][..], &[0xAB, 0xCD, 0xEF, 0x01][..]] {
            let _ = model.decompress(junk); // must not panic
        }
    }

    #[test]
    fn test_randomized_documents_roundtrip() {
        use rand::{Rng, SeedableRng};
        use rand_chacha::ChaCha8Rng;

        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let record = |rng: &mut ChaCha8Rng| {
            let mut d = Vec::new();
            for field in [&b"name:"[..], b",age:", b",city:"] {
                d.extend_from_slice(field);
                d.extend_from_slice(rng.gen_range(0..10_000u32).to_string().as_bytes());
            }
            d
        };
        let build: Vec<Vec<u8>> = (0..40).map(|_| record(&mut rng)).collect();
        let validation: Vec<Vec<u8>> = (0..10).map(|_| record(&mut rng)).collect();
        let model = Model::train(&build, &validation).unwrap();

        // Structured records and pure noise must both survive the trip.
        for _ in 0..25 {
            let doc = record(&mut rng);
            let packed = model.compress(&doc).unwrap();
            assert_eq!(model.decompress(&packed).unwrap(), doc);
        }
        for _ in 0..25 {
            let len = rng.gen_range(0..200);
            let doc: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
            let packed = model.compress(&doc).unwrap();
            assert_eq!(model.decompress(&packed).unwrap(), doc);
        }
    }

    #[test]
    fn test_model_is_shareable_across_threads() {
        let model = std::sync::Arc::new(trained());
        let doc = b"name:Dave,age:22".to_vec();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let model = model.clone();
                let doc = doc.clone();
                std::thread::spawn(move || {
                    let packed = model.compress(&doc).unwrap();
                    assert_eq!(model.decompress(&packed).unwrap(), doc);
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
    }
}
