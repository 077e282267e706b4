//! Document collection abstraction consumed by training.
//!
//! Training reads documents by index only; it never takes ownership and
//! never mutates them. The build sample and the validation sample are two
//! separate sources, so callers partition one physical collection however
//! they like (disjoint halves, overlapping, or the same sample twice).

/// An indexable, length-known collection of byte buffers.
pub trait DocumentSource {
    /// Number of documents in the collection.
    fn len(&self) -> usize;

    /// Returns the document at `index`. Panics if `index >= len()`.
    fn doc(&self, index: usize) -> &[u8];

    /// Returns `true` if the collection holds no documents.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DocumentSource for [Vec<u8>] {
    fn len(&self) -> usize {
        <[Vec<u8>]>::len(self)
    }

    fn doc(&self, index: usize) -> &[u8] {
        &self[index]
    }
}

impl DocumentSource for Vec<Vec<u8>> {
    fn len(&self) -> usize {
        <[Vec<u8>]>::len(self)
    }

    fn doc(&self, index: usize) -> &[u8] {
        &self[index]
    }
}

impl<'a> DocumentSource for [&'a [u8]] {
    fn len(&self) -> usize {
        <[&[u8]]>::len(self)
    }

    fn doc(&self, index: usize) -> &[u8] {
        self[index]
    }
}

impl<'a> DocumentSource for Vec<&'a [u8]> {
    fn len(&self) -> usize {
        <[&[u8]]>::len(self)
    }

    fn doc(&self, index: usize) -> &[u8] {
        self[index]
    }
}

impl<T: DocumentSource + ?Sized> DocumentSource for &T {
    fn len(&self) -> usize {
        (**self).len()
    }

    fn doc(&self, index: usize) -> &[u8] {
        (**self).doc(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_source() {
        let docs = vec![b"alpha".to_vec(), b"beta".to_vec()];
        assert_eq!(DocumentSource::len(&docs), 2);
        assert_eq!(docs.doc(0), b"alpha");
        assert_eq!(docs.doc(1), b"beta");
        assert!(!DocumentSource::is_empty(&docs));
    }

    #[test]
    fn test_slice_of_slices_source() {
        let docs: Vec<&[u8]> = vec![b"one", b""];
        assert_eq!(DocumentSource::len(&docs), 2);
        assert_eq!(docs.doc(1), b"");
    }

    #[test]
    fn test_empty_source() {
        let docs: Vec<Vec<u8>> = Vec::new();
        assert!(DocumentSource::is_empty(&docs));
    }
}
