//! Error types shared across the crate.

use thiserror::Error;

/// Result type for all fallible operations in this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by training, coding, and model persistence.
#[derive(Debug, Error)]
pub enum Error {
    /// The destination buffer is too small for the produced output.
    ///
    /// Recoverable: retry with a buffer of at least `required` bytes.
    /// Nothing has been written to the destination.
    #[error("destination capacity {capacity} too small, {required} bytes required")]
    CapacityExceeded { required: usize, capacity: usize },

    /// A model blob or compressed stream is structurally invalid: bad
    /// header, truncated data, an over-subscribed code-length table, or a
    /// decoded back-reference pointing outside the available history.
    #[error("corrupt model: {0}")]
    CorruptModel(String),

    /// Training requires at least one document in the build sample.
    #[error("empty document collection")]
    EmptyCorpus,

    /// `optimize` or model extraction was attempted before `build`.
    #[error("optimizer used before build")]
    NotBuilt,
}
