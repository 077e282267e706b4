//! Shared-dictionary compression for large collections of small, similar
//! documents.
//!
//! General-purpose compressors do poorly on short inputs: each document is
//! too small to build useful history of its own. `doczip` instead learns a
//! shared dictionary and entropy model from a sample of documents once,
//! then compresses and decompresses each document independently against
//! that frozen model.
//!
//! Training is two-pass: candidate model configurations are built from a
//! build sample, then the configuration that compresses a validation
//! sample smallest is kept. A trained [`Model`] is immutable and can be
//! shared across threads, and round-trips through an opaque blob via
//! [`Model::to_bytes`] / [`Model::from_bytes`].
//!
//! # Example
//!
//! ```
//! use doczip::train;
//!
//! let build: Vec<Vec<u8>> = vec![
//!     b"name:Alice,age:30".to_vec(),
//!     b"name:Bob,age:25".to_vec(),
//!     b"name:Carol,age:40".to_vec(),
//! ];
//! let validation: Vec<Vec<u8>> = vec![b"name:Dan,age:51".to_vec()];
//!
//! let model = train(&build, &validation).unwrap();
//! let packed = model.compress(b"name:Dave,age:22").unwrap();
//! assert_eq!(model.decompress(&packed).unwrap(), b"name:Dave,age:22");
//! ```

pub mod bits;
pub mod dict;
pub mod docs;
pub mod error;
pub mod huffman;
pub mod matcher;
pub mod model;
pub mod optimizer;
pub mod serialize;

pub use docs::DocumentSource;
pub use error::{Error, Result};
pub use model::Model;
pub use optimizer::{train, Optimizer};
