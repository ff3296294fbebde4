// model = "claude-opus-4-5"
// created = "2026-10-18"
// modified = "2026-10-18"
// driver = "Isaac Clayton"

//! Errors returned by operations and patches.

use thiserror::Error;

use crate::hash::Hash;

/// Error produced by an application-supplied conflict resolver.
pub type ResolveError = Box<dyn std::error::Error + Send + Sync>;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong.
///
/// Every variant except [`Error::Resolve`] is a broken contract: the input was
/// malformed or anchored to a different document. Callers should not retry.
#[derive(Debug, Error)]
pub enum Error {
    #[error("operation at {offset} removing {to_remove} exceeds document length {len}")]
    OutOfRange {
        offset: usize,
        to_remove: usize,
        len: usize,
    },

    #[error("parent hash mismatch: patch expects {expected}, document is {actual}")]
    HashMismatch { expected: Hash, actual: Hash },

    #[error("operation {index} is not sorted after its predecessor")]
    Unsorted { index: usize },

    #[error("operation {index} should have been merged with its predecessor")]
    Mergeable { index: usize },

    #[error("invalid checkpoint: {0}")]
    Checkpoint(String),

    #[error("invalid hash {0:?}: expected 64 lowercase hex characters")]
    InvalidHash(String),

    #[error("malformed packed data: {0}")]
    Malformed(String),

    #[error("inverse back-reference already set")]
    InverseAlreadySet,

    #[error("conflict resolver failed: {0}")]
    Resolve(#[source] ResolveError),
}
