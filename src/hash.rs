// model = "claude-opus-4-5"
// created = "2026-10-18"
// modified = "2026-10-18"
// driver = "Isaac Clayton"

//! Content hashes that anchor a patch to the document it was computed against.

use std::str::FromStr;

use blake3::Hasher;

use crate::error::Error;

/// A blake3 hash of a document, 32 bytes.
///
/// Rendered as 64 lowercase hex characters, which is also its wire form.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hash(pub [u8; 32]);

/// Hash a document's UTF-8 bytes.
pub fn hash(doc: &str) -> Hash {
    let mut hasher = Hasher::new();
    hasher.update(doc.as_bytes());
    let result = hasher.finalize();
    return Hash(*result.as_bytes());
}

impl Hash {
    /// Hash a document. Same as [`hash`].
    pub fn of(doc: &str) -> Hash {
        return hash(doc);
    }

    /// Parse 64 lowercase hex characters. Uppercase digits are rejected.
    pub fn from_hex(hex: &str) -> Result<Hash, Error> {
        let well_formed = hex.len() == 64
            && hex.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if !well_formed {
            return Err(Error::InvalidHash(hex.to_string()));
        }
        return blake3::Hash::from_hex(hex)
            .map(|h| Hash(*h.as_bytes()))
            .map_err(|_| Error::InvalidHash(hex.to_string()));
    }

    /// The 64-character lowercase hex form.
    pub fn to_hex(&self) -> String {
        return blake3::Hash::from_bytes(self.0).to_hex().to_string();
    }
}

impl FromStr for Hash {
    type Err = Error;

    fn from_str(s: &str) -> Result<Hash, Error> {
        return Hash::from_hex(s);
    }
}

impl std::fmt::Display for Hash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return write!(f, "{}", self.to_hex());
    }
}

impl std::fmt::Debug for Hash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return write!(f, "Hash({})", self.to_hex());
    }
}
