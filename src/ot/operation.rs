// model = "claude-opus-4-5"
// created = "2026-10-18"
// modified = "2026-10-18"
// driver = "Isaac Clayton"

//! The atomic edit: replace `to_remove` chars at `offset` with `to_insert`.
//!
//! Operations are plain values. Equality is structural and nothing refers to
//! an operation by identity.
//!
//! Two coordinate spaces show up below. An operation's *pre* space is the
//! document it applies to; its *post* space is the document after it. When
//! one operation follows another (`merge`, `rebase`) the later one is given in
//! the earlier one's post space.

use serde_json::Value;
use serde_json::json;

use crate::error::Error;
use crate::error::Result;
use super::Conflict;
use super::Resolve;
use super::byte_offset;
use super::char_len;
use super::char_slice;
use super::trim_common;

/// Replace `to_remove` chars starting at `offset` with `to_insert`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Operation {
    pub offset: usize,
    pub to_remove: usize,
    pub to_insert: String,
}

/// Outcome of [`Operation::rebase`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Rebased {
    /// The later operation ends before the earlier one starts. It belongs
    /// immediately in front of it, unchanged.
    Before,
    /// The later operation lies past the earlier one; this is its offset in
    /// the earlier operation's pre space.
    Shifted(Operation),
}

impl Operation {
    pub fn new(offset: usize, to_remove: usize, to_insert: impl Into<String>) -> Operation {
        return Operation {
            offset,
            to_remove,
            to_insert: to_insert.into(),
        };
    }

    /// A pure insertion.
    pub fn insert(offset: usize, text: impl Into<String>) -> Operation {
        return Operation::new(offset, 0, text);
    }

    /// A pure deletion.
    pub fn delete(offset: usize, len: usize) -> Operation {
        return Operation::new(offset, len, "");
    }

    /// Length of `to_insert` in chars.
    pub fn insert_len(&self) -> usize {
        return char_len(&self.to_insert);
    }

    /// One past the last removed char, in pre space.
    pub fn end(&self) -> usize {
        return self.offset + self.to_remove;
    }

    /// True if applying this changes nothing.
    pub fn is_noop(&self) -> bool {
        return self.to_remove == 0 && self.to_insert.is_empty();
    }

    /// Net change in document length.
    pub fn length_change(&self) -> i64 {
        return self.insert_len() as i64 - self.to_remove as i64;
    }

    /// Check the operation fits a document of `doc_len` chars.
    pub fn check(&self, doc_len: Option<usize>) -> Result<()> {
        let Some(end) = self.offset.checked_add(self.to_remove) else {
            return Err(self.out_of_range(usize::MAX));
        };
        if let Some(len) = doc_len {
            if end > len {
                return Err(self.out_of_range(len));
            }
        }
        return Ok(());
    }

    /// Apply to `doc`, returning the edited document.
    pub fn apply(&self, doc: &str) -> Result<String> {
        let start = byte_offset(doc, self.offset)
            .ok_or_else(|| self.out_of_range(char_len(doc)))?;
        let end = byte_offset(&doc[start..], self.to_remove)
            .map(|n| start + n)
            .ok_or_else(|| self.out_of_range(char_len(doc)))?;

        let mut out = String::with_capacity(doc.len() - (end - start) + self.to_insert.len());
        out.push_str(&doc[..start]);
        out.push_str(&self.to_insert);
        out.push_str(&doc[end..]);
        return Ok(out);
    }

    /// The operation that undoes this one. `doc` is the document *before*
    /// this operation was applied.
    pub fn invert(&self, doc: &str) -> Result<Operation> {
        let removed = char_slice(doc, self.offset, self.end())
            .ok_or_else(|| self.out_of_range(char_len(doc)))?;
        return Ok(Operation {
            offset: self.offset,
            to_remove: self.insert_len(),
            to_insert: removed.to_string(),
        });
    }

    /// True if `later` (in this operation's post space) touches or overlaps
    /// the span this operation leaves behind, so the two can be written as a
    /// single operation.
    pub fn should_merge(&self, later: &Operation) -> bool {
        return later.offset <= self.offset + self.insert_len() && later.end() >= self.offset;
    }

    /// Combine this operation with `later`, which must satisfy
    /// [`should_merge`](Self::should_merge). The result is in this
    /// operation's pre space. `None` means the pair cancels out.
    pub fn merge(&self, later: &Operation) -> Option<Operation> {
        debug_assert!(self.should_merge(later));

        let inserted: Vec<char> = self.to_insert.chars().collect();
        let start = self.offset.min(later.offset);
        let end = (self.offset + inserted.len()).max(later.end());

        // Chars of our insertion that survive on either side of `later`.
        let head = later.offset.saturating_sub(self.offset).min(inserted.len());
        let tail = later.end().saturating_sub(self.offset).min(inserted.len());

        let mut to_insert = String::with_capacity(self.to_insert.len() + later.to_insert.len());
        to_insert.extend(&inserted[..head]);
        to_insert.push_str(&later.to_insert);
        to_insert.extend(&inserted[tail..]);

        let merged = Operation {
            offset: start,
            to_remove: end - inserted.len() + self.to_remove - start,
            to_insert,
        };
        if merged.is_noop() {
            return None;
        }
        return Some(merged);
    }

    /// Move `later` (in this operation's post space) past this operation.
    /// Callers check [`should_merge`](Self::should_merge) first.
    pub fn rebase(&self, later: &Operation) -> Rebased {
        if later.end() < self.offset {
            return Rebased::Before;
        }
        let offset = (later.offset + self.to_remove).saturating_sub(self.insert_len());
        return Rebased::Shifted(Operation {
            offset,
            to_remove: later.to_remove,
            to_insert: later.to_insert.clone(),
        });
    }

    /// Rewrite this operation to apply after `concurrent`. Both start from
    /// `doc`. Returns `None` if nothing of this operation survives.
    ///
    /// Disjoint operations only shift. Overlapping ones, or two insertions at
    /// the same point, collapse into one replacement of the union of their
    /// ranges: the text of whichever starts first, then the other's. Equal
    /// starts go to `resolve`. `transform(a, b)` and `transform(b, a)`
    /// produce the same document as long as `resolve` is symmetric.
    pub fn transform<R: Resolve + ?Sized>(
        &self,
        doc: &str,
        concurrent: &Operation,
        resolve: &R,
    ) -> Result<Option<Operation>> {
        if self.is_noop() {
            return Ok(None);
        }
        if concurrent.is_noop() {
            return Ok(Some(self.clone()));
        }

        let same_point = self.to_remove == 0 && concurrent.to_remove == 0 && self.offset == concurrent.offset;
        if !same_point {
            if self.end() <= concurrent.offset {
                return Ok(Some(self.clone()));
            }
            if concurrent.end() <= self.offset {
                return Ok(Some(Operation {
                    offset: self.offset - concurrent.to_remove + concurrent.insert_len(),
                    to_remove: self.to_remove,
                    to_insert: self.to_insert.clone(),
                }));
            }
        }

        let start = self.offset.min(concurrent.offset);
        let end = self.end().max(concurrent.end());
        let out_of_range = || self.out_of_range(char_len(doc));
        let base = char_slice(doc, start, end).ok_or_else(out_of_range)?;

        let merged = if self.offset < concurrent.offset {
            format!("{}{}", self.to_insert, concurrent.to_insert)
        } else if concurrent.offset < self.offset {
            format!("{}{}", concurrent.to_insert, self.to_insert)
        } else {
            let conflict = Conflict { offset: start, base };
            resolve
                .resolve(&self.to_insert, &concurrent.to_insert, &conflict)
                .map_err(Error::Resolve)?
        };

        // The contested region as it reads once `concurrent` has applied.
        let before = char_slice(doc, start, concurrent.offset).ok_or_else(out_of_range)?;
        let after = char_slice(doc, concurrent.end(), end).ok_or_else(out_of_range)?;
        let region = format!("{}{}{}", before, concurrent.to_insert, after);

        return Ok(trim_common(&region, &merged, start));
    }

    /// A random operation against a document of `max_offset` chars. Mostly
    /// short insertions and deletions, occasionally a long one.
    #[cfg(feature = "random")]
    pub fn random<R: rand::Rng>(rng: &mut R, max_offset: usize) -> Operation {
        const ALPHABET: [char; 12] = ['a', 'b', 'c', 'd', 'e', 'o', ' ', ' ', '\n', 'é', 'ß', '中'];

        let offset = rng.gen_range(0..=max_offset);
        let room = max_offset - offset;
        let to_remove = if room == 0 || rng.gen_bool(0.5) {
            0
        } else if rng.gen_bool(0.8) {
            rng.gen_range(1..=room.min(4))
        } else {
            rng.gen_range(1..=room)
        };
        let mut insert_len = if rng.gen_bool(0.8) {
            rng.gen_range(0..=4)
        } else {
            rng.gen_range(0..=16)
        };
        if to_remove == 0 && insert_len == 0 {
            insert_len = 1;
        }
        let to_insert = (0..insert_len)
            .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())])
            .collect();
        return Operation {
            offset,
            to_remove,
            to_insert,
        };
    }

    /// Pack as `[offset, to_remove, to_insert]`.
    pub fn to_obj(&self) -> Value {
        return json!([self.offset, self.to_remove, self.to_insert]);
    }

    /// Unpack from `[offset, to_remove, to_insert]`.
    pub fn from_obj(value: &Value) -> Result<Operation> {
        let Some([offset, to_remove, to_insert]) = value.as_array().map(|a| a.as_slice()) else {
            return Err(Error::Malformed(format!("expected [offset, toRemove, toInsert], got {}", value)));
        };
        let op = Operation {
            offset: unpack_count(offset, "offset")?,
            to_remove: unpack_count(to_remove, "toRemove")?,
            to_insert: to_insert
                .as_str()
                .ok_or_else(|| Error::Malformed(format!("toInsert must be a string, got {}", to_insert)))?
                .to_string(),
        };
        op.check(None)?;
        return Ok(op);
    }

    fn out_of_range(&self, len: usize) -> Error {
        return Error::OutOfRange {
            offset: self.offset,
            to_remove: self.to_remove,
            len,
        };
    }
}

fn unpack_count(value: &Value, field: &str) -> Result<usize> {
    return value
        .as_u64()
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| Error::Malformed(format!("{} must be a non-negative integer, got {}", field, value)));
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return write!(f, "@{} -{} +{:?}", self.offset, self.to_remove, self.to_insert);
    }
}
