// model = "claude-opus-4-5"
// created = "2026-10-18"
// modified = "2026-10-18"
// driver = "Isaac Clayton"

//! Operational transform over plain text.
//!
//! An [`Operation`] replaces a run of characters with new text. A [`Patch`]
//! is a sorted set of non-overlapping operations anchored to the hash of the
//! document it applies to. Two patches computed against the same document
//! can be transformed against each other so that applying them in either
//! order converges.
//!
//! Policy is injected. Whatever the application wants to happen when two
//! replicas type at the same spot lives behind [`Resolve`]; the other traits
//! here cover simplification, whole-document merging and diffing.
//!
//! All offsets and lengths count `char`s.

pub mod operation;
pub mod patch;

pub use operation::Operation;
pub use operation::Rebased;
pub use patch::InverseOf;
pub use patch::Patch;

use crate::error::ResolveError;

/// Where two concurrent operations collided.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Conflict<'a> {
    /// Start of the contested region in the shared document.
    pub offset: usize,
    /// The shared document's text in the contested region. Empty when both
    /// sides inserted at the same point.
    pub base: &'a str,
}

/// Decides the merged text when two concurrent operations insert at the same
/// anchor.
///
/// For replicas to converge the answer must not depend on which side is
/// `ours`: `resolve(a, b, c) == resolve(b, a, c)`. Tie-breaking by actor
/// belongs in the implementation.
pub trait Resolve {
    fn resolve(&self, ours: &str, theirs: &str, conflict: &Conflict<'_>) -> Result<String, ResolveError>;
}

impl<F> Resolve for F
where
    F: Fn(&str, &str, &Conflict<'_>) -> Result<String, ResolveError>,
{
    fn resolve(&self, ours: &str, theirs: &str, conflict: &Conflict<'_>) -> Result<String, ResolveError> {
        return self(ours, theirs, conflict);
    }
}

/// Resolver that keeps both texts, smaller one first. Identical texts are
/// kept once.
#[derive(Clone, Copy, Debug, Default)]
pub struct Ordered;

impl Resolve for Ordered {
    fn resolve(&self, ours: &str, theirs: &str, _conflict: &Conflict<'_>) -> Result<String, ResolveError> {
        if ours == theirs {
            return Ok(ours.to_string());
        }
        let (first, second) = if ours < theirs { (ours, theirs) } else { (theirs, ours) };
        return Ok(format!("{}{}", first, second));
    }
}

/// Rewrites an operation into a simpler equivalent, or drops it by returning
/// `None`. `recurse` runs the same simplifier on a derived operation.
pub trait Simplify {
    fn simplify(
        &self,
        op: &Operation,
        doc: &str,
        recurse: &dyn Fn(&Operation, &str) -> Option<Operation>,
    ) -> Option<Operation>;
}

impl<F> Simplify for F
where
    F: Fn(&Operation, &str, &dyn Fn(&Operation, &str) -> Option<Operation>) -> Option<Operation>,
{
    fn simplify(
        &self,
        op: &Operation,
        doc: &str,
        recurse: &dyn Fn(&Operation, &str) -> Option<Operation>,
    ) -> Option<Operation> {
        return self(op, doc, recurse);
    }
}

/// Merges two whole documents derived from `base`.
pub trait MergeContent {
    fn merge(&self, ours: &str, theirs: &str, base: &str) -> String;
}

impl<F> MergeContent for F
where
    F: Fn(&str, &str, &str) -> String,
{
    fn merge(&self, ours: &str, theirs: &str, base: &str) -> String {
        return self(ours, theirs, base);
    }
}

/// Computes the operations turning `old` into `new`.
///
/// The result uses patch layout: ascending, non-overlapping, every offset in
/// `old`'s coordinates.
pub trait Diff {
    fn diff(&self, old: &str, new: &str) -> Vec<Operation>;
}

impl<F> Diff for F
where
    F: Fn(&str, &str) -> Vec<Operation>,
{
    fn diff(&self, old: &str, new: &str) -> Vec<Operation> {
        return self(old, new);
    }
}

/// Differ producing at most one operation: everything between the common
/// prefix and the common suffix.
#[derive(Clone, Copy, Debug, Default)]
pub struct TrimDiff;

impl Diff for TrimDiff {
    fn diff(&self, old: &str, new: &str) -> Vec<Operation> {
        return match trim_common(old, new, 0) {
            Some(op) => vec![op],
            None => Vec::new(),
        };
    }
}

/// The smallest operation replacing `old` with `new`, placed at `offset`.
/// `None` when the texts are equal.
pub(crate) fn trim_common(old: &str, new: &str, offset: usize) -> Option<Operation> {
    if old == new {
        return None;
    }
    let old_chars: Vec<char> = old.chars().collect();
    let new_chars: Vec<char> = new.chars().collect();

    let prefix = old_chars
        .iter()
        .zip(new_chars.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let max_suffix = old_chars.len().min(new_chars.len()) - prefix;
    let suffix = old_chars
        .iter()
        .rev()
        .zip(new_chars.iter().rev())
        .take(max_suffix)
        .take_while(|(a, b)| a == b)
        .count();

    return Some(Operation {
        offset: offset + prefix,
        to_remove: old_chars.len() - prefix - suffix,
        to_insert: new_chars[prefix..new_chars.len() - suffix].iter().collect(),
    });
}

/// Number of chars in `s`.
pub(crate) fn char_len(s: &str) -> usize {
    return s.chars().count();
}

/// Byte index of the `chars`-th char boundary, or `None` past the end.
pub(crate) fn byte_offset(s: &str, chars: usize) -> Option<usize> {
    let mut count = 0;
    for (index, _) in s.char_indices() {
        if count == chars {
            return Some(index);
        }
        count += 1;
    }
    if count == chars {
        return Some(s.len());
    }
    return None;
}

/// The chars in `start..end`, or `None` if the range leaves the string.
pub(crate) fn char_slice(s: &str, start: usize, end: usize) -> Option<&str> {
    if start > end {
        return None;
    }
    let from = byte_offset(s, start)?;
    let to = from + byte_offset(&s[from..], end - start)?;
    return Some(&s[from..to]);
}
