// model = "claude-opus-4-5"
// created = "2026-10-18"
// modified = "2026-10-18"
// driver = "Isaac Clayton"

//! Hash-anchored patches: sorted, merge-free sets of operations.
//!
//! Layout invariants:
//!
//! 1. Operations are sorted by offset and separated by at least one untouched
//!    char. Anything closer is merged into one operation on insertion.
//! 2. Offsets are in the parent document's coordinates. Operations apply
//!    last to first, so each one lands on text the others have not moved.
//! 3. A checkpoint holds exactly one operation replacing the whole parent.
//!
//! `add_operation` takes an operation in the coordinates of the document
//! *after* the patch, which makes folding a sequence of edits into a patch
//! the same as applying them one by one.

use std::sync::OnceLock;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use serde_json::Value;

use crate::config::Config;
use crate::error::Error;
use crate::error::Result;
use crate::hash::Hash;
use crate::hash::hash;
use super::Diff;
use super::MergeContent;
use super::Resolve;
use super::Simplify;
use super::char_len;
use super::operation::Operation;
use super::operation::Rebased;

/// What a patch's write-once back-reference records.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InverseOf {
    /// The patch is a checkpoint: a baseline with nothing to undo to.
    Baseline,
    /// The patch undoes a patch with this parent hash, so applying it
    /// produces a document with this hash.
    Patch(Hash),
}

/// An ordered set of operations valid against one exact document.
///
/// Equality compares operations only; metadata is ignored.
#[derive(Clone, Debug)]
pub struct Patch {
    operations: Vec<Operation>,
    parent_hash: Hash,
    is_checkpoint: bool,
    inverse_of: OnceLock<InverseOf>,
}

impl Patch {
    /// An empty patch against the document with `parent_hash`.
    pub fn create(parent_hash: Hash, is_checkpoint: bool) -> Patch {
        let inverse_of = OnceLock::new();
        if is_checkpoint {
            let _ = inverse_of.set(InverseOf::Baseline);
        }
        return Patch {
            operations: Vec::new(),
            parent_hash,
            is_checkpoint,
            inverse_of,
        };
    }

    /// A checkpoint replacing all of `old` with `new`.
    ///
    /// A supplied `old_hash` saves hashing `old`; strict verification still
    /// checks it.
    pub fn create_checkpoint(old: &str, new: &str, old_hash: Option<Hash>, cfg: &Config<'_>) -> Result<Patch> {
        let parent_hash = match old_hash {
            Some(expected) => {
                if cfg.verify.is_strict() {
                    let actual = hash(old);
                    if actual != expected {
                        return Err(Error::HashMismatch { expected, actual });
                    }
                }
                expected
            }
            None => hash(old),
        };
        let mut patch = Patch::create(parent_hash, true);
        patch.operations.push(Operation::new(0, char_len(old), new));
        return Ok(patch);
    }

    /// A patch from `old` to `new` built by `diff`.
    pub fn from_diff<D: Diff + ?Sized>(old: &str, new: &str, diff: &D, cfg: &Config<'_>) -> Result<Patch> {
        let mut patch = Patch::create(hash(old), false);
        for op in diff.diff(old, new).into_iter().rev() {
            patch.add_operation(op, cfg)?;
        }
        if cfg.verify.is_strict() {
            patch.check(Some(char_len(old)))?;
        }
        return Ok(patch);
    }

    pub fn operations(&self) -> &[Operation] {
        return &self.operations;
    }

    pub fn parent_hash(&self) -> Hash {
        return self.parent_hash;
    }

    pub fn is_checkpoint(&self) -> bool {
        return self.is_checkpoint;
    }

    pub fn inverse_of(&self) -> Option<InverseOf> {
        return self.inverse_of.get().copied();
    }

    /// Record what this patch is the inverse of. Only the first call wins.
    pub fn set_inverse_of(&self, inverse_of: InverseOf) -> Result<()> {
        return self.inverse_of.set(inverse_of).map_err(|_| Error::InverseAlreadySet);
    }

    pub fn len(&self) -> usize {
        return self.operations.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.operations.is_empty();
    }

    /// Net change in document length.
    pub fn length_change(&self) -> i64 {
        return self.operations.iter().map(Operation::length_change).sum();
    }

    /// Validate the layout invariants, and offsets against `doc_len` if given.
    pub fn check(&self, doc_len: Option<usize>) -> Result<&Patch> {
        check_operations(&self.operations, self.is_checkpoint, doc_len)?;
        return Ok(self);
    }

    /// Fold `op`, given in the coordinates of this patch's result, into the
    /// patch. Strict verification works on a copy, so a failed check leaves
    /// the patch as it was.
    pub fn add_operation(&mut self, op: Operation, cfg: &Config<'_>) -> Result<()> {
        if !cfg.verify.is_strict() {
            insert_operation(&mut self.operations, op);
            return Ok(());
        }
        op.check(None)?;
        let mut operations = self.operations.clone();
        insert_operation(&mut operations, op);
        check_operations(&operations, self.is_checkpoint, None)?;
        self.operations = operations;
        return Ok(());
    }

    /// Compose `old` followed by `new`.
    ///
    /// Two checkpoints cancel to an empty patch. Otherwise a checkpoint on
    /// either side gives way to the other patch, whichever side it is on.
    pub fn merge(old: &Patch, new: &Patch, cfg: &Config<'_>) -> Result<Patch> {
        return match (old.is_checkpoint, new.is_checkpoint) {
            (true, true) => Ok(Patch::create(old.parent_hash, false)),
            (true, false) => Ok(new.clone()),
            (false, true) => Ok(old.clone()),
            (false, false) => {
                let mut merged = Patch::create(old.parent_hash, false);
                merged.operations = old.operations.clone();
                for op in new.operations.iter().rev() {
                    merged.add_operation(op.clone(), cfg)?;
                }
                Ok(merged)
            }
        };
    }

    /// Apply to `doc`.
    pub fn apply(&self, doc: &str, cfg: &Config<'_>) -> Result<String> {
        if cfg.verify.is_strict() {
            self.verify_parent(doc)?;
        }
        let mut doc = doc.to_string();
        for op in self.operations.iter().rev() {
            doc = op.apply(&doc)?;
        }
        return Ok(doc);
    }

    /// The patch that takes `apply(doc)` back to `doc`.
    pub fn invert(&self, doc: &str, cfg: &Config<'_>) -> Result<Patch> {
        if cfg.verify.is_strict() {
            self.verify_parent(doc)?;
        }
        let mut current = doc.to_string();
        let mut inverses = Vec::with_capacity(self.operations.len());
        for op in self.operations.iter().rev() {
            inverses.push(op.invert(&current)?);
            current = op.apply(&current)?;
        }
        inverses.reverse();

        // Inverses apply to the edited document, where everything below an
        // operation has already changed length.
        let mut delta: isize = 0;
        for (inverse, op) in inverses.iter_mut().zip(self.operations.iter()) {
            inverse.offset = inverse.offset.saturating_add_signed(delta);
            delta += op.length_change() as isize;
        }

        let mut inverse = Patch::create(hash(&current), self.is_checkpoint);
        inverse.operations = inverses;
        if !self.is_checkpoint {
            inverse.set_inverse_of(InverseOf::Patch(self.parent_hash))?;
        }
        if cfg.verify.is_strict() {
            inverse.check(Some(char_len(&current)))?;
        }
        return Ok(inverse);
    }

    /// Replay the operations through `simplifier`, dropping the ones it
    /// rejects. The result keeps this patch's parent.
    pub fn simplify<S: Simplify + ?Sized>(&self, doc: &str, simplifier: &S, cfg: &Config<'_>) -> Result<Patch> {
        if cfg.verify.is_strict() {
            self.verify_parent(doc)?;
        }
        let mut current = doc.to_string();
        let mut kept = Vec::with_capacity(self.operations.len());
        for op in self.operations.iter().rev() {
            let Some(simpler) = simplify_one(simplifier, op, &current) else {
                continue;
            };
            current = simpler.apply(&current)?;
            kept.push(simpler);
        }

        let still_checkpoint = self.is_checkpoint
            && matches!(kept.as_slice(), [op] if op.offset == 0 && op.to_remove == char_len(doc));
        let mut simplified = Patch::create(self.parent_hash, still_checkpoint);
        if still_checkpoint {
            simplified.operations = kept;
            return Ok(simplified);
        }
        for op in kept {
            simplified.add_operation(op, cfg)?;
        }
        return Ok(simplified);
    }

    /// Rewrite `to_transform` to apply after `transform_by`. Both must be
    /// anchored at `doc`.
    ///
    /// With both `merger` and `diff` supplied, the two results are merged as
    /// whole documents and diffed against `transform_by`'s result. Otherwise
    /// operations are transformed pairwise with `resolve` breaking ties. If
    /// `resolve` fails the result is an empty patch: `to_transform`'s edits
    /// are dropped and the failure is logged.
    pub fn transform<R: Resolve + ?Sized>(
        to_transform: &Patch,
        transform_by: &Patch,
        doc: &str,
        resolve: &R,
        merger: Option<&dyn MergeContent>,
        diff: Option<&dyn Diff>,
        cfg: &Config<'_>,
    ) -> Result<Patch> {
        if cfg.verify.is_strict() {
            to_transform.verify_parent(doc)?;
            transform_by.verify_parent(doc)?;
        }
        if transform_by.is_empty() {
            cfg.debug(format_args!("transform against empty patch"));
            return Ok(to_transform.clone());
        }

        let anchor = match transform_by.inverse_of() {
            Some(InverseOf::Patch(result)) => result,
            _ => hash(&transform_by.apply(doc, cfg)?),
        };
        if to_transform.is_empty() {
            cfg.debug(format_args!("nothing to transform, anchoring at {}", anchor));
            return Ok(Patch::create(anchor, false));
        }

        if let (Some(merger), Some(diff)) = (merger, diff) {
            cfg.debug(format_args!("transform by whole-document merge"));
            let ours = to_transform.apply(doc, cfg)?;
            let theirs = transform_by.apply(doc, cfg)?;
            let merged = merger.merge(&ours, &theirs, doc);
            return Patch::from_diff(&theirs, &merged, diff, cfg);
        }

        let ours = to_transform.sequence(doc);
        let theirs = transform_by.sequence(doc);
        return match transform_sequences(ours, theirs, doc, resolve) {
            Ok(transformed) => {
                let mut patch = Patch::create(anchor, false);
                for op in transformed {
                    patch.add_operation(op, cfg)?;
                }
                Ok(patch)
            }
            Err(Error::Resolve(err)) => {
                cfg.warn(format_args!(
                    "conflict resolution failed, dropping {} operations anchored at {}: {}",
                    to_transform.len(),
                    anchor,
                    err,
                ));
                Ok(Patch::create(anchor, false))
            }
            Err(err) => Err(err),
        };
    }

    /// A random patch against `doc`: `op_count` operations, 1 to 30 if not
    /// given, each folded in with `add_operation`.
    #[cfg(feature = "random")]
    pub fn random<R: rand::Rng>(rng: &mut R, doc: &str, op_count: Option<usize>) -> Patch {
        let count = op_count.unwrap_or_else(|| rng.gen_range(1..=30));
        let mut patch = Patch::create(hash(doc), false);
        let mut len = char_len(doc) as i64;
        for _ in 0..count {
            let op = Operation::random(rng, len as usize);
            len += op.length_change();
            insert_operation(&mut patch.operations, op);
        }
        return patch;
    }

    /// Pack as `[op, op, ..., parent_hash]`.
    pub fn to_obj(&self) -> Value {
        let mut packed: Vec<Value> = self.operations.iter().map(Operation::to_obj).collect();
        packed.push(Value::String(self.parent_hash.to_hex()));
        return Value::Array(packed);
    }

    /// Unpack `[op, op, ..., parent_hash]`, validating the layout.
    pub fn from_obj(value: &Value) -> Result<Patch> {
        let Some((last, packed)) = value.as_array().and_then(|a| a.split_last()) else {
            return Err(Error::Malformed(format!("expected [...operations, parentHash], got {}", value)));
        };
        let hex = last
            .as_str()
            .ok_or_else(|| Error::Malformed(format!("parent hash must be a string, got {}", last)))?;
        let parent_hash = Hash::from_hex(hex)?;
        let operations = packed
            .iter()
            .map(Operation::from_obj)
            .collect::<Result<Vec<Operation>>>()?;
        check_operations(&operations, false, None)?;
        return Ok(Patch {
            operations,
            parent_hash,
            is_checkpoint: false,
            inverse_of: OnceLock::new(),
        });
    }

    fn verify_parent(&self, doc: &str) -> Result<()> {
        let actual = hash(doc);
        if actual != self.parent_hash {
            return Err(Error::HashMismatch {
                expected: self.parent_hash,
                actual,
            });
        }
        return Ok(());
    }

    /// Operations in application order, each valid on the document left by
    /// the ones before it. An operation that rewrites all of `doc` to itself
    /// has nothing to contribute, checkpoint or not.
    fn sequence(&self, doc: &str) -> Vec<Operation> {
        let len = char_len(doc);
        return self
            .operations
            .iter()
            .rev()
            .filter(|op| !(op.offset == 0 && op.to_remove == len && op.to_insert == doc))
            .cloned()
            .collect();
    }
}

impl PartialEq for Patch {
    fn eq(&self, other: &Patch) -> bool {
        return self.operations == other.operations;
    }
}

impl Eq for Patch {}

impl Serialize for Patch {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        return self.to_obj().serialize(serializer);
    }
}

impl<'de> Deserialize<'de> for Patch {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Patch, D::Error> {
        let value = Value::deserialize(deserializer)?;
        return Patch::from_obj(&value).map_err(serde::de::Error::custom);
    }
}

/// Merge-aware insertion sort. `op` starts in the coordinates after every
/// existing operation and is walked left to right: merged into whatever it
/// touches, shifted past whatever it follows, and dropped in front of the
/// first operation it precedes.
fn insert_operation(operations: &mut Vec<Operation>, mut op: Operation) {
    if op.is_noop() {
        return;
    }
    let mut index = 0;
    while index < operations.len() {
        let existing = &operations[index];
        if existing.should_merge(&op) {
            let existing = operations.remove(index);
            match existing.merge(&op) {
                Some(merged) => op = merged,
                None => return,
            }
            continue;
        }
        match existing.rebase(&op) {
            Rebased::Before => {
                operations.insert(index, op);
                return;
            }
            Rebased::Shifted(shifted) => {
                op = shifted;
                index += 1;
            }
        }
    }
    operations.push(op);
}

fn check_operations(operations: &[Operation], is_checkpoint: bool, doc_len: Option<usize>) -> Result<()> {
    for (index, op) in operations.iter().enumerate() {
        op.check(doc_len)?;
        let Some(prev) = index.checked_sub(1).map(|i| &operations[i]) else {
            continue;
        };
        if op.offset < prev.offset {
            return Err(Error::Unsorted { index });
        }
        if op.offset <= prev.end() {
            return Err(Error::Mergeable { index });
        }
    }
    if is_checkpoint {
        let [op] = operations else {
            return Err(Error::Checkpoint(format!(
                "expected exactly one operation, found {}",
                operations.len()
            )));
        };
        if op.offset != 0 {
            return Err(Error::Checkpoint(format!("operation starts at {}, not 0", op.offset)));
        }
        if let Some(len) = doc_len {
            if op.to_remove != len {
                return Err(Error::Checkpoint(format!(
                    "removes {} chars of a {} char document",
                    op.to_remove, len
                )));
            }
        }
    }
    return Ok(());
}

fn simplify_one<S: Simplify + ?Sized>(simplifier: &S, op: &Operation, doc: &str) -> Option<Operation> {
    return simplifier.simplify(op, doc, &|op, doc| simplify_one(simplifier, op, doc));
}

/// Transform two operation sequences over the same document against each
/// other and return ours, rewritten to follow theirs.
///
/// This walks the usual OT grid: each of our operations passes through every
/// one of theirs while theirs are rewritten to follow it, so the next of ours
/// meets them in the right coordinates.
fn transform_sequences<R: Resolve + ?Sized>(
    ours: Vec<Operation>,
    mut theirs: Vec<Operation>,
    doc: &str,
    resolve: &R,
) -> Result<Vec<Operation>> {
    let mut row_doc = doc.to_string();
    let mut transformed = Vec::with_capacity(ours.len());
    for op in ours {
        let next_row_doc = op.apply(&row_doc)?;
        let mut cell_doc = row_doc;
        let mut current = Some(op);
        let mut next_theirs = Vec::with_capacity(theirs.len());
        for their in theirs {
            let Some(mine) = current.take() else {
                next_theirs.push(their);
                continue;
            };
            current = mine.transform(&cell_doc, &their, resolve)?;
            if let Some(their_next) = their.transform(&cell_doc, &mine, resolve)? {
                next_theirs.push(their_next);
            }
            cell_doc = their.apply(&cell_doc)?;
        }
        theirs = next_theirs;
        transformed.extend(current);
        row_doc = next_row_doc;
    }
    return Ok(transformed);
}
