// model = "claude-opus-4-5"
// created = "2026-10-18"
// modified = "2026-10-18"
// driver = "Isaac Clayton"

//! Property-based tests for patch algebra and convergence.

#![cfg(feature = "random")]

use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

use converge::Config;
use converge::Operation;
use converge::Ordered;
use converge::Patch;
use converge::hash;

// =============================================================================
// Test helpers
// =============================================================================

/// Documents mixing ASCII, multibyte chars and newlines.
fn arbitrary_doc() -> impl Strategy<Value = String> {
    "[a-e é中\n]{0,40}"
}

fn random_patch(doc: &str, seed: u64, ops: usize) -> Patch {
    let mut rng = StdRng::seed_from_u64(seed);
    Patch::random(&mut rng, doc, Some(ops))
}

fn chars(doc: &str) -> usize {
    doc.chars().count()
}

// =============================================================================
// Layout
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Random patches satisfy the layout invariants against their parent.
    #[test]
    fn random_patches_are_well_formed(doc in arbitrary_doc(), seed in any::<u64>(), ops in 1usize..30) {
        let patch = random_patch(&doc, seed, ops);
        prop_assert!(patch.check(Some(chars(&doc))).is_ok());
        let applied = patch.apply(&doc, &Config::strict()).unwrap();
        prop_assert_eq!(chars(&applied) as i64, chars(&doc) as i64 + patch.length_change());
    }

    /// Folding edits into a patch one by one matches applying them in turn.
    #[test]
    fn add_operation_matches_sequential_apply(doc in arbitrary_doc(), seed in any::<u64>(), count in 1usize..20) {
        let cfg = Config::strict();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut patch = Patch::create(hash(&doc), false);
        let mut expected = doc.clone();
        for _ in 0..count {
            let op = Operation::random(&mut rng, chars(&expected));
            expected = op.apply(&expected).unwrap();
            patch.add_operation(op, &cfg).unwrap();
        }
        prop_assert_eq!(patch.apply(&doc, &cfg).unwrap(), expected);
    }
}

// =============================================================================
// Packing
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Unpacking a packed patch gives back the same operations and anchor.
    #[test]
    fn packed_form_survives_the_wire(doc in arbitrary_doc(), seed in any::<u64>(), ops in 1usize..30) {
        let patch = random_patch(&doc, seed, ops);

        let unpacked = Patch::from_obj(&patch.to_obj()).unwrap();
        prop_assert_eq!(&unpacked, &patch);
        prop_assert_eq!(unpacked.parent_hash(), patch.parent_hash());
        prop_assert_eq!(unpacked.operations(), patch.operations());

        let text = serde_json::to_string(&patch).unwrap();
        let decoded: Patch = serde_json::from_str(&text).unwrap();
        prop_assert_eq!(&decoded, &patch);
        prop_assert_eq!(decoded.parent_hash(), hash(&doc));
    }
}

// =============================================================================
// Composition and inversion
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// merge(old, new) applied once equals old then new.
    #[test]
    fn merge_equals_sequential_apply(
        doc in arbitrary_doc(),
        seed_old in any::<u64>(),
        seed_new in any::<u64>(),
        ops in 1usize..15,
    ) {
        let cfg = Config::strict();
        let old = random_patch(&doc, seed_old, ops);
        let middle = old.apply(&doc, &cfg).unwrap();
        let new = random_patch(&middle, seed_new, ops);
        let expected = new.apply(&middle, &cfg).unwrap();

        let merged = Patch::merge(&old, &new, &cfg).unwrap();
        prop_assert_eq!(merged.apply(&doc, &cfg).unwrap(), expected);
    }

    /// invert(p) undoes p.
    #[test]
    fn invert_restores_parent(doc in arbitrary_doc(), seed in any::<u64>(), ops in 1usize..30) {
        let cfg = Config::strict();
        let patch = random_patch(&doc, seed, ops);
        let applied = patch.apply(&doc, &cfg).unwrap();
        let inverse = patch.invert(&doc, &cfg).unwrap();
        prop_assert_eq!(inverse.parent_hash(), hash(&applied));
        prop_assert_eq!(inverse.apply(&applied, &cfg).unwrap(), doc);
    }

    /// A checkpoint and its inverse swap the two documents.
    #[test]
    fn checkpoint_inverse_swaps(old in arbitrary_doc(), new in arbitrary_doc()) {
        let cfg = Config::strict();
        let checkpoint = Patch::create_checkpoint(&old, &new, None, &cfg).unwrap();
        prop_assert_eq!(checkpoint.apply(&old, &cfg).unwrap(), new.clone());
        let inverse = checkpoint.invert(&old, &cfg).unwrap();
        prop_assert_eq!(inverse.apply(&new, &cfg).unwrap(), old);
    }
}

// =============================================================================
// Convergence
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    /// Both replicas end up with the same text whichever patch they saw first.
    #[test]
    fn transform_converges(
        doc in arbitrary_doc(),
        seed_a in any::<u64>(),
        seed_b in any::<u64>(),
        ops_a in 1usize..10,
        ops_b in 1usize..10,
    ) {
        let cfg = Config::strict();
        let a = random_patch(&doc, seed_a, ops_a);
        let b = random_patch(&doc, seed_b, ops_b);

        let a_doc = a.apply(&doc, &cfg).unwrap();
        let b_doc = b.apply(&doc, &cfg).unwrap();
        let b_on_a = Patch::transform(&b, &a, &doc, &Ordered, None, None, &cfg).unwrap();
        let a_on_b = Patch::transform(&a, &b, &doc, &Ordered, None, None, &cfg).unwrap();

        prop_assert_eq!(b_on_a.parent_hash(), hash(&a_doc));
        prop_assert_eq!(a_on_b.parent_hash(), hash(&b_doc));
        prop_assert_eq!(
            b_on_a.apply(&a_doc, &cfg).unwrap(),
            a_on_b.apply(&b_doc, &cfg).unwrap()
        );
    }

    /// Transforming against an inverse lands on the inverse's recorded anchor.
    #[test]
    fn transform_against_inverse_keeps_anchor(
        doc in arbitrary_doc(),
        seed_a in any::<u64>(),
        seed_b in any::<u64>(),
    ) {
        let cfg = Config::strict();
        let done = random_patch(&doc, seed_a, 5);
        let after = done.apply(&doc, &cfg).unwrap();
        let undo = done.invert(&doc, &cfg).unwrap();
        let edit = random_patch(&after, seed_b, 5);

        let rebased = Patch::transform(&edit, &undo, &after, &Ordered, None, None, &cfg).unwrap();
        prop_assert_eq!(rebased.parent_hash(), hash(&doc));
        prop_assert!(rebased.apply(&doc, &cfg).is_ok());
    }
}
