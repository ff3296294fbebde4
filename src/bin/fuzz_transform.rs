//! AFL fuzz harness for patch transformation
//!
//! This harness tests the properties replicas rely on:
//! 1. Convergence: two replicas exchanging concurrent patches end up equal
//! 2. Undo: a patch's inverse restores the document it was made against
//! 3. Layout: every patch stays sorted and merge-free
//!
//! Model: two replicas share a base document. Each one folds local edits into
//! a pending patch. On exchange both pending patches are transformed against
//! each other and the converged document becomes the new base.

use afl::fuzz;
use converge::{hash, Config, Operation, Ordered, Patch};

const NUM_REPLICAS: usize = 2;
const ALPHABET: [char; 6] = ['a', 'b', ' ', '\n', 'é', '中'];

/// Operation types the fuzzer can generate
#[derive(Debug, Clone, Copy)]
enum FuzzOp {
    /// Replica replaces `remove` chars at a position with `insert` chars
    Edit { replica: u8, pos_frac: u8, remove: u8, insert: u8 },
    /// Replicas swap pending patches and converge
    Exchange,
}

impl FuzzOp {
    fn from_bytes(bytes: &[u8]) -> Option<(FuzzOp, &[u8])> {
        let (&op_type, rest) = bytes.split_first()?;
        match op_type % 4 {
            0..=2 if rest.len() >= 4 => {
                let op = FuzzOp::Edit {
                    replica: rest[0] % NUM_REPLICAS as u8,
                    pos_frac: rest[1],
                    remove: rest[2] % 8,
                    insert: rest[3] % 8,
                };
                Some((op, &rest[4..]))
            }
            3 => Some((FuzzOp::Exchange, rest)),
            _ => None,
        }
    }
}

struct Replica {
    doc: String,
    pending: Patch,
}

impl Replica {
    fn new(base: &str) -> Replica {
        Replica {
            doc: base.to_string(),
            pending: Patch::create(hash(base), false),
        }
    }
}

fn exchange(base: &str, replicas: &[Replica], cfg: &Config<'_>) -> String {
    let [a, b] = replicas else {
        unreachable!("two replicas");
    };
    let b_on_a = Patch::transform(&b.pending, &a.pending, base, &Ordered, None, None, cfg).unwrap();
    let a_on_b = Patch::transform(&a.pending, &b.pending, base, &Ordered, None, None, cfg).unwrap();
    let left = b_on_a.apply(&a.doc, cfg).unwrap();
    let right = a_on_b.apply(&b.doc, cfg).unwrap();
    assert_eq!(left, right, "Convergence failure from base {:?}", base);
    left
}

fn main() {
    let cfg = Config::strict();

    fuzz!(|data: &[u8]| {
        let mut base = String::from("hello world\n");
        let mut replicas: Vec<Replica> = (0..NUM_REPLICAS).map(|_| Replica::new(&base)).collect();
        let mut remaining = data;

        while let Some((op, rest)) = FuzzOp::from_bytes(remaining) {
            remaining = rest;

            match op {
                FuzzOp::Edit { replica, pos_frac, remove, insert } => {
                    let r = &mut replicas[replica as usize];
                    let len = r.doc.chars().count();
                    let offset = pos_frac as usize * len / 256;
                    let remove = (remove as usize).min(len - offset);
                    let text: String = (0..insert)
                        .map(|i| ALPHABET[(replica.wrapping_add(i) as usize) % ALPHABET.len()])
                        .collect();
                    let edit = Operation::new(offset, remove, text);
                    r.doc = edit.apply(&r.doc).unwrap();
                    r.pending.add_operation(edit, &cfg).unwrap();
                    assert_eq!(r.pending.apply(&base, &cfg).unwrap(), r.doc, "Pending patch drifted");
                }

                FuzzOp::Exchange => {
                    for r in &replicas {
                        let undo = r.pending.invert(&base, &cfg).unwrap();
                        assert_eq!(undo.apply(&r.doc, &cfg).unwrap(), base, "Undo failure");
                    }
                    base = exchange(&base, &replicas, &cfg);
                    replicas = (0..NUM_REPLICAS).map(|_| Replica::new(&base)).collect();
                }
            }
        }

        // Final exchange and convergence check
        exchange(&base, &replicas, &cfg);
    });
}
