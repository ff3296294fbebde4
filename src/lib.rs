// model = "claude-opus-4-5"
// created = "2026-10-18"
// modified = "2026-10-18"
// driver = "Isaac Clayton"

//! Converge - operational transform for collaborative plain-text editing.
//!
//! # Quick Start
//!
//! ```
//! use converge::Config;
//! use converge::Operation;
//! use converge::Ordered;
//! use converge::Patch;
//! use converge::hash;
//!
//! let cfg = Config::strict();
//! let doc = "hello world";
//!
//! // Two replicas edit the same document concurrently.
//! let mut a = Patch::create(hash(doc), false);
//! a.add_operation(Operation::insert(0, "foo"), &cfg).unwrap();
//! let mut b = Patch::create(hash(doc), false);
//! b.add_operation(Operation::insert(11, "bar"), &cfg).unwrap();
//!
//! // Each side rewrites the other's patch to follow its own.
//! let a_then_b = Patch::transform(&b, &a, doc, &Ordered, None, None, &cfg).unwrap();
//! let b_then_a = Patch::transform(&a, &b, doc, &Ordered, None, None, &cfg).unwrap();
//!
//! let left = a_then_b.apply(&a.apply(doc, &cfg).unwrap(), &cfg).unwrap();
//! let right = b_then_a.apply(&b.apply(doc, &cfg).unwrap(), &cfg).unwrap();
//! assert_eq!(left, "foohello worldbar");
//! assert_eq!(left, right);
//! ```

pub mod config;
pub mod error;
pub mod hash;
pub mod ot;

pub use config::Config;
pub use config::Verify;
pub use error::Error;
pub use error::Result;
pub use hash::Hash;
pub use hash::hash;
pub use ot::Conflict;
pub use ot::InverseOf;
pub use ot::Operation;
pub use ot::Ordered;
pub use ot::Patch;
pub use ot::Resolve;
pub use ot::TrimDiff;
