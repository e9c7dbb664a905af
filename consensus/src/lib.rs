//! Quorate consensus layer.
//!
//! A block is canonical once an m-of-n signer quorum has authorized it; no
//! proof-of-work is involved. The pieces here are deliberately decoupled:
//! [`template`] builds signer-independent candidate blocks, [`Selector`]
//! applies the tip transition rules, and [`Chain`] keeps the per-node block
//! arena and merges peer state at reconnection.
//!
//! ## Determinism requirements
//! - Template construction must be byte-identical across nodes given the same
//!   parent and pending set.
//! - Tip transitions must never depend on which signer subset authorized a
//!   candidate.

pub mod template;

mod chain;
mod selector;

pub use chain::{Chain, Reconciliation};
pub use selector::{Acceptance, Selector, Tip};
