pub mod api;
pub mod block;
pub mod challenge;
pub mod transaction;

pub use block::{Approval, Authorization, Block, MAX_BLOCK_TRANSACTIONS};
pub use challenge::{Challenge, ChallengeError};
pub use transaction::{Input, Output, Transaction, BLOCK_REWARD, COMMITMENT_PREFIX_LENGTH};

use commonware_cryptography::{
    sha256::{Digest, Sha256},
    Digestible, Hasher,
};
use commonware_utils::union;

pub const NAMESPACE: &[u8] = b"_QUORATE";
pub const TRANSACTION_SUFFIX: &[u8] = b"_TX";
pub const BLOCK_SUFFIX: &[u8] = b"_BLOCK";

/// Genesis message to use during initialization.
const GENESIS: &[u8] = b"quorate genesis";

#[inline]
pub fn transaction_namespace(namespace: &[u8]) -> Vec<u8> {
    union(namespace, TRANSACTION_SUFFIX)
}

#[inline]
pub fn block_namespace(namespace: &[u8]) -> Vec<u8> {
    union(namespace, BLOCK_SUFFIX)
}

/// Get the genesis block.
///
/// The genesis block carries no transactions and no authorization; it is the
/// only block exempt from challenge evaluation.
pub fn genesis_block() -> Block {
    // Use a deterministic, stable parent digest so the genesis commitment is
    // constant. (Digest does not implement Default.)
    let genesis_parent = Sha256::hash(GENESIS);
    Block::new(genesis_parent, 0, vec![], Authorization::default())
}

/// Compute the digest of the genesis block.
pub fn genesis_digest() -> Digest {
    genesis_block().digest()
}
