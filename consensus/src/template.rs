//! Candidate block construction.
//!
//! A template is signer-independent: two nodes building from the same parent
//! and pending set produce byte-identical blocks. Authorization happens
//! downstream, per signer, via [`solve`] and may diverge in raw bytes without
//! diverging in identity.

use commonware_codec::Write;
use commonware_cryptography::{
    ed25519::PrivateKey,
    sha256::{Digest, Sha256},
    Digestible, Hasher, Signer,
};
use quorate_types::{
    block_namespace, transaction::SOLUTION_HEADER, Approval, Authorization, Block, Transaction,
    MAX_BLOCK_TRANSACTIONS, NAMESPACE,
};

/// Digest over the template structure (parent, height, ordered non-coinbase
/// txids). Carried in the coinbase commitment output's canonical prefix.
pub fn commitment(parent: &Digest, height: u64, transactions: &[Transaction]) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(parent);
    hasher.update(&height.to_be_bytes());
    for transaction in transactions {
        hasher.update(&transaction.digest());
    }
    hasher.finalize()
}

/// Assemble the next candidate block: eligible transactions in ascending txid
/// order, preceded by a coinbase committing to the template. The result
/// carries no authorization.
pub fn build(
    parent: Digest,
    height: u64,
    reward_script: Vec<u8>,
    pending: Vec<Transaction>,
) -> Block {
    let mut eligible = pending;
    eligible.sort_by_key(|transaction| transaction.digest());
    eligible.dedup_by_key(|transaction| transaction.digest());
    eligible.truncate(MAX_BLOCK_TRANSACTIONS - 1);

    let commitment = commitment(&parent, height, &eligible);
    let mut transactions = Vec::with_capacity(eligible.len() + 1);
    transactions.push(Transaction::coinbase(reward_script, commitment));
    transactions.extend(eligible);

    Block::new(parent, height, transactions, Authorization::default())
}

/// Authorize a candidate with one signer's signature over its canonical
/// digest. The solution is also appended to the coinbase commitment output
/// past the canonical prefix, so full-block bytes diverge per signer while
/// the digest and coinbase txid do not.
pub fn solve(block: &Block, private: &PrivateKey) -> Block {
    let digest = block.digest();
    let signature = private.sign(&block_namespace(NAMESPACE), digest.as_ref());
    let public = private.public_key();

    let mut transactions = block.transactions.clone();
    if let Some(coinbase) = transactions.first_mut() {
        if let Some(output) = coinbase.outputs.get_mut(1) {
            output.script.extend_from_slice(&SOLUTION_HEADER);
            public.write(&mut output.script);
            signature.write(&mut output.script);
        }
    }

    let mut authorization = block.authorization.clone();
    authorization.attach(Approval { public, signature });

    let solved = Block::new(block.parent, block.height, transactions, authorization);
    debug_assert_eq!(solved.digest(), digest);
    solved
}
