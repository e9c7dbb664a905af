use crate::{block_namespace, block::Authorization, NAMESPACE};
use commonware_cryptography::{ed25519::PublicKey, sha256::Digest, Verifier};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChallengeError {
    #[error("insufficient-signatures: {have} of {need}")]
    InsufficientSignatures { have: u32, need: u32 },
    #[error("invalid-signature")]
    InvalidSignature,
    #[error("unknown-signer")]
    UnknownSigner,
}

/// An m-of-n threshold policy gating block acceptance.
///
/// A challenge is an immutable value: evaluation is a pure function of the
/// challenge, the block's canonical digest, and the submitted authorization.
/// It never mutates the block it gates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Challenge {
    signers: Vec<PublicKey>,
    threshold: u32,
}

impl Challenge {
    pub fn new(signers: Vec<PublicKey>, threshold: u32) -> Self {
        assert!(threshold > 0);
        assert!(threshold as usize <= signers.len());
        Self { signers, threshold }
    }

    pub fn signers(&self) -> &[PublicKey] {
        &self.signers
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Accept iff at least `threshold` approvals verify against distinct
    /// members of the signer set over `digest`. Repeated approvals from one
    /// signer count once.
    pub fn evaluate(
        &self,
        digest: &Digest,
        authorization: &Authorization,
    ) -> Result<(), ChallengeError> {
        let namespace = block_namespace(NAMESPACE);
        let mut satisfied = vec![false; self.signers.len()];
        for approval in &authorization.approvals {
            let Some(index) = self
                .signers
                .iter()
                .position(|signer| signer == &approval.public)
            else {
                return Err(ChallengeError::UnknownSigner);
            };
            if !approval
                .public
                .verify(&namespace, digest.as_ref(), &approval.signature)
            {
                return Err(ChallengeError::InvalidSignature);
            }
            satisfied[index] = true;
        }

        let have = satisfied.iter().filter(|&&ok| ok).count() as u32;
        if have < self.threshold {
            return Err(ChallengeError::InsufficientSignatures {
                have,
                need: self.threshold,
            });
        }
        Ok(())
    }
}
