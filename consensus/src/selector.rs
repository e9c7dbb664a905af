use commonware_cryptography::sha256::Digest;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tip {
    pub height: u64,
    pub digest: Digest,
}

/// The outcome of observing an authorized candidate block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Acceptance {
    /// The candidate extends the chain and is the new tip.
    Extended,

    /// The candidate matches the current tip's canonical digest: a
    /// signature-variant duplicate. The candidate's bytes are discarded and
    /// the locally-held copy kept.
    Duplicate,

    /// Same height, different digest. The first-seen tip is retained.
    Forked,

    /// Height regression; the candidate is discarded.
    Stale,
}

/// Per-node tip selection state machine.
///
/// Two nodes that each accepted an equal-digest block at equal height
/// converge with zero reorg at reconnection: the peer's candidate lands on
/// the [`Acceptance::Duplicate`] transition, a no-op.
#[derive(Clone, Debug, Default)]
pub struct Selector {
    tip: Option<Tip>,
}

impl Selector {
    pub fn tip(&self) -> Option<Tip> {
        self.tip
    }

    pub fn observe(&mut self, height: u64, digest: Digest) -> Acceptance {
        let Some(tip) = self.tip else {
            self.tip = Some(Tip { height, digest });
            return Acceptance::Extended;
        };
        if height > tip.height {
            self.tip = Some(Tip { height, digest });
            return Acceptance::Extended;
        }
        if height == tip.height {
            if digest == tip.digest {
                return Acceptance::Duplicate;
            }
            // First-seen wins; never switch tips between same-height forks.
            return Acceptance::Forked;
        }
        Acceptance::Stale
    }
}
