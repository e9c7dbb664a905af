use crate::selector::{Acceptance, Selector, Tip};
use commonware_cryptography::{sha256::Digest, Digestible};
use quorate_types::{Block, Transaction};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Per-reconciliation tally of how each peer block was resolved.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Reconciliation {
    pub adopted: usize,
    pub duplicates: usize,
    pub forks: usize,
    pub stale: usize,
}

/// A node's view of the chain: an arena of blocks indexed by
/// `(height, digest)` with the tip a pointer into it, updated only through
/// [`Selector`] transitions.
pub struct Chain {
    genesis: Digest,
    blocks: BTreeMap<(u64, Digest), Block>,
    selector: Selector,
}

impl Chain {
    pub fn new(genesis: Block) -> Self {
        let digest = genesis.digest();
        let mut selector = Selector::default();
        selector.observe(genesis.height, digest);

        let mut blocks = BTreeMap::new();
        blocks.insert((genesis.height, digest), genesis);

        Self {
            genesis: digest,
            blocks,
            selector,
        }
    }

    pub fn tip(&self) -> Tip {
        self.selector.tip().unwrap_or(Tip {
            height: 0,
            digest: self.genesis,
        })
    }

    pub fn height(&self) -> u64 {
        self.tip().height
    }

    pub fn contains(&self, height: u64, digest: &Digest) -> bool {
        self.blocks.contains_key(&(height, *digest))
    }

    pub fn get(&self, height: u64, digest: &Digest) -> Option<&Block> {
        self.blocks.get(&(height, *digest))
    }

    /// Process one authorized candidate. Accepted and forked candidates are
    /// retained in the arena; duplicates and stale candidates are dropped,
    /// keeping the locally-held bytes.
    pub fn accept(&mut self, block: Block) -> Acceptance {
        let digest = block.digest();
        let height = block.height;
        let acceptance = self.selector.observe(height, digest);
        match acceptance {
            Acceptance::Extended => {
                debug!(height, ?digest, "extended chain");
                self.blocks.insert((height, digest), block);
            }
            Acceptance::Duplicate => {
                debug!(height, "discarded signature-variant duplicate");
            }
            Acceptance::Forked => {
                warn!(height, ?digest, "divergent fork; retaining first-seen tip");
                self.blocks.entry((height, digest)).or_insert(block);
            }
            Acceptance::Stale => {
                debug!(height, "discarded stale block");
            }
        }
        acceptance
    }

    /// The canonical block at `height`, walking parent pointers from the tip.
    pub fn block_at(&self, height: u64) -> Option<&Block> {
        let tip = self.tip();
        if height > tip.height {
            return None;
        }
        let mut current = self.blocks.get(&(tip.height, tip.digest))?;
        while current.height > height {
            current = self.blocks.get(&(current.height - 1, current.parent))?;
        }
        Some(current)
    }

    /// The stored copy of a confirmed transaction, searched along the
    /// canonical chain from the tip.
    pub fn transaction(&self, txid: &Digest) -> Option<&Transaction> {
        let tip = self.tip();
        let mut current = self.blocks.get(&(tip.height, tip.digest))?;
        loop {
            if let Some(transaction) = current
                .transactions
                .iter()
                .find(|transaction| &transaction.digest() == txid)
            {
                return Some(transaction);
            }
            if current.height == 0 {
                return None;
            }
            current = self.blocks.get(&(current.height - 1, current.parent))?;
        }
    }

    /// Canonical blocks above `height`, ascending. The sync payload handed to
    /// a peer at reconnection.
    pub fn blocks_since(&self, height: u64) -> Vec<Block> {
        let tip = self.tip();
        let mut descending = Vec::new();
        let mut cursor = self.blocks.get(&(tip.height, tip.digest));
        while let Some(block) = cursor {
            if block.height <= height {
                break;
            }
            descending.push(block.clone());
            if block.height == 0 {
                break;
            }
            cursor = self.blocks.get(&(block.height - 1, block.parent));
        }
        descending.reverse();
        descending
    }

    /// Merge a disconnected peer's blocks into the local chain.
    ///
    /// Peer copies of blocks already held locally are discarded regardless of
    /// their signature-variant bytes; missing heights are adopted; genuine
    /// forks defer to the selector's tie-break. Reconciling twice against the
    /// same peer state is a no-op the second time.
    pub fn reconcile(&mut self, peer_blocks: Vec<Block>) -> Reconciliation {
        let mut peer_blocks = peer_blocks;
        peer_blocks.sort_by_key(|block| block.height);

        let mut summary = Reconciliation::default();
        for block in peer_blocks {
            if self.contains(block.height, &block.digest()) {
                summary.duplicates += 1;
                continue;
            }
            match self.accept(block) {
                Acceptance::Extended => summary.adopted += 1,
                Acceptance::Duplicate => summary.duplicates += 1,
                Acceptance::Forked => summary.forks += 1,
                Acceptance::Stale => summary.stale += 1,
            }
        }
        summary
    }
}
