use crate::mempool::{Mempool, SubmitError};
use commonware_codec::Encode;
use commonware_cryptography::{ed25519::PublicKey, sha256::Digest, Digestible};
use commonware_runtime::Metrics;
use prometheus_client::metrics::{counter::Counter, gauge::Gauge};
use quorate_consensus::{template, Acceptance, Chain, Reconciliation, Tip};
use quorate_types::{
    api::{ChainInfo, Message, Query},
    genesis_block, Block, Challenge, ChallengeError, Transaction,
};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BlockError {
    #[error(transparent)]
    Challenge(#[from] ChallengeError),
    #[error("stale-block")]
    Stale,
}

/// One federation node.
///
/// A node is a sequential state machine: the external transport delivers
/// block, transaction, and connectivity events one at a time, and every
/// evaluation is a bounded synchronous computation. Consistency across nodes
/// comes from canonical hashing and dedup alone, never from coordination.
pub struct Node {
    challenge: Challenge,
    chain: Chain,
    mempool: Mempool,
    peers: HashSet<PublicKey>,

    height: Gauge,
    forks: Counter,
}

impl Node {
    pub fn new(
        context: impl Metrics,
        challenge: Challenge,
        mempool_max_transactions: usize,
    ) -> Self {
        let height = Gauge::default();
        let forks = Counter::default();
        context.register("height", "Canonical chain height", height.clone());
        context.register(
            "forks",
            "Divergent same-height candidates observed",
            forks.clone(),
        );
        let mempool =
            Mempool::new_with_limits(context.with_label("mempool"), mempool_max_transactions);

        let chain = Chain::new(genesis_block());
        info!(genesis = ?chain.tip().digest, "initialized chain");
        Self {
            challenge,
            chain,
            mempool,
            peers: HashSet::new(),
            height,
            forks,
        }
    }

    /// Mark a peer reachable. Reconnection is an explicit transition; any
    /// catch-up happens through [`Node::reconcile`], not a background retry.
    pub fn connect(&mut self, peer: PublicKey) -> bool {
        let added = self.peers.insert(peer);
        if added {
            debug!(peers = self.peers.len(), "peer connected");
        }
        added
    }

    pub fn disconnect(&mut self, peer: &PublicKey) -> bool {
        let removed = self.peers.remove(peer);
        if removed {
            debug!(peers = self.peers.len(), "peer disconnected");
        }
        removed
    }

    pub fn is_connected(&self, peer: &PublicKey) -> bool {
        self.peers.contains(peer)
    }

    /// Handle an authorized block. Challenge evaluation gates acceptance and
    /// never alters the candidate; failures are terminal for the candidate
    /// only.
    pub fn propagate(&mut self, block: Block) -> Result<Acceptance, BlockError> {
        self.challenge.evaluate(&block.digest(), &block.authorization)?;

        let confirmed: Vec<Digest> = block.txids().collect();
        let acceptance = self.chain.accept(block);
        match acceptance {
            Acceptance::Extended => {
                self.mempool.confirm(confirmed.iter());
                self.height.set(self.chain.height() as i64);
            }
            Acceptance::Duplicate => {}
            Acceptance::Forked => {
                self.forks.inc();
            }
            Acceptance::Stale => return Err(BlockError::Stale),
        }
        Ok(acceptance)
    }

    /// Handle a relayed transaction.
    pub fn relay(&mut self, transaction: Transaction) -> Result<Digest, SubmitError> {
        self.mempool.submit(transaction)
    }

    /// Build the next candidate block from the mempool. The result is
    /// independent of who will sign it.
    pub fn build_template(&self, reward_script: Vec<u8>) -> Block {
        let tip = self.chain.tip();
        template::build(
            tip.digest,
            tip.height + 1,
            reward_script,
            self.mempool.pending(),
        )
    }

    /// Merge a reconnected peer's blocks. Unauthorized blocks are dropped
    /// before the chain sees them; everything else follows the selector's
    /// rules, so an equivalent partition-era tip is a no-op rather than a
    /// reorg.
    pub fn reconcile(&mut self, peer_blocks: Vec<Block>) -> Reconciliation {
        let mut authorized = Vec::with_capacity(peer_blocks.len());
        for block in peer_blocks {
            if let Err(error) = self
                .challenge
                .evaluate(&block.digest(), &block.authorization)
            {
                warn!(height = block.height, %error, "dropping unauthorized peer block");
                continue;
            }
            authorized.push(block);
        }

        let confirmed: Vec<Digest> = authorized
            .iter()
            .flat_map(|block| block.txids())
            .collect();
        let summary = self.chain.reconcile(authorized);
        if summary.adopted > 0 {
            self.mempool.confirm(confirmed.iter());
            self.height.set(self.chain.height() as i64);
        }
        if summary.forks > 0 {
            self.forks.inc_by(summary.forks as u64);
        }
        summary
    }

    /// Dispatch one transport event. Rejections are terminal decisions about
    /// the delivered object and leave node state well-defined.
    pub fn deliver(&mut self, message: Message) {
        match message {
            Message::Block(block) => {
                if let Err(error) = self.propagate(block) {
                    debug!(%error, "discarded block");
                }
            }
            Message::Transaction(transaction) => {
                if let Err(error) = self.relay(transaction) {
                    debug!(%error, "rejected transaction");
                }
            }
            Message::Reconcile(blocks) => {
                self.reconcile(blocks);
            }
        }
    }

    pub fn height(&self) -> u64 {
        self.chain.height()
    }

    pub fn tip(&self) -> Tip {
        self.chain.tip()
    }

    pub fn chain_info(&self) -> ChainInfo {
        let tip = self.chain.tip();
        ChainInfo {
            height: tip.height,
            tip: tip.digest,
        }
    }

    /// Serve an inspection request, returning the encoded response.
    pub fn query(&self, query: Query) -> Option<Vec<u8>> {
        match query {
            Query::ChainInfo => Some(self.chain_info().encode().to_vec()),
            Query::RawTransaction(txid) => self.raw_transaction(&txid),
        }
    }

    /// The exact bytes this node stores for a txid, mempool first, then the
    /// canonical chain.
    pub fn raw_transaction(&self, txid: &Digest) -> Option<Vec<u8>> {
        if let Some(transaction) = self.mempool.get(txid) {
            return Some(transaction.encode().to_vec());
        }
        self.chain
            .transaction(txid)
            .map(|transaction| transaction.encode().to_vec())
    }

    pub fn block_at(&self, height: u64) -> Option<&Block> {
        self.chain.block_at(height)
    }

    pub fn block(&self, height: u64, digest: &Digest) -> Option<&Block> {
        self.chain.get(height, digest)
    }

    /// Canonical blocks above `height`, the payload for a peer sync.
    pub fn blocks_since(&self, height: u64) -> Vec<Block> {
        self.chain.blocks_since(height)
    }

    pub fn mempool_size(&self) -> usize {
        self.mempool.len()
    }
}
