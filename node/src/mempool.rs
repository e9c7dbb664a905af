use commonware_cryptography::{sha256::Digest, Digestible};
use commonware_runtime::Metrics;
use prometheus_client::metrics::gauge::Gauge;
use quorate_types::Transaction;
use std::collections::BTreeMap;
use thiserror::Error;

/// The maximum number of transactions in the mempool.
#[cfg(test)]
const DEFAULT_MAX_TRANSACTIONS: usize = 100_000;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    /// The txid is already present. Witness variance does not make a
    /// transaction new; the stored entry is never replaced.
    #[error("txn-already-in-mempool")]
    AlreadyInMempool,
    #[error("coinbase")]
    Coinbase,
    #[error("invalid-witness")]
    InvalidWitness,
    #[error("mempool-full")]
    Full,
}

/// A mempool keyed by canonical transaction id.
///
/// Acceptance stores the submitted bytes verbatim; the first-accepted bytes
/// win for the lifetime of the entry.
pub struct Mempool {
    max_transactions: usize,
    entries: BTreeMap<Digest, Transaction>,

    unique: Gauge,
}

impl Mempool {
    /// Create a new mempool.
    #[cfg(test)]
    pub fn new(context: impl Metrics) -> Self {
        Self::new_with_limits(context, DEFAULT_MAX_TRANSACTIONS)
    }

    pub fn new_with_limits(context: impl Metrics, max_transactions: usize) -> Self {
        let unique = Gauge::default();
        context.register(
            "transactions",
            "Number of transactions in the mempool",
            unique.clone(),
        );

        Self {
            max_transactions,
            entries: BTreeMap::new(),
            unique,
        }
    }

    /// Submit a transaction. The duplicate check runs first so that a
    /// resubmission with different witness bytes reports the dedup reason,
    /// not a validation failure.
    pub fn submit(&mut self, transaction: Transaction) -> Result<Digest, SubmitError> {
        let txid = transaction.digest();
        if self.entries.contains_key(&txid) {
            return Err(SubmitError::AlreadyInMempool);
        }
        if transaction.is_coinbase() {
            return Err(SubmitError::Coinbase);
        }
        if !transaction.verify() {
            return Err(SubmitError::InvalidWitness);
        }
        if self.entries.len() >= self.max_transactions {
            return Err(SubmitError::Full);
        }

        self.entries.insert(txid, transaction);
        self.unique.set(self.entries.len() as i64);
        Ok(txid)
    }

    /// Evict entries confirmed by an accepted block.
    pub fn confirm<'a>(&mut self, txids: impl IntoIterator<Item = &'a Digest>) {
        for txid in txids {
            self.entries.remove(txid);
        }
        self.unique.set(self.entries.len() as i64);
    }

    /// The stored entry for a txid, bytes as first accepted.
    pub fn get(&self, txid: &Digest) -> Option<&Transaction> {
        self.entries.get(txid)
    }

    /// Pending transactions, for template construction.
    pub fn pending(&self) -> Vec<Transaction> {
        self.entries.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
