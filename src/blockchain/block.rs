use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{GENESIS_PREVIOUS_HASH, GENESIS_PROOF, GENESIS_TIMESTAMP};
use crate::transaction::Transaction;
use crate::transaction::model::CanonicalTransaction;

/// A single block in the chain. Wire order:
/// index, timestamp, transactions, proof, previous_hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// 1-based position in the chain.
    pub index: u64,
    /// Seconds since the Unix epoch (UTC), with sub-second precision.
    pub timestamp: f64,
    pub transactions: Vec<Transaction>,
    /// Proof-of-Work answer relative to the previous block's proof.
    pub proof: u64,
    pub previous_hash: String,
}

/// Hash preimage. Fields are declared in sorted order so the encoding does
/// not depend on how a block was built or which JSON map type is in use.
#[derive(Serialize)]
struct CanonicalBlock<'a> {
    index: u64,
    previous_hash: &'a str,
    proof: u64,
    timestamp: f64,
    transactions: Vec<CanonicalTransaction<'a>>,
}

impl Block {
    /// The fixed first block every node starts from.
    pub fn genesis() -> Self {
        Self {
            index: 1,
            timestamp: GENESIS_TIMESTAMP,
            transactions: Vec::new(),
            proof: GENESIS_PROOF,
            previous_hash: GENESIS_PREVIOUS_HASH.to_string(),
        }
    }

    pub fn new(
        index: u64,
        timestamp: f64,
        transactions: Vec<Transaction>,
        proof: u64,
        previous_hash: String,
    ) -> Self {
        Self {
            index,
            timestamp,
            transactions,
            proof,
            previous_hash,
        }
    }

    /// SHA-256 over the canonical JSON encoding of every field, hex encoded.
    pub fn hash(&self) -> String {
        let canonical = CanonicalBlock {
            index: self.index,
            previous_hash: &self.previous_hash,
            proof: self.proof,
            timestamp: self.timestamp,
            transactions: self.transactions.iter().map(|t| t.canonical()).collect(),
        };
        let preimage = serde_json::to_vec(&canonical).expect("serialize canonical block");
        let mut hasher = Sha256::new();
        hasher.update(&preimage);
        hex::encode(hasher.finalize())
    }

    pub fn is_genesis_shaped(&self) -> bool {
        self.index == 1
            && self.previous_hash == GENESIS_PREVIOUS_HASH
            && self.proof == GENESIS_PROOF
            && self.transactions.is_empty()
    }
}

/// Current wall-clock time in fractional Unix seconds.
pub fn now_timestamp() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}
