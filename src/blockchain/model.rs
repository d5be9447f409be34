use log::{debug, info};

use super::block::now_timestamp;
use super::consensus::apply_block_transactions;
use super::{Block, ProofOfWork};
use crate::error::{BlockError, ValidationError};
use crate::transaction::{Ledger, Transaction, TransactionPool, TxKind, validate_and_apply};

/// In-memory chain plus everything validated against it.
///
/// `ledger` reflects the accepted chain. `tentative` is `ledger` with every
/// pending transaction applied on top; it is committed when those
/// transactions are sealed into a block by this node.
#[derive(Debug)]
pub struct Blockchain {
    chain: Vec<Block>,
    ledger: Ledger,
    tentative: Ledger,
    pool: TransactionPool,
    pow: ProofOfWork,
    creator_key: Option<String>,
}

impl Blockchain {
    /// Start from genesis. `creator_key` must be a canonical hex public key.
    pub fn new(pow: ProofOfWork, creator_key: Option<String>) -> Self {
        Self {
            chain: vec![Block::genesis()],
            ledger: Ledger::new(),
            tentative: Ledger::new(),
            pool: TransactionPool::new(),
            pow,
            creator_key,
        }
    }

    #[cfg(test)]
    pub fn with_difficulty(difficulty: usize) -> Self {
        Self::new(ProofOfWork::new(difficulty), None)
    }

    /// Return the last block in the chain.
    pub fn last_block(&self) -> &Block {
        self.chain
            .last()
            .expect("Blockchain should always have at least the genesis block")
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn pow(&self) -> ProofOfWork {
        self.pow
    }

    pub fn creator_key(&self) -> Option<&str> {
        self.creator_key.as_deref()
    }

    pub fn pending(&self) -> &[Transaction] {
        self.pool.as_slice()
    }

    /// Committed ledger (the accepted chain only).
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn balance(&self, identity: &str) -> u64 {
        self.ledger.get(identity)
    }

    /// Balance once every pending transaction is sealed.
    pub fn pending_balance(&self, identity: &str) -> u64 {
        self.tentative.get(identity)
    }

    /// Admit `tx` to the pool after validating it against the pending
    /// ledger. Returns the index of the block that will hold it.
    pub fn submit_transaction(&mut self, tx: Transaction) -> Result<u64, ValidationError> {
        if self.pool.contains_duplicate(&tx) {
            return Err(ValidationError::Duplicate);
        }
        if self.is_sealed(&tx) {
            return Err(ValidationError::AlreadySealed);
        }
        let applied = validate_and_apply(&tx, &mut self.tentative, self.creator_key.as_deref())?;
        self.pool.submit(tx);
        debug!(
            "pool accepted {:?}, now holds {} transactions",
            applied,
            self.pool.len()
        );
        Ok(self.last_block().index + 1)
    }

    /// Whether a transaction with the same identity is already in a block.
    pub fn is_sealed(&self, tx: &Transaction) -> bool {
        self.chain
            .iter()
            .flat_map(|b| b.transactions.iter())
            .any(|t| t.same_identity(tx))
    }

    /// Seal every pending transaction into a new block on top of the chain
    /// and commit the pending ledger. `proof` is trusted; callers solve it.
    pub fn new_block(&mut self, proof: u64, previous_hash: Option<String>) -> &Block {
        let last = self.last_block();
        let index = last.index + 1;
        let timestamp = now_timestamp().max(last.timestamp);
        let previous_hash = previous_hash.unwrap_or_else(|| last.hash());

        let block = Block::new(index, timestamp, self.pool.drain(), proof, previous_hash);
        self.ledger.commit(self.tentative.snapshot());
        self.chain.push(block);
        self.last_block()
    }

    /// `new_block` with this node's coinbase placed first.
    pub fn forge_block(
        &mut self,
        proof: u64,
        coinbase: Transaction,
    ) -> Result<&Block, ValidationError> {
        if coinbase.kind() != TxKind::Coinbase {
            return Err(ValidationError::NotCoinbase);
        }
        validate_and_apply(&coinbase, &mut self.tentative, self.creator_key.as_deref())?;

        let mut transactions = Vec::with_capacity(1 + self.pool.len());
        transactions.push(coinbase);
        transactions.extend(self.pool.drain());
        self.pool.replace(transactions);

        Ok(self.new_block(proof, None))
    }

    /// Validate a block proposed by a peer and append it.
    ///
    /// Transactions are checked in order against a snapshot of the committed
    /// ledger; the first failure discards the snapshot and the whole block.
    pub fn accept_block(
        &mut self,
        proof: u64,
        index: u64,
        previous_hash: String,
        timestamp: f64,
        transactions: Vec<Transaction>,
    ) -> Result<&Block, BlockError> {
        let last = self.last_block();
        let expected = last.index + 1;
        if index != expected {
            return Err(BlockError::IndexMismatch {
                expected,
                got: index,
            });
        }
        if !(timestamp >= last.timestamp) {
            return Err(BlockError::StaleTimestamp { index });
        }
        if previous_hash != last.hash() {
            return Err(BlockError::ChainLinkMismatch { index });
        }
        if !self.pow.is_valid(last.proof, proof) {
            return Err(BlockError::ProofInvalid { index });
        }

        let mut snapshot = self.ledger.snapshot();
        apply_block_transactions(
            index,
            &transactions,
            &mut snapshot,
            self.creator_key.as_deref(),
        )?;
        self.ledger.commit(snapshot);

        let included = self
            .pool
            .remove_matching(|p| transactions.iter().any(|t| t.same_identity(p)));
        self.chain
            .push(Block::new(index, timestamp, transactions, proof, previous_hash));
        let dropped = self.rebuild_pending();

        info!(
            "accepted block #{} ({} pending included, {} pending invalidated)",
            index, included, dropped
        );
        Ok(self.last_block())
    }

    /// Replay the pool against the committed ledger, keeping only
    /// transactions that still validate. Returns how many were dropped.
    pub(crate) fn rebuild_pending(&mut self) -> usize {
        if self.pool.is_empty() {
            self.tentative = self.ledger.snapshot();
            return 0;
        }

        let creator = self.creator_key.as_deref();
        let mut tentative = self.ledger.snapshot();
        let pending = self.pool.drain();
        let before = pending.len();

        let kept: Vec<Transaction> = pending
            .into_iter()
            .filter(|tx| match validate_and_apply(tx, &mut tentative, creator) {
                Ok(_) => true,
                Err(e) => {
                    debug!("dropping pending transaction: {e}");
                    false
                }
            })
            .collect();

        let dropped = before - kept.len();
        self.pool.replace(kept);
        self.tentative = tentative;
        dropped
    }

    /// Swap in an already validated chain and its ledger, then rebuild the
    /// pool on top of it.
    pub(crate) fn replace_chain(&mut self, chain: Vec<Block>, ledger: Ledger) {
        self.chain = chain;
        self.ledger.commit(ledger);

        let sealed = &self.chain;
        let already_in_chain = self.pool.remove_matching(|p| {
            sealed
                .iter()
                .flat_map(|b| b.transactions.iter())
                .any(|t| t.same_identity(p))
        });
        let dropped = self.rebuild_pending();
        debug!(
            "pool rebuilt after replacement: {} already sealed, {} invalid, {} kept",
            already_in_chain,
            dropped,
            self.pool.len()
        );
    }
}
