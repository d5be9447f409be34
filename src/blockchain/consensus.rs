use log::{debug, info, warn};

use super::{Block, Blockchain, ProofOfWork};
use crate::error::BlockError;
use crate::transaction::{Ledger, Transaction, validate_and_apply};

/// Apply a block's transactions in document order, stopping at the first
/// failure. The caller owns `ledger` and decides whether to keep it.
pub(crate) fn apply_block_transactions(
    index: u64,
    transactions: &[Transaction],
    ledger: &mut Ledger,
    creator_key: Option<&str>,
) -> Result<(), BlockError> {
    for (position, tx) in transactions.iter().enumerate() {
        validate_and_apply(tx, ledger, creator_key).map_err(|source| {
            BlockError::Transaction {
                index,
                position,
                source,
            }
        })?;
    }
    Ok(())
}

/// Fully re-validate an untrusted chain from genesis.
///
/// Checks genesis shape, index continuity, hash links and proof-of-work for
/// every consecutive pair, and replays every transaction against a fresh
/// ledger. Returns that ledger if the whole chain holds up.
pub fn valid_chain(
    chain: &[Block],
    pow: &ProofOfWork,
    creator_key: Option<&str>,
) -> Result<Ledger, BlockError> {
    let genesis = chain.first().ok_or(BlockError::EmptyChain)?;
    if !genesis.is_genesis_shaped() {
        return Err(BlockError::BadGenesis);
    }

    let mut ledger = Ledger::new();
    for pair in chain.windows(2) {
        let (prev, block) = (&pair[0], &pair[1]);

        if prev.index.checked_add(1) != Some(block.index) {
            return Err(BlockError::IndexMismatch {
                expected: prev.index.saturating_add(1),
                got: block.index,
            });
        }
        if block.previous_hash != prev.hash() {
            return Err(BlockError::ChainLinkMismatch { index: block.index });
        }
        if !pow.is_valid(prev.proof, block.proof) {
            return Err(BlockError::ProofInvalid { index: block.index });
        }
        apply_block_transactions(block.index, &block.transactions, &mut ledger, creator_key)?;
    }
    Ok(ledger)
}

impl Blockchain {
    /// Longest-valid-chain fork choice.
    ///
    /// Only candidates strictly longer than the best seen so far are
    /// validated. If one survives, it replaces the local chain and ledger and
    /// the pool is replayed on top. Returns whether a replacement happened.
    pub fn resolve<I>(&mut self, candidates: I) -> bool
    where
        I: IntoIterator<Item = (String, Vec<Block>)>,
    {
        let mut max_length = self.len();
        let mut best: Option<(String, Vec<Block>, Ledger)> = None;

        for (peer, chain) in candidates {
            if chain.len() <= max_length {
                debug!(
                    "chain from {} (length {}) is not longer than {}",
                    peer,
                    chain.len(),
                    max_length
                );
                continue;
            }
            match valid_chain(&chain, &self.pow(), self.creator_key()) {
                Ok(ledger) => {
                    max_length = chain.len();
                    best = Some((peer, chain, ledger));
                }
                Err(e) => warn!("rejecting chain from {}: {}", peer, e),
            }
        }

        let Some((peer, chain, ledger)) = best else {
            return false;
        };
        info!(
            "replacing local chain (length {}) with chain from {} (length {})",
            self.len(),
            peer,
            chain.len()
        );
        self.replace_chain(chain, ledger);
        true
    }
}
