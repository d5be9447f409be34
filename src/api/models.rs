use log::warn;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

use crate::blockchain::{Block, Blockchain, ProofOfWork};
use crate::config::NodeConfig;
use crate::error::KeyError;
use crate::network::{PeerClient, PeerRegistry, normalize_address};
use crate::transaction::Transaction;
use crate::wallet::NodeIdentity;

/// Shared application state.
///
/// `blockchain` is the single lock covering chain, ledgers and pool; every
/// read-validate-mutate sequence holds it. Peers live behind their own lock
/// because they never take part in ledger validation.
pub struct AppState {
    pub blockchain: Mutex<Blockchain>,
    pub peers: Mutex<PeerRegistry>,
    pub identity: NodeIdentity,
    pub client: PeerClient,
    /// Our own `host:port`, as advertised to peers.
    pub address: String,
}

impl AppState {
    pub fn new(config: &NodeConfig, identity: NodeIdentity) -> Self {
        let mut registry = PeerRegistry::new();
        for peer in &config.bootstrap_peers {
            match normalize_address(peer) {
                Ok(addr) if addr == config.advertised_address => {}
                Ok(addr) => {
                    let _ = registry.register(&addr);
                }
                Err(e) => warn!("ignoring bootstrap peer: {e}"),
            }
        }

        Self {
            blockchain: Mutex::new(Blockchain::new(
                ProofOfWork::new(config.difficulty),
                config.creator_key.clone(),
            )),
            peers: Mutex::new(registry),
            identity,
            client: PeerClient::new(config.peer_timeout),
            address: config.advertised_address.clone(),
        }
    }
}

/* ---------- Chain API Models ---------- */

#[derive(Serialize)]
pub struct ChainResponse<'a> {
    pub chain: &'a [Block],
    pub length: usize,
    pub transactions: &'a [Transaction],
}

#[derive(Serialize)]
pub struct MineResponse {
    pub message: &'static str,
    pub index: u64,
    pub transactions: Vec<Transaction>,
    pub proof: u64,
    pub previous_hash: String,
    pub hash: String,
}

#[derive(Serialize)]
pub struct IdentifierResponse {
    pub address: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/* ---------- TX API Models ---------- */

#[derive(Deserialize)]
pub struct NewTxRequest {
    pub sender: String,
    pub recipient: String,
    pub amount: u64,
    pub signature: String,
}

impl NewTxRequest {
    pub fn into_transaction(self) -> Transaction {
        Transaction::new(self.sender, self.recipient, self.amount, self.signature)
    }
}

/// Boundary checks before anything reaches the ledger, for client and
/// gossiped transactions alike.
pub fn check_transaction(tx: &Transaction) -> Result<(), &'static str> {
    if tx.sender.trim().is_empty() || tx.recipient.trim().is_empty() {
        return Err("sender and recipient are required");
    }
    if tx.signature.trim().is_empty() {
        return Err("signature is required");
    }
    if tx.amount == 0 {
        return Err("amount must be > 0");
    }
    Ok(())
}

#[derive(Serialize)]
pub struct NewTxResponse {
    pub message: String,
    pub index: u64,
}

/* ---------- Wallet API Models ---------- */

#[derive(Serialize)]
pub struct NewWalletResponse {
    pub secret_key: String,
    pub public_key: String,
}

/// Sign a transaction with a client-held secret key. Without a recipient the
/// result is a coinbase minting `amount` to the key's own identity.
#[derive(Deserialize)]
pub struct SignRequest {
    pub secret_key: String,
    #[serde(default)]
    pub recipient: Option<String>,
    pub amount: u64,
}

impl SignRequest {
    pub fn into_transaction(self) -> Result<Transaction, KeyError> {
        let keys = NodeIdentity::from_secret_hex(&self.secret_key)?;
        Ok(match self.recipient {
            Some(recipient) => Transaction::transfer(&keys, recipient.trim(), self.amount),
            None => Transaction::coinbase(&keys, self.amount),
        })
    }
}

/* ---------- Node API Models ---------- */

#[derive(Serialize)]
pub struct RegisterResponse {
    pub message: &'static str,
    pub total_nodes: Vec<String>,
}

#[derive(Serialize)]
pub struct ResolveResponse {
    pub message: &'static str,
    pub replaced: bool,
    pub chain: Vec<Block>,
}

/* ---------- Read-only models ---------- */

#[derive(Serialize)]
pub struct BalanceResponse {
    pub address: String,
    pub balance: u64,
    pub pending_balance: u64,
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub height: usize,
    pub difficulty: usize,
    pub last_block_hash: String,
    pub pending_transactions: usize,
    pub accounts: usize,
    pub peers: usize,
}
