use serde::{Deserialize, Serialize};

use crate::blockchain::Block;
use crate::transaction::Transaction;

/// A transaction relayed between nodes, with every node already told about it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionGossip {
    pub nodes: Vec<String>,
    pub transaction: Transaction,
}

/// A freshly sealed block relayed between nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockGossip {
    pub nodes: Vec<String>,
    pub block: Block,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterNodes {
    pub nodes: Vec<String>,
}

/// What a peer's chain endpoint returns.
#[derive(Debug, Clone, Deserialize)]
pub struct ChainSnapshot {
    pub chain: Vec<Block>,
    pub length: usize,
}
