pub mod block;
pub mod consensus;
pub mod model;
pub mod pow;

pub use block::Block;
pub use model::Blockchain;
pub use pow::ProofOfWork;

/// Default Proof-of-Work difficulty (leading zero hex digits).
pub const DEFAULT_DIFFICULTY: usize = 4;

/// Upper bound accepted from configuration (a SHA-256 hex digest has 64 digits).
pub const MAX_DIFFICULTY: usize = 64;

/// Coinbase reward a node pays itself per mined block.
pub const MINING_REWARD: u64 = 1;

/// Genesis constants shared by every node so genesis hashes agree.
pub const GENESIS_PROOF: u64 = 100;
pub const GENESIS_PREVIOUS_HASH: &str = "1";
pub const GENESIS_TIMESTAMP: f64 = 0.0;
