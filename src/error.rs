use thiserror::Error;

/// Failures while parsing keys or signatures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("invalid hex encoding")]
    InvalidHex,
    #[error("invalid public key bytes")]
    InvalidPublicKey,
    #[error("invalid secret key bytes")]
    InvalidSecretKey,
    #[error("invalid DER signature")]
    InvalidSignature,
}

/// Why a single transaction was refused by the validator or the pool.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("recipient is not a well-formed public key")]
    MalformedRecipient,
    #[error("sender is not a well-formed public key")]
    MalformedSender,
    #[error("signature could not be decoded")]
    MalformedSignature,
    #[error("signature does not verify")]
    SignatureInvalid,
    #[error("insufficient balance: available {available}, requested {requested}")]
    InsufficientBalance { available: u64, requested: u64 },
    #[error("crediting {amount} would overflow the recipient balance")]
    BalanceOverflow { amount: u64 },
    #[error("an identical transaction is already pending")]
    Duplicate,
    #[error("an identical transaction is already sealed in the chain")]
    AlreadySealed,
    #[error("expected a coinbase transaction")]
    NotCoinbase,
}

/// Why a block (or a whole candidate chain) was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockError {
    #[error("candidate chain is empty")]
    EmptyChain,
    #[error("genesis block is malformed")]
    BadGenesis,
    #[error("expected block index {expected}, got {got}")]
    IndexMismatch { expected: u64, got: u64 },
    #[error("block {index} is timestamped before its predecessor")]
    StaleTimestamp { index: u64 },
    #[error("block {index} does not link to the hash of its predecessor")]
    ChainLinkMismatch { index: u64 },
    #[error("block {index} carries an invalid proof of work")]
    ProofInvalid { index: u64 },
    #[error("block {index}, transaction {position}: {source}")]
    Transaction {
        index: u64,
        position: usize,
        #[source]
        source: ValidationError,
    },
}

/// Peer communication failures. Always non-fatal: the peer is skipped.
#[derive(Debug, Error)]
pub enum PeerError {
    #[error("malformed peer address: {0:?}")]
    MalformedAddress(String),
    #[error("peer {peer} unreachable: {reason}")]
    Unreachable { peer: String, reason: String },
    #[error("peer {peer} answered with status {status}")]
    Status { peer: String, status: u16 },
    #[error("peer {peer} sent an undecodable body: {reason}")]
    Decode { peer: String, reason: String },
}

/// Startup configuration problems.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} has an invalid value {value:?}")]
    InvalidValue { name: &'static str, value: String },
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{name} is not a valid key: {source}")]
    Key {
        name: &'static str,
        #[source]
        source: KeyError,
    },
}
