use serde::{Deserialize, Serialize};

use crate::wallet::NodeIdentity;

/// Sender value that marks a coinbase (minting) transaction.
pub const COINBASE_SENDER: &str = "0";

/// What a transaction does to the ledger, derived from its sender field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxKind {
    Coinbase,
    Transfer,
}

/// A signed value transfer. Wire order: sender, recipient, amount, signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Hex public key of the payer, or `"0"` for coinbase.
    pub sender: String,
    /// Hex public key of the payee.
    pub recipient: String,
    pub amount: u64,
    /// Hex-encoded DER ECDSA signature over `signing_message`.
    pub signature: String,
}

/// Sorted-key view used when a transaction is hashed as part of a block.
#[derive(Serialize)]
pub(crate) struct CanonicalTransaction<'a> {
    amount: u64,
    recipient: &'a str,
    sender: &'a str,
    signature: &'a str,
}

impl Transaction {
    pub fn new(sender: String, recipient: String, amount: u64, signature: String) -> Self {
        Self {
            sender,
            recipient,
            amount,
            signature,
        }
    }

    /// Build and sign a transaction. For a coinbase the signer must be the recipient.
    pub fn signed(keys: &NodeIdentity, sender: &str, recipient: &str, amount: u64) -> Self {
        let signature = keys.sign(&signing_message(sender, recipient, amount));
        Self::new(sender.to_string(), recipient.to_string(), amount, signature)
    }

    /// Transfer `amount` from `keys` to `recipient`.
    pub fn transfer(keys: &NodeIdentity, recipient: &str, amount: u64) -> Self {
        Self::signed(keys, keys.public_key_hex(), recipient, amount)
    }

    /// Mint `amount` to the holder of `keys`.
    pub fn coinbase(keys: &NodeIdentity, amount: u64) -> Self {
        Self::signed(keys, COINBASE_SENDER, keys.public_key_hex(), amount)
    }

    pub fn kind(&self) -> TxKind {
        if self.sender == COINBASE_SENDER {
            TxKind::Coinbase
        } else {
            TxKind::Transfer
        }
    }

    /// The public key whose signature authorizes this transaction.
    pub fn signer(&self) -> &str {
        match self.kind() {
            TxKind::Coinbase => &self.recipient,
            TxKind::Transfer => &self.sender,
        }
    }

    pub fn signing_message(&self) -> String {
        signing_message(&self.sender, &self.recipient, self.amount)
    }

    /// Dedup identity. Two transactions with the same triple are the same
    /// transaction as far as the pool is concerned, whatever their signatures.
    pub fn identity(&self) -> (&str, &str, u64) {
        (&self.sender, &self.recipient, self.amount)
    }

    pub fn same_identity(&self, other: &Transaction) -> bool {
        self.identity() == other.identity()
    }

    pub(crate) fn canonical(&self) -> CanonicalTransaction<'_> {
        CanonicalTransaction {
            amount: self.amount,
            recipient: &self.recipient,
            sender: &self.sender,
            signature: &self.signature,
        }
    }
}

/// The exact string that is hashed and signed: `sender ∥ recipient ∥ amount`.
pub fn signing_message(sender: &str, recipient: &str, amount: u64) -> String {
    format!("{sender}{recipient}{amount}")
}
