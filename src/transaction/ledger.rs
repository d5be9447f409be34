use std::collections::HashMap;

use crate::error::ValidationError;

/// Account-balance ledger keyed by public-key identity.
///
/// Pure bookkeeping: sufficiency checks belong to the validator. A node keeps
/// a committed instance and works on snapshots that are either committed
/// back wholesale or dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    balances: HashMap<String, u64>,
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            balances: HashMap::new(),
        }
    }

    /// Balance of `identity`, 0 if it has never been credited.
    pub fn get(&self, identity: &str) -> u64 {
        self.balances.get(identity).copied().unwrap_or(0)
    }

    /// Whether `identity` has an entry at all (a zero balance still counts).
    pub fn contains(&self, identity: &str) -> bool {
        self.balances.contains_key(identity)
    }

    pub fn apply_credit(&mut self, identity: &str, amount: u64) -> Result<(), ValidationError> {
        let entry = self.balances.entry(identity.to_string()).or_insert(0);
        *entry = entry
            .checked_add(amount)
            .ok_or(ValidationError::BalanceOverflow { amount })?;
        Ok(())
    }

    pub fn apply_debit(&mut self, identity: &str, amount: u64) -> Result<(), ValidationError> {
        let available = self.get(identity);
        let remaining =
            available
                .checked_sub(amount)
                .ok_or(ValidationError::InsufficientBalance {
                    available,
                    requested: amount,
                })?;
        self.balances.insert(identity.to_string(), remaining);
        Ok(())
    }

    /// Independent copy to validate against.
    pub fn snapshot(&self) -> Ledger {
        self.clone()
    }

    /// Replace the authoritative contents with `snapshot`.
    pub fn commit(&mut self, snapshot: Ledger) {
        self.balances = snapshot.balances;
    }

    /// Number of identities with an entry.
    pub fn accounts(&self) -> usize {
        self.balances.len()
    }
}
