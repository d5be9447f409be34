use super::model::Transaction;

/// Pending transactions waiting to be mined, in submission order.
#[derive(Debug, Default, Clone)]
pub struct TransactionPool {
    pending: Vec<Transaction>,
}

impl TransactionPool {
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    /// Append `tx` unless a transaction with the same identity triple is
    /// already pending. Returns whether it was added.
    pub fn submit(&mut self, tx: Transaction) -> bool {
        if self.contains_duplicate(&tx) {
            return false;
        }
        self.pending.push(tx);
        true
    }

    pub fn contains_duplicate(&self, tx: &Transaction) -> bool {
        self.pending.iter().any(|p| p.same_identity(tx))
    }

    /// Drop every pending transaction for which `predicate` holds.
    /// Returns how many were removed.
    pub fn remove_matching<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&Transaction) -> bool,
    {
        let before = self.pending.len();
        self.pending.retain(|t| !predicate(t));
        before - self.pending.len()
    }

    /// Take all pending transactions, leaving the pool empty.
    pub fn drain(&mut self) -> Vec<Transaction> {
        std::mem::take(&mut self.pending)
    }

    pub fn replace(&mut self, transactions: Vec<Transaction>) {
        self.pending = transactions;
    }

    pub fn as_slice(&self) -> &[Transaction] {
        &self.pending
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
