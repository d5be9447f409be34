pub mod ledger;
pub mod model;
pub mod pool;
pub mod validation;

pub use ledger::Ledger;
pub use model::{Transaction, TxKind};
pub use pool::TransactionPool;
pub use validation::validate_and_apply;
