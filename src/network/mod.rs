pub mod client;
pub mod messages;
pub mod registry;

pub use client::PeerClient;
pub use messages::{BlockGossip, RegisterNodes, TransactionGossip};
pub use registry::{PeerRegistry, RelayPlan, normalize_address};

/// Route prefix every node serves its API under.
pub const API_PREFIX: &str = "/api/v1";
