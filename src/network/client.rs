use std::time::Duration;

use log::{debug, warn};
use serde::Serialize;

use super::API_PREFIX;
use super::messages::{BlockGossip, ChainSnapshot, RegisterNodes, TransactionGossip};
use crate::blockchain::Block;
use crate::error::PeerError;

/// Default connection timeout; the request timeout comes from configuration.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// HTTP client for talking to other nodes. Cheap to clone.
#[derive(Debug, Clone)]
pub struct PeerClient {
    http: reqwest::Client,
}

impl PeerClient {
    pub fn new(timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(DEFAULT_CONNECT_TIMEOUT))
            .build()
            .unwrap_or_default();
        Self { http }
    }

    fn url(peer: &str, path: &str) -> String {
        format!("http://{peer}{API_PREFIX}{path}")
    }

    /// `GET {peer}/chain/`
    pub async fn fetch_chain(&self, peer: &str) -> Result<ChainSnapshot, PeerError> {
        let response = self
            .http
            .get(Self::url(peer, "/chain/"))
            .send()
            .await
            .map_err(|e| send_error(peer, e))?;

        if !response.status().is_success() {
            return Err(PeerError::Status {
                peer: peer.to_string(),
                status: response.status().as_u16(),
            });
        }

        response
            .json::<ChainSnapshot>()
            .await
            .map_err(|e| PeerError::Decode {
                peer: peer.to_string(),
                reason: e.to_string(),
            })
    }

    /// Fetch chains from every peer, skipping the ones that fail.
    pub async fn fetch_chains(&self, peers: &[String]) -> Vec<(String, Vec<Block>)> {
        let mut chains = Vec::with_capacity(peers.len());
        for peer in peers {
            match self.fetch_chain(peer).await {
                Ok(snapshot) => {
                    if snapshot.length != snapshot.chain.len() {
                        debug!(
                            "peer {} reported length {} for a chain of {} blocks",
                            peer,
                            snapshot.length,
                            snapshot.chain.len()
                        );
                    }
                    chains.push((peer.clone(), snapshot.chain));
                }
                Err(e) => warn!("skipping peer during resolve: {e}"),
            }
        }
        chains
    }

    pub async fn post_transaction(
        &self,
        peer: &str,
        message: &TransactionGossip,
    ) -> Result<(), PeerError> {
        self.post_json(peer, "/nodes/transactions/new/", message)
            .await
    }

    pub async fn post_block(&self, peer: &str, message: &BlockGossip) -> Result<(), PeerError> {
        self.post_json(peer, "/nodes/block/new/", message).await
    }

    /// Ask `peer` to register us back.
    pub async fn announce(&self, peer: &str, self_address: &str) -> Result<(), PeerError> {
        let body = RegisterNodes {
            nodes: vec![format!("http://{self_address}")],
        };
        self.post_json(peer, "/nodes/register/", &body).await
    }

    /// Best effort: failures are logged, never returned.
    pub async fn broadcast_transaction(&self, targets: Vec<String>, message: TransactionGossip) {
        for peer in targets {
            if let Err(e) = self.post_transaction(&peer, &message).await {
                warn!("transaction relay failed: {e}");
            }
        }
    }

    pub async fn broadcast_block(&self, targets: Vec<String>, message: BlockGossip) {
        for peer in targets {
            match self.post_block(&peer, &message).await {
                Ok(()) => debug!("block #{} relayed to {}", message.block.index, peer),
                Err(e) => warn!("block relay failed: {e}"),
            }
        }
    }

    async fn post_json<T: Serialize>(
        &self,
        peer: &str,
        path: &str,
        body: &T,
    ) -> Result<(), PeerError> {
        let response = self
            .http
            .post(Self::url(peer, path))
            .json(body)
            .send()
            .await
            .map_err(|e| send_error(peer, e))?;

        if !response.status().is_success() {
            return Err(PeerError::Status {
                peer: peer.to_string(),
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }
}

fn send_error(peer: &str, e: reqwest::Error) -> PeerError {
    let reason = if e.is_timeout() {
        format!("request timed out: {e}")
    } else if e.is_connect() {
        format!("connection failed: {e}")
    } else {
        e.to_string()
    };
    PeerError::Unreachable {
        peer: peer.to_string(),
        reason,
    }
}
