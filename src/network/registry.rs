use std::collections::{BTreeSet, HashSet};

use crate::error::PeerError;

/// Known peers, stored as `host:port`.
#[derive(Debug, Default, Clone)]
pub struct PeerRegistry {
    nodes: BTreeSet<String>,
}

/// Where a gossiped message goes next and which nodes it will report as
/// already notified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayPlan {
    pub targets: Vec<String>,
    pub notified: Vec<String>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self {
            nodes: BTreeSet::new(),
        }
    }

    /// Register `address` (`http://host:port/...` or `host:port`).
    /// Returns the normalized address and whether it was new.
    pub fn register(&mut self, address: &str) -> Result<(String, bool), PeerError> {
        let normalized = normalize_address(address)?;
        let added = self.nodes.insert(normalized.clone());
        Ok((normalized, added))
    }

    #[cfg(test)]
    pub fn contains(&self, address: &str) -> bool {
        self.nodes.contains(address)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.nodes.iter().cloned().collect()
    }

    /// Plan the relay of a message that has already reached `already_notified`.
    ///
    /// Targets are our peers missing from that set (never ourselves). The
    /// outgoing set is the union of the incoming set, all our peers and
    /// `self_address`. Peers named in the incoming set are learned, so the
    /// registry also grows from gossip.
    pub fn relay_plan(&mut self, self_address: &str, already_notified: &[String]) -> RelayPlan {
        let seen: HashSet<String> = already_notified
            .iter()
            .filter_map(|a| normalize_address(a).ok())
            .collect();

        let targets: Vec<String> = self
            .nodes
            .iter()
            .filter(|n| !seen.contains(*n) && n.as_str() != self_address)
            .cloned()
            .collect();

        for node in &seen {
            if node != self_address {
                self.nodes.insert(node.clone());
            }
        }

        let mut notified: BTreeSet<String> = seen.into_iter().collect();
        notified.extend(self.nodes.iter().cloned());
        notified.insert(self_address.to_string());

        RelayPlan {
            targets,
            notified: notified.into_iter().collect(),
        }
    }
}

/// Reduce a peer location to `host:port`, dropping scheme and path.
pub fn normalize_address(address: &str) -> Result<String, PeerError> {
    let trimmed = address.trim();
    let without_scheme = trimmed
        .strip_prefix("http://")
        .or_else(|| trimmed.strip_prefix("https://"))
        .unwrap_or(trimmed);
    let authority = without_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();

    let valid = match authority.rsplit_once(':') {
        Some((host, port)) => !host.is_empty() && port.parse::<u16>().is_ok(),
        None => false,
    };
    if !valid {
        return Err(PeerError::MalformedAddress(address.to_string()));
    }
    Ok(authority.to_string())
}
