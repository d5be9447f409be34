//! Node configuration, read from the environment (and `.env` via dotenvy).

use std::env;
use std::fs;
use std::time::Duration;

use crate::blockchain::{DEFAULT_DIFFICULTY, MAX_DIFFICULTY};
use crate::error::ConfigError;
use crate::network::normalize_address;
use crate::wallet::normalize_public_key;

#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub host: String,
    pub port: u16,
    /// `host:port` other nodes use to reach us.
    pub advertised_address: String,
    pub difficulty: usize,
    /// Canonical hex public key allowed to mint without balance.
    pub creator_key: Option<String>,
    /// Hex secret key for the node identity; generated when absent.
    pub node_secret_key: Option<String>,
    pub peer_timeout: Duration,
    pub bootstrap_peers: Vec<String>,
}

impl NodeConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build a config from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let host = var("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = parse_or("PORT", var("PORT"), 8080u16)?;

        let advertised_address = match var("NODE_ADDRESS") {
            Some(addr) => normalize_address(&addr).map_err(|_| ConfigError::InvalidValue {
                name: "NODE_ADDRESS",
                value: addr,
            })?,
            None => format!("{host}:{port}"),
        };

        let difficulty = parse_or("POW_DIFFICULTY", var("POW_DIFFICULTY"), DEFAULT_DIFFICULTY)?;
        if difficulty > MAX_DIFFICULTY {
            return Err(ConfigError::InvalidValue {
                name: "POW_DIFFICULTY",
                value: difficulty.to_string(),
            });
        }

        let creator_hex = match (var("CREATOR_PUBKEY"), var("CREATOR_PUBKEY_FILE")) {
            (Some(key), _) => Some(key),
            (None, Some(path)) => Some(
                fs::read_to_string(&path)
                    .map_err(|source| ConfigError::Io { path, source })?
                    .trim()
                    .to_string(),
            ),
            (None, None) => None,
        };
        let creator_key = creator_hex
            .map(|key| {
                normalize_public_key(&key).map_err(|source| ConfigError::Key {
                    name: "CREATOR_PUBKEY",
                    source,
                })
            })
            .transpose()?;

        let timeout_secs = parse_or("PEER_TIMEOUT_SECS", var("PEER_TIMEOUT_SECS"), 5u64)?;

        let bootstrap_peers = var("PEERS")
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            host,
            port,
            advertised_address,
            difficulty,
            creator_key,
            node_secret_key: var("NODE_SECRET_KEY"),
            peer_timeout: Duration::from_secs(timeout_secs.max(1)),
            bootstrap_peers,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    name: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidValue { name, value }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::wallet::NodeIdentity;

    fn config(vars: &[(&str, &str)]) -> Result<NodeConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        NodeConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.host, "127.0.0.1");
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.advertised_address, "127.0.0.1:8080");
        assert_eq!(cfg.difficulty, 4);
        assert!(cfg.creator_key.is_none());
        assert_eq!(cfg.peer_timeout, Duration::from_secs(5));
        assert!(cfg.bootstrap_peers.is_empty());
    }

    #[test]
    fn values_are_parsed() {
        let creator = NodeIdentity::generate();
        let upper = creator.public_key_hex().to_uppercase();
        let cfg = config(&[
            ("HOST", "0.0.0.0"),
            ("PORT", "5001"),
            ("NODE_ADDRESS", "http://10.0.0.7:5001"),
            ("POW_DIFFICULTY", "3"),
            ("CREATOR_PUBKEY", upper.as_str()),
            ("PEER_TIMEOUT_SECS", "9"),
            ("PEERS", "a:1, http://b:2 ,,"),
        ])
        .unwrap();

        assert_eq!(cfg.port, 5001);
        assert_eq!(cfg.advertised_address, "10.0.0.7:5001");
        assert_eq!(cfg.difficulty, 3);
        assert_eq!(cfg.creator_key.as_deref(), Some(creator.public_key_hex()));
        assert_eq!(cfg.peer_timeout, Duration::from_secs(9));
        assert_eq!(cfg.bootstrap_peers, vec!["a:1", "http://b:2"]);
    }

    #[test]
    fn invalid_values_are_reported() {
        assert!(matches!(
            config(&[("PORT", "eighty")]),
            Err(ConfigError::InvalidValue { name: "PORT", .. })
        ));
        assert!(matches!(
            config(&[("POW_DIFFICULTY", "65")]),
            Err(ConfigError::InvalidValue {
                name: "POW_DIFFICULTY",
                ..
            })
        ));
        assert!(matches!(
            config(&[("CREATOR_PUBKEY", "abc")]),
            Err(ConfigError::Key { .. })
        ));
        assert!(matches!(
            config(&[("CREATOR_PUBKEY_FILE", "/definitely/not/here")]),
            Err(ConfigError::Io { .. })
        ));
    }
}
