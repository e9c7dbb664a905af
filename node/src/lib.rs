use commonware_codec::DecodeExt;
use commonware_cryptography::{
    ed25519::{PrivateKey, PublicKey},
    Signer,
};
use commonware_utils::{from_hex_formatted, hex};
use quorate_types::Challenge;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;
use tracing::Level;

pub mod engine;
pub mod mempool;

#[cfg(test)]
mod tests;

pub const DEFAULT_MEMPOOL_MAX_TRANSACTIONS: usize = 100_000;
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Clone, PartialEq, Eq)]
pub struct HexBytes(Vec<u8>);

impl HexBytes {
    pub fn from_hex_formatted(value: &str) -> Option<Self> {
        from_hex_formatted(value).map(Self)
    }
}

impl AsRef<[u8]> for HexBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for HexBytes {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&hex(self.as_ref()))
    }
}

impl<'de> Deserialize<'de> for HexBytes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        let bytes = from_hex_formatted(&value)
            .ok_or_else(|| serde::de::Error::custom("expected a hex string"))?;
        Ok(Self(bytes))
    }
}

/// Configuration for a federation node.
///
/// The signer set and threshold are part of node configuration rather than a
/// mutable global: every node in a federation ships the same challenge, and
/// the signer list may name keys that are not nodes.
#[derive(Deserialize, Serialize)]
pub struct Config {
    pub private_key: HexBytes,

    pub signers: Vec<String>,
    pub threshold: u32,

    pub log_level: String,
    #[serde(default = "default_mempool_max_transactions")]
    pub mempool_max_transactions: usize,
}

fn default_mempool_max_transactions() -> usize {
    DEFAULT_MEMPOOL_MAX_TRANSACTIONS
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse config {path}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("{field} must be hex: {value}")]
    InvalidHex { field: &'static str, value: String },
    #[error("{field} is invalid: {value}")]
    InvalidDecode {
        field: &'static str,
        value: String,
        #[source]
        source: commonware_codec::Error,
    },
    #[error("invalid log level: {value}")]
    InvalidLogLevel { value: String },
    #[error("threshold must be between 1 and {signers} (got {threshold})")]
    InvalidThreshold { threshold: u32, signers: usize },
    #[error("duplicate signer: {value}")]
    DuplicateSigner { value: String },
}

pub struct ValidatedConfig {
    pub signer: PrivateKey,
    pub public_key: PublicKey,
    pub challenge: Challenge,

    pub log_level: Level,
    pub mempool_max_transactions: usize,
}

impl Config {
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn validate(self) -> Result<ValidatedConfig, ConfigError> {
        let signer =
            PrivateKey::decode(self.private_key.as_ref()).map_err(|source| {
                ConfigError::InvalidDecode {
                    field: "private_key",
                    value: "<redacted>".to_string(),
                    source,
                }
            })?;
        let public_key = signer.public_key();

        let mut signers = Vec::with_capacity(self.signers.len());
        for value in &self.signers {
            let bytes = from_hex_formatted(value).ok_or_else(|| ConfigError::InvalidHex {
                field: "signers",
                value: value.clone(),
            })?;
            let public =
                PublicKey::decode(bytes.as_slice()).map_err(|source| ConfigError::InvalidDecode {
                    field: "signers",
                    value: value.clone(),
                    source,
                })?;
            if signers.contains(&public) {
                return Err(ConfigError::DuplicateSigner {
                    value: value.clone(),
                });
            }
            signers.push(public);
        }
        if self.threshold == 0 || self.threshold as usize > signers.len() {
            return Err(ConfigError::InvalidThreshold {
                threshold: self.threshold,
                signers: signers.len(),
            });
        }
        let challenge = Challenge::new(signers, self.threshold);

        let log_level = Level::from_str(&self.log_level).map_err(|_| {
            ConfigError::InvalidLogLevel {
                value: self.log_level.clone(),
            }
        })?;

        Ok(ValidatedConfig {
            signer,
            public_key,
            challenge,
            log_level,
            mempool_max_transactions: self.mempool_max_transactions,
        })
    }

    pub fn redacted_debug(&self) -> impl fmt::Debug + '_ {
        RedactedConfig(self)
    }
}

struct RedactedConfig<'a>(&'a Config);

impl fmt::Debug for RedactedConfig<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cfg = self.0;
        f.debug_struct("Config")
            .field("private_key", &"<redacted>")
            .field("signers", &cfg.signers)
            .field("threshold", &cfg.threshold)
            .field("log_level", &cfg.log_level)
            .field("mempool_max_transactions", &cfg.mempool_max_transactions)
            .finish()
    }
}
