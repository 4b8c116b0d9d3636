use std::env;

use alloy::primitives::Address;
use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::error::JudgeError;

/// Environment variable holding the address of the judging contract.
pub const CONTRACT_ADDRESS_ENV_VAR: &str = "GENLAYER_CONTRACT_ADDRESS";
/// Environment variable overriding the RPC endpoint.
pub const RPC_ENDPOINT_ENV_VAR: &str = "GENLAYER_RPC";

// Note that the binary loads this from TOML as well as from the environment, so it must be deserializable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Address of the deployed judging contract. Kept as the raw string, because a missing or malformed address
    /// is only reported when a session is first acquired.
    #[serde(default)]
    pub contract_address: Option<String>,
    /// JSON-RPC endpoint of the ledger. Defaults to the public GenLayer Studio API.
    #[serde(default = "endpoint_default")]
    pub endpoint: String,
    /// The network sessions are bound to.
    #[serde(default)]
    pub network: Network,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            contract_address: None,
            endpoint: endpoint_default(),
            network: Network::default(),
        }
    }
}

impl Config {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup. Empty values are treated as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Config {
            contract_address: lookup(CONTRACT_ADDRESS_ENV_VAR),
            endpoint: lookup(RPC_ENDPOINT_ENV_VAR).unwrap_or_else(endpoint_default),
            network: Network::default(),
        }
    }

    /// The parsed contract address.
    pub fn contract_address(&self) -> Result<Address, JudgeError> {
        let Some(raw) = self.contract_address.as_deref() else {
            return Err(JudgeError::Config(format!(
                "missing contract address, set {CONTRACT_ADDRESS_ENV_VAR} and redeploy"
            )));
        };
        parse_address(raw).ok_or_else(|| {
            JudgeError::Config(format!(
                "malformed contract address {raw:?} in {CONTRACT_ADDRESS_ENV_VAR}"
            ))
        })
    }

    pub fn validate(&self) -> Result<()> {
        self.contract_address()?;
        url::Url::parse(&self.endpoint)
            .map_err(|e| anyhow!("invalid endpoint {:?}: {e}", self.endpoint))?;
        Ok(())
    }
}

/// The chain a session talks to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Network {
    pub name: String,
    #[serde(default = "chain_id_default")]
    pub chain_id: u64,
    /// Number of validators asked to execute a new transaction.
    #[serde(default = "initial_validators_default")]
    pub initial_validators: u64,
    /// Number of leader rotations allowed before a transaction is considered undetermined.
    #[serde(default = "max_rotations_default")]
    pub max_rotations: u64,
}

impl Default for Network {
    fn default() -> Self {
        Network {
            name: "studionet".to_owned(),
            chain_id: chain_id_default(),
            initial_validators: initial_validators_default(),
            max_rotations: max_rotations_default(),
        }
    }
}

/// Parses a `0x`-prefixed, 20-byte hex address. Mixed case is accepted without checksum validation.
pub fn parse_address(raw: &str) -> Option<Address> {
    let hex = raw.trim().strip_prefix("0x")?;
    if hex.len() != 40 {
        return None;
    }
    let mut bytes = [0u8; 20];
    hex::decode_to_slice(hex, &mut bytes).ok()?;
    Some(Address::from(bytes))
}

pub fn endpoint_default() -> String {
    "https://studio.genlayer.com/api".to_owned()
}

pub fn chain_id_default() -> u64 {
    61999
}

pub fn initial_validators_default() -> u64 {
    5
}

pub fn max_rotations_default() -> u64 {
    3
}
