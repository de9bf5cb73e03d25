use std::str::FromStr;

use solana_sdk::{commitment_config::CommitmentConfig, pubkey::Pubkey};

use crate::{constants, error::DeployError};

/// Networks the deploy scripts treat as local: mocks get deployed there
pub const DEVELOPMENT_CHAINS: [&str; 3] = ["localhost", "program-test", "test-validator"];

/// Key hash of the oracle gas lane
pub const GAS_LANE: [u8; 32] = [
    71, 78, 52, 160, 119, 223, 88, 128, 125, 190, 156, 150, 211, 192, 9, 178, 59, 60, 109, 12, 206, 67, 62, 89, 187,
    245, 179, 79, 130, 59, 197, 108,
];

pub const CALLBACK_GAS_LIMIT: u32 = 2_500_000;

const DEVNET_GENESIS_HASH: &str = "EtWTRABZaYq6iMfeYKouRu166VU2xqa1wcaWoxPkrZBG";
const DEVNET_SUBSCRIPTION_ID: u64 = 3320;

/// Chain parameters of one network
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkConfig {
    pub name: String,
    /// Genesis hash the RPC endpoint must report, unset on local chains
    pub expected_genesis_hash: Option<String>,
    pub block_confirmations: u64,
    /// Seconds between draws
    pub interval: u64,
    /// Entrance fee in SOL, parsed at deploy time
    pub unparsed_entrance_fee: String,
    pub vrf_coordinator: Option<Pubkey>,
    pub subscription_id: Option<u64>,
    pub gas_lane: [u8; 32],
    pub callback_gas_limit: u32,
}

impl NetworkConfig {
    pub fn commitment(&self) -> CommitmentConfig {
        if self.block_confirmations > 1 {
            CommitmentConfig::finalized()
        } else {
            CommitmentConfig::confirmed()
        }
    }

    pub fn is_development_chain(&self) -> bool {
        is_development_chain(&self.name)
    }

    pub fn vrf_coordinator(&self) -> Result<Pubkey, DeployError> {
        self.vrf_coordinator.ok_or_else(|| self.missing("vrf_coordinator"))
    }

    pub fn subscription_id(&self) -> Result<u64, DeployError> {
        self.subscription_id.ok_or_else(|| self.missing("subscription_id"))
    }

    fn missing(&self, field: &'static str) -> DeployError {
        DeployError::MissingConfig {
            network: self.name.clone(),
            field,
        }
    }

    fn development(name: &str) -> Self {
        Self {
            name: name.to_string(),
            expected_genesis_hash: None,
            block_confirmations: 1,
            interval: 3,
            unparsed_entrance_fee: "0.1".to_string(),
            vrf_coordinator: None,
            subscription_id: None,
            gas_lane: GAS_LANE,
            callback_gas_limit: CALLBACK_GAS_LIMIT,
        }
    }
}

pub fn is_development_chain(network: &str) -> bool {
    DEVELOPMENT_CHAINS.contains(&network)
}

/// Looks up the parameters of a named network
pub fn network_config(network: &str) -> Result<NetworkConfig, DeployError> {
    match network {
        "devnet" => {
            let vrf_coordinator = constants::devnet_vrf_coordinator()
                .map(|value| Pubkey::from_str(&value))
                .transpose()
                .map_err(|_| DeployError::MissingConfig {
                    network: network.to_string(),
                    field: "vrf_coordinator",
                })?;
            let subscription_id = match constants::devnet_subscription_id() {
                Some(value) => value
                    .parse::<u64>()
                    .map_err(|_| DeployError::MissingConfig {
                        network: network.to_string(),
                        field: "subscription_id",
                    })?,
                None => DEVNET_SUBSCRIPTION_ID,
            };

            Ok(NetworkConfig {
                name: network.to_string(),
                expected_genesis_hash: Some(DEVNET_GENESIS_HASH.to_string()),
                block_confirmations: 5,
                // ~ 3 days
                interval: 259_200,
                unparsed_entrance_fee: "0.1".to_string(),
                vrf_coordinator,
                subscription_id: Some(subscription_id),
                gas_lane: GAS_LANE,
                callback_gas_limit: CALLBACK_GAS_LIMIT,
            })
        }
        "localhost" | "program-test" | "test-validator" => Ok(NetworkConfig::development(network)),
        other => Err(DeployError::UnknownNetwork(other.to_string())),
    }
}
