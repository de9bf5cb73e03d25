// Environment-derived settings and mock constants
use std::{env, path::PathBuf};

pub const LOCALHOST_RPC_URL: &str = "http://127.0.0.1:8899";
pub const DEVNET_RPC_URL_DEFAULT: &str = "https://api.devnet.solana.com";

/// Base fee charged by the mock coordinator per request, in SOL
pub const MOCK_VRF_BASE_FEE: &str = "0.25";
/// Fee charged by the mock coordinator per random word, in base units
pub const MOCK_VRF_GAS_PRICE_LINK: u64 = 1_000;
/// Amount credited to a fresh mock subscription, in base units (30 with 9 decimals)
pub const MOCK_VRF_SUBSCRIPTION_FUND_AMOUNT: u64 = 30_000_000_000;

/// Directory holding deployment records, one sub-directory per network
pub const DEPLOYMENTS_DIR: &str = "deployments";

pub fn devnet_rpc_url() -> String {
    env::var("DEVNET_RPC_URL").unwrap_or_else(|_| DEVNET_RPC_URL_DEFAULT.to_string())
}

pub fn localhost_rpc_url() -> String {
    env::var("LOCALHOST_RPC_URL").unwrap_or_else(|_| LOCALHOST_RPC_URL.to_string())
}

/// RPC endpoint for a named network
pub fn rpc_url(network: &str) -> String {
    match network {
        "devnet" => devnet_rpc_url(),
        _ => localhost_rpc_url(),
    }
}

/// Keypair paying for deployments. Defaults to the Solana CLI wallet.
pub fn deployer_keypair_path() -> PathBuf {
    if let Ok(path) = env::var("DEPLOYER_KEYPAIR") {
        return PathBuf::from(path);
    }
    let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".config/solana/id.json")
}

/// Compiled program and its keypair, as written by `cargo build-sbf`
pub fn program_artifact_paths(program: &str) -> (PathBuf, PathBuf) {
    let var_prefix = program.to_uppercase();
    let target_dir = env::var("PROGRAM_ARTIFACTS_DIR").unwrap_or_else(|_| "target/deploy".to_string());

    let so_path = env::var(format!("{}_PROGRAM_SO", var_prefix))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(&target_dir).join(format!("{}.so", program)));
    let keypair_path = env::var(format!("{}_PROGRAM_KEYPAIR", var_prefix))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(&target_dir).join(format!("{}-keypair.json", program)));

    (so_path, keypair_path)
}

/// Coordinator program id on devnet
pub fn devnet_vrf_coordinator() -> Option<String> {
    env::var("DEVNET_VRF_COORDINATOR").ok().filter(|value| !value.is_empty())
}

/// Subscription id on devnet
pub fn devnet_subscription_id() -> Option<String> {
    env::var("DEVNET_SUBSCRIPTION_ID").ok().filter(|value| !value.is_empty())
}

/// Bytecode verification after deploying to a public network
pub fn verify_programs() -> bool {
    env::var("VERIFY_PROGRAMS")
        .map(|value| value != "false" && value != "0")
        .unwrap_or(true)
}
