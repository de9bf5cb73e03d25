use std::{env, path::Path};

use anyhow::{anyhow, Context};
use raffle_deploy::{
    chain::RpcChain,
    constants::{self, DEPLOYMENTS_DIR},
    deployments::Deployments,
    network::network_config,
    run_tags, Artifacts,
};
use solana_sdk::signature::read_keypair_file;

pub fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let network_name = env::var("NETWORK").unwrap_or_else(|_| "localhost".to_string());
    let tag = env::args().nth(1).unwrap_or_else(|| "all".to_string());
    let network = network_config(&network_name)?;

    let keypair_path = constants::deployer_keypair_path();
    let deployer = read_keypair_file(&keypair_path)
        .map_err(|e| anyhow!("Cannot read deployer keypair {}: {}", keypair_path.display(), e))?;

    let url = constants::rpc_url(&network_name);
    log::info!("Deploying tag {:?} to {} via {}", tag, network_name, url);

    let mut chain = RpcChain::new(url, deployer);
    let artifacts = Artifacts::from_build_output();
    let deployments_dir = Path::new(DEPLOYMENTS_DIR);
    let mut deployments = Deployments::load(deployments_dir, &network_name)
        .with_context(|| format!("Loading deployments of {}", network_name))?;

    let ran = run_tags(&mut chain, &network, &artifacts, &mut deployments, &tag)?;
    log::info!("Ran {} script(s): {}", ran.len(), ran.join(", "));

    for path in deployments.persist(deployments_dir, &network_name)? {
        log::info!("Saved {}", path.display());
    }
    Ok(())
}
