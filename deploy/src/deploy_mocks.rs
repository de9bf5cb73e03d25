// Deploys the randomness coordinator mock on development chains
use solana_sdk::commitment_config::CommitmentConfig;
use vrf_coordinator_mock::{instruction as coordinator_instruction, pda::find_coordinator_address};

use crate::{
    chain::ChainClient,
    constants::{MOCK_VRF_BASE_FEE, MOCK_VRF_GAS_PRICE_LINK},
    deployments::Deployment,
    error::DeployError,
    units::parse_sol,
    DeployEnv,
};

pub const NAME: &str = "00_deploy_mocks";
pub const TAGS: &[&str] = &["all", "mocks"];

/// Record name of the coordinator mock
pub const DEPLOYMENT_NAME: &str = "VrfCoordinatorMock";

pub fn run<C: ChainClient>(env: &mut DeployEnv<C>) -> Result<(), DeployError> {
    if !env.network.is_development_chain() {
        return Ok(());
    }

    log::info!("Local network detected! Deploying mocks...");

    let artifacts = env.artifacts;
    let artifact = artifacts
        .vrf_coordinator_mock
        .as_ref()
        .ok_or_else(|| DeployError::MissingArtifact(DEPLOYMENT_NAME.to_string()))?;
    let program_id = env.deploy_artifact(artifact)?;
    let (coordinator_state, _) = find_coordinator_address(&program_id);

    let base_fee = parse_sol(MOCK_VRF_BASE_FEE)?;
    let mut deployment = Deployment::new(
        coordinator_state,
        program_id,
        vec![base_fee.into(), MOCK_VRF_GAS_PRICE_LINK.into()],
    );

    if env.chain.get_account(&coordinator_state)?.is_some() {
        log::info!("Reusing coordinator state {}", coordinator_state);
    } else {
        let deployer = env.deployer();
        let initialize =
            coordinator_instruction::initialize(&program_id, &deployer, base_fee, MOCK_VRF_GAS_PRICE_LINK);
        // one confirmation is enough for a local mock
        let signature = env
            .chain
            .send_and_confirm(&[initialize], &[], CommitmentConfig::confirmed())?;
        log::info!("Deployed {} at {} (tx {})", DEPLOYMENT_NAME, program_id, signature);
        deployment.transaction = Some(signature.to_string());
    }

    env.deployments.save(DEPLOYMENT_NAME, deployment);
    log::info!("--------------------------------------------");
    Ok(())
}
