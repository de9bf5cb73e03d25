// Deploys the raffle and wires it to its randomness subscription
use raffle::{
    raffle_instruction::{self, RaffleArgs},
    raffle_state::Raffle,
    utils::find_raffle_address,
};
use serde_json::Value;
use solana_sdk::{commitment_config::CommitmentConfig, program_pack::Pack, pubkey::Pubkey};
use vrf_coordinator_mock::{instruction as coordinator_instruction, state::CoordinatorState};

use crate::{
    chain::ChainClient,
    constants::MOCK_VRF_SUBSCRIPTION_FUND_AMOUNT,
    deploy_mocks,
    deployments::Deployment,
    error::DeployError,
    units::parse_sol,
    verify::verify_program,
    DeployEnv,
};

pub const NAME: &str = "01_deploy_raffle";
pub const TAGS: &[&str] = &["all", "raffle"];

/// Record name of the raffle
pub const DEPLOYMENT_NAME: &str = "Raffle";

/// Constructor arguments in declaration order, as stored in the deployment record
pub fn raffle_args_record(args: &RaffleArgs) -> Vec<Value> {
    let gas_lane: String = args.gas_lane.iter().map(|byte| format!("{:02x}", byte)).collect();
    vec![
        args.entrance_fee.into(),
        args.interval.into(),
        args.vrf_coordinator.to_string().into(),
        format!("0x{}", gas_lane).into(),
        args.subscription_id.into(),
        args.callback_gas_limit.into(),
    ]
}

pub fn run<C: ChainClient>(env: &mut DeployEnv<C>) -> Result<(), DeployError> {
    let is_development_chain = env.network.is_development_chain();
    let commitment = env.network.commitment();

    let artifacts = env.artifacts;
    let artifact = artifacts
        .raffle
        .as_ref()
        .ok_or_else(|| DeployError::MissingArtifact(DEPLOYMENT_NAME.to_string()))?;
    let (raffle_state, _) = find_raffle_address(&artifact.program_id);

    // an initialized raffle keeps its configuration
    if let Some(account) = env.chain.get_account(&raffle_state)? {
        if account.owner == artifact.program_id {
            let raffle = Raffle::unpack(&account.data).map_err(|e| DeployError::InvalidAccountData(raffle_state, e))?;
            log::info!("Reusing {} at {}", DEPLOYMENT_NAME, raffle_state);
            let args = RaffleArgs {
                entrance_fee: raffle.entrance_fee,
                interval: raffle.interval,
                vrf_coordinator: raffle.vrf_coordinator,
                gas_lane: raffle.gas_lane,
                subscription_id: raffle.subscription_id,
                callback_gas_limit: raffle.callback_gas_limit,
            };
            env.deployments.save(
                DEPLOYMENT_NAME,
                Deployment::new(raffle_state, artifact.program_id, raffle_args_record(&args)),
            );
            // an earlier run may have stopped before the consumer was registered
            if is_development_chain {
                add_consumer(env, &raffle.vrf_coordinator, raffle.subscription_id, &raffle_state)?;
            }
            return Ok(());
        }
    }

    let (vrf_coordinator, subscription_id) = if is_development_chain {
        let mock = env.deployments.get(deploy_mocks::DEPLOYMENT_NAME)?;
        let coordinator_program = mock.program_id()?;
        let coordinator_state = mock.address()?;
        let subscription_id = create_funded_subscription(env, &coordinator_program, &coordinator_state)?;
        (coordinator_program, subscription_id)
    } else {
        (env.network.vrf_coordinator()?, env.network.subscription_id()?)
    };

    let args = RaffleArgs {
        entrance_fee: parse_sol(&env.network.unparsed_entrance_fee)?,
        interval: env.network.interval,
        vrf_coordinator,
        gas_lane: env.network.gas_lane,
        subscription_id,
        callback_gas_limit: env.network.callback_gas_limit,
    };

    let program_id = env.deploy_artifact(artifact)?;
    let deployer = env.deployer();
    let signature = env.chain.send_and_confirm(
        &[raffle_instruction::initialize_raffle(&program_id, &deployer, args.clone())],
        &[],
        commitment,
    )?;
    log::info!("Deployed {} at {} (tx {})", DEPLOYMENT_NAME, raffle_state, signature);

    let mut deployment = Deployment::new(raffle_state, program_id, raffle_args_record(&args));
    deployment.transaction = Some(signature.to_string());
    env.deployments.save(DEPLOYMENT_NAME, deployment);

    if !is_development_chain && env.verify {
        match &artifact.so_path {
            Some(so_path) => verify_program(&mut *env.chain, &program_id, so_path)?,
            None => log::warn!("No program artifact configured for {}, skipping verification", DEPLOYMENT_NAME),
        }
    }

    if is_development_chain {
        add_consumer(env, &vrf_coordinator, subscription_id, &raffle_state)?;
    }

    log::info!("------------------------------------");
    Ok(())
}

fn add_consumer<C: ChainClient>(
    env: &mut DeployEnv<C>,
    coordinator_program: &Pubkey,
    subscription_id: u64,
    raffle_state: &Pubkey,
) -> Result<(), DeployError> {
    log::info!("Adding the raffle to the mock coordinator consumers list...");
    let deployer = env.deployer();
    let add_consumer = coordinator_instruction::add_consumer(coordinator_program, &deployer, subscription_id, raffle_state);
    env.chain.send_and_confirm(&[add_consumer], &[], CommitmentConfig::confirmed())?;
    Ok(())
}

fn create_funded_subscription<C: ChainClient>(
    env: &mut DeployEnv<C>,
    coordinator_program: &Pubkey,
    coordinator_state: &Pubkey,
) -> Result<u64, DeployError> {
    let account = env
        .chain
        .get_account(coordinator_state)?
        .ok_or(DeployError::AccountNotFound(*coordinator_state))?;
    let coordinator =
        CoordinatorState::unpack(&account.data).map_err(|e| DeployError::InvalidAccountData(*coordinator_state, e))?;
    let subscription_id = coordinator.next_sub_id();

    let deployer = env.deployer();
    env.chain.send_and_confirm(
        &[coordinator_instruction::create_subscription(coordinator_program, &deployer, subscription_id)],
        &[],
        CommitmentConfig::confirmed(),
    )?;
    log::info!("Got local VRF coordinator mock subscription id {}", subscription_id);

    env.chain.send_and_confirm(
        &[coordinator_instruction::fund_subscription(
            coordinator_program,
            &deployer,
            subscription_id,
            MOCK_VRF_SUBSCRIPTION_FUND_AMOUNT,
        )],
        &[],
        CommitmentConfig::confirmed(),
    )?;
    log::info!(
        "Funded local VRF coordinator subscription with {} amount",
        MOCK_VRF_SUBSCRIPTION_FUND_AMOUNT
    );

    Ok(subscription_id)
}
