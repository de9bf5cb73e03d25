// Deployment tooling for the raffle and its randomness coordinator
//
// Scripts run in order and are selected by tag, the way `hardhat-deploy`
// picks files under `deploy/`. Records land in `deployments/<network>/`.

pub mod chain;
pub mod constants;
pub mod deploy_mocks;
pub mod deploy_raffle;
pub mod deployments;
pub mod error;
pub mod loader;
pub mod network;
pub mod units;
pub mod verify;

use std::{fs, path::PathBuf};

use solana_sdk::{
    pubkey::Pubkey,
    signature::{read_keypair_file, Keypair, Signer},
};

use crate::{
    chain::ChainClient,
    deployments::Deployments,
    error::DeployError,
    network::NetworkConfig,
};

/// A program that can be uploaded, or found already deployed, at `program_id`
#[derive(Debug)]
pub struct ProgramArtifact {
    pub name: String,
    pub program_id: Pubkey,
    /// Program keypair, only needed for a fresh upload
    pub keypair: Option<Keypair>,
    /// Compiled `.so`, needed for a fresh upload and for verification
    pub so_path: Option<PathBuf>,
}

impl ProgramArtifact {
    /// A program that is expected to be executable already
    pub fn preloaded(name: &str, program_id: Pubkey) -> Self {
        Self {
            name: name.to_string(),
            program_id,
            keypair: None,
            so_path: None,
        }
    }

    /// Reads the `cargo build-sbf` outputs of `name`. Returns None when the
    /// program keypair does not exist.
    pub fn from_build_output(name: &str) -> Option<Self> {
        let (so_path, keypair_path) = constants::program_artifact_paths(name);
        let keypair = match read_keypair_file(&keypair_path) {
            Ok(keypair) => keypair,
            Err(e) => {
                log::debug!("No keypair for {} at {}: {}", name, keypair_path.display(), e);
                return None;
            }
        };

        Some(Self {
            name: name.to_string(),
            program_id: keypair.pubkey(),
            keypair: Some(keypair),
            so_path: if so_path.exists() { Some(so_path) } else { None },
        })
    }
}

/// Programs known to the deploy scripts
#[derive(Debug, Default)]
pub struct Artifacts {
    pub vrf_coordinator_mock: Option<ProgramArtifact>,
    pub raffle: Option<ProgramArtifact>,
}

impl Artifacts {
    pub fn from_build_output() -> Self {
        Self {
            vrf_coordinator_mock: ProgramArtifact::from_build_output("vrf_coordinator_mock"),
            raffle: ProgramArtifact::from_build_output("raffle"),
        }
    }
}

/// What a deploy script sees: the chain, the network parameters and the records so far
pub struct DeployEnv<'a, C: ChainClient> {
    pub chain: &'a mut C,
    pub network: &'a NetworkConfig,
    pub artifacts: &'a Artifacts,
    pub deployments: &'a mut Deployments,
    /// Verify bytecode after deploying to a public network
    pub verify: bool,
}

impl<'a, C: ChainClient> DeployEnv<'a, C> {
    pub fn deployer(&self) -> Pubkey {
        self.chain.payer().pubkey()
    }

    /// Uploads the program unless it is already executable, returning its id
    pub fn deploy_artifact(&mut self, artifact: &ProgramArtifact) -> Result<Pubkey, DeployError> {
        if loader::is_deployed(&mut *self.chain, &artifact.program_id)? {
            log::info!("Reusing {} at {}", artifact.name, artifact.program_id);
            return Ok(artifact.program_id);
        }

        let missing = || DeployError::MissingArtifact(artifact.name.clone());
        let keypair = artifact.keypair.as_ref().ok_or_else(missing)?;
        let so_path = artifact.so_path.as_ref().ok_or_else(missing)?;
        let program_data = fs::read(so_path)?;

        loader::deploy_program(&mut *self.chain, keypair, &program_data, self.network)?;
        Ok(artifact.program_id)
    }
}

type ScriptFn<C> = fn(&mut DeployEnv<C>) -> Result<(), DeployError>;

/// Deploy scripts in execution order, with their tags
pub const SCRIPTS: [(&str, &[&str]); 2] = [
    (deploy_mocks::NAME, deploy_mocks::TAGS),
    (deploy_raffle::NAME, deploy_raffle::TAGS),
];

/// Names of the scripts selected by `tag`
pub fn scripts_for_tag(tag: &str) -> Vec<&'static str> {
    SCRIPTS
        .iter()
        .filter(|(_, tags)| tags.contains(&tag))
        .map(|(name, _)| *name)
        .collect()
}

fn script_fn<C: ChainClient>(name: &str) -> Option<ScriptFn<C>> {
    match name {
        deploy_mocks::NAME => Some(deploy_mocks::run::<C>),
        deploy_raffle::NAME => Some(deploy_raffle::run::<C>),
        _ => None,
    }
}

/// Fails unless the endpoint serves the chain the network expects
pub fn check_chain<C: ChainClient>(chain: &mut C, network: &NetworkConfig) -> Result<(), DeployError> {
    if let Some(expected) = &network.expected_genesis_hash {
        let actual = chain.genesis_hash()?.to_string();
        if &actual != expected {
            return Err(DeployError::WrongChain {
                network: network.name.clone(),
                expected: expected.clone(),
                actual,
            });
        }
    }
    Ok(())
}

/// Runs every script tagged with `tag`, in order, returning the names that ran
pub fn run_tags<C: ChainClient>(
    chain: &mut C,
    network: &NetworkConfig,
    artifacts: &Artifacts,
    deployments: &mut Deployments,
    tag: &str,
) -> Result<Vec<&'static str>, DeployError> {
    check_chain(chain, network)?;

    let selected = scripts_for_tag(tag);
    if selected.is_empty() {
        log::warn!("No deploy script is tagged {:?}", tag);
    }

    let mut env = DeployEnv {
        chain,
        network,
        artifacts,
        deployments,
        verify: constants::verify_programs(),
    };
    for name in &selected {
        log::debug!("Running {}", name);
        if let Some(run) = script_fn::<C>(name) {
            run(&mut env)?;
        }
    }
    Ok(selected)
}

/// Runs all scripts against a fresh record store
pub fn fixture<C: ChainClient>(
    chain: &mut C,
    network: &NetworkConfig,
    artifacts: &Artifacts,
) -> Result<Deployments, DeployError> {
    let mut deployments = Deployments::default();
    run_tags(chain, network, artifacts, &mut deployments, "all")?;
    Ok(deployments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_runs_every_script_in_order() {
        assert_eq!(scripts_for_tag("all"), vec![deploy_mocks::NAME, deploy_raffle::NAME]);
    }

    #[test]
    fn tags_select_single_scripts() {
        assert_eq!(scripts_for_tag("mocks"), vec![deploy_mocks::NAME]);
        assert_eq!(scripts_for_tag("raffle"), vec![deploy_raffle::NAME]);
        assert!(scripts_for_tag("verify").is_empty());
    }
}
