use std::{fs, path::Path};

use solana_sdk::{
    bpf_loader_upgradeable::{self, UpgradeableLoaderState},
    hash::{hash, Hash},
    pubkey::Pubkey,
};

use crate::{chain::ChainClient, error::DeployError};

/// SHA-256 of program bytes, ignoring the zero padding the loader appends
pub fn program_hash(bytes: &[u8]) -> Hash {
    let end = bytes.iter().rposition(|byte| *byte != 0).map_or(0, |last| last + 1);
    hash(&bytes[..end])
}

/// Compares the on-chain program bytes with a local `.so` artifact
pub fn verify_program<C: ChainClient>(chain: &mut C, program_id: &Pubkey, artifact: &Path) -> Result<(), DeployError> {
    log::info!("Verifying program {} against {}", program_id, artifact.display());

    let program_data_address = bpf_loader_upgradeable::get_program_data_address(program_id);
    let program_data = chain
        .get_account(&program_data_address)?
        .ok_or(DeployError::AccountNotFound(program_data_address))?;

    let metadata_len = UpgradeableLoaderState::size_of_programdata_metadata();
    let deployed = program_data.data.get(metadata_len..).unwrap_or_default();
    let local = fs::read(artifact)?;

    if program_hash(deployed) != program_hash(&local) {
        return Err(DeployError::VerificationFailed(*program_id));
    }

    log::info!("Program {} verified", program_id);
    Ok(())
}
