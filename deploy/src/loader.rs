// Program upload over the upgradeable BPF loader
use solana_sdk::{
    bpf_loader_upgradeable::{self, UpgradeableLoaderState},
    pubkey::Pubkey,
    signature::{Keypair, Signer},
};

use crate::{chain::ChainClient, error::DeployError, network::NetworkConfig};

/// Bytes written per buffer transaction, small enough to fit one packet
const CHUNK_SIZE: usize = 900;

pub fn is_deployed<C: ChainClient>(chain: &mut C, program_id: &Pubkey) -> Result<bool, DeployError> {
    Ok(chain
        .get_account(program_id)?
        .map(|account| account.executable)
        .unwrap_or(false))
}

/// Uploads `program_data` through a fresh buffer and deploys it under the
/// program keypair. Callers check `is_deployed` first.
pub fn deploy_program<C: ChainClient>(
    chain: &mut C,
    program_keypair: &Keypair,
    program_data: &[u8],
    network: &NetworkConfig,
) -> Result<(), DeployError> {
    let program_id = program_keypair.pubkey();
    let commitment = network.commitment();
    let payer = chain.payer().pubkey();
    let buffer = Keypair::new();
    let program_len = program_data.len();

    log::info!("Uploading {} bytes for program {}", program_len, program_id);

    let buffer_lamports =
        chain.minimum_balance_for_rent_exemption(UpgradeableLoaderState::size_of_buffer(program_len))?;
    let create_buffer =
        bpf_loader_upgradeable::create_buffer(&payer, &buffer.pubkey(), &payer, buffer_lamports, program_len)?;
    chain.send_and_confirm(&create_buffer, &[&buffer], commitment)?;

    for (index, chunk) in program_data.chunks(CHUNK_SIZE).enumerate() {
        let offset = (index * CHUNK_SIZE) as u32;
        let write = bpf_loader_upgradeable::write(&buffer.pubkey(), &payer, offset, chunk.to_vec());
        chain.send_and_confirm(&[write], &[], commitment)?;
    }
    log::debug!("Wrote {} chunks to buffer {}", (program_len + CHUNK_SIZE - 1) / CHUNK_SIZE, buffer.pubkey());

    let program_lamports = chain.minimum_balance_for_rent_exemption(UpgradeableLoaderState::size_of_program())?;
    let deploy = bpf_loader_upgradeable::deploy_with_max_program_len(
        &payer,
        &program_id,
        &buffer.pubkey(),
        &payer,
        program_lamports,
        program_len * 2,
    )?;
    chain.send_and_confirm(&deploy, &[program_keypair], commitment)?;

    log::info!("Deployed program {}", program_id);
    Ok(())
}
