// Randomness coordinator integration for the raffle program
use solana_program::{
    account_info::AccountInfo,
    entrypoint::ProgramResult,
    msg,
    program::invoke_signed,
    program_error::ProgramError,
    program_pack::Pack,
    pubkey::Pubkey,
};
use vrf_coordinator_mock::{
    instruction as coordinator_instruction,
    pda::find_coordinator_address,
    state::CoordinatorState,
};

use crate::{raffle_error::RaffleError, raffle_state::Raffle, utils::RAFFLE_SEED};

/// Accounts needed to place a randomness request on behalf of the raffle
pub struct RequestAccounts<'a, 'b> {
    pub payer: &'b AccountInfo<'a>,
    pub raffle: &'b AccountInfo<'a>,
    pub coordinator_program: &'b AccountInfo<'a>,
    pub coordinator_state: &'b AccountInfo<'a>,
    pub subscription: &'b AccountInfo<'a>,
    pub request: &'b AccountInfo<'a>,
    pub system_program: &'b AccountInfo<'a>,
}

// Ask the coordinator for random words, signing as the raffle PDA.
// Returns the id of the new request.
pub fn request_random_words(accounts: &RequestAccounts, raffle: &Raffle) -> Result<u64, ProgramError> {
    if *accounts.coordinator_program.key != raffle.vrf_coordinator {
        msg!("Coordinator program does not match the raffle configuration");
        return Err(ProgramError::IncorrectProgramId);
    }

    if accounts.coordinator_state.owner != &raffle.vrf_coordinator {
        msg!("Coordinator state not owned by the coordinator program");
        return Err(ProgramError::InvalidAccountOwner);
    }

    let coordinator = CoordinatorState::unpack(&accounts.coordinator_state.data.borrow())?;
    let request_id = coordinator.next_request_id();

    let instruction = coordinator_instruction::request_random_words(
        &raffle.vrf_coordinator,
        accounts.payer.key,
        accounts.raffle.key,
        request_id,
        raffle.gas_lane,
        raffle.subscription_id,
        raffle.request_confirmations(),
        raffle.callback_gas_limit,
        raffle.num_words(),
    );

    invoke_signed(
        &instruction,
        &[
            accounts.payer.clone(),
            accounts.raffle.clone(),
            accounts.coordinator_state.clone(),
            accounts.subscription.clone(),
            accounts.request.clone(),
            accounts.system_program.clone(),
            accounts.coordinator_program.clone(),
        ],
        &[&[RAFFLE_SEED, &[raffle.bump]]],
    )?;

    msg!("Randomness request {} submitted", request_id);
    Ok(request_id)
}

// Only the coordinator's state PDA may deliver randomness
pub fn verify_coordinator_authority(authority_info: &AccountInfo, vrf_coordinator: &Pubkey) -> ProgramResult {
    let (expected_authority, _) = find_coordinator_address(vrf_coordinator);
    if !authority_info.is_signer || *authority_info.key != expected_authority {
        msg!("Fulfillment not signed by coordinator {}", vrf_coordinator);
        return Err(RaffleError::OnlyCoordinatorCanFulfill.into());
    }
    Ok(())
}

// Get a random winner index from a random word
pub fn get_random_winner_index(random_word: [u8; 32], total_players: u64) -> u64 {
    if total_players == 0 {
        return 0;
    }

    let mut random_bytes = [0u8; 8];
    random_bytes.copy_from_slice(&random_word[0..8]);
    u64::from_le_bytes(random_bytes) % total_players
}
