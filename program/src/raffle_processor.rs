use crate::events::RaffleEvent;
use crate::raffle_error::RaffleError;
use crate::raffle_instruction::{RaffleArgs, RaffleInstruction};
use crate::raffle_state::{Raffle, RaffleState};
use crate::utils::{find_raffle_address, lamports_to_sol, pot, RAFFLE_SEED};
use crate::vrf::{self, RequestAccounts};

use solana_program::{
    account_info::{next_account_info, AccountInfo},
    entrypoint::ProgramResult,
    msg,
    program::{invoke, invoke_signed, set_return_data},
    program_error::ProgramError,
    program_pack::Pack,
    pubkey::Pubkey,
    system_instruction, system_program,
    sysvar::{clock::Clock, rent::Rent, Sysvar},
};

pub struct Processor;

impl Processor {
    pub fn process(program_id: &Pubkey, accounts: &[AccountInfo], instruction_data: &[u8]) -> ProgramResult {
        let instruction = RaffleInstruction::unpack(instruction_data)?;

        match instruction {
            RaffleInstruction::InitializeRaffle(args) => {
                msg!("Instruction: Initialize Raffle");
                Self::process_initialize_raffle(accounts, args, program_id)
            }
            RaffleInstruction::EnterRaffle { amount } => {
                msg!("Instruction: Enter Raffle");
                Self::process_enter_raffle(accounts, amount, program_id)
            }
            RaffleInstruction::CheckUpkeep => {
                msg!("Instruction: Check Upkeep");
                Self::process_check_upkeep(accounts, program_id)
            }
            RaffleInstruction::PerformUpkeep => {
                msg!("Instruction: Perform Upkeep");
                Self::process_perform_upkeep(accounts, program_id)
            }
            RaffleInstruction::FulfillRandomWords {
                request_id,
                random_words,
            } => {
                msg!("Instruction: Fulfill Random Words");
                Self::process_fulfill_random_words(accounts, request_id, &random_words, program_id)
            }
        }
    }

    /// Creates the raffle account and opens the first draw
    fn process_initialize_raffle(accounts: &[AccountInfo], args: RaffleArgs, program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let deployer_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !deployer_info.is_signer {
            msg!("Deployer must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        if *system_program_info.key != system_program::id() {
            return Err(ProgramError::IncorrectProgramId);
        }

        let (expected_raffle, bump) = find_raffle_address(program_id);
        if *raffle_info.key != expected_raffle {
            msg!("Invalid raffle account address");
            return Err(ProgramError::InvalidArgument);
        }

        if raffle_info.owner == program_id {
            msg!("Raffle account is already initialized");
            return Err(ProgramError::AccountAlreadyInitialized);
        }

        let rent_lamports = Rent::get()?.minimum_balance(Raffle::LEN);
        invoke_signed(
            &system_instruction::create_account(
                deployer_info.key,
                raffle_info.key,
                rent_lamports,
                Raffle::LEN as u64,
                program_id,
            ),
            &[deployer_info.clone(), raffle_info.clone(), system_program_info.clone()],
            &[&[RAFFLE_SEED, &[bump]]],
        )?;

        let now = Clock::get()?.unix_timestamp;
        let raffle = Raffle::new(
            *deployer_info.key,
            args.entrance_fee,
            args.interval,
            args.vrf_coordinator,
            args.gas_lane,
            args.subscription_id,
            args.callback_gas_limit,
            now,
            bump,
        );
        Raffle::pack(raffle, &mut raffle_info.data.borrow_mut())?;

        msg!(
            "Raffle initialized: EntranceFee={} SOL, Interval={}s, Coordinator={}, Subscription={}",
            lamports_to_sol(args.entrance_fee),
            args.interval,
            args.vrf_coordinator,
            args.subscription_id
        );
        Ok(())
    }

    fn process_enter_raffle(accounts: &[AccountInfo], amount: u64, program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let player_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !player_info.is_signer {
            msg!("Player must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let mut raffle = load_raffle(raffle_info, program_id)?;

        if amount < raffle.entrance_fee {
            msg!("Sent {} lamports, entrance fee is {}", amount, raffle.entrance_fee);
            return Err(RaffleError::LowEntranceFee.into());
        }

        if raffle.raffle_state != RaffleState::Open {
            return Err(RaffleError::NotOpen.into());
        }

        if !raffle.push_player(*player_info.key) {
            msg!("Draw already holds {} players", raffle.player_count);
            return Err(RaffleError::RaffleFull.into());
        }

        invoke(
            &system_instruction::transfer(player_info.key, raffle_info.key, amount),
            &[player_info.clone(), raffle_info.clone(), system_program_info.clone()],
        )?;

        Raffle::pack(raffle, &mut raffle_info.data.borrow_mut())?;

        RaffleEvent::RaffleEntered {
            player: *player_info.key,
        }
        .emit();
        Ok(())
    }

    fn process_check_upkeep(accounts: &[AccountInfo], program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let raffle_info = next_account_info(account_info_iter)?;

        let raffle = load_raffle(raffle_info, program_id)?;
        let upkeep_needed = raffle
            .upkeep_status(Clock::get()?.unix_timestamp, raffle_pot(raffle_info)?)
            .upkeep_needed();

        set_return_data(&[upkeep_needed as u8]);
        RaffleEvent::UpkeepChecked { upkeep_needed }.emit();
        Ok(())
    }

    /// Starts a draw. Anyone may call it once the upkeep conditions hold.
    fn process_perform_upkeep(accounts: &[AccountInfo], program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let caller_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let coordinator_program_info = next_account_info(account_info_iter)?;
        let coordinator_state_info = next_account_info(account_info_iter)?;
        let subscription_info = next_account_info(account_info_iter)?;
        let request_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !caller_info.is_signer {
            msg!("Caller must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let mut raffle = load_raffle(raffle_info, program_id)?;
        let balance = raffle_pot(raffle_info)?;
        let status = raffle.upkeep_status(Clock::get()?.unix_timestamp, balance);

        if !status.upkeep_needed() {
            msg!(
                "Upkeep not needed: balance={} players={} state={}",
                balance,
                raffle.player_count,
                u8::from(raffle.raffle_state)
            );
            return Err(RaffleError::UpKeepNotNeeded.into());
        }

        let request_id = vrf::request_random_words(
            &RequestAccounts {
                payer: caller_info,
                raffle: raffle_info,
                coordinator_program: coordinator_program_info,
                coordinator_state: coordinator_state_info,
                subscription: subscription_info,
                request: request_info,
                system_program: system_program_info,
            },
            &raffle,
        )?;

        raffle.raffle_state = RaffleState::Calculating;
        raffle.pending_request_id = request_id;
        Raffle::pack(raffle, &mut raffle_info.data.borrow_mut())?;

        RaffleEvent::RequestedRaffleWinner { request_id }.emit();
        Ok(())
    }

    /// Randomness callback. Picks the winner, reopens the raffle and pays out the pot.
    fn process_fulfill_random_words(
        accounts: &[AccountInfo],
        request_id: u64,
        random_words: &[[u8; 32]],
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let authority_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let candidates: Vec<&AccountInfo> = account_info_iter.collect();

        let mut raffle = load_raffle(raffle_info, program_id)?;
        vrf::verify_coordinator_authority(authority_info, &raffle.vrf_coordinator)?;

        if raffle.raffle_state != RaffleState::Calculating || raffle.pending_request_id != request_id {
            msg!("Request {} is not pending, expected {}", request_id, raffle.pending_request_id);
            return Err(RaffleError::UnexpectedRequest.into());
        }

        let random_word = random_words.first().ok_or(RaffleError::InvalidInstructionData)?;
        let players = raffle.players();
        let winner_index = vrf::get_random_winner_index(*random_word, players.len() as u64);
        let winner = *players
            .get(winner_index as usize)
            .ok_or(RaffleError::WinnerAccountMissing)?;
        msg!("Random winner index: {}", winner_index);

        let winner_info = candidates
            .into_iter()
            .find(|account| *account.key == winner && account.is_writable)
            .ok_or_else(|| {
                msg!("Winner account {} not passed as writable", winner);
                RaffleError::WinnerAccountMissing
            })?;

        let prize = raffle_pot(raffle_info)?;
        raffle.reset_after_draw(winner, Clock::get()?.unix_timestamp);
        Raffle::pack(raffle, &mut raffle_info.data.borrow_mut())?;

        **raffle_info.try_borrow_mut_lamports()? = raffle_info
            .lamports()
            .checked_sub(prize)
            .ok_or(RaffleError::TransferFailed)?;
        **winner_info.try_borrow_mut_lamports()? = winner_info
            .lamports()
            .checked_add(prize)
            .ok_or(RaffleError::TransferFailed)?;

        msg!("Paid {} SOL to {}", lamports_to_sol(prize), winner);
        RaffleEvent::PickedRaffleWinner { winner }.emit();
        Ok(())
    }
}

fn load_raffle(raffle_info: &AccountInfo, program_id: &Pubkey) -> Result<Raffle, ProgramError> {
    if raffle_info.owner != program_id {
        msg!("Raffle account must be owned by this program");
        return Err(ProgramError::IncorrectProgramId);
    }
    Raffle::unpack(&raffle_info.data.borrow())
}

fn raffle_pot(raffle_info: &AccountInfo) -> Result<u64, ProgramError> {
    let rent_exempt_minimum = Rent::get()?.minimum_balance(raffle_info.data_len());
    Ok(pot(raffle_info.lamports(), rent_exempt_minimum))
}
