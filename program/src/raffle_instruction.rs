use solana_program::{
    instruction::{AccountMeta, Instruction},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_program,
};
use std::convert::TryInto;
use std::mem::size_of;
use vrf_coordinator_mock::{
    consumer::{self, FULFILL_RANDOM_WORDS_TAG},
    pda::{find_coordinator_address, find_request_address, find_subscription_address},
};

use crate::utils::find_raffle_address;

/// Constructor arguments of a raffle
#[derive(Clone, Debug, PartialEq)]
pub struct RaffleArgs {
    /// Minimum lamports per entry
    pub entrance_fee: u64,
    /// Seconds between draws
    pub interval: u64,
    /// Program id of the randomness coordinator
    pub vrf_coordinator: Pubkey,
    /// Oracle key hash
    pub gas_lane: [u8; 32],
    pub subscription_id: u64,
    pub callback_gas_limit: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub enum RaffleInstruction {
    /// Create and configure the raffle
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The deployer, pays for the raffle account
    /// 1. `[writable]` The raffle account (PDA)
    /// 2. `[]` The system program
    InitializeRaffle(RaffleArgs),

    /// Enter the current draw
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The player
    /// 1. `[writable]` The raffle account
    /// 2. `[]` The system program
    EnterRaffle {
        /// Lamports sent along, at least the entrance fee
        amount: u64,
    },

    /// Report whether a draw should start. Sets one byte of return data.
    ///
    /// Accounts expected:
    /// 0. `[]` The raffle account
    CheckUpkeep,

    /// Start a draw by requesting randomness
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` Any user, pays for the request account
    /// 1. `[writable]` The raffle account
    /// 2. `[]` The coordinator program
    /// 3. `[writable]` The coordinator state
    /// 4. `[writable]` The subscription
    /// 5. `[writable]` The request account
    /// 6. `[]` The system program
    PerformUpkeep,

    /// Randomness callback from the coordinator
    ///
    /// Accounts expected:
    /// 0. `[signer]` The coordinator state PDA
    /// 1. `[writable]` The raffle account
    /// Remaining `[writable]` accounts must include the winning player
    FulfillRandomWords {
        request_id: u64,
        random_words: Vec<[u8; 32]>,
    },
}

impl RaffleInstruction {
    /// Unpacks a byte buffer into a RaffleInstruction
    pub fn unpack(input: &[u8]) -> Result<Self, ProgramError> {
        let (tag, rest) = input.split_first().ok_or(ProgramError::InvalidInstructionData)?;

        Ok(match *tag {
            0 => {
                let (entrance_fee, rest) = Self::unpack_u64(rest)?;
                let (interval, rest) = Self::unpack_u64(rest)?;
                let (vrf_coordinator, rest) = Self::unpack_fixed_bytes::<32>(rest)?;
                let (gas_lane, rest) = Self::unpack_fixed_bytes::<32>(rest)?;
                let (subscription_id, rest) = Self::unpack_u64(rest)?;
                let (callback_gas_limit, _) = Self::unpack_u32(rest)?;
                Self::InitializeRaffle(RaffleArgs {
                    entrance_fee,
                    interval,
                    vrf_coordinator: Pubkey::new_from_array(vrf_coordinator),
                    gas_lane,
                    subscription_id,
                    callback_gas_limit,
                })
            }
            1 => {
                let (amount, _) = Self::unpack_u64(rest)?;
                Self::EnterRaffle { amount }
            }
            2 => Self::CheckUpkeep,
            3 => Self::PerformUpkeep,
            FULFILL_RANDOM_WORDS_TAG => {
                let (request_id, random_words) = consumer::unpack_fulfill_random_words(rest)?;
                Self::FulfillRandomWords { request_id, random_words }
            }
            _ => return Err(ProgramError::InvalidInstructionData),
        })
    }

    /// Packs a RaffleInstruction into a byte buffer
    pub fn pack(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(size_of::<Self>());
        match self {
            Self::InitializeRaffle(args) => {
                buf.push(0);
                buf.extend_from_slice(&args.entrance_fee.to_le_bytes());
                buf.extend_from_slice(&args.interval.to_le_bytes());
                buf.extend_from_slice(args.vrf_coordinator.as_ref());
                buf.extend_from_slice(&args.gas_lane);
                buf.extend_from_slice(&args.subscription_id.to_le_bytes());
                buf.extend_from_slice(&args.callback_gas_limit.to_le_bytes());
            }
            Self::EnterRaffle { amount } => {
                buf.push(1);
                buf.extend_from_slice(&amount.to_le_bytes());
            }
            Self::CheckUpkeep => buf.push(2),
            Self::PerformUpkeep => buf.push(3),
            Self::FulfillRandomWords { request_id, random_words } => {
                buf = consumer::pack_fulfill_random_words(*request_id, random_words);
            }
        }
        buf
    }

    fn unpack_u64(input: &[u8]) -> Result<(u64, &[u8]), ProgramError> {
        let value = input
            .get(..8)
            .and_then(|slice| slice.try_into().ok())
            .map(u64::from_le_bytes)
            .ok_or(ProgramError::InvalidInstructionData)?;
        Ok((value, &input[8..]))
    }

    fn unpack_u32(input: &[u8]) -> Result<(u32, &[u8]), ProgramError> {
        let value = input
            .get(..4)
            .and_then(|slice| slice.try_into().ok())
            .map(u32::from_le_bytes)
            .ok_or(ProgramError::InvalidInstructionData)?;
        Ok((value, &input[4..]))
    }

    fn unpack_fixed_bytes<const N: usize>(input: &[u8]) -> Result<([u8; N], &[u8]), ProgramError> {
        let bytes = input
            .get(..N)
            .and_then(|slice| slice.try_into().ok())
            .ok_or(ProgramError::InvalidInstructionData)?;
        Ok((bytes, &input[N..]))
    }
}

/// Create initialize_raffle instruction
pub fn initialize_raffle(program_id: &Pubkey, deployer: &Pubkey, args: RaffleArgs) -> Instruction {
    let (raffle_account, _) = find_raffle_address(program_id);
    let data = RaffleInstruction::InitializeRaffle(args).pack();

    let accounts = vec![
        AccountMeta::new(*deployer, true),
        AccountMeta::new(raffle_account, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

/// Create enter_raffle instruction
pub fn enter_raffle(program_id: &Pubkey, player: &Pubkey, amount: u64) -> Instruction {
    let (raffle_account, _) = find_raffle_address(program_id);
    let data = RaffleInstruction::EnterRaffle { amount }.pack();

    let accounts = vec![
        AccountMeta::new(*player, true),
        AccountMeta::new(raffle_account, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

/// Create check_upkeep instruction
pub fn check_upkeep(program_id: &Pubkey) -> Instruction {
    let (raffle_account, _) = find_raffle_address(program_id);

    Instruction {
        program_id: *program_id,
        accounts: vec![AccountMeta::new_readonly(raffle_account, false)],
        data: RaffleInstruction::CheckUpkeep.pack(),
    }
}

/// Create perform_upkeep instruction. `request_id` is the coordinator's next
/// request id, read from its state account.
pub fn perform_upkeep(
    program_id: &Pubkey,
    caller: &Pubkey,
    vrf_coordinator: &Pubkey,
    subscription_id: u64,
    request_id: u64,
) -> Instruction {
    let (raffle_account, _) = find_raffle_address(program_id);
    let (coordinator_state, _) = find_coordinator_address(vrf_coordinator);
    let (subscription, _) = find_subscription_address(vrf_coordinator, subscription_id);
    let (request, _) = find_request_address(vrf_coordinator, request_id);

    let accounts = vec![
        AccountMeta::new(*caller, true),
        AccountMeta::new(raffle_account, false),
        AccountMeta::new_readonly(*vrf_coordinator, false),
        AccountMeta::new(coordinator_state, false),
        AccountMeta::new(subscription, false),
        AccountMeta::new(request, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data: RaffleInstruction::PerformUpkeep.pack(),
    }
}

/// Accounts a fulfillment must forward so the raffle can pay its winner:
/// every distinct player of the current draw.
pub fn winner_candidates(players: &[Pubkey]) -> Vec<AccountMeta> {
    let mut metas: Vec<AccountMeta> = Vec::with_capacity(players.len());
    for player in players {
        if !metas.iter().any(|meta| meta.pubkey == *player) {
            metas.push(AccountMeta::new(*player, false));
        }
    }
    metas
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialize_args_decode() {
        let args = RaffleArgs {
            entrance_fee: 100_000_000,
            interval: 3,
            vrf_coordinator: Pubkey::new_unique(),
            gas_lane: [4u8; 32],
            subscription_id: 1,
            callback_gas_limit: 2_500_000,
        };
        let data = RaffleInstruction::InitializeRaffle(args.clone()).pack();
        assert_eq!(
            RaffleInstruction::unpack(&data).unwrap(),
            RaffleInstruction::InitializeRaffle(args)
        );
        assert_eq!(
            RaffleInstruction::unpack(&data[..data.len() - 1]),
            Err(ProgramError::InvalidInstructionData)
        );
    }

    #[test]
    fn fulfill_uses_coordinator_tag() {
        let data = RaffleInstruction::FulfillRandomWords {
            request_id: 5,
            random_words: vec![[3u8; 32]],
        }
        .pack();
        assert_eq!(data[0], FULFILL_RANDOM_WORDS_TAG);
        assert!(matches!(
            RaffleInstruction::unpack(&data).unwrap(),
            RaffleInstruction::FulfillRandomWords { request_id: 5, .. }
        ));
    }

    #[test]
    fn empty_and_unknown_tags_fail() {
        assert_eq!(RaffleInstruction::unpack(&[]), Err(ProgramError::InvalidInstructionData));
        assert_eq!(RaffleInstruction::unpack(&[42]), Err(ProgramError::InvalidInstructionData));
    }

    #[test]
    fn winner_candidates_are_deduplicated() {
        let a = Pubkey::new_unique();
        let b = Pubkey::new_unique();
        let metas = winner_candidates(&[a, b, a]);
        assert_eq!(metas.len(), 2);
        assert!(metas.iter().all(|meta| meta.is_writable && !meta.is_signer));
    }
}
