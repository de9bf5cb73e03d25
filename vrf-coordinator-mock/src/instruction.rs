use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    instruction::{AccountMeta, Instruction},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_program,
};

use crate::pda::{find_coordinator_address, find_request_address, find_subscription_address};

#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq)]
pub enum CoordinatorInstruction {
    /// Create the coordinator state account
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The deployer, pays for the state account
    /// 1. `[writable]` Coordinator state (PDA)
    /// 2. `[]` System program
    Initialize {
        /// Flat fee charged per fulfilled request
        base_fee: u64,
        /// Fee charged per delivered word
        gas_price_link: u64,
    },

    /// Create a new subscription owned by the signer
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` Subscription owner
    /// 1. `[writable]` Coordinator state
    /// 2. `[writable]` Subscription (PDA for `current_sub_id + 1`)
    /// 3. `[]` System program
    CreateSubscription,

    /// Add to a subscription balance
    ///
    /// Accounts expected:
    /// 0. `[signer]` Funder
    /// 1. `[writable]` Subscription
    FundSubscription { sub_id: u64, amount: u64 },

    /// Register a consumer state account
    ///
    /// Accounts expected:
    /// 0. `[signer]` Subscription owner
    /// 1. `[writable]` Subscription
    AddConsumer { sub_id: u64, consumer: Pubkey },

    /// Unregister a consumer state account
    ///
    /// Accounts expected:
    /// 0. `[signer]` Subscription owner
    /// 1. `[writable]` Subscription
    RemoveConsumer { sub_id: u64, consumer: Pubkey },

    /// Close a subscription and refund its rent to the owner
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` Subscription owner
    /// 1. `[writable]` Subscription
    CancelSubscription { sub_id: u64 },

    /// Request random words, called by a consumer program through CPI
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` Payer for the request account
    /// 1. `[signer]` Consumer state account
    /// 2. `[writable]` Coordinator state
    /// 3. `[writable]` Subscription
    /// 4. `[writable]` Request (PDA for `request_counter + 1`)
    /// 5. `[]` System program
    RequestRandomWords {
        key_hash: [u8; 32],
        sub_id: u64,
        request_confirmations: u16,
        callback_gas_limit: u32,
        num_words: u32,
    },

    /// Deliver pseudo-random words for a pending request
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` Caller, receives the closed request rent
    /// 1. `[]` Coordinator state
    /// 2. `[writable]` Request
    /// 3. `[writable]` Subscription
    /// 4. `[]` Consumer program
    /// 5. `[writable]` Consumer state
    /// Remaining accounts are forwarded to the consumer callback
    FulfillRandomWords { request_id: u64 },

    /// Same as `FulfillRandomWords` with caller-chosen words
    FulfillRandomWordsWithOverride {
        request_id: u64,
        words: Vec<[u8; 32]>,
    },
}

impl CoordinatorInstruction {
    pub fn unpack(input: &[u8]) -> Result<Self, ProgramError> {
        Self::try_from_slice(input).map_err(|_| ProgramError::InvalidInstructionData)
    }

    pub fn pack(&self) -> Vec<u8> {
        // Borsh serialization into a Vec cannot fail
        self.try_to_vec().unwrap_or_default()
    }
}

/// Create initialize instruction
pub fn initialize(
    program_id: &Pubkey,
    deployer: &Pubkey,
    base_fee: u64,
    gas_price_link: u64,
) -> Instruction {
    let (coordinator, _) = find_coordinator_address(program_id);
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*deployer, true),
            AccountMeta::new(coordinator, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data: CoordinatorInstruction::Initialize { base_fee, gas_price_link }.pack(),
    }
}

/// Create create_subscription instruction for the subscription id `sub_id`,
/// which must be the coordinator's next id
pub fn create_subscription(program_id: &Pubkey, owner: &Pubkey, sub_id: u64) -> Instruction {
    let (coordinator, _) = find_coordinator_address(program_id);
    let (subscription, _) = find_subscription_address(program_id, sub_id);
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*owner, true),
            AccountMeta::new(coordinator, false),
            AccountMeta::new(subscription, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data: CoordinatorInstruction::CreateSubscription.pack(),
    }
}

/// Create fund_subscription instruction
pub fn fund_subscription(program_id: &Pubkey, funder: &Pubkey, sub_id: u64, amount: u64) -> Instruction {
    let (subscription, _) = find_subscription_address(program_id, sub_id);
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*funder, true),
            AccountMeta::new(subscription, false),
        ],
        data: CoordinatorInstruction::FundSubscription { sub_id, amount }.pack(),
    }
}

/// Create add_consumer instruction
pub fn add_consumer(program_id: &Pubkey, owner: &Pubkey, sub_id: u64, consumer: &Pubkey) -> Instruction {
    let (subscription, _) = find_subscription_address(program_id, sub_id);
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*owner, true),
            AccountMeta::new(subscription, false),
        ],
        data: CoordinatorInstruction::AddConsumer { sub_id, consumer: *consumer }.pack(),
    }
}

/// Create remove_consumer instruction
pub fn remove_consumer(program_id: &Pubkey, owner: &Pubkey, sub_id: u64, consumer: &Pubkey) -> Instruction {
    let (subscription, _) = find_subscription_address(program_id, sub_id);
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*owner, true),
            AccountMeta::new(subscription, false),
        ],
        data: CoordinatorInstruction::RemoveConsumer { sub_id, consumer: *consumer }.pack(),
    }
}

/// Create cancel_subscription instruction
pub fn cancel_subscription(program_id: &Pubkey, owner: &Pubkey, sub_id: u64) -> Instruction {
    let (subscription, _) = find_subscription_address(program_id, sub_id);
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*owner, true),
            AccountMeta::new(subscription, false),
        ],
        data: CoordinatorInstruction::CancelSubscription { sub_id }.pack(),
    }
}

/// Create request_random_words instruction. Consumers invoke it with
/// `invoke_signed` so that `consumer_state` signs.
#[allow(clippy::too_many_arguments)]
pub fn request_random_words(
    program_id: &Pubkey,
    payer: &Pubkey,
    consumer_state: &Pubkey,
    request_id: u64,
    key_hash: [u8; 32],
    sub_id: u64,
    request_confirmations: u16,
    callback_gas_limit: u32,
    num_words: u32,
) -> Instruction {
    let (coordinator, _) = find_coordinator_address(program_id);
    let (subscription, _) = find_subscription_address(program_id, sub_id);
    let (request, _) = find_request_address(program_id, request_id);
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*payer, true),
            AccountMeta::new_readonly(*consumer_state, true),
            AccountMeta::new(coordinator, false),
            AccountMeta::new(subscription, false),
            AccountMeta::new(request, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data: CoordinatorInstruction::RequestRandomWords {
            key_hash,
            sub_id,
            request_confirmations,
            callback_gas_limit,
            num_words,
        }
        .pack(),
    }
}

/// Create fulfill_random_words instruction. `forwarded` accounts reach the
/// consumer callback unchanged; `override_words` selects the override variant.
#[allow(clippy::too_many_arguments)]
pub fn fulfill_random_words(
    program_id: &Pubkey,
    caller: &Pubkey,
    request_id: u64,
    sub_id: u64,
    consumer_program: &Pubkey,
    consumer_state: &Pubkey,
    forwarded: &[AccountMeta],
    override_words: Option<Vec<[u8; 32]>>,
) -> Instruction {
    let (coordinator, _) = find_coordinator_address(program_id);
    let (request, _) = find_request_address(program_id, request_id);
    let (subscription, _) = find_subscription_address(program_id, sub_id);

    let mut accounts = vec![
        AccountMeta::new(*caller, true),
        AccountMeta::new_readonly(coordinator, false),
        AccountMeta::new(request, false),
        AccountMeta::new(subscription, false),
        AccountMeta::new_readonly(*consumer_program, false),
        AccountMeta::new(*consumer_state, false),
    ];
    accounts.extend_from_slice(forwarded);

    let data = match override_words {
        Some(words) => CoordinatorInstruction::FulfillRandomWordsWithOverride { request_id, words },
        None => CoordinatorInstruction::FulfillRandomWords { request_id },
    }
    .pack();

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}
