use arrayref::{array_mut_ref, array_ref, array_refs, mut_array_refs};
use solana_program::{
    program_error::ProgramError,
    program_pack::{IsInitialized, Pack, Sealed},
    pubkey::Pubkey,
};

/// Maximum consumers registered on a single subscription
pub const MAX_CONSUMERS: usize = 10;
/// Maximum random words served by one request
pub const MAX_NUM_WORDS: u32 = 500;
/// Maximum block confirmations a consumer may ask for
pub const MAX_REQUEST_CONFIRMATIONS: u16 = 200;

/// Global coordinator account. Its PDA also signs consumer callbacks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinatorState {
    /// Is the account initialized
    pub is_initialized: bool,
    /// Deployer of the mock
    pub admin: Pubkey,
    /// Flat fee charged per fulfilled request
    pub base_fee: u64,
    /// Fee charged per delivered word
    pub gas_price_link: u64,
    /// Last subscription id handed out
    pub current_sub_id: u64,
    /// Last request id handed out
    pub request_counter: u64,
    /// PDA bump
    pub bump: u8,
}

impl CoordinatorState {
    pub fn next_sub_id(&self) -> u64 {
        self.current_sub_id + 1
    }

    pub fn next_request_id(&self) -> u64 {
        self.request_counter + 1
    }

    /// Amount charged to a subscription for `num_words` words
    pub fn payment(&self, num_words: u32) -> Option<u64> {
        self.gas_price_link
            .checked_mul(num_words as u64)?
            .checked_add(self.base_fee)
    }
}

/// Prepaid subscription
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Subscription {
    pub is_initialized: bool,
    pub id: u64,
    pub owner: Pubkey,
    /// Prepaid balance in base units
    pub balance: u64,
    /// Number of requests served
    pub req_count: u64,
    pub consumer_count: u8,
    pub consumers: [Pubkey; MAX_CONSUMERS],
}

impl Subscription {
    pub fn new(id: u64, owner: Pubkey) -> Self {
        Self {
            is_initialized: true,
            id,
            owner,
            balance: 0,
            req_count: 0,
            consumer_count: 0,
            consumers: [Pubkey::default(); MAX_CONSUMERS],
        }
    }

    pub fn consumers(&self) -> &[Pubkey] {
        &self.consumers[..self.consumer_count as usize]
    }

    pub fn is_consumer(&self, consumer: &Pubkey) -> bool {
        self.consumers().contains(consumer)
    }

    /// Registers a consumer. Returns false if it was already present.
    pub fn add_consumer(&mut self, consumer: Pubkey) -> Result<bool, ProgramError> {
        if self.is_consumer(&consumer) {
            return Ok(false);
        }
        let count = self.consumer_count as usize;
        if count >= MAX_CONSUMERS {
            return Err(crate::error::VrfCoordinatorError::TooManyConsumers.into());
        }
        self.consumers[count] = consumer;
        self.consumer_count += 1;
        Ok(true)
    }

    /// Removes a consumer, keeping the remaining ones contiguous.
    pub fn remove_consumer(&mut self, consumer: &Pubkey) -> Result<(), ProgramError> {
        let count = self.consumer_count as usize;
        let index = self
            .consumers()
            .iter()
            .position(|c| c == consumer)
            .ok_or(crate::error::VrfCoordinatorError::InvalidConsumer)?;
        self.consumers[index] = self.consumers[count - 1];
        self.consumers[count - 1] = Pubkey::default();
        self.consumer_count -= 1;
        Ok(())
    }
}

/// Pending randomness request, closed once fulfilled
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RandomnessRequest {
    pub is_initialized: bool,
    pub request_id: u64,
    pub sub_id: u64,
    /// Consumer state account that signed the request
    pub consumer: Pubkey,
    /// Program owning the consumer state, target of the callback
    pub consumer_program: Pubkey,
    pub callback_gas_limit: u32,
    pub num_words: u32,
    pub key_hash: [u8; 32],
    /// Account that paid for the request account
    pub requester: Pubkey,
}

impl Sealed for CoordinatorState {}
impl Sealed for Subscription {}
impl Sealed for RandomnessRequest {}

impl IsInitialized for CoordinatorState {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl IsInitialized for Subscription {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl IsInitialized for RandomnessRequest {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl Pack for CoordinatorState {
    const LEN: usize = 1 + 32 + 8 + 8 + 8 + 8 + 1;

    fn unpack_from_slice(src: &[u8]) -> Result<Self, ProgramError> {
        let src = array_ref![src, 0, CoordinatorState::LEN];
        let (is_initialized, admin, base_fee, gas_price_link, current_sub_id, request_counter, bump) =
            array_refs![src, 1, 32, 8, 8, 8, 8, 1];

        Ok(CoordinatorState {
            is_initialized: is_initialized[0] != 0,
            admin: Pubkey::new_from_array(*admin),
            base_fee: u64::from_le_bytes(*base_fee),
            gas_price_link: u64::from_le_bytes(*gas_price_link),
            current_sub_id: u64::from_le_bytes(*current_sub_id),
            request_counter: u64::from_le_bytes(*request_counter),
            bump: bump[0],
        })
    }

    fn pack_into_slice(&self, dst: &mut [u8]) {
        let dst = array_mut_ref![dst, 0, CoordinatorState::LEN];
        let (
            is_initialized_dst,
            admin_dst,
            base_fee_dst,
            gas_price_link_dst,
            current_sub_id_dst,
            request_counter_dst,
            bump_dst,
        ) = mut_array_refs![dst, 1, 32, 8, 8, 8, 8, 1];

        is_initialized_dst[0] = self.is_initialized as u8;
        admin_dst.copy_from_slice(self.admin.as_ref());
        *base_fee_dst = self.base_fee.to_le_bytes();
        *gas_price_link_dst = self.gas_price_link.to_le_bytes();
        *current_sub_id_dst = self.current_sub_id.to_le_bytes();
        *request_counter_dst = self.request_counter.to_le_bytes();
        bump_dst[0] = self.bump;
    }
}

impl Pack for Subscription {
    const LEN: usize = 1 + 8 + 32 + 8 + 8 + 1 + 32 * MAX_CONSUMERS;

    fn unpack_from_slice(src: &[u8]) -> Result<Self, ProgramError> {
        let src = array_ref![src, 0, Subscription::LEN];
        let (is_initialized, id, owner, balance, req_count, consumer_count, consumers_src) =
            array_refs![src, 1, 8, 32, 8, 8, 1, 32 * MAX_CONSUMERS];

        let consumer_count = consumer_count[0];
        if consumer_count as usize > MAX_CONSUMERS {
            return Err(ProgramError::InvalidAccountData);
        }

        let mut consumers = [Pubkey::default(); MAX_CONSUMERS];
        for (consumer, chunk) in consumers.iter_mut().zip(consumers_src.chunks_exact(32)) {
            *consumer = Pubkey::new_from_array(*array_ref![chunk, 0, 32]);
        }

        Ok(Subscription {
            is_initialized: is_initialized[0] != 0,
            id: u64::from_le_bytes(*id),
            owner: Pubkey::new_from_array(*owner),
            balance: u64::from_le_bytes(*balance),
            req_count: u64::from_le_bytes(*req_count),
            consumer_count,
            consumers,
        })
    }

    fn pack_into_slice(&self, dst: &mut [u8]) {
        let dst = array_mut_ref![dst, 0, Subscription::LEN];
        let (is_initialized_dst, id_dst, owner_dst, balance_dst, req_count_dst, consumer_count_dst, consumers_dst) =
            mut_array_refs![dst, 1, 8, 32, 8, 8, 1, 32 * MAX_CONSUMERS];

        is_initialized_dst[0] = self.is_initialized as u8;
        *id_dst = self.id.to_le_bytes();
        owner_dst.copy_from_slice(self.owner.as_ref());
        *balance_dst = self.balance.to_le_bytes();
        *req_count_dst = self.req_count.to_le_bytes();
        consumer_count_dst[0] = self.consumer_count;
        for (chunk, consumer) in consumers_dst.chunks_exact_mut(32).zip(self.consumers.iter()) {
            chunk.copy_from_slice(consumer.as_ref());
        }
    }
}

impl Pack for RandomnessRequest {
    const LEN: usize = 1 + 8 + 8 + 32 + 32 + 4 + 4 + 32 + 32;

    fn unpack_from_slice(src: &[u8]) -> Result<Self, ProgramError> {
        let src = array_ref![src, 0, RandomnessRequest::LEN];
        let (
            is_initialized,
            request_id,
            sub_id,
            consumer,
            consumer_program,
            callback_gas_limit,
            num_words,
            key_hash,
            requester,
        ) = array_refs![src, 1, 8, 8, 32, 32, 4, 4, 32, 32];

        Ok(RandomnessRequest {
            is_initialized: is_initialized[0] != 0,
            request_id: u64::from_le_bytes(*request_id),
            sub_id: u64::from_le_bytes(*sub_id),
            consumer: Pubkey::new_from_array(*consumer),
            consumer_program: Pubkey::new_from_array(*consumer_program),
            callback_gas_limit: u32::from_le_bytes(*callback_gas_limit),
            num_words: u32::from_le_bytes(*num_words),
            key_hash: *key_hash,
            requester: Pubkey::new_from_array(*requester),
        })
    }

    fn pack_into_slice(&self, dst: &mut [u8]) {
        let dst = array_mut_ref![dst, 0, RandomnessRequest::LEN];
        let (
            is_initialized_dst,
            request_id_dst,
            sub_id_dst,
            consumer_dst,
            consumer_program_dst,
            callback_gas_limit_dst,
            num_words_dst,
            key_hash_dst,
            requester_dst,
        ) = mut_array_refs![dst, 1, 8, 8, 32, 32, 4, 4, 32, 32];

        is_initialized_dst[0] = self.is_initialized as u8;
        *request_id_dst = self.request_id.to_le_bytes();
        *sub_id_dst = self.sub_id.to_le_bytes();
        consumer_dst.copy_from_slice(self.consumer.as_ref());
        consumer_program_dst.copy_from_slice(self.consumer_program.as_ref());
        *callback_gas_limit_dst = self.callback_gas_limit.to_le_bytes();
        *num_words_dst = self.num_words.to_le_bytes();
        key_hash_dst.copy_from_slice(&self.key_hash);
        requester_dst.copy_from_slice(self.requester.as_ref());
    }
}
