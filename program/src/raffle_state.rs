use solana_program::{
    clock::UnixTimestamp,
    program_error::ProgramError,
    program_pack::{IsInitialized, Pack, Sealed},
    pubkey::Pubkey,
};
use arrayref::{array_ref, array_refs, mut_array_refs, array_mut_ref};
use std::convert::TryFrom;

/// Maximum number of entries held by one draw
pub const MAX_PLAYERS: usize = 32;
/// Block confirmations asked from the coordinator
pub const REQUEST_CONFIRMATIONS: u16 = 3;
/// Random words asked per draw
pub const NUM_WORDS: u32 = 1;

/// Lifecycle of the raffle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RaffleState {
    /// Accepting entries
    Open,
    /// Waiting for the coordinator to deliver randomness
    Calculating,
}

impl TryFrom<u8> for RaffleState {
    type Error = ProgramError;

    fn try_from(val: u8) -> Result<Self, Self::Error> {
        match val {
            0 => Ok(RaffleState::Open),
            1 => Ok(RaffleState::Calculating),
            _ => Err(ProgramError::InvalidAccountData),
        }
    }
}

impl From<RaffleState> for u8 {
    fn from(state: RaffleState) -> Self {
        match state {
            RaffleState::Open => 0,
            RaffleState::Calculating => 1,
        }
    }
}

/// The conditions a draw needs, evaluated at one point in time
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UpkeepStatus {
    pub is_open: bool,
    pub time_passed: bool,
    pub has_players: bool,
    pub has_balance: bool,
}

impl UpkeepStatus {
    pub fn upkeep_needed(&self) -> bool {
        self.is_open && self.time_passed && self.has_players && self.has_balance
    }
}

/// Raffle account data
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Raffle {
    /// Is the account initialized
    pub is_initialized: bool,
    /// Deployer of the raffle
    pub authority: Pubkey,
    /// Minimum lamports per entry
    pub entrance_fee: u64,
    /// Seconds between draws
    pub interval: u64,
    /// Program id of the randomness coordinator
    pub vrf_coordinator: Pubkey,
    /// Key hash selecting the oracle gas lane
    pub gas_lane: [u8; 32],
    /// Coordinator subscription paying for requests
    pub subscription_id: u64,
    /// Gas budget forwarded with each request
    pub callback_gas_limit: u32,
    pub raffle_state: RaffleState,
    /// Time of deployment or of the last completed draw
    pub last_draw_time: UnixTimestamp,
    /// Winner of the last completed draw (zero before the first)
    pub recent_winner: Pubkey,
    /// Request id awaited while calculating, zero otherwise
    pub pending_request_id: u64,
    /// PDA bump
    pub bump: u8,
    pub player_count: u8,
    pub players: [Pubkey; MAX_PLAYERS],
}

impl Raffle {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        authority: Pubkey,
        entrance_fee: u64,
        interval: u64,
        vrf_coordinator: Pubkey,
        gas_lane: [u8; 32],
        subscription_id: u64,
        callback_gas_limit: u32,
        now: UnixTimestamp,
        bump: u8,
    ) -> Self {
        Self {
            is_initialized: true,
            authority,
            entrance_fee,
            interval,
            vrf_coordinator,
            gas_lane,
            subscription_id,
            callback_gas_limit,
            raffle_state: RaffleState::Open,
            last_draw_time: now,
            recent_winner: Pubkey::default(),
            pending_request_id: 0,
            bump,
            player_count: 0,
            players: [Pubkey::default(); MAX_PLAYERS],
        }
    }

    pub fn players(&self) -> &[Pubkey] {
        &self.players[..self.player_count as usize]
    }

    pub fn num_words(&self) -> u32 {
        NUM_WORDS
    }

    pub fn request_confirmations(&self) -> u16 {
        REQUEST_CONFIRMATIONS
    }

    /// Appends an entry. Returns false when the draw is full.
    pub fn push_player(&mut self, player: Pubkey) -> bool {
        let count = self.player_count as usize;
        if count >= MAX_PLAYERS {
            return false;
        }
        self.players[count] = player;
        self.player_count += 1;
        true
    }

    /// `pot` is the lamports held above the rent-exempt reserve.
    pub fn upkeep_status(&self, now: UnixTimestamp, pot: u64) -> UpkeepStatus {
        let elapsed = now.saturating_sub(self.last_draw_time);
        UpkeepStatus {
            is_open: self.raffle_state == RaffleState::Open,
            time_passed: elapsed > 0 && elapsed as u64 > self.interval,
            has_players: self.player_count > 0,
            has_balance: pot > 0,
        }
    }

    /// Closes the current draw after a winner was picked.
    pub fn reset_after_draw(&mut self, winner: Pubkey, now: UnixTimestamp) {
        self.players = [Pubkey::default(); MAX_PLAYERS];
        self.player_count = 0;
        self.raffle_state = RaffleState::Open;
        self.last_draw_time = now;
        self.recent_winner = winner;
        self.pending_request_id = 0;
    }
}

impl Sealed for Raffle {}

impl IsInitialized for Raffle {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl Pack for Raffle {
    const LEN: usize = 1 + 32 + 8 + 8 + 32 + 32 + 8 + 4 + 1 + 8 + 32 + 8 + 1 + 1 + 32 * MAX_PLAYERS;

    fn unpack_from_slice(src: &[u8]) -> Result<Self, ProgramError> {
        let src = array_ref![src, 0, Raffle::LEN];
        let (
            is_initialized,
            authority,
            entrance_fee,
            interval,
            vrf_coordinator,
            gas_lane,
            subscription_id,
            callback_gas_limit,
            raffle_state,
            last_draw_time,
            recent_winner,
            pending_request_id,
            bump,
            player_count,
            players_src,
        ) = array_refs![src, 1, 32, 8, 8, 32, 32, 8, 4, 1, 8, 32, 8, 1, 1, 32 * MAX_PLAYERS];

        let player_count = player_count[0];
        if player_count as usize > MAX_PLAYERS {
            return Err(ProgramError::InvalidAccountData);
        }

        let mut players = [Pubkey::default(); MAX_PLAYERS];
        for (player, chunk) in players.iter_mut().zip(players_src.chunks_exact(32)) {
            *player = Pubkey::new_from_array(*array_ref![chunk, 0, 32]);
        }

        Ok(Raffle {
            is_initialized: is_initialized[0] != 0,
            authority: Pubkey::new_from_array(*authority),
            entrance_fee: u64::from_le_bytes(*entrance_fee),
            interval: u64::from_le_bytes(*interval),
            vrf_coordinator: Pubkey::new_from_array(*vrf_coordinator),
            gas_lane: *gas_lane,
            subscription_id: u64::from_le_bytes(*subscription_id),
            callback_gas_limit: u32::from_le_bytes(*callback_gas_limit),
            raffle_state: RaffleState::try_from(raffle_state[0])?,
            last_draw_time: UnixTimestamp::from_le_bytes(*last_draw_time),
            recent_winner: Pubkey::new_from_array(*recent_winner),
            pending_request_id: u64::from_le_bytes(*pending_request_id),
            bump: bump[0],
            player_count,
            players,
        })
    }

    fn pack_into_slice(&self, dst: &mut [u8]) {
        let dst = array_mut_ref![dst, 0, Raffle::LEN];
        let (
            is_initialized_dst,
            authority_dst,
            entrance_fee_dst,
            interval_dst,
            vrf_coordinator_dst,
            gas_lane_dst,
            subscription_id_dst,
            callback_gas_limit_dst,
            raffle_state_dst,
            last_draw_time_dst,
            recent_winner_dst,
            pending_request_id_dst,
            bump_dst,
            player_count_dst,
            players_dst,
        ) = mut_array_refs![dst, 1, 32, 8, 8, 32, 32, 8, 4, 1, 8, 32, 8, 1, 1, 32 * MAX_PLAYERS];

        is_initialized_dst[0] = self.is_initialized as u8;
        authority_dst.copy_from_slice(self.authority.as_ref());
        *entrance_fee_dst = self.entrance_fee.to_le_bytes();
        *interval_dst = self.interval.to_le_bytes();
        vrf_coordinator_dst.copy_from_slice(self.vrf_coordinator.as_ref());
        gas_lane_dst.copy_from_slice(&self.gas_lane);
        *subscription_id_dst = self.subscription_id.to_le_bytes();
        *callback_gas_limit_dst = self.callback_gas_limit.to_le_bytes();
        raffle_state_dst[0] = self.raffle_state.into();
        *last_draw_time_dst = self.last_draw_time.to_le_bytes();
        recent_winner_dst.copy_from_slice(self.recent_winner.as_ref());
        *pending_request_id_dst = self.pending_request_id.to_le_bytes();
        bump_dst[0] = self.bump;
        player_count_dst[0] = self.player_count;
        for (chunk, player) in players_dst.chunks_exact_mut(32).zip(self.players.iter()) {
            chunk.copy_from_slice(player.as_ref());
        }
    }
}
