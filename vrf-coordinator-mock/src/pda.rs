use solana_program::pubkey::Pubkey;

pub const COORDINATOR_SEED: &[u8] = b"coordinator";
pub const SUBSCRIPTION_SEED: &[u8] = b"subscription";
pub const REQUEST_SEED: &[u8] = b"request";

/// Coordinator state PDA. Consumers treat this address as the only valid
/// caller of their fulfillment callback.
pub fn find_coordinator_address(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[COORDINATOR_SEED], program_id)
}

pub fn find_subscription_address(program_id: &Pubkey, sub_id: u64) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[SUBSCRIPTION_SEED, &sub_id.to_le_bytes()], program_id)
}

pub fn find_request_address(program_id: &Pubkey, request_id: u64) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[REQUEST_SEED, &request_id.to_le_bytes()], program_id)
}
