//! Callback interface every randomness consumer program implements.
//!
//! The coordinator invokes the consumer program with instruction data
//! `[FULFILL_RANDOM_WORDS_TAG, request_id: u64 LE, word_count: u32 LE, words..]`
//! and the accounts:
//!
//! 0. `[signer]` Coordinator state PDA
//! 1. `[writable]` Consumer state account
//! 2.. Accounts forwarded from the fulfilling transaction
use solana_program::{
    instruction::{AccountMeta, Instruction},
    program_error::ProgramError,
    pubkey::Pubkey,
};
use std::convert::TryInto;

/// First byte of the callback instruction. Consumers must not reuse it.
pub const FULFILL_RANDOM_WORDS_TAG: u8 = 255;

/// Encodes the callback payload, tag included.
pub fn pack_fulfill_random_words(request_id: u64, words: &[[u8; 32]]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(1 + 8 + 4 + words.len() * 32);
    buf.push(FULFILL_RANDOM_WORDS_TAG);
    buf.extend_from_slice(&request_id.to_le_bytes());
    buf.extend_from_slice(&(words.len() as u32).to_le_bytes());
    for word in words {
        buf.extend_from_slice(word);
    }
    buf
}

/// Decodes the callback payload that follows the tag byte.
pub fn unpack_fulfill_random_words(rest: &[u8]) -> Result<(u64, Vec<[u8; 32]>), ProgramError> {
    let request_id = rest
        .get(..8)
        .and_then(|slice| slice.try_into().ok())
        .map(u64::from_le_bytes)
        .ok_or(ProgramError::InvalidInstructionData)?;
    let count = rest
        .get(8..12)
        .and_then(|slice| slice.try_into().ok())
        .map(u32::from_le_bytes)
        .ok_or(ProgramError::InvalidInstructionData)?;
    let words_src = &rest[12..];
    if words_src.len() != count as usize * 32 {
        return Err(ProgramError::InvalidInstructionData);
    }
    let words = words_src
        .chunks_exact(32)
        .map(|chunk| chunk.try_into().map_err(|_| ProgramError::InvalidInstructionData))
        .collect::<Result<Vec<[u8; 32]>, _>>()?;
    Ok((request_id, words))
}

/// Builds the callback instruction sent to `consumer_program`.
pub fn fulfill_random_words_callback(
    consumer_program: &Pubkey,
    coordinator_authority: &Pubkey,
    consumer_state: &Pubkey,
    forwarded: &[AccountMeta],
    request_id: u64,
    words: &[[u8; 32]],
) -> Instruction {
    let mut accounts = vec![
        AccountMeta::new_readonly(*coordinator_authority, true),
        AccountMeta::new(*consumer_state, false),
    ];
    accounts.extend_from_slice(forwarded);

    Instruction {
        program_id: *consumer_program,
        accounts,
        data: pack_fulfill_random_words(request_id, words),
    }
}
