use solana_program::{msg, pubkey::Pubkey};
use std::fmt;

/// Events logged by the coordinator as `Name key=value ...` lines
#[derive(Debug, Clone, PartialEq)]
pub enum CoordinatorEvent {
    SubscriptionCreated {
        sub_id: u64,
        owner: Pubkey,
    },
    SubscriptionFunded {
        sub_id: u64,
        old_balance: u64,
        new_balance: u64,
    },
    ConsumerAdded {
        sub_id: u64,
        consumer: Pubkey,
    },
    ConsumerRemoved {
        sub_id: u64,
        consumer: Pubkey,
    },
    SubscriptionCanceled {
        sub_id: u64,
        to: Pubkey,
        amount: u64,
    },
    RandomWordsRequested {
        key_hash: [u8; 32],
        request_id: u64,
        pre_seed: u64,
        sub_id: u64,
        minimum_request_confirmations: u16,
        callback_gas_limit: u32,
        num_words: u32,
        sender: Pubkey,
    },
    RandomWordsFulfilled {
        request_id: u64,
        output_seed: u64,
        payment: u64,
        success: bool,
    },
}

impl CoordinatorEvent {
    pub fn emit(&self) {
        msg!("{}", self);
    }
}

impl fmt::Display for CoordinatorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SubscriptionCreated { sub_id, owner } => {
                write!(f, "SubscriptionCreated sub_id={} owner={}", sub_id, owner)
            }
            Self::SubscriptionFunded { sub_id, old_balance, new_balance } => write!(
                f,
                "SubscriptionFunded sub_id={} old_balance={} new_balance={}",
                sub_id, old_balance, new_balance
            ),
            Self::ConsumerAdded { sub_id, consumer } => {
                write!(f, "ConsumerAdded sub_id={} consumer={}", sub_id, consumer)
            }
            Self::ConsumerRemoved { sub_id, consumer } => {
                write!(f, "ConsumerRemoved sub_id={} consumer={}", sub_id, consumer)
            }
            Self::SubscriptionCanceled { sub_id, to, amount } => {
                write!(f, "SubscriptionCanceled sub_id={} to={} amount={}", sub_id, to, amount)
            }
            Self::RandomWordsRequested {
                key_hash,
                request_id,
                pre_seed,
                sub_id,
                minimum_request_confirmations,
                callback_gas_limit,
                num_words,
                sender,
            } => write!(
                f,
                "RandomWordsRequested key_hash={} request_id={} pre_seed={} sub_id={} confirmations={} callback_gas_limit={} num_words={} sender={}",
                Pubkey::new_from_array(*key_hash),
                request_id,
                pre_seed,
                sub_id,
                minimum_request_confirmations,
                callback_gas_limit,
                num_words,
                sender
            ),
            Self::RandomWordsFulfilled { request_id, output_seed, payment, success } => write!(
                f,
                "RandomWordsFulfilled request_id={} output_seed={} payment={} success={}",
                request_id, output_seed, payment, success
            ),
        }
    }
}
