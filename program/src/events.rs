use solana_program::{msg, pubkey::Pubkey};
use std::fmt;

/// Events logged by the raffle as `Name key=value` lines
#[derive(Debug, Clone, PartialEq)]
pub enum RaffleEvent {
    RaffleEntered { player: Pubkey },
    UpkeepChecked { upkeep_needed: bool },
    RequestedRaffleWinner { request_id: u64 },
    PickedRaffleWinner { winner: Pubkey },
}

impl RaffleEvent {
    pub fn emit(&self) {
        msg!("{}", self);
    }
}

impl fmt::Display for RaffleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RaffleEntered { player } => write!(f, "RaffleEntered player={}", player),
            Self::UpkeepChecked { upkeep_needed } => write!(f, "UpkeepChecked upkeep_needed={}", upkeep_needed),
            Self::RequestedRaffleWinner { request_id } => write!(f, "RequestedRaffleWinner request_id={}", request_id),
            Self::PickedRaffleWinner { winner } => write!(f, "PickedRaffleWinner winner={}", winner),
        }
    }
}
