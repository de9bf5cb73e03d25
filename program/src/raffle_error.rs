use solana_program::{program_error::ProgramError, decode_error::DecodeError, msg, program_error::PrintProgramError};
use thiserror::Error;

/// Errors that may be returned by the Raffle program
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum RaffleError {
    /// Invalid instruction data passed
    #[error("Invalid instruction data")]
    InvalidInstructionData,

    /// Entry sent less than the entrance fee
    #[error("Entrance fee too low")]
    LowEntranceFee,

    /// Raffle is calculating a winner
    #[error("Raffle is not open")]
    NotOpen,

    /// Draw conditions are not met
    #[error("Upkeep not needed")]
    UpKeepNotNeeded,

    /// Prize could not be moved to the winner
    #[error("Prize transfer failed")]
    TransferFailed,

    /// The current draw holds the maximum number of entries
    #[error("Raffle is full")]
    RaffleFull,

    /// Callback was not signed by the configured coordinator
    #[error("Only the coordinator can fulfill")]
    OnlyCoordinatorCanFulfill,

    /// Callback does not answer the pending request
    #[error("Unexpected randomness request")]
    UnexpectedRequest,

    /// Winner account was not passed to the callback
    #[error("Winner account missing")]
    WinnerAccountMissing,
}

impl From<RaffleError> for ProgramError {
    fn from(e: RaffleError) -> Self {
        ProgramError::Custom(e as u32)
    }
}

impl<T> DecodeError<T> for RaffleError {
    fn type_of() -> &'static str {
        "Raffle Error"
    }
}

impl PrintProgramError for RaffleError {
    fn print<E>(&self) {
        msg!(&self.to_string());
    }
}
