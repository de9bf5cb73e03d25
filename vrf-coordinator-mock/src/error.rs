use solana_program::{decode_error::DecodeError, msg, program_error::{PrintProgramError, ProgramError}};
use thiserror::Error;

/// Errors that may be returned by the VRF coordinator mock
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum VrfCoordinatorError {
    /// Invalid instruction data passed
    #[error("Invalid instruction data")]
    InvalidInstructionData,

    /// Subscription does not exist
    #[error("Invalid subscription")]
    InvalidSubscription,

    /// Caller is not a registered consumer of the subscription
    #[error("Invalid consumer")]
    InvalidConsumer,

    /// Subscription balance cannot cover the request payment
    #[error("Insufficient balance")]
    InsufficientBalance,

    /// Only the subscription owner can perform this action
    #[error("Must be subscription owner")]
    MustBeSubOwner,

    /// Consumer list is full
    #[error("Too many consumers")]
    TooManyConsumers,

    /// The randomness request does not exist or was already fulfilled
    #[error("nonexistent request")]
    NonexistentRequest,

    /// More words requested than the coordinator allows
    #[error("Number of words too big")]
    NumWordsTooBig,

    /// Request confirmations out of range
    #[error("Invalid request confirmations")]
    InvalidRequestConfirmations,

    /// Override words do not match the requested word count
    #[error("Invalid random words")]
    InvalidRandomWords,

    /// Consumer program account does not match the request
    #[error("Invalid consumer program")]
    InvalidConsumerProgram,

    /// Arithmetic overflow
    #[error("Arithmetic overflow")]
    Overflow,

    /// A request must ask for at least one word
    #[error("Number of words must be positive")]
    ZeroNumWords,
}

impl From<VrfCoordinatorError> for ProgramError {
    fn from(e: VrfCoordinatorError) -> Self {
        ProgramError::Custom(e as u32)
    }
}

impl<T> DecodeError<T> for VrfCoordinatorError {
    fn type_of() -> &'static str {
        "VRF Coordinator Error"
    }
}

impl PrintProgramError for VrfCoordinatorError {
    fn print<E>(&self) {
        msg!(&self.to_string());
    }
}
