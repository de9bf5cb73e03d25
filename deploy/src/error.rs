use solana_client::client_error::ClientError;
use solana_sdk::{instruction::InstructionError, program_error::ProgramError, pubkey::Pubkey};
use thiserror::Error;

/// Errors raised while deploying and wiring the programs
#[derive(Error, Debug)]
pub enum DeployError {
    #[error("Unknown network {0}")]
    UnknownNetwork(String),

    #[error("Network {network} has no {field} configured")]
    MissingConfig { network: String, field: &'static str },

    #[error("Invalid amount {0:?}")]
    InvalidAmount(String),

    #[error("Connected to genesis {actual}, network {network} expects {expected}")]
    WrongChain {
        network: String,
        expected: String,
        actual: String,
    },

    #[error("No deployment named {0}")]
    MissingDeployment(String),

    #[error("Program {0} is not deployed and no artifact was provided")]
    MissingArtifact(String),

    #[error("Account {0} not found")]
    AccountNotFound(Pubkey),

    #[error("Deployed program {0} does not match the local artifact")]
    VerificationFailed(Pubkey),

    #[error("Account {0} cannot be decoded: {1}")]
    InvalidAccountData(Pubkey, ProgramError),

    #[error("Invalid address {0:?} in deployment record")]
    InvalidRecord(String),

    #[error("Transaction failed: {0}")]
    Transaction(String),

    #[error("Chain query failed: {0}")]
    Query(String),

    #[error(transparent)]
    Rpc(#[from] Box<ClientError>),

    #[error(transparent)]
    Instruction(#[from] InstructionError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl From<ClientError> for DeployError {
    fn from(e: ClientError) -> Self {
        DeployError::Rpc(Box::new(e))
    }
}
