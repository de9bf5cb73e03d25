use solana_client::rpc_client::RpcClient;
use solana_sdk::{
    account::Account,
    commitment_config::CommitmentConfig,
    hash::Hash,
    instruction::Instruction,
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    transaction::Transaction,
};

use crate::error::DeployError;

/// The operations the deploy scripts need from a cluster
pub trait ChainClient {
    /// Keypair paying for every transaction, the `deployer` named account
    fn payer(&self) -> &Keypair;

    fn genesis_hash(&mut self) -> Result<Hash, DeployError>;

    fn get_account(&mut self, pubkey: &Pubkey) -> Result<Option<Account>, DeployError>;

    fn minimum_balance_for_rent_exemption(&mut self, data_len: usize) -> Result<u64, DeployError>;

    /// Signs with the payer plus `signers`, sends, and waits for `commitment`
    fn send_and_confirm(
        &mut self,
        instructions: &[Instruction],
        signers: &[&Keypair],
        commitment: CommitmentConfig,
    ) -> Result<Signature, DeployError>;
}

/// `ChainClient` over a JSON-RPC endpoint
pub struct RpcChain {
    client: RpcClient,
    payer: Keypair,
}

impl RpcChain {
    pub fn new(url: String, payer: Keypair) -> Self {
        Self {
            client: RpcClient::new_with_commitment(url, CommitmentConfig::confirmed()),
            payer,
        }
    }
}

impl ChainClient for RpcChain {
    fn payer(&self) -> &Keypair {
        &self.payer
    }

    fn genesis_hash(&mut self) -> Result<Hash, DeployError> {
        Ok(self.client.get_genesis_hash()?)
    }

    fn get_account(&mut self, pubkey: &Pubkey) -> Result<Option<Account>, DeployError> {
        Ok(self
            .client
            .get_account_with_commitment(pubkey, self.client.commitment())?
            .value)
    }

    fn minimum_balance_for_rent_exemption(&mut self, data_len: usize) -> Result<u64, DeployError> {
        Ok(self.client.get_minimum_balance_for_rent_exemption(data_len)?)
    }

    fn send_and_confirm(
        &mut self,
        instructions: &[Instruction],
        signers: &[&Keypair],
        commitment: CommitmentConfig,
    ) -> Result<Signature, DeployError> {
        let blockhash = self.client.get_latest_blockhash()?;
        let mut all_signers: Vec<&Keypair> = vec![&self.payer];
        all_signers.extend(signers.iter().copied().filter(|signer| signer.pubkey() != self.payer.pubkey()));

        let transaction =
            Transaction::new_signed_with_payer(instructions, Some(&self.payer.pubkey()), &all_signers, blockhash);

        let signature = self
            .client
            .send_and_confirm_transaction_with_spinner_and_commitment(&transaction, commitment)?;
        log::debug!("Confirmed {} at {:?}", signature, commitment.commitment);
        Ok(signature)
    }
}
