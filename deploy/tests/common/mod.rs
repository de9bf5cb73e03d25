use raffle_deploy::{chain::ChainClient, error::DeployError, Artifacts, ProgramArtifact};
use solana_program_test::{processor, ProgramTest, ProgramTestContext};
use solana_sdk::{
    account::Account,
    commitment_config::CommitmentConfig,
    hash::Hash,
    instruction::Instruction,
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    sysvar::clock::Clock,
    transaction::Transaction,
};
use tokio::runtime::Runtime;

/// In-memory chain with both programs preloaded, driven synchronously
pub struct TestChain {
    pub runtime: Runtime,
    pub context: ProgramTestContext,
    pub raffle_program: Pubkey,
    pub coordinator_program: Pubkey,
}

impl TestChain {
    pub fn start() -> Self {
        let raffle_program = Pubkey::new_unique();
        let coordinator_program = Pubkey::new_unique();

        let mut program_test = ProgramTest::new("raffle", raffle_program, processor!(raffle::process_instruction));
        program_test.add_program(
            "vrf_coordinator_mock",
            coordinator_program,
            processor!(vrf_coordinator_mock::process_instruction),
        );

        let runtime = Runtime::new().unwrap();
        let context = runtime.block_on(program_test.start_with_context());

        Self {
            runtime,
            context,
            raffle_program,
            coordinator_program,
        }
    }

    pub fn artifacts(&self) -> Artifacts {
        Artifacts {
            vrf_coordinator_mock: Some(ProgramArtifact::preloaded("vrf_coordinator_mock", self.coordinator_program)),
            raffle: Some(ProgramArtifact::preloaded("raffle", self.raffle_program)),
        }
    }

    pub fn increase_time(&mut self, seconds: i64) {
        let mut clock: Clock = self.runtime.block_on(self.context.banks_client.get_sysvar()).unwrap();
        clock.unix_timestamp += seconds;
        self.context.set_sysvar(&clock);
    }

    pub fn balance(&mut self, pubkey: &Pubkey) -> u64 {
        self.runtime
            .block_on(self.context.banks_client.get_balance(*pubkey))
            .unwrap()
    }
}

fn query_error(e: impl std::fmt::Display) -> DeployError {
    DeployError::Query(e.to_string())
}

fn transaction_error(e: impl std::fmt::Display) -> DeployError {
    DeployError::Transaction(e.to_string())
}

impl ChainClient for TestChain {
    fn payer(&self) -> &Keypair {
        &self.context.payer
    }

    fn genesis_hash(&mut self) -> Result<Hash, DeployError> {
        Ok(self.context.genesis_config().hash())
    }

    fn get_account(&mut self, pubkey: &Pubkey) -> Result<Option<Account>, DeployError> {
        self.runtime
            .block_on(self.context.banks_client.get_account(*pubkey))
            .map_err(query_error)
    }

    fn minimum_balance_for_rent_exemption(&mut self, data_len: usize) -> Result<u64, DeployError> {
        let rent = self
            .runtime
            .block_on(self.context.banks_client.get_rent())
            .map_err(query_error)?;
        Ok(rent.minimum_balance(data_len))
    }

    fn send_and_confirm(
        &mut self,
        instructions: &[Instruction],
        signers: &[&Keypair],
        commitment: CommitmentConfig,
    ) -> Result<Signature, DeployError> {
        let blockhash = self
            .runtime
            .block_on(self.context.get_new_latest_blockhash())
            .map_err(query_error)?;

        let mut all_signers: Vec<&Keypair> = vec![&self.context.payer];
        all_signers.extend(signers.iter().copied().filter(|signer| signer.pubkey() != self.context.payer.pubkey()));
        let transaction = Transaction::new_signed_with_payer(
            instructions,
            Some(&self.context.payer.pubkey()),
            &all_signers,
            blockhash,
        );
        let signature = transaction.signatures[0];

        self.runtime
            .block_on(
                self.context
                    .banks_client
                    .process_transaction_with_commitment(transaction, commitment.commitment),
            )
            .map_err(transaction_error)?;
        Ok(signature)
    }
}
