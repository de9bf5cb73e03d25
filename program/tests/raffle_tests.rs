use solana_program::program_pack::Pack;
use solana_program_test::*;
use solana_sdk::{
    account::Account,
    instruction::{Instruction, InstructionError},
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    system_instruction,
    sysvar::clock::Clock,
    transaction::{Transaction, TransactionError},
};

use raffle::{
    process_instruction,
    raffle_error::RaffleError,
    raffle_instruction::{self, winner_candidates, RaffleArgs},
    raffle_state::{Raffle, RaffleState, MAX_PLAYERS, NUM_WORDS, REQUEST_CONFIRMATIONS},
    utils::find_raffle_address,
    vrf::get_random_winner_index,
};
use vrf_coordinator_mock::{
    error::VrfCoordinatorError,
    instruction as coordinator_instruction,
    pda::{find_coordinator_address, find_request_address},
    processor::generate_words,
    state::{CoordinatorState, RandomnessRequest, Subscription},
};

const ENTRANCE_FEE: u64 = 100_000_000; // 0.1 SOL
const INTERVAL: u64 = 30;
const BASE_FEE: u64 = 250_000_000;
const GAS_PRICE_LINK: u64 = 1_000;
const FUND_AMOUNT: u64 = 30_000_000_000;
const GAS_LANE: [u8; 32] = [7u8; 32];

struct TestEnv {
    context: ProgramTestContext,
    raffle_program: Pubkey,
    coordinator_program: Pubkey,
    raffle_pubkey: Pubkey,
    sub_id: u64,
}

// Start both programs, create and fund a subscription, deploy the raffle and register it as consumer
async fn setup() -> TestEnv {
    setup_with(|_, _, _| {}).await
}

// Same as `setup`, with a hook to preload accounts before the bank starts
async fn setup_with(preload: impl FnOnce(&mut ProgramTest, &Pubkey, &Pubkey)) -> TestEnv {
    let raffle_program = Pubkey::new_unique();
    let coordinator_program = Pubkey::new_unique();

    let mut program_test = ProgramTest::new("raffle", raffle_program, processor!(process_instruction));
    program_test.add_program(
        "vrf_coordinator_mock",
        coordinator_program,
        processor!(vrf_coordinator_mock::process_instruction),
    );
    preload(&mut program_test, &raffle_program, &coordinator_program);

    let context = program_test.start_with_context().await;
    let (raffle_pubkey, _) = find_raffle_address(&raffle_program);
    let mut env = TestEnv {
        context,
        raffle_program,
        coordinator_program,
        raffle_pubkey,
        sub_id: 1,
    };

    let payer = env.context.payer.pubkey();
    env.send(
        &[
            coordinator_instruction::initialize(&coordinator_program, &payer, BASE_FEE, GAS_PRICE_LINK),
            coordinator_instruction::create_subscription(&coordinator_program, &payer, env.sub_id),
            coordinator_instruction::fund_subscription(&coordinator_program, &payer, env.sub_id, FUND_AMOUNT),
            raffle_instruction::initialize_raffle(
                &raffle_program,
                &payer,
                RaffleArgs {
                    entrance_fee: ENTRANCE_FEE,
                    interval: INTERVAL,
                    vrf_coordinator: coordinator_program,
                    gas_lane: GAS_LANE,
                    subscription_id: env.sub_id,
                    callback_gas_limit: 500_000,
                },
            ),
            coordinator_instruction::add_consumer(&coordinator_program, &payer, env.sub_id, &raffle_pubkey),
        ],
        &[],
    )
    .await
    .unwrap();

    env
}

impl TestEnv {
    // Sends the instructions paid by the context payer and returns the outcome with logs
    async fn send(&mut self, instructions: &[Instruction], signers: &[&Keypair]) -> Result<Vec<String>, TransactionError> {
        let blockhash = self.context.get_new_latest_blockhash().await.unwrap();
        let mut all_signers = vec![&self.context.payer];
        all_signers.extend_from_slice(signers);

        let transaction = Transaction::new_signed_with_payer(
            instructions,
            Some(&self.context.payer.pubkey()),
            &all_signers,
            blockhash,
        );

        let outcome = self
            .context
            .banks_client
            .process_transaction_with_metadata(transaction)
            .await
            .unwrap();
        let logs = outcome.metadata.map(|metadata| metadata.log_messages).unwrap_or_default();
        outcome.result.map(|_| logs)
    }

    async fn raffle(&mut self) -> Raffle {
        let account = self
            .context
            .banks_client
            .get_account(self.raffle_pubkey)
            .await
            .unwrap()
            .unwrap();
        Raffle::unpack(&account.data).unwrap()
    }

    async fn balance(&mut self, pubkey: Pubkey) -> u64 {
        self.context.banks_client.get_balance(pubkey).await.unwrap()
    }

    async fn next_request_id(&mut self) -> u64 {
        let (coordinator_state, _) = find_coordinator_address(&self.coordinator_program);
        let account = self
            .context
            .banks_client
            .get_account(coordinator_state)
            .await
            .unwrap()
            .unwrap();
        CoordinatorState::unpack(&account.data).unwrap().next_request_id()
    }

    async fn funded_player(&mut self) -> Keypair {
        let player = Keypair::new();
        let payer = self.context.payer.pubkey();
        self.send(&[system_instruction::transfer(&payer, &player.pubkey(), 1_000_000_000)], &[])
            .await
            .unwrap();
        player
    }

    async fn enter(&mut self, player: &Keypair, amount: u64) -> Result<Vec<String>, TransactionError> {
        let instruction = raffle_instruction::enter_raffle(&self.raffle_program, &player.pubkey(), amount);
        self.send(&[instruction], &[player]).await
    }

    async fn check_upkeep(&mut self) -> bool {
        let instruction = raffle_instruction::check_upkeep(&self.raffle_program);
        let logs = self.send(&[instruction], &[]).await.unwrap();
        logs.iter().any(|line| line.contains("UpkeepChecked upkeep_needed=true"))
    }

    async fn perform_upkeep(&mut self) -> Result<Vec<String>, TransactionError> {
        let request_id = self.next_request_id().await;
        let instruction = raffle_instruction::perform_upkeep(
            &self.raffle_program,
            &self.context.payer.pubkey(),
            &self.coordinator_program,
            self.sub_id,
            request_id,
        );
        self.send(&[instruction], &[]).await
    }

    async fn fulfill(&mut self, request_id: u64, players: &[Pubkey]) -> Result<Vec<String>, TransactionError> {
        let instruction = coordinator_instruction::fulfill_random_words(
            &self.coordinator_program,
            &self.context.payer.pubkey(),
            request_id,
            self.sub_id,
            &self.raffle_program,
            &self.raffle_pubkey,
            &winner_candidates(players),
            None,
        );
        self.send(&[instruction], &[]).await
    }

    // Moves the cluster clock forward, like evm_increaseTime followed by evm_mine
    async fn increase_time(&mut self, seconds: i64) {
        let mut clock: Clock = self.context.banks_client.get_sysvar().await.unwrap();
        clock.unix_timestamp += seconds;
        self.context.set_sysvar(&clock);
    }

    async fn now(&mut self) -> i64 {
        let clock: Clock = self.context.banks_client.get_sysvar().await.unwrap();
        clock.unix_timestamp
    }
}

// A pending coordinator request for the raffle that `PerformUpkeep` never made
fn preload_stray_request(program_test: &mut ProgramTest, raffle_program: &Pubkey, coordinator_program: &Pubkey, request_id: u64) {
    let request = RandomnessRequest {
        is_initialized: true,
        request_id,
        sub_id: 1,
        consumer: find_raffle_address(raffle_program).0,
        consumer_program: *raffle_program,
        callback_gas_limit: 500_000,
        num_words: NUM_WORDS,
        key_hash: GAS_LANE,
        requester: Pubkey::new_unique(),
    };
    let mut data = vec![0u8; RandomnessRequest::LEN];
    RandomnessRequest::pack(request, &mut data).unwrap();

    program_test.add_account(
        find_request_address(coordinator_program, request_id).0,
        Account {
            lamports: 1_000_000_000,
            data,
            owner: *coordinator_program,
            executable: false,
            rent_epoch: 0,
        },
    );
}

fn raffle_error(code: RaffleError) -> TransactionError {
    TransactionError::InstructionError(0, InstructionError::Custom(code as u32))
}

mod constructor {
    use super::*;

    #[tokio::test]
    async fn initializes_the_raffle_correctly() {
        let mut env = setup().await;
        let raffle = env.raffle().await;

        assert!(raffle.is_initialized);
        assert_eq!(raffle.raffle_state, RaffleState::Open);
        assert_eq!(raffle.interval, INTERVAL);
        assert_eq!(raffle.entrance_fee, ENTRANCE_FEE);
        assert_eq!(raffle.vrf_coordinator, env.coordinator_program);
        assert_eq!(raffle.gas_lane, GAS_LANE);
        assert_eq!(raffle.subscription_id, env.sub_id);
        assert_eq!(raffle.num_words(), NUM_WORDS);
        assert_eq!(raffle.request_confirmations(), REQUEST_CONFIRMATIONS);
        assert!(raffle.players().is_empty());
        assert_eq!(raffle.recent_winner, Pubkey::default());
    }

    #[tokio::test]
    async fn cannot_initialize_twice() {
        let mut env = setup().await;
        let payer = env.context.payer.pubkey();
        let instruction = raffle_instruction::initialize_raffle(
            &env.raffle_program,
            &payer,
            RaffleArgs {
                entrance_fee: 1,
                interval: 1,
                vrf_coordinator: env.coordinator_program,
                gas_lane: GAS_LANE,
                subscription_id: env.sub_id,
                callback_gas_limit: 500_000,
            },
        );

        let result = env.send(&[instruction], &[]).await;
        assert_eq!(
            result.unwrap_err(),
            TransactionError::InstructionError(0, InstructionError::AccountAlreadyInitialized)
        );
        assert_eq!(env.raffle().await.entrance_fee, ENTRANCE_FEE);
    }
}

mod enter_raffle {
    use super::*;

    #[tokio::test]
    async fn reverts_when_you_dont_pay_enough() {
        let mut env = setup().await;
        let player = env.funded_player().await;

        let result = env.enter(&player, 0).await;
        assert_eq!(result.unwrap_err(), raffle_error(RaffleError::LowEntranceFee));

        let result = env.enter(&player, ENTRANCE_FEE - 1).await;
        assert_eq!(result.unwrap_err(), raffle_error(RaffleError::LowEntranceFee));
    }

    #[tokio::test]
    async fn records_players_when_they_enter() {
        let mut env = setup().await;
        let player = env.funded_player().await;
        let pot_before = env.balance(env.raffle_pubkey).await;

        env.enter(&player, ENTRANCE_FEE).await.unwrap();

        let raffle = env.raffle().await;
        assert_eq!(raffle.players(), &[player.pubkey()]);
        assert_eq!(env.balance(env.raffle_pubkey).await, pot_before + ENTRANCE_FEE);
    }

    #[tokio::test]
    async fn emits_event_on_enter() {
        let mut env = setup().await;
        let player = env.funded_player().await;

        let logs = env.enter(&player, ENTRANCE_FEE).await.unwrap();
        let expected = format!("RaffleEntered player={}", player.pubkey());
        assert!(logs.iter().any(|line| line.contains(&expected)));
    }

    #[tokio::test]
    async fn doesnt_allow_entrance_when_raffle_is_calculating() {
        let mut env = setup().await;
        let player = env.funded_player().await;
        env.enter(&player, ENTRANCE_FEE).await.unwrap();
        env.increase_time(INTERVAL as i64 + 1).await;

        // we pretend to be a keeper for a second
        env.perform_upkeep().await.unwrap();

        let result = env.enter(&player, ENTRANCE_FEE).await;
        assert_eq!(result.unwrap_err(), raffle_error(RaffleError::NotOpen));
    }

    #[tokio::test]
    async fn reverts_when_the_raffle_is_full() {
        let mut env = setup().await;
        let deployer = env.context.payer.pubkey();
        let enter = raffle_instruction::enter_raffle(&env.raffle_program, &deployer, ENTRANCE_FEE);

        for _ in 0..MAX_PLAYERS / 8 {
            env.send(&vec![enter.clone(); 8], &[]).await.unwrap();
        }
        assert_eq!(env.raffle().await.players().len(), MAX_PLAYERS);
        let pot = env.balance(env.raffle_pubkey).await;

        let result = env.send(&[enter], &[]).await;
        assert_eq!(result.unwrap_err(), raffle_error(RaffleError::RaffleFull));
        assert_eq!(env.balance(env.raffle_pubkey).await, pot);
    }

    #[tokio::test]
    async fn the_same_player_can_enter_twice() {
        let mut env = setup().await;
        let player = env.funded_player().await;

        env.enter(&player, ENTRANCE_FEE).await.unwrap();
        env.enter(&player, ENTRANCE_FEE * 2).await.unwrap();

        assert_eq!(env.raffle().await.players(), &[player.pubkey(), player.pubkey()]);
    }
}

mod check_upkeep {
    use super::*;

    #[tokio::test]
    async fn returns_false_if_people_havent_sent_any_sol() {
        let mut env = setup().await;
        env.increase_time(INTERVAL as i64 + 1).await;

        assert!(!env.check_upkeep().await);
    }

    #[tokio::test]
    async fn returns_false_if_raffle_isnt_open() {
        let mut env = setup().await;
        let player = env.funded_player().await;
        env.enter(&player, ENTRANCE_FEE).await.unwrap();
        env.increase_time(INTERVAL as i64 + 1).await;
        env.perform_upkeep().await.unwrap();

        assert_eq!(env.raffle().await.raffle_state, RaffleState::Calculating);
        assert!(!env.check_upkeep().await);
    }

    #[tokio::test]
    async fn returns_false_if_enough_time_hasnt_passed() {
        let mut env = setup().await;
        let player = env.funded_player().await;
        env.enter(&player, ENTRANCE_FEE).await.unwrap();

        // interval has to be strictly exceeded
        let last_draw_time = env.raffle().await.last_draw_time;
        let elapsed = env.now().await - last_draw_time;
        env.increase_time(INTERVAL as i64 - elapsed).await;

        assert!(!env.check_upkeep().await);
    }

    #[tokio::test]
    async fn returns_true_if_enough_time_has_passed_has_players_and_is_open() {
        let mut env = setup().await;
        let player = env.funded_player().await;
        env.enter(&player, ENTRANCE_FEE).await.unwrap();
        env.increase_time(INTERVAL as i64 + 1).await;

        assert!(env.check_upkeep().await);
    }
}

mod perform_upkeep {
    use super::*;

    #[tokio::test]
    async fn can_only_run_if_check_upkeep_is_true() {
        let mut env = setup().await;
        let player = env.funded_player().await;
        env.enter(&player, ENTRANCE_FEE).await.unwrap();
        env.increase_time(INTERVAL as i64 + 1).await;

        env.perform_upkeep().await.unwrap();
    }

    #[tokio::test]
    async fn reverts_if_check_upkeep_is_false() {
        let mut env = setup().await;

        let result = env.perform_upkeep().await;
        assert_eq!(result.unwrap_err(), raffle_error(RaffleError::UpKeepNotNeeded));
    }

    #[tokio::test]
    async fn updates_the_raffle_state_and_emits_a_request_id() {
        let mut env = setup().await;
        let player = env.funded_player().await;
        env.enter(&player, ENTRANCE_FEE).await.unwrap();
        env.increase_time(INTERVAL as i64 + 1).await;

        let logs = env.perform_upkeep().await.unwrap();

        let raffle = env.raffle().await;
        assert_eq!(raffle.raffle_state, RaffleState::Calculating);
        assert!(raffle.pending_request_id > 0);

        let expected = format!("RequestedRaffleWinner request_id={}", raffle.pending_request_id);
        assert!(logs.iter().any(|line| line.contains(&expected)));
        assert!(logs.iter().any(|line| line.contains("RandomWordsRequested")));
    }
}

mod fulfill_random_words {
    use super::*;

    async fn ready_env() -> (TestEnv, Keypair) {
        let mut env = setup().await;
        let player = env.funded_player().await;
        env.enter(&player, ENTRANCE_FEE).await.unwrap();
        env.increase_time(INTERVAL as i64 + 1).await;
        (env, player)
    }

    #[tokio::test]
    async fn can_only_be_called_after_perform_upkeep() {
        let (mut env, player) = ready_env().await;
        let players = [player.pubkey()];

        for request_id in [0u64, 1] {
            let result = env.fulfill(request_id, &players).await;
            assert_eq!(
                result.unwrap_err(),
                TransactionError::InstructionError(
                    0,
                    InstructionError::Custom(VrfCoordinatorError::NonexistentRequest as u32)
                )
            );
        }
    }

    #[tokio::test]
    async fn rejects_callbacks_not_signed_by_the_coordinator() {
        let (mut env, player) = ready_env().await;
        env.perform_upkeep().await.unwrap();
        let request_id = env.raffle().await.pending_request_id;

        // the payer poses as the coordinator authority
        let instruction = vrf_coordinator_mock::consumer::fulfill_random_words_callback(
            &env.raffle_program,
            &env.context.payer.pubkey(),
            &env.raffle_pubkey,
            &winner_candidates(&[player.pubkey()]),
            request_id,
            &[[0u8; 32]],
        );

        let result = env.send(&[instruction], &[]).await;
        assert_eq!(result.unwrap_err(), raffle_error(RaffleError::OnlyCoordinatorCanFulfill));
        assert_eq!(env.raffle().await.raffle_state, RaffleState::Calculating);
    }

    #[tokio::test]
    async fn rejects_requests_while_open() {
        let mut env = setup_with(|program_test, raffle_program, coordinator_program| {
            preload_stray_request(program_test, raffle_program, coordinator_program, 99)
        })
        .await;
        let player = env.funded_player().await;
        env.enter(&player, ENTRANCE_FEE).await.unwrap();

        let result = env.fulfill(99, &[player.pubkey()]).await;
        assert_eq!(
            result.unwrap_err(),
            TransactionError::InstructionError(0, InstructionError::Custom(RaffleError::UnexpectedRequest as u32))
        );

        let raffle = env.raffle().await;
        assert_eq!(raffle.raffle_state, RaffleState::Open);
        assert_eq!(raffle.players(), &[player.pubkey()]);
    }

    #[tokio::test]
    async fn rejects_a_request_other_than_the_pending_one() {
        let mut env = setup_with(|program_test, raffle_program, coordinator_program| {
            preload_stray_request(program_test, raffle_program, coordinator_program, 99)
        })
        .await;
        let player = env.funded_player().await;
        env.enter(&player, ENTRANCE_FEE).await.unwrap();
        env.increase_time(INTERVAL as i64 + 1).await;
        env.perform_upkeep().await.unwrap();
        let pending = env.raffle().await.pending_request_id;
        assert_ne!(pending, 99);

        let result = env.fulfill(99, &[player.pubkey()]).await;
        assert_eq!(
            result.unwrap_err(),
            TransactionError::InstructionError(0, InstructionError::Custom(RaffleError::UnexpectedRequest as u32))
        );
        assert_eq!(env.raffle().await.raffle_state, RaffleState::Calculating);

        // the pending request still settles the draw
        env.fulfill(pending, &[player.pubkey()]).await.unwrap();
        assert_eq!(env.raffle().await.recent_winner, player.pubkey());
    }

    #[tokio::test]
    async fn fails_when_the_winner_account_is_not_forwarded() {
        let (mut env, _player) = ready_env().await;
        env.perform_upkeep().await.unwrap();
        let request_id = env.raffle().await.pending_request_id;

        let result = env.fulfill(request_id, &[]).await;
        assert_eq!(
            result.unwrap_err(),
            TransactionError::InstructionError(0, InstructionError::Custom(RaffleError::WinnerAccountMissing as u32))
        );
    }

    #[tokio::test]
    async fn picks_a_winner_resets_and_sends_money() {
        let mut env = setup().await;
        let rent = env.context.banks_client.get_rent().await.unwrap();
        let reserve = rent.minimum_balance(Raffle::LEN);

        // the deployer plays too, alongside three extra entrants
        let mut entrants = Vec::new();
        for _ in 0..3 {
            entrants.push(env.funded_player().await);
        }
        for entrant in &entrants {
            env.enter(entrant, ENTRANCE_FEE).await.unwrap();
        }
        let deployer = env.context.payer.pubkey();
        env.send(&[raffle_instruction::enter_raffle(&env.raffle_program, &deployer, ENTRANCE_FEE)], &[])
            .await
            .unwrap();

        let starting_timestamp = env.raffle().await.last_draw_time;
        env.increase_time(INTERVAL as i64 + 1).await;
        env.perform_upkeep().await.unwrap();

        let raffle = env.raffle().await;
        let players = raffle.players().to_vec();
        assert_eq!(players.len(), 4);
        let request_id = raffle.pending_request_id;

        // the mock derives its words from the request id
        let word = generate_words(request_id, NUM_WORDS)[0];
        let winner = players[get_random_winner_index(word, players.len() as u64) as usize];
        let prize = ENTRANCE_FEE * 4;

        // the deployer pays the fulfillment fee, so only compare an entrant winner's balance
        let winner_starting_balance = env.balance(winner).await;

        let logs = env.fulfill(request_id, &players).await.unwrap();
        assert!(logs.iter().any(|line| line.contains(&format!("PickedRaffleWinner winner={}", winner))));
        assert!(logs.iter().any(|line| line.contains("RandomWordsFulfilled")));

        let raffle = env.raffle().await;
        assert_eq!(raffle.recent_winner, winner);
        assert_eq!(raffle.raffle_state, RaffleState::Open);
        assert!(raffle.players().is_empty());
        assert_eq!(raffle.pending_request_id, 0);
        assert!(raffle.last_draw_time > starting_timestamp);
        assert_eq!(env.balance(env.raffle_pubkey).await, reserve);

        if winner != deployer {
            assert_eq!(env.balance(winner).await, winner_starting_balance + prize);
        }

        // the subscription paid for one word
        let (subscription_pubkey, _) =
            vrf_coordinator_mock::pda::find_subscription_address(&env.coordinator_program, env.sub_id);
        let subscription_account = env
            .context
            .banks_client
            .get_account(subscription_pubkey)
            .await
            .unwrap()
            .unwrap();
        let subscription = Subscription::unpack(&subscription_account.data).unwrap();
        assert_eq!(subscription.balance, FUND_AMOUNT - (BASE_FEE + GAS_PRICE_LINK * NUM_WORDS as u64));
    }

    #[tokio::test]
    async fn override_words_choose_the_winner() {
        let mut env = setup().await;
        let mut entrants = Vec::new();
        for _ in 0..3 {
            let entrant = env.funded_player().await;
            env.enter(&entrant, ENTRANCE_FEE).await.unwrap();
            entrants.push(entrant);
        }
        env.increase_time(INTERVAL as i64 + 1).await;
        env.perform_upkeep().await.unwrap();

        let raffle = env.raffle().await;
        let players = raffle.players().to_vec();
        let request_id = raffle.pending_request_id;

        // 7 % 3 picks the second entrant
        let mut word = [0u8; 32];
        word[..8].copy_from_slice(&7u64.to_le_bytes());
        let winner = players[1];
        let winner_starting_balance = env.balance(winner).await;

        // a word count other than the requested one is refused
        let wrong_count = coordinator_instruction::fulfill_random_words(
            &env.coordinator_program,
            &env.context.payer.pubkey(),
            request_id,
            env.sub_id,
            &env.raffle_program,
            &env.raffle_pubkey,
            &winner_candidates(&players),
            Some(vec![word, word]),
        );
        let result = env.send(&[wrong_count], &[]).await;
        assert_eq!(
            result.unwrap_err(),
            TransactionError::InstructionError(
                0,
                InstructionError::Custom(VrfCoordinatorError::InvalidRandomWords as u32)
            )
        );

        let fulfill = coordinator_instruction::fulfill_random_words(
            &env.coordinator_program,
            &env.context.payer.pubkey(),
            request_id,
            env.sub_id,
            &env.raffle_program,
            &env.raffle_pubkey,
            &winner_candidates(&players),
            Some(vec![word]),
        );
        env.send(&[fulfill], &[]).await.unwrap();

        let raffle = env.raffle().await;
        assert_eq!(raffle.recent_winner, winner);
        assert_eq!(raffle.raffle_state, RaffleState::Open);
        assert_eq!(env.balance(winner).await, winner_starting_balance + ENTRANCE_FEE * 3);
    }
}
