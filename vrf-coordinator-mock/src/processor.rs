use solana_program::{
    account_info::{next_account_info, AccountInfo},
    entrypoint::ProgramResult,
    instruction::AccountMeta,
    keccak,
    msg,
    program::{invoke, invoke_signed},
    program_error::ProgramError,
    program_pack::{IsInitialized, Pack},
    pubkey::Pubkey,
    rent::Rent,
    system_instruction, system_program,
    sysvar::Sysvar,
};

use crate::{
    consumer,
    error::VrfCoordinatorError,
    events::CoordinatorEvent,
    instruction::CoordinatorInstruction,
    pda::{
        find_coordinator_address, find_request_address, find_subscription_address, COORDINATOR_SEED,
        REQUEST_SEED, SUBSCRIPTION_SEED,
    },
    state::{CoordinatorState, RandomnessRequest, Subscription, MAX_NUM_WORDS, MAX_REQUEST_CONFIRMATIONS},
};

pub struct Processor;

impl Processor {
    pub fn process(program_id: &Pubkey, accounts: &[AccountInfo], instruction_data: &[u8]) -> ProgramResult {
        let instruction = CoordinatorInstruction::unpack(instruction_data)?;

        match instruction {
            CoordinatorInstruction::Initialize { base_fee, gas_price_link } => {
                msg!("Instruction: Initialize");
                Self::process_initialize(accounts, base_fee, gas_price_link, program_id)
            }
            CoordinatorInstruction::CreateSubscription => {
                msg!("Instruction: Create Subscription");
                Self::process_create_subscription(accounts, program_id)
            }
            CoordinatorInstruction::FundSubscription { sub_id, amount } => {
                msg!("Instruction: Fund Subscription");
                Self::process_fund_subscription(accounts, sub_id, amount, program_id)
            }
            CoordinatorInstruction::AddConsumer { sub_id, consumer } => {
                msg!("Instruction: Add Consumer");
                Self::process_add_consumer(accounts, sub_id, consumer, program_id)
            }
            CoordinatorInstruction::RemoveConsumer { sub_id, consumer } => {
                msg!("Instruction: Remove Consumer");
                Self::process_remove_consumer(accounts, sub_id, consumer, program_id)
            }
            CoordinatorInstruction::CancelSubscription { sub_id } => {
                msg!("Instruction: Cancel Subscription");
                Self::process_cancel_subscription(accounts, sub_id, program_id)
            }
            CoordinatorInstruction::RequestRandomWords {
                key_hash,
                sub_id,
                request_confirmations,
                callback_gas_limit,
                num_words,
            } => {
                msg!("Instruction: Request Random Words");
                Self::process_request_random_words(
                    accounts,
                    key_hash,
                    sub_id,
                    request_confirmations,
                    callback_gas_limit,
                    num_words,
                    program_id,
                )
            }
            CoordinatorInstruction::FulfillRandomWords { request_id } => {
                msg!("Instruction: Fulfill Random Words");
                Self::process_fulfill_random_words(accounts, request_id, None, program_id)
            }
            CoordinatorInstruction::FulfillRandomWordsWithOverride { request_id, words } => {
                msg!("Instruction: Fulfill Random Words With Override");
                Self::process_fulfill_random_words(accounts, request_id, Some(words), program_id)
            }
        }
    }

    fn process_initialize(
        accounts: &[AccountInfo],
        base_fee: u64,
        gas_price_link: u64,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let deployer_info = next_account_info(account_info_iter)?;
        let coordinator_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !deployer_info.is_signer {
            msg!("Deployer must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let (expected_coordinator, bump) = find_coordinator_address(program_id);
        if *coordinator_info.key != expected_coordinator {
            msg!("Invalid coordinator account address");
            return Err(ProgramError::InvalidArgument);
        }

        if coordinator_info.owner == program_id {
            msg!("Coordinator is already initialized");
            return Err(ProgramError::AccountAlreadyInitialized);
        }

        create_pda_account(
            deployer_info,
            coordinator_info,
            system_program_info,
            CoordinatorState::LEN,
            program_id,
            &[COORDINATOR_SEED, &[bump]],
        )?;

        let state = CoordinatorState {
            is_initialized: true,
            admin: *deployer_info.key,
            base_fee,
            gas_price_link,
            current_sub_id: 0,
            request_counter: 0,
            bump,
        };
        CoordinatorState::pack(state, &mut coordinator_info.data.borrow_mut())?;

        msg!("Coordinator initialized: BaseFee={}, GasPriceLink={}", base_fee, gas_price_link);
        Ok(())
    }

    fn process_create_subscription(accounts: &[AccountInfo], program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let owner_info = next_account_info(account_info_iter)?;
        let coordinator_info = next_account_info(account_info_iter)?;
        let subscription_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !owner_info.is_signer {
            msg!("Subscription owner must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let mut coordinator = load_coordinator(coordinator_info, program_id)?;
        let sub_id = coordinator.next_sub_id();

        let (expected_subscription, bump) = find_subscription_address(program_id, sub_id);
        if *subscription_info.key != expected_subscription {
            msg!("Subscription account does not match next subscription id {}", sub_id);
            return Err(ProgramError::InvalidArgument);
        }

        create_pda_account(
            owner_info,
            subscription_info,
            system_program_info,
            Subscription::LEN,
            program_id,
            &[SUBSCRIPTION_SEED, &sub_id.to_le_bytes(), &[bump]],
        )?;

        Subscription::pack(Subscription::new(sub_id, *owner_info.key), &mut subscription_info.data.borrow_mut())?;

        coordinator.current_sub_id = sub_id;
        CoordinatorState::pack(coordinator, &mut coordinator_info.data.borrow_mut())?;

        CoordinatorEvent::SubscriptionCreated {
            sub_id,
            owner: *owner_info.key,
        }
        .emit();
        Ok(())
    }

    fn process_fund_subscription(
        accounts: &[AccountInfo],
        sub_id: u64,
        amount: u64,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let funder_info = next_account_info(account_info_iter)?;
        let subscription_info = next_account_info(account_info_iter)?;

        if !funder_info.is_signer {
            msg!("Funder must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let mut subscription = load_subscription(subscription_info, sub_id, program_id)?;
        let old_balance = subscription.balance;
        subscription.balance = old_balance
            .checked_add(amount)
            .ok_or(VrfCoordinatorError::Overflow)?;
        Subscription::pack(subscription, &mut subscription_info.data.borrow_mut())?;

        CoordinatorEvent::SubscriptionFunded {
            sub_id,
            old_balance,
            new_balance: subscription.balance,
        }
        .emit();
        Ok(())
    }

    fn process_add_consumer(
        accounts: &[AccountInfo],
        sub_id: u64,
        consumer: Pubkey,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let owner_info = next_account_info(account_info_iter)?;
        let subscription_info = next_account_info(account_info_iter)?;

        let mut subscription = load_subscription(subscription_info, sub_id, program_id)?;
        check_sub_owner(owner_info, &subscription)?;

        if !subscription.add_consumer(consumer)? {
            msg!("Consumer {} already registered on subscription {}", consumer, sub_id);
            return Ok(());
        }
        Subscription::pack(subscription, &mut subscription_info.data.borrow_mut())?;

        CoordinatorEvent::ConsumerAdded { sub_id, consumer }.emit();
        Ok(())
    }

    fn process_remove_consumer(
        accounts: &[AccountInfo],
        sub_id: u64,
        consumer: Pubkey,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let owner_info = next_account_info(account_info_iter)?;
        let subscription_info = next_account_info(account_info_iter)?;

        let mut subscription = load_subscription(subscription_info, sub_id, program_id)?;
        check_sub_owner(owner_info, &subscription)?;

        subscription.remove_consumer(&consumer)?;
        Subscription::pack(subscription, &mut subscription_info.data.borrow_mut())?;

        CoordinatorEvent::ConsumerRemoved { sub_id, consumer }.emit();
        Ok(())
    }

    fn process_cancel_subscription(accounts: &[AccountInfo], sub_id: u64, program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let owner_info = next_account_info(account_info_iter)?;
        let subscription_info = next_account_info(account_info_iter)?;

        let subscription = load_subscription(subscription_info, sub_id, program_id)?;
        check_sub_owner(owner_info, &subscription)?;

        close_account(subscription_info, owner_info)?;

        CoordinatorEvent::SubscriptionCanceled {
            sub_id,
            to: *owner_info.key,
            amount: subscription.balance,
        }
        .emit();
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn process_request_random_words(
        accounts: &[AccountInfo],
        key_hash: [u8; 32],
        sub_id: u64,
        request_confirmations: u16,
        callback_gas_limit: u32,
        num_words: u32,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let payer_info = next_account_info(account_info_iter)?;
        let consumer_info = next_account_info(account_info_iter)?;
        let coordinator_info = next_account_info(account_info_iter)?;
        let subscription_info = next_account_info(account_info_iter)?;
        let request_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !payer_info.is_signer {
            msg!("Payer must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        // The consumer state account proves the calling program through its PDA signature
        if !consumer_info.is_signer {
            msg!("Consumer state account must sign the request");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let mut coordinator = load_coordinator(coordinator_info, program_id)?;
        let mut subscription = load_subscription(subscription_info, sub_id, program_id)?;

        if !subscription.is_consumer(consumer_info.key) {
            msg!("Consumer {} is not registered on subscription {}", consumer_info.key, sub_id);
            return Err(VrfCoordinatorError::InvalidConsumer.into());
        }

        if request_confirmations > MAX_REQUEST_CONFIRMATIONS {
            return Err(VrfCoordinatorError::InvalidRequestConfirmations.into());
        }

        if num_words == 0 {
            return Err(VrfCoordinatorError::ZeroNumWords.into());
        }
        if num_words > MAX_NUM_WORDS {
            msg!("Requested {} words, at most {} allowed", num_words, MAX_NUM_WORDS);
            return Err(VrfCoordinatorError::NumWordsTooBig.into());
        }

        let request_id = coordinator.next_request_id();
        let (expected_request, bump) = find_request_address(program_id, request_id);
        if *request_info.key != expected_request {
            msg!("Request account does not match next request id {}", request_id);
            return Err(ProgramError::InvalidArgument);
        }

        create_pda_account(
            payer_info,
            request_info,
            system_program_info,
            RandomnessRequest::LEN,
            program_id,
            &[REQUEST_SEED, &request_id.to_le_bytes(), &[bump]],
        )?;

        let request = RandomnessRequest {
            is_initialized: true,
            request_id,
            sub_id,
            consumer: *consumer_info.key,
            consumer_program: *consumer_info.owner,
            callback_gas_limit,
            num_words,
            key_hash,
            requester: *payer_info.key,
        };
        RandomnessRequest::pack(request, &mut request_info.data.borrow_mut())?;

        coordinator.request_counter = request_id;
        CoordinatorState::pack(coordinator, &mut coordinator_info.data.borrow_mut())?;

        subscription.req_count = subscription.req_count.saturating_add(1);
        Subscription::pack(subscription, &mut subscription_info.data.borrow_mut())?;

        CoordinatorEvent::RandomWordsRequested {
            key_hash,
            request_id,
            pre_seed: request_id + 1,
            sub_id,
            minimum_request_confirmations: request_confirmations,
            callback_gas_limit,
            num_words,
            sender: *consumer_info.key,
        }
        .emit();
        Ok(())
    }

    fn process_fulfill_random_words(
        accounts: &[AccountInfo],
        request_id: u64,
        override_words: Option<Vec<[u8; 32]>>,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let caller_info = next_account_info(account_info_iter)?;
        let coordinator_info = next_account_info(account_info_iter)?;
        let request_info = next_account_info(account_info_iter)?;
        let subscription_info = next_account_info(account_info_iter)?;
        let consumer_program_info = next_account_info(account_info_iter)?;
        let consumer_info = next_account_info(account_info_iter)?;
        let forwarded: Vec<AccountInfo> = account_info_iter.cloned().collect();

        if !caller_info.is_signer {
            msg!("Caller must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let coordinator = load_coordinator(coordinator_info, program_id)?;
        let request = load_request(request_info, request_id, program_id)?;

        if *consumer_info.key != request.consumer {
            msg!("Consumer account does not match request {}", request_id);
            return Err(VrfCoordinatorError::InvalidConsumer.into());
        }
        if *consumer_program_info.key != request.consumer_program {
            msg!("Consumer program does not match request {}", request_id);
            return Err(VrfCoordinatorError::InvalidConsumerProgram.into());
        }

        let mut subscription = load_subscription(subscription_info, request.sub_id, program_id)?;

        let words = match override_words {
            Some(words) => {
                if words.len() != request.num_words as usize {
                    msg!("Expected {} words, got {}", request.num_words, words.len());
                    return Err(VrfCoordinatorError::InvalidRandomWords.into());
                }
                words
            }
            None => generate_words(request_id, request.num_words),
        };

        let payment = coordinator
            .payment(request.num_words)
            .ok_or(VrfCoordinatorError::Overflow)?;
        if subscription.balance < payment {
            msg!("Subscription {} balance {} below payment {}", request.sub_id, subscription.balance, payment);
            return Err(VrfCoordinatorError::InsufficientBalance.into());
        }

        let forwarded_metas: Vec<AccountMeta> = forwarded
            .iter()
            .map(|account| AccountMeta {
                pubkey: *account.key,
                is_signer: account.is_signer,
                is_writable: account.is_writable,
            })
            .collect();

        let callback = consumer::fulfill_random_words_callback(
            consumer_program_info.key,
            coordinator_info.key,
            consumer_info.key,
            &forwarded_metas,
            request_id,
            &words,
        );

        let mut callback_accounts = vec![
            coordinator_info.clone(),
            consumer_info.clone(),
            consumer_program_info.clone(),
        ];
        callback_accounts.extend(forwarded);

        invoke_signed(&callback, &callback_accounts, &[&[COORDINATOR_SEED, &[coordinator.bump]]])?;

        subscription.balance -= payment;
        Subscription::pack(subscription, &mut subscription_info.data.borrow_mut())?;

        close_account(request_info, caller_info)?;

        CoordinatorEvent::RandomWordsFulfilled {
            request_id,
            output_seed: request_id,
            payment,
            success: true,
        }
        .emit();
        Ok(())
    }
}

/// Word `i` of a request is `keccak(request_id || i)`.
pub fn generate_words(request_id: u64, num_words: u32) -> Vec<[u8; 32]> {
    (0..num_words as u64)
        .map(|i| keccak::hashv(&[&request_id.to_le_bytes(), &i.to_le_bytes()]).to_bytes())
        .collect()
}

fn load_coordinator(coordinator_info: &AccountInfo, program_id: &Pubkey) -> Result<CoordinatorState, ProgramError> {
    if coordinator_info.owner != program_id {
        msg!("Coordinator account must be owned by this program");
        return Err(ProgramError::IncorrectProgramId);
    }
    CoordinatorState::unpack(&coordinator_info.data.borrow())
}

fn load_subscription(
    subscription_info: &AccountInfo,
    sub_id: u64,
    program_id: &Pubkey,
) -> Result<Subscription, ProgramError> {
    if subscription_info.owner != program_id || subscription_info.data_len() != Subscription::LEN {
        msg!("Subscription {} does not exist", sub_id);
        return Err(VrfCoordinatorError::InvalidSubscription.into());
    }
    let subscription = Subscription::unpack_unchecked(&subscription_info.data.borrow())?;
    if !subscription.is_initialized() || subscription.id != sub_id {
        msg!("Subscription {} does not exist", sub_id);
        return Err(VrfCoordinatorError::InvalidSubscription.into());
    }
    Ok(subscription)
}

fn load_request(request_info: &AccountInfo, request_id: u64, program_id: &Pubkey) -> Result<RandomnessRequest, ProgramError> {
    let (expected_request, _) = find_request_address(program_id, request_id);
    if *request_info.key != expected_request
        || request_info.owner != program_id
        || request_info.data_len() != RandomnessRequest::LEN
    {
        msg!("nonexistent request {}", request_id);
        return Err(VrfCoordinatorError::NonexistentRequest.into());
    }
    let request = RandomnessRequest::unpack_unchecked(&request_info.data.borrow())?;
    if !request.is_initialized() || request.request_id != request_id {
        msg!("nonexistent request {}", request_id);
        return Err(VrfCoordinatorError::NonexistentRequest.into());
    }
    Ok(request)
}

fn check_sub_owner(owner_info: &AccountInfo, subscription: &Subscription) -> ProgramResult {
    if !owner_info.is_signer {
        msg!("Subscription owner must sign the transaction");
        return Err(ProgramError::MissingRequiredSignature);
    }
    if subscription.owner != *owner_info.key {
        msg!("Only the owner of subscription {} can do this", subscription.id);
        return Err(VrfCoordinatorError::MustBeSubOwner.into());
    }
    Ok(())
}

fn create_pda_account<'a>(
    payer_info: &AccountInfo<'a>,
    new_account_info: &AccountInfo<'a>,
    system_program_info: &AccountInfo<'a>,
    space: usize,
    program_id: &Pubkey,
    seeds: &[&[u8]],
) -> ProgramResult {
    if *system_program_info.key != system_program::id() {
        return Err(ProgramError::IncorrectProgramId);
    }
    let rent_lamports = Rent::get()?.minimum_balance(space);

    if new_account_info.lamports() > 0 {
        // Someone pre-funded the address; top it up, then allocate and assign
        let top_up = rent_lamports.saturating_sub(new_account_info.lamports());
        if top_up > 0 {
            invoke(
                &system_instruction::transfer(payer_info.key, new_account_info.key, top_up),
                &[payer_info.clone(), new_account_info.clone(), system_program_info.clone()],
            )?;
        }
        invoke_signed(
            &system_instruction::allocate(new_account_info.key, space as u64),
            &[new_account_info.clone(), system_program_info.clone()],
            &[seeds],
        )?;
        invoke_signed(
            &system_instruction::assign(new_account_info.key, program_id),
            &[new_account_info.clone(), system_program_info.clone()],
            &[seeds],
        )?;
    } else {
        invoke_signed(
            &system_instruction::create_account(
                payer_info.key,
                new_account_info.key,
                rent_lamports,
                space as u64,
                program_id,
            ),
            &[payer_info.clone(), new_account_info.clone(), system_program_info.clone()],
            &[seeds],
        )?;
    }
    Ok(())
}

fn close_account(account_info: &AccountInfo, destination_info: &AccountInfo) -> ProgramResult {
    let lamports = account_info.lamports();
    **account_info.lamports.borrow_mut() = 0;
    **destination_info.lamports.borrow_mut() = destination_info
        .lamports()
        .checked_add(lamports)
        .ok_or(VrfCoordinatorError::Overflow)?;
    account_info.data.borrow_mut().fill(0);
    Ok(())
}
