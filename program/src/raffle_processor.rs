use crate::raffle_error::RaffleError;
use crate::raffle_instruction::RaffleInstruction;
use crate::raffle_state::{RaffleConfig, Raffle, RandomnessConfig};
use crate::utils::{self, RAFFLE_SEED};
use crate::vrf::CpiCoordinator;

use solana_program::{
    account_info::{next_account_info, AccountInfo},
    entrypoint::ProgramResult,
    msg,
    program::{invoke, invoke_signed, set_return_data},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_instruction,
    system_program,
    sysvar::{clock::Clock, rent::Rent, Sysvar},
};

/// Log an engine error and hand it to the runtime
fn fail(err: RaffleError) -> ProgramError {
    msg!("Error: {}", err);
    err.into()
}

pub struct Processor;

impl Processor {
    pub fn process(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        instruction_data: &[u8],
    ) -> ProgramResult {
        let instruction = RaffleInstruction::unpack(instruction_data)?;

        match instruction {
            RaffleInstruction::InitializeRaffle {
                nonce,
                entrance_fee,
                interval,
                key_hash,
                subscription_id,
                callback_compute_limit,
            } => {
                msg!("Instruction: Initialize Raffle");
                let config = RaffleConfig {
                    entrance_fee,
                    interval,
                    randomness: RandomnessConfig {
                        key_hash,
                        subscription_id,
                        callback_compute_limit,
                        ..RandomnessConfig::default()
                    },
                };
                Self::process_initialize_raffle(accounts, nonce, config, program_id)
            }
            RaffleInstruction::Enter { amount } => {
                msg!("Instruction: Enter");
                Self::process_enter(accounts, amount, program_id)
            }
            RaffleInstruction::CheckDraw => {
                msg!("Instruction: Check Draw");
                Self::process_check_draw(accounts, program_id)
            }
            RaffleInstruction::RequestDraw => {
                msg!("Instruction: Request Draw");
                Self::process_request_draw(accounts, program_id)
            }
            RaffleInstruction::ResolveDraw {
                request_id,
                random_values,
            } => {
                msg!("Instruction: Resolve Draw");
                Self::process_resolve_draw(accounts, request_id, &random_values, program_id)
            }
            RaffleInstruction::GetPlayer { index } => {
                msg!("Instruction: Get Player");
                Self::process_get_player(accounts, index, program_id)
            }
        }
    }

    /// Process the InitializeRaffle instruction
    ///
    /// Creates the raffle PDA and opens the first round. The coordinator
    /// accounts are recorded as the only source of randomness for this raffle.
    fn process_initialize_raffle(
        accounts: &[AccountInfo],
        nonce: u64,
        mut config: RaffleConfig,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let authority_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let coordinator_program_info = next_account_info(account_info_iter)?;
        let coordinator_authority_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !authority_info.is_signer {
            msg!("Authority must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        if *system_program_info.key != system_program::id() {
            return Err(ProgramError::IncorrectProgramId);
        }

        let (expected_raffle_pubkey, bump_seed) =
            utils::find_raffle_address(program_id, authority_info.key, nonce);
        if *raffle_info.key != expected_raffle_pubkey {
            msg!("Invalid raffle account address");
            return Err(ProgramError::InvalidSeeds);
        }

        if raffle_info.owner == program_id {
            if Raffle::load_unchecked(raffle_info)?.is_initialized {
                return Err(fail(RaffleError::AlreadyInitialized));
            }
        } else {
            msg!("Creating new raffle account");
            let rent = Rent::get()?;
            let rent_lamports = rent.minimum_balance(Raffle::LEN);
            let nonce_bytes = nonce.to_le_bytes();

            invoke_signed(
                &system_instruction::create_account(
                    authority_info.key,
                    raffle_info.key,
                    rent_lamports,
                    Raffle::LEN as u64,
                    program_id,
                ),
                &[
                    authority_info.clone(),
                    raffle_info.clone(),
                    system_program_info.clone(),
                ],
                &[&[
                    RAFFLE_SEED,
                    authority_info.key.as_ref(),
                    &nonce_bytes,
                    &[bump_seed],
                ]],
            )?;
        }

        config.randomness.coordinator_program = *coordinator_program_info.key;
        config.randomness.coordinator_authority = *coordinator_authority_info.key;

        let clock = Clock::get()?;
        let raffle = Raffle::new(
            *authority_info.key,
            nonce,
            bump_seed,
            &config,
            clock.unix_timestamp,
        );
        raffle.save(raffle_info)?;

        msg!(
            "Raffle initialized: Fee={} SOL, Interval={}s, Coordinator={}",
            utils::lamports_to_sol(config.entrance_fee),
            config.interval,
            coordinator_program_info.key
        );
        Ok(())
    }

    fn process_enter(accounts: &[AccountInfo], amount: u64, program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let player_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !player_info.is_signer {
            msg!("Player must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        if raffle_info.owner != program_id {
            return Err(ProgramError::IncorrectProgramId);
        }

        let mut raffle = Raffle::load(raffle_info)?;
        let event = raffle.enter(*player_info.key, amount).map_err(fail)?;

        if amount > 0 {
            invoke(
                &system_instruction::transfer(player_info.key, raffle_info.key, amount),
                &[
                    player_info.clone(),
                    raffle_info.clone(),
                    system_program_info.clone(),
                ],
            )?;
        }

        raffle.save(raffle_info)?;
        event.emit();

        msg!(
            "Players: {}, Pot: {} lamports",
            raffle.player_count(),
            raffle.pot
        );
        Ok(())
    }

    fn process_check_draw(accounts: &[AccountInfo], program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let raffle_info = next_account_info(account_info_iter)?;

        if raffle_info.owner != program_id {
            return Err(ProgramError::IncorrectProgramId);
        }

        let raffle = Raffle::load(raffle_info)?;
        let now = Clock::get()?.unix_timestamp;
        let upkeep_needed = raffle.check_draw(now);

        msg!(
            "Upkeep needed: {} (status={:?}, players={}, pot={}, elapsed={}s of {}s)",
            upkeep_needed,
            raffle.status,
            raffle.player_count(),
            raffle.pot,
            raffle.seconds_since_last_draw(now),
            raffle.interval
        );
        set_return_data(&[upkeep_needed as u8]);
        Ok(())
    }

    /// Process RequestDraw instruction - step 1 of a draw
    ///
    /// Anyone may call this; the raffle decides on its own whether a draw is due.
    fn process_request_draw(accounts: &[AccountInfo], program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let caller_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let coordinator_program_info = next_account_info(account_info_iter)?;
        let coordinator_state_info = next_account_info(account_info_iter)?;

        if !caller_info.is_signer {
            msg!("Caller must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        if raffle_info.owner != program_id {
            return Err(ProgramError::IncorrectProgramId);
        }

        let mut raffle = Raffle::load(raffle_info)?;

        if raffle.randomness.coordinator_program != *coordinator_program_info.key {
            return Err(fail(RaffleError::CoordinatorMismatch));
        }

        let authority = raffle.authority;
        let nonce_bytes = raffle.nonce.to_le_bytes();
        let bump = [raffle.bump];
        let seeds: &[&[u8]] = &[RAFFLE_SEED, authority.as_ref(), &nonce_bytes, &bump];
        let mut coordinator = CpiCoordinator {
            coordinator_program: coordinator_program_info,
            consumer: raffle_info,
            coordinator_state: coordinator_state_info,
            consumer_seeds: seeds,
        };

        let now = Clock::get()?.unix_timestamp;
        let event = raffle.request_draw(now, &mut coordinator).map_err(fail)?;

        raffle.save(raffle_info)?;
        event.emit();
        Ok(())
    }

    /// Process ResolveDraw instruction - step 2 of a draw
    ///
    /// Only the coordinator authority may deliver randomness. The prize moves
    /// straight from the raffle account to the winner's account, which must be
    /// among the candidate accounts.
    fn process_resolve_draw(
        accounts: &[AccountInfo],
        request_id: u64,
        random_values: &[u64],
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let coordinator_authority_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let candidates = account_info_iter.as_slice();

        if !coordinator_authority_info.is_signer {
            msg!("Coordinator authority must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        if raffle_info.owner != program_id {
            return Err(ProgramError::IncorrectProgramId);
        }

        let mut raffle = Raffle::load(raffle_info)?;

        if raffle.randomness.coordinator_authority != *coordinator_authority_info.key {
            return Err(fail(RaffleError::UnauthorizedCoordinator));
        }

        let now = Clock::get()?.unix_timestamp;
        let event = raffle
            .resolve_draw(request_id, random_values, now, |winner, prize| {
                Self::pay_winner(raffle_info, candidates, winner, prize)
            })
            .map_err(fail)?;

        raffle.save(raffle_info)?;
        event.emit();
        Ok(())
    }

    /// Move `prize` lamports from the raffle account to the winner
    fn pay_winner(
        raffle_info: &AccountInfo,
        candidates: &[AccountInfo],
        winner: &Pubkey,
        prize: u64,
    ) -> ProgramResult {
        let winner_info = candidates
            .iter()
            .find(|account| account.key == winner)
            .ok_or(ProgramError::NotEnoughAccountKeys)?;

        if !winner_info.is_writable {
            msg!("Winner account {} is not writable", winner);
            return Err(ProgramError::InvalidArgument);
        }

        let rent = Rent::get()?;
        let raffle_lamports = raffle_info
            .lamports()
            .checked_sub(prize)
            .ok_or(ProgramError::InsufficientFunds)?;
        if raffle_lamports < rent.minimum_balance(raffle_info.data_len()) {
            msg!("Prize would leave the raffle account below rent exemption");
            return Err(ProgramError::InsufficientFunds);
        }
        let winner_lamports = winner_info
            .lamports()
            .checked_add(prize)
            .ok_or(ProgramError::InvalidArgument)?;

        **raffle_info.try_borrow_mut_lamports()? = raffle_lamports;
        **winner_info.try_borrow_mut_lamports()? = winner_lamports;

        msg!(
            "Paid {} SOL to {}",
            utils::lamports_to_sol(prize),
            winner
        );
        Ok(())
    }

    fn process_get_player(accounts: &[AccountInfo], index: u64, program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let raffle_info = next_account_info(account_info_iter)?;

        if raffle_info.owner != program_id {
            return Err(ProgramError::IncorrectProgramId);
        }

        let raffle = Raffle::load(raffle_info)?;
        let player = raffle.player(index).map_err(fail)?;

        msg!("Player {}: {}", index, player);
        set_return_data(player.as_ref());
        Ok(())
    }
}
