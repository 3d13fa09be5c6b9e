use arrayref::array_ref;
use solana_program::{
    instruction::{AccountMeta, Instruction},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_program,
};
use std::mem::size_of;

use crate::raffle_state::RaffleConfig;
use crate::vrf::get_random_winner_index;

#[derive(Clone, Debug, PartialEq)]
pub enum RaffleInstruction {
    /// Create a raffle
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The authority of the raffle, pays for the raffle account
    /// 1. `[writable]` The raffle account (PDA of `["raffle", authority, nonce]`)
    /// 2. `[]` The randomness coordinator program
    /// 3. `[]` The coordinator authority that will sign randomness deliveries
    /// 4. `[]` The system program
    InitializeRaffle {
        /// Distinguishes raffles created by the same authority
        nonce: u64,
        /// Price of one entry in lamports
        entrance_fee: u64,
        /// Minimum seconds between draws
        interval: u64,
        /// Coordinator key hash ("gas lane")
        key_hash: [u8; 32],
        /// Coordinator subscription paying for requests
        subscription_id: u64,
        /// Compute budget for the delivery callback
        callback_compute_limit: u32,
    },

    /// Enter the current round
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The player, pays the entry
    /// 1. `[writable]` The raffle account
    /// 2. `[]` The system program
    Enter {
        /// Lamports paid, at least the entrance fee
        amount: u64,
    },

    /// Report whether a draw is due (return data: one byte, 1 = due)
    ///
    /// Accounts expected:
    /// 0. `[]` The raffle account
    CheckDraw,

    /// Request randomness and lock the raffle until it is delivered
    ///
    /// Accounts expected:
    /// 0. `[signer]` Any caller (the upkeep scheduler)
    /// 1. `[writable]` The raffle account
    /// 2. `[]` The randomness coordinator program
    /// 3. `[writable]` The coordinator state account
    RequestDraw,

    /// Deliver randomness for the outstanding request, pay the winner
    ///
    /// Accounts expected:
    /// 0. `[signer]` The coordinator authority
    /// 1. `[writable]` The raffle account
    /// 2.. `[writable]` Candidate winner accounts (must include the winner,
    ///     listed here even if it is also account 0)
    ResolveDraw {
        request_id: u64,
        random_values: Vec<u64>,
    },

    /// Look up a player by entry index (return data: the player key)
    ///
    /// Accounts expected:
    /// 0. `[]` The raffle account
    GetPlayer { index: u64 },
}

impl RaffleInstruction {
    /// Unpacks a byte buffer into a RaffleInstruction
    pub fn unpack(input: &[u8]) -> Result<Self, ProgramError> {
        let (tag, rest) = input
            .split_first()
            .ok_or(ProgramError::InvalidInstructionData)?;

        Ok(match tag {
            0 => {
                let (nonce, rest) = Self::unpack_u64(rest)?;
                let (entrance_fee, rest) = Self::unpack_u64(rest)?;
                let (interval, rest) = Self::unpack_u64(rest)?;
                let (key_hash, rest) = Self::unpack_key_hash(rest)?;
                let (subscription_id, rest) = Self::unpack_u64(rest)?;
                let (callback_compute_limit, _) = Self::unpack_u32(rest)?;
                Self::InitializeRaffle {
                    nonce,
                    entrance_fee,
                    interval,
                    key_hash,
                    subscription_id,
                    callback_compute_limit,
                }
            }
            1 => {
                let (amount, _) = Self::unpack_u64(rest)?;
                Self::Enter { amount }
            }
            2 => Self::CheckDraw,
            3 => Self::RequestDraw,
            4 => {
                let (request_id, rest) = Self::unpack_u64(rest)?;
                let (count, mut rest) = Self::unpack_u32(rest)?;
                let mut random_values = Vec::with_capacity(count.min(16) as usize);
                for _ in 0..count {
                    let (value, next) = Self::unpack_u64(rest)?;
                    random_values.push(value);
                    rest = next;
                }
                Self::ResolveDraw {
                    request_id,
                    random_values,
                }
            }
            5 => {
                let (index, _) = Self::unpack_u64(rest)?;
                Self::GetPlayer { index }
            }
            _ => return Err(ProgramError::InvalidInstructionData),
        })
    }

    /// Packs a RaffleInstruction into a byte buffer
    pub fn pack(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(size_of::<Self>());
        match self {
            Self::InitializeRaffle {
                nonce,
                entrance_fee,
                interval,
                key_hash,
                subscription_id,
                callback_compute_limit,
            } => {
                buf.push(0);
                buf.extend_from_slice(&nonce.to_le_bytes());
                buf.extend_from_slice(&entrance_fee.to_le_bytes());
                buf.extend_from_slice(&interval.to_le_bytes());
                buf.extend_from_slice(key_hash);
                buf.extend_from_slice(&subscription_id.to_le_bytes());
                buf.extend_from_slice(&callback_compute_limit.to_le_bytes());
            }
            Self::Enter { amount } => {
                buf.push(1);
                buf.extend_from_slice(&amount.to_le_bytes());
            }
            Self::CheckDraw => buf.push(2),
            Self::RequestDraw => buf.push(3),
            Self::ResolveDraw {
                request_id,
                random_values,
            } => {
                buf.push(4);
                buf.extend_from_slice(&request_id.to_le_bytes());
                buf.extend_from_slice(&(random_values.len() as u32).to_le_bytes());
                for value in random_values {
                    buf.extend_from_slice(&value.to_le_bytes());
                }
            }
            Self::GetPlayer { index } => {
                buf.push(5);
                buf.extend_from_slice(&index.to_le_bytes());
            }
        }
        buf
    }

    fn unpack_u64(input: &[u8]) -> Result<(u64, &[u8]), ProgramError> {
        if input.len() < 8 {
            return Err(ProgramError::InvalidInstructionData);
        }
        let (bytes, rest) = input.split_at(8);
        Ok((u64::from_le_bytes(*array_ref![bytes, 0, 8]), rest))
    }

    fn unpack_u32(input: &[u8]) -> Result<(u32, &[u8]), ProgramError> {
        if input.len() < 4 {
            return Err(ProgramError::InvalidInstructionData);
        }
        let (bytes, rest) = input.split_at(4);
        Ok((u32::from_le_bytes(*array_ref![bytes, 0, 4]), rest))
    }

    fn unpack_key_hash(input: &[u8]) -> Result<([u8; 32], &[u8]), ProgramError> {
        if input.len() < 32 {
            return Err(ProgramError::InvalidInstructionData);
        }
        let (bytes, rest) = input.split_at(32);
        Ok((*array_ref![bytes, 0, 32], rest))
    }
}

/// Create initialize_raffle instruction
pub fn initialize_raffle(
    program_id: &Pubkey,
    authority: &Pubkey,
    nonce: u64,
    config: &RaffleConfig,
) -> Instruction {
    let (raffle_account, _) = crate::utils::find_raffle_address(program_id, authority, nonce);
    let data = RaffleInstruction::InitializeRaffle {
        nonce,
        entrance_fee: config.entrance_fee,
        interval: config.interval,
        key_hash: config.randomness.key_hash,
        subscription_id: config.randomness.subscription_id,
        callback_compute_limit: config.randomness.callback_compute_limit,
    }
    .pack();

    let accounts = vec![
        AccountMeta::new(*authority, true),
        AccountMeta::new(raffle_account, false),
        AccountMeta::new_readonly(config.randomness.coordinator_program, false),
        AccountMeta::new_readonly(config.randomness.coordinator_authority, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

/// Create enter instruction
pub fn enter(
    program_id: &Pubkey,
    player: &Pubkey,
    raffle_account: &Pubkey,
    amount: u64,
) -> Instruction {
    let data = RaffleInstruction::Enter { amount }.pack();

    let accounts = vec![
        AccountMeta::new(*player, true),
        AccountMeta::new(*raffle_account, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

/// Create check_draw instruction
pub fn check_draw(program_id: &Pubkey, raffle_account: &Pubkey) -> Instruction {
    Instruction {
        program_id: *program_id,
        accounts: vec![AccountMeta::new_readonly(*raffle_account, false)],
        data: RaffleInstruction::CheckDraw.pack(),
    }
}

/// Create request_draw instruction
pub fn request_draw(
    program_id: &Pubkey,
    caller: &Pubkey,
    raffle_account: &Pubkey,
    coordinator_program: &Pubkey,
    coordinator_state: &Pubkey,
) -> Instruction {
    let accounts = vec![
        AccountMeta::new_readonly(*caller, true),
        AccountMeta::new(*raffle_account, false),
        AccountMeta::new_readonly(*coordinator_program, false),
        AccountMeta::new(*coordinator_state, false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data: RaffleInstruction::RequestDraw.pack(),
    }
}

/// Create resolve_draw instruction
///
/// `players` is the round's entry list as stored in the raffle account. The
/// winner is picked from it the same way the program does and passed as the
/// only candidate account, so the instruction size does not grow with the
/// round.
pub fn resolve_draw(
    program_id: &Pubkey,
    coordinator_authority: &Pubkey,
    raffle_account: &Pubkey,
    players: &[Pubkey],
    request_id: u64,
    random_values: Vec<u64>,
) -> Instruction {
    let winner = get_random_winner_index(&random_values, players.len() as u64)
        .and_then(|index| players.get(index as usize));

    let mut accounts = vec![
        AccountMeta::new_readonly(*coordinator_authority, true),
        AccountMeta::new(*raffle_account, false),
    ];
    // Always its own entry, even when the winner is the coordinator authority
    if let Some(winner) = winner {
        accounts.push(AccountMeta::new(*winner, false));
    }

    let data = RaffleInstruction::ResolveDraw {
        request_id,
        random_values,
    }
    .pack();

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

/// Create get_player instruction
pub fn get_player(program_id: &Pubkey, raffle_account: &Pubkey, index: u64) -> Instruction {
    Instruction {
        program_id: *program_id,
        accounts: vec![AccountMeta::new_readonly(*raffle_account, false)],
        data: RaffleInstruction::GetPlayer { index }.pack(),
    }
}
