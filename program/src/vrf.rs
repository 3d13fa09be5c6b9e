// Randomness coordinator integration for the raffle program
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    account_info::AccountInfo,
    instruction::{AccountMeta, Instruction},
    msg,
    program::{get_return_data, invoke_signed},
    program_error::ProgramError,
};

use crate::raffle_error::RaffleError;
use crate::raffle_state::RandomnessConfig;

/// Block confirmations the coordinator waits before answering
pub const REQUEST_CONFIRMATIONS: u16 = 3;

/// Random values requested per draw
pub const NUM_WORDS: u32 = 1;

/// Instruction tag of `RequestRandomValues` on the coordinator program
pub const REQUEST_RANDOM_VALUES_TAG: u8 = 0;

/// Parameters of a single randomness request
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq)]
pub struct RandomnessRequest {
    pub key_hash: [u8; 32],
    pub subscription_id: u64,
    pub request_confirmations: u16,
    pub callback_compute_limit: u32,
    pub num_words: u32,
}

impl RandomnessRequest {
    /// Request built from a raffle's coordinator settings
    pub fn from_config(config: &RandomnessConfig) -> Self {
        Self {
            key_hash: config.key_hash,
            subscription_id: config.subscription_id,
            request_confirmations: REQUEST_CONFIRMATIONS,
            callback_compute_limit: config.callback_compute_limit,
            num_words: NUM_WORDS,
        }
    }

    /// Instruction data understood by the coordinator program
    pub fn pack(&self) -> Result<Vec<u8>, ProgramError> {
        let mut buf = vec![REQUEST_RANDOM_VALUES_TAG];
        self.serialize(&mut buf)
            .map_err(|e| ProgramError::BorshIoError(e.to_string()))?;
        Ok(buf)
    }

    pub fn unpack(input: &[u8]) -> Result<Self, ProgramError> {
        let (tag, mut rest) = input
            .split_first()
            .ok_or(ProgramError::InvalidInstructionData)?;
        if *tag != REQUEST_RANDOM_VALUES_TAG {
            return Err(ProgramError::InvalidInstructionData);
        }
        Self::deserialize(&mut rest).map_err(|_| ProgramError::InvalidInstructionData)
    }
}

/// Issuer of randomness requests.
///
/// A request is fire-and-forget: the implementation hands back the request
/// id and the random values arrive later through a separate delivery.
pub trait RandomnessCoordinator {
    fn request_random_values(&mut self, request: &RandomnessRequest) -> Result<u64, RaffleError>;
}

/// Coordinator reached through a cross-program invocation.
///
/// The raffle PDA signs as the consumer and the coordinator answers with the
/// request id as 8 little-endian bytes of return data.
pub struct CpiCoordinator<'a, 'b> {
    pub coordinator_program: &'b AccountInfo<'a>,
    pub consumer: &'b AccountInfo<'a>,
    pub coordinator_state: &'b AccountInfo<'a>,
    pub consumer_seeds: &'b [&'b [u8]],
}

impl<'a, 'b> RandomnessCoordinator for CpiCoordinator<'a, 'b> {
    fn request_random_values(&mut self, request: &RandomnessRequest) -> Result<u64, RaffleError> {
        let instruction = Instruction {
            program_id: *self.coordinator_program.key,
            accounts: vec![
                AccountMeta::new_readonly(*self.consumer.key, true),
                AccountMeta::new(*self.coordinator_state.key, false),
            ],
            data: request.pack().map_err(RaffleError::Coordinator)?,
        };

        invoke_signed(
            &instruction,
            &[
                self.consumer.clone(),
                self.coordinator_state.clone(),
                self.coordinator_program.clone(),
            ],
            &[self.consumer_seeds],
        )
        .map_err(RaffleError::Coordinator)?;

        let (program_id, data) = get_return_data().ok_or(RaffleError::RandomnessRequestFailed)?;
        if program_id != *self.coordinator_program.key {
            msg!("Return data came from {}, not the coordinator", program_id);
            return Err(RaffleError::RandomnessRequestFailed);
        }
        parse_request_id(&data)
    }
}

/// Decode a request id from coordinator return data
pub fn parse_request_id(data: &[u8]) -> Result<u64, RaffleError> {
    if data.len() != 8 {
        msg!("Expected 8 bytes of request id, got {}", data.len());
        return Err(RaffleError::RandomnessRequestFailed);
    }
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(data);
    Ok(u64::from_le_bytes(bytes))
}

/// Index of the winning entry: first random value modulo the entry count
pub fn get_random_winner_index(random_values: &[u64], total_entries: u64) -> Option<u64> {
    if total_entries == 0 {
        return None;
    }
    random_values.first().map(|value| value % total_entries)
}
