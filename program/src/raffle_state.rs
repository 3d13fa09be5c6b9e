use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    account_info::AccountInfo,
    clock::UnixTimestamp,
    program_error::ProgramError,
    program_pack::IsInitialized,
    pubkey::Pubkey,
};

use crate::raffle_error::RaffleError;

/// Maximum number of entries a raffle account can hold in one round
pub const MAX_PLAYERS: usize = 128;

/// Status of a raffle
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RaffleStatus {
    /// Raffle is open for entries
    Open,
    /// Randomness requested, waiting for the coordinator to deliver
    Calculating,
}

impl Default for RaffleStatus {
    fn default() -> Self {
        RaffleStatus::Open
    }
}

/// Connection parameters for the randomness coordinator
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct RandomnessConfig {
    /// Program that serves randomness requests
    pub coordinator_program: Pubkey,
    /// Account that signs randomness deliveries
    pub coordinator_authority: Pubkey,
    /// Key hash selecting the coordinator's proving key ("gas lane")
    pub key_hash: [u8; 32],
    /// Subscription funding the requests
    pub subscription_id: u64,
    /// Compute budget granted to the delivery callback
    pub callback_compute_limit: u32,
}

impl RandomnessConfig {
    pub const LEN: usize = 32 + 32 + 32 + 8 + 4;
}

/// Parameters a raffle is created with
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RaffleConfig {
    /// Price of one entry in lamports
    pub entrance_fee: u64,
    /// Minimum number of seconds between two draws
    pub interval: u64,
    pub randomness: RandomnessConfig,
}

impl Default for RaffleConfig {
    fn default() -> Self {
        // Development network values:
        // Entrance fee: 0.01 SOL = 10,000,000 lamports
        // Interval: 30 seconds
        // Callback limit: 500,000 compute units
        Self {
            entrance_fee: 10_000_000,
            interval: 30,
            randomness: RandomnessConfig {
                callback_compute_limit: 500_000,
                ..RandomnessConfig::default()
            },
        }
    }
}

/// Raffle account data
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq)]
pub struct Raffle {
    /// Is the account initialized
    pub is_initialized: bool,
    /// Bump seed of the raffle PDA
    pub bump: u8,
    /// Creator of the raffle, part of the PDA seeds
    pub authority: Pubkey,
    /// Per-authority identifier, part of the PDA seeds
    pub nonce: u64,
    /// Whether entries are accepted
    pub status: RaffleStatus,
    /// Price of one entry in lamports
    pub entrance_fee: u64,
    /// Minimum seconds between draws
    pub interval: u64,
    /// Time of the last resolved draw (creation time before the first one)
    pub last_draw_timestamp: UnixTimestamp,
    /// Lamports pooled since the last draw
    pub pot: u64,
    /// Entries of the current round, in entry order
    pub players: Vec<Pubkey>,
    /// Outstanding randomness request, set only while calculating
    pub pending_request_id: Option<u64>,
    /// Winner of the last resolved draw
    pub recent_winner: Option<Pubkey>,
    /// Number of resolved draws
    pub round: u64,
    pub randomness: RandomnessConfig,
}

impl IsInitialized for Raffle {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl Raffle {
    /// Space reserved for the account, sized for `MAX_PLAYERS` entries
    pub const LEN: usize = 1 // is_initialized
        + 1 // bump
        + 32 // authority
        + 8 // nonce
        + 1 // status
        + 8 // entrance_fee
        + 8 // interval
        + 8 // last_draw_timestamp
        + 8 // pot
        + 4 + 32 * MAX_PLAYERS // players
        + 1 + 8 // pending_request_id
        + 1 + 32 // recent_winner
        + 8 // round
        + RandomnessConfig::LEN;

    /// Create an open raffle with no entries
    pub fn new(
        authority: Pubkey,
        nonce: u64,
        bump: u8,
        config: &RaffleConfig,
        now: UnixTimestamp,
    ) -> Self {
        Self {
            is_initialized: true,
            bump,
            authority,
            nonce,
            status: RaffleStatus::Open,
            entrance_fee: config.entrance_fee,
            interval: config.interval,
            last_draw_timestamp: now,
            pot: 0,
            players: Vec::new(),
            pending_request_id: None,
            recent_winner: None,
            round: 0,
            randomness: config.randomness,
        }
    }

    /// Read raffle data from an account, which must be initialized
    pub fn load(account: &AccountInfo) -> Result<Self, ProgramError> {
        let raffle = Self::load_unchecked(account)?;
        if !raffle.is_initialized() {
            return Err(RaffleError::NotInitialized.into());
        }
        Ok(raffle)
    }

    /// Read raffle data without checking initialization
    pub fn load_unchecked(account: &AccountInfo) -> Result<Self, ProgramError> {
        let data = account.try_borrow_data()?;
        Self::deserialize(&mut &data[..]).map_err(|e| ProgramError::BorshIoError(e.to_string()))
    }

    /// Write raffle data back into its account
    pub fn save(&self, account: &AccountInfo) -> Result<(), ProgramError> {
        let mut data = account.try_borrow_mut_data()?;
        let mut dst: &mut [u8] = &mut data[..];
        self.serialize(&mut dst)
            .map_err(|e| ProgramError::BorshIoError(e.to_string()))
    }
}
