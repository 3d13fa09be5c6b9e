use solana_program::program_error::ProgramError;
use thiserror::Error;

use crate::raffle_state::RaffleStatus;

/// Errors that may be returned by the raffle program
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RaffleError {
    /// Raffle account has not been initialized
    #[error("Raffle account is not initialized")]
    NotInitialized,

    /// Raffle account was initialized before
    #[error("Raffle account is already initialized")]
    AlreadyInitialized,

    /// Payment attached to an entry is below the entrance fee
    #[error("Payment of {paid} lamports is below the entrance fee of {required} lamports")]
    InsufficientPayment { paid: u64, required: u64 },

    /// A draw is being calculated, entries are closed
    #[error("Raffle is calculating a winner, entries are closed")]
    DrawInProgress,

    /// No room left in the raffle account for another entry
    #[error("Raffle is full")]
    RaffleFull,

    /// Draw requested while the eligibility predicate is false
    #[error("Upkeep not needed: balance={balance}, players={player_count}, status={status:?}")]
    UpkeepNotNeeded {
        balance: u64,
        player_count: u64,
        status: RaffleStatus,
    },

    /// Delivered request id does not match the outstanding one
    #[error("Unknown randomness request {request_id}")]
    UnknownRequest { request_id: u64 },

    /// Delivery carried no random values
    #[error("Randomness delivery carried no values")]
    MissingRandomValue,

    /// Prize could not be moved to the winner
    #[error("Payout to the winner failed")]
    PayoutFailed,

    /// Player index past the end of the player list
    #[error("Player index {index} out of range ({len} players)")]
    IndexOutOfRange { index: u64, len: u64 },

    /// Delivery was not signed by the registered coordinator authority
    #[error("Randomness delivery not signed by the coordinator authority")]
    UnauthorizedCoordinator,

    /// Coordinator program does not match the one the raffle was created with
    #[error("Coordinator program does not match the raffle configuration")]
    CoordinatorMismatch,

    /// Coordinator did not hand back a request id
    #[error("Randomness request returned no request id")]
    RandomnessRequestFailed,

    #[error("Arithmetic overflow")]
    ArithmeticOverflow,

    /// Error raised by the coordinator program itself
    #[error("Coordinator error: {0}")]
    Coordinator(ProgramError),
}

impl RaffleError {
    /// Stable numeric code reported as `ProgramError::Custom`
    pub fn code(&self) -> u32 {
        match self {
            RaffleError::NotInitialized => 0,
            RaffleError::AlreadyInitialized => 1,
            RaffleError::InsufficientPayment { .. } => 2,
            RaffleError::DrawInProgress => 3,
            RaffleError::RaffleFull => 4,
            RaffleError::UpkeepNotNeeded { .. } => 5,
            RaffleError::UnknownRequest { .. } => 6,
            RaffleError::MissingRandomValue => 7,
            RaffleError::PayoutFailed => 8,
            RaffleError::IndexOutOfRange { .. } => 9,
            RaffleError::UnauthorizedCoordinator => 10,
            RaffleError::CoordinatorMismatch => 11,
            RaffleError::RandomnessRequestFailed => 12,
            RaffleError::ArithmeticOverflow => 13,
            RaffleError::Coordinator(_) => 14,
        }
    }
}

impl From<RaffleError> for ProgramError {
    fn from(e: RaffleError) -> Self {
        match e {
            RaffleError::Coordinator(inner) => inner,
            other => ProgramError::Custom(other.code()),
        }
    }
}
