use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{log::sol_log_data, msg, pubkey::Pubkey};

/// Notifications emitted by the raffle for off-chain observers
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq)]
pub enum RaffleEvent {
    /// A player entered the current round
    EntryRecorded { player: Pubkey, amount: u64 },
    /// Randomness was requested; `request_id` correlates the delivery
    DrawRequested { request_id: u64 },
    /// A winner was paid
    WinnerPicked { winner: Pubkey, prize: u64, round: u64 },
}

impl RaffleEvent {
    /// Log the event as text and as borsh-encoded program data
    pub fn emit(&self) {
        match self {
            RaffleEvent::EntryRecorded { player, amount } => {
                msg!("EntryRecorded: player={}, amount={}", player, amount)
            }
            RaffleEvent::DrawRequested { request_id } => {
                msg!("DrawRequested: request_id={}", request_id)
            }
            RaffleEvent::WinnerPicked {
                winner,
                prize,
                round,
            } => msg!(
                "WinnerPicked: winner={}, prize={}, round={}",
                winner,
                prize,
                round
            ),
        }

        match self.try_to_vec() {
            Ok(data) => sol_log_data(&[&data]),
            Err(e) => msg!("Failed to encode event: {}", e),
        }
    }
}
