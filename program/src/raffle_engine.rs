//! Raffle state machine.
//!
//! A raffle cycles `Open -> Calculating -> Open`. Entries are taken while
//! open; once the interval has elapsed and there is something to win, a draw
//! may be requested, which locks the raffle until the coordinator delivers
//! randomness for exactly that request.

use solana_program::{clock::UnixTimestamp, msg, program_error::ProgramError, pubkey::Pubkey};

use crate::events::RaffleEvent;
use crate::raffle_error::RaffleError;
use crate::raffle_state::{Raffle, RaffleStatus, MAX_PLAYERS};
use crate::vrf::{get_random_winner_index, RandomnessCoordinator, RandomnessRequest};

impl Raffle {
    /// Record a paid entry for `player`.
    ///
    /// The whole payment goes into the pot, including any amount above the
    /// entrance fee.
    pub fn enter(&mut self, player: Pubkey, amount: u64) -> Result<RaffleEvent, RaffleError> {
        if amount < self.entrance_fee {
            return Err(RaffleError::InsufficientPayment {
                paid: amount,
                required: self.entrance_fee,
            });
        }
        if self.status != RaffleStatus::Open {
            return Err(RaffleError::DrawInProgress);
        }
        if self.players.len() >= MAX_PLAYERS {
            return Err(RaffleError::RaffleFull);
        }

        let pot = self
            .pot
            .checked_add(amount)
            .ok_or(RaffleError::ArithmeticOverflow)?;

        self.pot = pot;
        self.players.push(player);

        Ok(RaffleEvent::EntryRecorded { player, amount })
    }

    /// Whether a draw is due at `now`
    pub fn check_draw(&self, now: UnixTimestamp) -> bool {
        let is_open = self.status == RaffleStatus::Open;
        let time_passed = self.seconds_since_last_draw(now) >= self.interval;
        let has_players = !self.players.is_empty();
        let has_balance = self.pot > 0;
        is_open && time_passed && has_players && has_balance
    }

    /// Start a draw by requesting randomness from `coordinator`.
    ///
    /// The eligibility predicate is evaluated again here. The raffle only
    /// moves to `Calculating` once the coordinator has accepted the request.
    pub fn request_draw<C: RandomnessCoordinator>(
        &mut self,
        now: UnixTimestamp,
        coordinator: &mut C,
    ) -> Result<RaffleEvent, RaffleError> {
        if !self.check_draw(now) {
            return Err(RaffleError::UpkeepNotNeeded {
                balance: self.pot,
                player_count: self.player_count(),
                status: self.status,
            });
        }

        let request = RandomnessRequest::from_config(&self.randomness);
        let request_id = coordinator.request_random_values(&request)?;

        self.status = RaffleStatus::Calculating;
        self.pending_request_id = Some(request_id);

        Ok(RaffleEvent::DrawRequested { request_id })
    }

    /// Settle the outstanding draw with delivered randomness.
    ///
    /// `payout` moves the prize to the winner. If it fails the raffle is left
    /// exactly as it was so the same delivery can be retried.
    pub fn resolve_draw<F>(
        &mut self,
        request_id: u64,
        random_values: &[u64],
        now: UnixTimestamp,
        payout: F,
    ) -> Result<RaffleEvent, RaffleError>
    where
        F: FnOnce(&Pubkey, u64) -> Result<(), ProgramError>,
    {
        if self.status != RaffleStatus::Calculating
            || self.pending_request_id != Some(request_id)
        {
            return Err(RaffleError::UnknownRequest { request_id });
        }

        let winner_index = get_random_winner_index(random_values, self.player_count())
            .ok_or(RaffleError::MissingRandomValue)?;
        let winner = self.players[winner_index as usize];
        let prize = self.pot;
        let round = self
            .round
            .checked_add(1)
            .ok_or(RaffleError::ArithmeticOverflow)?;

        msg!(
            "Winner index {} of {} players: {}",
            winner_index,
            self.players.len(),
            winner
        );

        if let Err(e) = payout(&winner, prize) {
            msg!("Payout of {} lamports to {} failed: {}", prize, winner, e);
            return Err(RaffleError::PayoutFailed);
        }

        self.recent_winner = Some(winner);
        self.players.clear();
        self.last_draw_timestamp = now;
        self.status = RaffleStatus::Open;
        self.pending_request_id = None;
        self.pot = 0;
        self.round = round;

        Ok(RaffleEvent::WinnerPicked {
            winner,
            prize,
            round,
        })
    }

    pub fn player_count(&self) -> u64 {
        self.players.len() as u64
    }

    /// Player at `index` in entry order
    pub fn player(&self, index: u64) -> Result<Pubkey, RaffleError> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.players.get(i))
            .copied()
            .ok_or(RaffleError::IndexOutOfRange {
                index,
                len: self.player_count(),
            })
    }

    /// Seconds elapsed since the last draw; zero if the clock is behind it
    pub fn seconds_since_last_draw(&self, now: UnixTimestamp) -> u64 {
        u64::try_from(now.saturating_sub(self.last_draw_timestamp)).unwrap_or(0)
    }
}
