use borsh::BorshSerialize;
use solana_program::{program_error::ProgramError, pubkey::Pubkey};

use autoraffle::{
    events::RaffleEvent,
    raffle_error::RaffleError,
    raffle_state::{Raffle, RaffleConfig, RaffleStatus, RandomnessConfig, MAX_PLAYERS},
    vrf::{RandomnessCoordinator, RandomnessRequest, NUM_WORDS, REQUEST_CONFIRMATIONS},
};

const START: i64 = 1_700_000_000;

// Stand-in for the coordinator: hands out sequential request ids
#[derive(Default)]
struct MockCoordinator {
    next_request_id: u64,
    requests: Vec<RandomnessRequest>,
    fail: bool,
}

impl RandomnessCoordinator for MockCoordinator {
    fn request_random_values(&mut self, request: &RandomnessRequest) -> Result<u64, RaffleError> {
        if self.fail {
            return Err(RaffleError::Coordinator(ProgramError::InsufficientFunds));
        }
        self.requests.push(*request);
        self.next_request_id += 1;
        Ok(self.next_request_id)
    }
}

fn new_raffle(entrance_fee: u64, interval: u64) -> Raffle {
    let config = RaffleConfig {
        entrance_fee,
        interval,
        randomness: RandomnessConfig {
            coordinator_program: Pubkey::new_unique(),
            coordinator_authority: Pubkey::new_unique(),
            key_hash: [7u8; 32],
            subscription_id: 42,
            callback_compute_limit: 500_000,
        },
    };
    Raffle::new(Pubkey::new_unique(), 0, 255, &config, START)
}

// Raffle with `players` entered at the fee, interval elapsed, draw requested
fn calculating_raffle(
    players: &[Pubkey],
    coordinator: &mut MockCoordinator,
) -> (Raffle, u64, i64) {
    let mut raffle = new_raffle(10, 300);
    for player in players {
        raffle.enter(*player, 10).unwrap();
    }
    let now = START + 301;
    let event = raffle.request_draw(now, coordinator).unwrap();
    let request_id = match event {
        RaffleEvent::DrawRequested { request_id } => request_id,
        other => panic!("unexpected event {:?}", other),
    };
    (raffle, request_id, now)
}

#[test]
fn test_new_raffle_is_open() {
    let raffle = new_raffle(10, 300);

    assert!(raffle.is_initialized);
    assert_eq!(raffle.status, RaffleStatus::Open);
    assert_eq!(raffle.entrance_fee, 10);
    assert_eq!(raffle.interval, 300);
    assert_eq!(raffle.player_count(), 0);
    assert_eq!(raffle.last_draw_timestamp, START);
    assert_eq!(raffle.pending_request_id, None);
    assert_eq!(raffle.recent_winner, None);
    assert_eq!(raffle.pot, 0);
}

#[test]
fn test_default_config() {
    let config = RaffleConfig::default();
    assert_eq!(config.entrance_fee, 10_000_000);
    assert_eq!(config.interval, 30);
    assert_eq!(config.randomness.callback_compute_limit, 500_000);
}

#[test]
fn test_enter_records_player() {
    let mut raffle = new_raffle(10, 300);
    let player = Pubkey::new_unique();

    let event = raffle.enter(player, 10).unwrap();

    assert_eq!(event, RaffleEvent::EntryRecorded { player, amount: 10 });
    assert_eq!(raffle.player_count(), 1);
    assert_eq!(raffle.player(0).unwrap(), player);
    assert_eq!(raffle.pot, 10);
}

#[test]
fn test_enter_same_player_twice() {
    let mut raffle = new_raffle(10, 300);
    let player = Pubkey::new_unique();

    raffle.enter(player, 10).unwrap();
    raffle.enter(player, 10).unwrap();

    assert_eq!(raffle.players, vec![player, player]);
    assert_eq!(raffle.pot, 20);
}

#[test]
fn test_enter_pools_overpayment() {
    let mut raffle = new_raffle(10, 300);

    raffle.enter(Pubkey::new_unique(), 25).unwrap();

    assert_eq!(raffle.pot, 25);
}

#[test]
fn test_enter_rejects_insufficient_payment() {
    let mut raffle = new_raffle(10, 300);

    let err = raffle.enter(Pubkey::new_unique(), 9).unwrap_err();

    assert_eq!(
        err,
        RaffleError::InsufficientPayment {
            paid: 9,
            required: 10
        }
    );
    assert_eq!(raffle.player_count(), 0);
    assert_eq!(raffle.pot, 0);
}

#[test]
fn test_enter_rejected_while_calculating() {
    let mut coordinator = MockCoordinator::default();
    let (mut raffle, _, _) = calculating_raffle(&[Pubkey::new_unique()], &mut coordinator);

    let err = raffle.enter(Pubkey::new_unique(), 10).unwrap_err();

    assert_eq!(err, RaffleError::DrawInProgress);
    assert_eq!(raffle.player_count(), 1);
    assert_eq!(raffle.pot, 10);
}

#[test]
fn test_short_payment_while_calculating_reports_payment_first() {
    let mut coordinator = MockCoordinator::default();
    let (mut raffle, request_id, _) =
        calculating_raffle(&[Pubkey::new_unique()], &mut coordinator);
    let before = raffle.clone();

    let err = raffle.enter(Pubkey::new_unique(), 9).unwrap_err();

    // Payment is checked before status
    assert_eq!(
        err,
        RaffleError::InsufficientPayment {
            paid: 9,
            required: 10
        }
    );
    assert_eq!(raffle, before);
    assert_eq!(raffle.pending_request_id, Some(request_id));
}

#[test]
fn test_enter_rejected_when_full() {
    let mut raffle = new_raffle(1, 300);
    for _ in 0..MAX_PLAYERS {
        raffle.enter(Pubkey::new_unique(), 1).unwrap();
    }

    let err = raffle.enter(Pubkey::new_unique(), 1).unwrap_err();

    assert_eq!(err, RaffleError::RaffleFull);
    assert_eq!(raffle.players.len(), MAX_PLAYERS);
}

#[test]
fn test_full_raffle_fits_account() {
    let mut raffle = new_raffle(1, 300);
    for _ in 0..MAX_PLAYERS {
        raffle.enter(Pubkey::new_unique(), 1).unwrap();
    }
    raffle.pending_request_id = Some(u64::MAX);
    raffle.recent_winner = Some(Pubkey::new_unique());

    assert_eq!(raffle.try_to_vec().unwrap().len(), Raffle::LEN);
}

#[test]
fn test_check_draw_false_without_players() {
    let raffle = new_raffle(10, 300);

    assert!(!raffle.check_draw(START + 301));
    assert!(!raffle.check_draw(START + 1_000_000));
}

#[test]
fn test_check_draw_false_before_interval() {
    let mut raffle = new_raffle(10, 300);
    raffle.enter(Pubkey::new_unique(), 10).unwrap();

    assert!(!raffle.check_draw(START));
    assert!(!raffle.check_draw(START + 295));
    assert!(!raffle.check_draw(START + 299));
}

#[test]
fn test_check_draw_true_when_due() {
    let mut raffle = new_raffle(10, 300);
    raffle.enter(Pubkey::new_unique(), 10).unwrap();

    assert!(raffle.check_draw(START + 300));
    assert!(raffle.check_draw(START + 301));
}

#[test]
fn test_check_draw_false_with_empty_pot() {
    let mut raffle = new_raffle(0, 300);
    raffle.enter(Pubkey::new_unique(), 0).unwrap();

    assert!(!raffle.check_draw(START + 301));
}

#[test]
fn test_zero_interval_draw_due_when_clock_behind() {
    let mut raffle = new_raffle(10, 0);
    raffle.enter(Pubkey::new_unique(), 10).unwrap();

    assert_eq!(raffle.seconds_since_last_draw(START - 50), 0);
    assert!(raffle.check_draw(START - 50));
}

#[test]
fn test_check_draw_false_while_calculating() {
    let mut coordinator = MockCoordinator::default();
    let (raffle, _, now) = calculating_raffle(&[Pubkey::new_unique()], &mut coordinator);

    assert!(!raffle.check_draw(now));
    assert!(!raffle.check_draw(now + 10_000));
}

#[test]
fn test_request_draw_rejected_when_not_due() {
    let mut raffle = new_raffle(10, 300);
    raffle.enter(Pubkey::new_unique(), 10).unwrap();
    let before = raffle.clone();
    let mut coordinator = MockCoordinator::default();

    let err = raffle.request_draw(START + 10, &mut coordinator).unwrap_err();

    assert_eq!(
        err,
        RaffleError::UpkeepNotNeeded {
            balance: 10,
            player_count: 1,
            status: RaffleStatus::Open,
        }
    );
    assert_eq!(raffle, before);
    assert!(coordinator.requests.is_empty());
}

#[test]
fn test_request_draw_rejected_without_players() {
    let mut raffle = new_raffle(10, 300);
    let mut coordinator = MockCoordinator::default();

    let err = raffle.request_draw(START + 301, &mut coordinator).unwrap_err();

    assert_eq!(
        err,
        RaffleError::UpkeepNotNeeded {
            balance: 0,
            player_count: 0,
            status: RaffleStatus::Open,
        }
    );
}

#[test]
fn test_request_draw_locks_raffle() {
    let mut coordinator = MockCoordinator::default();
    let (raffle, request_id, _) = calculating_raffle(&[Pubkey::new_unique()], &mut coordinator);

    assert_eq!(raffle.status, RaffleStatus::Calculating);
    assert_eq!(raffle.pending_request_id, Some(request_id));
    assert_eq!(request_id, 1);
    assert_eq!(coordinator.requests.len(), 1);

    let request = coordinator.requests[0];
    assert_eq!(request.key_hash, [7u8; 32]);
    assert_eq!(request.subscription_id, 42);
    assert_eq!(request.request_confirmations, REQUEST_CONFIRMATIONS);
    assert_eq!(request.callback_compute_limit, 500_000);
    assert_eq!(request.num_words, NUM_WORDS);
}

#[test]
fn test_second_request_draw_rejected() {
    let mut coordinator = MockCoordinator::default();
    let (mut raffle, request_id, now) =
        calculating_raffle(&[Pubkey::new_unique()], &mut coordinator);

    let err = raffle.request_draw(now, &mut coordinator).unwrap_err();

    assert_eq!(
        err,
        RaffleError::UpkeepNotNeeded {
            balance: 10,
            player_count: 1,
            status: RaffleStatus::Calculating,
        }
    );
    assert_eq!(raffle.pending_request_id, Some(request_id));
    assert_eq!(coordinator.requests.len(), 1);
}

#[test]
fn test_request_draw_coordinator_failure_leaves_raffle_open() {
    let mut raffle = new_raffle(10, 300);
    raffle.enter(Pubkey::new_unique(), 10).unwrap();
    let before = raffle.clone();
    let mut coordinator = MockCoordinator {
        fail: true,
        ..MockCoordinator::default()
    };

    let err = raffle.request_draw(START + 301, &mut coordinator).unwrap_err();

    assert_eq!(err, RaffleError::Coordinator(ProgramError::InsufficientFunds));
    assert_eq!(raffle, before);
}

#[test]
fn test_resolve_draw_rejected_while_open() {
    let mut raffle = new_raffle(10, 300);
    raffle.enter(Pubkey::new_unique(), 10).unwrap();
    let before = raffle.clone();

    let err = raffle
        .resolve_draw(1, &[7], START + 301, |_, _| Ok(()))
        .unwrap_err();

    assert_eq!(err, RaffleError::UnknownRequest { request_id: 1 });
    assert_eq!(raffle, before);
}

#[test]
fn test_resolve_draw_rejects_unknown_request() {
    let mut coordinator = MockCoordinator::default();
    let (mut raffle, request_id, now) =
        calculating_raffle(&[Pubkey::new_unique()], &mut coordinator);
    let before = raffle.clone();
    let mut paid = false;

    let err = raffle
        .resolve_draw(request_id + 1, &[7], now, |_, _| {
            paid = true;
            Ok(())
        })
        .unwrap_err();

    assert_eq!(
        err,
        RaffleError::UnknownRequest {
            request_id: request_id + 1
        }
    );
    assert_eq!(raffle, before);
    assert!(!paid);
}

#[test]
fn test_resolve_draw_requires_a_value() {
    let mut coordinator = MockCoordinator::default();
    let (mut raffle, request_id, now) =
        calculating_raffle(&[Pubkey::new_unique()], &mut coordinator);
    let before = raffle.clone();

    let err = raffle
        .resolve_draw(request_id, &[], now, |_, _| Ok(()))
        .unwrap_err();

    assert_eq!(err, RaffleError::MissingRandomValue);
    assert_eq!(raffle, before);
}

#[test]
fn test_single_player_round() {
    let player = Pubkey::new_unique();
    let mut coordinator = MockCoordinator::default();
    let (mut raffle, request_id, now) = calculating_raffle(&[player], &mut coordinator);
    let mut payouts = Vec::new();

    let event = raffle
        .resolve_draw(request_id, &[7], now + 5, |winner, prize| {
            payouts.push((*winner, prize));
            Ok(())
        })
        .unwrap();

    assert_eq!(
        event,
        RaffleEvent::WinnerPicked {
            winner: player,
            prize: 10,
            round: 1
        }
    );
    assert_eq!(payouts, vec![(player, 10)]);
    assert_eq!(raffle.recent_winner, Some(player));
    assert_eq!(raffle.status, RaffleStatus::Open);
    assert_eq!(raffle.player_count(), 0);
    assert_eq!(raffle.pot, 0);
    assert_eq!(raffle.pending_request_id, None);
    assert_eq!(raffle.last_draw_timestamp, now + 5);
}

#[test]
fn test_four_player_round_pays_index_one() {
    let players: Vec<Pubkey> = (0..4).map(|_| Pubkey::new_unique()).collect();
    let mut coordinator = MockCoordinator::default();
    let (mut raffle, request_id, now) = calculating_raffle(&players, &mut coordinator);
    let mut payouts = Vec::new();

    raffle
        .resolve_draw(request_id, &[17], now, |winner, prize| {
            payouts.push((*winner, prize));
            Ok(())
        })
        .unwrap();

    assert_eq!(payouts, vec![(players[1], 40)]);
    assert_eq!(raffle.recent_winner, Some(players[1]));
    assert_eq!(raffle.player_count(), 0);
}

#[test]
fn test_only_first_random_value_is_used() {
    let players: Vec<Pubkey> = (0..3).map(|_| Pubkey::new_unique()).collect();
    let mut coordinator = MockCoordinator::default();
    let (mut raffle, request_id, now) = calculating_raffle(&players, &mut coordinator);

    raffle
        .resolve_draw(request_id, &[5, 0, 1], now, |_, _| Ok(()))
        .unwrap();

    assert_eq!(raffle.recent_winner, Some(players[2]));
}

#[test]
fn test_failed_payout_leaves_state_untouched() {
    let players: Vec<Pubkey> = (0..2).map(|_| Pubkey::new_unique()).collect();
    let mut coordinator = MockCoordinator::default();
    let (mut raffle, request_id, now) = calculating_raffle(&players, &mut coordinator);
    let before = raffle.clone();

    let err = raffle
        .resolve_draw(request_id, &[3], now, |_, _| {
            Err(ProgramError::NotEnoughAccountKeys)
        })
        .unwrap_err();

    assert_eq!(err, RaffleError::PayoutFailed);
    assert_eq!(raffle, before);

    // Same delivery succeeds once the payout can go through
    raffle
        .resolve_draw(request_id, &[3], now, |_, _| Ok(()))
        .unwrap();
    assert_eq!(raffle.recent_winner, Some(players[1]));
    assert_eq!(raffle.status, RaffleStatus::Open);
}

#[test]
fn test_request_resolves_at_most_once() {
    let mut coordinator = MockCoordinator::default();
    let (mut raffle, request_id, now) =
        calculating_raffle(&[Pubkey::new_unique()], &mut coordinator);
    raffle
        .resolve_draw(request_id, &[0], now, |_, _| Ok(()))
        .unwrap();

    let mut paid_again = false;
    let err = raffle
        .resolve_draw(request_id, &[0], now, |_, _| {
            paid_again = true;
            Ok(())
        })
        .unwrap_err();

    assert_eq!(err, RaffleError::UnknownRequest { request_id });
    assert!(!paid_again);
}

#[test]
fn test_next_round_starts_after_resolution() {
    let first = Pubkey::new_unique();
    let second = Pubkey::new_unique();
    let mut coordinator = MockCoordinator::default();
    let (mut raffle, request_id, now) = calculating_raffle(&[first], &mut coordinator);
    raffle
        .resolve_draw(request_id, &[0], now, |_, _| Ok(()))
        .unwrap();

    raffle.enter(second, 10).unwrap();
    assert!(!raffle.check_draw(now + 299));
    assert!(raffle.check_draw(now + 300));

    raffle.request_draw(now + 300, &mut coordinator).unwrap();
    assert_eq!(raffle.pending_request_id, Some(2));

    let event = raffle
        .resolve_draw(2, &[99], now + 400, |_, _| Ok(()))
        .unwrap();
    assert_eq!(
        event,
        RaffleEvent::WinnerPicked {
            winner: second,
            prize: 10,
            round: 2
        }
    );
    assert_eq!(raffle.round, 2);
}

#[test]
fn test_player_index_out_of_range() {
    let mut raffle = new_raffle(10, 300);
    raffle.enter(Pubkey::new_unique(), 10).unwrap();

    assert_eq!(
        raffle.player(1).unwrap_err(),
        RaffleError::IndexOutOfRange { index: 1, len: 1 }
    );
    assert_eq!(
        raffle.player(u64::MAX).unwrap_err(),
        RaffleError::IndexOutOfRange {
            index: u64::MAX,
            len: 1
        }
    );
}

#[test]
fn test_error_codes_map_to_custom_program_errors() {
    assert_eq!(
        ProgramError::from(RaffleError::DrawInProgress),
        ProgramError::Custom(3)
    );
    assert_eq!(
        ProgramError::from(RaffleError::UpkeepNotNeeded {
            balance: 0,
            player_count: 0,
            status: RaffleStatus::Open,
        }),
        ProgramError::Custom(5)
    );
    assert_eq!(
        ProgramError::from(RaffleError::Coordinator(ProgramError::InvalidArgument)),
        ProgramError::InvalidArgument
    );
}
