//! Leduc Hold'em: three ranks dealt twice, one private card per seat, one
//! public board card, and capped-raise betting rounds.
//!
//! Every seat antes one chip. Round 0 is played blind; the board card is
//! revealed when round 1 begins. Raises are `2R` in round 0 and `4R` in
//! round 1, and a raise pushes the actor's bet up by the current maximum
//! bet plus the raise increment. A `C` facing a raise calls; a `C` with no
//! outstanding raise checks.

use arrayvec::ArrayVec;

use crate::error::SolverError;
use crate::info_key::{self, InfoKey};

use super::{Action, Actions, Game, Payoffs, MAX_PLAYERS};

/// The canonical Leduc deck: ranks 1-3, two of each.
pub const LEDUC_DECK: [u8; 6] = [1, 2, 3, 1, 2, 3];

/// Score bonus multiplier for pairing the board.
const PAIR_BONUS: i32 = 5 * 4;

/// Leduc Hold'em game parameters.
#[derive(Debug, Clone)]
pub struct LeducPoker {
    players: usize,
    rounds: usize,
    max_raises: u32,
}

/// State of a Leduc hand.
///
/// Immutable value: [`Game::next_state`] clones and applies one action.
#[derive(Debug, Clone)]
pub struct LeducState {
    /// Dealt cards: one hole card per seat, then the board card
    cards: ArrayVec<u8, 6>,
    /// Chips each seat has committed, starting from the ante of 1
    bets: ArrayVec<u32, MAX_PLAYERS>,
    /// Seats still in the hand
    still_in: ArrayVec<bool, MAX_PLAYERS>,
    /// Per-round action sequences
    history: Vec<Vec<Action>>,
    turn: usize,
    round: usize,
    raises_so_far: u32,
}

impl LeducPoker {
    /// Creates a Leduc game with the given seat count, betting rounds, and
    /// per-round raise cap.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::Config`] when the deck cannot cover the seats
    /// or when the worst-case action history would not fit a packed
    /// information-set key.
    pub fn new(players: usize, rounds: usize, max_raises: u32) -> Result<Self, SolverError> {
        if players < 2 || players + 1 > LEDUC_DECK.len() {
            return Err(SolverError::Config(format!(
                "Leduc supports 2-{} players, got {players}",
                LEDUC_DECK.len() - 1
            )));
        }
        if rounds == 0 {
            return Err(SolverError::Config("at least one betting round".into()));
        }

        // Each seat acts at most 1 + max_raises times per round.
        let worst_case = players * (max_raises as usize + 1) * rounds;
        if worst_case > info_key::MAX_HISTORY {
            return Err(SolverError::Config(format!(
                "worst-case history of {worst_case} actions exceeds the \
                 {}-action info-set key capacity",
                info_key::MAX_HISTORY
            )));
        }

        Ok(Self {
            players,
            rounds,
            max_raises,
        })
    }

    /// The canonical two-player configuration: two rounds, two raises.
    #[must_use]
    pub fn headsup() -> Self {
        Self {
            players: 2,
            rounds: 2,
            max_raises: 2,
        }
    }

    /// Parse an action token from the play grammar: `C`, `F`, or `<k>R`.
    #[must_use]
    pub fn parse_action(token: &str) -> Option<Action> {
        match token {
            "C" => Some(Action::Call),
            "F" => Some(Action::Fold),
            _ => {
                let size = token.strip_suffix('R')?;
                size.parse::<u32>().ok().map(Action::Raise)
            }
        }
    }

    /// Raise increment for a round: 2 chips in round 0, 4 afterwards.
    fn raise_size(round: usize) -> u32 {
        if round == 0 {
            2
        } else {
            4
        }
    }
}

impl LeducState {
    /// Hole card dealt to a seat.
    #[must_use]
    pub fn hole_card(&self, player: usize) -> u8 {
        self.cards[player]
    }

    /// The public board card, once round 0 has completed.
    #[must_use]
    pub fn board_card(&self) -> Option<u8> {
        (self.round > 0).then(|| self.cards[self.bets.len()])
    }

    /// Chips committed per seat.
    #[must_use]
    pub fn bets(&self) -> &[u32] {
        &self.bets
    }

    /// Total chips in the pot.
    #[must_use]
    pub fn pot(&self) -> u32 {
        self.bets.iter().sum()
    }

    fn active_count(&self) -> usize {
        self.still_in.iter().filter(|&&p| p).count()
    }

    fn max_bet(&self) -> u32 {
        self.bets.iter().copied().max().unwrap_or(0)
    }

    /// True when every seat still in the hand has matched the max bet.
    fn all_called_or_folded(&self) -> bool {
        let max_bet = self.max_bet();
        self.still_in
            .iter()
            .zip(&self.bets)
            .all(|(&active, &bet)| !active || bet == max_bet)
    }
}

impl Game for LeducPoker {
    type State = LeducState;

    fn num_players(&self) -> usize {
        self.players
    }

    fn deck(&self) -> Vec<u8> {
        LEDUC_DECK.to_vec()
    }

    fn root(&self, deck: &[u8]) -> LeducState {
        debug_assert!(deck.len() > self.players, "deck must cover holes + board");

        let mut bets = ArrayVec::new();
        let mut still_in = ArrayVec::new();
        for _ in 0..self.players {
            bets.push(1);
            still_in.push(true);
        }

        LeducState {
            cards: deck.iter().take(self.players + 1).copied().collect(),
            bets,
            still_in,
            history: vec![Vec::new(); self.rounds],
            turn: 0,
            round: 0,
            raises_so_far: 0,
        }
    }

    fn is_terminal(&self, state: &LeducState) -> bool {
        if state.active_count() == 1 {
            return true;
        }
        state.round >= self.rounds && {
            let last_round = &state.history[self.rounds - 1];
            last_round.len() >= state.active_count() && state.all_called_or_folded()
        }
    }

    fn player(&self, state: &LeducState) -> usize {
        state.turn
    }

    fn round(&self, state: &LeducState) -> usize {
        state.round
    }

    fn actions(&self, state: &LeducState) -> Actions {
        let mut actions = Actions::new();
        actions.push(Action::Call);
        actions.push(Action::Fold);
        if state.raises_so_far < self.max_raises {
            actions.push(Action::Raise(Self::raise_size(state.round)));
        }
        actions
    }

    fn next_state(&self, state: &LeducState, action: Action) -> LeducState {
        let mut next = state.clone();
        let last_action = next.history[next.round].last().copied();
        next.history[next.round].push(action);

        match action {
            Action::Fold => {
                next.still_in[next.turn] = false;
            }
            Action::Raise(size) => {
                let increment = next.max_bet() + size;
                next.bets[next.turn] += increment;
                next.raises_so_far += 1;
            }
            Action::Call => {
                // A call with no raise outstanding this round is a check.
                if matches!(last_action, Some(Action::Raise(_))) {
                    let to_call = next.max_bet();
                    next.bets[next.turn] = to_call;
                }
            }
            Action::Check | Action::Bet(_) => {
                debug_assert!(false, "not in the Leduc action alphabet");
            }
        }

        // Rotate to the next seat still in the hand.
        if next.active_count() > 0 {
            loop {
                next.turn = (next.turn + 1) % self.players;
                if next.still_in[next.turn] {
                    break;
                }
            }
        }

        if next.history[next.round].len() >= next.active_count() && next.all_called_or_folded() {
            next.round += 1;
            next.raises_so_far = 0;
        }

        next
    }

    #[allow(clippy::cast_precision_loss)]
    fn payoffs(&self, state: &LeducState) -> Payoffs {
        debug_assert!(self.is_terminal(state));

        let winners: Vec<usize> = if state.active_count() == 1 {
            vec![state.still_in.iter().position(|&p| p).unwrap_or(0)]
        } else {
            showdown_winners(state)
        };

        let pot = f64::from(state.pot());
        let share = pot / winners.len() as f64;

        let mut payoffs: Payoffs = state.bets.iter().map(|&b| -f64::from(b)).collect();
        for &winner in &winners {
            payoffs[winner] += share;
        }
        payoffs
    }

    fn info_set_key(&self, state: &LeducState) -> u64 {
        let hole = state.cards[state.turn];
        let board = state.board_card();

        let mut codes = ArrayVec::<u8, { info_key::MAX_HISTORY }>::new();
        for round in &state.history {
            for &action in round {
                codes.push(info_key::encode_action(action));
            }
        }

        InfoKey::new(hole, board, &codes).as_u64()
    }

    fn action_label(&self, action: Action) -> String {
        match action {
            Action::Call => "C".into(),
            Action::Fold => "F".into(),
            Action::Raise(size) => format!("{size}R"),
            Action::Check => "P".into(),
            Action::Bet(_) => "B".into(),
        }
    }
}

/// Seats with the highest showdown score.
///
/// Pairing the board dominates any unpaired holding; otherwise the score
/// orders by the higher of hole and board, then the lower.
fn showdown_winners(state: &LeducState) -> Vec<usize> {
    let board = i32::from(state.cards[state.bets.len()]);

    let mut winners = Vec::new();
    let mut high = i32::MIN;
    for (player, &hole) in state.cards.iter().take(state.bets.len()).enumerate() {
        let hole = i32::from(hole);
        let score = if hole == board {
            PAIR_BONUS + board
        } else {
            4 * hole.max(board) + hole.min(board)
        };

        if score > high {
            winners = vec![player];
            high = score;
        } else if score == high {
            winners.push(player);
        }
    }

    winners
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;

    fn headsup_root(deck: &[u8]) -> (LeducPoker, LeducState) {
        let game = LeducPoker::headsup();
        let root = game.root(deck);
        (game, root)
    }

    fn play(game: &LeducPoker, state: &LeducState, actions: &[Action]) -> LeducState {
        actions
            .iter()
            .fold(state.clone(), |s, &a| game.next_state(&s, a))
    }

    #[test]
    fn root_antes_one_chip_per_seat() {
        let (_, root) = headsup_root(&LEDUC_DECK);
        assert_eq!(root.bets(), &[1, 1]);
        assert_eq!(root.pot(), 2);
        assert_eq!(root.board_card(), None);
    }

    #[test]
    fn constructor_rejects_bad_seat_counts() {
        assert!(LeducPoker::new(1, 2, 2).is_err());
        assert!(LeducPoker::new(6, 2, 2).is_err());
        assert!(LeducPoker::new(2, 2, 2).is_ok());
        assert!(LeducPoker::new(3, 2, 2).is_ok());
    }

    #[test]
    fn constructor_rejects_histories_too_long_to_key() {
        // 5 seats * 3 acts * 2 rounds = 30 actions > 18-slot key capacity
        let result = LeducPoker::new(5, 2, 2);
        assert!(result.is_err(), "oversized history should be rejected");
    }

    #[test]
    fn raise_available_until_cap() {
        let (game, root) = headsup_root(&[1, 2, 3, 1, 2, 3]);
        assert_eq!(
            game.actions(&root).as_slice(),
            &[Action::Call, Action::Fold, Action::Raise(2)]
        );

        let raised = play(&game, &root, &[Action::Raise(2), Action::Raise(2)]);
        assert_eq!(
            game.actions(&raised).as_slice(),
            &[Action::Call, Action::Fold],
            "raise cap of 2 reached"
        );
    }

    #[test]
    fn second_round_raise_is_four() {
        let (game, root) = headsup_root(&[1, 2, 3, 1, 2, 3]);
        let round1 = play(&game, &root, &[Action::Call, Action::Call]);
        assert_eq!(game.round(&round1), 1);
        assert!(game.actions(&round1).contains(&Action::Raise(4)));
    }

    #[test]
    fn check_around_advances_round_and_reveals_board() {
        let (game, root) = headsup_root(&[1, 2, 3, 1, 2, 3]);

        let after_one = game.next_state(&root, Action::Call);
        assert_eq!(game.round(&after_one), 0, "one check does not end a round");

        let after_two = game.next_state(&after_one, Action::Call);
        assert_eq!(game.round(&after_two), 1);
        assert_eq!(after_two.board_card(), Some(3));
        assert_eq!(after_two.bets(), &[1, 1], "checks leave bets unchanged");
    }

    #[test]
    fn call_after_raise_matches_max_bet() {
        let (game, root) = headsup_root(&[1, 2, 3, 1, 2, 3]);
        let state = play(&game, &root, &[Action::Raise(2), Action::Call]);
        // Raise adds max(1,1) + 2 = 3; the call matches.
        assert_eq!(state.bets(), &[4, 4]);
        assert_eq!(game.round(&state), 1);
    }

    #[test]
    fn fold_ends_the_hand() {
        let (game, root) = headsup_root(&[1, 2, 3, 1, 2, 3]);
        let state = play(&game, &root, &[Action::Raise(2), Action::Fold]);
        assert!(game.is_terminal(&state));
        assert_eq!(game.payoffs(&state).as_slice(), &[1.0, -1.0]);
    }

    #[test]
    fn checked_down_board_pairs_decide_showdown() {
        // Deck [1,2,3]: checks through both rounds, board 3.
        // Scores: seat 0 = 4*3+1 = 13, seat 1 = 4*3+2 = 14 → seat 1 wins.
        let (game, root) = headsup_root(&[1, 2, 3, 1, 2, 3]);
        let state = play(
            &game,
            &root,
            &[Action::Call, Action::Call, Action::Call, Action::Call],
        );

        assert!(game.is_terminal(&state));
        assert_eq!(state.bets(), &[1, 1]);
        assert_eq!(game.payoffs(&state).as_slice(), &[-1.0, 1.0]);
    }

    #[test]
    fn raise_then_fold_across_rounds() {
        // Round 0: 2R, C → bets [4, 4]. Round 1: 4R, F → seat 0 takes 16.
        let (game, root) = headsup_root(&[1, 2, 3, 1, 2, 3]);
        let state = play(
            &game,
            &root,
            &[Action::Raise(2), Action::Call, Action::Raise(4), Action::Fold],
        );

        assert!(game.is_terminal(&state));
        assert_eq!(state.bets(), &[12, 4]);
        assert_eq!(game.payoffs(&state).as_slice(), &[4.0, -4.0]);
    }

    #[test]
    fn board_pair_beats_higher_unpaired_hole() {
        // Holes 2 and 3, board 2: seat 0 pairs for 20+2=22, seat 1 scores
        // 4*3+2=14.
        let (game, root) = headsup_root(&[2, 3, 2, 1, 1, 3]);
        let state = play(
            &game,
            &root,
            &[Action::Call, Action::Call, Action::Call, Action::Call],
        );
        assert_eq!(game.payoffs(&state).as_slice(), &[1.0, -1.0]);
    }

    #[test]
    fn tied_showdown_splits_the_pot() {
        // Both seats hold rank 1, board 2: identical scores.
        let (game, root) = headsup_root(&[1, 1, 2, 3, 2, 3]);
        let state = play(
            &game,
            &root,
            &[Action::Raise(2), Action::Call, Action::Call, Action::Call],
        );

        let payoffs = game.payoffs(&state);
        assert_eq!(payoffs.as_slice(), &[0.0, 0.0]);
    }

    #[test]
    fn terminal_payoffs_sum_to_zero_across_full_tree() {
        fn walk(game: &LeducPoker, state: &LeducState, terminals: &mut u32) {
            if game.is_terminal(state) {
                let total: f64 = game.payoffs(state).iter().sum();
                assert!(total.abs() < 1e-9, "payoffs must sum to zero: {total}");
                *terminals += 1;
                return;
            }
            assert!(game.actions(state).len() >= 2);
            for action in game.actions(state) {
                walk(game, &game.next_state(state, action), terminals);
            }
        }

        let (game, root) = headsup_root(&[3, 1, 2, 3, 1, 2]);
        let mut terminals = 0;
        walk(&game, &root, &mut terminals);
        assert!(terminals > 0);
    }

    #[test]
    fn info_set_key_hides_opponent_hole() {
        let game = LeducPoker::headsup();
        // Same hole for seat 0, different opponent holes and stashed cards.
        let a = game.root(&[2, 1, 3, 1, 2, 3]);
        let b = game.root(&[2, 3, 3, 1, 1, 2]);
        assert_eq!(game.info_set_key(&a), game.info_set_key(&b));

        // Once the board differs the keys must differ.
        let a = play(&game, &a, &[Action::Call, Action::Call]);
        let c = play(
            &game,
            &game.root(&[2, 3, 1, 1, 2, 3]),
            &[Action::Call, Action::Call],
        );
        assert_ne!(game.info_set_key(&a), game.info_set_key(&c));
    }

    #[test]
    fn info_set_key_tracks_history_and_board() {
        let game = LeducPoker::headsup();
        let root = game.root(&[1, 2, 3, 1, 2, 3]);

        let key = InfoKey::from_raw(game.info_set_key(&root));
        assert_eq!(key.hole(), 1);
        assert_eq!(key.board(), None);
        assert!(key.action_codes().is_empty());

        let state = play(&game, &root, &[Action::Raise(2), Action::Call]);
        let key = InfoKey::from_raw(game.info_set_key(&state));
        assert_eq!(key.hole(), 1);
        assert_eq!(key.board(), Some(3));
        assert_eq!(key.action_codes(), vec![3, 1]);
    }

    #[test]
    fn parse_action_round_trips_labels() {
        let game = LeducPoker::headsup();
        for action in [Action::Call, Action::Fold, Action::Raise(2), Action::Raise(4)] {
            let label = game.action_label(action);
            assert_eq!(LeducPoker::parse_action(&label), Some(action));
        }
        assert_eq!(LeducPoker::parse_action("X"), None);
        assert_eq!(LeducPoker::parse_action("R"), None);
        assert_eq!(LeducPoker::parse_action(""), None);
    }

    #[test]
    fn three_player_fold_leaves_two_at_showdown() {
        let game = LeducPoker::new(3, 2, 2).unwrap();
        let root = game.root(&[1, 2, 3, 3, 1, 2]);

        // Seat 0 folds immediately; seats 1 and 2 check it down. Folded
        // seats are skipped, so four actions finish the hand.
        let state = play(
            &game,
            &root,
            &[Action::Fold, Action::Call, Action::Call, Action::Call],
        );

        assert!(game.is_terminal(&state));
        let payoffs = game.payoffs(&state);
        let total: f64 = payoffs.iter().sum();
        assert!(total.abs() < 1e-9);
        // Board 3 pairs seat 2's hole.
        assert_eq!(payoffs[2], 2.0, "seat 2 pairs the board: {payoffs:?}");
    }
}
