//! Kuhn Poker over ranked cards: the minimal configuration for vanilla CFR.
//!
//! Two players ante one chip each and are dealt one card from `{1, 2, 3}`.
//! The alphabet is pass/bet: `B` puts in one chip (a `B` facing a bet is a
//! call), and a `P` facing a bet folds. One betting round, highest hole card
//! wins the showdown.

use arrayvec::ArrayVec;

use crate::info_key::{self, InfoKey};

use super::{Action, Actions, Game, Payoffs, MAX_PLAYERS};

/// The canonical Kuhn deck: one card of each rank.
const KUHN_DECK: [u8; 3] = [1, 2, 3];

const KUHN_PLAYERS: usize = 2;

/// Kuhn Poker game parameters (fixed: two players, one round).
#[derive(Debug, Clone)]
pub struct KuhnPoker;

/// State of a Kuhn hand.
#[derive(Debug, Clone)]
pub struct KuhnState {
    cards: ArrayVec<u8, 3>,
    bets: ArrayVec<u32, MAX_PLAYERS>,
    still_in: ArrayVec<bool, MAX_PLAYERS>,
    history: Vec<Action>,
    turn: usize,
    round: usize,
}

impl KuhnPoker {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Default for KuhnPoker {
    fn default() -> Self {
        Self::new()
    }
}

impl KuhnState {
    fn active_count(&self) -> usize {
        self.still_in.iter().filter(|&&p| p).count()
    }

    fn all_called_or_folded(&self) -> bool {
        let max_bet = self.bets.iter().copied().max().unwrap_or(0);
        self.still_in
            .iter()
            .zip(&self.bets)
            .all(|(&active, &bet)| !active || bet == max_bet)
    }
}

impl Game for KuhnPoker {
    type State = KuhnState;

    fn num_players(&self) -> usize {
        KUHN_PLAYERS
    }

    fn deck(&self) -> Vec<u8> {
        KUHN_DECK.to_vec()
    }

    fn root(&self, deck: &[u8]) -> KuhnState {
        debug_assert!(deck.len() >= KUHN_PLAYERS);

        let mut bets = ArrayVec::new();
        let mut still_in = ArrayVec::new();
        for _ in 0..KUHN_PLAYERS {
            bets.push(1);
            still_in.push(true);
        }

        KuhnState {
            cards: deck.iter().take(KUHN_DECK.len()).copied().collect(),
            bets,
            still_in,
            history: Vec::new(),
            turn: 0,
            round: 0,
        }
    }

    fn is_terminal(&self, state: &KuhnState) -> bool {
        state.active_count() == 1
            || (state.round >= 1
                && state.history.len() >= state.active_count()
                && state.all_called_or_folded())
    }

    fn player(&self, state: &KuhnState) -> usize {
        state.turn
    }

    fn round(&self, state: &KuhnState) -> usize {
        state.round
    }

    fn actions(&self, _state: &KuhnState) -> Actions {
        // Pass and bet are always legal; a pass facing a bet folds.
        let mut actions = Actions::new();
        actions.push(Action::Check);
        actions.push(Action::Bet(1));
        actions
    }

    fn next_state(&self, state: &KuhnState, action: Action) -> KuhnState {
        let mut next = state.clone();
        let last_action = next.history.last().copied();
        next.history.push(action);

        match action {
            Action::Check => {
                if matches!(last_action, Some(Action::Bet(_))) {
                    next.still_in[next.turn] = false;
                }
            }
            Action::Bet(size) => {
                next.bets[next.turn] += size;
            }
            Action::Call | Action::Fold | Action::Raise(_) => {
                debug_assert!(false, "not in the Kuhn action alphabet");
            }
        }

        next.turn = (next.turn + 1) % KUHN_PLAYERS;

        if next.history.len() >= next.active_count() && next.all_called_or_folded() {
            next.round += 1;
        }

        next
    }

    fn payoffs(&self, state: &KuhnState) -> Payoffs {
        debug_assert!(self.is_terminal(state));

        let winner = if state.active_count() == 1 {
            state.still_in.iter().position(|&p| p).unwrap_or(0)
        } else {
            // Showdown: highest hole card wins (the deck has no duplicates).
            let holes = &state.cards[..KUHN_PLAYERS];
            holes
                .iter()
                .enumerate()
                .max_by_key(|&(_, &card)| card)
                .map_or(0, |(player, _)| player)
        };

        let pot = f64::from(state.bets.iter().sum::<u32>());
        let mut payoffs: Payoffs = state.bets.iter().map(|&b| -f64::from(b)).collect();
        payoffs[winner] += pot;
        payoffs
    }

    fn info_set_key(&self, state: &KuhnState) -> u64 {
        let hole = state.cards[state.turn];

        let mut codes = ArrayVec::<u8, { info_key::MAX_HISTORY }>::new();
        for &action in &state.history {
            codes.push(info_key::encode_action(action));
        }

        InfoKey::new(hole, None, &codes).as_u64()
    }

    fn action_label(&self, action: Action) -> String {
        match action {
            Action::Check => "P".into(),
            Action::Bet(_) => "B".into(),
            Action::Call => "C".into(),
            Action::Fold => "F".into(),
            Action::Raise(size) => format!("{size}R"),
        }
    }
}
