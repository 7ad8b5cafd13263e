//! Vanilla CFR: full-width counterfactual regret minimization.
//!
//! Every iteration shuffles the deck, deals one hand, and recurses through
//! the whole betting tree carrying a per-seat reach-probability vector. At
//! each decision node the acting seat's regrets are updated with its
//! counterfactual regret (weighted by the opponents' reach product), and the
//! current strategy is folded into the strategy sum weighted by the actor's
//! own reach.

use arrayvec::ArrayVec;
use rand::prelude::SliceRandom;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::game::{Game, Payoffs, MAX_ACTIONS, MAX_PLAYERS};
use crate::nodes::NodeTable;

use super::next_permutation;

type ReachVec = ArrayVec<f64, MAX_PLAYERS>;

/// Vanilla CFR solver.
pub struct VanillaCfr<G: Game> {
    game: G,
    nodes: NodeTable,
    deck: Vec<u8>,
    rng: StdRng,
}

impl<G: Game> VanillaCfr<G> {
    /// Creates a solver with an entropy-seeded shuffle stream.
    #[must_use]
    pub fn new(game: G) -> Self {
        Self::with_seed(game, rand::random())
    }

    /// Creates a solver with a fixed shuffle seed for deterministic replay.
    #[must_use]
    pub fn with_seed(game: G, seed: u64) -> Self {
        let deck = game.deck();
        let nodes = NodeTable::new(game.num_players());
        Self {
            game,
            nodes,
            deck,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Runs CFR for the given number of iterations.
    pub fn train(&mut self, iterations: u64) {
        let num_players = self.game.num_players();
        for _ in 0..iterations {
            self.deck.shuffle(&mut self.rng);
            let root = self.game.root(&self.deck);
            let reach: ReachVec = (0..num_players).map(|_| 1.0).collect();
            self.cfr(&root, &reach);
        }
    }

    /// Average strategy at an information set, if it has been visited.
    #[must_use]
    pub fn average_strategy(&self, player: usize, key: u64) -> Option<Vec<f64>> {
        self.nodes.get(player, key).map(|node| node.average_strategy())
    }

    /// The trained node table.
    #[must_use]
    pub fn nodes(&self) -> &NodeTable {
        &self.nodes
    }

    /// Core CFR recursion: returns the expected utility vector of this
    /// subtree under the current strategy profile.
    fn cfr(&mut self, state: &G::State, reach: &[f64]) -> Payoffs {
        if self.game.is_terminal(state) {
            return self.game.payoffs(state);
        }

        let player = self.game.player(state);
        let key = self.game.info_set_key(state);
        let actions = self.game.actions(state);
        let num_players = self.game.num_players();

        // Current strategy; the actor's reach weight feeds the strategy sum.
        let strategy = self
            .nodes
            .get_or_insert(player, key, &actions)
            .strategy_weighted(reach[player]);

        let mut utilities = ArrayVec::<f64, MAX_ACTIONS>::new();
        let mut node_util: Payoffs = (0..num_players).map(|_| 0.0).collect();

        for (i, &action) in actions.iter().enumerate() {
            let next = self.game.next_state(state, action);
            let mut child_reach: ReachVec = reach.iter().copied().collect();
            child_reach[player] *= strategy[i];

            let returned = self.cfr(&next, &child_reach);
            utilities.push(returned[player]);
            for (acc, &u) in node_util.iter_mut().zip(&returned) {
                *acc += u * strategy[i];
            }
        }

        let opponent_reach: f64 = reach
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != player)
            .map(|(_, &r)| r)
            .product();

        let node = self.nodes.get_or_insert(player, key, &actions);
        for (i, &utility) in utilities.iter().enumerate() {
            node.add_regret(i, (utility - node_util[player]) * opponent_reach);
        }

        node_util
    }

    /// Expected utility per seat of the average strategy profile, exact over
    /// all distinct deals.
    ///
    /// Sorts the deck and walks every distinct permutation, traversing the
    /// full tree with average-strategy action weights at each node.
    #[allow(clippy::cast_precision_loss)]
    pub fn expected_utility(&mut self) -> Payoffs {
        let num_players = self.game.num_players();
        let mut total: Payoffs = (0..num_players).map(|_| 0.0).collect();
        let mut permutations = 0u64;

        self.deck.sort_unstable();
        loop {
            let root = self.game.root(&self.deck);
            let utility = self.traverse_tree(&root);
            for (acc, &u) in total.iter_mut().zip(&utility) {
                *acc += u;
            }
            permutations += 1;

            if !next_permutation(&mut self.deck) {
                break;
            }
        }

        for acc in &mut total {
            *acc /= permutations as f64;
        }
        total
    }

    /// Full-width expectation under average strategies.
    ///
    /// Information sets the training never created are played uniformly.
    fn traverse_tree(&self, state: &G::State) -> Payoffs {
        if self.game.is_terminal(state) {
            return self.game.payoffs(state);
        }

        let player = self.game.player(state);
        let key = self.game.info_set_key(state);
        let actions = self.game.actions(state);

        #[allow(clippy::cast_precision_loss)]
        let strategy = self.nodes.get(player, key).map_or_else(
            || vec![1.0 / actions.len() as f64; actions.len()],
            |node| node.average_strategy(),
        );

        let mut expected: Payoffs = (0..self.game.num_players()).map(|_| 0.0).collect();
        for (i, &action) in actions.iter().enumerate() {
            let returned = self.traverse_tree(&self.game.next_state(state, action));
            for (acc, &u) in expected.iter_mut().zip(&returned) {
                *acc += u * strategy[i];
            }
        }

        expected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Action, KuhnPoker};
    use crate::info_key::{self, InfoKey};

    fn kuhn_key(card: u8, history: &[Action]) -> u64 {
        let codes: Vec<u8> = history.iter().map(|&a| info_key::encode_action(a)).collect();
        InfoKey::new(card, None, &codes).as_u64()
    }

    #[test]
    fn solver_initializes_empty() {
        let solver = VanillaCfr::with_seed(KuhnPoker::new(), 1);
        assert_eq!(solver.nodes().node_count(), 0);
    }

    #[test]
    fn training_populates_info_sets() {
        let mut solver = VanillaCfr::with_seed(KuhnPoker::new(), 7);
        solver.train(50);

        // Every root card for seat 0 and every card-after-pass for seat 1.
        for card in 1..=3u8 {
            assert!(solver.average_strategy(0, kuhn_key(card, &[])).is_some());
            assert!(
                solver
                    .average_strategy(1, kuhn_key(card, &[Action::Check]))
                    .is_some()
            );
        }
    }

    #[test]
    fn strategies_are_distributions() {
        let mut solver = VanillaCfr::with_seed(KuhnPoker::new(), 11);
        solver.train(200);

        for player in 0..2 {
            for (key, node) in solver.nodes().player_nodes(player) {
                let avg = node.average_strategy();
                let sum: f64 = avg.iter().sum();
                assert!(
                    (sum - 1.0).abs() < 1e-6,
                    "strategy for {key:#018x} sums to {sum}"
                );
                assert!(avg.iter().all(|&p| p >= 0.0));
            }
        }
    }

    #[test]
    fn king_always_calls_a_bet() {
        let mut solver = VanillaCfr::with_seed(KuhnPoker::new(), 3);
        solver.train(10_000);

        // Seat 1 holding 3 facing a bet: betting (calling) is dominant.
        let key = kuhn_key(3, &[Action::Bet(1)]);
        let strategy = solver.average_strategy(1, key).expect("visited in training");
        assert!(
            strategy[1] > 0.95,
            "card 3 should call a bet, got {strategy:?}"
        );
    }

    #[test]
    fn jack_folds_to_a_bet() {
        let mut solver = VanillaCfr::with_seed(KuhnPoker::new(), 3);
        solver.train(10_000);

        let key = kuhn_key(1, &[Action::Bet(1)]);
        let strategy = solver.average_strategy(1, key).expect("visited in training");
        assert!(
            strategy[0] > 0.95,
            "card 1 should fold to a bet, got {strategy:?}"
        );
    }

    #[test]
    fn seeded_training_is_deterministic() {
        let mut a = VanillaCfr::with_seed(KuhnPoker::new(), 99);
        let mut b = VanillaCfr::with_seed(KuhnPoker::new(), 99);
        a.train(500);
        b.train(500);

        for player in 0..2 {
            for (key, node) in a.nodes().player_nodes(player) {
                let other = b.nodes().get(player, key).expect("same info sets");
                assert_eq!(node.regret_sum(), other.regret_sum());
                assert_eq!(node.strategy_sum(), other.strategy_sum());
            }
        }
    }
}
