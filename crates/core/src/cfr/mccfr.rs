//! External-sampling Monte Carlo CFR.
//!
//! Each iteration deals one shuffled hand and traverses once per seat: the
//! traversing seat branches into every legal action while the other seats
//! sample a single action from their current strategy. The average strategy
//! is accumulated by a separate outcome-sampled pass every
//! `strategy_interval` iterations, early regrets are damped by linear-CFR
//! discounting, and long-run training prunes branches whose cumulative
//! regret has collapsed.
//!
//! The traversal takes an optional frozen-path overlay: nodes whose key is
//! frozen are neither read nor written, the walk simply follows the frozen
//! action. Subgame re-solving reuses the whole schedule through it.

use arrayvec::ArrayVec;
use rand::prelude::SliceRandom;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashMap;

use crate::blueprint::Blueprint;
use crate::error::SolverError;
use crate::game::{Action, Game, Payoffs, MAX_ACTIONS};
use crate::nodes::NodeTable;

use super::next_permutation;

/// Probability of running an unpruned probe iteration once pruning is on.
const PROBE_PROBABILITY: f64 = 0.05;

/// Map from frozen info-set key to the single action already taken there.
pub type FrozenNodes = FxHashMap<u64, Action>;

/// Training schedule parameters.
#[derive(Debug, Clone)]
pub struct MccfrConfig {
    /// Cumulative regret below which a branch is skipped while pruning.
    pub regret_minimum: f64,
    /// Run the strategy-sum update pass every this many iterations.
    pub strategy_interval: u64,
    /// Iteration after which traversals prune with high probability.
    pub prune_threshold: u64,
    /// Apply linear-CFR discounting every this many iterations.
    pub discount_interval: u64,
    /// Stop discounting once this iteration is reached.
    pub lcfr_threshold: u64,
}

impl Default for MccfrConfig {
    fn default() -> Self {
        Self {
            regret_minimum: -300_000.0,
            strategy_interval: 100,
            prune_threshold: 200,
            discount_interval: 100,
            lcfr_threshold: 400,
        }
    }
}

/// External-sampling MCCFR solver.
pub struct MccfrSolver<G: Game> {
    game: G,
    nodes: NodeTable,
    config: MccfrConfig,
    deck: Vec<u8>,
    /// Deck-shuffling stream, independent of action sampling.
    shuffle_rng: StdRng,
    /// Action-sampling stream (opponent sampling, strategy updates, the
    /// prune coin).
    action_rng: StdRng,
    iterations: u64,
}

impl<G: Game> MccfrSolver<G> {
    /// Creates a solver with the default schedule and entropy seeding.
    #[must_use]
    pub fn new(game: G) -> Self {
        Self::with_config(game, MccfrConfig::default())
    }

    /// Creates a solver with a custom schedule and entropy seeding.
    #[must_use]
    pub fn with_config(game: G, config: MccfrConfig) -> Self {
        Self::with_seed(game, config, rand::random())
    }

    /// Creates a solver whose two RNG streams derive from `seed`, for
    /// deterministic replay.
    #[must_use]
    pub fn with_seed(game: G, config: MccfrConfig, seed: u64) -> Self {
        let deck = game.deck();
        let nodes = NodeTable::new(game.num_players());
        Self {
            game,
            nodes,
            config,
            deck,
            shuffle_rng: StdRng::seed_from_u64(seed),
            action_rng: StdRng::seed_from_u64(seed ^ 0x9E37_79B9_7F4A_7C15),
            iterations: 0,
        }
    }

    /// Restores a solver from a saved blueprint.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::Serialization`] if the blueprint was trained
    /// for a different seat count.
    pub fn from_blueprint(
        game: G,
        config: MccfrConfig,
        blueprint: Blueprint,
    ) -> Result<Self, SolverError> {
        if blueprint.nodes.num_players() != game.num_players() {
            return Err(SolverError::Serialization(format!(
                "blueprint has {} seats, game has {}",
                blueprint.nodes.num_players(),
                game.num_players()
            )));
        }
        let mut solver = Self::with_config(game, config);
        solver.nodes = blueprint.nodes;
        solver.iterations = blueprint.iterations;
        Ok(solver)
    }

    /// Snapshot the trained tables for persistence.
    #[must_use]
    pub fn to_blueprint(&self) -> Blueprint {
        Blueprint {
            nodes: self.nodes.clone(),
            iterations: self.iterations,
        }
    }

    /// Reseed both RNG streams for reproducible runs.
    pub fn set_seed(&mut self, seed: u64) {
        self.shuffle_rng = StdRng::seed_from_u64(seed);
        self.action_rng = StdRng::seed_from_u64(seed ^ 0x9E37_79B9_7F4A_7C15);
    }

    /// The game this solver trains on.
    #[must_use]
    pub fn game(&self) -> &G {
        &self.game
    }

    /// The trained node table.
    #[must_use]
    pub fn nodes(&self) -> &NodeTable {
        &self.nodes
    }

    /// Total iterations run so far (training and subgame searches).
    #[must_use]
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Current regret-matched strategy at a visited information set.
    #[must_use]
    pub fn current_strategy(&self, player: usize, key: u64) -> Option<Vec<f64>> {
        self.nodes.get(player, key).map(|node| node.strategy())
    }

    /// Average strategy at a visited information set.
    #[must_use]
    pub fn average_strategy(&self, player: usize, key: u64) -> Option<Vec<f64>> {
        self.nodes.get(player, key).map(|node| node.average_strategy())
    }

    /// Trains for the given number of iterations.
    pub fn train(&mut self, iterations: u64) {
        self.train_with_callback(iterations, |_| {});
    }

    /// Trains with a per-iteration callback for progress reporting.
    pub fn train_with_callback<F>(&mut self, iterations: u64, mut on_iteration: F)
    where
        F: FnMut(u64),
    {
        self.run_schedule(iterations, None, &mut on_iteration);
    }

    /// Shuffle the deck and deal a fresh root state.
    pub(crate) fn deal_root(&mut self) -> G::State {
        self.deck.shuffle(&mut self.shuffle_rng);
        self.game.root(&self.deck)
    }

    /// Sample an index from a probability distribution using the
    /// action-sampling stream.
    pub(crate) fn sample_index(&mut self, probs: &[f64]) -> usize {
        let r: f64 = self.action_rng.gen();
        let mut cumulative = 0.0;
        for (i, &p) in probs.iter().enumerate() {
            cumulative += p;
            if r < cumulative {
                return i;
            }
        }
        probs.len() - 1
    }

    /// The full driver schedule, shared by training and subgame search.
    ///
    /// Iteration numbering restarts at 1 on every call, so a search pass
    /// applies the same warm-up discounting as a fresh training run.
    pub(crate) fn run_schedule<F>(
        &mut self,
        iterations: u64,
        frozen: Option<&FrozenNodes>,
        on_iteration: &mut F,
    ) where
        F: FnMut(u64),
    {
        let num_players = self.game.num_players();

        for i in 1..=iterations {
            let root = self.deal_root();

            for player in 0..num_players {
                if i % self.config.strategy_interval == 0 {
                    self.update_strategy(&root, player, frozen);
                }
                if i > self.config.prune_threshold {
                    let probe: f64 = self.action_rng.gen();
                    if probe < PROBE_PROBABILITY {
                        self.traverse(&root, player, false, frozen);
                    } else {
                        self.traverse(&root, player, true, frozen);
                    }
                } else {
                    self.traverse(&root, player, false, frozen);
                }
            }

            if i < self.config.lcfr_threshold && i % self.config.discount_interval == 0 {
                #[allow(clippy::cast_precision_loss)]
                let t = (i / self.config.discount_interval) as f64;
                self.nodes.discount(t / (t + 1.0));
            }

            self.iterations += 1;
            on_iteration(i);
        }
    }

    /// External-sampling traversal for one traversing seat.
    ///
    /// Returns the utility vector of the sampled subtree. With `prune` set,
    /// branches whose cumulative regret is at or below `regret_minimum` are
    /// skipped and receive no update this visit.
    fn traverse(
        &mut self,
        state: &G::State,
        traversing_player: usize,
        prune: bool,
        frozen: Option<&FrozenNodes>,
    ) -> Payoffs {
        if self.game.is_terminal(state) {
            return self.game.payoffs(state);
        }

        let current = self.game.player(state);
        let key = self.game.info_set_key(state);

        // Frozen nodes are part of the already-realized path: follow the
        // recorded action without touching the node.
        if let Some(frozen_action) = frozen.and_then(|map| map.get(&key).copied()) {
            let next = self.game.next_state(state, frozen_action);
            return self.traverse(&next, traversing_player, prune, frozen);
        }

        let actions = self.game.actions(state);
        let strategy = self
            .nodes
            .get_or_insert(current, key, &actions)
            .strategy();

        if current == traversing_player {
            let num_players = self.game.num_players();
            let mut node_util: Payoffs = (0..num_players).map(|_| 0.0).collect();
            let mut utilities = ArrayVec::<f64, MAX_ACTIONS>::new();
            let mut explored = ArrayVec::<bool, MAX_ACTIONS>::new();

            let regrets: ArrayVec<f64, MAX_ACTIONS> = self
                .nodes
                .get_or_insert(current, key, &actions)
                .regret_sum()
                .iter()
                .copied()
                .collect();

            for (i, &action) in actions.iter().enumerate() {
                if prune && regrets[i] <= self.config.regret_minimum {
                    utilities.push(0.0);
                    explored.push(false);
                    continue;
                }

                let next = self.game.next_state(state, action);
                let returned = self.traverse(&next, traversing_player, prune, frozen);
                utilities.push(returned[current]);
                explored.push(true);
                for (acc, &u) in node_util.iter_mut().zip(&returned) {
                    *acc += u * strategy[i];
                }
            }

            let node = self.nodes.get_or_insert(current, key, &actions);
            for (i, &was_explored) in explored.iter().enumerate() {
                if was_explored {
                    node.add_regret(i, utilities[i] - node_util[current]);
                }
            }

            node_util
        } else {
            // Opponent node: sample one action, no accumulator updates.
            let sampled = self.sample_index(&strategy);
            let next = self.game.next_state(state, actions[sampled]);
            self.traverse(&next, traversing_player, prune, frozen)
        }
    }

    /// Outcome-sampled strategy-sum pass.
    ///
    /// At the traversing seat's nodes, samples one action from the current
    /// strategy, counts it into the strategy sum, and follows it. At other
    /// seats' nodes, recurses into every legal action without accumulating.
    fn update_strategy(
        &mut self,
        state: &G::State,
        traversing_player: usize,
        frozen: Option<&FrozenNodes>,
    ) {
        if self.game.is_terminal(state) {
            return;
        }

        let current = self.game.player(state);
        let key = self.game.info_set_key(state);

        if let Some(frozen_action) = frozen.and_then(|map| map.get(&key).copied()) {
            let next = self.game.next_state(state, frozen_action);
            self.update_strategy(&next, traversing_player, frozen);
            return;
        }

        let actions = self.game.actions(state);
        let strategy = self
            .nodes
            .get_or_insert(current, key, &actions)
            .strategy();

        if current == traversing_player {
            let sampled = self.sample_index(&strategy);
            self.nodes
                .get_or_insert(current, key, &actions)
                .add_strategy_weight(sampled, 1.0);

            let next = self.game.next_state(state, actions[sampled]);
            self.update_strategy(&next, traversing_player, frozen);
        } else {
            for &action in &actions {
                let next = self.game.next_state(state, action);
                self.update_strategy(&next, traversing_player, frozen);
            }
        }
    }

    /// Expected utility per seat of the average strategy profile, exact over
    /// all distinct deals.
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

    /// Full-width expectation under average strategies; unvisited
    /// information sets are played uniformly.
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
