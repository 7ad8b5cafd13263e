//! Real-time subgame re-solving over a trained blueprint.
//!
//! During an actual hand, every decision the bot has already made is frozen:
//! its info-set key maps to the single realized action. Re-solving runs the
//! normal MCCFR schedule from freshly dealt roots, but traversals pass
//! through frozen nodes without reading or writing them, so the search
//! refines only the decisions that are still open.

use rustc_hash::FxHashMap;

use crate::cfr::mccfr::{FrozenNodes, MccfrSolver};
use crate::error::SolverError;
use crate::game::{Action, Game, Payoffs};

/// Configuration for subgame re-solving.
#[derive(Debug, Clone)]
pub struct SubgameConfig {
    /// MCCFR iterations per search pass.
    pub search_iterations: u64,
}

impl Default for SubgameConfig {
    fn default() -> Self {
        Self {
            search_iterations: 10_000,
        }
    }
}

/// Which distribution the bot samples its own actions from during play.
///
/// The reference behavior plays the current regret-matched strategy rather
/// than the average strategy, which is the converging quantity; kept
/// selectable rather than silently corrected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayPolicy {
    #[default]
    CurrentStrategy,
    AverageStrategy,
}

/// A blueprint solver wrapped with the frozen-path overlay and the state of
/// one hand being played.
pub struct SubgameSolver<G: Game> {
    solver: MccfrSolver<G>,
    frozen: FrozenNodes,
    config: SubgameConfig,
    policy: PlayPolicy,
    current: G::State,
    public_round: usize,
}

impl<G: Game> SubgameSolver<G> {
    /// Wraps a trained solver and deals the first hand.
    #[must_use]
    pub fn new(mut solver: MccfrSolver<G>, config: SubgameConfig, policy: PlayPolicy) -> Self {
        let current = solver.deal_root();
        Self {
            solver,
            frozen: FxHashMap::default(),
            config,
            policy,
            current,
            public_round: 0,
        }
    }

    /// Shuffles a fresh deal and clears the frozen path.
    pub fn new_hand(&mut self) {
        self.frozen.clear();
        self.public_round = 0;
        self.current = self.solver.deal_root();
    }

    /// The state of the hand in progress.
    #[must_use]
    pub fn state(&self) -> &G::State {
        &self.current
    }

    /// The wrapped blueprint solver.
    #[must_use]
    pub fn solver(&self) -> &MccfrSolver<G> {
        &self.solver
    }

    /// Number of decisions frozen along the realized path.
    #[must_use]
    pub fn frozen_len(&self) -> usize {
        self.frozen.len()
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.solver.game().is_terminal(&self.current)
    }

    /// Seat to act in the hand in progress.
    #[must_use]
    pub fn turn(&self) -> usize {
        self.solver.game().player(&self.current)
    }

    /// Terminal payoffs of the hand in progress.
    #[must_use]
    pub fn payoffs(&self) -> Payoffs {
        self.solver.game().payoffs(&self.current)
    }

    /// Re-solves from fresh deals with the current frozen path.
    pub fn search(&mut self, iterations: u64) {
        self.solver
            .run_schedule(iterations, Some(&self.frozen), &mut |_| {});
    }

    /// Applies an opponent's action to the hand.
    ///
    /// An action outside the current legal set triggers a search pass (the
    /// info set may simply never have been reached in training) and is
    /// rejected so the caller can re-prompt.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::IllegalAction`] when the action is not legal
    /// from the current state.
    pub fn observe(&mut self, action: Action) -> Result<(), SolverError> {
        let game = self.solver.game();
        let legal = game.actions(&self.current);
        let player = game.player(&self.current);
        let key = game.info_set_key(&self.current);
        let label = game.action_label(action);

        if !legal.contains(&action) {
            self.search(self.config.search_iterations);
            return Err(SolverError::IllegalAction(label));
        }

        // Legal but never solved: refine before the hand moves on.
        if self.solver.nodes().get(player, key).is_none() {
            self.search(self.config.search_iterations);
        }

        self.current = self.solver.game().next_state(&self.current, action);
        self.check_new_round();
        Ok(())
    }

    /// Plays the bot's turn: samples an action, freezes it for the rest of
    /// the hand, and advances the state.
    #[allow(clippy::cast_precision_loss)]
    pub fn act(&mut self) -> Action {
        let game = self.solver.game();
        let actions = game.actions(&self.current);
        let player = game.player(&self.current);
        let key = game.info_set_key(&self.current);

        if self.solver.nodes().get(player, key).is_none() {
            self.search(self.config.search_iterations);
        }

        let strategy = match self.policy {
            PlayPolicy::CurrentStrategy => self.solver.current_strategy(player, key),
            PlayPolicy::AverageStrategy => self.solver.average_strategy(player, key),
        }
        .unwrap_or_else(|| vec![1.0 / actions.len() as f64; actions.len()]);

        let action = actions[self.solver.sample_index(&strategy)];
        self.frozen.insert(key, action);

        self.current = self.solver.game().next_state(&self.current, action);
        self.check_new_round();
        action
    }

    /// After every advance: when a new public card or round is revealed,
    /// re-solve the remainder of the hand.
    fn check_new_round(&mut self) {
        let round = self.solver.game().round(&self.current);
        if round > self.public_round {
            self.public_round += 1;
            self.search(self.config.search_iterations);
        }
    }
}
