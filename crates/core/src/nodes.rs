//! Per-information-set regret and strategy-sum accumulators.
//!
//! An [`InfoNode`] stores two dense `f64` vectors indexed by the node's
//! stable action list; the list is fixed when the node is first inserted and
//! every later lookup must present the same actions. The [`NodeTable`] keys
//! nodes by `(player, packed info-set key)`.

use rustc_hash::FxHashMap;

use crate::cfr::regret::regret_match;
use crate::game::{Action, Actions};

/// Regret and strategy accumulators for one information set.
#[derive(Debug, Clone)]
pub struct InfoNode {
    actions: Actions,
    regret_sum: Vec<f64>,
    strategy_sum: Vec<f64>,
}

impl InfoNode {
    pub(crate) fn new(actions: Actions) -> Self {
        let n = actions.len();
        Self {
            actions,
            regret_sum: vec![0.0; n],
            strategy_sum: vec![0.0; n],
        }
    }

    pub(crate) fn from_parts(
        actions: Actions,
        regret_sum: Vec<f64>,
        strategy_sum: Vec<f64>,
    ) -> Option<Self> {
        if regret_sum.len() != actions.len() || strategy_sum.len() != actions.len() {
            return None;
        }
        Some(Self {
            actions,
            regret_sum,
            strategy_sum,
        })
    }

    /// The legal actions this node was created with, in stable order.
    #[must_use]
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    #[must_use]
    pub fn num_actions(&self) -> usize {
        self.actions.len()
    }

    /// Current regret-matched strategy.
    ///
    /// Pure read: calling it twice on an unchanged node returns the same
    /// distribution.
    #[must_use]
    pub fn strategy(&self) -> Vec<f64> {
        regret_match(&self.regret_sum)
    }

    /// Current strategy, folding the acting player's reach probability into
    /// the strategy sum as a side effect (the vanilla CFR variant).
    pub(crate) fn strategy_weighted(&mut self, weight: f64) -> Vec<f64> {
        let strategy = regret_match(&self.regret_sum);
        for (sum, p) in self.strategy_sum.iter_mut().zip(&strategy) {
            *sum += p * weight;
        }
        strategy
    }

    /// Average strategy over all training iterations.
    ///
    /// Uniform when nothing has been accumulated yet.
    #[must_use]
    pub fn average_strategy(&self) -> Vec<f64> {
        let total: f64 = self.strategy_sum.iter().sum();
        if total > 0.0 {
            self.strategy_sum.iter().map(|&s| s / total).collect()
        } else {
            #[allow(clippy::cast_precision_loss)]
            let uniform = 1.0 / self.actions.len() as f64;
            vec![uniform; self.actions.len()]
        }
    }

    #[must_use]
    pub fn regret_sum(&self) -> &[f64] {
        &self.regret_sum
    }

    #[must_use]
    pub fn strategy_sum(&self) -> &[f64] {
        &self.strategy_sum
    }

    pub(crate) fn add_regret(&mut self, action_index: usize, delta: f64) {
        self.regret_sum[action_index] += delta;
    }

    pub(crate) fn add_strategy_weight(&mut self, action_index: usize, weight: f64) {
        self.strategy_sum[action_index] += weight;
    }

    fn discount(&mut self, factor: f64) {
        for r in &mut self.regret_sum {
            *r *= factor;
        }
        for s in &mut self.strategy_sum {
            *s *= factor;
        }
    }
}

/// All information-set nodes, partitioned by acting player.
#[derive(Debug, Clone)]
pub struct NodeTable {
    pub(crate) players: Vec<FxHashMap<u64, InfoNode>>,
}

impl NodeTable {
    #[must_use]
    pub fn new(num_players: usize) -> Self {
        Self {
            players: (0..num_players).map(|_| FxHashMap::default()).collect(),
        }
    }

    #[must_use]
    pub fn num_players(&self) -> usize {
        self.players.len()
    }

    /// Total node count across all players.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.players.iter().map(FxHashMap::len).sum()
    }

    /// Looks up a node, inserting a zeroed one on first visit.
    ///
    /// The action set of an information set is an invariant of the game
    /// state abstraction; a disagreement with the stored node fails fast.
    pub fn get_or_insert(&mut self, player: usize, key: u64, actions: &Actions) -> &mut InfoNode {
        let node = self.players[player]
            .entry(key)
            .or_insert_with(|| InfoNode::new(actions.clone()));
        debug_assert_eq!(
            node.actions(),
            actions.as_slice(),
            "info set {key:#018x} revisited with a different action set"
        );
        node
    }

    #[must_use]
    pub fn get(&self, player: usize, key: u64) -> Option<&InfoNode> {
        self.players[player].get(&key)
    }

    /// Iterate one player's nodes in unspecified order.
    pub fn player_nodes(&self, player: usize) -> impl Iterator<Item = (u64, &InfoNode)> {
        self.players[player].iter().map(|(&k, node)| (k, node))
    }

    /// Multiply every regret and strategy accumulator by `factor`
    /// (linear-CFR discounting).
    pub fn discount(&mut self, factor: f64) {
        for nodes in &mut self.players {
            for node in nodes.values_mut() {
                node.discount(factor);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::game::Action;

    fn three_actions() -> Actions {
        let mut actions = Actions::new();
        actions.push(Action::Call);
        actions.push(Action::Fold);
        actions.push(Action::Raise(2));
        actions
    }

    #[test]
    fn fresh_node_is_uniform() {
        let node = InfoNode::new(three_actions());

        assert_eq!(node.strategy(), vec![1.0 / 3.0; 3]);
        assert_eq!(node.average_strategy(), vec![1.0 / 3.0; 3]);
    }

    #[test]
    fn negative_regret_gets_zero_weight() {
        let mut node = InfoNode::new(three_actions());
        node.add_regret(0, -5.0);
        node.add_regret(1, 10.0);
        node.add_regret(2, 3.0);

        let strategy = node.strategy();
        assert_eq!(strategy[0], 0.0);
        assert!((strategy[1] - 10.0 / 13.0).abs() < 1e-12);
        assert!((strategy[2] - 3.0 / 13.0).abs() < 1e-12);
    }

    #[test]
    fn strategy_is_idempotent_on_unchanged_node() {
        let mut node = InfoNode::new(three_actions());
        node.add_regret(1, 4.0);
        node.add_regret(2, 1.0);

        assert_eq!(node.strategy(), node.strategy());
    }

    #[test]
    fn strategy_weighted_accumulates_reach() {
        let mut node = InfoNode::new(three_actions());
        node.add_regret(1, 3.0);
        node.add_regret(2, 1.0);

        let strategy = node.strategy_weighted(0.5);
        assert_eq!(strategy, node.strategy(), "same distribution as pure read");
        assert_eq!(node.strategy_sum(), &[0.0, 0.375, 0.125]);

        node.strategy_weighted(0.5);
        assert_eq!(node.strategy_sum(), &[0.0, 0.75, 0.25]);
    }

    #[test]
    fn average_strategy_normalizes_sums() {
        let mut node = InfoNode::new(three_actions());
        node.add_strategy_weight(0, 1.0);
        node.add_strategy_weight(1, 3.0);

        let avg = node.average_strategy();
        assert_eq!(avg, vec![0.25, 0.75, 0.0]);
    }

    #[test]
    fn discount_scales_both_accumulators() {
        let mut table = NodeTable::new(2);
        let node = table.get_or_insert(0, 7, &three_actions());
        node.add_regret(0, 10.0);
        node.add_strategy_weight(1, 4.0);

        table.discount(0.5);

        let node = table.get(0, 7).unwrap();
        assert_eq!(node.regret_sum(), &[5.0, 0.0, 0.0]);
        assert_eq!(node.strategy_sum(), &[0.0, 2.0, 0.0]);
    }

    #[test]
    fn get_or_insert_is_stable_across_visits() {
        let mut table = NodeTable::new(2);
        table
            .get_or_insert(1, 42, &three_actions())
            .add_regret(0, 1.0);
        let node = table.get_or_insert(1, 42, &three_actions());

        assert_eq!(node.regret_sum(), &[1.0, 0.0, 0.0]);
        assert_eq!(table.node_count(), 1);
    }

    #[test]
    fn players_are_partitioned() {
        let mut table = NodeTable::new(2);
        table.get_or_insert(0, 42, &three_actions());

        assert!(table.get(0, 42).is_some());
        assert!(table.get(1, 42).is_none());
    }

    #[test]
    fn from_parts_rejects_mismatched_lengths() {
        let actions = three_actions();
        assert!(InfoNode::from_parts(actions.clone(), vec![0.0; 2], vec![0.0; 3]).is_none());
        assert!(InfoNode::from_parts(actions, vec![0.0; 3], vec![0.0; 3]).is_some());
    }
}
