//! Blueprint persistence.
//!
//! A blueprint is the trained node table: for every information set, the
//! action list it was created with plus the exact `f64` regret and strategy
//! sums. Saving and loading round-trips the tables bit for bit, so a loaded
//! blueprint can both play and continue training.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SolverError;
use crate::game::{Action, Actions, MAX_ACTIONS};
use crate::nodes::{InfoNode, NodeTable};

/// Default blueprint file name in the working directory.
pub const BLUEPRINT_FILE: &str = "blueprint";

/// A trained strategy snapshot: the full node table plus how many
/// iterations produced it.
#[derive(Debug, Clone)]
pub struct Blueprint {
    pub nodes: NodeTable,
    pub iterations: u64,
}

impl Blueprint {
    /// Saves the blueprint with bincode.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::Io`] if the file cannot be created and
    /// [`SolverError::Serialization`] if encoding fails.
    pub fn save(&self, path: &Path) -> Result<(), SolverError> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        let wire = WireBlueprint::from(self);
        bincode::serialize_into(writer, &wire)
            .map_err(|e| SolverError::Serialization(e.to_string()))
    }

    /// Loads a blueprint saved by [`Blueprint::save`].
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::Io`] if the file cannot be opened and
    /// [`SolverError::Serialization`] if the contents do not decode to a
    /// consistent table.
    pub fn load(path: &Path) -> Result<Self, SolverError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let wire: WireBlueprint = bincode::deserialize_from(reader)
            .map_err(|e| SolverError::Serialization(e.to_string()))?;
        Self::try_from(wire)
    }
}

/// Serializable wire format.
///
/// Plain `HashMap` intermediates because `FxHashMap` lacks serde support;
/// node action lists ride along so legal-action sets need no replay on load.
#[derive(Serialize, Deserialize)]
struct WireBlueprint {
    players: Vec<HashMap<u64, WireNode>>,
    iterations: u64,
}

#[derive(Serialize, Deserialize)]
struct WireNode {
    actions: Vec<Action>,
    regret_sum: Vec<f64>,
    strategy_sum: Vec<f64>,
}

impl From<&Blueprint> for WireBlueprint {
    fn from(blueprint: &Blueprint) -> Self {
        let players = blueprint
            .nodes
            .players
            .iter()
            .map(|nodes| {
                nodes
                    .iter()
                    .map(|(&key, node)| {
                        (
                            key,
                            WireNode {
                                actions: node.actions().to_vec(),
                                regret_sum: node.regret_sum().to_vec(),
                                strategy_sum: node.strategy_sum().to_vec(),
                            },
                        )
                    })
                    .collect()
            })
            .collect();

        Self {
            players,
            iterations: blueprint.iterations,
        }
    }
}

impl TryFrom<WireBlueprint> for Blueprint {
    type Error = SolverError;

    fn try_from(wire: WireBlueprint) -> Result<Self, SolverError> {
        let mut nodes = NodeTable::new(wire.players.len());

        for (player, wire_nodes) in wire.players.into_iter().enumerate() {
            for (key, wire_node) in wire_nodes {
                if wire_node.actions.len() > MAX_ACTIONS {
                    return Err(SolverError::Serialization(format!(
                        "info set {key:#018x} has {} actions",
                        wire_node.actions.len()
                    )));
                }
                let actions: Actions = wire_node.actions.into_iter().collect();
                let node =
                    InfoNode::from_parts(actions, wire_node.regret_sum, wire_node.strategy_sum)
                        .ok_or_else(|| {
                            SolverError::Serialization(format!(
                                "info set {key:#018x} has mismatched table lengths"
                            ))
                        })?;
                nodes.players[player].insert(key, node);
            }
        }

        Ok(Self {
            nodes,
            iterations: wire.iterations,
        })
    }
}
