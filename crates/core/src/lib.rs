#![deny(clippy::all)]
#![warn(clippy::pedantic)]

//! Leduc Solver Core Library
//!
//! Counterfactual Regret Minimization for small imperfect-information poker
//! games: vanilla CFR, external-sampling MCCFR with pruning and linear-CFR
//! discounting, blueprint persistence, and real-time subgame re-solving.
//!
//! # Modules
//!
//! - `game` - Game trait and implementations (Kuhn Poker, Leduc Hold'em)
//! - `info_key` - Packed u64 information-set keys
//! - `nodes` - Per-information-set regret and strategy accumulators
//! - `cfr` - Solver implementations (Vanilla CFR, MCCFR)
//! - `blueprint` - Blueprint save/load
//! - `subgame` - Frozen-path re-solving and the play state machine
//! - `error` - Error types

pub mod blueprint;
pub mod cfr;
pub mod error;
pub mod game;
pub mod info_key;
pub mod nodes;
pub mod subgame;

pub use error::SolverError;
pub use game::{Action, Game};
