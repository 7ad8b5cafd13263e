mod kuhn;
mod leduc;

use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};

pub use kuhn::{KuhnPoker, KuhnState};
pub use leduc::{LeducPoker, LeducState, LEDUC_DECK};

/// Maximum number of actions at any decision point.
///
/// Call/check + fold + at most one raise size per round.
pub const MAX_ACTIONS: usize = 4;

/// Maximum number of seats a game may deal to.
///
/// Bounded by the canonical Leduc deck: five hole cards plus the board.
pub const MAX_PLAYERS: usize = 5;

/// Stack-allocated action list returned by [`Game::actions`].
pub type Actions = ArrayVec<Action, MAX_ACTIONS>;

/// Stack-allocated per-player utility vector returned by [`Game::payoffs`].
pub type Payoffs = ArrayVec<f64, MAX_PLAYERS>;

/// Actions available in poker games.
///
/// The `u32` payload carries the raise increment (`2R`/`4R` in Leduc) or the
/// bet size (always 1 in Kuhn).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Fold,
    Check,
    Call,
    Bet(u32),
    Raise(u32),
}

/// Trait defining an N-player zero-sum game with ranked-card deals.
///
/// States are immutable values: [`Game::next_state`] clones the parent and
/// applies one action. Engines own a deck, shuffle it, and hand it to
/// [`Game::root`] once per iteration.
pub trait Game: Send + Sync {
    /// The state type for this game
    type State: Clone + Send + Sync;

    /// Number of seats dealt into every hand
    fn num_players(&self) -> usize;

    /// The unshuffled deck template for this game
    fn deck(&self) -> Vec<u8>;

    /// Builds the root state of a hand from a (shuffled) deck
    fn root(&self, deck: &[u8]) -> Self::State;

    /// Returns true if the state is terminal (hand over)
    fn is_terminal(&self, state: &Self::State) -> bool;

    /// Returns the seat to act at this state (undefined for terminal states)
    fn player(&self, state: &Self::State) -> usize;

    /// Current betting round of this state
    fn round(&self, state: &Self::State) -> usize;

    /// Returns available actions at this state, in a fixed stable order
    fn actions(&self, state: &Self::State) -> Actions;

    /// Returns the next state after taking an action
    fn next_state(&self, state: &Self::State, action: Action) -> Self::State;

    /// Returns the terminal payoff vector, one entry per seat.
    ///
    /// Only meaningful for terminal states; payoffs always sum to zero.
    fn payoffs(&self, state: &Self::State) -> Payoffs;

    /// Returns the packed information-set key for the acting seat.
    ///
    /// Encoded as a u64 via [`InfoKey`](crate::info_key::InfoKey); derived
    /// only from the actor's hole card, public cards, and the action
    /// history, never from opponents' hole cards.
    fn info_set_key(&self, state: &Self::State) -> u64;

    /// Display label for an action in this game's alphabet
    fn action_label(&self, action: Action) -> String;
}
