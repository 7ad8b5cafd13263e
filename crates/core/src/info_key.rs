//! Packed u64 information-set key for fast hashing and zero-allocation lookups.
//!
//! ## Bit Layout
//!
//! ```text
//! Bits 63-60: hole card rank           (4 bits)
//! Bits 59-56: public board card rank   (4 bits) — 0 while no board is public
//! Bits 55-54: (reserved)               (2 bits)
//! Bits 53-0:  action history          (54 bits) — 18 slots × 3 bits, oldest
//!             first, zero-terminated
//! ```
//!
//! Action encoding (3 bits): 0=empty, 1=call, 2=fold, 3=raise, 4=check, 5=bet.
//!
//! Round boundaries are not stored: given the game parameters, the split of a
//! flat action sequence into betting rounds is a function of the sequence
//! itself, so two distinct round-structured histories can never share a key.
//! Game constructors reject configurations whose worst-case history exceeds
//! [`MAX_HISTORY`].

use std::fmt;

use crate::game::Action;

const HOLE_SHIFT: u32 = 60;
const BOARD_SHIFT: u32 = 56;

/// Maximum number of actions a key can record.
pub const MAX_HISTORY: usize = 18;

/// A packed u64 information-set key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InfoKey(u64);

impl InfoKey {
    /// Build a key from the actor's hole card, the public board card (if
    /// revealed), and the flat history of encoded action codes.
    #[must_use]
    pub fn new(hole: u8, board: Option<u8>, action_codes: &[u8]) -> Self {
        debug_assert!(
            action_codes.len() <= MAX_HISTORY,
            "action history exceeds key capacity"
        );

        let mut key: u64 = 0;
        key |= (u64::from(hole) & 0xF) << HOLE_SHIFT;
        key |= (u64::from(board.unwrap_or(0)) & 0xF) << BOARD_SHIFT;

        for (i, &code) in action_codes.iter().take(MAX_HISTORY).enumerate() {
            let shift = (MAX_HISTORY - 1 - i) as u32 * 3;
            key |= (u64::from(code) & 0x7) << shift;
        }

        Self(key)
    }

    /// Wrap a raw u64 as an `InfoKey`.
    #[must_use]
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Extract the raw u64 value.
    #[must_use]
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Extract the hole card rank (4 bits).
    #[must_use]
    pub const fn hole(self) -> u8 {
        ((self.0 >> HOLE_SHIFT) & 0xF) as u8
    }

    /// Extract the public board card rank, if one was encoded.
    #[must_use]
    pub const fn board(self) -> Option<u8> {
        let raw = ((self.0 >> BOARD_SHIFT) & 0xF) as u8;
        if raw == 0 { None } else { Some(raw) }
    }

    /// Extract the non-empty action codes, oldest first.
    #[must_use]
    pub fn action_codes(self) -> Vec<u8> {
        let mut codes = Vec::new();
        for i in 0..MAX_HISTORY {
            let shift = (MAX_HISTORY - 1 - i) as u32 * 3;
            let code = ((self.0 >> shift) & 0x7) as u8;
            if code == 0 {
                break;
            }
            codes.push(code);
        }
        codes
    }
}

impl fmt::Display for InfoKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|", self.hole())?;
        if let Some(board) = self.board() {
            write!(f, "{board}|")?;
        }
        for code in self.action_codes() {
            f.write_str(action_code_label(code))?;
        }
        Ok(())
    }
}

/// Encode an [`Action`] into a 3-bit code.
///
/// Raise sizes are not encoded; a raise's size is implied by the round it
/// occurs in, which is itself implied by the history prefix.
#[must_use]
pub fn encode_action(action: Action) -> u8 {
    match action {
        Action::Call => 1,
        Action::Fold => 2,
        Action::Raise(_) => 3,
        Action::Check => 4,
        Action::Bet(_) => 5,
    }
}

/// Decode a 3-bit action code to its display label.
#[must_use]
pub fn action_code_label(code: u8) -> &'static str {
    match code {
        1 => "C",
        2 => "F",
        3 => "R",
        4 => "P",
        5 => "B",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_key_components() {
        let key = InfoKey::new(2, Some(3), &[1, 3, 1]);
        assert_eq!(key.hole(), 2);
        assert_eq!(key.board(), Some(3));
        assert_eq!(key.action_codes(), vec![1, 3, 1]);
    }

    #[test]
    fn missing_board_decodes_as_none() {
        let key = InfoKey::new(1, None, &[4, 5]);
        assert_eq!(key.board(), None);
        assert_eq!(key.action_codes(), vec![4, 5]);
    }

    #[test]
    fn empty_history_decodes_empty() {
        let key = InfoKey::new(3, None, &[]);
        assert!(key.action_codes().is_empty());
    }

    #[test]
    fn prefix_histories_produce_different_keys() {
        let short = InfoKey::new(1, None, &[1]);
        let long = InfoKey::new(1, None, &[1, 1]);
        assert_ne!(short.as_u64(), long.as_u64());
    }

    #[test]
    fn action_order_matters() {
        let k1 = InfoKey::new(1, None, &[1, 3]);
        let k2 = InfoKey::new(1, None, &[3, 1]);
        assert_ne!(k1.as_u64(), k2.as_u64());
    }

    #[test]
    fn board_changes_key() {
        let k1 = InfoKey::new(1, None, &[1, 1]);
        let k2 = InfoKey::new(1, Some(2), &[1, 1]);
        assert_ne!(k1.as_u64(), k2.as_u64());
    }

    #[test]
    fn full_history_does_not_corrupt_cards() {
        let codes = [3u8; MAX_HISTORY];
        let key = InfoKey::new(15, Some(15), &codes);
        assert_eq!(key.hole(), 15);
        assert_eq!(key.board(), Some(15));
        assert_eq!(key.action_codes().len(), MAX_HISTORY);
    }

    #[test]
    fn encode_action_covers_all_variants() {
        assert_eq!(encode_action(Action::Call), 1);
        assert_eq!(encode_action(Action::Fold), 2);
        assert_eq!(encode_action(Action::Raise(2)), 3);
        assert_eq!(encode_action(Action::Raise(4)), 3);
        assert_eq!(encode_action(Action::Check), 4);
        assert_eq!(encode_action(Action::Bet(1)), 5);
    }

    #[test]
    fn display_shows_cards_and_history() {
        let key = InfoKey::new(1, Some(3), &[1, 3, 1, 1]);
        assert_eq!(key.to_string(), "1|3|CRCC");

        let preflop = InfoKey::new(2, None, &[4, 5]);
        assert_eq!(preflop.to_string(), "2|PB");
    }

    #[test]
    fn raw_round_trip() {
        let key = InfoKey::new(2, Some(1), &[1, 2, 3]);
        let back = InfoKey::from_raw(key.as_u64());
        assert_eq!(key, back);
    }
}
