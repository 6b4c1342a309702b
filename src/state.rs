//! Board state that rides alongside piece changes without touching the store:
//! special rights (castling, pawn double push) and the en-passant square.

use rustc_hash::FxHashSet;

use crate::changes::Apply;
use crate::core::coord::Coord;
use crate::core::key::CoordKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnPassant {
    /// Square a capturing pawn lands on.
    pub square: Coord,
    /// Pawn that gets removed.
    pub pawn: Coord,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardState {
    special_rights: FxHashSet<CoordKey>,
    en_passant: Option<EnPassant>,
}

impl BoardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_special_rights(mut self, squares: impl IntoIterator<Item = Coord>) -> Self {
        self.special_rights
            .extend(squares.into_iter().map(CoordKey::from_coord));
        self
    }

    pub fn has_special_right(&self, coords: Coord) -> bool {
        self.special_rights.contains(&CoordKey::from_coord(coords))
    }

    pub fn special_right_count(&self) -> usize {
        self.special_rights.len()
    }

    pub fn en_passant(&self) -> Option<EnPassant> {
        self.en_passant
    }

    fn set_special_right(&mut self, coords: Coord, present: bool) {
        let key = CoordKey::from_coord(coords);
        if present {
            self.special_rights.insert(key);
        } else {
            self.special_rights.remove(&key);
        }
    }
}

/// One state transition. Both the value before and after are recorded, so the
/// change can be applied in either direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateChange {
    SpecialRight {
        coords: Coord,
        current: bool,
        future: bool,
    },
    EnPassant {
        current: Option<EnPassant>,
        future: Option<EnPassant>,
    },
}

impl StateChange {
    /// A special right at `coords` is lost (e.g. the piece moved or was captured).
    pub fn lose_right(state: &BoardState, coords: Coord) -> Self {
        StateChange::SpecialRight {
            coords,
            current: state.has_special_right(coords),
            future: false,
        }
    }

    pub fn set_en_passant(state: &BoardState, future: Option<EnPassant>) -> Self {
        StateChange::EnPassant {
            current: state.en_passant(),
            future,
        }
    }

    pub fn apply(&self, state: &mut BoardState, dir: Apply) {
        match (*self, dir) {
            (StateChange::SpecialRight { coords, future, .. }, Apply::Forward) => {
                state.set_special_right(coords, future)
            }
            (StateChange::SpecialRight { coords, current, .. }, Apply::Backward) => {
                state.set_special_right(coords, current)
            }
            (StateChange::EnPassant { future, .. }, Apply::Forward) => state.en_passant = future,
            (StateChange::EnPassant { current, .. }, Apply::Backward) => {
                state.en_passant = current
            }
        }
    }
}

/// Applies a batch of state changes, in reverse order when going backward.
pub fn apply_all(changes: &[StateChange], state: &mut BoardState, dir: Apply) {
    match dir {
        Apply::Forward => changes.iter().for_each(|c| c.apply(state, dir)),
        Apply::Backward => changes.iter().rev().for_each(|c| c.apply(state, dir)),
    }
}
