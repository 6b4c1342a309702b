//! Errors returned by the piece store.
//!
//! None of these are transient. `SlotExhausted` is the only one a caller is expected
//! to recover from (regenerate, then retry once); everything else means the caller's
//! bookkeeping and the store have drifted apart.

use thiserror::Error;

use crate::core::coord::Coord;
use crate::core::piece::PieceType;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Insert or move onto a square that already holds a different piece.
    #[error("position conflict at ({coords}): occupied by slot {occupant}")]
    PositionConflict { coords: Coord, occupant: usize },

    /// The type has no vacant slot left; regenerate and retry.
    #[error("no vacant slot left for {piece_type}")]
    SlotExhausted { piece_type: PieceType },

    /// A retry after regeneration still found no vacancy.
    #[error("regeneration left no vacant slot for {piece_type}")]
    RegenerationIneffective { piece_type: PieceType },

    /// The slot is not live (or, for a desired insert slot, not vacant in its type range).
    #[error("invalid slot {slot}")]
    InvalidSlot { slot: usize },

    /// Unregister of a coordinate that holds no piece, when no slot is known. It is
    /// the same desync as `InvalidSlot`; slot-aware paths report `InvalidSlot`.
    #[error("no piece registered at ({coords})")]
    UnknownCoords { coords: Coord },

    #[error("invalid slide direction ({dx},{dy})")]
    InvalidDirection { dx: i64, dy: i64 },

    #[error("allocation failed for {structure}")]
    AllocationFailed { structure: &'static str },

    /// An internal consistency check failed.
    #[error("store corrupted: {reason}")]
    Corrupted { reason: String },

    #[error("nothing to undo")]
    EmptyHistory,

    #[error("nothing to redo")]
    NothingToRedo,

    #[error("invalid configuration: {reason}")]
    Config { reason: String },
}

pub type StoreResult<T> = Result<T, StoreError>;
