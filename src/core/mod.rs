//! Low-level, allocation-free primitives.
//!
//! - [`coord`]: `i64` board coordinates and the common line direction sets.
//! - [`key`]: lossless packing of a coordinate into one `i128` hash key.
//! - [`piece`]: piece type codes and the outward view of a live piece.

pub mod coord;
pub mod key;
pub mod piece;
