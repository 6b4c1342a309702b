//! A piece store for an unbounded chessboard: pieces live in per-type slot ranges,
//! with a point index by coordinates and a line index per slide direction, both
//! kept in sync by every insert, delete and move.

pub mod core;
pub mod error;
pub mod slack;
pub mod ranges;
pub mod store;
pub mod coord_index;
pub mod lines;
pub mod position;
pub mod config;
pub mod organized;
pub mod growth;
pub mod changes;
pub mod state;
pub mod board;
