//! Sparse starting positions handed to [`crate::organized::OrganizedPieces::allocate`].

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::core::coord::Coord;
use crate::core::key::CoordKey;
use crate::core::piece::PieceType;
use crate::error::{StoreError, StoreResult};

/// Coordinate → piece type. At most one piece per square by construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Position {
    pieces: FxHashMap<CoordKey, PieceType>,
}

impl Position {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, coords: Coord, ty: PieceType) -> Self {
        self.insert(coords, ty);
        self
    }

    /// Places a piece, returning whatever stood there before.
    pub fn insert(&mut self, coords: Coord, ty: PieceType) -> Option<PieceType> {
        self.pieces.insert(CoordKey::from_coord(coords), ty)
    }

    pub fn get(&self, coords: Coord) -> Option<PieceType> {
        self.pieces.get(&CoordKey::from_coord(coords)).copied()
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Coord, PieceType)> + '_ {
        self.pieces.iter().map(|(k, t)| (k.coord(), *t))
    }

    /// Live squares grouped by type, types ascending and squares sorted by key
    /// within each type.
    pub fn grouped(&self) -> Vec<(PieceType, Vec<CoordKey>)> {
        let mut groups: BTreeMap<PieceType, Vec<CoordKey>> = BTreeMap::new();
        for (k, t) in &self.pieces {
            groups.entry(*t).or_default().push(*k);
        }
        groups
            .into_iter()
            .map(|(t, mut keys)| {
                keys.sort_unstable();
                (t, keys)
            })
            .collect()
    }

    /// Parses a JSON object of `"x,y": type` entries.
    pub fn from_json(s: &str) -> StoreResult<Self> {
        let raw: PositionJson = serde_json::from_str(s).map_err(|e| StoreError::Config {
            reason: e.to_string(),
        })?;
        let mut pos = Position::new();
        for (key, ty) in raw.0 {
            let key = key.parse::<CoordKey>().map_err(|e| StoreError::Config {
                reason: e.to_string(),
            })?;
            pos.pieces.insert(key, ty);
        }
        Ok(pos)
    }

    pub fn to_json(&self) -> StoreResult<String> {
        let raw = PositionJson(
            self.pieces
                .iter()
                .map(|(k, t)| (k.to_string(), *t))
                .collect(),
        );
        serde_json::to_string(&raw).map_err(|e| StoreError::Config {
            reason: e.to_string(),
        })
    }
}

impl FromIterator<(Coord, PieceType)> for Position {
    fn from_iter<I: IntoIterator<Item = (Coord, PieceType)>>(iter: I) -> Self {
        let mut pos = Position::new();
        for (c, t) in iter {
            pos.insert(c, t);
        }
        pos
    }
}

#[derive(Serialize, Deserialize)]
#[serde(transparent)]
struct PositionJson(BTreeMap<String, PieceType>);
