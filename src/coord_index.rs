//! Point lookup: coordinate key → the live slot standing on it.

use rustc_hash::FxHashMap;

use crate::core::coord::Coord;
use crate::core::key::CoordKey;
use crate::error::{StoreError, StoreResult};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoordIndex {
    map: FxHashMap<CoordKey, usize>,
}

impl CoordIndex {
    pub fn with_capacity(n: usize) -> StoreResult<Self> {
        let mut map = FxHashMap::default();
        map.try_reserve(n)
            .map_err(|_| StoreError::AllocationFailed {
                structure: "coord_index",
            })?;
        Ok(Self { map })
    }

    /// Fails with `PositionConflict` if the square is taken; nothing is written then.
    pub fn register(&mut self, slot: usize, coords: Coord) -> StoreResult<()> {
        let key = CoordKey::from_coord(coords);
        if let Some(&occupant) = self.map.get(&key) {
            return Err(StoreError::PositionConflict { coords, occupant });
        }
        self.map.insert(key, slot);
        Ok(())
    }

    /// Removes the entry at `coords` and returns the slot that was there. An empty
    /// square is `UnknownCoords`, since no slot can be named.
    pub fn unregister(&mut self, coords: Coord) -> StoreResult<usize> {
        self.map
            .remove(&CoordKey::from_coord(coords))
            .ok_or(StoreError::UnknownCoords { coords })
    }

    /// Like [`Self::unregister`], but only if the entry belongs to `slot`. Anything
    /// else, an empty square included, is `InvalidSlot`.
    pub fn unregister_slot(&mut self, slot: usize, coords: Coord) -> StoreResult<()> {
        let key = CoordKey::from_coord(coords);
        match self.map.get(&key) {
            Some(&s) if s == slot => {
                self.map.remove(&key);
                Ok(())
            }
            _ => Err(StoreError::InvalidSlot { slot }),
        }
    }

    #[inline]
    pub fn lookup(&self, coords: Coord) -> Option<usize> {
        self.map.get(&CoordKey::from_coord(coords)).copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CoordKey, usize)> + '_ {
        self.map.iter().map(|(k, s)| (*k, *s))
    }

    /// Rewrites every stored slot through `f`.
    pub(crate) fn remap(&mut self, f: impl Fn(usize) -> usize) {
        for slot in self.map.values_mut() {
            *slot = f(*slot);
        }
    }
}
