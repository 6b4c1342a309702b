//! The organized piece store: columnar slots, per-type ranges, a point index and a
//! line index, kept in lockstep.
//!
//! Only three operations mutate a live store: [`OrganizedPieces::insert`],
//! [`OrganizedPieces::delete`] and [`OrganizedPieces::move_piece`]. Each checks every
//! failure condition before touching anything, so a failed call leaves the store as
//! it was. Slots of other pieces never change; only
//! [`OrganizedPieces::regenerate`](crate::growth) renumbers.

use rustc_hash::FxHashMap;
use tracing::{debug, trace, warn};

use crate::config::StoreConfig;
use crate::coord_index::CoordIndex;
use crate::core::coord::Coord;
use crate::core::piece::{Piece, PieceType};
use crate::error::{StoreError, StoreResult};
use crate::growth::GrowthState;
use crate::lines::{Direction, LineIndex, LineKey};
use crate::position::Position;
use crate::ranges::{TypeRange, TypeRangeTable};
use crate::store::Store;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganizedPieces {
    pub(crate) store: Store,
    pub(crate) ranges: TypeRangeTable,
    pub(crate) coords: CoordIndex,
    pub(crate) lines: LineIndex,
    pub(crate) config: StoreConfig,
    pub(crate) growth: GrowthState,
    pub(crate) generation: u64,
}

impl OrganizedPieces {
    /// Lays out a store for `position`.
    ///
    /// Types ascend through the slot arrays. Within a type, live pieces come first
    /// (sorted by coordinate) followed by the type's slack.
    pub fn allocate(position: &Position, config: &StoreConfig) -> StoreResult<Self> {
        let lines = LineIndex::new(&config.slides)?;

        let mut groups = position.grouped();
        for ty in config.declared_types() {
            if let Err(i) = groups.binary_search_by_key(&ty, |(t, _)| *t) {
                groups.insert(i, (ty, Vec::new()));
            }
        }

        let plan: Vec<(PieceType, usize, usize)> = groups
            .iter()
            .map(|(ty, keys)| (*ty, keys.len(), config.slack_for(*ty, keys.len())))
            .collect();
        let ranges = TypeRangeTable::from_plan(&plan)?;

        let mut store = Store::with_capacity(ranges.total_len())?;
        for ((ty, keys), (_, _, slack)) in groups.iter().zip(&plan) {
            for key in keys {
                store.push(*ty, key.coord());
            }
            store.push_vacant(*ty, *slack);
        }

        let mut pieces = OrganizedPieces {
            store,
            ranges,
            coords: CoordIndex::with_capacity(position.len())?,
            lines,
            config: config.clone(),
            growth: GrowthState::Normal,
            generation: 0,
        };
        for slot in 0..pieces.store.len() {
            if pieces.is_live(slot) {
                let c = pieces.store.coords(slot);
                pieces.coords.register(slot, c)?;
                pieces.lines.register_on_lines(slot, c);
            }
        }

        debug!(
            slots = pieces.store.len(),
            live = pieces.live_count(),
            types = pieces.ranges.len(),
            directions = pieces.lines.directions().len(),
            "allocated piece store"
        );
        Ok(pieces)
    }

    /// Places a piece of type `ty` on `coords`.
    ///
    /// With `desired_slot == None` the lowest vacant slot of the type is used. A type
    /// without vacancies (or without a range) yields `SlotExhausted` and moves the
    /// store into the exhausted growth state; call `regenerate` and retry.
    pub fn insert(
        &mut self,
        ty: PieceType,
        coords: Coord,
        desired_slot: Option<usize>,
    ) -> StoreResult<usize> {
        if let Some(occupant) = self.coords.lookup(coords) {
            return Err(StoreError::PositionConflict { coords, occupant });
        }

        let taken = match self.ranges.get_mut(ty) {
            None => None,
            Some(range) => match desired_slot {
                Some(slot) if range.take_vacant(slot) => Some(slot),
                Some(slot) => return Err(StoreError::InvalidSlot { slot }),
                None => range.take_first_vacant(),
            },
        };
        let Some(slot) = taken else {
            return Err(self.mark_exhausted(ty));
        };

        self.store.write(slot, coords);
        self.coords.register(slot, coords)?;
        self.lines.register_on_lines(slot, coords);
        trace!(slot, %ty, %coords, "insert");
        Ok(slot)
    }

    /// Removes the piece in `slot` and returns it, so the caller can put it back
    /// with `insert(piece.piece_type, piece.coords, Some(piece.slot))`.
    pub fn delete(&mut self, slot: usize) -> StoreResult<Piece> {
        let piece = self.piece(slot).ok_or(StoreError::InvalidSlot { slot })?;

        self.coords.unregister_slot(slot, piece.coords)?;
        if let Err(e) = self.lines.unregister_from_lines(slot, piece.coords) {
            // Point index and line index disagreed; put the point entry back.
            self.coords.register(slot, piece.coords)?;
            return Err(e);
        }
        match self.ranges.get_mut(piece.piece_type).map(|r| r.release(slot)) {
            Some(true) => {}
            _ => {
                return Err(StoreError::Corrupted {
                    reason: format!("slot {slot} could not be returned to its type range"),
                })
            }
        }
        trace!(slot, ty = %piece.piece_type, coords = %piece.coords, "delete");
        Ok(piece)
    }

    /// Moves the piece in `slot` to `to`, keeping its slot. Returns the square it left.
    pub fn move_piece(&mut self, slot: usize, to: Coord) -> StoreResult<Coord> {
        let from = self.coords_of(slot).ok_or(StoreError::InvalidSlot { slot })?;
        if from == to {
            return Ok(from);
        }
        if let Some(occupant) = self.coords.lookup(to) {
            return Err(StoreError::PositionConflict {
                coords: to,
                occupant,
            });
        }

        self.coords.unregister_slot(slot, from)?;
        if let Err(e) = self.lines.unregister_from_lines(slot, from) {
            self.coords.register(slot, from)?;
            return Err(e);
        }
        self.store.write(slot, to);
        self.coords.register(slot, to)?;
        self.lines.register_on_lines(slot, to);
        trace!(slot, %from, %to, "move");
        Ok(from)
    }

    fn mark_exhausted(&mut self, ty: PieceType) -> StoreError {
        warn!(%ty, generation = self.generation, "no vacant slot left");
        self.demand(ty, 1);
        StoreError::SlotExhausted { piece_type: ty }
    }

    fn demand(&mut self, ty: PieceType, vacancies: usize) {
        if let GrowthState::Exhausted { demand } = &mut self.growth {
            let want = demand.entry(ty).or_insert(0);
            *want = (*want).max(vacancies);
        } else {
            let mut demand = FxHashMap::default();
            demand.insert(ty, vacancies);
            self.growth = GrowthState::Exhausted { demand };
        }
    }

    /// Asks the next regeneration to leave at least `count` vacant slots for `ty`.
    ///
    /// Does nothing if the type already has that many. Returns whether a
    /// regeneration is now needed.
    pub fn request_vacancies(&mut self, ty: PieceType, count: usize) -> bool {
        if self.vacancies(ty).len() >= count {
            return false;
        }
        self.demand(ty, count);
        true
    }

    #[inline]
    pub fn lookup(&self, coords: Coord) -> Option<usize> {
        self.coords.lookup(coords)
    }

    pub fn piece_at(&self, coords: Coord) -> Option<Piece> {
        self.lookup(coords).and_then(|slot| self.piece(slot))
    }

    /// True iff `slot` exists and is not in its type's vacancy list.
    pub fn is_live(&self, slot: usize) -> bool {
        if slot >= self.store.len() {
            return false;
        }
        self.ranges
            .get(self.store.piece_type(slot))
            .is_some_and(|r| r.contains(slot) && !r.is_vacant(slot))
    }

    pub fn piece(&self, slot: usize) -> Option<Piece> {
        self.is_live(slot).then(|| Piece {
            piece_type: self.store.piece_type(slot),
            coords: self.store.coords(slot),
            slot,
        })
    }

    pub fn coords_of(&self, slot: usize) -> Option<Coord> {
        self.is_live(slot).then(|| self.store.coords(slot))
    }

    /// Live pieces in slot order.
    pub fn iter_live(&self) -> impl Iterator<Item = Piece> + '_ {
        (0..self.store.len()).filter_map(move |slot| self.piece(slot))
    }

    pub fn live_count(&self) -> usize {
        self.ranges.iter().map(|(_, r)| r.live_count()).sum()
    }

    pub fn count_of(&self, ty: PieceType) -> usize {
        self.ranges.get(ty).map_or(0, TypeRange::live_count)
    }

    /// Total slots, live and vacant.
    pub fn slot_count(&self) -> usize {
        self.store.len()
    }

    pub fn range_of(&self, ty: PieceType) -> Option<&TypeRange> {
        self.ranges.get(ty)
    }

    /// Vacant slots of `ty`, highest first; the next insert takes the last one.
    pub fn vacancies(&self, ty: PieceType) -> &[usize] {
        self.ranges
            .get(ty)
            .map(TypeRange::undefineds)
            .unwrap_or(&[])
    }

    pub fn types(&self) -> impl Iterator<Item = PieceType> + '_ {
        self.ranges.types()
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn ranges(&self) -> &TypeRangeTable {
        &self.ranges
    }

    pub fn coord_index(&self) -> &CoordIndex {
        &self.coords
    }

    pub fn line_index(&self) -> &LineIndex {
        &self.lines
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn directions(&self) -> &[Direction] {
        self.lines.directions()
    }

    pub fn line_through(&self, dir: Direction, coords: Coord) -> &[usize] {
        self.lines.line_through(dir, coords)
    }

    /// Nearest live pieces on either side of `coords` along `dir`: `(behind, ahead)`.
    pub fn neighbors_on_line(
        &self,
        dir: Direction,
        coords: Coord,
    ) -> (Option<usize>, Option<usize>) {
        self.lines
            .neighbors_on_line(dir, coords, |slot| self.store.coords(slot))
    }

    /// Bumped by every regeneration that renumbered slots. Anything cached by slot
    /// under an older generation is stale.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn growth_state(&self) -> &GrowthState {
        &self.growth
    }

    /// Checks every structural invariant; returns the first violation found.
    pub fn validate(&self) -> StoreResult<()> {
        let corrupted = |reason: String| Err(StoreError::Corrupted { reason });

        let mut cursor = 0usize;
        for (ty, range) in self.ranges.iter() {
            if range.start != cursor || range.end < range.start {
                return corrupted(format!(
                    "range of {ty} is [{}, {}), expected start {cursor}",
                    range.start, range.end
                ));
            }
            cursor = range.end;
            let u = range.undefineds();
            if u.windows(2).any(|w| w[0] <= w[1]) || u.iter().any(|&s| !range.contains(s)) {
                return corrupted(format!("vacancy list of {ty} is unsorted or out of range"));
            }
            if let Some(slot) = (range.start..range.end).find(|&s| self.store.piece_type(s) != ty) {
                return corrupted(format!("slot {slot} is in the range of {ty} with another type"));
            }
        }
        if cursor != self.store.len() {
            return corrupted(format!(
                "ranges cover {cursor} slots, store has {}",
                self.store.len()
            ));
        }

        let live = self.live_count();
        if self.coords.len() != live {
            return corrupted(format!(
                "{} point entries for {live} live pieces",
                self.coords.len()
            ));
        }
        for (key, slot) in self.coords.iter() {
            if self.coords_of(slot) != Some(key.coord()) {
                return corrupted(format!("point entry {key} names slot {slot}, not live there"));
            }
        }

        for &dir in self.lines.directions() {
            let indexed = self.lines.entry_count(dir);
            if indexed != live {
                return corrupted(format!(
                    "direction {} indexes {indexed} slots, {live} are live",
                    dir.vector()
                ));
            }
            for (key, bucket) in self.lines.buckets(dir) {
                if bucket.is_empty() || bucket.windows(2).any(|w| w[0] >= w[1]) {
                    return corrupted(format!("bucket {key:?} is empty or unsorted"));
                }
                for &slot in bucket {
                    match self.coords_of(slot) {
                        Some(c) if LineKey::new(dir, c) == key => {}
                        _ => {
                            return corrupted(format!("slot {slot} is filed under line {key:?}"))
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
