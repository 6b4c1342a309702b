//! Regeneration: rebuilding the slot arrays with more slack once a type runs out.
//!
//! The store is in one of two states. [`GrowthState::Normal`] means every insert
//! either succeeds or fails for a reason unrelated to capacity. An insert that finds
//! no vacancy switches to [`GrowthState::Exhausted`], remembering how many vacancies
//! the type needs (one, or more via [`OrganizedPieces::request_vacancies`]). Nothing
//! grows on its own; the caller runs [`OrganizedPieces::regenerate`] and retries.
//!
//! Regeneration renumbers slots. Every range moves up by the total growth of the
//! ranges before it, and the point and line indices are rewritten to match. The
//! returned [`Regeneration`] carries the shift table so holders of slot numbers
//! (undo stacks, render caches) can follow along.

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::core::piece::PieceType;
use crate::error::{StoreError, StoreResult};
use crate::organized::OrganizedPieces;
use crate::ranges::{TypeRange, TypeRangeTable};
use crate::store::{try_reserve, Store};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum GrowthState {
    #[default]
    Normal,
    /// Vacancies each short type needs after the next regeneration.
    Exhausted { demand: FxHashMap<PieceType, usize> },
}

/// Where one pre-regeneration range went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shift {
    pub piece_type: PieceType,
    pub old_start: usize,
    pub old_end: usize,
    pub offset: usize,
}

/// Outcome of a regeneration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Regeneration {
    /// Store generation after this regeneration.
    pub generation: u64,
    /// One entry per pre-existing range, in slot order.
    pub shifts: Vec<Shift>,
    /// Slots added per type (including types that had no range before).
    pub grown: Vec<(PieceType, usize)>,
}

impl Regeneration {
    /// False if nothing needed to grow; slot numbers are then unchanged.
    pub fn renumbered(&self) -> bool {
        !self.grown.is_empty()
    }

    /// New slot number of a pre-regeneration slot.
    pub fn remap(&self, slot: usize) -> usize {
        let i = self.shifts.partition_point(|s| s.old_end <= slot);
        match self.shifts.get(i) {
            Some(s) if s.old_start <= slot => slot + s.offset,
            _ => slot,
        }
    }
}

impl OrganizedPieces {
    /// Grows every type's slack back to its policy target (at least the requested
    /// vacancies for exhausted types), rewrites the indices and returns to
    /// [`GrowthState::Normal`].
    ///
    /// O(total slots). Fails with `Config` if the slot count would overflow and with
    /// `AllocationFailed` if the new arrays cannot be allocated; the store is
    /// unchanged in both cases.
    pub fn regenerate(&mut self) -> StoreResult<Regeneration> {
        let demand = match &self.growth {
            GrowthState::Normal => FxHashMap::default(),
            GrowthState::Exhausted { demand } => demand.clone(),
        };

        let mut all_types: Vec<PieceType> = self.ranges.types().collect();
        all_types.extend(demand.keys().copied());
        all_types.sort_unstable();
        all_types.dedup();

        // (type, existing range, slots to add)
        let mut plan: Vec<(PieceType, Option<&TypeRange>, usize)> =
            Vec::with_capacity(all_types.len());
        for ty in all_types {
            let range = self.ranges.get(ty);
            let live = range.map_or(0, TypeRange::live_count);
            let vacant = range.map_or(0, |r| r.undefineds().len());
            let want = self
                .config
                .slack_for(ty, live)
                .max(demand.get(&ty).copied().unwrap_or(0));
            plan.push((ty, range, want.saturating_sub(vacant)));
        }

        let too_big = || StoreError::Config {
            reason: format!("regeneration would grow past {} slots", usize::MAX),
        };
        let total_growth = plan
            .iter()
            .try_fold(0usize, |sum, &(_, _, add)| sum.checked_add(add))
            .ok_or_else(too_big)?;
        if total_growth == 0 {
            self.growth = GrowthState::Normal;
            return Ok(Regeneration {
                generation: self.generation,
                shifts: Vec::new(),
                grown: Vec::new(),
            });
        }
        let total = self.store.len().checked_add(total_growth).ok_or_else(too_big)?;

        let mut store = Store::with_capacity(total)?;
        let mut ranges = Vec::with_capacity(plan.len());
        let mut shifts = Vec::with_capacity(plan.len());
        let mut grown = Vec::new();
        for &(ty, old, add) in &plan {
            let start = store.len();
            let old_vacant = old.map_or(0, |r| r.undefineds().len());
            let mut undefineds = Vec::new();
            try_reserve(&mut undefineds, old_vacant + add, "type_range.undefineds")?;
            if let Some(old) = old {
                store.extend_from(&self.store, old.start, old.end);
                shifts.push(Shift {
                    piece_type: ty,
                    old_start: old.start,
                    old_end: old.end,
                    offset: start - old.start,
                });
            }
            let fresh_start = store.len();
            store.push_vacant(ty, add);
            // descending: fresh slots sit above every old one
            undefineds.extend((fresh_start..store.len()).rev());
            if let Some(old) = old {
                let offset = start - old.start;
                undefineds.extend(old.undefineds().iter().map(|&s| s + offset));
            }
            if add > 0 {
                grown.push((ty, add));
            }
            ranges.push((ty, TypeRange::from_parts(start, store.len(), undefineds)));
        }

        self.generation += 1;
        let event = Regeneration {
            generation: self.generation,
            shifts,
            grown,
        };

        self.store = store;
        self.ranges = TypeRangeTable::from_ranges(ranges);
        self.coords.remap(|s| event.remap(s));
        self.lines.remap(|s| event.remap(s));
        self.growth = GrowthState::Normal;

        debug!(
            generation = self.generation,
            slots = self.store.len(),
            added = total_growth,
            types_grown = event.grown.len(),
            "regenerated piece store"
        );
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::core::coord::{Coord, ORTHOGONALS};
    use crate::position::Position;
    use crate::slack::SlackPolicy;

    const A: PieceType = PieceType(1);
    const B: PieceType = PieceType(5);
    const C: PieceType = PieceType(9);

    fn shift(piece_type: PieceType, old_start: usize, old_end: usize, offset: usize) -> Shift {
        Shift {
            piece_type,
            old_start,
            old_end,
            offset,
        }
    }

    #[test]
    fn remap_follows_shift_table() {
        let event = Regeneration {
            generation: 1,
            shifts: vec![shift(A, 0, 2, 0), shift(B, 2, 2, 3), shift(C, 2, 5, 3)],
            grown: vec![(A, 3)],
        };
        assert_eq!(event.remap(1), 1);
        assert_eq!(event.remap(2), 5);
        assert_eq!(event.remap(4), 7);
        assert_eq!(event.remap(40), 40);
    }

    #[test]
    fn exhausted_fixed_type_gets_one_slot() {
        let pos = Position::new()
            .with(Coord::new(0, 0), A)
            .with(Coord::new(1, 0), C);
        let cfg = StoreConfig::new().with_slides(&ORTHOGONALS);
        let mut p = OrganizedPieces::allocate(&pos, &cfg).unwrap();
        assert_eq!(p.slot_count(), 2);

        assert_eq!(
            p.insert(A, Coord::new(5, 5), None),
            Err(StoreError::SlotExhausted { piece_type: A })
        );
        let event = p.regenerate().unwrap();
        assert!(event.renumbered());
        assert_eq!(event.grown, vec![(A, 1)]);
        assert_eq!(p.growth_state(), &GrowthState::Normal);
        assert_eq!(p.generation(), 1);
        // C moved up by one
        assert_eq!(p.lookup(Coord::new(1, 0)), Some(2));
        assert_eq!(p.insert(A, Coord::new(5, 5), None), Ok(1));
        p.validate().unwrap();
    }

    #[test]
    fn unseen_type_gets_a_range_in_type_order() {
        let pos = Position::new()
            .with(Coord::new(0, 0), A)
            .with(Coord::new(1, 0), C);
        let cfg = StoreConfig::new().with_slides(&ORTHOGONALS);
        let mut p = OrganizedPieces::allocate(&pos, &cfg).unwrap();
        assert!(p.range_of(B).is_none());

        assert_eq!(
            p.insert(B, Coord::new(3, 3), None),
            Err(StoreError::SlotExhausted { piece_type: B })
        );
        let event = p.regenerate().unwrap();
        assert_eq!(event.grown, vec![(B, 1)]);
        assert_eq!(p.range_of(B).map(|r| (r.start, r.end)), Some((1, 2)));
        assert_eq!(p.range_of(C).map(|r| r.start), Some(2));
        assert_eq!(p.insert(B, Coord::new(3, 3), None), Ok(1));
        p.validate().unwrap();
    }

    #[test]
    fn requested_vacancies_are_honored() {
        let pos = Position::new()
            .with(Coord::new(0, 0), A)
            .with(Coord::new(1, 0), C);
        let cfg = StoreConfig::new().with_slides(&ORTHOGONALS);
        let mut p = OrganizedPieces::allocate(&pos, &cfg).unwrap();

        assert!(p.request_vacancies(A, 3));
        assert!(p.request_vacancies(B, 2));
        assert!(!p.request_vacancies(C, 0));
        let event = p.regenerate().unwrap();
        assert_eq!(event.grown, vec![(A, 3), (B, 2)]);
        assert_eq!(p.vacancies(A), &[3, 2, 1]);
        assert_eq!(p.vacancies(B), &[5, 4]);
        assert_eq!(p.lookup(Coord::new(1, 0)), Some(6));
        for x in 0..3 {
            p.insert(A, Coord::new(x, 9), None).unwrap();
        }
        assert!(p.vacancies(A).is_empty());
        p.validate().unwrap();
    }

    #[test]
    fn overflowing_demand_is_refused() {
        let pos = Position::new().with(Coord::new(0, 0), A);
        let cfg = StoreConfig::new().with_slides(&ORTHOGONALS);
        let mut p = OrganizedPieces::allocate(&pos, &cfg).unwrap();
        p.request_vacancies(A, usize::MAX);
        p.request_vacancies(B, usize::MAX);
        let before = p.clone();
        assert!(matches!(p.regenerate(), Err(StoreError::Config { .. })));
        assert_eq!(p, before);
    }

    #[test]
    fn nothing_to_grow_keeps_numbering() {
        let pos = Position::new().with(Coord::new(0, 0), A);
        let cfg = StoreConfig::new()
            .with_type(A, SlackPolicy::Promotion)
            .with_slides(&ORTHOGONALS);
        let mut p = OrganizedPieces::allocate(&pos, &cfg).unwrap();
        let before = p.clone();
        let event = p.regenerate().unwrap();
        assert!(!event.renumbered());
        assert_eq!(p, before);
    }
}
