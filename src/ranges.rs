//! Per-type partition of the slot arrays.
//!
//! Every piece type owns one contiguous half-open run of slots. Runs are laid out
//! back-to-back in ascending [`PieceType`] order, so sorting by type also sorts by
//! slot. Each run keeps its vacant slots in a descending list, so the lowest vacancy
//! is popped off the end; liveness of a slot is "not in that list".

use std::cmp::Reverse;

use crate::core::piece::PieceType;
use crate::error::{StoreError, StoreResult};
use crate::store::try_reserve;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRange {
    pub start: usize,
    pub end: usize,
    undefineds: Vec<usize>,
}

impl TypeRange {
    /// A range whose first `live` slots are occupied and the rest vacant.
    ///
    /// Fails with `Config` if the range would run past `usize::MAX`, and with
    /// `AllocationFailed` if the vacancy list cannot be reserved.
    pub fn with_live_prefix(start: usize, live: usize, slack: usize) -> StoreResult<Self> {
        let end = start
            .checked_add(live)
            .and_then(|n| n.checked_add(slack))
            .ok_or_else(|| StoreError::Config {
                reason: format!("{live} live + {slack} slack slots overflow at slot {start}"),
            })?;
        let mut undefineds = Vec::new();
        try_reserve(&mut undefineds, slack, "type_range.undefineds")?;
        undefineds.extend((start + live..end).rev());
        Ok(Self {
            start,
            end,
            undefineds,
        })
    }

    pub(crate) fn from_parts(start: usize, end: usize, undefineds: Vec<usize>) -> Self {
        debug_assert!(undefineds.windows(2).all(|w| w[0] > w[1]));
        Self {
            start,
            end,
            undefineds,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    #[inline]
    pub fn contains(&self, slot: usize) -> bool {
        (self.start..self.end).contains(&slot)
    }

    /// Vacant slots, descending.
    #[inline]
    pub fn undefineds(&self) -> &[usize] {
        &self.undefineds
    }

    #[inline]
    pub fn live_count(&self) -> usize {
        self.len() - self.undefineds.len()
    }

    #[inline]
    fn search(&self, slot: usize) -> Result<usize, usize> {
        self.undefineds.binary_search_by_key(&Reverse(slot), |&s| Reverse(s))
    }

    #[inline]
    pub fn is_vacant(&self, slot: usize) -> bool {
        self.search(slot).is_ok()
    }

    /// Claims the lowest vacant slot.
    #[inline]
    pub fn take_first_vacant(&mut self) -> Option<usize> {
        self.undefineds.pop()
    }

    /// Claims a specific vacant slot. Returns false if it is not vacant here.
    pub fn take_vacant(&mut self, slot: usize) -> bool {
        match self.search(slot) {
            Ok(i) => {
                self.undefineds.remove(i);
                true
            }
            Err(_) => false,
        }
    }

    /// Returns a slot to the free list. Returns false if it was outside the range
    /// or already vacant.
    pub fn release(&mut self, slot: usize) -> bool {
        if !self.contains(slot) {
            return false;
        }
        match self.search(slot) {
            Ok(_) => false,
            Err(i) => {
                self.undefineds.insert(i, slot);
                true
            }
        }
    }
}

/// Ordered list of `(type, range)` pairs covering `0..total_len()` without gaps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeRangeTable {
    ranges: Vec<(PieceType, TypeRange)>,
}

impl TypeRangeTable {
    /// Lays ranges out back-to-back. `plan` is `(type, live, slack)` and must be
    /// sorted by type without duplicates.
    pub fn from_plan(plan: &[(PieceType, usize, usize)]) -> StoreResult<Self> {
        debug_assert!(plan.windows(2).all(|w| w[0].0 < w[1].0));
        let mut ranges = Vec::with_capacity(plan.len());
        let mut cursor = 0usize;
        for &(ty, live, slack) in plan {
            let range = TypeRange::with_live_prefix(cursor, live, slack)?;
            cursor = range.end;
            ranges.push((ty, range));
        }
        Ok(Self { ranges })
    }

    pub(crate) fn from_ranges(ranges: Vec<(PieceType, TypeRange)>) -> Self {
        debug_assert!(ranges.windows(2).all(|w| w[0].0 < w[1].0 && w[0].1.end == w[1].1.start));
        Self { ranges }
    }

    #[inline]
    pub fn total_len(&self) -> usize {
        self.ranges.last().map_or(0, |(_, r)| r.end)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    fn index_of(&self, ty: PieceType) -> Option<usize> {
        self.ranges.binary_search_by_key(&ty, |(t, _)| *t).ok()
    }

    pub fn get(&self, ty: PieceType) -> Option<&TypeRange> {
        self.index_of(ty).map(|i| &self.ranges[i].1)
    }

    pub fn get_mut(&mut self, ty: PieceType) -> Option<&mut TypeRange> {
        self.index_of(ty).map(move |i| &mut self.ranges[i].1)
    }

    /// The range a slot falls in, if any.
    pub fn owner_of(&self, slot: usize) -> Option<(PieceType, &TypeRange)> {
        let i = self.ranges.partition_point(|(_, r)| r.end <= slot);
        self.ranges
            .get(i)
            .filter(|(_, r)| r.contains(slot))
            .map(|(t, r)| (*t, r))
    }

    pub fn iter(&self) -> impl Iterator<Item = (PieceType, &TypeRange)> + '_ {
        self.ranges.iter().map(|(t, r)| (*t, r))
    }

    pub fn types(&self) -> impl Iterator<Item = PieceType> + '_ {
        self.ranges.iter().map(|(t, _)| *t)
    }
}
