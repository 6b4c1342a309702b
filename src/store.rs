//! Columnar slot storage: one array each for x, y and piece type.
//!
//! The arrays carry no liveness information. A vacated slot keeps its last
//! coordinates until the next insert overwrites them.

use crate::core::coord::Coord;
use crate::core::piece::PieceType;
use crate::error::{StoreError, StoreResult};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Store {
    xs: Vec<i64>,
    ys: Vec<i64>,
    types: Vec<PieceType>,
}

impl Store {
    /// Empty columns with room for `slots` entries, or `AllocationFailed`.
    pub fn with_capacity(slots: usize) -> StoreResult<Self> {
        let mut store = Store::default();
        try_reserve(&mut store.xs, slots, "store.xs")?;
        try_reserve(&mut store.ys, slots, "store.ys")?;
        try_reserve(&mut store.types, slots, "store.types")?;
        Ok(store)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    #[inline]
    pub fn push(&mut self, ty: PieceType, c: Coord) {
        self.xs.push(c.x);
        self.ys.push(c.y);
        self.types.push(ty);
    }

    /// Appends `count` placeholder cells of type `ty`.
    pub fn push_vacant(&mut self, ty: PieceType, count: usize) {
        self.xs.extend(std::iter::repeat(0).take(count));
        self.ys.extend(std::iter::repeat(0).take(count));
        self.types.extend(std::iter::repeat(ty).take(count));
    }

    /// Appends a copy of `src[start..end]`.
    pub fn extend_from(&mut self, src: &Store, start: usize, end: usize) {
        self.xs.extend_from_slice(&src.xs[start..end]);
        self.ys.extend_from_slice(&src.ys[start..end]);
        self.types.extend_from_slice(&src.types[start..end]);
    }

    #[inline]
    pub fn write(&mut self, slot: usize, c: Coord) {
        self.xs[slot] = c.x;
        self.ys[slot] = c.y;
    }

    #[inline]
    pub fn x(&self, slot: usize) -> i64 {
        self.xs[slot]
    }

    #[inline]
    pub fn y(&self, slot: usize) -> i64 {
        self.ys[slot]
    }

    #[inline]
    pub fn coords(&self, slot: usize) -> Coord {
        Coord::new(self.xs[slot], self.ys[slot])
    }

    #[inline]
    pub fn piece_type(&self, slot: usize) -> PieceType {
        self.types[slot]
    }

    pub fn xs(&self) -> &[i64] {
        &self.xs
    }

    pub fn ys(&self) -> &[i64] {
        &self.ys
    }

    pub fn types(&self) -> &[PieceType] {
        &self.types
    }
}

pub(crate) fn try_reserve<T>(v: &mut Vec<T>, additional: usize, structure: &'static str) -> StoreResult<()> {
    v.try_reserve_exact(additional)
        .map_err(|_| StoreError::AllocationFailed { structure })
}
