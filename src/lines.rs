//! Line index: for every slide direction in play, which live slots sit on which line.
//!
//! A direction `d = (dx, dy)` is stored normalized (`dx > 0`, or `dx == 0 && dy > 0`),
//! so a direction and its opposite share one family of lines. A line within the
//! family is named by a [`LineKey`]:
//!
//! - `c = dx*y - dy*x`, constant along the line,
//! - `x`, the residue of the point along the stepping axis. Two points with the same
//!   `c` can only reach each other by repeated steps of `d` if their residues match;
//!   for primitive steps like `(1,0)` or `(1,2)` this is always 0.
//!
//! Buckets hold slots in ascending order and are removed as soon as they empty, so
//! "is anything on this line" is a presence test.

use rustc_hash::FxHashMap;

use crate::core::coord::Coord;
use crate::error::{StoreError, StoreResult};

/// A normalized slide direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Direction(Coord);

impl Direction {
    pub fn new(v: Coord) -> StoreResult<Self> {
        if v.is_zero() {
            return Err(StoreError::InvalidDirection { dx: v.x, dy: v.y });
        }
        if v.x < 0 || (v.x == 0 && v.y < 0) {
            // i64::MIN has no positive counterpart.
            if v.x == i64::MIN || v.y == i64::MIN {
                return Err(StoreError::InvalidDirection { dx: v.x, dy: v.y });
            }
            Ok(Direction(-v))
        } else {
            Ok(Direction(v))
        }
    }

    #[inline]
    pub fn vector(self) -> Coord {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LineKey {
    pub c: i128,
    pub x: i64,
}

impl LineKey {
    pub fn new(dir: Direction, p: Coord) -> Self {
        let d = dir.vector();
        let c = d.x as i128 * p.y as i128 - d.y as i128 * p.x as i128;
        let x = if d.x != 0 {
            p.x.rem_euclid(d.x)
        } else {
            p.y.rem_euclid(d.y)
        };
        LineKey { c, x }
    }
}

/// Signed position of `p` along `dir`, relative to `origin`, measured on the stepping
/// axis (x unless the direction is vertical). Only meaningful for points on the same
/// line, where it orders them the same way as the dot product with `dir`.
#[inline]
fn along(dir: Direction, origin: Coord, p: Coord) -> i128 {
    if dir.vector().x != 0 {
        p.x as i128 - origin.x as i128
    } else {
        p.y as i128 - origin.y as i128
    }
}

type Buckets = FxHashMap<LineKey, Vec<usize>>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineIndex {
    directions: Vec<Direction>,
    buckets: Vec<Buckets>,
}

impl LineIndex {
    /// Normalizes and deduplicates `vectors`, keeping first-seen order.
    pub fn new(vectors: &[Coord]) -> StoreResult<Self> {
        let mut directions: Vec<Direction> = Vec::with_capacity(vectors.len());
        for &v in vectors {
            let d = Direction::new(v)?;
            if !directions.contains(&d) {
                directions.push(d);
            }
        }
        let buckets = vec![Buckets::default(); directions.len()];
        Ok(Self {
            directions,
            buckets,
        })
    }

    #[inline]
    pub fn directions(&self) -> &[Direction] {
        &self.directions
    }

    fn family(&self, dir: Direction) -> Option<&Buckets> {
        self.directions
            .iter()
            .position(|&d| d == dir)
            .map(|i| &self.buckets[i])
    }

    pub fn register_on_lines(&mut self, slot: usize, coords: Coord) {
        for (dir, family) in self.directions.iter().zip(self.buckets.iter_mut()) {
            let bucket = family.entry(LineKey::new(*dir, coords)).or_default();
            if let Err(i) = bucket.binary_search(&slot) {
                bucket.insert(i, slot);
            }
        }
    }

    /// Removes `slot` from the bucket of every direction, recomputed from `coords`.
    ///
    /// All buckets are checked before any is touched.
    pub fn unregister_from_lines(&mut self, slot: usize, coords: Coord) -> StoreResult<()> {
        for (dir, family) in self.directions.iter().zip(self.buckets.iter()) {
            let present = family
                .get(&LineKey::new(*dir, coords))
                .is_some_and(|b| b.binary_search(&slot).is_ok());
            if !present {
                return Err(StoreError::InvalidSlot { slot });
            }
        }
        for (dir, family) in self.directions.iter().zip(self.buckets.iter_mut()) {
            let key = LineKey::new(*dir, coords);
            if let Some(bucket) = family.get_mut(&key) {
                if let Ok(i) = bucket.binary_search(&slot) {
                    bucket.remove(i);
                }
                if bucket.is_empty() {
                    family.remove(&key);
                }
            }
        }
        Ok(())
    }

    /// Slots on the line with key `key` in direction `dir`.
    pub fn line(&self, dir: Direction, key: LineKey) -> &[usize] {
        self.family(dir)
            .and_then(|f| f.get(&key))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Slots on the line through `coords` in direction `dir`.
    pub fn line_through(&self, dir: Direction, coords: Coord) -> &[usize] {
        self.line(dir, LineKey::new(dir, coords))
    }

    /// All non-empty buckets of one direction.
    pub fn buckets(&self, dir: Direction) -> impl Iterator<Item = (LineKey, &[usize])> + '_ {
        self.family(dir)
            .into_iter()
            .flat_map(|f| f.iter().map(|(k, b)| (*k, b.as_slice())))
    }

    /// Nearest slots on either side of `coords` along `dir`: `(behind, ahead)`, where
    /// "ahead" is the positive direction of the normalized vector. A piece standing on
    /// `coords` itself is skipped.
    pub fn neighbors_on_line(
        &self,
        dir: Direction,
        coords: Coord,
        coords_of: impl Fn(usize) -> Coord,
    ) -> (Option<usize>, Option<usize>) {
        let mut behind: Option<(i128, usize)> = None;
        let mut ahead: Option<(i128, usize)> = None;
        for &slot in self.line_through(dir, coords) {
            let t = along(dir, coords, coords_of(slot));
            if t > 0 && ahead.map_or(true, |(best, _)| t < best) {
                ahead = Some((t, slot));
            } else if t < 0 && behind.map_or(true, |(best, _)| t > best) {
                behind = Some((t, slot));
            }
        }
        (behind.map(|(_, s)| s), ahead.map(|(_, s)| s))
    }

    /// Total number of bucket entries for one direction.
    pub fn entry_count(&self, dir: Direction) -> usize {
        self.family(dir)
            .map_or(0, |f| f.values().map(Vec::len).sum())
    }

    /// Rewrites every stored slot through `f`, which must be strictly increasing.
    pub(crate) fn remap(&mut self, f: impl Fn(usize) -> usize) {
        for family in &mut self.buckets {
            for bucket in family.values_mut() {
                for slot in bucket.iter_mut() {
                    *slot = f(*slot);
                }
            }
        }
    }
}
