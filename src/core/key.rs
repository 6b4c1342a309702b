use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::core::coord::Coord;

/// A board coordinate packed into a single `i128`.
///
/// High 64 bits = x, low 64 bits = y. The packing is a bijection on `(i64, i64)`,
/// so the key never collides and round-trips every coordinate exactly, however far
/// from the origin it lies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CoordKey(i128);

impl CoordKey {
    #[inline]
    pub fn from_coord(c: Coord) -> CoordKey {
        CoordKey(((c.x as i128) << 64) | (c.y as u64 as i128))
    }

    #[inline]
    pub fn coord(self) -> Coord {
        let x = (self.0 >> 64) as i64;
        let y = self.0 as i64;
        Coord { x, y }
    }

    /// Raw packed representation.
    pub fn raw(self) -> i128 {
        self.0
    }

    pub fn from_raw(raw: i128) -> CoordKey {
        CoordKey(raw)
    }
}

impl From<Coord> for CoordKey {
    #[inline]
    fn from(c: Coord) -> Self {
        CoordKey::from_coord(c)
    }
}

/// Orders by `(x, y)`, not by the packed integer (whose low half is unsigned).
impl Ord for CoordKey {
    fn cmp(&self, other: &Self) -> Ordering {
        let a = self.coord();
        let b = other.coord();
        (a.x, a.y).cmp(&(b.x, b.y))
    }
}

impl PartialOrd for CoordKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for CoordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.coord())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed coordinate key {0:?}")]
pub struct ParseKeyError(pub String);

/// Parses the `"x,y"` form produced by `Display`.
impl FromStr for CoordKey {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseKeyError(s.to_string());
        let (x, y) = s.split_once(',').ok_or_else(err)?;
        let x = x.trim().parse::<i64>().map_err(|_| err())?;
        let y = y.trim().parse::<i64>().map_err(|_| err())?;
        Ok(CoordKey::from_coord(Coord::new(x, y)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extreme_coordinates_round_trip() {
        for c in [
            Coord::new(i64::MIN, i64::MAX),
            Coord::new(i64::MAX, i64::MIN),
            Coord::new(-1, -1),
            Coord::new(0, -1),
            Coord::new(-1, 0),
            Coord::new(9_007_199_254_740_993, -9_007_199_254_740_993),
        ] {
            assert_eq!(CoordKey::from_coord(c).coord(), c);
        }
    }

    #[test]
    fn neighbouring_coordinates_get_distinct_keys() {
        let a = CoordKey::from_coord(Coord::new(0, -1));
        let b = CoordKey::from_coord(Coord::new(-1, 0));
        let c = CoordKey::from_coord(Coord::new(-1, -1));
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(b, c);
    }

    #[test]
    fn ordering_is_lexicographic_on_coords() {
        let lo = CoordKey::from_coord(Coord::new(0, -5));
        let hi = CoordKey::from_coord(Coord::new(0, 3));
        assert!(lo < hi);
        assert!(CoordKey::from_coord(Coord::new(-1, 100)) < lo);
    }

    #[test]
    fn parses_display_form() {
        let k: CoordKey = "-3, 12".parse().unwrap();
        assert_eq!(k.coord(), Coord::new(-3, 12));
        assert_eq!(k.to_string().parse::<CoordKey>().unwrap(), k);
        assert!("3".parse::<CoordKey>().is_err());
        assert!("a,b".parse::<CoordKey>().is_err());
    }
}
