use std::fmt;
use std::ops::Neg;

use serde::{Deserialize, Serialize};

/// A square on the unbounded board.
///
/// Components are full-width `i64`; any arithmetic that combines two coordinates
/// (keys, line constants) is widened to `i128` so it cannot overflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub x: i64,
    pub y: i64,
}

impl Coord {
    pub const ORIGIN: Coord = Coord { x: 0, y: 0 };

    #[inline]
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.x == 0 && self.y == 0
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

impl Neg for Coord {
    type Output = Coord;

    #[inline]
    fn neg(self) -> Self::Output {
        Coord::new(-self.x, -self.y)
    }
}

/// Rook lines.
pub const ORTHOGONALS: [Coord; 2] = [Coord { x: 1, y: 0 }, Coord { x: 0, y: 1 }];

/// Bishop lines.
pub const DIAGONALS: [Coord; 2] = [Coord { x: 1, y: 1 }, Coord { x: 1, y: -1 }];

/// Knightrider lines.
pub const HIPPOGONALS: [Coord; 4] = [
    Coord { x: 1, y: 2 },
    Coord { x: 1, y: -2 },
    Coord { x: 2, y: 1 },
    Coord { x: 2, y: -1 },
];
