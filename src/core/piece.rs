use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::coord::Coord;

/// Piece shape without an owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum RawType {
    Void,
    Obstacle,
    King,
    Giraffe,
    Camel,
    Zebra,
    Knightrider,
    Amazon,
    Queen,
    RoyalQueen,
    Hawk,
    Chancellor,
    Archbishop,
    Centaur,
    RoyalCentaur,
    Rose,
    Knight,
    Guard,
    Huygen,
    Rook,
    Bishop,
    Pawn,
}

impl RawType {
    pub const COUNT: u16 = 22;

    const ALL: [RawType; Self::COUNT as usize] = [
        RawType::Void,
        RawType::Obstacle,
        RawType::King,
        RawType::Giraffe,
        RawType::Camel,
        RawType::Zebra,
        RawType::Knightrider,
        RawType::Amazon,
        RawType::Queen,
        RawType::RoyalQueen,
        RawType::Hawk,
        RawType::Chancellor,
        RawType::Archbishop,
        RawType::Centaur,
        RawType::RoyalCentaur,
        RawType::Rose,
        RawType::Knight,
        RawType::Guard,
        RawType::Huygen,
        RawType::Rook,
        RawType::Bishop,
        RawType::Pawn,
    ];

    #[inline]
    pub fn from_index(i: u16) -> Option<RawType> {
        Self::ALL.get(i as usize).copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Player {
    Neutral,
    White,
    Black,
}

impl Player {
    #[inline]
    fn from_index(i: u16) -> Option<Player> {
        match i {
            0 => Some(Player::Neutral),
            1 => Some(Player::White),
            2 => Some(Player::Black),
            _ => None,
        }
    }
}

/// A piece type code: raw type plus owner, packed as `raw + player * RawType::COUNT`.
///
/// The store treats the code as opaque. Type ranges are laid out in ascending code
/// order, so the packing also fixes the slot layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PieceType(pub u16);

impl PieceType {
    #[inline]
    pub const fn new(raw: RawType, player: Player) -> Self {
        PieceType(raw as u16 + player as u16 * RawType::COUNT)
    }

    #[inline]
    pub fn raw(self) -> Option<RawType> {
        RawType::from_index(self.0 % RawType::COUNT)
    }

    #[inline]
    pub fn player(self) -> Option<Player> {
        Player::from_index(self.0 / RawType::COUNT)
    }
}

impl fmt::Display for PieceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.raw(), self.player()) {
            (Some(raw), Some(player)) => write!(f, "{raw:?}({player:?})"),
            _ => write!(f, "type#{}", self.0),
        }
    }
}

/// A live piece as seen from outside the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    pub piece_type: PieceType,
    pub coords: Coord,
    pub slot: usize,
}
