//! Change records: the unit a move-application layer hands to the store.
//!
//! A move is a [`Changelist`]. Applying it forward makes the move, applying it
//! backward unmakes it. Every change kind has an exact inverse, and a list is
//! applied all-or-nothing: if one change fails, the ones before it are reverted.

use tracing::trace;

use crate::core::coord::Coord;
use crate::core::piece::{Piece, PieceType};
use crate::error::{StoreError, StoreResult};
use crate::growth::Regeneration;
use crate::organized::OrganizedPieces;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Apply {
    Forward,
    Backward,
}

impl Apply {
    #[inline]
    pub fn reversed(self) -> Self {
        match self {
            Apply::Forward => Apply::Backward,
            Apply::Backward => Apply::Forward,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// A piece appears. `slot` is filled in on first application so that redo
    /// reuses the same slot.
    Add {
        piece_type: PieceType,
        coords: Coord,
        slot: Option<usize>,
    },
    Delete { piece: Piece },
    Move { slot: usize, from: Coord, to: Coord },
    /// `slot` moves onto the square of `captured`, which is removed.
    Capture {
        slot: usize,
        from: Coord,
        to: Coord,
        captured: Piece,
    },
}

type Handler = fn(&mut Change, &mut OrganizedPieces) -> StoreResult<()>;

/// Forward and backward handler for one change.
fn handler(change: &Change, dir: Apply) -> Handler {
    match (change, dir) {
        (Change::Add { .. }, Apply::Forward) => add_forward,
        (Change::Add { .. }, Apply::Backward) => add_backward,
        (Change::Delete { .. }, Apply::Forward) => delete_forward,
        (Change::Delete { .. }, Apply::Backward) => delete_backward,
        (Change::Move { .. }, Apply::Forward) => move_forward,
        (Change::Move { .. }, Apply::Backward) => move_backward,
        (Change::Capture { .. }, Apply::Forward) => capture_forward,
        (Change::Capture { .. }, Apply::Backward) => capture_backward,
    }
}

fn add_forward(change: &mut Change, pieces: &mut OrganizedPieces) -> StoreResult<()> {
    if let Change::Add {
        piece_type,
        coords,
        slot,
    } = change
    {
        *slot = Some(pieces.insert(*piece_type, *coords, *slot)?);
    }
    Ok(())
}

fn add_backward(change: &mut Change, pieces: &mut OrganizedPieces) -> StoreResult<()> {
    if let Change::Add { coords, slot, .. } = change {
        let slot = slot.ok_or(StoreError::Corrupted {
            reason: format!("add at ({coords}) reverted before it was applied"),
        })?;
        expect_at(pieces, slot, *coords)?;
        pieces.delete(slot)?;
    }
    Ok(())
}

fn delete_forward(change: &mut Change, pieces: &mut OrganizedPieces) -> StoreResult<()> {
    if let Change::Delete { piece } = change {
        if pieces.piece(piece.slot) != Some(*piece) {
            return Err(StoreError::InvalidSlot { slot: piece.slot });
        }
        pieces.delete(piece.slot)?;
    }
    Ok(())
}

fn delete_backward(change: &mut Change, pieces: &mut OrganizedPieces) -> StoreResult<()> {
    if let Change::Delete { piece } = change {
        pieces.insert(piece.piece_type, piece.coords, Some(piece.slot))?;
    }
    Ok(())
}

fn move_forward(change: &mut Change, pieces: &mut OrganizedPieces) -> StoreResult<()> {
    if let Change::Move { slot, from, to } = change {
        expect_at(pieces, *slot, *from)?;
        pieces.move_piece(*slot, *to)?;
    }
    Ok(())
}

fn move_backward(change: &mut Change, pieces: &mut OrganizedPieces) -> StoreResult<()> {
    if let Change::Move { slot, from, to } = change {
        expect_at(pieces, *slot, *to)?;
        pieces.move_piece(*slot, *from)?;
    }
    Ok(())
}

fn capture_forward(change: &mut Change, pieces: &mut OrganizedPieces) -> StoreResult<()> {
    if let Change::Capture {
        slot,
        from,
        to,
        captured,
    } = change
    {
        expect_at(pieces, *slot, *from)?;
        if pieces.piece(captured.slot) != Some(*captured) || captured.coords != *to {
            return Err(StoreError::InvalidSlot { slot: captured.slot });
        }
        pieces.delete(captured.slot)?;
        if let Err(e) = pieces.move_piece(*slot, *to) {
            pieces.insert(captured.piece_type, captured.coords, Some(captured.slot))?;
            return Err(e);
        }
    }
    Ok(())
}

fn capture_backward(change: &mut Change, pieces: &mut OrganizedPieces) -> StoreResult<()> {
    if let Change::Capture {
        slot,
        from,
        to,
        captured,
    } = change
    {
        expect_at(pieces, *slot, *to)?;
        if let Some(occupant) = pieces.lookup(*from) {
            return Err(StoreError::PositionConflict {
                coords: *from,
                occupant,
            });
        }
        let vacant = pieces
            .range_of(captured.piece_type)
            .is_some_and(|r| r.is_vacant(captured.slot));
        if !vacant {
            return Err(StoreError::InvalidSlot { slot: captured.slot });
        }
        pieces.move_piece(*slot, *from)?;
        pieces.insert(captured.piece_type, captured.coords, Some(captured.slot))?;
    }
    Ok(())
}

fn expect_at(pieces: &OrganizedPieces, slot: usize, coords: Coord) -> StoreResult<()> {
    if pieces.coords_of(slot) == Some(coords) {
        Ok(())
    } else {
        Err(StoreError::InvalidSlot { slot })
    }
}

impl Change {
    pub fn apply(&mut self, pieces: &mut OrganizedPieces, dir: Apply) -> StoreResult<()> {
        handler(self, dir)(self, pieces)
    }

    /// Rewrites recorded slots after `event`.
    pub fn remap(&mut self, event: &Regeneration) {
        match self {
            Change::Add { slot, .. } => {
                if let Some(s) = slot {
                    *s = event.remap(*s);
                }
            }
            Change::Delete { piece } => piece.slot = event.remap(piece.slot),
            Change::Move { slot, .. } => *slot = event.remap(*slot),
            Change::Capture { slot, captured, .. } => {
                *slot = event.remap(*slot);
                captured.slot = event.remap(captured.slot);
            }
        }
    }
}

/// The piece changes of one move, in the order they are made.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Changelist {
    changes: Vec<Change>,
}

impl Changelist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, change: Change) {
        self.changes.push(change);
    }

    pub fn add(mut self, piece_type: PieceType, coords: Coord) -> Self {
        self.push(Change::Add {
            piece_type,
            coords,
            slot: None,
        });
        self
    }

    pub fn delete(mut self, piece: Piece) -> Self {
        self.push(Change::Delete { piece });
        self
    }

    pub fn move_piece(mut self, slot: usize, from: Coord, to: Coord) -> Self {
        self.push(Change::Move { slot, from, to });
        self
    }

    pub fn capture(mut self, slot: usize, from: Coord, captured: Piece) -> Self {
        self.push(Change::Capture {
            slot,
            from,
            to: captured.coords,
            captured,
        });
        self
    }

    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Applies every change (in order forward, in reverse backward). On failure the
    /// changes already applied are reverted and the original error is returned.
    pub fn apply(&mut self, pieces: &mut OrganizedPieces, dir: Apply) -> StoreResult<()> {
        let order: Vec<usize> = match dir {
            Apply::Forward => (0..self.changes.len()).collect(),
            Apply::Backward => (0..self.changes.len()).rev().collect(),
        };
        for (done, &i) in order.iter().enumerate() {
            if let Err(e) = self.changes[i].apply(pieces, dir) {
                trace!(index = i, error = %e, "change failed, rolling back");
                for &j in order[..done].iter().rev() {
                    self.changes[j]
                        .apply(pieces, dir.reversed())
                        .map_err(|undo| StoreError::Corrupted {
                            reason: format!("rollback after `{e}` failed: {undo}"),
                        })?;
                }
                return Err(e);
            }
        }
        Ok(())
    }

    /// Number of pieces each type gains from the `Add` changes of this list.
    pub fn added_per_type(&self) -> Vec<(PieceType, usize)> {
        let mut counts: Vec<(PieceType, usize)> = Vec::new();
        for change in &self.changes {
            if let Change::Add { piece_type, .. } = change {
                match counts.iter_mut().find(|(t, _)| t == piece_type) {
                    Some((_, n)) => *n += 1,
                    None => counts.push((*piece_type, 1)),
                }
            }
        }
        counts
    }

    /// Regenerates `pieces` with room for every `Add` in this list, then remaps the
    /// list to the new slot numbers.
    pub fn regenerate_for(&mut self, pieces: &mut OrganizedPieces) -> StoreResult<Regeneration> {
        for (ty, count) in self.added_per_type() {
            pieces.request_vacancies(ty, count);
        }
        let event = pieces.regenerate()?;
        self.remap(&event);
        Ok(event)
    }

    /// Forward application that regenerates once on `SlotExhausted` and retries.
    ///
    /// Returns the regeneration, if one happened, so the caller can remap anything
    /// else that holds slot numbers. This list is remapped already.
    pub fn apply_forward_growing(
        &mut self,
        pieces: &mut OrganizedPieces,
    ) -> StoreResult<Option<Regeneration>> {
        match self.apply(pieces, Apply::Forward) {
            Ok(()) => Ok(None),
            Err(StoreError::SlotExhausted { .. }) => {
                let event = self.regenerate_for(pieces)?;
                self.retry_forward(pieces)?;
                Ok(Some(event))
            }
            Err(e) => Err(e),
        }
    }

    /// Second forward attempt after a regeneration. Exhaustion now is fatal.
    pub(crate) fn retry_forward(&mut self, pieces: &mut OrganizedPieces) -> StoreResult<()> {
        self.apply(pieces, Apply::Forward).map_err(|e| match e {
            StoreError::SlotExhausted { piece_type } => {
                StoreError::RegenerationIneffective { piece_type }
            }
            e => e,
        })
    }

    pub fn remap(&mut self, event: &Regeneration) {
        for change in &mut self.changes {
            change.remap(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::core::coord::{DIAGONALS, ORTHOGONALS};
    use crate::position::Position;
    use crate::slack::SlackPolicy;

    const PAWN: PieceType = PieceType(43);
    const QUEEN: PieceType = PieceType(30);

    fn board() -> OrganizedPieces {
        let pos = Position::new()
            .with(Coord::new(0, 6), PAWN)
            .with(Coord::new(3, 3), QUEEN);
        let cfg = StoreConfig::new()
            .with_type(QUEEN, SlackPolicy::Promotion)
            .with_slides(&ORTHOGONALS)
            .with_slides(&DIAGONALS);
        OrganizedPieces::allocate(&pos, &cfg).unwrap()
    }

    #[test]
    fn promotion_round_trips() {
        let mut p = board();
        let before = p.clone();
        let pawn = p.piece_at(Coord::new(0, 6)).unwrap();
        let mut promo = Changelist::new()
            .delete(pawn)
            .add(QUEEN, Coord::new(0, 7));

        promo.apply(&mut p, Apply::Forward).unwrap();
        assert!(p.piece_at(Coord::new(0, 6)).is_none());
        assert_eq!(p.piece_at(Coord::new(0, 7)).map(|q| q.piece_type), Some(QUEEN));
        p.validate().unwrap();

        promo.apply(&mut p, Apply::Backward).unwrap();
        // the queen's vacated slot keeps stale coordinates; everything else matches
        assert_eq!(p.coord_index(), before.coord_index());
        assert_eq!(p.line_index(), before.line_index());
        assert_eq!(p.ranges(), before.ranges());

        // redo lands in the recorded slot
        let recorded = match &promo.changes()[1] {
            Change::Add { slot, .. } => *slot,
            _ => None,
        };
        promo.apply(&mut p, Apply::Forward).unwrap();
        assert_eq!(p.lookup(Coord::new(0, 7)), recorded);
    }

    #[test]
    fn failing_change_rolls_back_earlier_ones() {
        let mut p = board();
        let before = p.clone();
        let queen = p.piece_at(Coord::new(3, 3)).unwrap();
        // second change moves onto the pawn
        let mut bad = Changelist::new()
            .move_piece(queen.slot, Coord::new(3, 3), Coord::new(3, 6))
            .move_piece(queen.slot, Coord::new(3, 6), Coord::new(0, 6));
        let err = bad.apply(&mut p, Apply::Forward).unwrap_err();
        assert!(matches!(err, StoreError::PositionConflict { .. }));
        assert_eq!(p, before);
    }

    #[test]
    fn capture_restores_captured_piece() {
        let mut p = board();
        let before = p.clone();
        let queen = p.piece_at(Coord::new(3, 3)).unwrap();
        let pawn = p.piece_at(Coord::new(0, 6)).unwrap();
        let mut take = Changelist::new().capture(queen.slot, queen.coords, pawn);

        take.apply(&mut p, Apply::Forward).unwrap();
        assert_eq!(p.lookup(Coord::new(0, 6)), Some(queen.slot));
        assert!(!p.is_live(pawn.slot));
        p.validate().unwrap();

        take.apply(&mut p, Apply::Backward).unwrap();
        assert_eq!(p, before);
    }

    #[test]
    fn stale_move_record_is_rejected() {
        let mut p = board();
        let queen = p.piece_at(Coord::new(3, 3)).unwrap();
        let mut mv =
            Changelist::new().move_piece(queen.slot, Coord::new(4, 4), Coord::new(5, 5));
        assert_eq!(
            mv.apply(&mut p, Apply::Forward),
            Err(StoreError::InvalidSlot { slot: queen.slot })
        );
    }

    #[test]
    fn growing_apply_makes_room_for_every_add() {
        let mut p = board();
        // pawns are fixed and the knight and rook types have no range yet
        let knight = PieceType(38);
        let rook = PieceType(41);
        let mut extra = Changelist::new()
            .add(PAWN, Coord::new(1, 1))
            .add(PAWN, Coord::new(2, 1))
            .add(knight, Coord::new(3, 1))
            .add(rook, Coord::new(4, 1));
        assert_eq!(extra.added_per_type(), vec![(PAWN, 2), (knight, 1), (rook, 1)]);

        let event = extra.apply_forward_growing(&mut p).unwrap();
        assert!(event.is_some());
        assert_eq!(p.count_of(PAWN), 3);
        assert_eq!(p.count_of(knight), 1);
        assert_eq!(p.count_of(rook), 1);
        p.validate().unwrap();

        extra.apply(&mut p, Apply::Backward).unwrap();
        assert_eq!(p.count_of(PAWN), 1);
        p.validate().unwrap();
    }

    #[test]
    fn growing_apply_regenerates_once() {
        let mut p = board();
        let pawn_coords = Coord::new(0, 6);
        let pawn = p.piece_at(pawn_coords).unwrap();
        // pawns are fixed: adding one exhausts the type
        let mut extra = Changelist::new()
            .move_piece(pawn.slot, pawn_coords, Coord::new(0, 7))
            .add(PAWN, Coord::new(1, 1));
        let event = extra.apply_forward_growing(&mut p).unwrap();
        assert!(event.is_some_and(|e| e.renumbered()));
        assert_eq!(p.count_of(PAWN), 2);
        p.validate().unwrap();

        extra.apply(&mut p, Apply::Backward).unwrap();
        assert_eq!(p.count_of(PAWN), 1);
        assert!(p.piece_at(pawn_coords).is_some());
        p.validate().unwrap();
    }
}
