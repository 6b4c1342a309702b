//! A piece store plus the state that travels with it, and a linear move history.

use tracing::debug;

use crate::changes::{Apply, Changelist};
use crate::error::{StoreError, StoreResult};
use crate::growth::Regeneration;
use crate::organized::OrganizedPieces;
use crate::state::{apply_all, BoardState, StateChange};

/// Everything one move changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoveRecord {
    pub changes: Changelist,
    pub state: Vec<StateChange>,
}

impl MoveRecord {
    pub fn new(changes: Changelist) -> Self {
        Self {
            changes,
            state: Vec::new(),
        }
    }

    pub fn with_state(mut self, change: StateChange) -> Self {
        self.state.push(change);
        self
    }
}

#[derive(Debug, Clone)]
pub struct Board {
    pieces: OrganizedPieces,
    state: BoardState,
    history: Vec<MoveRecord>,
    /// Number of records currently applied. Records past it can be redone.
    cursor: usize,
}

impl Board {
    pub fn new(pieces: OrganizedPieces, state: BoardState) -> Self {
        Self {
            pieces,
            state,
            history: Vec::new(),
            cursor: 0,
        }
    }

    pub fn pieces(&self) -> &OrganizedPieces {
        &self.pieces
    }

    pub fn state(&self) -> &BoardState {
        &self.state
    }

    pub fn history(&self) -> &[MoveRecord] {
        &self.history[..self.cursor]
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.history.len()
    }

    /// Makes a move, dropping any undone moves. If the store had to regenerate,
    /// every recorded move is renumbered and the event is returned.
    pub fn make(&mut self, mut record: MoveRecord) -> StoreResult<Option<Regeneration>> {
        self.history.truncate(self.cursor);
        let event = match record.changes.apply(&mut self.pieces, Apply::Forward) {
            Ok(()) => None,
            Err(StoreError::SlotExhausted { .. }) => {
                let event = record.changes.regenerate_for(&mut self.pieces)?;
                // renumber before retrying so the history stays valid if the retry fails
                self.remap_history(&event);
                record.changes.retry_forward(&mut self.pieces)?;
                Some(event)
            }
            Err(e) => return Err(e),
        };
        apply_all(&record.state, &mut self.state, Apply::Forward);
        self.history.push(record);
        self.cursor += 1;
        Ok(event)
    }

    fn remap_history(&mut self, event: &Regeneration) {
        if !event.renumbered() {
            return;
        }
        for past in &mut self.history {
            past.changes.remap(event);
        }
        debug!(
            generation = event.generation,
            moves = self.history.len(),
            "remapped move history"
        );
    }

    pub fn unmake(&mut self) -> StoreResult<()> {
        if self.cursor == 0 {
            return Err(StoreError::EmptyHistory);
        }
        let record = &mut self.history[self.cursor - 1];
        record.changes.apply(&mut self.pieces, Apply::Backward)?;
        apply_all(&record.state, &mut self.state, Apply::Backward);
        self.cursor -= 1;
        Ok(())
    }

    pub fn redo(&mut self) -> StoreResult<()> {
        let Some(record) = self.history.get_mut(self.cursor) else {
            return Err(StoreError::NothingToRedo);
        };
        record.changes.apply(&mut self.pieces, Apply::Forward)?;
        apply_all(&record.state, &mut self.state, Apply::Forward);
        self.cursor += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::core::coord::{Coord, ORTHOGONALS};
    use crate::core::piece::PieceType;
    use crate::position::Position;

    const ROOK: PieceType = PieceType(19);
    const KING: PieceType = PieceType(2);

    fn board() -> Board {
        let pos = Position::new()
            .with(Coord::new(0, 0), ROOK)
            .with(Coord::new(4, 0), KING);
        let cfg = StoreConfig::new().with_slides(&ORTHOGONALS);
        let pieces = OrganizedPieces::allocate(&pos, &cfg).unwrap();
        Board::new(pieces, BoardState::new().with_special_rights([Coord::new(0, 0)]))
    }

    fn rook_lift(board: &Board, to: Coord) -> MoveRecord {
        let rook = board.pieces().piece_at(Coord::new(0, 0)).unwrap();
        MoveRecord::new(Changelist::new().move_piece(rook.slot, rook.coords, to))
            .with_state(StateChange::lose_right(board.state(), rook.coords))
    }

    #[test]
    fn make_unmake_redo() {
        let mut b = board();
        let record = rook_lift(&b, Coord::new(0, 5));
        assert_eq!(b.make(record), Ok(None));
        assert!(!b.state().has_special_right(Coord::new(0, 0)));
        assert!(b.pieces().piece_at(Coord::new(0, 5)).is_some());

        b.unmake().unwrap();
        assert!(b.state().has_special_right(Coord::new(0, 0)));
        assert!(b.pieces().piece_at(Coord::new(0, 0)).is_some());
        assert_eq!(b.unmake(), Err(StoreError::EmptyHistory));

        b.redo().unwrap();
        assert!(b.pieces().piece_at(Coord::new(0, 5)).is_some());
        assert_eq!(b.redo(), Err(StoreError::NothingToRedo));
    }

    #[test]
    fn new_move_drops_redo_tail() {
        let mut b = board();
        let record = rook_lift(&b, Coord::new(0, 5));
        b.make(record).unwrap();
        b.unmake().unwrap();
        let record = rook_lift(&b, Coord::new(0, 3));
        b.make(record).unwrap();
        assert!(!b.can_redo());
        assert_eq!(b.history().len(), 1);
    }

    #[test]
    fn failed_make_leaves_board_alone() {
        let mut b = board();
        let record = rook_lift(&b, Coord::new(4, 0));
        assert!(matches!(
            b.make(record),
            Err(StoreError::PositionConflict { .. })
        ));
        assert!(b.state().has_special_right(Coord::new(0, 0)));
        assert!(!b.can_undo());
    }

    #[test]
    fn one_move_may_add_several_pieces_of_a_full_type() {
        let mut b = board();
        let record = MoveRecord::new(
            Changelist::new()
                .add(KING, Coord::new(1, 1))
                .add(KING, Coord::new(2, 2))
                .add(PieceType(5), Coord::new(3, 3))
                .add(PieceType(7), Coord::new(4, 4)),
        );
        assert!(b.make(record).unwrap().is_some());
        assert_eq!(b.pieces().count_of(KING), 3);
        assert_eq!(b.pieces().count_of(PieceType(5)), 1);
        assert_eq!(b.pieces().count_of(PieceType(7)), 1);
        b.pieces().validate().unwrap();

        b.unmake().unwrap();
        assert_eq!(b.pieces().count_of(KING), 1);
        b.redo().unwrap();
        assert_eq!(b.pieces().count_of(KING), 3);
        b.pieces().validate().unwrap();
    }

    #[test]
    fn history_follows_regeneration() {
        let mut b = board();
        let rook = b.pieces().piece_at(Coord::new(0, 0)).unwrap();
        let record = rook_lift(&b, Coord::new(0, 5));
        b.make(record).unwrap();

        // kings are fixed and sort before rooks: a second king grows the king
        // range and pushes the rook up one slot
        let event = b
            .make(MoveRecord::new(Changelist::new().add(KING, Coord::new(7, 7))))
            .unwrap()
            .unwrap();
        assert_eq!(event.remap(rook.slot), rook.slot + 1);
        assert_eq!(b.pieces().lookup(Coord::new(0, 5)), Some(rook.slot + 1));
        b.pieces().validate().unwrap();

        b.unmake().unwrap();
        b.unmake().unwrap();
        assert_eq!(b.pieces().piece_at(Coord::new(0, 0)).map(|p| p.piece_type), Some(ROOK));
        assert_eq!(b.pieces().count_of(KING), 1);
        assert!(b.state().has_special_right(Coord::new(0, 0)));
        b.pieces().validate().unwrap();

        b.redo().unwrap();
        b.redo().unwrap();
        assert_eq!(b.pieces().count_of(KING), 2);
    }
}
