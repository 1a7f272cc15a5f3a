use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::game::board::Board;
use crate::game::piece::Piece;

/// A full move: place the piece in hand on `cell`, then hand piece
/// `give` to the opponent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub cell: usize,
    pub give: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveError {
    OccupiedCell(usize),
    UnavailablePiece(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Ongoing,
    Won,
    Draw,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub board: Board,
    /// Piece the side to move must place. None only after the game ended.
    pub hand: Option<Piece>,
    /// Pieces still available to hand over.
    pub pool: Vec<Piece>,
}

impl GameState {
    /// Fresh game: the opening piece is drawn from the full set at random,
    /// as if the opponent had already handed it over.
    pub fn new<R: Rng>(rng: &mut R) -> Self {
        let mut pool = Piece::all();
        let first = pool.remove(rng.random_range(0..pool.len()));
        GameState {
            board: Board::new(),
            hand: Some(first),
            pool,
        }
    }

    /// Apply one move for the side holding the piece in hand.
    ///
    /// Validation happens before any mutation so an invalid move leaves
    /// the state untouched. The `give` component is only checked while
    /// the pool is non-empty; on the final placement it is ignored.
    pub fn play(&mut self, placement: Placement) -> Result<MoveOutcome, MoveError> {
        if self.board.cell(placement.cell).is_some() {
            return Err(MoveError::OccupiedCell(placement.cell));
        }
        let give_index = if self.pool.is_empty() {
            None
        } else {
            let index = self
                .pool
                .iter()
                .position(|p| p.index() == placement.give)
                .ok_or(MoveError::UnavailablePiece(placement.give))?;
            Some(index)
        };

        let piece = self.hand.take().expect("move played on finished game");
        self.board.place(placement.cell, piece);

        if self.board.has_winning_line() {
            return Ok(MoveOutcome::Won);
        }
        if self.board.is_full() {
            return Ok(MoveOutcome::Draw);
        }
        // Game continues: the chosen piece goes to the opponent's hand.
        let index = give_index.expect("non-full board implies a non-empty pool");
        self.hand = Some(self.pool.remove(index));
        Ok(MoveOutcome::Ongoing)
    }
}
