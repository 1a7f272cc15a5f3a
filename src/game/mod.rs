pub mod board;
pub mod game_state;
pub mod legal_moves;
pub mod piece;

pub use board::{Board, BOARD_CELLS};
pub use game_state::{GameState, MoveError, MoveOutcome, Placement};
pub use legal_moves::{empty_cells, legal_placements};
pub use piece::Piece;
