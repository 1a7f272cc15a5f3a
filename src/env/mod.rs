//! Gym-style environment layer over the Quarto rules.

pub mod one_player;
pub mod quarto_env;

pub use one_player::OnePlayerWrapper;
pub use quarto_env::QuartoEnv;

use crate::game::board::BOARD_CELLS;
use crate::game::piece::Piece;

/// Flat discrete action over the (cell, give) pair space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Action(pub usize);

impl Action {
    pub const SPACE: usize = BOARD_CELLS * Piece::COUNT;

    pub fn from_parts(cell: usize, give: usize) -> Self {
        Action(cell * Piece::COUNT + give)
    }

    pub fn cell(&self) -> usize {
        self.0 / Piece::COUNT
    }

    pub fn give(&self) -> usize {
        self.0 % Piece::COUNT
    }
}

/// Boolean vector over the action space, true where the action is legal.
pub type ActionMask = Vec<bool>;

#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// Per cell: placed piece index, or -1 when empty.
    pub board: [i8; BOARD_CELLS],
    /// Piece the side to move must place, -1 once the game ended.
    pub hand: i8,
    /// Pieces still available to hand over.
    pub pool: [bool; Piece::COUNT],
}

/// Terminal flags reported alongside `done` (always present, only
/// meaningful when `done` is true).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepInfo {
    /// The side that just moved played an illegal action.
    pub invalid: bool,
    /// Board filled without a winning line.
    pub draw: bool,
}

#[derive(Debug, Clone)]
pub struct Step {
    pub observation: Observation,
    pub reward: f32,
    pub done: bool,
    pub info: StepInfo,
}

/// The environment contract both entry points consume.
pub trait Environment {
    fn reset(&mut self) -> Observation;
    fn step(&mut self, action: Action) -> Step;
    fn action_masks(&self) -> ActionMask;
    fn seed(&mut self, seed: u64);
    /// Release any held resources. Dropping achieves the same.
    fn close(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_round_trips_through_parts() {
        let action = Action::from_parts(13, 7);
        assert_eq!(action.cell(), 13);
        assert_eq!(action.give(), 7);
        assert_eq!(action.0, 13 * 16 + 7);
    }
}
