use rand::rngs::StdRng;
use rand::{rng, Rng, SeedableRng};

use crate::env::{Action, ActionMask, Environment, Observation, Step, StepInfo};
use crate::game::game_state::{GameState, MoveOutcome, Placement};
use crate::game::legal_moves::legal_placements;
use crate::game::piece::Piece;

const WIN_REWARD: f32 = 1.0;
const INVALID_REWARD: f32 = -1.0;

/// Two-player Quarto as a single shared environment: each `step` applies
/// one half-move for whichever side currently holds the piece in hand.
pub struct QuartoEnv {
    state: GameState,
    done: bool,
    rng: StdRng,
}

impl QuartoEnv {
    pub fn new() -> Self {
        Self::with_seed(rng().random())
    }

    pub fn with_seed(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let state = GameState::new(&mut rng);
        QuartoEnv {
            state,
            done: false,
            rng,
        }
    }

    fn observation(&self) -> Observation {
        let mut board = [-1i8; 16];
        for (i, cell) in self.state.board.cells().iter().enumerate() {
            if let Some(piece) = cell {
                board[i] = piece.index() as i8;
            }
        }
        let mut pool = [false; Piece::COUNT];
        for piece in &self.state.pool {
            pool[piece.index()] = true;
        }
        Observation {
            board,
            hand: self.state.hand.map_or(-1, |p| p.index() as i8),
            pool,
        }
    }
}

impl Default for QuartoEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for QuartoEnv {
    fn reset(&mut self) -> Observation {
        self.state = GameState::new(&mut self.rng);
        self.done = false;
        self.observation()
    }

    fn step(&mut self, action: Action) -> Step {
        debug_assert!(!self.done, "step called on a finished episode");
        let placement = Placement {
            cell: action.cell(),
            give: action.give(),
        };
        let (reward, done, info) = match self.state.play(placement) {
            Err(_) => (
                INVALID_REWARD,
                true,
                StepInfo {
                    invalid: true,
                    draw: false,
                },
            ),
            Ok(MoveOutcome::Won) => (WIN_REWARD, true, StepInfo::default()),
            Ok(MoveOutcome::Draw) => (
                0.0,
                true,
                StepInfo {
                    invalid: false,
                    draw: true,
                },
            ),
            Ok(MoveOutcome::Ongoing) => (0.0, false, StepInfo::default()),
        };
        self.done = done;
        Step {
            observation: self.observation(),
            reward,
            done,
            info,
        }
    }

    fn action_masks(&self) -> ActionMask {
        let mut mask = vec![false; Action::SPACE];
        for placement in legal_placements(&self.state) {
            mask[Action::from_parts(placement.cell, placement.give).0] = true;
        }
        mask
    }

    fn seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }
}
