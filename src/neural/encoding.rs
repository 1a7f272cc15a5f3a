use tch::Tensor;

use crate::env::Observation;
use crate::game::board::BOARD_CELLS;
use crate::game::piece::Piece;

/// Per-cell features: occupancy flag + 4 attribute bits.
const CELL_FEATURES: usize = 5;
/// Hand features: presence flag + 4 attribute bits.
const HAND_FEATURES: usize = 5;

/// Flat observation width fed to the MLP towers.
pub const INPUT_DIM: usize = BOARD_CELLS * CELL_FEATURES + HAND_FEATURES + Piece::COUNT;

fn push_piece_bits(features: &mut Vec<f32>, piece: i8) {
    if piece < 0 {
        features.extend_from_slice(&[0.0; CELL_FEATURES]);
    } else {
        features.push(1.0);
        for bit in 0..4 {
            features.push(((piece as u8 >> bit) & 1) as f32);
        }
    }
}

/// Flattens an observation into the network input vector.
pub fn encode_observation(observation: &Observation) -> Vec<f32> {
    let mut features = Vec::with_capacity(INPUT_DIM);
    for &cell in &observation.board {
        push_piece_bits(&mut features, cell);
    }
    push_piece_bits(&mut features, observation.hand);
    for &available in &observation.pool {
        features.push(if available { 1.0 } else { 0.0 });
    }
    debug_assert_eq!(features.len(), INPUT_DIM);
    features
}

/// Single-row input tensor of shape [1, INPUT_DIM].
pub fn observation_to_tensor(observation: &Observation) -> Tensor {
    Tensor::from_slice(&encode_observation(observation)).view([1, INPUT_DIM as i64])
}
