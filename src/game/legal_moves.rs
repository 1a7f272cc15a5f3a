use crate::game::board::{Board, BOARD_CELLS};
use crate::game::game_state::{GameState, Placement};

/// Returns indices of all empty cells on the board
pub fn empty_cells(board: &Board) -> Vec<usize> {
    (0..BOARD_CELLS)
        .filter(|&i| board.cell(i).is_none())
        .collect()
}

/// Enumerates every legal (cell, give) pair for the side to move.
/// Once the pool is empty the give component is unconstrained, so the
/// final placement still has 16 nominally distinct legal actions.
pub fn legal_placements(state: &GameState) -> Vec<Placement> {
    let cells = empty_cells(&state.board);
    let mut placements = Vec::new();
    for cell in cells {
        if state.pool.is_empty() {
            for give in 0..16 {
                placements.push(Placement { cell, give });
            }
        } else {
            for piece in &state.pool {
                placements.push(Placement {
                    cell,
                    give: piece.index(),
                });
            }
        }
    }
    placements
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::piece::Piece;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn fresh_game_has_sixteen_by_fifteen_placements() {
        let state = GameState::new(&mut StdRng::seed_from_u64(1));
        assert_eq!(legal_placements(&state).len(), 16 * 15);
    }

    #[test]
    fn empty_pool_frees_the_give_component() {
        let mut state = GameState::new(&mut StdRng::seed_from_u64(1));
        state.pool.clear();
        // Fill all but one cell so a single placement remains.
        for cell in 0..15 {
            state.board.place(cell, Piece((cell % 16) as u8));
        }
        let placements = legal_placements(&state);
        assert_eq!(placements.len(), 16);
        assert!(placements.iter().all(|p| p.cell == 15));
    }

    #[test]
    fn every_placement_is_playable() {
        let state = GameState::new(&mut StdRng::seed_from_u64(3));
        for placement in legal_placements(&state) {
            let mut copy = state.clone();
            copy.play(placement).expect("legal placement rejected");
        }
    }
}
