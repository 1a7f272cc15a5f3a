use rand::rngs::StdRng;
use rand::{rng, Rng, SeedableRng};

use crate::env::{Action, ActionMask, Observation};
use crate::players::policy::Policy;

/// Uniformly random legal player. Fills the fixed opponent seat during
/// training and serves as the evaluation baseline.
pub struct RandomPlayer {
    rng: StdRng,
}

impl RandomPlayer {
    pub fn new() -> Self {
        Self::with_seed(rng().random())
    }

    pub fn with_seed(seed: u64) -> Self {
        RandomPlayer {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl Policy for RandomPlayer {
    fn predict(&mut self, _observation: &Observation, masks: Option<&ActionMask>) -> Action {
        let masks = masks.expect("random player needs the legal-action mask");
        let legal: Vec<usize> = masks
            .iter()
            .enumerate()
            .filter_map(|(i, &m)| if m { Some(i) } else { None })
            .collect();
        debug_assert!(!legal.is_empty(), "mask with no legal action");
        Action(legal[self.rng.random_range(0..legal.len())])
    }
}
