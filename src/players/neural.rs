use std::path::Path;

use crate::env::{Action, ActionMask, Observation};
use crate::neural::manager::ModelManager;
use crate::players::policy::Policy;
use crate::Result;

/// Policy backed by a trained actor-critic checkpoint.
///
/// Masks are honored whenever the caller supplies them, independent of
/// the masking flag the model was trained with.
pub struct NeuralPolicy {
    manager: ModelManager,
}

impl NeuralPolicy {
    pub fn new(manager: ModelManager) -> Self {
        NeuralPolicy { manager }
    }

    pub fn load(path: impl AsRef<Path>, use_masking: Option<bool>) -> Result<Self> {
        Ok(NeuralPolicy {
            manager: ModelManager::load(path, use_masking)?,
        })
    }
}

impl Policy for NeuralPolicy {
    fn predict(&mut self, observation: &Observation, masks: Option<&ActionMask>) -> Action {
        self.manager.act(observation, masks).action
    }
}
