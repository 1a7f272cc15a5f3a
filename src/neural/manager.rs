//! Model Manager
//!
//! Centralized construct-or-load handling for the actor-critic model:
//! initialization, checkpoint loading with a masking override, saving,
//! and single-observation inference.

use std::collections::HashMap;
use std::path::Path;

use tch::nn::OptimizerConfig;
use tch::{nn, Device, Kind};

use crate::env::{Action, ActionMask, Observation};
use crate::neural::actor_critic::{apply_action_mask, ActorCritic};
use crate::neural::encoding::{observation_to_tensor, INPUT_DIM};
use crate::neural::model_io::{load_varstore, read_metadata, save_varstore};
use crate::{QuartoRlError, Result};

const FORMAT_TAG: &str = "quarto-rl/actor-critic/v1";

/// Configuration for model initialization
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Flat observation width
    pub input_dim: i64,
    /// Discrete action space size
    pub action_dim: i64,
    /// Device to use for computation (CPU/GPU)
    pub device: Device,
    /// Adam learning rate
    pub learning_rate: f64,
    /// Whether rollouts fetch legal-action masks for the policy
    pub use_masking: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            input_dim: INPUT_DIM as i64,
            action_dim: Action::SPACE as i64,
            device: Device::Cpu,
            learning_rate: 3e-4,
            use_masking: false,
        }
    }
}

/// One sampled decision: the action plus the statistics the learner
/// needs to store alongside it.
#[derive(Debug, Clone, Copy)]
pub struct SampledAction {
    pub action: Action,
    pub log_prob: f32,
    pub value: f32,
}

/// Owns the VarStore, the network and its optimizer.
pub struct ModelManager {
    config: ModelConfig,
    vs: nn::VarStore,
    net: ActorCritic,
    optimizer: nn::Optimizer,
}

impl ModelManager {
    /// Fresh model with the given configuration.
    pub fn with_config(config: ModelConfig) -> Result<Self> {
        log::debug!(
            "model config: input_dim={}, action_dim={}, masking={}",
            config.input_dim,
            config.action_dim,
            config.use_masking
        );
        let vs = nn::VarStore::new(config.device);
        let net = ActorCritic::new(&vs, config.input_dim, config.action_dim);
        let optimizer = nn::Adam::default()
            .build(&vs, config.learning_rate)
            .map_err(|e| QuartoRlError::Model(format!("building optimizer: {e}")))?;
        Ok(ModelManager {
            config,
            vs,
            net,
            optimizer,
        })
    }

    /// Load a checkpoint. `use_masking` overrides the flag stored in the
    /// checkpoint when given; otherwise the stored flag applies.
    pub fn load(path: impl AsRef<Path>, use_masking: Option<bool>) -> Result<Self> {
        let path = path.as_ref();
        let metadata = read_metadata(path)?;
        if let Some(tag) = metadata.get("format") {
            if tag != FORMAT_TAG {
                return Err(QuartoRlError::Model(format!(
                    "unexpected checkpoint format '{tag}' in {}",
                    path.display()
                )));
            }
        }
        let stored_masking = metadata
            .get("use_masking")
            .map(|v| v == "true")
            .unwrap_or(false);
        let config = ModelConfig {
            input_dim: parse_dim(&metadata, "input_dim", INPUT_DIM as i64)?,
            action_dim: parse_dim(&metadata, "action_dim", Action::SPACE as i64)?,
            use_masking: use_masking.unwrap_or(stored_masking),
            ..Default::default()
        };
        let mut manager = Self::with_config(config)?;
        load_varstore(&mut manager.vs, path)?;
        log::info!(
            "model loaded from {} (masking: {})",
            path.display(),
            manager.config.use_masking
        );
        Ok(manager)
    }

    /// Persist weights plus the settings needed to reload them.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut metadata = HashMap::new();
        metadata.insert("format".to_string(), FORMAT_TAG.to_string());
        metadata.insert(
            "use_masking".to_string(),
            self.config.use_masking.to_string(),
        );
        metadata.insert("input_dim".to_string(), self.config.input_dim.to_string());
        metadata.insert("action_dim".to_string(), self.config.action_dim.to_string());
        save_varstore(&self.vs, path.as_ref(), metadata)?;
        log::info!("model saved to {}", path.as_ref().display());
        Ok(())
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn use_masking(&self) -> bool {
        self.config.use_masking
    }

    pub fn net(&self) -> &ActorCritic {
        &self.net
    }

    pub fn optimizer_mut(&mut self) -> &mut nn::Optimizer {
        &mut self.optimizer
    }

    /// Sample an action for one observation, without tracking gradients.
    pub fn act(&self, observation: &Observation, masks: Option<&ActionMask>) -> SampledAction {
        tch::no_grad(|| {
            let input = observation_to_tensor(observation);
            let mut logits = self.net.policy_logits(&input);
            if let Some(mask) = masks {
                logits = apply_action_mask(&logits, mask);
            }
            let log_probs = logits.log_softmax(-1, Kind::Float);
            let sampled = log_probs.exp().multinomial(1, true);
            let action = sampled.int64_value(&[0, 0]);
            SampledAction {
                action: Action(action as usize),
                log_prob: log_probs.double_value(&[0, action]) as f32,
                value: self.net.value(&input).double_value(&[0]) as f32,
            }
        })
    }

    /// Value estimate for one observation, for bootstrapping rollouts.
    pub fn value(&self, observation: &Observation) -> f32 {
        tch::no_grad(|| {
            let input = observation_to_tensor(observation);
            self.net.value(&input).double_value(&[0]) as f32
        })
    }
}

fn parse_dim(metadata: &HashMap<String, String>, key: &str, default: i64) -> Result<i64> {
    match metadata.get(key) {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| QuartoRlError::Model(format!("bad '{key}' in checkpoint: {raw}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{Environment, QuartoEnv};

    #[test]
    fn fresh_model_samples_masked_actions_legally() {
        let manager = ModelManager::with_config(ModelConfig::default()).unwrap();
        let mut env = QuartoEnv::with_seed(721);
        let obs = env.reset();
        let masks = env.action_masks();
        for _ in 0..20 {
            let sampled = manager.act(&obs, Some(&masks));
            assert!(masks[sampled.action.0]);
        }
    }

    #[test]
    fn save_load_round_trip_preserves_masking_flag() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.safetensors");
        let manager = ModelManager::with_config(ModelConfig {
            use_masking: true,
            ..Default::default()
        })
        .unwrap();
        manager.save(&path).unwrap();

        let restored = ModelManager::load(&path, None).unwrap();
        assert!(restored.use_masking());
    }

    #[test]
    fn load_time_masking_override_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.safetensors");
        let manager = ModelManager::with_config(ModelConfig {
            use_masking: true,
            ..Default::default()
        })
        .unwrap();
        manager.save(&path).unwrap();

        let restored = ModelManager::load(&path, Some(false)).unwrap();
        assert!(!restored.use_masking());
    }

    #[test]
    fn loaded_model_reproduces_value_estimates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.safetensors");
        let manager = ModelManager::with_config(ModelConfig::default()).unwrap();
        manager.save(&path).unwrap();

        let restored = ModelManager::load(&path, None).unwrap();
        let mut env = QuartoEnv::with_seed(42);
        let obs = env.reset();
        let a = manager.value(&obs);
        let b = restored.value(&obs);
        assert!((a - b).abs() < 1e-6);
    }
}
