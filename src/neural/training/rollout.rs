use crate::env::ActionMask;
use crate::neural::manager::SampledAction;

/// Fixed-length batch of on-policy experience, stored column-wise the
/// way the update consumes it. Legal-action masks are kept only when
/// the model trains with masking.
pub struct RolloutBuffer {
    masking: bool,
    observations: Vec<Vec<f32>>,
    actions: Vec<i64>,
    log_probs: Vec<f32>,
    values: Vec<f32>,
    rewards: Vec<f32>,
    dones: Vec<bool>,
    masks: Vec<ActionMask>,
}

impl RolloutBuffer {
    pub fn with_capacity(capacity: usize, masking: bool) -> Self {
        RolloutBuffer {
            masking,
            observations: Vec::with_capacity(capacity),
            actions: Vec::with_capacity(capacity),
            log_probs: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
            rewards: Vec::with_capacity(capacity),
            dones: Vec::with_capacity(capacity),
            masks: if masking {
                Vec::with_capacity(capacity)
            } else {
                Vec::new()
            },
        }
    }

    pub fn push(
        &mut self,
        observation: Vec<f32>,
        mask: Option<ActionMask>,
        sampled: SampledAction,
        reward: f32,
        done: bool,
    ) {
        self.observations.push(observation);
        self.actions.push(sampled.action.0 as i64);
        self.log_probs.push(sampled.log_prob);
        self.values.push(sampled.value);
        self.rewards.push(reward);
        self.dones.push(done);
        if self.masking {
            self.masks
                .push(mask.expect("masking rollout fed an unmasked transition"));
        }
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn masking(&self) -> bool {
        self.masking
    }

    pub fn observations(&self) -> &[Vec<f32>] {
        &self.observations
    }

    pub fn actions(&self) -> &[i64] {
        &self.actions
    }

    pub fn log_probs(&self) -> &[f32] {
        &self.log_probs
    }

    pub fn masks(&self) -> &[ActionMask] {
        &self.masks
    }

    /// Generalized advantage estimation over the stored trajectory.
    /// `last_value` bootstraps the value of the state following the
    /// final transition; it is ignored when that transition was
    /// terminal.
    pub fn compute_advantages(
        &self,
        gamma: f32,
        gae_lambda: f32,
        last_value: f32,
    ) -> (Vec<f32>, Vec<f32>) {
        let n = self.len();
        let mut advantages = vec![0.0f32; n];
        let mut gae = 0.0f32;
        for t in (0..n).rev() {
            let non_terminal = if self.dones[t] { 0.0 } else { 1.0 };
            let next_value = if t + 1 < n {
                self.values[t + 1]
            } else {
                last_value
            };
            let delta = self.rewards[t] + gamma * next_value * non_terminal - self.values[t];
            gae = delta + gamma * gae_lambda * non_terminal * gae;
            advantages[t] = gae;
        }
        let returns = advantages
            .iter()
            .zip(&self.values)
            .map(|(a, v)| a + v)
            .collect();
        (advantages, returns)
    }
}
