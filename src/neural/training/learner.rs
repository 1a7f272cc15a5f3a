use rand::seq::SliceRandom;
use tch::{Kind, Tensor};

use crate::env::Action;
use crate::neural::actor_critic::log_prob_and_entropy;
use crate::neural::manager::ModelManager;
use crate::neural::training::rollout::RolloutBuffer;

/// Clipped-surrogate policy-gradient hyperparameters. Defaults follow
/// the original training configuration (clip 0.2, gamma 0.99,
/// lambda 0.95, 10 epochs, minibatch 64, no entropy bonus).
#[derive(Debug, Clone)]
pub struct LearnerConfig {
    pub gamma: f32,
    pub gae_lambda: f32,
    pub clip_range: f64,
    pub epochs: usize,
    pub minibatch_size: usize,
    pub value_coef: f64,
    pub entropy_coef: f64,
    pub max_grad_norm: f64,
}

impl Default for LearnerConfig {
    fn default() -> Self {
        LearnerConfig {
            gamma: 0.99,
            gae_lambda: 0.95,
            clip_range: 0.2,
            epochs: 10,
            minibatch_size: 64,
            value_coef: 0.5,
            entropy_coef: 0.0,
            max_grad_norm: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateStats {
    pub policy_loss: f64,
    pub value_loss: f64,
    pub entropy: f64,
}

/// One optimization pass over a collected rollout.
pub fn update_policy(
    manager: &mut ModelManager,
    rollout: &RolloutBuffer,
    last_value: f32,
    config: &LearnerConfig,
) -> UpdateStats {
    let n = rollout.len() as i64;
    let input_dim = manager.config().input_dim;

    let (advantages, returns) =
        rollout.compute_advantages(config.gamma, config.gae_lambda, last_value);

    let flat_obs: Vec<f32> = rollout.observations().concat();
    let observations = Tensor::from_slice(&flat_obs).view([n, input_dim]);
    let actions = Tensor::from_slice(rollout.actions());
    let old_log_probs = Tensor::from_slice(rollout.log_probs());
    let returns = Tensor::from_slice(&returns);
    let advantages = Tensor::from_slice(&advantages);
    let advantages =
        (&advantages - advantages.mean(Kind::Float)) / (advantages.std(true) + 1e-8);

    // Illegal-action penalties are replayed during the update so the
    // new distribution matches the one the actions were sampled from.
    let blocked = rollout.masking().then(|| {
        let flags: Vec<f32> = rollout
            .masks()
            .iter()
            .flat_map(|mask| mask.iter().map(|&m| if m { 0.0 } else { 1e9 }))
            .collect();
        Tensor::from_slice(&flags).view([n, Action::SPACE as i64])
    });

    let mut indices: Vec<i64> = (0..n).collect();
    let mut stats = UpdateStats::default();
    let mut batches = 0usize;

    for _ in 0..config.epochs {
        indices.shuffle(&mut rand::rng());
        for chunk in indices.chunks(config.minibatch_size) {
            let batch = Tensor::from_slice(chunk);
            let obs_b = observations.index_select(0, &batch);
            let act_b = actions.index_select(0, &batch);
            let old_lp_b = old_log_probs.index_select(0, &batch);
            let adv_b = advantages.index_select(0, &batch);
            let ret_b = returns.index_select(0, &batch);

            let mut logits = manager.net().policy_logits(&obs_b);
            if let Some(blocked) = &blocked {
                logits = logits - blocked.index_select(0, &batch);
            }
            let (log_probs, entropy) = log_prob_and_entropy(&logits, &act_b);
            let values = manager.net().value(&obs_b);

            let ratio = (log_probs - old_lp_b).exp();
            let clipped = ratio.clamp(1.0 - config.clip_range, 1.0 + config.clip_range);
            let policy_loss = -(&ratio * &adv_b).minimum(&(clipped * &adv_b)).mean(Kind::Float);
            let value_loss = values.mse_loss(&ret_b, tch::Reduction::Mean);
            let entropy_loss = entropy.mean(Kind::Float);
            let loss: Tensor = &policy_loss
                + config.value_coef * &value_loss
                - config.entropy_coef * &entropy_loss;

            manager.optimizer_mut().zero_grad();
            loss.backward();
            manager.optimizer_mut().clip_grad_norm(config.max_grad_norm);
            manager.optimizer_mut().step();

            stats.policy_loss += policy_loss.double_value(&[]);
            stats.value_loss += value_loss.double_value(&[]);
            stats.entropy += entropy_loss.double_value(&[]);
            batches += 1;
        }
    }

    if batches > 0 {
        stats.policy_loss /= batches as f64;
        stats.value_loss /= batches as f64;
        stats.entropy /= batches as f64;
    }
    log::debug!(
        "update complete | policy loss: {:.4}, value loss: {:.4}, entropy: {:.4}",
        stats.policy_loss,
        stats.value_loss,
        stats.entropy
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{Environment, QuartoEnv};
    use crate::neural::encoding::encode_observation;
    use crate::neural::manager::ModelConfig;

    fn tiny_rollout(manager: &ModelManager, steps: usize) -> RolloutBuffer {
        let mut env = QuartoEnv::with_seed(721);
        let mut obs = env.reset();
        let mut rollout = RolloutBuffer::with_capacity(steps, manager.use_masking());
        for _ in 0..steps {
            let mask = env.action_masks();
            let sampled = manager.act(&obs, Some(&mask));
            let step = env.step(sampled.action);
            rollout.push(
                encode_observation(&obs),
                manager.use_masking().then_some(mask),
                sampled,
                step.reward,
                step.done,
            );
            obs = if step.done { env.reset() } else { step.observation };
        }
        rollout
    }

    #[test]
    fn update_runs_and_reports_finite_losses() {
        let mut manager = ModelManager::with_config(ModelConfig {
            use_masking: true,
            ..Default::default()
        })
        .unwrap();
        let rollout = tiny_rollout(&manager, 16);
        let config = LearnerConfig {
            epochs: 2,
            minibatch_size: 8,
            ..Default::default()
        };
        let stats = update_policy(&mut manager, &rollout, 0.0, &config);
        assert!(stats.policy_loss.is_finite());
        assert!(stats.value_loss.is_finite());
        assert!(stats.entropy.is_finite());
    }

    #[test]
    fn update_changes_the_policy_output() {
        let mut manager = ModelManager::with_config(ModelConfig::default()).unwrap();
        let mut env = QuartoEnv::with_seed(7);
        let obs = env.reset();
        let before = manager.value(&obs);
        let rollout = tiny_rollout(&manager, 32);
        let config = LearnerConfig {
            epochs: 4,
            minibatch_size: 16,
            ..Default::default()
        };
        update_policy(&mut manager, &rollout, 0.0, &config);
        let after = manager.value(&obs);
        assert!((before - after).abs() > 0.0);
    }
}
