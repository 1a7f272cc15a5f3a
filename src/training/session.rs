use crate::checkpoint::eval_log::EvalLog;
use crate::checkpoint::run_dir::RunDir;
use crate::env::Environment;
use crate::neural::encoding::encode_observation;
use crate::neural::manager::ModelManager;
use crate::neural::training::learner::{update_policy, LearnerConfig};
use crate::neural::training::rollout::RolloutBuffer;
use crate::training::evaluator::evaluate_model;
use crate::Result;

pub const BEST_MODEL_FILE: &str = "best_model.safetensors";

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Total environment steps to train for.
    pub total_timesteps: u64,
    /// Steps collected per policy update.
    pub rollout_steps: usize,
    /// Evaluate every this many environment steps.
    pub eval_freq: u64,
    /// Episodes per evaluation.
    pub eval_episodes: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            total_timesteps: 100_000,
            rollout_steps: 2048,
            eval_freq: 10_000,
            eval_episodes: 200,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TrainingReport {
    pub timesteps: u64,
    pub episodes: u64,
    pub updates: usize,
    pub best_mean_reward: Option<f64>,
}

/// Runs the learn loop with periodic evaluation: collect a rollout,
/// update the policy, and every `eval_freq` steps evaluate and keep the
/// best-scoring weights in the run directory.
pub fn train_and_evaluate<E: Environment, F: Environment>(
    manager: &mut ModelManager,
    env: &mut E,
    eval_env: &mut F,
    run_dir: &RunDir,
    config: &SessionConfig,
) -> Result<TrainingReport> {
    let learner_config = LearnerConfig::default();
    let mut eval_log = EvalLog::create(run_dir.path())?;

    let mut obs = env.reset();
    let mut timesteps = 0u64;
    let mut episodes = 0u64;
    let mut updates = 0usize;
    let mut next_eval = config.eval_freq;
    let mut best_mean_reward: Option<f64> = None;
    let mut episode_reward = 0.0f64;

    while timesteps < config.total_timesteps {
        let mut rollout = RolloutBuffer::with_capacity(config.rollout_steps, manager.use_masking());
        let mut finished_rewards = Vec::new();

        for _ in 0..config.rollout_steps {
            let masks = manager.use_masking().then(|| env.action_masks());
            let sampled = manager.act(&obs, masks.as_ref());
            let step = env.step(sampled.action);
            rollout.push(
                encode_observation(&obs),
                masks,
                sampled,
                step.reward,
                step.done,
            );
            timesteps += 1;
            episode_reward += f64::from(step.reward);
            if step.done {
                episodes += 1;
                finished_rewards.push(episode_reward);
                episode_reward = 0.0;
                obs = env.reset();
            } else {
                obs = step.observation;
            }
        }

        let last_value = manager.value(&obs);
        let stats = update_policy(manager, &rollout, last_value, &learner_config);
        updates += 1;

        let rollout_mean = if finished_rewards.is_empty() {
            f64::NAN
        } else {
            finished_rewards.iter().sum::<f64>() / finished_rewards.len() as f64
        };
        log::info!(
            "steps {}/{} | episodes {} | mean episode reward {:.3} | policy loss {:.4} | value loss {:.4}",
            timesteps,
            config.total_timesteps,
            episodes,
            rollout_mean,
            stats.policy_loss,
            stats.value_loss
        );

        if timesteps >= next_eval {
            let eval = evaluate_model(manager, eval_env, config.eval_episodes);
            eval_log.append(timesteps, &eval)?;
            if best_mean_reward.is_none_or(|best| eval.mean_reward > best) {
                best_mean_reward = Some(eval.mean_reward);
                manager.save(run_dir.path().join(BEST_MODEL_FILE))?;
                log::info!("new best mean reward {:.3}", eval.mean_reward);
            }
            next_eval += config.eval_freq;
        }
    }

    Ok(TrainingReport {
        timesteps,
        episodes,
        updates,
        best_mean_reward,
    })
}
