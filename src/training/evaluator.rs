use crate::env::Environment;
use crate::neural::manager::ModelManager;

#[derive(Debug, Clone, Copy)]
pub struct EvalStats {
    pub episodes: usize,
    pub mean_reward: f64,
    pub std_reward: f64,
    pub win_rate: f64,
}

/// Plays full episodes against the environment's built-in opponent and
/// reports reward statistics. Masks are fetched only when the model was
/// configured for masking, matching rollout behavior.
pub fn evaluate_model<E: Environment>(
    manager: &ModelManager,
    env: &mut E,
    episodes: usize,
) -> EvalStats {
    let mut rewards = Vec::with_capacity(episodes);
    let mut wins = 0usize;

    for _ in 0..episodes {
        let mut obs = env.reset();
        let mut total = 0.0f64;
        loop {
            let masks = manager.use_masking().then(|| env.action_masks());
            let sampled = manager.act(&obs, masks.as_ref());
            let step = env.step(sampled.action);
            total += f64::from(step.reward);
            if step.done {
                break;
            }
            obs = step.observation;
        }
        if total > 0.0 {
            wins += 1;
        }
        rewards.push(total);
    }

    let mean = rewards.iter().sum::<f64>() / rewards.len().max(1) as f64;
    let variance = rewards
        .iter()
        .map(|r| (r - mean).powi(2))
        .sum::<f64>()
        / rewards.len().max(1) as f64;
    let stats = EvalStats {
        episodes,
        mean_reward: mean,
        std_reward: variance.sqrt(),
        win_rate: wins as f64 / episodes.max(1) as f64,
    };
    log::info!(
        "evaluation over {} episodes | mean reward {:.3} (+/- {:.3}), win rate {:.1}%",
        stats.episodes,
        stats.mean_reward,
        stats.std_reward,
        stats.win_rate * 100.0
    );
    stats
}
