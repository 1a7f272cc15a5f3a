pub mod learner;
pub mod rollout;

pub use learner::{update_policy, LearnerConfig, UpdateStats};
pub use rollout::RolloutBuffer;
