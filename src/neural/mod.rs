pub mod actor_critic;
pub mod encoding;
pub mod manager;
pub mod model_io;
pub mod training;

// Re-export key components for convenience
pub use actor_critic::ActorCritic;
pub use manager::{ModelConfig, ModelManager, SampledAction};
