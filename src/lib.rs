//! # Quarto RL Library
//!
//! Reinforcement learning for the board game Quarto: a maskable
//! actor-critic agent trained against a random opponent, plus
//! head-to-head tournaments between trained models.
//!
//! ## Features
//!
//! - **Game Engine**: Complete Quarto rules (pieces, board, win/draw detection)
//! - **Environment**: Gym-style two-player environment with legal-action masks
//! - **Training System**: Rollout collection, clipped policy-gradient updates,
//!   periodic evaluation with best-model tracking
//! - **Checkpoints**: Timestamped run directories with a `latest` symlink
//! - **Tournament**: Capped-length match adjudication with win/tie/timeout tally

// ============================================================================
// PUBLIC API MODULES
// ============================================================================

/// Checkpoint directories, run metadata and evaluation logs
pub mod checkpoint;

/// Gym-style environment layer and the one-player opponent wrapper
pub mod env;

/// Core game logic and rules
pub mod game;

/// Neural network components and the policy update
pub mod neural;

/// Action-selection policies: random baseline and trained models
pub mod players;

/// Training session driver and evaluator
pub mod training;

/// Head-to-head match adjudication between trained models
pub mod tournament;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

pub use env::{Environment, OnePlayerWrapper, QuartoEnv};
pub use neural::{ModelConfig, ModelManager};
pub use players::{NeuralPolicy, Policy, RandomPlayer};
pub use tournament::{run_tournament, Agent, Tally};
pub use training::{train_and_evaluate, SessionConfig};

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Main error type for the Quarto RL library
#[derive(Debug, thiserror::Error)]
pub enum QuartoRlError {
    #[error("Game error: {0}")]
    Game(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Training error: {0}")]
    Training(String),

    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, QuartoRlError>;

// ============================================================================
// LIBRARY VERSION INFO
// ============================================================================

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
