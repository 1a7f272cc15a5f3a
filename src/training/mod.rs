pub mod evaluator;
pub mod session;

pub use evaluator::{evaluate_model, EvalStats};
pub use session::{train_and_evaluate, SessionConfig, TrainingReport};
