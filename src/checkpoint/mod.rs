pub mod eval_log;
pub mod run_dir;

pub use eval_log::EvalLog;
pub use run_dir::{RunDir, RunMetadata};
