use std::fs::File;
use std::path::Path;

use chrono::Utc;

use crate::training::evaluator::EvalStats;
use crate::Result;

pub const EVAL_LOG_FILE: &str = "evaluations.csv";

/// Append-only CSV log of periodic evaluation results inside a run
/// directory.
pub struct EvalLog {
    writer: csv::Writer<File>,
}

impl EvalLog {
    pub fn create(run_dir: &Path) -> Result<Self> {
        let mut writer = csv::Writer::from_path(run_dir.join(EVAL_LOG_FILE))?;
        writer.write_record([
            "timestamp",
            "timesteps",
            "episodes",
            "mean_reward",
            "std_reward",
            "win_rate",
        ])?;
        writer.flush()?;
        Ok(EvalLog { writer })
    }

    pub fn append(&mut self, timesteps: u64, stats: &EvalStats) -> Result<()> {
        self.writer.write_record([
            Utc::now().to_rfc3339(),
            timesteps.to_string(),
            stats.episodes.to_string(),
            format!("{:.4}", stats.mean_reward),
            format!("{:.4}", stats.std_reward),
            format!("{:.4}", stats.win_rate),
        ])?;
        self.writer.flush()?;
        Ok(())
    }
}
