use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, Utc};
use serde::{Deserialize, Serialize};

use crate::{QuartoRlError, Result};

pub const LATEST_LINK: &str = "latest";
pub const METADATA_FILE: &str = "run.json";

/// Settings and results of one training run, stored alongside the
/// weights for later inspection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetadata {
    pub seed: u64,
    pub timesteps: u64,
    pub use_masking: bool,
    pub resumed_from: Option<PathBuf>,
    pub finished_at: String,
}

impl RunMetadata {
    pub fn new(seed: u64, timesteps: u64, use_masking: bool, resumed_from: Option<PathBuf>) -> Self {
        RunMetadata {
            seed,
            timesteps,
            use_masking,
            resumed_from,
            finished_at: Utc::now().to_rfc3339(),
        }
    }
}

/// One training run's output directory: `<base>/<ISO-8601 timestamp>/`.
/// The parent keeps a relative `latest` symlink pointing at the most
/// recent run.
#[derive(Debug, Clone)]
pub struct RunDir {
    base: PathBuf,
    path: PathBuf,
}

impl RunDir {
    pub fn create(base: impl AsRef<Path>) -> Result<Self> {
        let base = base.as_ref().to_path_buf();
        let stamp = Local::now().format("%Y-%m-%dT%H:%M:%S").to_string();
        let path = base.join(stamp);
        fs::create_dir_all(&path)?;
        Ok(RunDir { base, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write_metadata(&self, metadata: &RunMetadata) -> Result<()> {
        let json = serde_json::to_string_pretty(metadata)?;
        fs::write(self.path.join(METADATA_FILE), json)?;
        Ok(())
    }

    /// Repoint `<base>/latest` at this run directory. Any pre-existing
    /// link is removed first; the target is stored relative to the
    /// link's parent.
    pub fn repoint_latest(&self) -> Result<PathBuf> {
        let link = self.base.join(LATEST_LINK);
        if link.symlink_metadata().is_ok() {
            fs::remove_file(&link)?;
        }
        let target = self.path.file_name().ok_or_else(|| {
            QuartoRlError::Checkpoint(format!("run directory {} has no name", self.path.display()))
        })?;
        std::os::unix::fs::symlink(target, &link)?;
        Ok(link)
    }
}
