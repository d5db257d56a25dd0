//! Best score persistence
//!
//! A single JSON file under the local data directory:
//! `~/.local/share/dishstorm/best_score.json` on Linux.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestScore {
    pub score: u64,
    pub achieved_at: DateTime<Utc>,
}

impl BestScore {
    pub fn new(score: u64) -> Self {
        Self {
            score,
            achieved_at: Utc::now(),
        }
    }
}

/// Path of the best score file, creating its directory if needed
pub fn best_score_path() -> Result<PathBuf> {
    let dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("dishstorm");
    fs::create_dir_all(&dir).context("Failed to create data directory")?;
    Ok(dir.join("best_score.json"))
}

/// `None` if no score has been recorded yet
pub fn read_best(path: &Path) -> Result<Option<BestScore>> {
    if !path.exists() {
        return Ok(None);
    }
    let json = fs::read_to_string(path).context("Failed to read best score file")?;
    let best = serde_json::from_str(&json).context("Failed to parse best score file")?;
    Ok(Some(best))
}

pub fn write_best(path: &Path, best: &BestScore) -> Result<()> {
    let json = serde_json::to_string_pretty(best).context("Failed to serialize best score")?;
    fs::write(path, json).context("Failed to write best score file")?;
    Ok(())
}

/// Store `score` if it beats the recorded best. Returns the new record, if any.
pub fn record_if_best(path: &Path, score: u64) -> Result<Option<BestScore>> {
    let previous = read_best(path)?;
    if previous.as_ref().is_some_and(|best| best.score >= score) {
        return Ok(None);
    }
    let best = BestScore::new(score);
    write_best(path, &best)?;
    Ok(Some(best))
}
