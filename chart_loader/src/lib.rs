use std::{fs, path::Path};

use anyhow::Context;
use chart_model::Score;

pub fn load_score_json_from_path(path: impl AsRef<Path>) -> anyhow::Result<Score> {
    let path = path.as_ref();
    let bytes =
        fs::read(path).with_context(|| format!("failed to read score: {}", path.display()))?;
    let score: Score = serde_json::from_slice(&bytes)
        .with_context(|| format!("failed to parse score json: {}", path.display()))?;
    Ok(score)
}

pub fn load_score_json_from_str(json: &str) -> anyhow::Result<Score> {
    let score: Score = serde_json::from_str(json).context("failed to parse score json")?;
    Ok(score)
}

/// Writes `score` as pretty JSON, creating parent directories as needed.
pub fn save_score_json(path: impl AsRef<Path>, score: &Score) -> anyhow::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(score).context("failed to serialize score")?;
    fs::write(path, json).with_context(|| format!("failed to write score: {}", path.display()))?;
    Ok(())
}
