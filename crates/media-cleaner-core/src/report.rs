use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use media_cleaner_models::{ItemId, MediaItem, StalenessConfig};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use tracing::info;

/// Outcome of one scan: everything that went cold, ready to hand to a sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaleReport {
    pub generated_at: DateTime<Utc>,
    pub cutoff_days: u32,
    pub stale_movies: Vec<MediaItem>,
    pub stale_episodes: Vec<MediaItem>,
    pub stale_series_names: BTreeSet<String>,
}

impl StaleReport {
    pub fn is_empty(&self) -> bool {
        self.stale_movies.is_empty() && self.stale_episodes.is_empty()
    }

    pub fn log_summary(&self) {
        info!(
            operation = "scan_report",
            cutoff_days = self.cutoff_days,
            stale_movies = self.stale_movies.len(),
            stale_episodes = self.stale_episodes.len(),
            stale_series = self.stale_series_names.len(),
            "Stale media scan finished"
        );
        for movie in &self.stale_movies {
            info!("Stale movie: {} ({})", movie.name, movie.id);
        }
        for name in &self.stale_series_names {
            info!("Stale series: {}", name);
        }
    }

    /// Write the report as pretty JSON, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        std::fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
    }
}

fn dedup_sorted(items: Vec<MediaItem>) -> Vec<MediaItem> {
    let mut seen: HashSet<ItemId> = HashSet::new();
    let mut unique: Vec<MediaItem> = items.into_iter().filter(|item| seen.insert(item.id.clone())).collect();
    unique.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
    unique
}

/// Merge evaluator results into a report
///
/// Items are deduplicated by id and ordered by (name, id), so the same
/// catalog and `now` always give the same report.
pub fn assemble(
    stale_movies: Vec<MediaItem>,
    stale_episodes: Vec<MediaItem>,
    series_names: BTreeSet<String>,
    now: DateTime<Utc>,
    config: &StalenessConfig,
) -> StaleReport {
    StaleReport {
        generated_at: now,
        cutoff_days: config.cutoff_days,
        stale_movies: dedup_sorted(stale_movies),
        stale_episodes: dedup_sorted(stale_episodes),
        stale_series_names: series_names,
    }
}
