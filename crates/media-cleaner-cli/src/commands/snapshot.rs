use super::config::load_config_or_default;
use super::progress::ScanProgress;
use super::scan::jellyfin_loader;
use crate::output::Output;
use color_eyre::Result;
use media_cleaner_config::PathManager;
use serde_json::json;
use std::path::PathBuf;

pub async fn run_snapshot(out: Option<PathBuf>, output: &Output) -> Result<()> {
    let config = load_config_or_default()?;
    let loader = jellyfin_loader(&config)?;

    let path = match out {
        Some(path) => path,
        None => PathManager::default().snapshot_dir().join(format!(
            "catalog-{}.json",
            chrono::Utc::now().format("%Y%m%dT%H%M%SZ")
        )),
    };

    let progress = ScanProgress::new("Capturing catalog...");
    progress.loading("Loading Jellyfin catalog...");
    let snapshot = match loader.load_snapshot().await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            progress.abandon();
            return Err(color_eyre::eyre::eyre!("Failed to load Jellyfin catalog: {}", e));
        }
    };
    progress.finish("Catalog loaded");

    let items = snapshot.items.len();
    let saved_path = path.clone();
    tokio::task::spawn_blocking(move || snapshot.save(&saved_path))
        .await
        .map_err(|e| color_eyre::eyre::eyre!("Snapshot write task failed: {}", e))?
        .map_err(|e| color_eyre::eyre::eyre!("Failed to write snapshot to {}: {}", path.display(), e))?;

    tracing::info!(
        operation = "snapshot_saved",
        path = %path.display(),
        items = items,
        "Saved catalog snapshot"
    );

    if output.is_human() {
        output.success(format!("Saved {} items to {}", items, path.display()));
        output.info(format!("Scan it offline with: mediacleaner scan --snapshot {}", path.display()));
    } else {
        output.json(&json!({
            "type": "snapshot",
            "path": path.display().to_string(),
            "items": items,
        }));
    }

    Ok(())
}
