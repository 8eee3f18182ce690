use super::config::load_config_or_default;
use super::progress::ScanProgress;
use crate::output::Output;
use color_eyre::Result;
use comfy_table::{Cell, Table};
use media_cleaner_config::{Config, CredentialStore, PathManager, JELLYFIN_API_KEY_ENV};
use media_cleaner_core::{most_recent_activity, Job, JobContext, ScanOutcome, StaleMediaJob, StaleReport};
use media_cleaner_sources::{CatalogProvider, JellyfinCatalogLoader, SnapshotFileProvider};
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Live Jellyfin loader built from config.toml plus the stored API key
pub fn jellyfin_loader(config: &Config) -> Result<JellyfinCatalogLoader> {
    let jellyfin = config
        .jellyfin
        .as_ref()
        .filter(|_| config.is_jellyfin_configured())
        .ok_or_else(|| {
            color_eyre::eyre::eyre!(
                "Jellyfin is not configured. Run 'mediacleaner config jellyfin' or pass --snapshot FILE."
            )
        })?;

    let path_manager = PathManager::default();
    let credentials_file = path_manager.credentials_file();
    let mut cred_store = CredentialStore::new(credentials_file.clone());
    cred_store.load()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to load credentials from {}: {}", credentials_file.display(), e))?;

    let api_key = cred_store.resolve_jellyfin_api_key().ok_or_else(|| {
        color_eyre::eyre::eyre!(
            "Jellyfin API key not found. Run 'mediacleaner config jellyfin' or set {}.",
            JELLYFIN_API_KEY_ENV
        )
    })?;

    JellyfinCatalogLoader::from_config(jellyfin, &api_key)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to create Jellyfin client: {}", e))
}

pub fn catalog_provider(config: &Config, snapshot: Option<PathBuf>) -> Result<Arc<dyn CatalogProvider>> {
    match snapshot {
        Some(path) => {
            if !path.exists() {
                return Err(color_eyre::eyre::eyre!("Snapshot file not found: {}", path.display()));
            }
            Ok(Arc::new(SnapshotFileProvider::new(path)))
        }
        None => Ok(Arc::new(jellyfin_loader(config)?)),
    }
}

pub fn build_job(
    config: &Config,
    provider: Arc<dyn CatalogProvider>,
    cutoff_days: Option<u32>,
    concurrency: Option<usize>,
) -> Result<StaleMediaJob> {
    let mut staleness = config.staleness;
    if let Some(days) = cutoff_days {
        staleness.cutoff_days = days;
    }

    let concurrency = concurrency.unwrap_or(config.scan.max_concurrent_series);
    if concurrency == 0 {
        return Err(color_eyre::eyre::eyre!("--concurrency must be at least 1"));
    }

    Ok(StaleMediaJob::new(provider, staleness).with_max_concurrent_series(concurrency))
}

/// Write the report under the reports directory, named by generation time
pub fn save_report(report: &StaleReport, path_manager: &PathManager) -> Result<PathBuf> {
    let path = path_manager.reports_dir().join(format!(
        "stale-report-{}.json",
        report.generated_at.format("%Y%m%dT%H%M%SZ")
    ));
    report.save(&path)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to save report to {}: {}", path.display(), e))?;
    Ok(path)
}

pub async fn run_scan(
    cutoff_days: Option<u32>,
    snapshot: Option<PathBuf>,
    concurrency: Option<usize>,
    output: &Output,
) -> Result<()> {
    tracing::debug!("Scan command started");

    let config = load_config_or_default()?;
    let provider = catalog_provider(&config, snapshot)?;
    let job = build_job(&config, provider, cutoff_days, concurrency)?;

    // Ctrl-C stops the scan between seasons instead of killing the process mid-request
    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_token.cancel();
        }
    });

    let progress = Arc::new(ScanProgress::new("Scanning library..."));
    progress.loading("Loading catalog...");
    let ctx = JobContext::new(cancel).with_progress(progress.clone());

    let outcome = match job.run(ctx).await {
        Ok(outcome) => outcome,
        Err(e) => {
            progress.abandon();
            return Err(color_eyre::eyre::eyre!("Scan failed: {:#}", e));
        }
    };

    match outcome {
        ScanOutcome::Completed(report) => {
            progress.finish("Scan complete");

            if config.scan.save_reports {
                let path = save_report(&report, &PathManager::default())?;
                tracing::info!(operation = "report_saved", path = %path.display(), "Saved scan report");
            }
            print_report(&report, output);
        }
        ScanOutcome::Cancelled => {
            progress.abandon();
            output.warn("Scan cancelled; no report was produced.");
        }
    }

    Ok(())
}

fn print_report(report: &StaleReport, output: &Output) {
    if !output.is_human() {
        output.json(report);
        return;
    }
    if output.is_quiet() {
        return;
    }

    println!();
    println!(
        "{} {}",
        "Stale media".bright_cyan().bold(),
        format!("(no playback in the last {} days)", report.cutoff_days).dimmed()
    );
    println!();

    if report.is_empty() {
        output.success("Nothing has gone stale.");
        return;
    }

    if !report.stale_movies.is_empty() {
        let mut movie_table = Table::new();
        movie_table.set_header(vec![
            Cell::new("Movie").fg(comfy_table::Color::Cyan).add_attribute(comfy_table::Attribute::Bold),
            Cell::new("Last played").add_attribute(comfy_table::Attribute::Bold),
            Cell::new("Id").add_attribute(comfy_table::Attribute::Bold),
        ]);
        for movie in &report.stale_movies {
            let last_played = most_recent_activity(&movie.user_data)
                .map(|at| at.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "-".to_string());
            movie_table.add_row(vec![
                Cell::new(&movie.name),
                Cell::new(last_played),
                Cell::new(movie.id.as_str()),
            ]);
        }
        movie_table.load_preset(comfy_table::presets::UTF8_FULL);
        movie_table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
        println!("{}", movie_table);
        println!();
    }

    if !report.stale_series_names.is_empty() {
        let mut series_table = Table::new();
        series_table.set_header(vec![
            Cell::new("Series with stale seasons").fg(comfy_table::Color::Cyan).add_attribute(comfy_table::Attribute::Bold),
        ]);
        for name in &report.stale_series_names {
            series_table.add_row(vec![Cell::new(name)]);
        }
        series_table.load_preset(comfy_table::presets::UTF8_FULL);
        series_table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
        println!("{}", series_table);
        println!();
    }

    output.println(format!(
        "{} stale movies, {} stale episodes across {} series",
        report.stale_movies.len(),
        report.stale_episodes.len(),
        report.stale_series_names.len()
    ));
}
