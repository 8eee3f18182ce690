use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use futures::FutureExt;
use media_cleaner_models::{ItemKind, ItemQuery, MediaItem, StalenessConfig};
use media_cleaner_sources::CatalogSource;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use crate::hierarchy::{distinct_series_names, stale_episodes_for_series, SeriesScan};
use crate::movies::stale_movies;
use crate::report::{assemble, StaleReport};

pub const DEFAULT_MAX_CONCURRENT_SERIES: usize = 4;

/// Receives scan progress as a percentage in 0..=100
pub trait ProgressSink: Send + Sync {
    fn report(&self, percent: f64);
}

impl<F> ProgressSink for F
where
    F: Fn(f64) + Send + Sync,
{
    fn report(&self, percent: f64) {
        self(percent)
    }
}

/// Discards progress updates
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn report(&self, _percent: f64) {}
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    Completed(StaleReport),
    Cancelled,
}

impl ScanOutcome {
    pub fn report(&self) -> Option<&StaleReport> {
        match self {
            ScanOutcome::Completed(report) => Some(report),
            ScanOutcome::Cancelled => None,
        }
    }
}

/// Runs one full staleness pass over a catalog
pub struct StaleMediaScanner {
    catalog: Arc<dyn CatalogSource>,
    config: StalenessConfig,
    max_concurrent_series: usize,
}

impl StaleMediaScanner {
    pub fn new(catalog: Arc<dyn CatalogSource>, config: StalenessConfig) -> Self {
        Self {
            catalog,
            config,
            max_concurrent_series: DEFAULT_MAX_CONCURRENT_SERIES,
        }
    }

    /// Clamped to at least one series at a time
    pub fn with_max_concurrent_series(mut self, limit: usize) -> Self {
        self.max_concurrent_series = limit.max(1);
        self
    }

    pub fn config(&self) -> &StalenessConfig {
        &self.config
    }

    pub async fn scan(
        &self,
        now: DateTime<Utc>,
        cancel: &CancellationToken,
        progress: &dyn ProgressSink,
    ) -> Result<ScanOutcome> {
        let start = Instant::now();
        if cancel.is_cancelled() {
            return Ok(ScanOutcome::Cancelled);
        }

        info!(
            operation = "scan_start",
            catalog = self.catalog.source_name(),
            cutoff_days = self.config.cutoff_days,
            max_concurrent_series = self.max_concurrent_series,
            "Starting stale media scan"
        );
        progress.report(0.0);

        let roots = self
            .catalog
            .query_items(&ItemQuery::new().recursive(true).with_kinds(&[ItemKind::Movie, ItemKind::Series]))
            .await
            .context("failed to list movies and series")?;
        let (movies, series): (Vec<MediaItem>, Vec<MediaItem>) =
            roots.into_iter().partition(|item| item.kind == ItemKind::Movie);
        debug!("scan: {} movies, {} series", movies.len(), series.len());

        let stale_movie_items = stale_movies(&movies, now, &self.config);

        let catalog = self.catalog.as_ref();
        let config = &self.config;
        let total_series = series.len();
        // boxed up front so the scan future stays Send
        let walks: Vec<_> = series
            .iter()
            .map(|show| stale_episodes_for_series(show, catalog, now, config, cancel).boxed())
            .collect();
        let mut pending = stream::iter(walks).buffer_unordered(self.max_concurrent_series);

        let mut stale_episodes = Vec::new();
        let mut finished = 0usize;
        while let Some(result) = pending.next().await {
            match result? {
                SeriesScan::Completed(episodes) => stale_episodes.extend(episodes),
                SeriesScan::Cancelled => {
                    warn!(
                        operation = "scan_cancelled",
                        series_finished = finished,
                        series_total = total_series,
                        "Stale media scan cancelled"
                    );
                    return Ok(ScanOutcome::Cancelled);
                }
            }
            finished += 1;
            // the final 5% covers the series-name walk
            progress.report(finished as f64 / total_series as f64 * 95.0);
        }
        drop(pending);

        if cancel.is_cancelled() {
            return Ok(ScanOutcome::Cancelled);
        }

        let series_names = distinct_series_names(&stale_episodes, catalog).await?;
        let report = assemble(stale_movie_items, stale_episodes, series_names, now, config);
        progress.report(100.0);

        info!(
            operation = "scan_complete",
            duration_ms = start.elapsed().as_millis(),
            stale_movies = report.stale_movies.len(),
            stale_episodes = report.stale_episodes.len(),
            stale_series = report.stale_series_names.len(),
            "Stale media scan completed"
        );
        Ok(ScanOutcome::Completed(report))
    }
}
