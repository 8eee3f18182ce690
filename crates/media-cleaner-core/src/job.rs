use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use media_cleaner_models::StalenessConfig;
use media_cleaner_sources::CatalogProvider;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;
use crate::scanner::{NoopProgress, ProgressSink, ScanOutcome, StaleMediaScanner, DEFAULT_MAX_CONCURRENT_SERIES};

/// When a job would like to be run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerSpec {
    Interval(Duration),
    /// Six-field cron expression (seconds first)
    Cron(String),
}

impl TriggerSpec {
    pub fn every_hours(hours: u64) -> Self {
        TriggerSpec::Interval(Duration::from_secs(hours.max(1) * 3600))
    }
}

pub struct JobContext {
    pub cancel: CancellationToken,
    pub progress: Arc<dyn ProgressSink>,
    /// Evaluation time; `Utc::now()` at run start when unset
    pub now: Option<DateTime<Utc>>,
}

impl JobContext {
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            progress: Arc::new(NoopProgress),
            now: None,
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }
}

#[async_trait]
pub trait Job: Send + Sync {
    fn name(&self) -> &str;
    fn key(&self) -> &str;
    fn description(&self) -> &str;
    fn category(&self) -> &str;
    fn default_triggers(&self) -> Vec<TriggerSpec>;
    async fn run(&self, ctx: JobContext) -> Result<ScanOutcome>;
}

/// Opens a fresh catalog per run and reports what has gone stale
pub struct StaleMediaJob {
    provider: Arc<dyn CatalogProvider>,
    staleness: StalenessConfig,
    max_concurrent_series: usize,
}

impl StaleMediaJob {
    pub fn new(provider: Arc<dyn CatalogProvider>, staleness: StalenessConfig) -> Self {
        Self {
            provider,
            staleness,
            max_concurrent_series: DEFAULT_MAX_CONCURRENT_SERIES,
        }
    }

    pub fn with_max_concurrent_series(mut self, limit: usize) -> Self {
        self.max_concurrent_series = limit.max(1);
        self
    }
}

#[async_trait]
impl Job for StaleMediaJob {
    fn name(&self) -> &str {
        "Scan Stale Media"
    }

    fn key(&self) -> &str {
        "Stale Media"
    }

    fn description(&self) -> &str {
        "Scan Stale Media"
    }

    fn category(&self) -> &str {
        "Media"
    }

    fn default_triggers(&self) -> Vec<TriggerSpec> {
        vec![TriggerSpec::every_hours(24)]
    }

    async fn run(&self, ctx: JobContext) -> Result<ScanOutcome> {
        let now = ctx.now.unwrap_or_else(Utc::now);
        info!(
            operation = "job_start",
            job = self.key(),
            provider = self.provider.provider_name(),
            "Running job '{}'",
            self.name()
        );

        let catalog = self
            .provider
            .open()
            .await
            .with_context(|| format!("failed to open {} catalog", self.provider.provider_name()))?;

        let scanner = StaleMediaScanner::new(catalog, self.staleness)
            .with_max_concurrent_series(self.max_concurrent_series);
        let outcome = scanner.scan(now, &ctx.cancel, ctx.progress.as_ref()).await?;

        if let ScanOutcome::Completed(report) = &outcome {
            report.log_summary();
        }
        Ok(outcome)
    }
}
