pub mod activity;
pub mod staleness;
pub mod movies;
pub mod hierarchy;
pub mod report;
pub mod scanner;
pub mod job;

#[cfg(test)]
mod test_support;

pub use activity::most_recent_activity;
pub use staleness::{cutoff, is_stale};
pub use movies::stale_movies;
pub use hierarchy::{distinct_series_names, season_is_stale, stale_episodes_for_series, SeriesScan};
pub use report::{assemble, StaleReport};
pub use scanner::{NoopProgress, ProgressSink, ScanOutcome, StaleMediaScanner, DEFAULT_MAX_CONCURRENT_SERIES};
pub use job::{Job, JobContext, StaleMediaJob, TriggerSpec};
