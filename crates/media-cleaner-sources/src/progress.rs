use std::collections::HashMap;
use tracing::{info, warn};

/// Progress tracker for catalog loads that page through many items
/// Logs periodic progress and a final summary instead of one line per item
pub struct ProgressTracker {
    total: usize,
    loaded: usize,
    touched: usize,
    skipped: usize,
    start_time: std::time::Instant,
    progress_interval: usize, // Log every N items
    last_progress_log: usize,
    skip_reasons: HashMap<String, usize>,
}

impl ProgressTracker {
    /// # Arguments
    /// * `total` - Expected number of items (0 when unknown up front)
    /// * `progress_interval` - Log progress every N items
    pub fn new(total: usize, progress_interval: usize) -> Self {
        Self {
            total,
            loaded: 0,
            touched: 0,
            skipped: 0,
            start_time: std::time::Instant::now(),
            progress_interval: progress_interval.max(1),
            last_progress_log: 0,
            skip_reasons: HashMap::new(),
        }
    }

    /// Total can grow once the first page reports the record count
    pub fn set_total(&mut self, total: usize) {
        self.total = total;
    }

    pub fn record_loaded(&mut self) {
        self.loaded += 1;
    }

    /// Record a user activity record attached to an item
    pub fn record_touched(&mut self) {
        self.touched += 1;
    }

    pub fn record_skipped(&mut self, reason: &str) {
        self.skipped += 1;
        *self.skip_reasons.entry(reason.to_string()).or_insert(0) += 1;
    }

    pub fn processed(&self) -> usize {
        self.loaded + self.skipped
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Log progress if interval has been reached
    pub fn log_progress(&mut self) {
        let current = self.processed();
        if current - self.last_progress_log >= self.progress_interval || (self.total > 0 && current == self.total) {
            let elapsed = self.start_time.elapsed();
            let rate = if elapsed.as_secs_f64() > 0.0 {
                current as f64 / elapsed.as_secs_f64()
            } else {
                0.0
            };

            info!(
                "Progress: {}/{} ({:.1} items/sec) | Loaded: {} | Activity records: {} | Skipped: {}",
                current, self.total, rate, self.loaded, self.touched, self.skipped
            );
            self.last_progress_log = current;
        }
    }

    /// Log final summary of the operation
    pub fn log_summary(&self, operation_name: &str) {
        let elapsed = self.start_time.elapsed();
        if self.skipped > 0 {
            warn!(
                "{} completed in {:.1}s | Loaded: {} | Activity records: {} | Skipped: {}",
                operation_name, elapsed.as_secs_f64(), self.loaded, self.touched, self.skipped
            );

            let mut reasons: Vec<_> = self.skip_reasons.iter().collect();
            reasons.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
            let summary: Vec<String> = reasons
                .iter()
                .map(|(reason, count)| format!("{}: {}", reason, count))
                .collect();
            info!("Skip breakdown: {}", summary.join(", "));
        } else {
            info!(
                "{} completed in {:.1}s | Loaded: {} | Activity records: {}",
                operation_name, elapsed.as_secs_f64(), self.loaded, self.touched
            );
        }
    }
}
