use indicatif::{ProgressBar, ProgressStyle};
use media_cleaner_core::ProgressSink;
use std::io::IsTerminal;
use std::sync::atomic::{AtomicU64, Ordering};

/// Scan progress as a terminal bar, or as log lines when nobody is watching
pub struct ScanProgress {
    bar: ProgressBar,
    interactive: bool,
    last_logged: AtomicU64,
}

impl ScanProgress {
    pub fn new(label: &str) -> Self {
        let interactive = is_interactive();

        let bar = if interactive {
            let bar = ProgressBar::new(100);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}% {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("█▉▊▋▌▍▎▏  "),
            );
            bar.set_message(label.to_string());
            bar
        } else {
            tracing::info!(
                operation = "ui_init",
                mode = "non_interactive",
                "Running in non-interactive mode - progress bar disabled, using structured logging"
            );
            ProgressBar::hidden()
        };

        Self {
            bar,
            interactive,
            last_logged: AtomicU64::new(0),
        }
    }

    /// Spinner shown while the catalog is being fetched
    pub fn loading(&self, msg: &str) {
        if self.interactive {
            self.bar.set_message(msg.to_string());
            self.bar.enable_steady_tick(std::time::Duration::from_millis(100));
        } else {
            tracing::info!(operation = "progress", message = %msg, "Progress update");
        }
    }

    pub fn finish(&self, msg: &str) {
        if self.interactive {
            self.bar.finish_with_message(msg.to_string());
        }
    }

    pub fn abandon(&self) {
        if self.interactive {
            self.bar.abandon();
        }
    }
}

impl ProgressSink for ScanProgress {
    fn report(&self, percent: f64) {
        let position = percent.clamp(0.0, 100.0) as u64;
        if self.interactive {
            self.bar.set_position(position);
            return;
        }

        // one log line per 10% step
        let step = position / 10;
        if self.last_logged.fetch_max(step, Ordering::Relaxed) < step || position == 0 {
            tracing::info!(operation = "progress", percent = position, "Scan progress update");
        }
    }
}

pub fn is_interactive() -> bool {
    std::io::stdout().is_terminal() && std::io::stderr().is_terminal()
}
