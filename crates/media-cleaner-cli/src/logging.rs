use anyhow::Result;
use media_cleaner_config::LoggingConfig;
use std::io;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing_subscriber::{
    layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry,
};
use tracing_subscriber::fmt::{self, time::ChronoUtc};
use tracing_appender::rolling::{RollingFileAppender, Rotation};

pub fn init_logging(verbose_level: u8, quiet: bool) -> Result<()> {
    init_logging_with_file(verbose_level, quiet, None, None)
}

/// Level from -v/-q first, then RUST_LOG, then the `[logging]` section
fn build_filter(verbose_level: u8, quiet: bool, settings: Option<&LoggingConfig>) -> EnvFilter {
    if quiet {
        return EnvFilter::new("error");
    }

    let configured = settings.map(|s| s.level.as_str()).unwrap_or("info");
    let fallback = match verbose_level {
        0 => configured,
        // -v: debug, but keep hyper's connection chatter out
        1 => "debug,hyper::proto::h1=warn,hyper::client::pool=warn",
        _ => "trace",
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

fn use_json(settings: Option<&LoggingConfig>) -> bool {
    if let Ok(value) = std::env::var("RUST_LOG_JSON") {
        return value == "true";
    }
    settings
        .and_then(|s| s.json)
        .unwrap_or_else(|| !io::stdout().is_terminal())
}

/// Split `logs/mediacleaner.log` into the directory and the rotation prefix `mediacleaner`
fn rolling_target(log_path: &Path) -> Result<(PathBuf, String)> {
    let log_dir = log_path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("Log file path has no parent directory"))?;
    let log_filename = log_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid log filename"))?;
    let log_prefix = log_filename.rsplitn(2, '.').nth(1).unwrap_or(log_filename);
    Ok((log_dir.to_path_buf(), log_prefix.to_string()))
}

pub fn init_logging_with_file(
    verbose_level: u8,
    quiet: bool,
    log_file: Option<PathBuf>,
    settings: Option<&LoggingConfig>,
) -> Result<()> {
    let filter = build_filter(verbose_level, quiet, settings);
    let json = use_json(settings);
    let registry = Registry::default().with(filter);

    let log_file = log_file.or_else(|| settings.and_then(|s| s.file.clone()));

    if let Some(log_path) = log_file {
        let (log_dir, log_prefix) = rolling_target(&log_path)?;
        std::fs::create_dir_all(&log_dir)?;

        // mediacleaner.2026-01-17, mediacleaner.2026-01-18, ...
        let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, log_prefix);

        if json {
            let json_layer = fmt::layer()
                .json()
                .with_timer(ChronoUtc::rfc_3339())
                .with_writer(file_appender);

            registry.with(json_layer).try_init()?;
        } else {
            let fmt_layer = fmt::layer()
                .with_timer(ChronoUtc::rfc_3339())
                .with_ansi(false)
                .with_writer(file_appender);

            registry.with(fmt_layer).try_init()?;
        }
    } else if json {
        let json_layer = fmt::layer()
            .json()
            .with_timer(ChronoUtc::rfc_3339())
            .with_writer(io::stderr);

        registry.with(json_layer).try_init()?;
    } else {
        let fmt_layer = fmt::layer()
            .with_timer(ChronoUtc::rfc_3339())
            .with_writer(io::stderr);

        registry.with(fmt_layer).try_init()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rolling_target_strips_extension() {
        let (dir, prefix) = rolling_target(Path::new("/app/logs/mediacleaner.log")).unwrap();
        assert_eq!(dir, PathBuf::from("/app/logs"));
        assert_eq!(prefix, "mediacleaner");

        let (_, prefix) = rolling_target(Path::new("/var/log/scanner")).unwrap();
        assert_eq!(prefix, "scanner");
    }
}
