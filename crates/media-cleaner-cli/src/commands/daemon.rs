use super::config::load_config_or_default;
use super::scan::{build_job, catalog_provider, save_report};
use crate::logging;
use crate::output::Output;
use color_eyre::Result;
use media_cleaner_config::{container_base_path, CredentialStore, PathManager, SchedulerConfig};
use media_cleaner_core::{Job, JobContext, ScanOutcome, StaleMediaJob, TriggerSpec};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio_cron_scheduler::JobScheduler;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

pub struct DaemonOptions {
    pub interval_hours: Option<u64>,
    pub schedule: Option<String>,
    pub no_startup_scan: bool,
    pub foreground: bool,
    pub verbose: u8,
    pub quiet: bool,
}

/// Command-line flags win over config.toml; a cron expression wins over an interval
pub fn resolve_trigger(
    schedule_override: Option<String>,
    interval_override: Option<u64>,
    config: &SchedulerConfig,
) -> TriggerSpec {
    if let Some(schedule) = schedule_override {
        return TriggerSpec::Cron(schedule);
    }
    if let Some(hours) = interval_override {
        return TriggerSpec::every_hours(hours);
    }
    match &config.schedule {
        Some(schedule) if !schedule.trim().is_empty() => TriggerSpec::Cron(schedule.clone()),
        _ => TriggerSpec::every_hours(config.interval_hours),
    }
}

/// Runs the job at most once at a time and records each finished scan
struct ScanRunner {
    job: StaleMediaJob,
    shutdown: CancellationToken,
    running: AtomicBool,
    path_manager: PathManager,
    save_reports: bool,
}

impl ScanRunner {
    async fn run_once(&self, trigger: &str) {
        if self.shutdown.is_cancelled() {
            return;
        }
        if self.running.swap(true, Ordering::SeqCst) {
            warn!(
                operation = "scheduled_scan_skipped",
                trigger = trigger,
                "Previous scan is still running, skipping this trigger"
            );
            return;
        }

        let start = Instant::now();
        info!(operation = "scheduled_scan_start", trigger = trigger, "Starting {}", self.job.name());

        match self.job.run(JobContext::new(self.shutdown.child_token())).await {
            Ok(ScanOutcome::Completed(report)) => {
                if let Err(e) = self.record_completion(report.generated_at) {
                    warn!(operation = "scan_state_error", error = %e, "Could not record scan time");
                }
                if self.save_reports {
                    match save_report(&report, &self.path_manager) {
                        Ok(path) => info!(operation = "report_saved", path = %path.display(), "Saved scan report"),
                        Err(e) => error!(operation = "report_save_error", error = %e, "Failed to save scan report"),
                    }
                }
                info!(
                    operation = "scheduled_scan_complete",
                    duration_ms = start.elapsed().as_millis(),
                    stale_movies = report.stale_movies.len(),
                    stale_episodes = report.stale_episodes.len(),
                    "Scheduled scan completed successfully"
                );
            }
            Ok(ScanOutcome::Cancelled) => {
                info!(operation = "scheduled_scan_cancelled", "Scheduled scan cancelled");
            }
            Err(e) => {
                let message = format!("{:#}", e);
                error!(
                    operation = "scheduled_scan_error",
                    error = %message,
                    "Scheduled scan failed"
                );
            }
        }

        self.running.store(false, Ordering::SeqCst);
    }

    fn record_completion(&self, at: chrono::DateTime<chrono::Utc>) -> anyhow::Result<()> {
        let mut cred_store = CredentialStore::new(self.path_manager.credentials_file());
        cred_store.load()?;
        cred_store.set_last_scan_completed(at);
        cred_store.save()
    }
}

struct Scheduler {
    scheduler: JobScheduler,
    runner: Arc<ScanRunner>,
    trigger: TriggerSpec,
    run_on_startup: bool,
}

impl Scheduler {
    async fn new(runner: ScanRunner, trigger: TriggerSpec, run_on_startup: bool) -> Result<Self> {
        let sched = JobScheduler::new().await?;

        Ok(Self {
            scheduler: sched,
            runner: Arc::new(runner),
            trigger,
            run_on_startup,
        })
    }

    fn build_job(&self) -> Result<tokio_cron_scheduler::Job> {
        let runner = self.runner.clone();
        let job = match &self.trigger {
            TriggerSpec::Interval(every) => {
                tokio_cron_scheduler::Job::new_repeated_async(*every, move |_uuid, _lock| {
                    let runner = runner.clone();
                    Box::pin(async move { runner.run_once("interval").await })
                })
            }
            TriggerSpec::Cron(schedule) => {
                tokio_cron_scheduler::Job::new_async(schedule.as_str(), move |_uuid, _lock| {
                    let runner = runner.clone();
                    Box::pin(async move { runner.run_once("cron").await })
                })
            }
        };
        job.map_err(|e| color_eyre::eyre::eyre!("Invalid schedule {:?}: {}", self.trigger, e))
    }

    async fn start(&mut self) -> Result<()> {
        if self.run_on_startup {
            info!(operation = "scheduler_startup", "Running initial scan on startup");
            self.runner.run_once("startup").await;
        }

        let job = self.build_job()?;
        self.scheduler.add(job).await?;
        self.scheduler.start().await?;

        info!(
            operation = "scheduler_started",
            trigger = ?self.trigger,
            "Scheduler started successfully"
        );

        tokio::signal::ctrl_c()
            .await
            .map_err(|e| color_eyre::eyre::eyre!("Failed to listen for shutdown signal: {}", e))?;

        info!(operation = "scheduler_shutdown", "Shutdown requested, cancelling in-flight scan");
        self.runner.shutdown.cancel();
        self.scheduler.shutdown().await?;
        Ok(())
    }
}

#[cfg(unix)]
fn daemonize() -> Result<()> {
    use nix::unistd::{fork, setsid, ForkResult};
    use std::fs::File;
    use std::os::unix::io::AsRawFd;

    match unsafe { fork()? } {
        ForkResult::Parent { child: _ } => std::process::exit(0),
        ForkResult::Child => {}
    }

    setsid()?;

    // Second fork so the daemon can never reacquire a controlling terminal
    match unsafe { fork()? } {
        ForkResult::Parent { child: _ } => std::process::exit(0),
        ForkResult::Child => {}
    }

    std::env::set_current_dir("/")?;

    let dev_null = File::open("/dev/null")?;
    let null_fd = dev_null.as_raw_fd();
    unsafe {
        libc::dup2(null_fd, libc::STDIN_FILENO);
        libc::dup2(null_fd, libc::STDOUT_FILENO);
        libc::dup2(null_fd, libc::STDERR_FILENO);
    }

    Ok(())
}

#[cfg(not(unix))]
fn daemonize() -> Result<()> {
    Err(color_eyre::eyre::eyre!("Daemonization is only supported on Unix-like systems"))
}

fn is_container() -> bool {
    std::path::Path::new("/.dockerenv").exists()
        || container_base_path().exists()
        || std::fs::read_to_string("/proc/self/cgroup")
            .ok()
            .map(|s| s.contains("docker") || s.contains("containerd") || s.contains("podman"))
            .unwrap_or(false)
}

/// Worker threads do not survive `fork`, so this is only called once the
/// process is in its final form
fn build_runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().map_err(|e| color_eyre::eyre::eyre!("Failed to start async runtime: {}", e))
}

pub fn run_start(options: DaemonOptions, output: &Output) -> Result<()> {
    let path_manager = PathManager::default();

    let config = if path_manager.config_file().exists() {
        load_config_or_default()?
    } else {
        output.info("Configuration file not found. Running interactive configuration setup...");
        output.println("");
        // Dropped again before any fork happens
        build_runtime()?.block_on(super::config::run_interactive_config(output))?;
        output.println("");
        output.info("Configuration setup complete!");
        load_config_or_default()?
    };

    // Fail before forking so configuration errors reach the terminal
    let provider = catalog_provider(&config, None)?;
    let job = build_job(&config, provider, None, None)?;

    let in_container = is_container();
    let should_daemonize = !options.foreground && !in_container;
    let log_file = if should_daemonize {
        output.info("Starting daemon in background mode...");
        output.info(format!("Logs are written to: {}", path_manager.daemon_log_file().display()));
        daemonize()?;
        Some(path_manager.daemon_log_file())
    } else {
        if in_container && !options.foreground {
            output.info("Running in foreground mode (container detected - daemonization disabled)");
        }
        None
    };

    logging::init_logging_with_file(options.verbose, options.quiet, log_file, config.logging.as_ref())
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let scheduler_config = config.scheduler_or_default();
    let trigger = resolve_trigger(options.schedule, options.interval_hours, &scheduler_config);
    let run_on_startup = scheduler_config.run_on_startup && !options.no_startup_scan;

    let runner = ScanRunner {
        job,
        shutdown: CancellationToken::new(),
        running: AtomicBool::new(false),
        path_manager,
        save_reports: config.scan.save_reports,
    };

    build_runtime()?.block_on(async move {
        let mut scheduler = Scheduler::new(runner, trigger, run_on_startup)
            .await
            .map_err(|e| color_eyre::eyre::eyre!("Failed to create scheduler: {}", e))?;
        scheduler
            .start()
            .await
            .map_err(|e| color_eyre::eyre::eyre!("Scheduler stopped with an error: {}", e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use media_cleaner_config::default_scheduler_config;
    use media_cleaner_models::{ItemKind, MediaItem, StalenessConfig, UserActivityRecord};
    use media_cleaner_sources::{FixedCatalog, InMemoryCatalog};
    use std::time::Duration;

    #[test]
    fn test_trigger_precedence() {
        let mut config = default_scheduler_config();
        assert_eq!(
            resolve_trigger(None, None, &config),
            TriggerSpec::Interval(Duration::from_secs(24 * 3600))
        );
        assert_eq!(
            resolve_trigger(None, Some(6), &config),
            TriggerSpec::Interval(Duration::from_secs(6 * 3600))
        );

        config.schedule = Some("0 0 3 * * *".to_string());
        assert_eq!(
            resolve_trigger(None, Some(6), &config),
            TriggerSpec::Interval(Duration::from_secs(6 * 3600))
        );
        assert_eq!(resolve_trigger(None, None, &config), TriggerSpec::Cron("0 0 3 * * *".to_string()));
        assert_eq!(
            resolve_trigger(Some("0 30 * * * *".to_string()), Some(6), &config),
            TriggerSpec::Cron("0 30 * * * *".to_string())
        );
    }

    fn runner(base: &std::path::Path) -> ScanRunner {
        let watched = chrono::Utc::now() - chrono::Duration::days(400);
        let catalog = InMemoryCatalog::from_items(vec![
            MediaItem::new("m1", ItemKind::Movie, "Heat").with_activity(UserActivityRecord::played("alice", watched)),
        ])
        .unwrap();
        ScanRunner {
            job: StaleMediaJob::new(Arc::new(FixedCatalog::new(Arc::new(catalog))), StalenessConfig::default()),
            shutdown: CancellationToken::new(),
            running: AtomicBool::new(false),
            path_manager: PathManager::with_base(base.to_path_buf()),
            save_reports: true,
        }
    }

    #[tokio::test]
    async fn test_run_once_records_and_saves() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner(dir.path());

        runner.run_once("test").await;

        let mut cred_store = CredentialStore::new(runner.path_manager.credentials_file());
        cred_store.load().unwrap();
        assert!(cred_store.get_last_scan_completed().is_some());

        let saved = std::fs::read_dir(runner.path_manager.reports_dir()).unwrap().count();
        assert_eq!(saved, 1);
        assert!(!runner.running.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_run_once_skips_while_running() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner(dir.path());
        runner.running.store(true, Ordering::SeqCst);

        runner.run_once("test").await;

        assert!(!runner.path_manager.reports_dir().exists());
    }

    #[tokio::test]
    async fn test_run_once_after_shutdown_does_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner(dir.path());
        runner.shutdown.cancel();

        runner.run_once("test").await;

        assert!(!runner.path_manager.credentials_file().exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_runtime_built_after_fork_runs_spawned_tasks() {
        use nix::unistd::{fork, ForkResult};

        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("ran");

        match unsafe { fork() }.unwrap() {
            ForkResult::Child => {
                let code = match build_runtime() {
                    Ok(runtime) => {
                        let marker = marker.clone();
                        runtime.block_on(async move {
                            let task = tokio::spawn(async move { std::fs::write(&marker, b"ok").is_ok() });
                            match tokio::time::timeout(Duration::from_secs(5), task).await {
                                Ok(Ok(true)) => 0,
                                _ => 1,
                            }
                        })
                    }
                    Err(_) => 2,
                };
                unsafe { libc::_exit(code) };
            }
            ForkResult::Parent { child } => {
                let mut status = 0;
                let waited = unsafe { libc::waitpid(child.as_raw(), &mut status, 0) };
                assert_eq!(waited, child.as_raw());
                assert!(libc::WIFEXITED(status));
                assert_eq!(libc::WEXITSTATUS(status), 0);
                assert!(marker.exists());
            }
        }
    }
}
