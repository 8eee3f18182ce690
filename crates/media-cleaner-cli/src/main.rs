use clap::{ArgAction, Parser, Subcommand};
use commands::{config, daemon, scan, snapshot};
use std::path::PathBuf;

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "mediacleaner")]
#[command(about = "MediaCleaner - Find movies and shows nobody has watched in a long time")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan the library once and print the stale media report
    #[command(long_about = "Load the Jellyfin library (or a saved snapshot) and report movies and whole seasons whose most recent playback is older than the cutoff. Items nobody has ever watched are never reported.")]
    Scan {
        /// Override the configured cutoff in days
        #[arg(long, value_name = "DAYS")]
        cutoff_days: Option<u32>,

        /// Scan a catalog snapshot file instead of the live Jellyfin server
        #[arg(long, value_name = "FILE")]
        snapshot: Option<PathBuf>,

        /// Number of series evaluated at once
        #[arg(long, value_name = "N")]
        concurrency: Option<usize>,
    },
    /// Run as daemon with internal scheduler
    #[command(long_about = "Run MediaCleaner as a background daemon that periodically scans the library. By default it scans every 24 hours and once on startup unless --no-startup-scan is specified.")]
    Daemon {
        /// Hours between scans (ignored when --schedule is given)
        #[arg(long, value_name = "HOURS")]
        interval_hours: Option<u64>,

        /// Cron schedule expression with seconds (e.g., '0 0 3 * * *' for 03:00 daily)
        #[arg(long, value_name = "SCHEDULE")]
        schedule: Option<String>,

        /// Skip initial scan on startup
        #[arg(long, action = ArgAction::SetTrue)]
        no_startup_scan: bool,

        /// Run in foreground (don't daemonize)
        #[arg(long, action = ArgAction::SetTrue)]
        foreground: bool,
    },
    /// Capture the Jellyfin catalog to a JSON snapshot
    #[command(long_about = "Download every movie, series, season and episode together with each user's playback data and store it as a snapshot file. Snapshots can be scanned offline with 'mediacleaner scan --snapshot FILE'.")]
    Snapshot {
        /// Destination file (defaults to the data directory)
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Configure credentials and settings
    #[command(long_about = "Manage configuration and credentials for MediaCleaner. Running without a subcommand starts the interactive configuration wizard.")]
    Config {
        #[command(subcommand)]
        cmd: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration (masks sensitive data)
    Show {
        /// Show full configuration including masked secrets
        #[arg(long, action = ArgAction::SetTrue)]
        full: bool,
    },

    /// Interactive configuration wizard
    Init,

    /// Configure the Jellyfin server
    #[command(long_about = "Configure the Jellyfin server URL and API key. Create an API key in the Jellyfin dashboard under Administration > API Keys. The key is stored in the credentials file, never in config.toml.")]
    Jellyfin {
        /// Server URL, e.g. http://localhost:8096 (if not provided, will prompt)
        #[arg(long)]
        server_url: Option<String>,

        /// API key (if not provided, will prompt)
        #[arg(long)]
        api_key: Option<String>,
    },

    /// Set the staleness cutoff
    Cutoff {
        /// Days without playback before an item counts as stale
        days: u32,
    },
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let output = output::Output::new(cli.output, cli.quiet);

    match cli.command {
        // Forks before any runtime exists and sets up its own file logging
        Commands::Daemon {
            interval_hours,
            schedule,
            no_startup_scan,
            foreground,
        } => daemon::run_start(
            daemon::DaemonOptions {
                interval_hours,
                schedule,
                no_startup_scan,
                foreground,
                verbose: cli.verbose,
                quiet: cli.quiet,
            },
            &output,
        ),
        command => {
            logging::init_logging(cli.verbose, cli.quiet).map_err(|e| color_eyre::eyre::eyre!("{}", e))?;
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(run_command(command, &output))
        }
    }
}

async fn run_command(command: Commands, output: &output::Output) -> color_eyre::Result<()> {
    match command {
        Commands::Scan {
            cutoff_days,
            snapshot,
            concurrency,
        } => scan::run_scan(cutoff_days, snapshot, concurrency, output).await,
        Commands::Snapshot { out } => snapshot::run_snapshot(out, output).await,
        Commands::Config { cmd } => {
            let cmd = cmd.unwrap_or(ConfigCommands::Init);
            config::run_config(cmd, output).await
        }
        Commands::Daemon { .. } => Err(color_eyre::eyre::eyre!("The daemon cannot run inside an existing runtime")),
    }
}
