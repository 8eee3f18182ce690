use super::prompts;
use crate::output::Output;
use color_eyre::Result;
use comfy_table::{Cell, Table};
use media_cleaner_config::{default_scheduler_config, Config, CredentialStore, JellyfinConfig, PathManager};
use media_cleaner_sources::JellyfinHttpClient;
use owo_colors::OwoColorize;
use serde_json::json;
use std::time::Duration;

pub async fn run_config(cmd: crate::ConfigCommands, output: &Output) -> Result<()> {
    match cmd {
        crate::ConfigCommands::Show { full } => show_config(full, output),
        crate::ConfigCommands::Init => run_interactive_config(output).await,
        crate::ConfigCommands::Jellyfin { server_url, api_key } => configure_jellyfin(server_url, api_key, output).await,
        crate::ConfigCommands::Cutoff { days } => configure_cutoff(days, output),
    }
}

/// Config from disk, or defaults when no file exists yet
pub fn load_config_or_default() -> Result<Config> {
    let path_manager = PathManager::default();
    let config_file = path_manager.config_file();

    let config = if config_file.exists() {
        Config::load_from_file(&config_file)
            .map_err(|e| color_eyre::eyre::eyre!("Failed to load config from {}: {}", config_file.display(), e))?
    } else {
        tracing::debug!("No config file at {}, using defaults", config_file.display());
        Config::default()
    };

    config.validate()
        .map_err(|e| color_eyre::eyre::eyre!("Invalid configuration in {}: {}", config_file.display(), e))?;
    Ok(config)
}

fn load_for_update(path_manager: &PathManager, output: &Output) -> Result<Config> {
    path_manager.ensure_directories()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to create configuration directories: {}", e))?;

    let config_file = path_manager.config_file();
    if config_file.exists() {
        Config::load_from_file(&config_file)
            .map_err(|e| color_eyre::eyre::eyre!("Failed to load config from {}: {}", config_file.display(), e))
    } else {
        output.info("Configuration file not found. Creating default configuration...");
        Ok(Config {
            scheduler: Some(default_scheduler_config()),
            ..Config::default()
        })
    }
}

fn save_config(config: &Config, path_manager: &PathManager) -> Result<()> {
    let config_file = path_manager.config_file();
    config.validate()
        .map_err(|e| color_eyre::eyre::eyre!("Refusing to save invalid configuration: {}", e))?;
    config.save_to_file(&config_file)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to save config to {}: {}", config_file.display(), e))
}

fn styled_table(title: &str, rows: Vec<(&str, String)>) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new(title).fg(comfy_table::Color::Cyan).add_attribute(comfy_table::Attribute::Bold),
        Cell::new(""),
    ]);
    for (key, value) in rows {
        table.add_row(vec![Cell::new(key), Cell::new(value)]);
    }
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    table
}

fn show_config(full: bool, output: &Output) -> Result<()> {
    let path_manager = PathManager::default();
    let config_file = path_manager.config_file();

    if !config_file.exists() {
        output.warn(format!("Configuration file not found at: {}", config_file.display()));
        output.info("Run 'mediacleaner config jellyfin' or 'mediacleaner config init' to create one.");
        return Ok(());
    }

    let config = Config::load_from_file(&config_file)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to load config from {}: {}", config_file.display(), e))?;

    let mut cred_store = CredentialStore::new(path_manager.credentials_file());
    cred_store.load()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to load credentials: {}", e))?;
    let api_key = cred_store.resolve_jellyfin_api_key().unwrap_or_default();
    let api_key_display = if full { api_key } else { mask_string(&api_key) };
    let last_scan = cred_store
        .get_last_scan_completed()
        .map(|at| at.to_rfc3339())
        .unwrap_or_else(|| "never".to_string());
    let scheduler = config.scheduler_or_default();

    match output.format() {
        crate::output::OutputFormat::Human => {
            if output.is_quiet() {
                return Ok(());
            }

            println!("\n{}", "Configuration".bright_cyan().bold());
            println!();

            let mut info_table = Table::new();
            info_table.set_header(vec![
                Cell::new("Config File").add_attribute(comfy_table::Attribute::Bold),
                Cell::new(config_file.display().to_string()),
            ]);
            info_table.add_row(vec![Cell::new("Last scan"), Cell::new(&last_scan)]);
            info_table.load_preset(comfy_table::presets::UTF8_FULL);
            info_table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
            println!("{}\n", info_table);

            println!(
                "{}\n",
                styled_table(
                    "Staleness",
                    vec![
                        ("Cutoff (days)", config.staleness.cutoff_days.to_string()),
                        ("Concurrent series", config.scan.max_concurrent_series.to_string()),
                        ("Save reports", config.scan.save_reports.to_string()),
                    ],
                )
            );

            match &config.jellyfin {
                Some(jellyfin) => println!(
                    "{}\n",
                    styled_table(
                        "Jellyfin Configuration",
                        vec![
                            ("Enabled", jellyfin.enabled.to_string()),
                            ("Server URL", jellyfin.server_url.clone()),
                            ("API Key", api_key_display.clone()),
                            ("Page size", jellyfin.page_size.to_string()),
                            ("Request timeout (s)", jellyfin.request_timeout_secs.to_string()),
                        ],
                    )
                ),
                None => output.warn("Jellyfin is not configured."),
            }

            println!(
                "{}",
                styled_table(
                    "Scheduler Configuration",
                    vec![
                        ("Interval (hours)", scheduler.interval_hours.to_string()),
                        ("Schedule", scheduler.schedule.clone().unwrap_or_else(|| "-".to_string())),
                        ("Run on startup", scheduler.run_on_startup.to_string()),
                    ],
                )
            );
        }
        _ => {
            output.json(&json!({
                "config_file": config_file.display().to_string(),
                "last_scan_completed": last_scan,
                "staleness": { "cutoff_days": config.staleness.cutoff_days },
                "scan": {
                    "max_concurrent_series": config.scan.max_concurrent_series,
                    "save_reports": config.scan.save_reports,
                },
                "jellyfin": config.jellyfin.as_ref().map(|jellyfin| json!({
                    "enabled": jellyfin.enabled,
                    "server_url": jellyfin.server_url,
                    "api_key": api_key_display,
                    "page_size": jellyfin.page_size,
                    "request_timeout_secs": jellyfin.request_timeout_secs,
                })),
                "scheduler": {
                    "interval_hours": scheduler.interval_hours,
                    "schedule": scheduler.schedule,
                    "run_on_startup": scheduler.run_on_startup,
                },
            }));
        }
    }

    Ok(())
}

async fn configure_jellyfin(server_url_arg: Option<String>, api_key_arg: Option<String>, output: &Output) -> Result<()> {
    let path_manager = PathManager::default();
    let mut config = load_for_update(&path_manager, output)?;

    print_section_header("Jellyfin Setup", output);
    output.println("");
    print_instruction_list(&[
        "Open the Jellyfin dashboard and go to Administration > API Keys",
        "Create a new key for MediaCleaner",
        "The key only needs read access; MediaCleaner never changes your library",
    ], output);
    output.println("");

    let existing_url = config.jellyfin.as_ref().map(|j| j.server_url.clone()).filter(|url| !url.is_empty());
    let server_url = match server_url_arg {
        Some(url) => url,
        None => prompts::prompt_string(
            "Jellyfin Server URL",
            Some(existing_url.as_deref().unwrap_or("http://localhost:8096")),
        )?,
    };
    let server_url = server_url.trim().trim_end_matches('/').to_string();
    if server_url.is_empty() {
        return Err(color_eyre::eyre::eyre!("Jellyfin server URL is required"));
    }

    let credentials_file = path_manager.credentials_file();
    let mut cred_store = CredentialStore::new(credentials_file.clone());
    cred_store.load()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to load credentials from {}: {}", credentials_file.display(), e))?;

    let api_key = match api_key_arg {
        Some(key) => key,
        None => loop {
            let input = prompts::prompt_password("Jellyfin API Key")?;
            if input.trim().is_empty() {
                output.error("API key cannot be empty");
                continue;
            }
            break input.trim().to_string();
        },
    };

    let mut jellyfin = config
        .jellyfin
        .take()
        .unwrap_or_else(|| JellyfinConfig::new(server_url.clone()));
    jellyfin.server_url = server_url.clone();
    jellyfin.enabled = true;

    output.println("");
    output.info("Verifying Jellyfin connection...");
    let spinner = indicatif::ProgressBar::new_spinner();
    spinner.set_style(
        indicatif::ProgressStyle::default_spinner()
            .template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| indicatif::ProgressStyle::default_spinner()),
    );
    spinner.set_message("Contacting server...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let verification = match JellyfinHttpClient::new(
        &server_url,
        &api_key,
        Duration::from_secs(jellyfin.request_timeout_secs),
    ) {
        Ok(client) => client.get_users().await.map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    };
    spinner.finish_and_clear();

    match verification {
        Ok(users) => output.success(format!("Connected! Found {} users.", users.len())),
        Err(e) => {
            output.warn(format!("Could not verify the connection: {}", e));
            if !prompts::prompt_yes_no_with_output("Save anyway?", Some(false), Some(output))? {
                return Err(color_eyre::eyre::eyre!("Jellyfin verification failed"));
            }
        }
    }

    config.jellyfin = Some(jellyfin);
    save_config(&config, &path_manager)?;

    cred_store.set_jellyfin_api_key(api_key);
    cred_store.save()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to save credentials to {}: {}", credentials_file.display(), e))?;

    output.println("");
    output.success("Jellyfin configuration saved!");
    output.println(format!("  Server URL: {}", server_url));

    Ok(())
}

fn configure_cutoff(days: u32, output: &Output) -> Result<()> {
    let path_manager = PathManager::default();
    let mut config = load_for_update(&path_manager, output)?;

    let previous = config.staleness.cutoff_days;
    config.staleness.cutoff_days = days;
    save_config(&config, &path_manager)?;

    output.success(format!("Staleness cutoff set to {} days (was {})", days, previous));
    Ok(())
}

/// Run interactive configuration wizard
pub async fn run_interactive_config(output: &Output) -> Result<()> {
    let path_manager = PathManager::default();

    output.println("");
    print_section_header("Interactive Configuration Wizard", output);
    output.println("");
    output.println("This wizard will guide you through connecting Jellyfin and choosing when media counts as stale.");

    print_section_header("Step 1: Connect Jellyfin", output);
    let mut config = load_for_update(&path_manager, output)?;
    if config.is_jellyfin_configured() {
        output.info("Jellyfin is already configured.");
        if prompts::prompt_yes_no("Reconfigure Jellyfin?", Some(false))? {
            configure_jellyfin(None, None, output).await?;
        }
    } else {
        configure_jellyfin(None, None, output).await?;
    }
    config = load_for_update(&path_manager, output)?;
    output.println("");

    print_section_header("Step 2: Staleness", output);
    output.println("");
    output.println("For reference: (30 = 1 month, 90 = 3 months, 180 = 6 months, 365 = 1 year). Any number of days is valid.");
    config.staleness.cutoff_days = prompts::prompt_number_with_output(
        "Days without playback before an item is stale",
        Some(config.staleness.cutoff_days),
        Some(output),
    )?;
    config.scan.save_reports = prompts::prompt_yes_no(
        "Save every scan report as JSON?",
        Some(config.scan.save_reports),
    )?;

    print_section_header("Step 3: Scheduler", output);
    output.println("");
    let mut scheduler = config.scheduler_or_default();
    let hours = prompts::prompt_number_with_output(
        "Hours between daemon scans",
        Some(scheduler.interval_hours.min(u32::MAX as u64) as u32),
        Some(output),
    )?;
    scheduler.interval_hours = u64::from(hours.max(1));
    scheduler.run_on_startup = prompts::prompt_yes_no("Scan when the daemon starts?", Some(scheduler.run_on_startup))?;
    config.scheduler = Some(scheduler);

    save_config(&config, &path_manager)?;

    output.println("");
    print_section_header("Configuration Complete", output);
    output.println("");
    output.info("Your configuration has been saved successfully!");
    output.println("");

    Ok(())
}

fn mask_string(s: &str) -> String {
    if s.is_empty() {
        return "<not set>".to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{}***{}", head, tail)
}

fn print_section_header(title: &str, output: &Output) {
    output.println("");
    output.println(format!("{}", title.bold().bright_cyan()));
    output.println(format!("{}", "─".repeat(title.len()).bright_cyan()));
}

fn print_instruction_list(items: &[&str], output: &Output) {
    for (idx, item) in items.iter().enumerate() {
        output.println(format!("  {}. {}", idx + 1, item));
    }
}
