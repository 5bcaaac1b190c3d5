//! Settings inspection command
//!
//! Shows where the settings live and what the retention jobs will run with.

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use retention_core::config::{default_config_path, example_config};
use retention_core::RetentionSettings;
use std::path::{Path, PathBuf};

/// `--config` if given, otherwise the per-user default location
pub fn resolve_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path),
        None => default_config_path().context("Could not determine config file path"),
    }
}

/// List all settings
pub fn run_list(path: &Path) -> Result<()> {
    let settings = RetentionSettings::load(path)
        .with_context(|| format!("Failed to load settings from {}", path.display()))?;

    println!("{}", "Retention Settings".bold());
    let location = if path.exists() {
        path.display().to_string()
    } else {
        format!("{} (not created, using defaults)", path.display())
    };
    println!("{}: {}\n", "Location".dimmed(), location.dimmed());

    println!("{}", "[retention]".yellow());
    println!("  {} = {}", "notify_before".cyan(), settings.notify_before);
    println!(
        "  {} = {} {}",
        "interval_hours".cyan(),
        settings.interval_hours,
        format!("({}s)", settings.interval().as_secs()).dimmed()
    );
    println!("  {} = {}", "page_size".cyan(), settings.page_size);

    println!("\n{}", "Valid Ranges:".bold());
    println!("  interval_hours: 1-8760");
    println!("  page_size: 1-100,000");

    Ok(())
}

/// Show the settings file path and optionally create it
pub fn run_path(path: &Path, create: bool) -> Result<()> {
    if create && !path.exists() {
        RetentionSettings::default()
            .save(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        println!("{} Created config file at: {}", "✓".green(), path.display());
    } else if path.exists() {
        println!("{}", path.display());
    } else {
        println!("{}", path.display());
        println!("{}", "File does not exist. Use --create to create it.".yellow());
    }

    Ok(())
}

/// Show example configuration
pub fn run_example() -> Result<()> {
    println!("{}", example_config());
    Ok(())
}
