use anyhow::Result;
use colored::Colorize;
use segi9::config::{self, load_raw_config};
use std::path::Path;
use tracing::info;

/// Execute the config show command
///
/// Displays the raw plugin configuration and the effective settings it
/// resolves to
pub fn show(path: &Path) -> Result<()> {
    println!("{}", "Loading configuration...".yellow());
    info!("Loading configuration from {}", path.display());

    let raw = load_raw_config(path)?;
    let effective = config::resolve(Some(&raw), None);

    println!("{}", "Plugin Configuration:".green().bold());
    println!();
    println!("{}", toml::to_string_pretty(&raw)?);

    println!("{}", "Effective Settings:".green().bold());
    println!("  {}: {}s", "Timeout".cyan(), effective.timeout_seconds);
    println!(
        "  {}: {}",
        "TLS verification".cyan(),
        if effective.skip_tls_verify {
            "disabled".red()
        } else {
            "enabled".green()
        }
    );

    Ok(())
}

/// Execute the config validate command
///
/// Fails if the configured timeout is outside 1..=30 seconds
pub fn validate(path: &Path) -> Result<()> {
    println!("{}", "Validating configuration...".yellow());
    info!("Validating configuration file {}", path.display());

    let raw = load_raw_config(path)?;
    config::validate(&raw)?;

    println!("{}", "✓ Configuration is valid".green());
    println!();
    println!("{}", "Summary:".bold());
    println!(
        "  Timeout: {}",
        raw.timeout
            .map(|t| format!("{}s", t))
            .unwrap_or_else(|| "default".to_string())
    );
    println!(
        "  SkipVerify: {}",
        raw.skip_verify
            .map(|v| v.to_string())
            .unwrap_or_else(|| "default".to_string())
    );

    info!("Configuration validation successful");
    Ok(())
}
