//! Config command - configuration management

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::args::{ConfigArgs, ConfigCommands};
use crate::config::AppConfig;

pub async fn execute(args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Init { path, force } => init_config(path, force).await,
    }
}

async fn init_config(path: PathBuf, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            path.display()
        );
    }

    let content = AppConfig::example_toml();

    // Create parent directories if needed
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }

    fs::write(&path, content)
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;

    let config = AppConfig::load(Some(&path)).context("Generated config failed to load")?;

    println!("Created config file: {}", path.display());
    println!(
        "  {} sources, dedup backend: {}, poll interval: {}s",
        config.sources.len(),
        config.dedup.backend.as_str(),
        config.schedule.poll_interval_secs
    );
    println!();
    println!("Next steps:");
    println!("  1. Edit [[sources]] and [telegram] channels in the config file");
    println!("  2. Export TELEGRAM_TOKEN (or the env var named in bot_token_env)");
    println!("  3. Run 'newsrelay doctor' to validate your setup");
    println!("  4. Run 'newsrelay run --dry-run --once' to test");

    Ok(())
}
