//! Taxonomy command - list, validate and export keyword categories

use anyhow::{Context, Result};
use newsrelay_adapters::taxonomy::to_toml;
use newsrelay_domain::taxonomy::builtin_categories;
use newsrelay_domain::usecases::KeywordClassifier;
use std::fs;
use std::path::{Path, PathBuf};

use crate::args::{TaxonomyArgs, TaxonomyCommands};
use crate::commands::classify::load_taxonomy;
use crate::config::AppConfig;

pub async fn execute(args: TaxonomyArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref()).unwrap_or_default();

    match args.command {
        TaxonomyCommands::List { path, json } => {
            let path = path.or(config.taxonomy.path);
            list_taxonomy(path.as_deref(), json).await
        }
        TaxonomyCommands::Validate { path, json } => {
            let path = path.or(config.taxonomy.path);
            validate_taxonomy(path.as_deref(), json).await
        }
        TaxonomyCommands::Export { path, force } => export_taxonomy(&path, force),
    }
}

async fn list_taxonomy(path: Option<&Path>, json: bool) -> Result<()> {
    let (specs, origin) = load_taxonomy(path).await?;

    if json {
        let output = serde_json::json!({
            "origin": origin,
            "categories": specs.iter().map(|spec| serde_json::json!({
                "id": spec.id,
                "label": spec.label,
                "words": spec.words.len(),
                "substrings": spec.substrings.len(),
                "regexes": spec.regexes.len(),
            })).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Taxonomy: {} ({} categories, in priority order)", origin, specs.len());
        println!();

        for (index, spec) in specs.iter().enumerate() {
            println!("  {}. {}: {}", index + 1, spec.id, spec.label);
            println!(
                "     words: {}, substrings: {}, regexes: {}",
                spec.words.len(),
                spec.substrings.len(),
                spec.regexes.len()
            );
        }
    }

    Ok(())
}

async fn validate_taxonomy(path: Option<&Path>, json: bool) -> Result<()> {
    let (specs, origin) = load_taxonomy(path).await?;
    let result = KeywordClassifier::compile(&specs);

    if json {
        let output = match &result {
            Ok(classifier) => serde_json::json!({
                "status": "ok",
                "origin": origin,
                "categories": specs.len(),
                "patterns": classifier.pattern_count(),
                "fingerprint": classifier.fingerprint(),
            }),
            Err(e) => serde_json::json!({
                "status": "error",
                "origin": origin,
                "error": e.to_string(),
            }),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if let Ok(classifier) = &result {
        println!("✓ Taxonomy is valid: {}", origin);
        println!("  Categories:  {}", specs.len());
        println!("  Patterns:    {}", classifier.pattern_count());
        println!("  Fingerprint: {}", classifier.fingerprint());
    }

    result
        .map(|_| ())
        .with_context(|| format!("Validation failed for {}", origin))
}

fn export_taxonomy(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Taxonomy file already exists: {}. Use --force to overwrite.",
            path.display()
        );
    }

    let content = to_toml(&builtin_categories()).context("Failed to render taxonomy")?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }

    fs::write(path, content)
        .with_context(|| format!("Failed to write taxonomy file: {}", path.display()))?;

    println!("Wrote built-in taxonomy to {}", path.display());
    println!("Point [taxonomy] path at it in your config to customise categories.");

    Ok(())
}
