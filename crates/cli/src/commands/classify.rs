//! Classify command - one-shot classification of a headline

use anyhow::{Context, Result, bail};
use newsrelay_adapters::taxonomy::{BuiltinTaxonomyRepo, FsTaxonomyRepo};
use newsrelay_domain::usecases::KeywordClassifier;
use newsrelay_domain::{CategorySpec, TaxonomyRepo};
use secrecy::SecretString;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::args::ClassifyArgs;
use crate::config::AppConfig;

#[derive(Debug, Serialize)]
struct ClassifyOutput<'a> {
    matched: bool,
    category: Option<&'a str>,
    label: Option<&'a str>,
}

pub async fn execute(args: ClassifyArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref()).unwrap_or_default();

    if args.text.trim().is_empty() {
        bail!("No text provided for classification");
    }

    let taxonomy_path = args.taxonomy.as_deref().or(config.taxonomy.path.as_deref());
    let (specs, origin) = load_taxonomy(taxonomy_path).await?;
    let classifier = KeywordClassifier::compile(&specs).context("Failed to compile taxonomy")?;

    tracing::debug!(
        taxonomy = %origin,
        categories = specs.len(),
        text_length = args.text.len(),
        "Classifying text"
    );

    let category = classifier.classify(&args.text, &args.summary);
    let output = ClassifyOutput {
        matched: category.is_some(),
        category: category.map(|c| c.id.as_str()),
        label: category.map(|c| c.label.as_str()),
    };

    if args.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialize output")?;
        println!("{}", json);
    } else {
        match category {
            Some(category) => {
                println!("Category: {}", category.id);
                println!("Label:    {}", category.label);
            }
            None => println!("No category matched."),
        }
    }

    Ok(())
}

/// Load the taxonomy from a TOML file, or the built-in one when no path is given
pub(crate) async fn load_taxonomy(path: Option<&Path>) -> Result<(Vec<CategorySpec>, String)> {
    let repo: Box<dyn TaxonomyRepo> = match path {
        Some(path) => {
            Box::new(FsTaxonomyRepo::new(path).context("Failed to open taxonomy file")?)
        }
        None => Box::new(BuiltinTaxonomyRepo),
    };

    let specs = repo.load().await.context("Failed to load taxonomy")?;
    Ok((specs, repo.origin()))
}

/// Read a secret from the environment variable named in config
pub(crate) fn load_secret(env_var: &str, purpose: &str) -> Result<SecretString> {
    if env_var.trim().is_empty() {
        bail!("No env var configured for {}", purpose);
    }

    let value = std::env::var(env_var)
        .with_context(|| format!("Missing env var {} for {}", env_var, purpose))?;

    if value.trim().is_empty() {
        bail!("Env var {} is empty for {}", env_var, purpose);
    }

    Ok(SecretString::new(value.trim().into()))
}
