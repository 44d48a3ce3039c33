//! Taxonomy repositories: a TOML file on disk or the built-in list

use async_trait::async_trait;
use newsrelay_domain::taxonomy::builtin_categories;
use newsrelay_domain::{CategorySpec, TaxonomyError, TaxonomyRepo};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Taxonomy file layout: an ordered `[[categories]]` array
#[derive(Debug, Serialize, Deserialize)]
pub struct TaxonomyFile {
    #[serde(default)]
    pub categories: Vec<CategorySpec>,
}

/// Loads categories from a TOML file
pub struct FsTaxonomyRepo {
    path: PathBuf,
}

impl FsTaxonomyRepo {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, TaxonomyError> {
        let path = path.as_ref().to_path_buf();

        if !path.is_file() {
            return Err(TaxonomyError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Taxonomy file not found: {}", path.display()),
            )));
        }

        Ok(Self { path })
    }
}

#[async_trait]
impl TaxonomyRepo for FsTaxonomyRepo {
    async fn load(&self) -> Result<Vec<CategorySpec>, TaxonomyError> {
        let content = tokio::fs::read_to_string(&self.path).await?;

        let file: TaxonomyFile = toml::from_str(&content).map_err(|e| TaxonomyError::Parse {
            file: self.path.display().to_string(),
            message: e.to_string(),
        })?;

        if file.categories.is_empty() {
            return Err(TaxonomyError::Empty);
        }

        Ok(file.categories)
    }

    fn origin(&self) -> String {
        self.path.display().to_string()
    }
}

/// Serves the taxonomy compiled into the binary
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinTaxonomyRepo;

#[async_trait]
impl TaxonomyRepo for BuiltinTaxonomyRepo {
    async fn load(&self) -> Result<Vec<CategorySpec>, TaxonomyError> {
        Ok(builtin_categories())
    }

    fn origin(&self) -> String {
        "builtin".to_string()
    }
}

/// Render a taxonomy as TOML, e.g. to seed a custom file from the built-in list
pub fn to_toml(categories: &[CategorySpec]) -> Result<String, toml::ser::Error> {
    toml::to_string_pretty(&TaxonomyFile {
        categories: categories.to_vec(),
    })
}
