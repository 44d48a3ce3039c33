//! Keyword classification - maps item text to the first matching category

use regex::{Regex, RegexBuilder};
use std::collections::HashSet;

use crate::compute_taxonomy_fingerprint;
use crate::model::{Category, CategorySpec};
use crate::ports::TaxonomyError;

enum Matcher {
    Regex(Regex),
    /// Lowercased literal
    Substring(String),
}

impl Matcher {
    fn is_match(&self, haystack: &str) -> bool {
        match self {
            Matcher::Regex(regex) => regex.is_match(haystack),
            Matcher::Substring(needle) => haystack.contains(needle.as_str()),
        }
    }
}

struct CompiledCategory {
    category: Category,
    matchers: Vec<Matcher>,
}

/// Compiled keyword taxonomy.
///
/// Categories are evaluated in declared order and the first one with any
/// matching pattern wins. The classifier holds no mutable state and can be
/// shared freely between tasks.
pub struct KeywordClassifier {
    categories: Vec<CompiledCategory>,
    fingerprint: String,
}

impl KeywordClassifier {
    /// Compile a taxonomy. Any invalid id or pattern rejects the whole taxonomy.
    pub fn compile(specs: &[CategorySpec]) -> Result<Self, TaxonomyError> {
        if specs.is_empty() {
            return Err(TaxonomyError::Empty);
        }

        let mut ids = HashSet::new();
        let mut categories = Vec::with_capacity(specs.len());

        for spec in specs {
            validate_id(&spec.id)?;
            if !ids.insert(spec.id.as_str()) {
                return Err(TaxonomyError::DuplicateId {
                    id: spec.id.clone(),
                });
            }
            if spec.pattern_count() == 0 {
                return Err(TaxonomyError::NoPatterns {
                    category: spec.id.clone(),
                });
            }

            let mut matchers = Vec::with_capacity(spec.pattern_count());
            for word in &spec.words {
                let pattern = word_pattern(&spec.id, word)?;
                matchers.push(Matcher::Regex(build_regex(&spec.id, &pattern, word)?));
            }
            for substring in &spec.substrings {
                let needle = substring.trim().to_lowercase();
                if needle.is_empty() {
                    return Err(TaxonomyError::EmptyPattern {
                        category: spec.id.clone(),
                    });
                }
                matchers.push(Matcher::Substring(needle));
            }
            for raw in &spec.regexes {
                if raw.trim().is_empty() {
                    return Err(TaxonomyError::EmptyPattern {
                        category: spec.id.clone(),
                    });
                }
                matchers.push(Matcher::Regex(build_regex(&spec.id, raw, raw)?));
            }

            categories.push(CompiledCategory {
                category: Category {
                    id: spec.id.clone(),
                    label: spec.label.clone(),
                },
                matchers,
            });
        }

        Ok(Self {
            categories,
            fingerprint: compute_taxonomy_fingerprint(specs),
        })
    }

    /// Classify an item by its title and summary
    pub fn classify(&self, title: &str, summary: &str) -> Option<&Category> {
        let haystack = format!("{} {}", title, summary).to_lowercase();

        self.categories
            .iter()
            .find(|c| c.matchers.iter().any(|m| m.is_match(&haystack)))
            .map(|c| &c.category)
    }

    /// Categories in priority order
    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter().map(|c| &c.category)
    }

    pub fn pattern_count(&self) -> usize {
        self.categories.iter().map(|c| c.matchers.len()).sum()
    }

    /// SHA-256 of the taxonomy specs
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

fn validate_id(id: &str) -> Result<(), TaxonomyError> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if !valid {
        return Err(TaxonomyError::InvalidId { id: id.to_string() });
    }
    Ok(())
}

/// Escape a literal term and bound it by word edges; inner whitespace matches any run of whitespace
fn word_pattern(category: &str, word: &str) -> Result<String, TaxonomyError> {
    let parts: Vec<String> = word.split_whitespace().map(regex::escape).collect();
    if parts.is_empty() {
        return Err(TaxonomyError::EmptyPattern {
            category: category.to_string(),
        });
    }
    Ok(format!(r"\b{}\b", parts.join(r"\s+")))
}

fn build_regex(category: &str, pattern: &str, original: &str) -> Result<Regex, TaxonomyError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| TaxonomyError::InvalidPattern {
            category: category.to_string(),
            pattern: original.to_string(),
            message: e.to_string(),
        })
}
