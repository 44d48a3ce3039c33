//! newsrelay domain crate
//!
//! This crate contains the core domain logic following hexagonal architecture:
//! - `model`: Domain entities and value objects
//! - `ports`: Trait definitions for external dependencies (adapters)
//! - `usecases`: Classification, rendering, notification and the pipeline runner
//! - `policy`: Admission rules for candidate items
//! - `taxonomy`: The built-in keyword taxonomy

pub mod model;
pub mod policy;
pub mod ports;
pub mod taxonomy;
pub mod usecases;

pub use model::*;
pub use ports::*;

use sha2::{Digest, Sha256};

/// Compute a deterministic hash of a taxonomy.
/// Declaration order is part of the hash since it decides priority.
pub fn compute_taxonomy_fingerprint(categories: &[CategorySpec]) -> String {
    let mut hasher = Sha256::new();
    for category in categories {
        hasher.update(category.id.as_bytes());
        hasher.update([0]);
        hasher.update(category.label.as_bytes());
        for (kind, patterns) in [
            ("w", &category.words),
            ("s", &category.substrings),
            ("r", &category.regexes),
        ] {
            for pattern in patterns {
                hasher.update(kind.as_bytes());
                hasher.update(pattern.as_bytes());
                hasher.update([0]);
            }
        }
    }
    format!("{:x}", hasher.finalize())
}
