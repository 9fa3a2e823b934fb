//! Loading monitored application definitions from disk

use std::collections::HashSet;
use std::path::Path;
use tracing::{error, info, warn};

use crate::error::{AppError, Result};
use crate::models::{ApplicationTarget, TargetsFile};

pub fn try_load_targets(path: impl AsRef<Path>) -> Result<Vec<ApplicationTarget>> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(AppError::Configuration(format!(
            "Targets file '{}' not found",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(path)?;
    let file: TargetsFile = serde_json::from_str(&content)?;

    let mut seen = HashSet::new();
    for target in &file.applications {
        if !seen.insert(target.name.as_str()) {
            warn!(
                "Duplicate application name '{}' in {}; later results will overwrite earlier ones",
                target.name,
                path.display()
            );
        }
    }

    Ok(file.applications)
}

/// Never fails: an unreadable or malformed file yields no targets.
pub fn load_targets(path: impl AsRef<Path>) -> Vec<ApplicationTarget> {
    let path = path.as_ref();

    match try_load_targets(path) {
        Ok(targets) => {
            info!("Loaded {} application targets from {}", targets.len(), path.display());
            targets
        }
        Err(e) => {
            error!(
                "Failed to load application targets from {}: {}. Continuing with no targets",
                path.display(),
                e
            );
            Vec::new()
        }
    }
}
