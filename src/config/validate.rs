// src/config/validate.rs

use std::collections::HashSet;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{DevloopError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = DevloopError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_timing(cfg)?;
    validate_categories(cfg)?;
    validate_excludes(cfg)?;
    Ok(())
}

fn validate_timing(cfg: &RawConfigFile) -> Result<()> {
    if cfg.timing.quiet_period_ms == 0 {
        return Err(DevloopError::Config(
            "[timing].quiet_period_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    if cfg.timing.grace_period_ms == 0 {
        return Err(DevloopError::Config(
            "[timing].grace_period_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    // settle_delay_ms may legitimately be 0.
    Ok(())
}

/// Every extension must be non-empty and belong to exactly one category;
/// otherwise routing would be ambiguous.
fn validate_categories(cfg: &RawConfigFile) -> Result<()> {
    let lists = [
        ("translation", &cfg.watch.translation),
        ("template", &cfg.watch.template),
        ("source", &cfg.watch.source),
    ];

    let mut seen: HashSet<String> = HashSet::new();
    for (category, exts) in lists {
        for ext in exts.iter() {
            let normalized = ext.trim_start_matches('.').to_lowercase();
            if normalized.is_empty() {
                return Err(DevloopError::Config(format!(
                    "[watch].{category} contains an empty extension"
                )));
            }
            if !seen.insert(normalized.clone()) {
                return Err(DevloopError::Config(format!(
                    "extension '{normalized}' appears in more than one [watch] category"
                )));
            }
        }
    }
    Ok(())
}

fn validate_excludes(cfg: &RawConfigFile) -> Result<()> {
    for pattern in &cfg.watch.exclude {
        if let Err(e) = globset::Glob::new(pattern) {
            return Err(DevloopError::Config(format!(
                "invalid exclude glob '{pattern}': {e}"
            )));
        }
    }
    Ok(())
}
