// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation (extension overlap, glob syntax, etc.). Use
/// [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and run basic validation.
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks for:
///   - overlapping category extension lists,
///   - zero-width timing windows,
///   - malformed exclude globs.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Load the config if the file exists, otherwise fall back to built-in
/// defaults so `devloop --cmd '...'` works in a bare project tree.
///
/// A present-but-invalid file is still a hard error.
pub fn load_or_default(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    if path.exists() {
        load_and_validate(path)
    } else {
        debug!(?path, "config file not found; using built-in defaults");
        Ok(ConfigFile::default())
    }
}

/// Helper to resolve a default config path.
///
/// Currently this just returns `Devloop.toml` in the current working
/// directory, but this function exists so you can later:
///
/// - Respect an env var (e.g. `DEVLOOP_CONFIG`).
/// - Support project-local config discovery.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Devloop.toml")
}
