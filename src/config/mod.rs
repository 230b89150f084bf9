// src/config/mod.rs

//! Configuration loading and validation.
//!
//! Split the way the rest of the crate expects it:
//! - [`model`]: serde structs mirroring the TOML sections, plus the
//!   validated [`ConfigFile`] wrapper with duration accessors.
//! - [`loader`]: file loading entry points.
//! - [`validate`]: semantic checks, wired through `TryFrom<RawConfigFile>`.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, load_or_default};
pub use model::{
    CatalogSection, ConfigFile, RawConfigFile, RunSection, TemplatesSection, TimingSection,
    WatchSection,
};
