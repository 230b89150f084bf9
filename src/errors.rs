// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DevloopError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Watch setup error: {0}")]
    Setup(#[from] notify::Error),

    #[error("file watch stream terminated unexpectedly")]
    WatchStreamClosed,

    #[error("Build step '{step}' failed: {source}")]
    Build {
        step: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to launch supervised process: {0}")]
    Launch(String),

    #[error("Failed to terminate supervised process: {0}")]
    Termination(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DevloopError {
    /// Convenience constructor for build-step failures.
    pub fn build(step: impl Into<String>, source: anyhow::Error) -> Self {
        DevloopError::Build {
            step: step.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, DevloopError>;
