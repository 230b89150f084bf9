// src/build/mod.rs

//! Rebuild collaborators driven by the watch loop.
//!
//! - [`catalog`]: compiles localization catalog sources with an external
//!   `msgfmt`.
//! - [`template`]: shells out to an external template generation tool.
//!
//! Both sit behind the [`BuildStep`] trait so the orchestrator (and tests)
//! never depend on the concrete tools. A [`Pipeline`] runs all configured
//! steps once at startup; afterwards the orchestrator invokes individual
//! steps per matching file trigger.

pub mod catalog;
pub mod template;

use std::env;
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::errors::Result;

pub use catalog::CatalogBuilder;
pub use template::TemplateGenerator;

/// A unit of rebuild work with a dependency check and a processing step.
pub trait BuildStep: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &str;

    /// Verify external dependencies (tools on PATH, directories present).
    fn install(&self) -> Result<()>;

    /// Run the rebuild. Blocking; callers run this off the async runtime.
    fn process(&self) -> Result<()>;
}

/// Ordered set of build steps run once at startup.
///
/// `add` verifies a step's dependencies before registering it, so a session
/// with a broken toolchain fails before anything is watched or launched.
#[derive(Default)]
pub struct Pipeline {
    steps: Vec<Arc<dyn BuildStep>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Register a step after verifying its dependencies.
    pub fn add(&mut self, step: Arc<dyn BuildStep>) -> Result<()> {
        step.install()?;
        self.steps.push(step);
        Ok(())
    }

    /// Run all registered steps in order, stopping at the first failure.
    pub fn run_all(&self) -> Result<()> {
        for step in &self.steps {
            info!(step = %step.name(), "running initial build step");
            step.process()?;
        }
        Ok(())
    }
}

/// Check whether a tool can be found: either a direct path to a file, or a
/// bare name resolved against `PATH`.
pub(crate) fn tool_on_path(tool: &str) -> bool {
    let candidate = Path::new(tool);
    if candidate.components().count() > 1 {
        return candidate.is_file();
    }
    let Some(path_var) = env::var_os("PATH") else {
        return false;
    };
    env::split_paths(&path_var).any(|dir| dir.join(tool).is_file())
}
