// src/build/template.rs

//! Template source generation via an external tool.

use std::path::PathBuf;
use std::process::Command;

use anyhow::{anyhow, Context};
use tracing::info;

use crate::build::{tool_on_path, BuildStep};
use crate::errors::{DevloopError, Result};

const STEP_NAME: &str = "templates";

/// Runs `<tool> generate <dir>` to regenerate code from template sources.
///
/// Templates are picked up live by the running child, so the orchestrator
/// never schedules a restart for this step.
pub struct TemplateGenerator {
    dir: PathBuf,
    tool: String,
}

impl TemplateGenerator {
    pub fn new(dir: impl Into<PathBuf>, tool: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            tool: tool.into(),
        }
    }
}

impl BuildStep for TemplateGenerator {
    fn name(&self) -> &str {
        STEP_NAME
    }

    fn install(&self) -> Result<()> {
        if !tool_on_path(&self.tool) {
            return Err(DevloopError::build(
                STEP_NAME,
                anyhow!("{} binary not found in PATH", self.tool),
            ));
        }
        Ok(())
    }

    fn process(&self) -> Result<()> {
        let output = Command::new(&self.tool)
            .arg("generate")
            .arg(&self.dir)
            .output()
            .with_context(|| format!("invoking {} generate {:?}", self.tool, self.dir))
            .map_err(|e| DevloopError::build(STEP_NAME, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DevloopError::build(
                STEP_NAME,
                anyhow!("{} generate failed: {}", self.tool, stderr.trim()),
            ));
        }

        info!(dir = ?self.dir, "templates generated");
        Ok(())
    }
}
