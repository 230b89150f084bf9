// src/build/catalog.rs

//! Localization catalog compilation.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{anyhow, Context};
use tracing::info;

use crate::build::{tool_on_path, BuildStep};
use crate::errors::{DevloopError, Result};

const STEP_NAME: &str = "catalog";
const COMPILER: &str = "msgfmt";

/// Compiles gettext `.po` sources under a root directory into sibling `.mo`
/// files using the external `msgfmt` tool.
pub struct CatalogBuilder {
    root: PathBuf,
}

impl CatalogBuilder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl BuildStep for CatalogBuilder {
    fn name(&self) -> &str {
        STEP_NAME
    }

    fn install(&self) -> Result<()> {
        if !tool_on_path(COMPILER) {
            return Err(DevloopError::build(
                STEP_NAME,
                anyhow!("{COMPILER} binary not found in PATH"),
            ));
        }
        if !self.root.is_dir() {
            return Err(DevloopError::build(
                STEP_NAME,
                anyhow!("catalog root {:?} is not a directory", self.root),
            ));
        }
        Ok(())
    }

    fn process(&self) -> Result<()> {
        let mut sources = Vec::new();
        collect_catalog_sources(&self.root, &mut sources)
            .with_context(|| format!("walking catalog root {:?}", self.root))
            .map_err(|e| DevloopError::build(STEP_NAME, e))?;

        for source in sources {
            let out = source.with_extension("mo");
            compile_catalog(&source, &out).map_err(|e| DevloopError::build(STEP_NAME, e))?;
            info!(src = ?source, out = ?out, "compiled catalog");
        }
        Ok(())
    }
}

fn collect_catalog_sources(dir: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_catalog_sources(&path, out)?;
        } else if path.extension().is_some_and(|e| e.eq_ignore_ascii_case("po")) {
            out.push(path);
        }
    }
    Ok(())
}

fn compile_catalog(source: &Path, out: &Path) -> anyhow::Result<()> {
    let output = Command::new(COMPILER)
        .arg(source)
        .arg("-o")
        .arg(out)
        .output()
        .with_context(|| format!("invoking {COMPILER} for {source:?}"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!(
            "{COMPILER} failed for {source:?}: {}",
            stderr.trim()
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_po_sources_recursively() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("en/app");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("default.po"), "msgid \"\"\n").unwrap();
        fs::write(nested.join("default.mo"), [0u8; 4]).unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let mut sources = Vec::new();
        collect_catalog_sources(dir.path(), &mut sources).unwrap();
        assert_eq!(sources, vec![nested.join("default.po")]);
    }

    #[test]
    fn install_rejects_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let builder = CatalogBuilder::new(dir.path().join("does-not-exist"));
        // Either the missing compiler or the missing root must fail install.
        assert!(builder.install().is_err());
    }
}
