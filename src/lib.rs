// src/lib.rs

pub mod build;
pub mod cli;
pub mod config;
pub mod debounce;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod supervise;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::debug;

use crate::build::{BuildStep, CatalogBuilder, Pipeline, TemplateGenerator};
use crate::cli::CliArgs;
use crate::config::loader::load_or_default;
use crate::config::model::ConfigFile;
use crate::debounce::Debouncer;
use crate::engine::{CategoryMap, Orchestrator, Router};
use crate::errors::{DevloopError, Result};
use crate::supervise::{restart_queue, ShellLauncher, Supervisor, SuperviseTiming};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the initial build pass (catalog + templates, when configured)
/// - the supervised child and its restart worker
/// - the file watcher and debouncer
/// - reload-signal and Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_or_default(&config_path)?;

    let cmd = resolve_command(&args, &cfg)?;

    if args.dry_run {
        print_dry_run(&cfg, &cmd);
        return Ok(());
    }

    // Rebuild collaborators from the optional config sections.
    let catalog: Option<Arc<dyn BuildStep>> = cfg
        .catalog
        .as_ref()
        .map(|c| Arc::new(CatalogBuilder::new(&c.root)) as Arc<dyn BuildStep>);
    let template: Option<Arc<dyn BuildStep>> = cfg
        .templates
        .as_ref()
        .map(|t| Arc::new(TemplateGenerator::new(&t.dir, &t.tool)) as Arc<dyn BuildStep>);

    // Initial build pass. Failures here are fatal: there is no point
    // supervising a session whose toolchain is broken at startup.
    let mut pipeline = Pipeline::new();
    for step in [&catalog, &template].into_iter().flatten() {
        pipeline.add(Arc::clone(step))?;
    }
    if !pipeline.is_empty() {
        tokio::task::spawn_blocking(move || pipeline.run_all())
            .await
            .map_err(|e| DevloopError::Other(anyhow::anyhow!("initial build pass panicked: {e}")))??;
    }

    // The one supervised child and its restart worker.
    let timing = SuperviseTiming {
        grace_period: cfg.grace_period(),
        settle_delay: cfg.settle_delay(),
    };
    let supervisor = Supervisor::new(ShellLauncher::new(cmd), timing);
    let initial = supervisor.start().await?;

    let (restarts, restart_rx) = restart_queue();
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let worker = tokio::spawn(supervisor.run(initial, restart_rx, shutdown_rx));

    // Watcher over the union of all interesting extensions; uninteresting
    // events never leave the watch module.
    let categories = CategoryMap::new(&cfg.watch.translation, &cfg.watch.template, &cfg.watch.source);
    let excludes = cfg.compile_excludes()?;
    let root = watch_root(&config_path, &cfg);
    debug!(?root, "resolved watch root");
    let (watcher, watch_rx) = watch::spawn_watcher(root, categories.interest(), excludes)?;

    let debouncer = Debouncer::new(cfg.quiet_period());
    let router = Router::new(categories, catalog, template, debouncer, restarts);

    let orchestrator = Orchestrator::new(router, watch_rx, worker, shutdown_tx, watcher);
    orchestrator.run().await
}

/// The supervised command: `--cmd` wins over `[run].cmd`.
fn resolve_command(args: &CliArgs, cfg: &ConfigFile) -> Result<String> {
    let cmd = args.cmd.clone().unwrap_or_else(|| cfg.run.cmd.clone());
    if cmd.trim().is_empty() {
        return Err(DevloopError::Config(
            "no supervised command: set [run].cmd in the config or pass --cmd".to_string(),
        ));
    }
    Ok(cmd)
}

/// Figure out the directory to watch.
///
/// `[watch].root` is interpreted relative to the config file's directory; a
/// bare config filename (parent = "") anchors at the current working
/// directory instead.
fn watch_root(config_path: &Path, cfg: &ConfigFile) -> PathBuf {
    let base = match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    };
    base.join(&cfg.watch.root)
}

/// Simple dry-run output: print the resolved session setup.
fn print_dry_run(cfg: &ConfigFile, cmd: &str) {
    println!("devloop dry-run");
    println!("  run.cmd = {cmd}");
    println!();

    println!("  watch.root = {}", cfg.watch.root);
    println!("  watch.translation = {:?}", cfg.watch.translation);
    println!("  watch.template = {:?}", cfg.watch.template);
    println!("  watch.source = {:?}", cfg.watch.source);
    if !cfg.watch.exclude.is_empty() {
        println!("  watch.exclude = {:?}", cfg.watch.exclude);
    }
    println!();

    println!("  timing.quiet_period = {:?}", cfg.quiet_period());
    println!("  timing.grace_period = {:?}", cfg.grace_period());
    println!("  timing.settle_delay = {:?}", cfg.settle_delay());

    if let Some(ref catalog) = cfg.catalog {
        println!();
        println!("  catalog.root = {}", catalog.root);
    }
    if let Some(ref templates) = cfg.templates {
        println!();
        println!("  templates.dir = {}", templates.dir);
        println!("  templates.tool = {}", templates.tool);
    }

    debug!("dry-run complete (no execution)");
}
