// src/engine/router.rs

//! Routing policy: what each trigger means for the dev session.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::build::BuildStep;
use crate::debounce::Debouncer;
use crate::engine::Trigger;
use crate::supervise::RestartQueue;
use crate::watch::{InterestSet, WatchEvent};

/// What a changed file means for the dev session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileCategory {
    /// Translation source: rebuild the catalog, then restart (translations
    /// are loaded at process start).
    Translation,
    /// Template source: regenerate, no restart (picked up live).
    Template,
    /// Program source: restart only.
    Source,
    /// Not interesting to any reaction.
    Other,
}

/// Maps file extensions (case-insensitive) to categories.
#[derive(Debug, Clone, Default)]
pub struct CategoryMap {
    translation: InterestSet,
    template: InterestSet,
    source: InterestSet,
}

impl CategoryMap {
    pub fn new<I, S>(translation: I, template: I, source: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            translation: InterestSet::new(translation),
            template: InterestSet::new(template),
            source: InterestSet::new(source),
        }
    }

    pub fn categorize(&self, path: &Path) -> FileCategory {
        if self.translation.matches_path(path) {
            FileCategory::Translation
        } else if self.template.matches_path(path) {
            FileCategory::Template
        } else if self.source.matches_path(path) {
            FileCategory::Source
        } else {
            FileCategory::Other
        }
    }

    /// Union of all category extensions, used to configure the watcher so
    /// uninteresting events are dropped at the source.
    pub fn interest(&self) -> InterestSet {
        InterestSet::new(
            self.translation
                .extensions()
                .chain(self.template.extensions())
                .chain(self.source.extensions()),
        )
    }
}

/// Applies the routing policy for each trigger.
///
/// Synchronous rebuild steps for a trigger complete before any restart that
/// trigger schedules; collaborator failures are reported and the watch loop
/// continues, and a failed catalog build never suppresses the restart.
pub struct Router {
    categories: CategoryMap,
    catalog: Option<Arc<dyn BuildStep>>,
    template: Option<Arc<dyn BuildStep>>,
    debouncer: Debouncer,
    restarts: RestartQueue,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("categories", &self.categories)
            .field("debouncer", &self.debouncer)
            .finish_non_exhaustive()
    }
}

impl Router {
    pub fn new(
        categories: CategoryMap,
        catalog: Option<Arc<dyn BuildStep>>,
        template: Option<Arc<dyn BuildStep>>,
        debouncer: Debouncer,
        restarts: RestartQueue,
    ) -> Self {
        Self {
            categories,
            catalog,
            template,
            debouncer,
            restarts,
        }
    }

    pub async fn route(&self, trigger: Trigger) {
        match trigger {
            Trigger::Reload => {
                info!("external reload trigger");
                self.schedule_restart();
            }
            Trigger::File(event) => self.route_file(event).await,
        }
    }

    async fn route_file(&self, event: WatchEvent) {
        let category = self.categories.categorize(&event.path);
        debug!(path = ?event.path, kind = ?event.kind, ?category, "routing file trigger");

        match category {
            FileCategory::Translation => {
                self.run_step(&self.catalog, &event).await;
                self.schedule_restart();
            }
            FileCategory::Template => {
                self.run_step(&self.template, &event).await;
            }
            FileCategory::Source => {
                self.schedule_restart();
            }
            FileCategory::Other => {}
        }
    }

    /// Run a collaborator synchronously for this trigger. The step is
    /// blocking (it shells out), so it runs on the blocking pool while this
    /// task awaits the outcome.
    async fn run_step(&self, step: &Option<Arc<dyn BuildStep>>, event: &WatchEvent) {
        let Some(step) = step else {
            debug!(path = ?event.path, "no build step configured for this category");
            return;
        };

        let step = Arc::clone(step);
        let name = step.name().to_string();
        info!(step = %name, path = ?event.path, "running build step");

        match tokio::task::spawn_blocking(move || step.process()).await {
            Ok(Ok(())) => info!(step = %name, "build step succeeded"),
            Ok(Err(err)) => {
                error!(step = %name, path = ?event.path, %err, "build step failed");
            }
            Err(join_err) => {
                error!(step = %name, %join_err, "build step panicked");
            }
        }
    }

    fn schedule_restart(&self) {
        let queue = self.restarts.clone();
        self.debouncer.schedule(move || {
            queue.request();
        });
    }
}
