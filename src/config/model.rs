// src/config/model.rs

use std::time::Duration;

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Deserialize;

use crate::errors::{DevloopError, Result};

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [run]
/// cmd = "go run ./cmd/app"
///
/// [watch]
/// root = "."
/// translation = ["po"]
/// template = ["templ"]
/// source = ["go"]
/// exclude = ["target/**", ".git/**"]
///
/// [timing]
/// quiet_period_ms = 500
/// grace_period_ms = 5000
/// settle_delay_ms = 200
///
/// [catalog]
/// root = "web/locales"
///
/// [templates]
/// dir = "template"
/// tool = "templ"
/// ```
///
/// All sections are optional and have reasonable defaults; `[catalog]` and
/// `[templates]` are collaborator sections that enable the corresponding
/// rebuild step only when present.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    /// `[run]` section: the supervised command.
    #[serde(default)]
    pub run: RunSection,

    /// `[watch]` section: root, category extensions, exclude globs.
    #[serde(default)]
    pub watch: WatchSection,

    /// `[timing]` section: debounce/grace/settle knobs.
    #[serde(default)]
    pub timing: TimingSection,

    /// Optional `[catalog]` section enabling the localization builder.
    #[serde(default)]
    pub catalog: Option<CatalogSection>,

    /// Optional `[templates]` section enabling the template generator.
    #[serde(default)]
    pub templates: Option<TemplatesSection>,
}

/// `[run]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RunSection {
    /// The command to launch and supervise, run through `sh -c`.
    ///
    /// May be empty in the file when the command is supplied with `--cmd`.
    #[serde(default)]
    pub cmd: String,
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchSection {
    /// Directory to watch, relative to the config file's directory.
    #[serde(default = "default_watch_root")]
    pub root: String,

    /// Extensions categorized as translation sources (builder + restart).
    #[serde(default = "default_translation_extensions")]
    pub translation: Vec<String>,

    /// Extensions categorized as template sources (generator, no restart).
    #[serde(default = "default_template_extensions")]
    pub template: Vec<String>,

    /// Extensions categorized as program sources (restart only).
    #[serde(default = "default_source_extensions")]
    pub source: Vec<String>,

    /// Glob patterns (relative to the watch root) whose events are ignored.
    #[serde(default)]
    pub exclude: Vec<String>,
}

fn default_watch_root() -> String {
    ".".to_string()
}

fn default_translation_extensions() -> Vec<String> {
    vec!["po".to_string()]
}

fn default_template_extensions() -> Vec<String> {
    vec!["templ".to_string()]
}

fn default_source_extensions() -> Vec<String> {
    vec!["go".to_string()]
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            root: default_watch_root(),
            translation: default_translation_extensions(),
            template: default_template_extensions(),
            source: default_source_extensions(),
            exclude: Vec::new(),
        }
    }
}

/// `[timing]` section.
///
/// These are the tool's tunable constants; they are configuration values
/// rather than literals buried in the code.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TimingSection {
    /// Debounce quiet period: a restart fires only once the trigger stream
    /// has been quiet this long.
    #[serde(default = "default_quiet_period_ms")]
    pub quiet_period_ms: u64,

    /// How long a child gets to exit gracefully before being killed.
    #[serde(default = "default_grace_period_ms")]
    pub grace_period_ms: u64,

    /// Pause inserted before and after termination confirmation.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

fn default_quiet_period_ms() -> u64 {
    500
}

fn default_grace_period_ms() -> u64 {
    5_000
}

fn default_settle_delay_ms() -> u64 {
    200
}

impl Default for TimingSection {
    fn default() -> Self {
        Self {
            quiet_period_ms: default_quiet_period_ms(),
            grace_period_ms: default_grace_period_ms(),
            settle_delay_ms: default_settle_delay_ms(),
        }
    }
}

/// `[catalog]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogSection {
    /// Directory containing the `.po` translation sources.
    pub root: String,
}

/// `[templates]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplatesSection {
    /// Working directory handed to the generation tool.
    pub dir: String,

    /// External generator binary, invoked as `<tool> generate <dir>`.
    #[serde(default = "default_template_tool")]
    pub tool: String,
}

fn default_template_tool() -> String {
    "templ".to_string()
}

/// Validated configuration.
///
/// Constructed from [`RawConfigFile`] via `TryFrom` in
/// [`crate::config::validate`]; code elsewhere in the crate only ever sees
/// this type.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub run: RunSection,
    pub watch: WatchSection,
    pub timing: TimingSection,
    pub catalog: Option<CatalogSection>,
    pub templates: Option<TemplatesSection>,
}

impl ConfigFile {
    /// Wrap raw sections without re-validating. Only `validate` calls this.
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            run: raw.run,
            watch: raw.watch,
            timing: raw.timing,
            catalog: raw.catalog,
            templates: raw.templates,
        }
    }

    pub fn quiet_period(&self) -> Duration {
        Duration::from_millis(self.timing.quiet_period_ms)
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.timing.grace_period_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.timing.settle_delay_ms)
    }

    /// Compile the `[watch].exclude` globs. An empty list yields a set that
    /// matches nothing.
    pub fn compile_excludes(&self) -> Result<GlobSet> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.watch.exclude {
            let glob = Glob::new(pattern).map_err(|e| {
                DevloopError::Config(format!("invalid exclude glob '{pattern}': {e}"))
            })?;
            builder.add(glob);
        }
        builder
            .build()
            .map_err(|e| DevloopError::Config(format!("compiling exclude globs: {e}")))
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        ConfigFile::new_unchecked(RawConfigFile::default())
    }
}
