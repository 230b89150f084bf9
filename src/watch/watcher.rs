// src/watch/watcher.rs

use std::path::{Path, PathBuf};

use globset::GlobSet;
use notify::event::ModifyKind;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::errors::Result;
use crate::watch::interest::{InterestSet, WatchEvent, WatchEventKind};

/// Handle for the filesystem watcher.
///
/// This exists mainly so the underlying `RecommendedWatcher` is kept alive for
/// as long as needed. Dropping this handle will stop file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Spawn a filesystem watcher observing `root` recursively.
///
/// Returns the keep-alive handle and a lazy, unbounded stream of
/// [`WatchEvent`]s, already filtered:
///
/// - only create/modify/rename events pass,
/// - the extension must be in `interest` (case-insensitive),
/// - the path must not match an `exclude` glob (evaluated relative to root).
///
/// Fails if `root` cannot be observed (missing, permission denied). When the
/// underlying notification channel is lost the stream terminates; callers
/// must treat that as fatal rather than resubscribe.
pub fn spawn_watcher(
    root: impl Into<PathBuf>,
    interest: InterestSet,
    exclude: GlobSet,
) -> Result<(WatcherHandle, mpsc::UnboundedReceiver<WatchEvent>)> {
    let root = root.into();
    // Canonicalize once so we have a stable base path for exclude matching.
    let root = root.canonicalize().unwrap_or_else(|_| root.clone());

    // Channel from the blocking notify callback into the async world.
    let (raw_tx, mut raw_rx) = mpsc::unbounded_channel::<Event>();

    // Closure called synchronously by notify whenever an event arrives.
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| {
            match res {
                Ok(event) => {
                    if let Err(err) = raw_tx.send(event) {
                        // We can't log via tracing here easily, so fallback to stderr.
                        eprintln!("devloop: failed to forward notify event: {err}");
                    }
                }
                Err(err) => {
                    eprintln!("devloop: file watch error: {err}");
                }
            }
        },
        Config::default(),
    )?;

    watcher.watch(&root, RecursiveMode::Recursive)?;

    info!("file watcher started on {:?}", root);

    // Async task that filters raw notify events down to interesting ones.
    let (event_tx, event_rx) = mpsc::unbounded_channel::<WatchEvent>();
    tokio::spawn(async move {
        while let Some(event) = raw_rx.recv().await {
            let Some(kind) = classify_kind(&event.kind) else {
                continue;
            };
            for path in event.paths {
                if !interest.matches_path(&path) {
                    continue;
                }
                if is_excluded(&exclude, &root, &path) {
                    debug!(?path, "path matches exclude glob; dropping event");
                    continue;
                }
                info!("file changed: {:?}", path);
                if event_tx.send(WatchEvent { path, kind }).is_err() {
                    debug!("watch event receiver dropped; stopping forward loop");
                    return;
                }
            }
        }
        debug!("notify event channel closed; watch stream ends");
    });

    Ok((WatcherHandle { _inner: watcher }, event_rx))
}

/// Map a raw notify event kind onto the kinds we forward.
///
/// Only content writes, creations and renames pass. Metadata-only changes
/// (chmod, attribute touches) must not schedule a restart, so they are
/// dropped here along with removals and access events.
fn classify_kind(kind: &EventKind) -> Option<WatchEventKind> {
    match kind {
        EventKind::Create(_) => Some(WatchEventKind::Created),
        EventKind::Modify(ModifyKind::Name(_)) => Some(WatchEventKind::Renamed),
        EventKind::Modify(ModifyKind::Data(_)) | EventKind::Modify(ModifyKind::Any) => {
            Some(WatchEventKind::Modified)
        }
        _ => None,
    }
}

/// Exclude globs are written relative to the watch root; a path that cannot
/// be relativized is never excluded.
fn is_excluded(exclude: &GlobSet, root: &Path, path: &Path) -> bool {
    if exclude.is_empty() {
        return false;
    }
    match path.strip_prefix(root) {
        Ok(rel) => exclude.is_match(rel),
        Err(_) => false,
    }
}
