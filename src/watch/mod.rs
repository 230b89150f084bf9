// src/watch/mod.rs

//! File watching and interest filtering.
//!
//! This module is responsible for:
//! - Wiring up a cross-platform filesystem watcher (`notify`).
//! - Turning raw notifications into a lazy, unbounded stream of
//!   [`WatchEvent`]s filtered by extension interest and exclude globs.
//!
//! Coalescing of event bursts is explicitly **not** this module's job; raw
//! events pass through and are debounced downstream.

pub mod interest;
pub mod watcher;

pub use interest::{InterestSet, WatchEvent, WatchEventKind};
pub use watcher::{spawn_watcher, WatcherHandle};
