// src/engine/mod.rs

//! Orchestration engine for devloop.
//!
//! This module ties together:
//! - the filtered watch event stream
//! - the external reload signal
//! - the debounce policy
//! - the supervisor's restart queue
//!
//! The routing policy lives in [`router`]; the async event loop that binds
//! the concurrent trigger sources together is implemented in [`runtime`].

pub mod router;
pub mod runtime;

pub use router::{CategoryMap, FileCategory, Router};
pub use runtime::Orchestrator;

use crate::watch::WatchEvent;

/// A single restart/rebuild trigger from any source.
///
/// File changes and the external reload signal feed the same handling path;
/// only file triggers go through category routing.
#[derive(Debug, Clone)]
pub enum Trigger {
    /// A filesystem change under the watched root.
    File(WatchEvent),
    /// The external reload signal (SIGUSR1).
    Reload,
}
