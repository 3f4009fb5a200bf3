//! # TatamiWM - a tiling window manager core
//!
//! Tatami is the policy core of a dynamic tiling window manager. It keeps
//! track of managed windows and monitors, assigns windows to virtual
//! desktops ("tags"), computes window geometry under pluggable layouts,
//! tracks keyboard focus order, and resolves keybindings against a policy
//! table that can be swapped out at runtime without restarting the process.
//!
//! What Tatami deliberately does *not* do is talk to a display server.
//! Protocol plumbing, rendering and input hardware are the job of a
//! compositor engine that the core drives through the [`CompositorEngine`]
//! trait; Tatami only decides *where* windows go and *who* has focus.
//!
//! ## Structure
//!
//! The crate is organised around a handful of cooperating pieces:
//!
//! - [`core`]: the window arena, the tiling and focus orders, tag masks
//!   and monitors. All window-graph state lives here.
//! - [`layouts`]: the [`Layout`](layouts::Layout) trait and the built-in
//!   master-stack, monocle and floating arrangements.
//! - [`policy`]: the hot-reload boundary. A policy module is loaded from a
//!   separate artifact, exposes a [`PolicyTable`](policy::PolicyTable)
//!   (keybinds, rules, layouts, input preferences), and can be unloaded or
//!   reloaded at any time without corrupting the window graph.
//! - [`bindings`]: keybind and mousebind types plus the resolver that
//!   merges the host's fixed bindings with the loaded policy's bindings.
//! - [`manager`]: the [`Tatami`] host itself, which owns everything above
//!   and services map/unmap/key/output events from the engine adapter.
//!
//! ## Threading
//!
//! All window, monitor and tag state is mutated exclusively on the thread
//! driving the engine's event loop. Policy modules may spawn their own
//! worker threads (a status-bar feeder, say), but those workers only ever
//! observe host state through snapshots and route mutations back through
//! the host's request channel. Unloading a policy joins its workers before
//! its teardown completes, so no policy code runs after its table is gone.

#![warn(
    missing_debug_implementations,
    missing_copy_implementations,
    missing_docs
)]

pub mod bindings;
pub mod config;
pub mod core;
pub mod engine;
pub mod events;
pub mod layouts;
pub mod manager;
pub mod policy;
pub mod status;
pub mod util;

pub use crate::core::types;
#[doc(inline)]
pub use crate::engine::CompositorEngine;
#[doc(inline)]
pub use crate::manager::Tatami;

use std::io;

use thiserror::Error;

use crate::bindings::BindingError;
use crate::core::window::WindowId;
use crate::engine::EngineError;
use crate::policy::PolicyError;

/// Everything that could possibly go wrong while Tatami is running.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum TatamiError {
    /// A policy artifact could not be loaded, or failed to initialise.
    #[error(transparent)]
    Policy(#[from] PolicyError),

    /// A call into the compositor engine failed.
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    /// An error occurred while processing keybinds.
    #[error(transparent)]
    Bindings(BindingError),

    /// Received a reference to a window not tracked by Tatami.
    #[error("unknown client {0:?}")]
    UnknownClient(WindowId),

    /// A request referred to a monitor unknown to Tatami.
    #[error("unknown monitor {0}")]
    UnknownMonitor(String),

    /// Unable to spawn a process.
    #[error("error while running program: {0}")]
    SpawnProc(String),

    /// One or more configuration invariants was not upheld.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<io::Error> for TatamiError {
    fn from(e: io::Error) -> TatamiError {
        TatamiError::SpawnProc(e.to_string())
    }
}

/// The general result type used by Tatami.
pub type Result<T> = ::core::result::Result<T, TatamiError>;
