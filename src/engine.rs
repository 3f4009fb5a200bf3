//! The compositor engine collaborator interface.
//!
//! Tatami does not implement a display server. Rendering, protocol
//! plumbing and input hardware belong to an external engine; the core
//! drives it through the [`CompositorEngine`] trait and nothing else.
//! Every call here is fallible-but-recoverable: a failed geometry commit
//! leaves the window's previous geometry in place and is retried on the
//! next layout pass.

use thiserror::Error;

use crate::core::types::{Color, Rect};

/// An opaque handle to a surface owned by the compositor engine.
pub type SurfaceHandle = u64;

/// A connected output as reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputInfo {
    /// The output's connector name, e.g. `eDP-1`.
    pub name: String,
    /// The output's position and mode in the global coordinate space.
    pub geometry: Rect,
}

/// An error reported by the compositor engine.
#[non_exhaustive]
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// The surface no longer exists on the engine side.
    #[error("surface {0} is gone")]
    SurfaceGone(SurfaceHandle),

    /// The output backing a commit disappeared mid-flight.
    #[error("output {0} is gone")]
    OutputGone(String),

    /// The engine refused the request for a reason of its own.
    #[error("engine rejected request: {0}")]
    Rejected(String),
}

/// The calls Tatami makes into the compositor engine.
///
/// Implementations wrap whatever scene-graph or protocol library is in
/// use; the core only ever calls these four operations and treats their
/// failures as transient.
pub trait CompositorEngine {
    /// Commits a new geometry for the given surface.
    fn commit_geometry(&mut self, surface: SurfaceHandle, geom: Rect) -> Result<(), EngineError>;

    /// Enumerates the currently connected outputs.
    fn enumerate_outputs(&self) -> Vec<OutputInfo>;

    /// Grants or revokes keyboard activation for the given surface.
    fn activate_surface(&mut self, surface: SurfaceHandle, active: bool);

    /// Recolours the given surface's border.
    fn set_border_color(&mut self, surface: SurfaceHandle, color: Color);
}
