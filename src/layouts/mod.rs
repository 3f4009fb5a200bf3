//! Traits and types for arranging windows on a monitor.
//!
//! The core of this module is the [`Layout`] trait. A layout is a pure
//! arrangement policy: given the monitor's usable area, its tiling
//! parameters and the visible windows in tiling order, it produces a list
//! of [`Placement`]s for the host to commit. Layouts never touch registry
//! state themselves.
//!
//! Which layouts exist is up to the loaded policy; the selected layout
//! index is monitor-local, so different monitors can run different
//! layouts at the same time.

use crate::core::tags::TagMask;
use crate::core::types::Rect;
use crate::core::window::WindowId;

/// A simple master-and-stack tiling layout.
pub mod tiled;

/// A full-screen stacking layout.
pub mod monocle;

/// The null layout: windows keep their own geometry.
pub mod floating;

#[doc(inline)]
pub use floating::Floating;
#[doc(inline)]
pub use monocle::Monocle;
#[doc(inline)]
pub use tiled::MasterStack;

/// The style of a layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutKind {
    /// Windows keep their own requested geometry.
    Floating,
    /// Window geometry is enforced by the layout.
    Tiled,
}

/// One window as seen by a layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutItem {
    /// The window's registry handle.
    pub id: WindowId,
    /// The window's current geometry.
    pub geom: Rect,
    /// Whether the window floats (tiled layouts skip it).
    pub floating: bool,
}

/// The context a layout arranges against.
///
/// Carries the monitor-local parameters and the visible windows in
/// tiling order. Fullscreen windows are handled by the host before the
/// layout runs and never appear here.
#[derive(Debug, Clone)]
pub struct LayoutCtxt<'a> {
    /// The monitor's usable area, after bar reservations.
    pub usable: Rect,
    /// The monitor's active tag set (for layouts that care).
    pub active_tags: TagMask,
    /// The fraction of the usable width given to the master region.
    pub mfact: f32,
    /// The number of windows in the master region.
    pub nmaster: u32,
    /// The visible windows, in tiling order.
    pub windows: &'a [LayoutItem],
}

impl LayoutCtxt<'_> {
    /// The windows the tiled layouts arrange: everything not floating.
    pub fn tiled(&self) -> impl Iterator<Item = &LayoutItem> {
        self.windows.iter().filter(|w| !w.floating)
    }
}

/// A geometry assignment produced by a layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// The window to place.
    pub id: WindowId,
    /// The geometry to give it.
    pub geom: Rect,
}

/// An arrangement policy for the windows visible on a monitor.
///
/// Implementations must be pure with respect to host state: the only
/// inputs are the [`LayoutCtxt`], and the only output is the placement
/// list. `Send` is required because layout lists live in policy tables,
/// which cross the loader boundary.
pub trait Layout: Send {
    /// The short symbol shown in a status bar, e.g. `[]=`.
    fn symbol(&self) -> &str;

    /// The style of this layout.
    fn kind(&self) -> LayoutKind;

    /// Computes the placements for the given context.
    fn arrange(&self, ctxt: &LayoutCtxt<'_>) -> Vec<Placement>;

    /// Returns a boxed clone of itself, so layout lists can be rebuilt.
    fn boxed(&self) -> Box<dyn Layout>;
}
