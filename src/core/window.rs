//! The managed window type and its state flags.

use bitflags::bitflags;
use slotmap::new_key_type;

use crate::core::monitor::{Monitor, MonitorId};
use crate::core::tags::TagMask;
use crate::core::types::Rect;
use crate::engine::SurfaceHandle;

new_key_type! {
    /// A stable handle to a managed window in the
    /// [`ClientRegistry`](super::registry::ClientRegistry) arena.
    pub struct WindowId;
}

bitflags! {
    /// Per-window state flags.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
    pub struct WindowFlags: u8 {
        /// The window floats above the tiled layer and keeps its own
        /// geometry.
        const FLOATING   = 1 << 0;
        /// The window has requested attention.
        const URGENT     = 1 << 1;
        /// The window covers its monitor's full area.
        const FULLSCREEN = 1 << 2;
        /// The window's surface is currently mapped.
        const MAPPED     = 1 << 3;
    }
}

/// A window managed by the registry.
///
/// A `Window` holds the policy-relevant state of a mapped surface: its
/// identity in the compositor engine, the tags it is visible on, the
/// monitor it belongs to, and its current and previous geometry. It does
/// not own the surface; the engine does.
///
/// Windows should only ever live inside a
/// [`ClientRegistry`](super::registry::ClientRegistry) and be referred to
/// by their [`WindowId`].
#[derive(Debug, Clone)]
pub struct Window {
    surface: SurfaceHandle,
    title: String,
    app_id: String,

    pub(crate) tags: TagMask,
    pub(crate) monitor: MonitorId,

    geom: Rect,
    prev_geom: Rect,
    border_px: u32,
    flags: WindowFlags,
}

impl PartialEq for Window {
    fn eq(&self, other: &Self) -> bool {
        self.surface == other.surface
    }
}

impl Window {
    /// Creates a new mapped window on the given monitor and tags.
    pub fn new<S1, S2>(
        surface: SurfaceHandle,
        title: S1,
        app_id: S2,
        monitor: MonitorId,
        tags: TagMask,
        geom: Rect,
    ) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        Self {
            surface,
            title: title.into(),
            app_id: app_id.into(),
            tags,
            monitor,
            geom,
            prev_geom: geom,
            border_px: 0,
            flags: WindowFlags::MAPPED,
        }
    }

    /// The engine surface this window wraps.
    #[inline(always)]
    pub fn surface(&self) -> SurfaceHandle {
        self.surface
    }

    /// The window's current title.
    #[inline(always)]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The window's application identifier.
    #[inline(always)]
    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// The tags this window is shown on.
    #[inline(always)]
    pub fn tags(&self) -> TagMask {
        self.tags
    }

    /// The monitor this window is assigned to.
    #[inline(always)]
    pub fn monitor(&self) -> MonitorId {
        self.monitor
    }

    /// The window's current geometry.
    #[inline(always)]
    pub fn geometry(&self) -> Rect {
        self.geom
    }

    /// The geometry the window had before it was last tiled or
    /// fullscreened, used to restore its floating size.
    #[inline(always)]
    pub fn previous_geometry(&self) -> Rect {
        self.prev_geom
    }

    /// The window's border width in pixels.
    #[inline(always)]
    pub fn border_px(&self) -> u32 {
        self.border_px
    }

    /// Tests whether the window is floating.
    #[inline(always)]
    pub fn is_floating(&self) -> bool {
        self.flags.contains(WindowFlags::FLOATING)
    }

    /// Tests whether the window's urgency hint is set.
    #[inline(always)]
    pub fn is_urgent(&self) -> bool {
        self.flags.contains(WindowFlags::URGENT)
    }

    /// Tests whether the window is fullscreen.
    #[inline(always)]
    pub fn is_fullscreen(&self) -> bool {
        self.flags.contains(WindowFlags::FULLSCREEN)
    }

    /// Tests whether the window's surface is mapped.
    #[inline(always)]
    pub fn is_mapped(&self) -> bool {
        self.flags.contains(WindowFlags::MAPPED)
    }

    /// Tests whether this window is shown on the given monitor.
    ///
    /// A window is visible when it is mapped, assigned to the monitor,
    /// and shares at least one tag with the monitor's active set.
    pub fn visible_on(&self, mon: &Monitor) -> bool {
        self.is_mapped() && self.monitor == mon.id() && self.tags.intersects(mon.active_tags())
    }

    /// Updates the window's title.
    pub fn set_title<S: Into<String>>(&mut self, title: S) {
        self.title = title.into();
    }

    /// Records a new geometry for the window.
    pub fn set_geometry(&mut self, geom: Rect) {
        self.geom = geom;
    }

    /// Saves the current geometry as the restore point for floating.
    pub fn remember_geometry(&mut self) {
        self.prev_geom = self.geom;
    }

    /// Restores the saved floating geometry.
    pub fn restore_geometry(&mut self) {
        self.geom = self.prev_geom;
    }

    /// Sets the window's border width.
    pub fn set_border_px(&mut self, px: u32) {
        self.border_px = px;
    }

    /// Sets or clears the floating flag.
    pub fn set_floating(&mut self, floating: bool) {
        self.flags.set(WindowFlags::FLOATING, floating);
    }

    /// Sets or clears the urgency flag.
    pub fn set_urgent(&mut self, urgent: bool) {
        self.flags.set(WindowFlags::URGENT, urgent);
    }

    /// Sets or clears the fullscreen flag.
    pub fn set_fullscreen(&mut self, fullscreen: bool) {
        self.flags.set(WindowFlags::FULLSCREEN, fullscreen);
    }

    /// Sets or clears the mapped flag.
    pub fn set_mapped(&mut self, mapped: bool) {
        self.flags.set(WindowFlags::MAPPED, mapped);
    }
}
