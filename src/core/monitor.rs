//! Monitors and their tag state.
//!
//! A [`Monitor`] wraps one connected output and owns the per-output view
//! state: which tags are active, which layout is selected, and the tiling
//! parameters (`mfact`, `nmaster`). The tag-set operations here implement
//! the two-slot view model: every view change writes the *alternate* slot
//! and flips which slot is current, so switching back is always a single
//! flip away.

use slotmap::new_key_type;
use tracing::warn;

use crate::core::tags::{TagMask, TAG_COUNT};
use crate::core::types::{Cardinal, Rect};

new_key_type! {
    /// A stable handle to a connected monitor.
    pub struct MonitorId;
}

/// The lowest master factor a monitor will accept.
pub const MFACT_MIN: f32 = 0.05;
/// The highest master factor a monitor will accept.
pub const MFACT_MAX: f32 = 0.95;

/// A physical monitor and its view state.
#[derive(Debug, Clone)]
pub struct Monitor {
    id: MonitorId,
    name: String,

    geom: Rect,
    usable: Rect,

    tagsets: [TagMask; 2],
    seltags: usize,

    layout_idx: usize,
    mfact: f32,
    nmaster: u32,
}

impl Monitor {
    /// Creates a new monitor covering `geom`, viewing the first tag.
    pub fn new<S: Into<String>>(id: MonitorId, name: S, geom: Rect) -> Self {
        Self {
            id,
            name: name.into(),
            geom,
            usable: geom,
            tagsets: [TagMask::single(0); 2],
            seltags: 0,
            layout_idx: 0,
            mfact: 0.55,
            nmaster: 1,
        }
    }

    /// This monitor's handle.
    #[inline(always)]
    pub fn id(&self) -> MonitorId {
        self.id
    }

    /// The monitor's output name.
    #[inline(always)]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The full physical area of the monitor.
    #[inline(always)]
    pub fn geometry(&self) -> Rect {
        self.geom
    }

    /// The area available to layouts after bar reservations.
    #[inline(always)]
    pub fn usable(&self) -> Rect {
        self.usable
    }

    /// The currently active tag set.
    #[inline(always)]
    pub fn active_tags(&self) -> TagMask {
        self.tagsets[self.seltags]
    }

    /// The index of the selected layout in the policy's layout list.
    #[inline(always)]
    pub fn layout_idx(&self) -> usize {
        self.layout_idx
    }

    /// The fraction of the usable width given to the master column.
    #[inline(always)]
    pub fn mfact(&self) -> f32 {
        self.mfact
    }

    /// The number of windows in the master column.
    #[inline(always)]
    pub fn nmaster(&self) -> u32 {
        self.nmaster
    }

    /// Updates the monitor's physical geometry, resetting the usable area.
    pub fn set_geometry(&mut self, geom: Rect) {
        self.geom = geom;
        self.usable = geom;
    }

    /// Shrinks the usable area by `px` pixels off the given edge, for a
    /// bar or other exclusive surface.
    pub fn reserve_strut(&mut self, edge: Cardinal, px: u32) {
        self.usable = self.usable.trim(edge, px);
    }

    /// Selects a layout by index.
    pub fn set_layout_idx(&mut self, idx: usize) {
        self.layout_idx = idx;
    }

    /// Sets the master factor, clamped to its legal range.
    pub fn set_mfact(&mut self, mfact: f32) {
        self.mfact = mfact.clamp(MFACT_MIN, MFACT_MAX);
    }

    /// Adjusts the master factor by a delta, clamped to its legal range.
    pub fn inc_mfact(&mut self, delta: f32) {
        self.set_mfact(self.mfact + delta);
    }

    /// Adjusts the master window count, saturating at zero.
    pub fn inc_nmaster(&mut self, delta: i32) {
        self.nmaster = self.nmaster.saturating_add_signed(delta);
    }

    /// Switches the view to the given tag set.
    ///
    /// Writes `mask` into the alternate slot and flips slots, so a second
    /// `view` with an empty mask returns to the previous view. Viewing the
    /// already-active set is a no-op; an empty mask with an empty alternate
    /// slot falls back to the first tag (the active set never rests at
    /// zero).
    pub fn view(&mut self, mask: TagMask) {
        if !mask.is_empty() && mask == self.active_tags() {
            return;
        }
        self.seltags ^= 1;
        if !mask.is_empty() {
            self.tagsets[self.seltags] = mask;
        } else if self.tagsets[self.seltags].is_empty() {
            self.tagsets[self.seltags] = TagMask::single(0);
        }
    }

    /// Toggles the given tags in the active view.
    ///
    /// No-op if the result would leave no tag active.
    pub fn toggle_view(&mut self, mask: TagMask) {
        let next = self.active_tags() ^ mask;
        if !next.is_empty() {
            self.tagsets[self.seltags] = next;
        }
    }

    /// Steps the active tag by `delta`, treating the single active bit as
    /// an index and wrapping around [`TAG_COUNT`].
    ///
    /// Because the step is written through [`view`](Self::view)'s slot
    /// flip, `cycle_tag(d)` followed by `cycle_tag(-d)` restores the
    /// original view. If more than one tag is active the lowest set bit is
    /// used as the index; this is a deterministic fallback, not a defined
    /// multi-tag cycle.
    pub fn cycle_tag(&mut self, delta: isize) {
        let active = self.active_tags();
        let idx = match active.lowest_index() {
            Some(i) => i,
            None => 0,
        };
        if !active.is_single() {
            warn!(
                monitor = %self.name,
                "cycling a multi-tag view, falling back to lowest tag {}",
                idx + 1
            );
        }

        let next = (idx as isize + delta).rem_euclid(TAG_COUNT as isize) as u32;

        let alt = self.seltags ^ 1;
        self.tagsets[alt] = TagMask::single(next);
        self.seltags = alt;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::KeyData;

    fn mon() -> Monitor {
        Monitor::new(
            MonitorId::from(KeyData::from_ffi(1)),
            "HDMI-A-1",
            Rect::new(0, 0, 1920, 1080),
        )
    }

    #[test]
    fn cycle_is_its_own_undo() {
        for start in 0..TAG_COUNT {
            for delta in [-23isize, -9, -4, -1, 1, 2, 9, 17] {
                let mut m = mon();
                m.view(TagMask::single(start));
                let before = m.active_tags();

                m.cycle_tag(delta);
                m.cycle_tag(-delta);

                assert_eq!(m.active_tags(), before, "start {start} delta {delta}");
            }
        }
    }

    #[test]
    fn cycle_wraps_around() {
        let mut m = mon();
        m.view(TagMask::single(TAG_COUNT - 1));

        m.cycle_tag(1);
        assert_eq!(m.active_tags(), TagMask::single(0));

        m.cycle_tag(-1);
        assert_eq!(m.active_tags(), TagMask::single(TAG_COUNT - 1));
    }

    #[test]
    fn cycle_multi_tag_uses_lowest_bit() {
        let mut m = mon();
        m.view(TagMask::single(2) | TagMask::single(5));

        m.cycle_tag(1);
        assert_eq!(m.active_tags(), TagMask::single(3));
    }

    #[test]
    fn view_empty_flips_back() {
        let mut m = mon();
        m.view(TagMask::single(4));
        assert_eq!(m.active_tags(), TagMask::single(4));

        m.view(TagMask::empty());
        assert_eq!(m.active_tags(), TagMask::single(0));

        m.view(TagMask::empty());
        assert_eq!(m.active_tags(), TagMask::single(4));
    }

    #[test]
    fn toggle_view_refuses_empty_result() {
        let mut m = mon();
        assert_eq!(m.active_tags(), TagMask::single(0));

        m.toggle_view(TagMask::single(0));
        // would be empty, refused
        assert_eq!(m.active_tags(), TagMask::single(0));

        m.toggle_view(TagMask::single(1));
        assert_eq!(m.active_tags(), TagMask::single(0) | TagMask::single(1));
    }

    #[test]
    fn strut_reservation_shrinks_usable_only() {
        let mut m = mon();
        m.reserve_strut(Cardinal::Up, 24);

        assert_eq!(m.usable(), Rect::new(0, 24, 1920, 1056));
        assert_eq!(m.geometry(), Rect::new(0, 0, 1920, 1080));
    }
}
