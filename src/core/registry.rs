//! The client registry: the arena of managed windows and the two
//! orderings over them.
//!
//! Every managed window lives in a slotmap arena and is referred to by
//! its [`WindowId`]. Two orderings are maintained over the arena:
//!
//! - the **tiling order** (a [`Ring`]), which determines master/stack
//!   placement and is what "move window in stack" operations permute;
//! - the **focus order** (most-recently-focused first), which is what
//!   picks the next focus target when a window goes away.
//!
//! Every tracked window appears exactly once in each ordering. Breaking
//! that invariant is a caller programming error and is treated as fatal,
//! since a corrupted ordering cannot be safely continued past.

use slotmap::SlotMap;
use tracing::debug;

use crate::core::monitor::{Monitor, MonitorId};
use crate::core::ring::Ring;
use crate::core::tags::TagMask;
use crate::core::types::Direction;
use crate::core::window::{Window, WindowId};
use crate::engine::SurfaceHandle;
use crate::{Result, TatamiError};

/// The arena of managed windows plus their tiling and focus orders.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    windows: SlotMap<WindowId, Window>,
    tiling: Ring<WindowId>,
    focus: Vec<WindowId>,
}

impl ClientRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of managed windows.
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    /// Tests whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Tests whether `id` refers to a tracked window.
    pub fn contains(&self, id: WindowId) -> bool {
        self.windows.contains_key(id)
    }

    /// A reference to the window behind `id`.
    pub fn get(&self, id: WindowId) -> Option<&Window> {
        self.windows.get(id)
    }

    /// A mutable reference to the window behind `id`.
    pub fn get_mut(&mut self, id: WindowId) -> Option<&mut Window> {
        self.windows.get_mut(id)
    }

    /// Looks up a window by its engine surface.
    pub fn find_by_surface(&self, surface: SurfaceHandle) -> Option<WindowId> {
        self.windows
            .iter()
            .find(|(_, w)| w.surface() == surface)
            .map(|(id, _)| id)
    }

    /// An iterator over all tracked windows, in arena order.
    pub fn iter(&self) -> impl Iterator<Item = (WindowId, &Window)> {
        self.windows.iter()
    }

    /// The tiling order, head to tail.
    pub fn tiling_order(&self) -> impl Iterator<Item = WindowId> + '_ {
        self.tiling.iter().copied()
    }

    /// The focus order, most recently focused first.
    pub fn focus_order(&self) -> impl Iterator<Item = WindowId> + '_ {
        self.focus.iter().copied()
    }

    /// Inserts a window, appending it to the tail of the tiling order and
    /// the head of the focus order.
    pub fn insert(&mut self, window: Window) -> WindowId {
        assert!(
            self.find_by_surface(window.surface()).is_none(),
            "surface {} is already managed",
            window.surface()
        );

        let id = self.windows.insert(window);
        self.tiling.append(id);
        self.focus.insert(0, id);

        debug!(?id, "inserted window");
        id
    }

    /// Removes a window, unlinking it from both orders in the same step.
    ///
    /// Returns the window, or `None` if `id` was not tracked.
    pub fn remove(&mut self, id: WindowId) -> Option<Window> {
        let window = self.windows.remove(id)?;

        let unlinked = self.tiling.remove_item(&id);
        assert!(unlinked.is_some(), "window {id:?} missing from tiling order");

        let pos = self.focus.iter().position(|w| *w == id);
        assert!(pos.is_some(), "window {id:?} missing from focus order");
        self.focus.remove(pos.unwrap());

        debug!(?id, "removed window");
        Some(window)
    }

    /// Moves `id` to a new position in the tiling order without touching
    /// the focus order.
    ///
    /// The window is placed immediately after `after`, or at the head of
    /// the order when `after` is `None`. Errors if either id is untracked.
    pub fn restack(&mut self, id: WindowId, after: Option<WindowId>) -> Result<()> {
        let from = self
            .tiling
            .index_of(&id)
            .ok_or(TatamiError::UnknownClient(id))?;

        let to = match after {
            None => 0,
            Some(anchor) => {
                let idx = self
                    .tiling
                    .index_of(&anchor)
                    .ok_or(TatamiError::UnknownClient(anchor))?;
                if from > idx {
                    idx + 1
                } else {
                    idx
                }
            }
        };

        self.tiling.move_to(from, to);
        Ok(())
    }

    /// Exchanges the tiling positions of two windows.
    pub fn swap(&mut self, a: WindowId, b: WindowId) -> Result<()> {
        let ia = self
            .tiling
            .index_of(&a)
            .ok_or(TatamiError::UnknownClient(a))?;
        let ib = self
            .tiling
            .index_of(&b)
            .ok_or(TatamiError::UnknownClient(b))?;

        self.tiling.swap(ia, ib);
        Ok(())
    }

    /// Moves `id` to the head of the focus order.
    ///
    /// No-op if `id` is not tracked.
    pub fn promote_focus(&mut self, id: WindowId) {
        if let Some(pos) = self.focus.iter().position(|w| *w == id) {
            let id = self.focus.remove(pos);
            self.focus.insert(0, id);
        }
    }

    /// The most recently focused window visible on the given monitor.
    pub fn topmost_visible(&self, mon: &Monitor) -> Option<WindowId> {
        self.focus
            .iter()
            .copied()
            .find(|id| self.windows[*id].visible_on(mon))
    }

    /// Walks the tiling order from `id` in the given direction, wrapping
    /// at the ends and skipping windows not visible on `mon`.
    ///
    /// Returns `None` when fewer than two visible windows exist, or when
    /// `id` is not in the order.
    pub fn next_visible(
        &self,
        id: WindowId,
        direction: Direction,
        mon: &Monitor,
    ) -> Option<WindowId> {
        let start = self.tiling.index_of(&id)?;

        let mut idx = start;
        loop {
            idx = self.tiling.next_idx_wrapping(idx, direction);
            if idx == start {
                return None;
            }
            let candidate = self.tiling[idx];
            if self.windows[candidate].visible_on(mon) {
                return Some(candidate);
            }
        }
    }

    /// Walks the focus order from `current` in the given direction,
    /// wrapping at the ends and skipping windows not visible on `mon`.
    ///
    /// The order itself is left untouched, so repeated walks cycle
    /// through every visible window before returning to the start.
    pub fn cycle_focus_order(
        &self,
        current: WindowId,
        direction: Direction,
        mon: &Monitor,
    ) -> Option<WindowId> {
        let start = self.focus.iter().position(|w| *w == current)?;
        let len = self.focus.len();

        let mut idx = start;
        loop {
            idx = match direction {
                Direction::Forward => (idx + 1) % len,
                Direction::Backward => (idx + len - 1) % len,
            };
            if idx == start {
                return None;
            }
            let candidate = self.focus[idx];
            if self.windows[candidate].visible_on(mon) {
                return Some(candidate);
            }
        }
    }

    /// The windows visible on `mon`, in tiling order.
    pub fn visible_in_tiling(&self, mon: &Monitor) -> Vec<WindowId> {
        self.tiling
            .iter()
            .copied()
            .filter(|id| self.windows[*id].visible_on(mon))
            .collect()
    }

    /// The union of the tags of every window on the given monitor.
    pub fn occupied_tags(&self, mon: MonitorId) -> TagMask {
        self.windows
            .values()
            .filter(|w| w.monitor() == mon)
            .fold(TagMask::empty(), |acc, w| acc | w.tags())
    }

    /// The union of the tags of every urgent window on the given monitor.
    pub fn urgent_tags(&self, mon: MonitorId) -> TagMask {
        self.windows
            .values()
            .filter(|w| w.monitor() == mon && w.is_urgent())
            .fold(TagMask::empty(), |acc, w| acc | w.tags())
    }

    /// Reassigns every window whose monitor fails the `alive` check to
    /// `to`, returning how many windows moved. Used when an output
    /// reconnects after windows were stranded.
    pub fn reassign_orphans(
        &mut self,
        alive: impl Fn(MonitorId) -> bool,
        to: MonitorId,
    ) -> usize {
        let mut moved = 0;
        for window in self.windows.values_mut() {
            if !alive(window.monitor()) {
                window.monitor = to;
                moved += 1;
            }
        }
        moved
    }

    /// Reassigns every window on `from` to `to`, returning how many
    /// windows moved. Used when an output disconnects.
    pub fn reassign_monitor(&mut self, from: MonitorId, to: MonitorId) -> usize {
        let mut moved = 0;
        for window in self.windows.values_mut() {
            if window.monitor() == from {
                window.monitor = to;
                moved += 1;
            }
        }
        moved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Rect;
    use crate::types::Direction::*;

    use slotmap::SlotMap;

    fn monitor() -> (SlotMap<MonitorId, Monitor>, MonitorId) {
        let mut mons = SlotMap::with_key();
        let id = mons.insert_with_key(|k| Monitor::new(k, "eDP-1", Rect::new(0, 0, 1000, 800)));
        (mons, id)
    }

    fn window(surface: SurfaceHandle, mon: MonitorId) -> Window {
        Window::new(
            surface,
            format!("win{surface}"),
            "app",
            mon,
            TagMask::single(0),
            Rect::new(0, 0, 100, 100),
        )
    }

    #[test]
    fn orders_stay_consistent_over_churn() {
        let (_, mon) = monitor();
        let mut reg = ClientRegistry::new();

        let mut ids = Vec::new();
        for s in 0..8 {
            ids.push(reg.insert(window(s, mon)));
        }
        reg.remove(ids[3]);
        reg.remove(ids[0]);
        ids.push(reg.insert(window(100, mon)));
        reg.remove(ids[7]);

        // every tracked window appears exactly once in each order
        for (id, _) in reg.iter() {
            assert_eq!(reg.tiling_order().filter(|w| *w == id).count(), 1);
            assert_eq!(reg.focus_order().filter(|w| *w == id).count(), 1);
        }
        // and each order has no orphans
        assert_eq!(reg.tiling_order().count(), reg.len());
        assert_eq!(reg.focus_order().count(), reg.len());
    }

    #[test]
    fn insert_appends_tiling_and_heads_focus() {
        let (_, mon) = monitor();
        let mut reg = ClientRegistry::new();

        let a = reg.insert(window(1, mon));
        let b = reg.insert(window(2, mon));
        let c = reg.insert(window(3, mon));

        assert_eq!(reg.tiling_order().collect::<Vec<_>>(), vec![a, b, c]);
        assert_eq!(reg.focus_order().collect::<Vec<_>>(), vec![c, b, a]);
    }

    #[test]
    fn restack_moves_tiling_only() {
        let (_, mon) = monitor();
        let mut reg = ClientRegistry::new();

        let a = reg.insert(window(1, mon));
        let b = reg.insert(window(2, mon));
        let c = reg.insert(window(3, mon));

        reg.restack(c, None).unwrap();
        assert_eq!(reg.tiling_order().collect::<Vec<_>>(), vec![c, a, b]);

        reg.restack(c, Some(b)).unwrap();
        assert_eq!(reg.tiling_order().collect::<Vec<_>>(), vec![a, b, c]);

        // focus order untouched throughout
        assert_eq!(reg.focus_order().collect::<Vec<_>>(), vec![c, b, a]);
    }

    #[test]
    fn restack_errors_on_unknown_anchor() {
        let (_, mon) = monitor();
        let mut reg = ClientRegistry::new();

        let a = reg.insert(window(1, mon));
        let stranger = reg.insert(window(2, mon));
        reg.remove(stranger);

        assert!(matches!(
            reg.restack(a, Some(stranger)),
            Err(TatamiError::UnknownClient(_))
        ));
    }

    #[test]
    fn topmost_visible_respects_tags_and_monitor() {
        let (mut mons, mon) = monitor();
        let other = mons.insert_with_key(|k| Monitor::new(k, "HDMI-A-1", Rect::new(1000, 0, 1000, 800)));

        let mut reg = ClientRegistry::new();
        let a = reg.insert(window(1, mon));
        let b = reg.insert(window(2, mon));
        let c = reg.insert(window(3, other));

        // most recently focused on `mon` is b (focus order: c, b, a)
        assert_eq!(reg.topmost_visible(&mons[mon]), Some(b));
        assert_eq!(reg.topmost_visible(&mons[other]), Some(c));

        // hide b on another tag
        reg.get_mut(b).unwrap().tags = TagMask::single(4);
        assert_eq!(reg.topmost_visible(&mons[mon]), Some(a));

        reg.get_mut(a).unwrap().tags = TagMask::single(4);
        assert_eq!(reg.topmost_visible(&mons[mon]), None);
    }

    #[test]
    fn next_visible_wraps_and_skips() {
        let (mut mons, mon) = monitor();
        let mut reg = ClientRegistry::new();

        let a = reg.insert(window(1, mon));
        let b = reg.insert(window(2, mon));
        let c = reg.insert(window(3, mon));

        // hide the middle window
        reg.get_mut(b).unwrap().tags = TagMask::single(4);

        let m = mons.get_mut(mon).unwrap().clone();
        assert_eq!(reg.next_visible(a, Forward, &m), Some(c));
        assert_eq!(reg.next_visible(c, Forward, &m), Some(a));
        assert_eq!(reg.next_visible(a, Backward, &m), Some(c));
    }

    #[test]
    fn next_visible_is_none_with_one_visible() {
        let (mons, mon) = monitor();
        let mut reg = ClientRegistry::new();

        let a = reg.insert(window(1, mon));
        assert_eq!(reg.next_visible(a, Forward, &mons[mon]), None);
    }

    #[test]
    fn cycle_focus_order_leaves_order_untouched() {
        let (mons, mon) = monitor();
        let mut reg = ClientRegistry::new();

        let a = reg.insert(window(1, mon));
        let b = reg.insert(window(2, mon));
        let c = reg.insert(window(3, mon));
        // focus order: [c, b, a]

        let next = reg.cycle_focus_order(c, Forward, &mons[mon]).unwrap();
        assert_eq!(next, b);
        let next = reg.cycle_focus_order(next, Forward, &mons[mon]).unwrap();
        assert_eq!(next, a);
        let next = reg.cycle_focus_order(next, Forward, &mons[mon]).unwrap();
        assert_eq!(next, c);

        assert_eq!(reg.focus_order().collect::<Vec<_>>(), vec![c, b, a]);
    }

    #[test]
    fn reassignment_moves_all_windows() {
        let (mut mons, mon) = monitor();
        let other = mons.insert_with_key(|k| Monitor::new(k, "DP-1", Rect::new(1000, 0, 1000, 800)));

        let mut reg = ClientRegistry::new();
        reg.insert(window(1, mon));
        reg.insert(window(2, mon));
        reg.insert(window(3, other));

        assert_eq!(reg.reassign_monitor(mon, other), 2);
        assert!(reg.iter().all(|(_, w)| w.monitor() == other));
    }

    #[test]
    #[should_panic(expected = "already managed")]
    fn double_insert_is_fatal() {
        let (_, mon) = monitor();
        let mut reg = ClientRegistry::new();

        reg.insert(window(1, mon));
        reg.insert(window(1, mon));
    }
}
