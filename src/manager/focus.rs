//! Focus coordination.
//!
//! Focus moves for three reasons: a window went away, the view changed,
//! or the user walked the stack or the monitors. In every case the rule
//! is the same - the most recently focused *visible* window on the
//! relevant monitor gets focus, or nobody does. Walking the stack with
//! [`Tatami::focus_stack`] deliberately does not reorder the focus list,
//! so a full walk visits every visible window before coming home.

use tracing::debug;

use crate::core::types::{BorderStyle, Direction};
use crate::core::window::WindowId;
use crate::core::MonitorId;
use crate::engine::CompositorEngine;

use super::Tatami;

impl<E: CompositorEngine> Tatami<E> {
    /// Gives input focus to `target`, or clears focus on `None`.
    ///
    /// Handles the engine side effects: borders are restyled and the
    /// engine's keyboard activation follows. When `promote` is set, the
    /// newly focused window moves to the head of the focus order; stack
    /// walks pass `false` so the order stays put.
    pub(crate) fn set_focus(&mut self, target: Option<WindowId>, promote: bool) {
        if self.focused == target {
            return;
        }

        if let Some(old) = self.focused.take() {
            if let Some(w) = self.registry.get(old) {
                let style = if w.is_urgent() {
                    BorderStyle::Urgent
                } else {
                    BorderStyle::Unfocused
                };
                let surface = w.surface();
                self.engine
                    .set_border_color(surface, self.config.style.border_color(style));
                self.engine.activate_surface(surface, false);
            }
        }

        if let Some(id) = target {
            let Some(w) = self.registry.get(id) else {
                debug!(?id, "refusing to focus untracked window");
                return;
            };
            let surface = w.surface();
            self.engine.set_border_color(
                surface,
                self.config.style.border_color(BorderStyle::Focused),
            );
            self.engine.activate_surface(surface, true);
            if promote {
                self.registry.promote_focus(id);
            }
        }

        self.focused = target;
    }

    /// Focuses the most recently focused visible window on `mon`, or
    /// clears focus if the monitor shows nothing.
    pub(crate) fn refocus(&mut self, mon: MonitorId) {
        let target = self
            .monitors
            .get(mon)
            .and_then(|m| self.registry.topmost_visible(m));
        self.set_focus(target, true);
    }

    /// Explicitly focuses a window (pointer entry, bar click), selecting
    /// its monitor along the way.
    pub fn focus_window(&mut self, id: WindowId) {
        let Some(window) = self.registry.get(id) else {
            return;
        };
        let mon = window.monitor();

        if self.selected_monitor_id() != Some(mon) {
            if let Some(idx) = self.monitor_order.index_of(&mon) {
                self.monitor_order.set_focused(idx);
            }
        }

        self.set_focus(Some(id), true);
        self.publish_status();
    }

    /// Walks focus through the visible windows on the selected monitor,
    /// wrapping at the ends of the focus order.
    ///
    /// No-op with fewer than two visible windows. The focus order is not
    /// reordered by the walk, so calling this N times on a monitor with N
    /// visible windows returns focus to where it started.
    pub fn focus_stack(&mut self, delta: isize) {
        if delta == 0 {
            return;
        }
        let Some(mon_id) = self.selected_monitor_id() else {
            return;
        };

        let current = match self.focused {
            Some(id) if self.registry.contains(id) => id,
            _ => {
                // nothing focused; land on the topmost visible window
                self.refocus(mon_id);
                return;
            }
        };

        let mon = self.monitors[mon_id].clone();
        if let Some(next) =
            self.registry
                .cycle_focus_order(current, Direction::from_delta(delta), &mon)
        {
            self.set_focus(Some(next), false);
        }
    }

    /// Moves the selected-monitor pointer by `delta` and focuses the
    /// topmost visible window there.
    pub fn focus_monitor(&mut self, delta: isize) {
        if self.monitor_order.len() <= 1 || delta == 0 {
            return;
        }

        let dir = Direction::from_delta(delta);
        for _ in 0..delta.unsigned_abs() {
            self.monitor_order.cycle_focus(dir);
        }

        let mon = self
            .selected_monitor_id()
            .expect("monitor ring cannot be empty here");
        debug!(monitor = %self.monitors[mon].name(), "selected monitor changed");

        self.refocus(mon);
        self.publish_status();
    }
}
