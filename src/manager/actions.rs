//! Dispatching resolved binding actions onto the window graph.

use tracing::{error, info, warn};

use crate::bindings::Action;
use crate::core::tags::TagMask;
use crate::core::types::Direction;
use crate::core::MonitorId;
use crate::engine::CompositorEngine;
use crate::events::signal;
use crate::layouts::Placement;
use crate::util::spawn::spawn_command;

use super::Tatami;

impl<E: CompositorEngine> Tatami<E> {
    /// Carries out a resolved action.
    pub fn dispatch(&mut self, action: &Action) {
        use Action::*;

        match action {
            FocusStack(d) => self.focus_stack(*d),
            SwapStack(d) => self.swap_stack(*d),
            FocusMonitor(d) => self.focus_monitor(*d),
            SendToMonitor(d) => self.send_to_monitor(*d),
            View(mask) => self.view(*mask),
            ToggleView(mask) => self.toggle_view(*mask),
            Tag(mask) => self.tag(*mask),
            ToggleTag(mask) => self.toggle_tag(*mask),
            CycleTag(d) => self.cycle_tag(*d),
            SetLayout(idx) => self.set_layout(*idx),
            CycleLayout(d) => self.cycle_layout(*d),
            IncMasterFactor(f) => self.inc_mfact(*f),
            IncMasterCount(d) => self.inc_nmaster(*d),
            ToggleFloating => self.toggle_floating(),
            ToggleFullscreen => self.toggle_fullscreen(),
            CloseWindow => self.close_window(),
            Zoom => self.zoom(),
            Spawn(argv) => {
                if let Err(e) = spawn_command(argv) {
                    error!("{e}");
                }
            }
            ReloadPolicy => {
                if let Err(e) = self.reload_policy() {
                    error!("policy reload failed: {e}");
                }
            }
            SwitchVt(vt) => {
                self.bus.publish(signal::VT_SWITCH, &vt.to_string());
            }
            Quit => {
                info!("quit requested");
                self.running = false;
            }
        }
    }

    //* View operations on the selected monitor *//

    /// Views the given tag set on the selected monitor.
    pub fn view(&mut self, mask: TagMask) {
        let Some(mon) = self.selected_monitor_id() else {
            return;
        };
        self.monitors[mon].view(mask);
        self.after_view_change(mon);
    }

    /// Toggles tags in the selected monitor's view.
    pub fn toggle_view(&mut self, mask: TagMask) {
        let Some(mon) = self.selected_monitor_id() else {
            return;
        };
        self.monitors[mon].toggle_view(mask);
        self.after_view_change(mon);
    }

    /// Steps the selected monitor's active tag by `delta`.
    pub fn cycle_tag(&mut self, delta: isize) {
        let Some(mon) = self.selected_monitor_id() else {
            return;
        };
        self.monitors[mon].cycle_tag(delta);
        self.after_view_change(mon);
    }

    fn after_view_change(&mut self, mon: MonitorId) {
        self.refocus(mon);
        self.arrange(mon);
        self.publish_status();
    }

    //* Tag operations on the focused window *//

    /// Retags the focused window. An empty mask is refused; a window's
    /// tags never collapse to nothing.
    pub fn tag(&mut self, mask: TagMask) {
        let Some(id) = self.focused else {
            return;
        };
        let mask = mask & TagMask::ALL;
        if mask.is_empty() {
            warn!("refusing to clear a window's tags");
            return;
        }
        let window = self.registry.get_mut(id).unwrap();
        window.tags = mask;
        let mon = window.monitor();
        self.after_view_change(mon);
    }

    /// Toggles tags on the focused window, refusing an empty result.
    pub fn toggle_tag(&mut self, mask: TagMask) {
        let Some(id) = self.focused else {
            return;
        };
        let window = self.registry.get_mut(id).unwrap();
        let next = window.tags() ^ mask;
        if next.is_empty() {
            warn!("refusing to clear a window's tags");
            return;
        }
        window.tags = next;
        let mon = window.monitor();
        self.after_view_change(mon);
    }

    //* Stack operations *//

    /// Swaps the focused window with the next visible one in tiling
    /// order. No-op with fewer than two visible windows.
    pub fn swap_stack(&mut self, delta: isize) {
        let Some(id) = self.focused else {
            return;
        };
        let Some(window) = self.registry.get(id) else {
            return;
        };
        let mon_id = window.monitor();
        let mon = self.monitors[mon_id].clone();

        if let Some(other) = self
            .registry
            .next_visible(id, Direction::from_delta(delta), &mon)
        {
            self.registry.swap(id, other).expect("both ids are tracked");
            self.arrange(mon_id);
            self.publish_status();
        }
    }

    /// Moves the focused window to the head of the tiling order (the
    /// master slot under a master-stack layout).
    pub fn zoom(&mut self) {
        let Some(id) = self.focused else {
            return;
        };
        let Some(window) = self.registry.get(id) else {
            return;
        };
        let mon = window.monitor();

        self.registry.restack(id, None).expect("focused id is tracked");
        self.arrange(mon);
        self.publish_status();
    }

    /// Sends the focused window to the monitor `delta` steps away in the
    /// monitor order.
    pub fn send_to_monitor(&mut self, delta: isize) {
        let Some(id) = self.focused else {
            return;
        };
        if self.monitor_order.len() <= 1 || delta == 0 {
            return;
        }

        let sel_idx = self
            .monitor_order
            .focused_idx()
            .expect("monitor ring cannot be empty here");
        let mut idx = sel_idx;
        for _ in 0..delta.unsigned_abs() {
            idx = self
                .monitor_order
                .next_idx_wrapping(idx, Direction::from_delta(delta));
        }
        let target = self.monitor_order[idx];

        let window = self.registry.get_mut(id).unwrap();
        let source = window.monitor();
        if source == target {
            return;
        }
        window.monitor = target;

        self.arrange(source);
        self.arrange(target);
        self.refocus(source);
        self.publish_status();
    }

    //* Layout operations on the selected monitor *//

    /// Selects a layout by index on the selected monitor.
    pub fn set_layout(&mut self, idx: usize) {
        let count = self.policy.layouts().len();
        if count == 0 {
            warn!("no layouts loaded, ignoring layout selection");
            return;
        }
        let Some(mon) = self.selected_monitor_id() else {
            return;
        };

        self.monitors[mon].set_layout_idx(idx.min(count - 1));
        self.arrange(mon);
        self.publish_status();

        let symbol = self.layout_symbol(&self.monitors[mon]).to_owned();
        self.bus.publish(signal::LAYOUT_CHANGED, &symbol);
    }

    /// Steps through the layout list on the selected monitor.
    pub fn cycle_layout(&mut self, delta: isize) {
        let count = self.policy.layouts().len();
        if count == 0 {
            return;
        }
        let Some(mon) = self.selected_monitor_id() else {
            return;
        };

        let cur = self.monitors[mon].layout_idx() as isize;
        let next = (cur + delta).rem_euclid(count as isize) as usize;
        self.set_layout(next);
    }

    /// Adjusts the selected monitor's master factor.
    pub fn inc_mfact(&mut self, delta: f32) {
        let Some(mon) = self.selected_monitor_id() else {
            return;
        };
        self.monitors[mon].inc_mfact(delta);
        self.arrange(mon);
        self.publish_status();
    }

    /// Adjusts the selected monitor's master count.
    pub fn inc_nmaster(&mut self, delta: i32) {
        let Some(mon) = self.selected_monitor_id() else {
            return;
        };
        self.monitors[mon].inc_nmaster(delta);
        self.arrange(mon);
        self.publish_status();
    }

    //* Window state toggles *//

    /// Toggles the focused window between floating and tiled.
    pub fn toggle_floating(&mut self) {
        let Some(id) = self.focused else {
            return;
        };
        let window = self.registry.get_mut(id).unwrap();
        let mon = window.monitor();

        if window.is_floating() {
            // back under layout; remember where it floated
            window.remember_geometry();
            window.set_floating(false);
        } else {
            let restored = window.previous_geometry();
            window.set_floating(true);
            self.commit(Placement { id, geom: restored });
        }

        self.arrange(mon);
        self.publish_status();
    }

    /// Toggles the focused window's fullscreen state.
    pub fn toggle_fullscreen(&mut self) {
        let Some(id) = self.focused else {
            return;
        };
        let window = self.registry.get_mut(id).unwrap();
        let mon = window.monitor();

        if window.is_fullscreen() {
            let restored = window.previous_geometry();
            window.set_fullscreen(false);
            self.commit(Placement { id, geom: restored });
        } else {
            window.remember_geometry();
            window.set_fullscreen(true);
        }

        self.arrange(mon);
        self.publish_status();
    }

    /// Asks the focused window to close, via the bus; the protocol
    /// adapter owns the actual close request.
    pub fn close_window(&mut self) {
        let Some(id) = self.focused else {
            return;
        };
        let surface = self.registry.get(id).unwrap().surface();
        self.bus
            .publish(signal::WINDOW_CLOSE_REQUEST, &surface.to_string());
    }
}
