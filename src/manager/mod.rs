//! The window manager host.
//!
//! [`Tatami`] owns the window registry, the monitors, the active policy
//! and the collaborator channels, and is driven by an engine adapter
//! calling its event entry points (`map_window`, `unmap_window`,
//! `handle_key`, `output_connected`, ...). Every entry point runs on the
//! engine's event-loop thread; nothing here is shared mutably across
//! threads.

mod actions;
mod focus;

use std::path::Path;

use crossbeam_channel::{Receiver, Sender};
use custom_debug_derive::Debug;
use slotmap::SlotMap;
use tracing::{debug, info, warn};

use crate::bindings::{self, ButtonIndex, Keysym, ModMask};
use crate::config::rules::{apply_monitor_rules, apply_window_rules};
use crate::config::{HostConfig, InputPrefs};
use crate::core::monitor::{Monitor, MonitorId};
use crate::core::registry::ClientRegistry;
use crate::core::ring::Ring;
use crate::core::types::{BorderStyle, Rect};
use crate::core::window::{Window, WindowId};
use crate::engine::{CompositorEngine, OutputInfo, SurfaceHandle};
use crate::events::{signal, EventBus};
use crate::layouts::{Floating, Layout, LayoutCtxt, LayoutItem, Placement};
use crate::policy::{
    ActivePolicy, HostHandle, HostRequest, MonitorSummary, PolicyModule,
};
use crate::status::{self, BarCommand, ClientInfo, MonitorSnapshot, StatusBarChannel};
use crate::Result;

/// The main window manager object that receives and responds to events.
///
/// `Tatami` is generic over the [`CompositorEngine`] that renders for it.
/// Construction enumerates the engine's outputs; afterwards the embedding
/// adapter feeds events in and the policy decides what they mean.
#[derive(Debug)]
pub struct Tatami<E: CompositorEngine> {
    #[debug(skip)]
    engine: E,
    config: HostConfig,

    registry: ClientRegistry,
    monitors: SlotMap<MonitorId, Monitor>,
    /// Monitor ordering; the focused element is the selected monitor.
    monitor_order: Ring<MonitorId>,

    policy: ActivePolicy,
    host: HostHandle,
    requests: Receiver<HostRequest>,

    status: StatusBarChannel,
    status_rx: Receiver<Vec<MonitorSnapshot>>,
    bar_tx: Sender<BarCommand>,
    bar_rx: Receiver<BarCommand>,

    bus: EventBus,

    /// The null layout used when the policy supplies none.
    #[debug(skip)]
    fallback_layout: Box<dyn Layout>,

    pub(crate) focused: Option<WindowId>,
    running: bool,
}

impl<E: CompositorEngine> Tatami<E> {
    /// Constructs a new Tatami host over the given engine, adopting the
    /// outputs the engine already knows about.
    pub fn new(engine: E, config: HostConfig) -> Self {
        let (host, requests) = HostHandle::new();
        let (status, status_rx) = StatusBarChannel::new();
        let (bar_tx, bar_rx) = status::command_channel();

        let mut wm = Self {
            engine,
            config,
            registry: ClientRegistry::new(),
            monitors: SlotMap::with_key(),
            monitor_order: Ring::new(),
            policy: ActivePolicy::default(),
            host,
            requests,
            status,
            status_rx,
            bar_tx,
            bar_rx,
            bus: EventBus::new(),
            fallback_layout: Box::new(Floating),
            focused: None,
            running: true,
        };

        for output in wm.engine.enumerate_outputs() {
            wm.output_connected(output);
        }

        wm
    }

    //* Accessors *//

    /// Whether the manager is still running.
    pub fn running(&self) -> bool {
        self.running
    }

    /// The selected monitor's id, if any monitor is connected.
    pub fn selected_monitor_id(&self) -> Option<MonitorId> {
        self.monitor_order.focused().copied()
    }

    /// The window currently holding input focus.
    pub fn focused_window(&self) -> Option<WindowId> {
        self.focused
    }

    /// The window registry.
    pub fn registry(&self) -> &ClientRegistry {
        &self.registry
    }

    /// The monitor behind `id`.
    pub fn monitor(&self, id: MonitorId) -> Option<&Monitor> {
        self.monitors.get(id)
    }

    /// The event bus, for subscribing transports.
    pub fn bus_mut(&mut self) -> &mut EventBus {
        &mut self.bus
    }

    /// A receiver of status snapshots for a bar consumer.
    pub fn status_updates(&self) -> Receiver<Vec<MonitorSnapshot>> {
        self.status_rx.clone()
    }

    /// A sender the bar uses to issue commands back to the core.
    pub fn bar_commands(&self) -> Sender<BarCommand> {
        self.bar_tx.clone()
    }

    /// The callback table handed to policies and their workers.
    pub fn host_handle(&self) -> HostHandle {
        self.host.clone()
    }

    /// The active policy's input-device preferences.
    pub fn input_prefs(&self) -> InputPrefs {
        self.policy.input()
    }

    //* Policy lifecycle *//

    /// Loads a policy from an artifact, replacing the current one only on
    /// success.
    pub fn load_policy(&mut self, path: &Path) -> Result<()> {
        let host = self.host.clone();
        self.policy.load(path, &host)?;
        self.after_policy_change(Some(path));
        Ok(())
    }

    /// Adopts an in-process policy module (a compiled-in configuration).
    pub fn adopt_policy(&mut self, module: Box<dyn PolicyModule>) -> Result<()> {
        let host = self.host.clone();
        self.policy.adopt(module, &host)?;
        self.after_policy_change(None);
        Ok(())
    }

    /// Unloads the active policy. Bindings and layouts degrade to empty;
    /// the window graph is untouched.
    pub fn unload_policy(&mut self) {
        self.policy.unload();
        self.bus.publish(signal::POLICY_UNLOADED, "");
        self.rearrange_all();
        self.publish_status();
    }

    /// Reloads the active policy from its artifact.
    ///
    /// On failure the host keeps running with no policy; the error is
    /// returned for the caller's log.
    pub fn reload_policy(&mut self) -> Result<()> {
        let host = self.host.clone();
        let res = self.policy.reload(&host);
        match res {
            Ok(()) => {
                let path = self.policy.artifact_path().map(Path::to_owned);
                self.after_policy_change(path.as_deref());
                Ok(())
            }
            Err(e) => {
                // reload is unload-then-load; the failed half leaves us
                // vacant but alive
                self.rearrange_all();
                self.publish_status();
                Err(e.into())
            }
        }
    }

    fn after_policy_change(&mut self, path: Option<&Path>) {
        // re-run monitor rules and clamp layout selections against the
        // new layout list
        let layout_count = self.policy.layouts().len();
        for mon_id in self.monitor_order.iter().copied().collect::<Vec<_>>() {
            let Some(mon) = self.monitors.get_mut(mon_id) else {
                continue;
            };
            apply_monitor_rules(self.policy.monitor_rules(), mon);
            if layout_count > 0 && mon.layout_idx() >= layout_count {
                mon.set_layout_idx(layout_count - 1);
            }
        }

        self.rearrange_all();
        if let Some(sel) = self.selected_monitor_id() {
            self.refocus(sel);
        }
        self.publish_status();
        self.bus.publish(
            signal::POLICY_LOADED,
            &path.map(|p| p.display().to_string()).unwrap_or_default(),
        );
    }

    //* Output events *//

    /// Registers a newly connected output.
    pub fn output_connected(&mut self, output: OutputInfo) {
        let id = self
            .monitors
            .insert_with_key(|k| Monitor::new(k, output.name.clone(), output.geometry));

        apply_monitor_rules(self.policy.monitor_rules(), &mut self.monitors[id]);

        self.monitor_order.append(id);
        info!(output = %output.name, "monitor connected");

        // windows stranded by an earlier disconnect come here
        let monitors = &self.monitors;
        let adopted = self
            .registry
            .reassign_orphans(|m| monitors.contains_key(m), id);
        if adopted > 0 {
            info!(count = adopted, "adopted stranded windows");
        }

        self.arrange(id);
        if self.monitor_order.len() == 1 {
            self.refocus(id);
        }
        self.publish_status();
    }

    /// Unregisters a disconnected output, reassigning its windows to the
    /// remaining selected monitor before the monitor is destroyed.
    pub fn output_disconnected(&mut self, name: &str) {
        let Some(id) = self
            .monitors
            .iter()
            .find(|(_, m)| m.name() == name)
            .map(|(id, _)| id)
        else {
            warn!(output = name, "disconnect for unknown output");
            return;
        };

        self.monitor_order.remove_item(&id);
        self.monitors.remove(id);
        info!(output = name, "monitor disconnected");

        if let Some(fallback) = self.selected_monitor_id() {
            let moved = self.registry.reassign_monitor(id, fallback);
            if moved > 0 {
                info!(count = moved, "reassigned windows to fallback monitor");
            }
            self.arrange(fallback);
            self.refocus(fallback);
        } else {
            // last output gone; windows stay stranded until one returns
            self.set_focus(None, false);
        }

        self.publish_status();
    }

    //* Window events *//

    /// Starts managing a newly mapped surface.
    ///
    /// The window lands on the selected monitor's active tags, then the
    /// policy's rules run exactly once, before the first layout pass.
    /// Returns `None` when no monitor is connected.
    pub fn map_window(
        &mut self,
        surface: SurfaceHandle,
        title: &str,
        app_id: &str,
        geom: Rect,
    ) -> Option<WindowId> {
        let sel = self.selected_monitor_id()?;

        let mut window = Window::new(
            surface,
            title,
            app_id,
            sel,
            self.monitors[sel].active_tags(),
            geom,
        );
        window.set_border_px(self.config.style.border_px);

        let outcome = apply_window_rules(self.policy.rules(), &mut window);
        if let Some(idx) = outcome.monitor {
            if let Some(target) = self.monitor_order.get(idx).copied() {
                window.monitor = target;
            } else {
                warn!(idx, "rule names a monitor index that is not connected");
            }
        }

        let target = window.monitor();
        let id = self.registry.insert(window);

        let focus_it = {
            let w = self.registry.get(id).unwrap();
            target == sel && w.visible_on(&self.monitors[target])
        };
        if focus_it {
            self.set_focus(Some(id), true);
        }

        self.arrange(target);
        self.publish_status();
        Some(id)
    }

    /// Stops managing an unmapped surface, unlinking it synchronously
    /// and moving focus to the next visible window.
    pub fn unmap_window(&mut self, surface: SurfaceHandle) {
        let Some(id) = self.registry.find_by_surface(surface) else {
            debug!(surface, "unmap for unmanaged surface");
            return;
        };

        let had_focus = self.focused == Some(id);
        if had_focus {
            // drop focus while the window is still linked, so the engine
            // side effects see a live surface
            self.set_focus(None, false);
        }

        let window = self.registry.remove(id).expect("window vanished mid-unmap");
        let mon = window.monitor();

        if had_focus {
            if let Some(sel) = self.selected_monitor_id() {
                self.refocus(sel);
            }
        }

        self.arrange(mon);
        self.publish_status();
    }

    /// Updates a managed window's title, for the bar.
    pub fn update_title(&mut self, surface: SurfaceHandle, title: &str) {
        if let Some(id) = self.registry.find_by_surface(surface) {
            self.registry.get_mut(id).unwrap().set_title(title);
            self.publish_status();
        }
    }

    /// Sets or clears a managed window's urgency hint.
    pub fn set_urgent(&mut self, surface: SurfaceHandle, urgent: bool) {
        let Some(id) = self.registry.find_by_surface(surface) else {
            return;
        };
        self.registry.get_mut(id).unwrap().set_urgent(urgent);

        if self.focused != Some(id) {
            let style = if urgent {
                BorderStyle::Urgent
            } else {
                BorderStyle::Unfocused
            };
            self.engine
                .set_border_color(surface, self.config.style.border_color(style));
        }
        self.publish_status();
    }

    //* Input events *//

    /// Resolves and dispatches a key event.
    ///
    /// Returns whether any binding fired; the adapter forwards the event
    /// to the focused client otherwise.
    pub fn handle_key(&mut self, mods: ModMask, keysym: Keysym) -> bool {
        let res = bindings::resolve(&self.config.bindings, self.policy.keybinds(), mods, keysym);
        for action in &res.actions {
            self.dispatch(action);
        }
        res.handled()
    }

    /// Resolves and dispatches a button event.
    pub fn handle_button(&mut self, mods: ModMask, button: ButtonIndex) -> bool {
        let res = bindings::resolve_button(self.policy.mousebinds(), mods, button);
        for action in &res.actions {
            self.dispatch(action);
        }
        res.handled()
    }

    //* Channel servicing *//

    /// Drains pending policy-worker requests and bar commands.
    ///
    /// The embedding event loop calls this whenever either channel is
    /// readable; requests mutate state here, on the main thread.
    pub fn process_pending(&mut self) {
        while let Ok(req) = self.requests.try_recv() {
            match req {
                HostRequest::Dispatch(action) => self.dispatch(&action),
                HostRequest::RefreshStatus => self.publish_status(),
            }
        }
        while let Ok(cmd) = self.bar_rx.try_recv() {
            self.handle_bar_command(cmd);
        }
    }

    fn handle_bar_command(&mut self, cmd: BarCommand) {
        if let Some(name) = &cmd.monitor {
            let Some(idx) = self
                .monitor_order
                .position(|id| self.monitors[*id].name() == *name)
            else {
                warn!(monitor = %name, "bar command for unknown monitor");
                return;
            };
            self.monitor_order.set_focused(idx);
        }
        self.dispatch(&cmd.action);
    }

    //* Layout *//

    /// Recomputes and commits the layout on the given monitor.
    pub fn arrange(&mut self, mon_id: MonitorId) {
        let Some(mon) = self.monitors.get(mon_id) else {
            return;
        };
        let usable = mon.usable();
        let full = mon.geometry();
        let active_tags = mon.active_tags();
        let mfact = mon.mfact();
        let nmaster = mon.nmaster();
        let layout_idx = mon.layout_idx();

        let visible = self.registry.visible_in_tiling(mon);

        let mut placements: Vec<Placement> = Vec::with_capacity(visible.len());
        let mut items: Vec<LayoutItem> = Vec::with_capacity(visible.len());
        for id in visible {
            let w = self.registry.get(id).unwrap();
            if w.is_fullscreen() {
                placements.push(Placement { id, geom: full });
            } else {
                items.push(LayoutItem {
                    id,
                    geom: w.geometry(),
                    floating: w.is_floating(),
                });
            }
        }

        let ctxt = LayoutCtxt {
            usable,
            active_tags,
            mfact,
            nmaster,
            windows: &items,
        };
        let layout = self
            .policy
            .layouts()
            .get(layout_idx)
            .unwrap_or(&self.fallback_layout);
        placements.extend(layout.arrange(&ctxt));

        for placement in placements {
            self.commit(placement);
        }
    }

    /// Re-arranges every connected monitor.
    pub fn rearrange_all(&mut self) {
        for mon_id in self.monitor_order.iter().copied().collect::<Vec<_>>() {
            self.arrange(mon_id);
        }
    }

    fn commit(&mut self, placement: Placement) {
        let Some(window) = self.registry.get(placement.id) else {
            return;
        };
        if window.geometry() == placement.geom {
            return;
        }
        let surface = window.surface();

        match self.engine.commit_geometry(surface, placement.geom) {
            Ok(()) => {
                self.registry
                    .get_mut(placement.id)
                    .unwrap()
                    .set_geometry(placement.geom);
            }
            Err(e) => {
                // keep the previous geometry; the next arrange retries
                warn!(surface, "geometry commit failed: {e}");
            }
        }
    }

    //* Status publication *//

    /// The layout symbol shown for a monitor.
    pub fn layout_symbol(&self, mon: &Monitor) -> &str {
        self.policy
            .layouts()
            .get(mon.layout_idx())
            .unwrap_or(&self.fallback_layout)
            .symbol()
    }

    /// Pushes fresh per-monitor snapshots to the bar and updates the
    /// worker-visible selected-monitor summary.
    pub fn publish_status(&self) {
        let sel = self.selected_monitor_id();

        let mut snapshots = Vec::with_capacity(self.monitor_order.len());
        for mon_id in self.monitor_order.iter().copied() {
            let mon = &self.monitors[mon_id];
            let clients = self
                .registry
                .tiling_order()
                .filter(|id| self.registry.get(*id).unwrap().monitor() == mon_id)
                .map(|id| {
                    let w = self.registry.get(id).unwrap();
                    ClientInfo {
                        title: w.title().to_owned(),
                        floating: w.is_floating(),
                        urgent: w.is_urgent(),
                        visible: w.visible_on(mon),
                        focused: self.focused == Some(id),
                    }
                })
                .collect();

            snapshots.push(MonitorSnapshot {
                monitor: mon.name().to_owned(),
                selected: sel == Some(mon_id),
                active_tags: mon.active_tags(),
                occupied_tags: self.registry.occupied_tags(mon_id),
                urgent_tags: self.registry.urgent_tags(mon_id),
                layout_symbol: self.layout_symbol(mon).to_owned(),
                clients,
            });
        }

        if let Some(sel_id) = sel {
            let mon = &self.monitors[sel_id];
            self.host.set_selected(MonitorSummary {
                name: mon.name().to_owned(),
                active_tags: mon.active_tags(),
                layout_symbol: self.layout_symbol(mon).to_owned(),
            });
        }

        self.status.publish(snapshots);
    }
}

#[cfg(test)]
mod tests;
