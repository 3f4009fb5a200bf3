use super::*;

use crate::bindings::keysym::*;
use crate::bindings::{Action, ModMask};
use crate::core::tags::TagMask;
use crate::engine::mock::MockEngine;
use crate::policy::testutil::TestPolicy;

fn output(name: &str, geom: Rect) -> OutputInfo {
    OutputInfo {
        name: name.into(),
        geometry: geom,
    }
}

/// A host with one 1000x800 output and the test policy adopted.
fn fixture() -> Tatami<MockEngine> {
    let engine = MockEngine::with_outputs(vec![output("eDP-1", Rect::new(0, 0, 1000, 800))]);
    let mut wm = Tatami::new(engine, HostConfig::default());
    wm.adopt_policy(Box::new(TestPolicy::new())).unwrap();
    wm
}

fn map(wm: &mut Tatami<MockEngine>, surface: SurfaceHandle) -> WindowId {
    wm.map_window(
        surface,
        &format!("win{surface}"),
        "app",
        Rect::new(0, 0, 400, 300),
    )
    .expect("no monitor to map onto")
}

fn last_snapshot(wm: &Tatami<MockEngine>) -> Vec<MonitorSnapshot> {
    let rx = wm.status_updates();
    let mut last = None;
    while let Ok(snap) = rx.try_recv() {
        last = Some(snap);
    }
    last.expect("no snapshot published")
}

#[test]
fn mapping_focuses_the_new_window() {
    let mut wm = fixture();

    let a = map(&mut wm, 1);
    assert_eq!(wm.focused_window(), Some(a));

    let b = map(&mut wm, 2);
    assert_eq!(wm.focused_window(), Some(b));
    assert_eq!(wm.engine.active, Some(2));
}

#[test]
fn unmap_transfers_focus_to_topmost_visible() {
    let mut wm = fixture();

    let a = map(&mut wm, 1);
    let b = map(&mut wm, 2);
    assert_eq!(wm.focused_window(), Some(b));

    wm.unmap_window(2);
    assert_eq!(wm.focused_window(), Some(a));

    wm.unmap_window(1);
    assert_eq!(wm.focused_window(), None);
    assert_eq!(wm.engine.active, None);
}

#[test]
fn focus_stack_full_wrap_returns_home() {
    let mut wm = fixture();

    let ids: Vec<_> = (1..=4).map(|s| map(&mut wm, s)).collect();
    let original = wm.focused_window().unwrap();
    assert_eq!(original, ids[3]);

    for _ in 0..ids.len() {
        wm.focus_stack(1);
    }
    assert_eq!(wm.focused_window(), Some(original));

    // and backwards too
    for _ in 0..ids.len() {
        wm.focus_stack(-1);
    }
    assert_eq!(wm.focused_window(), Some(original));
}

#[test]
fn master_stack_commits_expected_geometry() {
    let mut wm = fixture();

    let surfaces = [1u64, 2, 3];
    for s in surfaces {
        map(&mut wm, s);
    }
    // the reference arrangement: mfact 0.5, nmaster 1
    wm.inc_mfact(-0.05);

    assert_eq!(wm.engine.committed[&1], Rect::new(0, 0, 500, 800));
    assert_eq!(wm.engine.committed[&2], Rect::new(500, 0, 500, 400));
    assert_eq!(wm.engine.committed[&3], Rect::new(500, 400, 500, 400));
}

#[test]
fn monocle_commits_full_area_for_everyone() {
    let mut wm = fixture();

    for s in 1..=3 {
        map(&mut wm, s);
    }
    // layout 1 in the test policy is Monocle
    wm.set_layout(1);

    for s in 1..=3u64 {
        assert_eq!(wm.engine.committed[&s], Rect::new(0, 0, 1000, 800));
    }
    assert_eq!(last_snapshot(&wm)[0].layout_symbol, "[M]");
}

#[test]
fn zoom_promotes_focused_to_master() {
    let mut wm = fixture();

    for s in 1..=3 {
        map(&mut wm, s);
    }
    wm.inc_mfact(-0.05);
    // surface 3 is focused but last in tiling order; master is surface 1
    assert_eq!(wm.engine.committed[&1], Rect::new(0, 0, 500, 800));

    wm.zoom();
    assert_eq!(wm.engine.committed[&3], Rect::new(0, 0, 500, 800));
}

#[test]
fn swap_stack_exchanges_tiling_positions() {
    let mut wm = fixture();

    let a = map(&mut wm, 1);
    let _b = map(&mut wm, 2);
    let c = map(&mut wm, 3);

    // focused is c (tail); swapping forward wraps to the head window a
    wm.swap_stack(1);

    let order: Vec<_> = wm.registry().tiling_order().collect();
    assert_eq!(order[0], c);
    assert_eq!(order[2], a);
}

#[test]
fn failed_commit_keeps_previous_geometry() {
    let mut wm = fixture();

    wm.engine.failing.push(7);
    let id = map(&mut wm, 7);

    // the commit failed, so the model retains the mapped geometry
    assert_eq!(wm.registry().get(id).unwrap().geometry(), Rect::new(0, 0, 400, 300));
    assert!(!wm.engine.committed.contains_key(&7));

    // once the engine recovers, the next pass repairs it
    wm.engine.failing.clear();
    wm.arrange(wm.selected_monitor_id().unwrap());
    assert_eq!(wm.engine.committed[&7], Rect::new(0, 0, 1000, 800));
}

#[test]
fn view_change_refocuses_and_rearranges() {
    let mut wm = fixture();

    let a = map(&mut wm, 1);
    wm.view(TagMask::single(3));
    // nothing visible on the new tag
    assert_eq!(wm.focused_window(), None);

    wm.view(TagMask::single(0));
    assert_eq!(wm.focused_window(), Some(a));
}

#[test]
fn cycle_tag_round_trip_through_dispatch() {
    let mut wm = fixture();

    map(&mut wm, 1);
    let before = last_snapshot(&wm)[0].active_tags;

    wm.dispatch(&Action::CycleTag(2));
    wm.dispatch(&Action::CycleTag(-2));

    assert_eq!(last_snapshot(&wm)[0].active_tags, before);
}

#[test]
fn retagging_moves_window_out_of_view() {
    let mut wm = fixture();

    let a = map(&mut wm, 1);
    let b = map(&mut wm, 2);

    wm.tag(TagMask::single(5));
    // b left the view; focus falls back to a
    assert_eq!(wm.focused_window(), Some(a));
    assert_eq!(
        wm.registry().get(b).unwrap().tags(),
        TagMask::single(5)
    );

    // an empty mask is refused
    wm.tag(TagMask::empty());
    assert_eq!(wm.registry().get(a).unwrap().tags(), TagMask::single(0));
}

#[test]
fn host_binding_beats_policy_and_fires() {
    let mut wm = fixture();

    assert!(wm.handle_key(
        ModMask::CONTROL | ModMask::MOD1 | ModMask::SHIFT,
        XK_BACKSPACE
    ));
    assert!(!wm.running());
}

#[test]
fn policy_bindings_resolve_until_load_fails_then_still_resolve() {
    let mut wm = fixture();

    map(&mut wm, 1);
    map(&mut wm, 2);

    assert!(wm.handle_key(ModMask::MOD4, XK_J));

    // a failed artifact load must not disturb the active table
    assert!(wm
        .load_policy(std::path::Path::new("/nope/policy.so"))
        .is_err());
    assert!(wm.handle_key(ModMask::MOD4, XK_J));

    // unknown chords report unhandled so the key goes to the client
    assert!(!wm.handle_key(ModMask::MOD4, XK_T));
}

#[test]
fn unloading_policy_empties_bindings_but_keeps_windows() {
    let mut wm = fixture();

    let a = map(&mut wm, 1);
    wm.unload_policy();

    assert!(!wm.handle_key(ModMask::MOD4, XK_J));
    assert!(wm.registry().contains(a));
    assert_eq!(wm.focused_window(), Some(a));
}

#[test]
fn output_disconnect_reassigns_windows() {
    let engine = MockEngine::with_outputs(vec![
        output("eDP-1", Rect::new(0, 0, 1000, 800)),
        output("HDMI-A-1", Rect::new(1000, 0, 1920, 1080)),
    ]);
    let mut wm = Tatami::new(engine, HostConfig::default());
    wm.adopt_policy(Box::new(TestPolicy::new())).unwrap();

    let a = map(&mut wm, 1);
    wm.dispatch(&Action::SendToMonitor(1));
    let hdmi = wm.registry().get(a).unwrap().monitor();
    assert_ne!(Some(hdmi), wm.selected_monitor_id());

    wm.output_disconnected("HDMI-A-1");

    // the window came back to the surviving monitor, which is selected
    let survivor = wm.selected_monitor_id().unwrap();
    assert_eq!(wm.registry().get(a).unwrap().monitor(), survivor);
    assert_eq!(wm.monitor(survivor).unwrap().name(), "eDP-1");
}

#[test]
fn focus_monitor_selects_topmost_there() {
    let engine = MockEngine::with_outputs(vec![
        output("eDP-1", Rect::new(0, 0, 1000, 800)),
        output("HDMI-A-1", Rect::new(1000, 0, 1920, 1080)),
    ]);
    let mut wm = Tatami::new(engine, HostConfig::default());
    wm.adopt_policy(Box::new(TestPolicy::new())).unwrap();

    let a = map(&mut wm, 1);
    wm.focus_monitor(1);
    // the second monitor is empty
    assert_eq!(wm.focused_window(), None);

    let b = map(&mut wm, 2);
    assert_eq!(wm.registry().get(b).unwrap().monitor(), wm.selected_monitor_id().unwrap());

    wm.focus_monitor(1);
    assert_eq!(wm.focused_window(), Some(a));
}

#[test]
fn snapshots_carry_tags_clients_and_urgency() {
    let mut wm = fixture();

    let _a = map(&mut wm, 1);
    map(&mut wm, 2);
    wm.tag(TagMask::single(4));
    wm.set_urgent(1, true);

    let snaps = last_snapshot(&wm);
    assert_eq!(snaps.len(), 1);
    let snap = &snaps[0];

    assert!(snap.selected);
    assert_eq!(snap.monitor, "eDP-1");
    assert_eq!(snap.active_tags, TagMask::single(0));
    assert_eq!(
        snap.occupied_tags,
        TagMask::single(0) | TagMask::single(4)
    );
    assert_eq!(snap.urgent_tags, TagMask::single(0));
    assert_eq!(snap.layout_symbol, "[]=");

    assert_eq!(snap.clients.len(), 2);
    assert!(snap.clients[0].urgent);
    assert!(snap.clients[0].visible);
    assert!(!snap.clients[1].visible);
}

#[test]
fn bar_commands_are_serviced_on_the_main_thread() {
    let mut wm = fixture();

    let a = map(&mut wm, 1);
    let bar = wm.bar_commands();

    bar.send(BarCommand {
        monitor: Some("eDP-1".into()),
        action: Action::View(TagMask::single(2)),
    })
    .unwrap();
    wm.process_pending();

    assert_eq!(last_snapshot(&wm)[0].active_tags, TagMask::single(2));
    assert_eq!(wm.focused_window(), None);
    let _ = a;
}

#[test]
fn worker_requests_route_through_the_host_channel() {
    let mut wm = fixture();

    map(&mut wm, 1);
    let handle = wm.host_handle();

    // what a policy worker would do from its own thread
    handle.request(Action::ToggleView(TagMask::single(6)));
    handle.refresh_status();
    wm.process_pending();

    assert_eq!(
        last_snapshot(&wm)[0].active_tags,
        TagMask::single(0) | TagMask::single(6)
    );
}

#[test]
fn toggle_floating_restores_previous_geometry() {
    let mut wm = fixture();

    let id = map(&mut wm, 1);
    // tiled now: the layout gave it the full usable area
    assert_eq!(wm.registry().get(id).unwrap().geometry(), Rect::new(0, 0, 1000, 800));

    wm.toggle_floating();
    let w = wm.registry().get(id).unwrap();
    assert!(w.is_floating());
    // floats back out at its original mapped size
    assert_eq!(w.geometry(), Rect::new(0, 0, 400, 300));
}

#[test]
fn fullscreen_covers_the_whole_output() {
    let mut wm = fixture();

    let id = map(&mut wm, 1);
    wm.toggle_fullscreen();

    assert_eq!(wm.engine.committed[&1], Rect::new(0, 0, 1000, 800));
    assert!(wm.registry().get(id).unwrap().is_fullscreen());

    wm.toggle_fullscreen();
    assert!(!wm.registry().get(id).unwrap().is_fullscreen());
}

#[test]
fn close_request_goes_over_the_bus() {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    let mut wm = fixture();
    let seen = Arc::new(AtomicU64::new(0));

    let s = seen.clone();
    wm.bus_mut()
        .subscribe(signal::WINDOW_CLOSE_REQUEST, move |payload| {
            s.store(payload.parse().unwrap(), Ordering::SeqCst);
        });

    map(&mut wm, 42);
    wm.dispatch(&Action::CloseWindow);

    assert_eq!(seen.load(Ordering::SeqCst), 42);
}
