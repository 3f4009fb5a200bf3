//! A named-signal event bus for cross-process notifications.
//!
//! The bus is a minimal pub/sub surface: callers register callbacks under
//! signal names, and each publish delivers the payload to every callback
//! registered under that name, at most once per publish. Tatami itself
//! publishes the signals in [`signal`]; transports that carry them across
//! process boundaries subscribe here.

use custom_debug_derive::Debug;
use indexmap::IndexMap;
use tracing::debug;

/// Signal names published by the core.
pub mod signal {
    /// The selected layout changed; payload is the new layout symbol.
    pub const LAYOUT_CHANGED: &str = "layout-changed";
    /// A window asked to be closed; payload is its surface handle.
    pub const WINDOW_CLOSE_REQUEST: &str = "window-close-request";
    /// A virtual-terminal switch was requested; payload is the VT number.
    pub const VT_SWITCH: &str = "vt-switch";
    /// A policy finished loading; payload is the artifact path.
    pub const POLICY_LOADED: &str = "policy-loaded";
    /// The active policy was unloaded; empty payload.
    pub const POLICY_UNLOADED: &str = "policy-unloaded";
}

type Callback = Box<dyn Fn(&str) + Send>;

/// A registry of named signals and their subscribers.
#[derive(Debug, Default)]
pub struct EventBus {
    #[debug(skip)]
    signals: IndexMap<String, Vec<Callback>>,
}

impl EventBus {
    /// Creates an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a callback under the given signal name.
    pub fn subscribe<S, F>(&mut self, name: S, callback: F)
    where
        S: Into<String>,
        F: Fn(&str) + Send + 'static,
    {
        self.signals
            .entry(name.into())
            .or_default()
            .push(Box::new(callback));
    }

    /// Drops every callback registered under the given name.
    pub fn unsubscribe_all(&mut self, name: &str) {
        self.signals.shift_remove(name);
    }

    /// Delivers `payload` to every callback registered under `name`,
    /// each at most once. Returns the number of callbacks invoked.
    pub fn publish(&self, name: &str, payload: &str) -> usize {
        let Some(subs) = self.signals.get(name) else {
            debug!(signal = name, "publish with no subscribers");
            return 0;
        };
        for cb in subs {
            cb(payload);
        }
        subs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn each_subscriber_sees_each_publish_once() {
        let mut bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let hits = hits.clone();
            bus.subscribe(signal::LAYOUT_CHANGED, move |payload| {
                assert_eq!(payload, "[]=");
                hits.fetch_add(1, Ordering::SeqCst);
            });
        }

        assert_eq!(bus.publish(signal::LAYOUT_CHANGED, "[]="), 3);
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn signals_are_isolated_by_name() {
        let mut bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let h = hits.clone();
        bus.subscribe(signal::VT_SWITCH, move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });

        bus.publish(signal::LAYOUT_CHANGED, "[M]");
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        bus.publish(signal::VT_SWITCH, "2");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unsubscribe_silences_a_name() {
        let mut bus = EventBus::new();
        bus.subscribe("custom", |_| panic!("should not run"));
        bus.unsubscribe_all("custom");

        assert_eq!(bus.publish("custom", ""), 0);
    }
}
