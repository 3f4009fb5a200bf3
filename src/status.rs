//! The status-bar channel.
//!
//! The core pushes a structured snapshot of every monitor to the bar on
//! every state change; the bar is a pure consumer and never touches core
//! state. Requests the bar wants to make (view a tag, focus a monitor)
//! travel back on a separate command channel and are serviced by the
//! host's event loop like any other input.

use crossbeam_channel::{unbounded, Receiver, Sender, TrySendError};
use tracing::debug;

use crate::bindings::Action;
use crate::core::tags::TagMask;

/// One window as presented to the status bar.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClientInfo {
    /// The window's title.
    pub title: String,
    /// Whether the window floats.
    pub floating: bool,
    /// Whether the window is urgent.
    pub urgent: bool,
    /// Whether the window is currently visible.
    pub visible: bool,
    /// Whether the window holds input focus.
    pub focused: bool,
}

/// The per-monitor state pushed to the bar.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MonitorSnapshot {
    /// The monitor's output name.
    pub monitor: String,
    /// Whether this monitor is the selected one.
    pub selected: bool,
    /// The monitor's active tag set.
    pub active_tags: TagMask,
    /// The union of tags occupied by any window on the monitor.
    pub occupied_tags: TagMask,
    /// The union of tags holding an urgent window.
    pub urgent_tags: TagMask,
    /// The symbol of the monitor's selected layout.
    pub layout_symbol: String,
    /// The monitor's windows, in tiling order.
    pub clients: Vec<ClientInfo>,
}

/// A request issued by the bar back to the core.
#[derive(Debug, Clone, PartialEq)]
pub struct BarCommand {
    /// The output name the command targets, or `None` for the selected
    /// monitor.
    pub monitor: Option<String>,
    /// What the bar wants done.
    pub action: Action,
}

/// The push side of the status channel, held by the host.
#[derive(Debug, Clone)]
pub struct StatusBarChannel {
    tx: Sender<Vec<MonitorSnapshot>>,
}

impl StatusBarChannel {
    /// Creates the channel, returning the push side and the consumer
    /// side.
    pub fn new() -> (Self, Receiver<Vec<MonitorSnapshot>>) {
        let (tx, rx) = unbounded();
        (Self { tx }, rx)
    }

    /// Pushes a fresh set of snapshots to the bar.
    ///
    /// A disconnected bar is not an error; the push is simply dropped.
    pub fn publish(&self, snapshots: Vec<MonitorSnapshot>) {
        match self.tx.try_send(snapshots) {
            Ok(()) => {}
            Err(TrySendError::Disconnected(_)) => {
                debug!("status bar consumer is gone, dropping snapshot");
            }
            Err(TrySendError::Full(_)) => unreachable!("status channel is unbounded"),
        }
    }
}

/// Creates the bar command channel: the bar keeps the sender, the host
/// drains the receiver.
pub fn command_channel() -> (Sender<BarCommand>, Receiver<BarCommand>) {
    unbounded()
}
