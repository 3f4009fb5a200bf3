//! Host-side configuration and the rule types policies populate.

pub mod rules;

#[doc(inline)]
pub use rules::{MonitorRule, WindowRule};

use crate::bindings::keysym::*;
use crate::bindings::{kb, Action, Keybind, ModKey};
use crate::core::types::{BorderStyle, Color};

/// Input-device preferences carried by a policy table.
///
/// The core does not configure devices itself; these are read by the
/// input adapter when a policy loads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputPrefs {
    /// Key repeat rate, in repeats per second.
    pub repeat_rate: u32,
    /// Delay before key repeat starts, in milliseconds.
    pub repeat_delay: u32,
    /// Whether scrolling is natural (content-follows-finger).
    pub natural_scroll: bool,
    /// Whether tapping a touchpad clicks.
    pub tap_to_click: bool,
}

impl Default for InputPrefs {
    fn default() -> Self {
        Self {
            repeat_rate: 25,
            repeat_delay: 600,
            natural_scroll: false,
            tap_to_click: true,
        }
    }
}

/// Border styling owned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleConfig {
    /// Border width applied to windows without a rule override.
    pub border_px: u32,
    /// Border colour of the focused window.
    pub focused: Color,
    /// Border colour of unfocused windows.
    pub unfocused: Color,
    /// Border colour of urgent windows.
    pub urgent: Color,
}

impl StyleConfig {
    /// The colour associated with a given [`BorderStyle`].
    pub fn border_color(&self, style: BorderStyle) -> Color {
        match style {
            BorderStyle::Focused => self.focused,
            BorderStyle::Unfocused => self.unfocused,
            BorderStyle::Urgent => self.urgent,
        }
    }
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            border_px: 2,
            focused: Color::rgb(0xdd, 0xdd, 0xdd),
            unfocused: Color::rgb(0x55, 0x55, 0x55),
            urgent: Color::rgb(0xdd, 0x00, 0x00),
        }
    }
}

/// The host's own configuration: styling plus the fixed binding table
/// that keeps working with no policy loaded.
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Border styling.
    pub style: StyleConfig,
    /// The fixed binding table, scanned before the policy's.
    pub bindings: Vec<Keybind>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            style: StyleConfig::default(),
            bindings: default_host_bindings(),
        }
    }
}

/// The fixed bindings every host carries: virtual-terminal switching and
/// an emergency quit. These must work even with no policy loaded.
pub fn default_host_bindings() -> Vec<Keybind> {
    let mut binds = vec![kb(
        vec![ModKey::Ctrl, ModKey::Alt, ModKey::Shift],
        XK_BACKSPACE,
        Action::Quit,
    )];
    for (i, sym) in [XK_F1, XK_F2, XK_F3].into_iter().enumerate() {
        binds.push(kb(
            vec![ModKey::Ctrl, ModKey::Alt],
            sym,
            Action::SwitchVt(i as u32 + 1),
        ));
    }
    binds
}
