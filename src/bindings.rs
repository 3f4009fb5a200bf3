//! Types for creating and resolving key and mouse bindings.
//!
//! Two binding tables exist at runtime: the host's fixed table, which
//! must keep working even with no policy loaded (virtual-terminal
//! switching, quitting), and the loaded policy's table. [`resolve`]
//! merges the two: the host table is scanned first and its first match
//! wins; otherwise every matching policy binding fires, so overlapping
//! policy bindings are supported.

use bitflags::bitflags;
use strum::EnumIter;
use thiserror::Error;

use crate::core::tags::TagMask;
use crate::TatamiError;

/// Keysyms as delivered by the input adapter.
pub mod keysym {
    /// A keysym, using the X11/xkbcommon value space.
    pub type Keysym = u32;

    #[allow(missing_docs)]
    pub const XK_BACKSPACE: Keysym = 0xff08;
    #[allow(missing_docs)]
    pub const XK_RETURN: Keysym = 0xff0d;
    #[allow(missing_docs)]
    pub const XK_SPACE: Keysym = 0x0020;
    #[allow(missing_docs)]
    pub const XK_TAB: Keysym = 0xff09;
    #[allow(missing_docs)]
    pub const XK_F1: Keysym = 0xffbe;
    #[allow(missing_docs)]
    pub const XK_F2: Keysym = 0xffbf;
    #[allow(missing_docs)]
    pub const XK_F3: Keysym = 0xffc0;
    #[allow(missing_docs)]
    pub const XK_1: Keysym = 0x0031;
    #[allow(missing_docs)]
    pub const XK_F: Keysym = 0x0066;
    #[allow(missing_docs)]
    pub const XK_H: Keysym = 0x0068;
    #[allow(missing_docs)]
    pub const XK_J: Keysym = 0x006a;
    #[allow(missing_docs)]
    pub const XK_K: Keysym = 0x006b;
    #[allow(missing_docs)]
    pub const XK_L: Keysym = 0x006c;
    #[allow(missing_docs)]
    pub const XK_M: Keysym = 0x006d;
    #[allow(missing_docs)]
    pub const XK_Q: Keysym = 0x0071;
    #[allow(missing_docs)]
    pub const XK_T: Keysym = 0x0074;
}

pub use keysym::Keysym;

bitflags! {
    /// Bitmask representing one or a combination of modifier keys.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ModMask: u16 {
        /// The Shift key.
        const SHIFT   = 1 << 0;
        /// The Capslock state.
        const LOCK    = 1 << 1;
        /// The Control key.
        const CONTROL = 1 << 2;
        /// The Alt key.
        const MOD1    = 1 << 3;
        /// The Numlock state.
        const MOD2    = 1 << 4;
        /// The Super/Meta key.
        const MOD4    = 1 << 6;
    }
}

/// Lock-state modifiers masked out before bindings are compared, so a
/// binding fires regardless of capslock or numlock.
pub const IGNORED_MODS: ModMask = ModMask::LOCK.union(ModMask::MOD2);

impl ModMask {
    /// Strips the lock-state modifiers for comparison.
    pub fn normalized(self) -> ModMask {
        self.difference(IGNORED_MODS)
    }
}

/// A modifier key tied to a binding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter)]
pub enum ModKey {
    /// The Ctrl key.
    Ctrl,
    /// The Alt key.
    Alt,
    /// The Shift key.
    Shift,
    /// The Super/Meta key.
    Meta,
}

#[doc(hidden)]
impl From<Vec<ModKey>> for ModMask {
    fn from(from: Vec<ModKey>) -> ModMask {
        from.into_iter().fold(ModMask::empty(), |acc, n| match n {
            ModKey::Ctrl => acc | ModMask::CONTROL,
            ModKey::Alt => acc | ModMask::MOD1,
            ModKey::Shift => acc | ModMask::SHIFT,
            ModKey::Meta => acc | ModMask::MOD4,
        })
    }
}

/// A mouse button tied to a mousebind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter)]
pub enum ButtonIndex {
    /// The left mouse button.
    Left,
    /// The middle mouse button.
    Middle,
    /// The right mouse button.
    Right,
    /// Scroll up.
    ScrollUp,
    /// Scroll down.
    ScrollDown,
}

/// Something a binding can do to the window manager.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Move focus through the visible stack.
    FocusStack(isize),
    /// Swap the focused window through the visible stack.
    SwapStack(isize),
    /// Move the selected-monitor pointer.
    FocusMonitor(isize),
    /// Send the focused window to another monitor.
    SendToMonitor(isize),
    /// View the given tags.
    View(TagMask),
    /// Toggle the given tags in the view.
    ToggleView(TagMask),
    /// Retag the focused window.
    Tag(TagMask),
    /// Toggle tags on the focused window.
    ToggleTag(TagMask),
    /// Step the active tag by a delta.
    CycleTag(isize),
    /// Select a layout by index.
    SetLayout(usize),
    /// Step through the layout list.
    CycleLayout(isize),
    /// Adjust the master factor.
    IncMasterFactor(f32),
    /// Adjust the master window count.
    IncMasterCount(i32),
    /// Toggle the focused window's floating state.
    ToggleFloating,
    /// Toggle the focused window's fullscreen state.
    ToggleFullscreen,
    /// Ask the focused window to close.
    CloseWindow,
    /// Move the focused window to the head of the tiling order.
    Zoom,
    /// Spawn an external command.
    Spawn(Vec<String>),
    /// Reload the active policy from its artifact.
    ReloadPolicy,
    /// Switch to the given virtual terminal.
    SwitchVt(u32),
    /// Shut the window manager down.
    Quit,
}

/// A keybind that can be resolved against a key event.
#[derive(Debug, Clone, PartialEq)]
pub struct Keybind {
    /// The modifiers that must be held.
    pub mods: ModMask,
    /// The keysym that must be pressed.
    pub keysym: Keysym,
    /// What to do when the binding fires.
    pub action: Action,
}

impl Keybind {
    /// Creates a new keybind.
    pub fn new<M: Into<ModMask>>(mods: M, keysym: Keysym, action: Action) -> Self {
        Self {
            mods: mods.into(),
            keysym,
            action,
        }
    }

    /// Tests whether this binding matches the given event, ignoring lock
    /// state.
    pub fn matches(&self, mods: ModMask, keysym: Keysym) -> bool {
        self.mods.normalized() == mods.normalized() && self.keysym == keysym
    }
}

/// A mouse binding that can be resolved against a button event.
#[derive(Debug, Clone, PartialEq)]
pub struct Mousebind {
    /// The modifiers that must be held.
    pub mods: ModMask,
    /// The button that must be pressed.
    pub button: ButtonIndex,
    /// What to do when the binding fires.
    pub action: Action,
}

impl Mousebind {
    /// Creates a new mousebind.
    pub fn new<M: Into<ModMask>>(mods: M, button: ButtonIndex, action: Action) -> Self {
        Self {
            mods: mods.into(),
            button,
            action,
        }
    }

    /// Tests whether this binding matches the given event, ignoring lock
    /// state.
    pub fn matches(&self, mods: ModMask, button: ButtonIndex) -> bool {
        self.mods.normalized() == mods.normalized() && self.button == button
    }
}

/// Convenience function for constructing a keybind.
pub fn kb(mods: Vec<ModKey>, keysym: Keysym, action: Action) -> Keybind {
    Keybind::new(mods, keysym, action)
}

/// The outcome of resolving a key event against the binding tables.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// The actions to carry out, in table order.
    pub actions: Vec<Action>,
}

impl Resolution {
    /// Whether any binding fired. Callers forward the event to the
    /// focused client when nothing did.
    pub fn handled(&self) -> bool {
        !self.actions.is_empty()
    }
}

/// Resolves a key event against the host table and then the policy table.
///
/// The host table is scanned first and its first match wins outright; the
/// policy table is only consulted if the host table stayed silent, and
/// there *every* matching entry fires, in order.
pub fn resolve(
    host: &[Keybind],
    policy: &[Keybind],
    mods: ModMask,
    keysym: Keysym,
) -> Resolution {
    if let Some(bind) = host.iter().find(|b| b.matches(mods, keysym)) {
        return Resolution {
            actions: vec![bind.action.clone()],
        };
    }

    Resolution {
        actions: policy
            .iter()
            .filter(|b| b.matches(mods, keysym))
            .map(|b| b.action.clone())
            .collect(),
    }
}

/// Resolves a button event against the policy's mousebinds.
///
/// Mousebinds only come from the policy; as with keybinds, every
/// matching entry fires.
pub fn resolve_button(policy: &[Mousebind], mods: ModMask, button: ButtonIndex) -> Resolution {
    Resolution {
        actions: policy
            .iter()
            .filter(|b| b.matches(mods, button))
            .map(|b| b.action.clone())
            .collect(),
    }
}

/// An error raised while processing bindings.
#[derive(Debug, Clone, Error)]
pub enum BindingError {
    /// A binding specification was invalid for some reason.
    #[error("invalid binding: {0}")]
    InvalidBinding(String),
}

impl From<BindingError> for TatamiError {
    fn from(f: BindingError) -> TatamiError {
        TatamiError::Bindings(f)
    }
}

#[cfg(test)]
mod tests {
    use super::keysym::*;
    use super::*;

    fn host_table() -> Vec<Keybind> {
        vec![
            kb(vec![ModKey::Ctrl, ModKey::Alt], XK_F1, Action::SwitchVt(1)),
            kb(vec![ModKey::Meta, ModKey::Shift], XK_Q, Action::Quit),
        ]
    }

    fn policy_table() -> Vec<Keybind> {
        vec![
            kb(vec![ModKey::Meta], XK_J, Action::FocusStack(1)),
            kb(vec![ModKey::Meta], XK_K, Action::FocusStack(-1)),
            // overlapping binding: same chord, second effect
            kb(vec![ModKey::Meta], XK_J, Action::CycleLayout(1)),
            kb(
                vec![ModKey::Meta, ModKey::Shift],
                XK_Q,
                Action::CloseWindow,
            ),
        ]
    }

    #[test]
    fn host_table_wins_first_match() {
        let res = resolve(
            &host_table(),
            &policy_table(),
            ModMask::MOD4 | ModMask::SHIFT,
            XK_Q,
        );

        assert_eq!(res.actions, vec![Action::Quit]);
    }

    #[test]
    fn all_matching_policy_bindings_fire() {
        let res = resolve(&host_table(), &policy_table(), ModMask::MOD4, XK_J);

        assert_eq!(
            res.actions,
            vec![Action::FocusStack(1), Action::CycleLayout(1)]
        );
    }

    #[test]
    fn lock_state_is_ignored() {
        let res = resolve(
            &host_table(),
            &policy_table(),
            ModMask::MOD4 | ModMask::LOCK | ModMask::MOD2,
            XK_K,
        );

        assert!(res.handled());
        assert_eq!(res.actions, vec![Action::FocusStack(-1)]);
    }

    #[test]
    fn unmatched_event_is_unhandled() {
        let res = resolve(&host_table(), &policy_table(), ModMask::CONTROL, XK_SPACE);
        assert!(!res.handled());
    }

    #[test]
    fn empty_policy_still_resolves_host() {
        let res = resolve(&host_table(), &[], ModMask::CONTROL | ModMask::MOD1, XK_F1);
        assert_eq!(res.actions, vec![Action::SwitchVt(1)]);
    }

    #[test]
    fn button_resolution_matches_all() {
        let binds = vec![
            Mousebind::new(vec![ModKey::Meta], ButtonIndex::Left, Action::Zoom),
            Mousebind::new(vec![ModKey::Meta], ButtonIndex::Right, Action::ToggleFloating),
        ];

        let res = resolve_button(&binds, ModMask::MOD4, ButtonIndex::Left);
        assert_eq!(res.actions, vec![Action::Zoom]);
    }
}
