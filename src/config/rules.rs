//! Window and monitor rules for use in a policy.
//!
//! Rules are declarative placement policies matched once. A
//! [`WindowRule`] is applied when a window is first mapped, before its
//! first layout pass; a [`MonitorRule`] is applied when an output
//! connects. Matching is substring-based, the way users actually write
//! rules ("anything with `firefox` in its app id").

use tracing::debug;

use crate::core::tags::TagMask;
use crate::core::window::Window;
use crate::core::Monitor;

/// A declarative placement rule for new windows.
///
/// All populated matchers must hit for the rule to apply; a rule with no
/// matchers applies to every window. Every matching rule applies, in
/// table order, so later rules override the scalar effects of earlier
/// ones.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct WindowRule {
    /// Substring to find in the window's app id.
    pub app_id: Option<String>,
    /// Substring to find in the window's title.
    pub title: Option<String>,

    /// Force the window onto these tags.
    pub tags: Option<TagMask>,
    /// Force the window's floating state.
    pub floating: Option<bool>,
    /// Force the window onto the monitor at this connection index.
    pub monitor: Option<usize>,
    /// Override the window's border width.
    pub border_px: Option<u32>,
}

impl WindowRule {
    /// A rule matching windows whose app id contains `pat`.
    pub fn app_id<S: Into<String>>(pat: S) -> Self {
        Self {
            app_id: Some(pat.into()),
            ..Self::default()
        }
    }

    /// A rule matching windows whose title contains `pat`.
    pub fn title<S: Into<String>>(pat: S) -> Self {
        Self {
            title: Some(pat.into()),
            ..Self::default()
        }
    }

    /// Adds a forced tag set to the rule.
    pub fn with_tags(mut self, tags: TagMask) -> Self {
        self.tags = Some(tags);
        self
    }

    /// Adds a forced floating state to the rule.
    pub fn with_floating(mut self, floating: bool) -> Self {
        self.floating = Some(floating);
        self
    }

    /// Adds a forced monitor index to the rule.
    pub fn with_monitor(mut self, idx: usize) -> Self {
        self.monitor = Some(idx);
        self
    }

    /// Tests whether the rule matches the given identity.
    pub fn matches(&self, app_id: &str, title: &str) -> bool {
        let app_hit = self.app_id.as_deref().map_or(true, |p| app_id.contains(p));
        let title_hit = self.title.as_deref().map_or(true, |p| title.contains(p));
        app_hit && title_hit
    }
}

/// The effects of a rule pass, separate from the window so the host can
/// act on the monitor reassignment.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RuleOutcome {
    /// The monitor index the window was forced to, if any.
    pub monitor: Option<usize>,
}

/// Applies every matching rule to a freshly created window.
///
/// Forced tags replace the window's tags wholesale (an empty forced mask
/// is ignored, since a window must keep at least the chance of being
/// shown). Reapplying the same rules to the same window is idempotent.
pub fn apply_window_rules(rules: &[WindowRule], window: &mut Window) -> RuleOutcome {
    let mut outcome = RuleOutcome::default();

    for rule in rules {
        if !rule.matches(window.app_id(), window.title()) {
            continue;
        }
        debug!(app_id = window.app_id(), ?rule, "window rule matched");

        if let Some(tags) = rule.tags {
            if !tags.is_empty() {
                window.tags = tags;
            }
        }
        if let Some(floating) = rule.floating {
            window.set_floating(floating);
        }
        if let Some(px) = rule.border_px {
            window.set_border_px(px);
        }
        if rule.monitor.is_some() {
            outcome.monitor = rule.monitor;
        }
    }

    outcome
}

/// A declarative setup rule for newly connected outputs.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MonitorRule {
    /// Substring to find in the output name; `None` matches any output.
    pub name: Option<String>,

    /// The layout index to select.
    pub layout: Option<usize>,
    /// The master factor to set.
    pub mfact: Option<f32>,
    /// The master count to set.
    pub nmaster: Option<u32>,
    /// The tag set to view initially.
    pub tags: Option<TagMask>,
}

impl MonitorRule {
    /// A rule matching outputs whose name contains `pat`.
    pub fn named<S: Into<String>>(pat: S) -> Self {
        Self {
            name: Some(pat.into()),
            ..Self::default()
        }
    }

    /// Tests whether the rule matches the given output name.
    pub fn matches(&self, name: &str) -> bool {
        self.name.as_deref().map_or(true, |p| name.contains(p))
    }
}

/// Applies every matching monitor rule, in table order.
pub fn apply_monitor_rules(rules: &[MonitorRule], monitor: &mut Monitor) {
    for rule in rules {
        if !rule.matches(monitor.name()) {
            continue;
        }
        debug!(monitor = monitor.name(), ?rule, "monitor rule matched");

        if let Some(layout) = rule.layout {
            monitor.set_layout_idx(layout);
        }
        if let Some(mfact) = rule.mfact {
            monitor.set_mfact(mfact);
        }
        if let Some(nmaster) = rule.nmaster {
            monitor.inc_nmaster(nmaster as i32 - monitor.nmaster() as i32);
        }
        if let Some(tags) = rule.tags {
            monitor.view(tags);
        }
    }
}
