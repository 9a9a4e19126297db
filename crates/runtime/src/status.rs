use std::collections::VecDeque;

use foundation::time::Time;

/// Default time a status message stays visible.
pub const DEFAULT_STATUS_SECS: f64 = 5.0;

/// Number of past messages kept for inspection.
pub const STATUS_HISTORY_LIMIT: usize = 64;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Severity {
    Success,
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Success => "success",
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusMessage {
    pub severity: Severity,
    pub text: String,
    pub shown_at: Time,
}

/// Single-slot, auto-dismissing notification.
///
/// Only the latest message is ever visible; a new message replaces the
/// previous one and restarts the dismissal timer. The most recent
/// [`STATUS_HISTORY_LIMIT`] messages are also kept so headless callers can
/// inspect what was shown; older ones are dropped.
#[derive(Debug)]
pub struct StatusSlot {
    visible_for_s: f64,
    current: Option<StatusMessage>,
    history: VecDeque<StatusMessage>,
}

impl Default for StatusSlot {
    fn default() -> Self {
        Self::new(DEFAULT_STATUS_SECS)
    }
}

impl StatusSlot {
    pub fn new(visible_for_s: f64) -> Self {
        Self {
            visible_for_s,
            current: None,
            history: VecDeque::with_capacity(STATUS_HISTORY_LIMIT),
        }
    }

    pub fn show(&mut self, severity: Severity, text: impl Into<String>, now: Time) {
        let msg = StatusMessage {
            severity,
            text: text.into(),
            shown_at: now,
        };
        if self.history.len() == STATUS_HISTORY_LIMIT {
            self.history.pop_front();
        }
        self.history.push_back(msg.clone());
        self.current = Some(msg);
    }

    /// The message on screen at `now`, if it has not been dismissed yet.
    pub fn visible(&self, now: Time) -> Option<&StatusMessage> {
        self.current
            .as_ref()
            .filter(|m| now.since(m.shown_at) < self.visible_for_s)
    }

    /// Latest message regardless of dismissal.
    pub fn latest(&self) -> Option<&StatusMessage> {
        self.current.as_ref()
    }

    /// Retained messages, oldest first.
    pub fn history(&self) -> impl ExactSizeIterator<Item = &StatusMessage> + '_ {
        self.history.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::{STATUS_HISTORY_LIMIT, Severity, StatusSlot};
    use foundation::time::Time;

    #[test]
    fn only_latest_is_visible() {
        let mut slot = StatusSlot::new(5.0);
        slot.show(Severity::Warning, "loading", Time(0.0));
        slot.show(Severity::Success, "done", Time(1.0));
        let m = slot.visible(Time(1.5)).unwrap();
        assert_eq!(m.severity, Severity::Success);
        assert_eq!(m.text, "done");
        assert_eq!(slot.history().len(), 2);
    }

    #[test]
    fn dismisses_after_duration() {
        let mut slot = StatusSlot::new(5.0);
        slot.show(Severity::Info, "hi", Time(10.0));
        assert!(slot.visible(Time(14.9)).is_some());
        assert!(slot.visible(Time(15.0)).is_none());
        assert!(slot.latest().is_some());
    }

    #[test]
    fn new_message_restarts_timer() {
        let mut slot = StatusSlot::new(5.0);
        slot.show(Severity::Info, "a", Time(0.0));
        slot.show(Severity::Error, "b", Time(4.0));
        assert_eq!(slot.visible(Time(8.0)).unwrap().text, "b");
    }

    #[test]
    fn history_keeps_only_the_most_recent_messages() {
        let mut slot = StatusSlot::default();
        for i in 0..STATUS_HISTORY_LIMIT * 3 {
            slot.show(Severity::Info, format!("msg {i}"), Time(i as f64));
        }
        assert_eq!(slot.history().len(), STATUS_HISTORY_LIMIT);
        let oldest = slot.history().next().unwrap();
        assert_eq!(oldest.text, format!("msg {}", STATUS_HISTORY_LIMIT * 2));
        let newest = slot.history().last().unwrap();
        assert_eq!(newest.text, format!("msg {}", STATUS_HISTORY_LIMIT * 3 - 1));
        assert_eq!(slot.latest(), Some(newest));
    }
}
