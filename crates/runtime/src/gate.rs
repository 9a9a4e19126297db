use std::collections::HashMap;
use std::hash::Hash;

/// Proof that a transition was requested at a given generation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
}

#[derive(Debug, Default)]
struct Entry {
    generation: u64,
    desired: bool,
    in_flight: bool,
}

/// Serializes on/off transitions per key.
///
/// Every request bumps the key's generation. A load started under one ticket
/// may only be committed while that ticket is still the latest for the key
/// and the key is still desired; anything else is a late response and must be
/// dropped by the caller.
#[derive(Debug)]
pub struct TransitionGate<K> {
    entries: HashMap<K, Entry>,
}

impl<K> Default for TransitionGate<K> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Clone> TransitionGate<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the latest wanted state for `key` and starts a new generation.
    pub fn request(&mut self, key: &K, desired: bool) -> Ticket {
        let entry = self.entries.entry(key.clone()).or_default();
        entry.generation += 1;
        entry.desired = desired;
        if !desired {
            entry.in_flight = false;
        }
        Ticket {
            generation: entry.generation,
        }
    }

    /// Requests `key` on and marks a load in flight under the new ticket.
    ///
    /// Returns `None` when a load for `key` is already in flight and still
    /// wanted; the caller should wait for it instead of issuing a second one.
    pub fn begin(&mut self, key: &K) -> Option<Ticket> {
        if self.is_in_flight(key) {
            return None;
        }
        let ticket = self.request(key, true);
        if let Some(entry) = self.entries.get_mut(key) {
            entry.in_flight = true;
        }
        Some(ticket)
    }

    pub fn is_current(&self, key: &K, ticket: Ticket) -> bool {
        self.entries
            .get(key)
            .is_some_and(|e| e.desired && e.generation == ticket.generation)
    }

    pub fn is_in_flight(&self, key: &K) -> bool {
        self.entries.get(key).is_some_and(|e| e.in_flight && e.desired)
    }

    /// Closes the in-flight window opened by `begin`.
    ///
    /// Returns `true` when the completion is current and may be committed.
    pub fn finish(&mut self, key: &K, ticket: Ticket) -> bool {
        let current = self.is_current(key, ticket);
        if let Some(entry) = self.entries.get_mut(key) {
            if entry.generation == ticket.generation {
                entry.in_flight = false;
            }
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::TransitionGate;

    #[test]
    fn completion_commits_when_current() {
        let mut gate = TransitionGate::new();
        let t = gate.begin(&"a").unwrap();
        assert!(gate.is_in_flight(&"a"));
        assert!(gate.finish(&"a", t));
        assert!(!gate.is_in_flight(&"a"));
    }

    #[test]
    fn off_request_invalidates_pending_load() {
        let mut gate = TransitionGate::new();
        let t = gate.begin(&"a").unwrap();
        gate.request(&"a", false);
        assert!(!gate.finish(&"a", t));
    }

    #[test]
    fn off_then_on_only_latest_commits() {
        let mut gate = TransitionGate::new();
        let first = gate.begin(&"a").unwrap();
        gate.request(&"a", false);
        let second = gate.begin(&"a").unwrap();
        assert!(!gate.finish(&"a", first));
        assert!(gate.is_in_flight(&"a"));
        assert!(gate.finish(&"a", second));
    }

    #[test]
    fn second_begin_while_in_flight_is_refused() {
        let mut gate = TransitionGate::new();
        assert!(gate.begin(&"a").is_some());
        assert!(gate.begin(&"a").is_none());
        assert!(gate.begin(&"b").is_some());
    }
}
