//! Named one-shot timers.
//!
//! State managers never sleep; they arm named deadlines here and the
//! runtime polls [`TimerSet::next_deadline`] to decide how long it may
//! park. Arming an already-armed name replaces its deadline, so a timer
//! can never fire twice for one logical schedule.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Instant;

#[derive(Debug)]
pub struct TimerSet<K> {
    deadlines: HashMap<K, Instant>,
}

impl<K> Default for TimerSet<K> {
    fn default() -> Self {
        TimerSet {
            deadlines: HashMap::new(),
        }
    }
}

impl<K: Copy + Eq + Hash + Ord> TimerSet<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms `key` to fire at `at`, replacing any existing deadline.
    pub fn arm(&mut self, key: K, at: Instant) {
        self.deadlines.insert(key, at);
    }

    /// Cancels `key`; returns whether it was armed.
    pub fn cancel(&mut self, key: K) -> bool {
        self.deadlines.remove(&key).is_some()
    }

    pub fn is_armed(&self, key: K) -> bool {
        self.deadlines.contains_key(&key)
    }

    pub fn deadline(&self, key: K) -> Option<Instant> {
        self.deadlines.get(&key).copied()
    }

    /// Earliest armed deadline, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadlines.values().min().copied()
    }

    /// Removes and returns every timer due at `now`, earliest first.
    pub fn take_due(&mut self, now: Instant) -> Vec<K> {
        let mut due: Vec<(K, Instant)> = self
            .deadlines
            .iter()
            .filter(|(_, at)| **at <= now)
            .map(|(key, at)| (*key, *at))
            .collect();
        due.sort_by_key(|(key, at)| (*at, *key));
        for (key, _) in &due {
            self.deadlines.remove(key);
        }
        due.into_iter().map(|(key, _)| key).collect()
    }

    /// Drops every armed timer.
    pub fn clear(&mut self) {
        self.deadlines.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    enum Name {
        A,
        B,
        C,
    }

    #[test]
    fn test_arm_replaces_deadline() {
        let now = Instant::now();
        let mut timers = TimerSet::new();
        timers.arm(Name::A, now + Duration::from_secs(1));
        timers.arm(Name::A, now + Duration::from_secs(5));
        assert_eq!(timers.deadline(Name::A), Some(now + Duration::from_secs(5)));
        assert!(timers.take_due(now + Duration::from_secs(2)).is_empty());
    }

    #[test]
    fn test_take_due_fires_earliest_first() {
        let now = Instant::now();
        let mut timers = TimerSet::new();
        timers.arm(Name::B, now + Duration::from_millis(20));
        timers.arm(Name::A, now + Duration::from_millis(10));
        timers.arm(Name::C, now + Duration::from_millis(999));

        let due = timers.take_due(now + Duration::from_millis(50));
        assert_eq!(due, vec![Name::A, Name::B]);
        assert!(timers.is_armed(Name::C));
        assert!(!timers.is_armed(Name::A));
    }

    #[test]
    fn test_next_deadline_is_minimum() {
        let now = Instant::now();
        let mut timers = TimerSet::new();
        assert_eq!(timers.next_deadline(), None);
        timers.arm(Name::A, now + Duration::from_secs(3));
        timers.arm(Name::B, now + Duration::from_secs(1));
        assert_eq!(timers.next_deadline(), Some(now + Duration::from_secs(1)));
    }

    #[test]
    fn test_cancel_and_clear() {
        let now = Instant::now();
        let mut timers = TimerSet::new();
        timers.arm(Name::A, now);
        timers.arm(Name::B, now);
        assert!(timers.cancel(Name::A));
        assert!(!timers.cancel(Name::A));
        timers.clear();
        assert!(timers.is_empty());
        assert!(timers.take_due(now + Duration::from_secs(1)).is_empty());
    }
}
