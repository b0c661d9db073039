//! Transcript id aliases.
//!
//! When a final transcript replaces an interim line the server may have
//! already addressed translations to the superseded id. The alias table
//! remembers `old id -> new id` redirects long enough for stragglers to
//! find their line, then forgets them.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// How long a redirect stays resolvable.
const ALIAS_TTL: Duration = Duration::from_secs(30);

/// Chain walk bound. Protects against redirect cycles.
const MAX_HOPS: usize = 5;

#[derive(Debug, Clone)]
struct AliasEntry {
    new_id: String,
    recorded_at: Instant,
}

#[derive(Debug, Default)]
pub struct AliasTable {
    entries: HashMap<String, AliasEntry>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `old_id -> new_id`. Stale entries are pruned on the way in.
    pub fn record(&mut self, old_id: &str, new_id: &str, now: Instant) {
        if old_id == new_id {
            return;
        }
        self.prune(now);
        self.entries.insert(
            old_id.to_string(),
            AliasEntry {
                new_id: new_id.to_string(),
                recorded_at: now,
            },
        );
    }

    /// Follows redirects from `id` and returns the terminal id.
    ///
    /// Expired entries are not followed, and the walk stops after a fixed
    /// hop count, so a cycle can never hang the caller. An unmapped id
    /// resolves to itself.
    pub fn resolve<'a>(&'a self, id: &'a str, now: Instant) -> &'a str {
        let mut current = id;
        for _ in 0..MAX_HOPS {
            match self.entries.get(current) {
                Some(entry) if now.duration_since(entry.recorded_at) < ALIAS_TTL => {
                    current = &entry.new_id;
                }
                _ => break,
            }
        }
        current
    }

    /// Drops entries older than the redirect TTL.
    pub fn prune(&mut self, now: Instant) {
        self.entries
            .retain(|_, entry| now.duration_since(entry.recorded_at) < ALIAS_TTL);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
