//! In-process activity cache behind the status surface.

use chrono::{DateTime, Utc};
use fleet_application::ActivityStore;
use fleet_domain::Activity;
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;
use tracing::trace;

/// Bounded, TTL-aware map of agent name to last activity.
///
/// When full, recording a new agent evicts the entry with the oldest
/// activity. Entries older than the TTL are invisible and purged on the next
/// access.
pub struct InMemoryActivityStore {
    capacity: usize,
    ttl: chrono::Duration,
    entries: Mutex<BTreeMap<String, Activity>>,
}

impl InMemoryActivityStore {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            capacity: capacity.max(1),
            ttl: chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX),
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    fn is_fresh(&self, activity: &Activity, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(activity.at) <= self.ttl
    }

    fn purge(&self, entries: &mut BTreeMap<String, Activity>, now: DateTime<Utc>) {
        let before = entries.len();
        entries.retain(|_, activity| self.is_fresh(activity, now));
        if entries.len() < before {
            trace!("Purged {} stale activity entries", before - entries.len());
        }
    }

    pub fn len(&self) -> usize {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        self.purge(&mut entries, Utc::now());
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ActivityStore for InMemoryActivityStore {
    fn record(&self, agent: &str, activity: Activity) {
        let now = Utc::now();
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        self.purge(&mut entries, now);

        if !entries.contains_key(agent) && entries.len() >= self.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, a)| a.at)
                .map(|(name, _)| name.clone());
            if let Some(name) = oldest {
                trace!("Activity cache full; evicting '{}'", name);
                entries.remove(&name);
            }
        }

        if self.is_fresh(&activity, now) {
            entries.insert(agent.to_string(), activity);
        }
    }

    fn latest(&self, agent: &str) -> Option<Activity> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        self.purge(&mut entries, Utc::now());
        entries.get(agent).cloned()
    }

    fn snapshot(&self) -> Vec<(String, Activity)> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        self.purge(&mut entries, Utc::now());
        entries
            .iter()
            .map(|(name, activity)| (name.clone(), activity.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_domain::{FailureCategory, RecoveryAction};

    fn ago(secs: i64) -> DateTime<Utc> {
        Utc::now() - chrono::Duration::seconds(secs)
    }

    #[test]
    fn test_latest_replaces_earlier_activity() {
        let store = InMemoryActivityStore::new(8, Duration::from_secs(3600));
        store.record("crm", Activity::succeeded(ago(30), 100));
        store.record(
            "crm",
            Activity::failed(ago(5), 200, FailureCategory::RateLimit, RecoveryAction::RetryNow),
        );

        let latest = store.latest("crm").unwrap();
        assert_eq!(latest.duration_millis, 200);
        assert_eq!(store.len(), 1);
        assert!(store.latest("ads").is_none());
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let store = InMemoryActivityStore::new(2, Duration::from_secs(3600));
        store.record("a", Activity::succeeded(ago(30), 1));
        store.record("b", Activity::succeeded(ago(10), 1));
        store.record("c", Activity::succeeded(ago(20), 1));

        let names: Vec<String> = store.snapshot().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["b", "c"]);
    }

    #[test]
    fn test_updating_known_agent_does_not_evict() {
        let store = InMemoryActivityStore::new(2, Duration::from_secs(3600));
        store.record("a", Activity::succeeded(ago(30), 1));
        store.record("b", Activity::succeeded(ago(10), 1));
        store.record("a", Activity::succeeded(ago(1), 2));
        assert_eq!(store.len(), 2);
        assert_eq!(store.latest("b").unwrap().duration_millis, 1);
    }

    #[test]
    fn test_stale_entries_are_invisible() {
        let store = InMemoryActivityStore::new(8, Duration::from_secs(60));
        store.record("old", Activity::succeeded(ago(120), 1));
        store.record("new", Activity::succeeded(ago(1), 1));

        assert!(store.latest("old").is_none());
        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].0, "new");
    }

    #[test]
    fn test_zero_capacity_holds_one() {
        let store = InMemoryActivityStore::new(0, Duration::from_secs(60));
        store.record("a", Activity::succeeded(ago(1), 1));
        store.record("b", Activity::succeeded(ago(0), 1));
        assert_eq!(store.len(), 1);
        assert!(store.latest("b").is_some());
    }
}
