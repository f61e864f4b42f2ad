//! Activity store port
//!
//! Bounded cache of the last known activity per agent. It feeds the status
//! surface only; execution decisions never read it.

use fleet_domain::Activity;

pub trait ActivityStore: Send + Sync {
    /// Record the latest activity for an agent, replacing any earlier one.
    fn record(&self, agent: &str, activity: Activity);

    /// Latest non-stale activity for an agent.
    fn latest(&self, agent: &str) -> Option<Activity>;

    /// All non-stale entries, sorted by agent name.
    fn snapshot(&self) -> Vec<(String, Activity)>;
}

/// Store that remembers nothing.
pub struct NoActivityStore;

impl ActivityStore for NoActivityStore {
    fn record(&self, _agent: &str, _activity: Activity) {}

    fn latest(&self, _agent: &str) -> Option<Activity> {
        None
    }

    fn snapshot(&self) -> Vec<(String, Activity)> {
        Vec::new()
    }
}
