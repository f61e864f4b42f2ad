//! Per-agent counters of consecutive same-category failures.
//!
//! The classifier is stateless; these counters are the "streak" it is handed.
//! A streak grows while failures keep the same category and arrive within the
//! window of each other. A different category, a quiet period longer than the
//! window, or a success starts over. Streaks past the window are evicted on
//! every access, so agents that never succeed do not accumulate entries.

use fleet_domain::FailureCategory;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy)]
struct Streak {
    category: FailureCategory,
    count: u32,
    last_at: Instant,
}

pub struct StreakTracker {
    window: Duration,
    streaks: Mutex<HashMap<String, Streak>>,
}

impl StreakTracker {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            streaks: Mutex::new(HashMap::new()),
        }
    }

    /// Record a failure and return the streak length including it.
    pub fn bump(&self, agent: &str, category: FailureCategory) -> u32 {
        let now = Instant::now();
        let mut streaks = self.streaks.lock().unwrap_or_else(|e| e.into_inner());
        self.evict_expired(&mut streaks, now);
        let count = match streaks.get(agent) {
            Some(s) if s.category == category => s.count.saturating_add(1),
            _ => 1,
        };
        streaks.insert(
            agent.to_string(),
            Streak {
                category,
                count,
                last_at: now,
            },
        );
        count
    }

    /// Current streak for an agent, if one is still within the window.
    pub fn current(&self, agent: &str) -> Option<(FailureCategory, u32)> {
        let mut streaks = self.streaks.lock().unwrap_or_else(|e| e.into_inner());
        self.evict_expired(&mut streaks, Instant::now());
        streaks.get(agent).map(|s| (s.category, s.count))
    }

    pub fn reset(&self, agent: &str) {
        self.streaks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(agent);
    }

    /// Number of agents with a live streak.
    pub fn len(&self) -> usize {
        self.streaks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn evict_expired(&self, streaks: &mut HashMap<String, Streak>, now: Instant) {
        streaks.retain(|_, s| now.duration_since(s.last_at) <= self.window);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn same_category_grows() {
        let tracker = StreakTracker::new(Duration::from_secs(60));
        assert_eq!(tracker.bump("ads", FailureCategory::RateLimit), 1);
        assert_eq!(tracker.bump("ads", FailureCategory::RateLimit), 2);
        assert_eq!(tracker.bump("ads", FailureCategory::RateLimit), 3);
        assert_eq!(tracker.current("ads"), Some((FailureCategory::RateLimit, 3)));
        // Other agents are independent
        assert_eq!(tracker.bump("crm", FailureCategory::RateLimit), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn category_change_restarts() {
        let tracker = StreakTracker::new(Duration::from_secs(60));
        tracker.bump("ads", FailureCategory::Network);
        tracker.bump("ads", FailureCategory::Network);
        assert_eq!(tracker.bump("ads", FailureCategory::Data), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn quiet_window_restarts() {
        let tracker = StreakTracker::new(Duration::from_secs(60));
        tracker.bump("ads", FailureCategory::Timeout);
        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(tracker.current("ads"), None);
        assert_eq!(tracker.bump("ads", FailureCategory::Timeout), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_streaks_are_evicted() {
        let tracker = StreakTracker::new(Duration::from_secs(60));
        for agent in ["adhoc-1", "adhoc-2", "adhoc-3"] {
            tracker.bump(agent, FailureCategory::Unknown);
        }
        assert_eq!(tracker.len(), 3);

        tokio::time::advance(Duration::from_secs(61)).await;
        tracker.bump("adhoc-4", FailureCategory::Unknown);
        assert_eq!(tracker.len(), 1);

        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(tracker.current("adhoc-4"), None);
        assert!(tracker.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn reset_clears() {
        let tracker = StreakTracker::new(Duration::from_secs(60));
        tracker.bump("ads", FailureCategory::Auth);
        tracker.reset("ads");
        assert_eq!(tracker.current("ads"), None);
    }
}
