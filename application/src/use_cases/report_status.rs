//! Report Status use case
//!
//! Builds a [`StatusSnapshot`] with one entry for the registry, one for the
//! backend, and one per agent (`agent:<name>`). Agent health comes from the
//! last recorded activity; no recent activity reads as healthy with no
//! timestamp.

use crate::ports::activity_store::ActivityStore;
use crate::registry::AgentRegistry;
use chrono::Utc;
use fleet_domain::{HealthState, StatusSnapshot, SubsystemStatus};
use std::collections::BTreeMap;
use std::sync::Arc;

pub struct ReportStatusUseCase {
    registry: Arc<AgentRegistry>,
    activity: Arc<dyn ActivityStore>,
    backend_name: String,
}

impl ReportStatusUseCase {
    pub fn new(
        registry: Arc<AgentRegistry>,
        activity: Arc<dyn ActivityStore>,
        backend_name: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            activity,
            backend_name: backend_name.into(),
        }
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        let activities: BTreeMap<String, _> = self.activity.snapshot().into_iter().collect();

        let mut subsystems = vec![self.registry_status()];

        // The backend is as healthy as the most recent run that touched it.
        let latest = activities.values().max_by_key(|a| a.at);
        subsystems.push(SubsystemStatus::from_activity(
            format!("backend:{}", self.backend_name),
            latest,
        ));

        let registered = self.registry.list(false);
        for name in &registered {
            let mut status =
                SubsystemStatus::from_activity(format!("agent:{}", name), activities.get(name));
            if let Ok(config) = self.registry.get(name) {
                if !config.enabled {
                    status = status.with_detail("disabled");
                }
            }
            subsystems.push(status);
        }
        // Agents that ran without being registered (unknown-agent fallback)
        for (name, activity) in &activities {
            if !registered.contains(name) {
                subsystems.push(
                    SubsystemStatus::from_activity(format!("agent:{}", name), Some(activity))
                        .with_detail("not registered"),
                );
            }
        }

        StatusSnapshot::new(Utc::now(), subsystems)
    }

    fn registry_status(&self) -> SubsystemStatus {
        let issues = self.registry.issues();
        // Skipped entries leave the registry usable but incomplete
        let health = if issues.is_empty() {
            HealthState::Healthy
        } else {
            HealthState::Degraded
        };
        SubsystemStatus::new("registry", health)
            .with_last_activity(self.registry.loaded_at())
            .with_detail(format!(
                "{} agent(s) from {}, {} issue(s)",
                self.registry.list(false).len(),
                self.registry.origin(),
                issues.len()
            ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::activity_store::NoActivityStore;
    use crate::ports::registry_source::StaticRegistrySource;
    use crate::registry::UnknownAgentPolicy;
    use fleet_domain::{Activity, AgentConfig, CapabilityScope, FailureCategory, RecoveryAction};
    use std::sync::Mutex;

    #[derive(Default)]
    struct MapStore(Mutex<BTreeMap<String, Activity>>);

    impl ActivityStore for MapStore {
        fn record(&self, agent: &str, activity: Activity) {
            self.0.lock().unwrap().insert(agent.to_string(), activity);
        }

        fn latest(&self, agent: &str) -> Option<Activity> {
            self.0.lock().unwrap().get(agent).cloned()
        }

        fn snapshot(&self) -> Vec<(String, Activity)> {
            self.0
                .lock()
                .unwrap()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        }
    }

    fn registry(agents: Vec<AgentConfig>) -> Arc<AgentRegistry> {
        Arc::new(
            AgentRegistry::load(
                Arc::new(StaticRegistrySource::new(agents)),
                UnknownAgentPolicy::Deny,
            )
            .unwrap(),
        )
    }

    fn agent(name: &str) -> AgentConfig {
        AgentConfig::new(name, CapabilityScope::none(), "/srv", "sonnet")
    }

    #[test]
    fn idle_agents_are_healthy_without_timestamp() {
        let status = ReportStatusUseCase::new(
            registry(vec![agent("crm"), agent("ads").with_enabled(false)]),
            Arc::new(NoActivityStore),
            "process",
        )
        .snapshot();

        let crm = status.get("agent:crm").unwrap();
        assert_eq!(crm.health, HealthState::Healthy);
        assert!(crm.last_activity.is_none());
        assert_eq!(status.get("agent:ads").unwrap().detail.as_deref(), Some("disabled"));
        assert_eq!(status.get("registry").unwrap().health, HealthState::Healthy);
        assert_eq!(status.overall(), HealthState::Healthy);
    }

    #[test]
    fn agent_health_follows_last_activity() {
        let store = Arc::new(MapStore::default());
        let now = Utc::now();
        store.record(
            "crm",
            Activity::failed(now, 10, FailureCategory::Auth, RecoveryAction::Escalate),
        );
        store.record("ads", Activity::succeeded(now - chrono::Duration::seconds(5), 10));
        store.record("ghost", Activity::succeeded(now - chrono::Duration::seconds(9), 3));

        let status = ReportStatusUseCase::new(
            registry(vec![agent("crm"), agent("ads")]),
            store,
            "process",
        )
        .snapshot();

        assert_eq!(status.get("agent:crm").unwrap().health, HealthState::Down);
        assert_eq!(status.get("agent:ads").unwrap().health, HealthState::Healthy);
        assert_eq!(
            status.get("agent:ghost").unwrap().detail.as_deref(),
            Some("not registered")
        );
        // Most recent run was the auth failure
        assert_eq!(status.get("backend:process").unwrap().health, HealthState::Down);
        assert_eq!(status.overall(), HealthState::Down);
    }
}
