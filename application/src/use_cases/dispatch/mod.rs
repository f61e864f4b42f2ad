//! Dispatch Agent use case (thin orchestration shell)
//!
//! Resolves an agent, runs the engine, and acts on the classifier's verdict:
//!
//! | Action               | Shell behavior                                        |
//! |----------------------|-------------------------------------------------------|
//! | `RETRY_NOW`          | run again immediately                                 |
//! | `RETRY_WITH_BACKOFF` | sleep and run again if short enough, else hand back   |
//! | `ESCALATE`           | stop, surface to a human                              |
//! | `PERMANENT_FAILURE`  | stop                                                  |
//!
//! The shell owns the per-agent streak counters and records every attempt in
//! the activity store for the status surface.

mod streak;
mod types;

pub use streak::StreakTracker;
pub use types::{DispatchDecision, DispatchError, DispatchInput, DispatchOutcome};

use crate::config::DispatchParams;
use crate::ports::activity_store::ActivityStore;
use crate::ports::inference_backend::InferenceBackend;
use crate::ports::progress::{ExecutionProgress, NoProgress};
use crate::registry::AgentRegistry;
use crate::use_cases::execute_agent::{ExecuteAgentUseCase, ExecutionRequest};
use chrono::Utc;
use fleet_domain::{Activity, FailureClassifier, RawFailure, RecoveryAction};
use std::sync::Arc;
use tracing::{info, warn};

/// Use case for dispatching a task to a registered agent
pub struct DispatchAgentUseCase<B: InferenceBackend + 'static> {
    registry: Arc<AgentRegistry>,
    engine: ExecuteAgentUseCase<B>,
    classifier: FailureClassifier,
    activity: Arc<dyn ActivityStore>,
    streaks: StreakTracker,
    params: DispatchParams,
}

impl<B: InferenceBackend + 'static> DispatchAgentUseCase<B> {
    pub fn new(
        registry: Arc<AgentRegistry>,
        engine: ExecuteAgentUseCase<B>,
        classifier: FailureClassifier,
        activity: Arc<dyn ActivityStore>,
    ) -> Self {
        let params = DispatchParams::default();
        Self {
            registry,
            engine,
            classifier,
            activity,
            streaks: StreakTracker::new(params.streak_window),
            params,
        }
    }

    pub fn with_params(mut self, params: DispatchParams) -> Self {
        self.streaks = StreakTracker::new(params.streak_window);
        self.params = params;
        self
    }

    pub fn streaks(&self) -> &StreakTracker {
        &self.streaks
    }

    pub async fn dispatch(&self, input: DispatchInput) -> Result<DispatchOutcome, DispatchError> {
        self.dispatch_with_progress(input, &NoProgress).await
    }

    pub async fn dispatch_with_progress(
        &self,
        input: DispatchInput,
        progress: &dyn ExecutionProgress,
    ) -> Result<DispatchOutcome, DispatchError> {
        // Resolved once: retries run against the same config even if the
        // registry reloads meanwhile.
        let config = self.registry.resolve(&input.agent)?;
        let mut request = ExecutionRequest::for_agent(&config, input.prompt);
        request.trace_sink = input.trace_sink;

        let mut attempt = 0;
        loop {
            attempt += 1;
            let result = self.engine.execute_with_progress(&request, progress).await?;

            let raw = if result.succeeded {
                if self.params.treat_empty_as_failure {
                    RawFailure::anomaly_in(&result)
                } else {
                    None
                }
            } else {
                RawFailure::of(&result).cloned()
            };

            let Some(raw) = raw else {
                self.streaks.reset(&config.name);
                self.activity.record(
                    &config.name,
                    Activity::succeeded(Utc::now(), result.duration_millis),
                );
                return Ok(DispatchOutcome {
                    agent: config.name.clone(),
                    result,
                    classification: None,
                    attempts: attempt,
                    decision: DispatchDecision::Succeeded,
                });
            };

            let category = self.classifier.categorize(&raw);
            let streak = self.streaks.bump(&config.name, category);
            let classification = self.classifier.classify(&raw, streak);
            let result = result.into_failure(raw).classified(&classification);

            self.activity.record(
                &config.name,
                Activity::failed(
                    Utc::now(),
                    result.duration_millis,
                    classification.category,
                    classification.action,
                ),
            );
            warn!(
                "'{}' attempt {} failed: {} (streak {}) -> {}",
                config.name, attempt, classification.category, streak, classification.action
            );

            let attempts_left = attempt < self.params.max_attempts;
            let decision = match classification.action {
                RecoveryAction::RetryNow if attempts_left => {
                    info!("Retrying '{}' now", config.name);
                    continue;
                }
                RecoveryAction::RetryWithBackoff(delay)
                    if attempts_left && delay <= self.params.max_inline_backoff =>
                {
                    info!("Retrying '{}' in {}ms", config.name, delay.as_millis());
                    tokio::time::sleep(delay).await;
                    continue;
                }
                RecoveryAction::RetryWithBackoff(delay) if attempts_left => {
                    DispatchDecision::RetryLater(delay)
                }
                RecoveryAction::RetryNow | RecoveryAction::RetryWithBackoff(_) => {
                    DispatchDecision::AttemptsExhausted
                }
                RecoveryAction::Escalate => DispatchDecision::Escalate,
                RecoveryAction::PermanentFailure => DispatchDecision::PermanentFailure,
            };

            return Ok(DispatchOutcome {
                agent: config.name.clone(),
                result,
                classification: Some(classification),
                attempts: attempt,
                decision,
            });
        }
    }
}
