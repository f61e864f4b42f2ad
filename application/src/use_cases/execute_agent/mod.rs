//! Execute Agent use case (the execution engine)
//!
//! Runs one [`ExecutionRequest`] against the inference backend and folds the
//! event stream into exactly one [`ExecutionResult`]:
//!
//! | Stream outcome                         | Final state | `succeeded` |
//! |----------------------------------------|-------------|-------------|
//! | exhausted / terminal `Completed`       | Completed   | yes         |
//! | deadline elapsed (open or streaming)   | TimedOut    | no (TIMEOUT)|
//! | backend error / terminal `Failed`      | Faulted     | no          |
//!
//! The engine never retries. Runtime faults come back inside the result for
//! the classifier; only malformed requests are returned as `Err`.

mod types;

pub use types::ExecutionRequest;

use crate::config::EngineParams;
use crate::ports::inference_backend::{BackendSession, InferenceBackend};
use crate::ports::progress::{ExecutionProgress, NoProgress};
use crate::ports::trace_sink::{TraceRecord, TraceSink};
use fleet_domain::core::string::preview;
use fleet_domain::{
    BackendEvent, DomainError, ExecutionResult, ExecutionState, ExecutionTally, RawFailure,
    TerminalStatus,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, sleep_until, timeout, timeout_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Longest wall-clock budget honored as given. Larger budgets are clamped so
/// the deadline stays representable.
const MAX_BUDGET: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// How the event loop ended.
#[derive(Debug)]
enum StreamOutcome {
    Exhausted,
    DeadlineElapsed,
    Fault(RawFailure),
}

/// Use case for running one agent execution
pub struct ExecuteAgentUseCase<B: InferenceBackend + 'static> {
    backend: Arc<B>,
    params: EngineParams,
    cancellation_token: Option<CancellationToken>,
}

impl<B: InferenceBackend + 'static> Clone for ExecuteAgentUseCase<B> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            params: self.params.clone(),
            cancellation_token: self.cancellation_token.clone(),
        }
    }
}

impl<B: InferenceBackend + 'static> ExecuteAgentUseCase<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            params: EngineParams::default(),
            cancellation_token: None,
        }
    }

    pub fn with_params(mut self, params: EngineParams) -> Self {
        self.params = params;
        self
    }

    /// Set a cancellation token for graceful interruption
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    pub async fn execute(&self, request: &ExecutionRequest) -> Result<ExecutionResult, DomainError> {
        self.execute_with_progress(request, &NoProgress).await
    }

    pub async fn execute_with_progress(
        &self,
        request: &ExecutionRequest,
        progress: &dyn ExecutionProgress,
    ) -> Result<ExecutionResult, DomainError> {
        request.validate()?;

        let trace = request.trace_sink.as_deref();
        let label = request.label();
        let started = Instant::now();
        let deadline = started + Duration::from_secs(request.timeout_seconds).min(MAX_BUDGET);

        info!(
            "Executing '{}' on {} (max_turns={}, timeout={}s): {}",
            label,
            self.backend.name(),
            request.max_turns,
            request.timeout_seconds,
            preview(&request.prompt, 80)
        );
        progress.on_start(label, request.timeout_seconds);
        emit(trace, || {
            TraceRecord::new(
                "start",
                format!(
                    "agent={} scope=[{}] root={} max_turns={} timeout={}s model={}\n{}",
                    label,
                    request.capabilities,
                    request.working_root.display(),
                    request.max_turns,
                    request.timeout_seconds,
                    request.model_id.as_deref().unwrap_or("-"),
                    request.prompt
                ),
            )
        });

        let mut tally = ExecutionTally::new();
        let spec = request.session_spec();

        // Opening the session counts against the deadline.
        let (outcome, session) = match timeout_at(deadline, self.backend.open_session(&spec)).await {
            Err(_) => {
                warn!("Deadline elapsed while opening session for '{}'", label);
                (StreamOutcome::DeadlineElapsed, None)
            }
            Ok(Err(e)) => {
                warn!("Failed to open session for '{}': {}", label, e);
                (StreamOutcome::Fault(RawFailure::from(&e)), None)
            }
            Ok(Ok(mut session)) => {
                let outcome = self
                    .consume(session.as_mut(), request, deadline, &mut tally, progress)
                    .await;
                (outcome, Some(session))
            }
        };
        let duration_millis = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let mut state = ExecutionState::default();
        let result = match outcome {
            StreamOutcome::Exhausted => {
                state = state.complete();
                ExecutionResult::completed(tally, duration_millis)
            }
            StreamOutcome::DeadlineElapsed => {
                state = state.time_out();
                emit(trace, || {
                    TraceRecord::new(
                        "deadline",
                        format!("exceeded {}s, cancelling session", request.timeout_seconds),
                    )
                });
                ExecutionResult::timed_out(tally, duration_millis, request.timeout_seconds)
            }
            StreamOutcome::Fault(raw) => {
                state = state.fault();
                emit(trace, || TraceRecord::new("fault", raw.to_string()));
                ExecutionResult::faulted(tally, duration_millis, raw)
            }
        };

        if let Some(mut session) = session {
            if state != ExecutionState::Completed {
                self.cancel_session(session.as_mut(), label).await;
            }
        }

        info!(
            "Execution '{}' {} in {}ms ({} message(s), {} tool call(s))",
            label,
            state,
            result.duration_millis,
            result.message_count,
            result.tool_invocation_count
        );
        emit(trace, || {
            TraceRecord::new(
                "end",
                format!(
                    "{} messages={} tools={} duration_ms={}",
                    state, result.message_count, result.tool_invocation_count, result.duration_millis
                ),
            )
        });
        progress.on_finish(&result);

        Ok(result)
    }

    /// Pull events until the stream ends, the deadline passes, or the
    /// backend faults.
    async fn consume(
        &self,
        session: &mut dyn BackendSession,
        request: &ExecutionRequest,
        deadline: Instant,
        tally: &mut ExecutionTally,
        progress: &dyn ExecutionProgress,
    ) -> StreamOutcome {
        let trace = request.trace_sink.as_deref();
        loop {
            let next = tokio::select! {
                biased;
                _ = cancelled(self.cancellation_token.as_ref()) => {
                    return StreamOutcome::Fault(RawFailure::backend("execution cancelled by caller"));
                }
                _ = sleep_until(deadline) => return StreamOutcome::DeadlineElapsed,
                next = session.next_event() => next,
            };

            let event = match next {
                Ok(Some(event)) => event,
                Ok(None) => return StreamOutcome::Exhausted,
                Err(e) => {
                    warn!("Backend fault during '{}': {}", request.label(), e);
                    return StreamOutcome::Fault(RawFailure::from(&e));
                }
            };

            emit(trace, || TraceRecord::from_event(&event));
            progress.on_event(&event);
            tally.observe(&event);

            match &event {
                BackendEvent::ToolInvocation { name, .. } => {
                    debug!("'{}' invoked tool {}", request.label(), name);
                    if !request.capabilities.permits(name) {
                        warn!(
                            "'{}' invoked '{}' outside its capability scope [{}]",
                            request.label(),
                            name,
                            request.capabilities
                        );
                        emit(trace, || {
                            TraceRecord::new(
                                "scope_violation",
                                format!("{} not permitted by [{}]", name, request.capabilities),
                            )
                        });
                    }
                }
                BackendEvent::ToolResult {
                    name,
                    is_error: true,
                    ..
                } => {
                    debug!(
                        "Tool {} reported an error to '{}'",
                        name.as_deref().unwrap_or("?"),
                        request.label()
                    );
                }
                BackendEvent::Terminal(TerminalStatus::Completed) => {
                    return StreamOutcome::Exhausted;
                }
                BackendEvent::Terminal(TerminalStatus::Failed { message }) => {
                    return StreamOutcome::Fault(RawFailure::backend(message.clone()));
                }
                _ => {}
            }
        }
    }

    async fn cancel_session(&self, session: &mut dyn BackendSession, label: &str) {
        if timeout(self.params.cancel_grace, session.cancel()).await.is_err() {
            warn!(
                "Session for '{}' did not shut down within {:?}; dropping it",
                label, self.params.cancel_grace
            );
        }
    }
}

fn emit(sink: Option<&dyn TraceSink>, record: impl FnOnce() -> TraceRecord) {
    if let Some(sink) = sink {
        sink.record(record());
    }
}

async fn cancelled(token: Option<&CancellationToken>) {
    match token {
        Some(token) => token.cancelled().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        CollectingTrace, RecordingProgress, Script, ScriptedBackend, Step, done, text, tool,
    };
    use crate::ports::inference_backend::BackendError;
    use fleet_domain::{CapabilityScope, FailureCategory, FailureSource};
    use serde_json::json;

    fn request(timeout_seconds: u64) -> ExecutionRequest {
        ExecutionRequest::ad_hoc(
            "compile the weekly report",
            CapabilityScope::new(["Read", "mcp__sheets__*"]).unwrap(),
            "/srv/reports",
            5,
            timeout_seconds,
        )
    }

    fn engine(backend: ScriptedBackend) -> (ExecuteAgentUseCase<ScriptedBackend>, Arc<ScriptedBackend>) {
        let backend = Arc::new(backend);
        (ExecuteAgentUseCase::new(backend.clone()), backend)
    }

    #[tokio::test]
    async fn stream_exhaustion_succeeds_with_payload() {
        let (engine, backend) = engine(ScriptedBackend::single(vec![
            text("The answer is "),
            text("{\"total\": 42}"),
            done(),
        ]));

        let result = engine.execute(&request(30)).await.unwrap();

        assert!(result.succeeded);
        assert!(result.failure.is_none());
        assert_eq!(result.final_state, ExecutionState::Completed);
        assert_eq!(result.response_text, "The answer is {\"total\": 42}");
        assert_eq!(result.message_count, 2);
        assert_eq!(result.structured_payload, Some(json!({"total": 42})));
        assert_eq!(backend.cancel_count(), 0);
    }

    #[tokio::test]
    async fn single_turn_answer_without_json() {
        let (engine, _) = engine(ScriptedBackend::single(vec![text("42"), done()]));
        let request = ExecutionRequest::ad_hoc(
            "what is six times seven",
            CapabilityScope::none(),
            "/srv/reports",
            1,
            30,
        );

        let result = engine.execute(&request).await.unwrap();

        assert!(result.succeeded);
        assert_eq!(result.final_state, ExecutionState::Completed);
        assert_eq!(result.response_text, "42");
        assert_eq!(result.message_count, 1);
        assert_eq!(result.tool_invocation_count, 0);
        assert!(result.structured_payload.is_none());
        assert!(result.failure.is_none());
    }

    #[tokio::test]
    async fn huge_timeout_is_clamped_not_overflowed() {
        let (engine, _) = engine(ScriptedBackend::single(vec![text("42"), done()]));
        let request =
            ExecutionRequest::ad_hoc("q", CapabilityScope::none(), "/tmp", 1, u64::MAX);

        let result = engine.execute(&request).await.unwrap();

        assert!(result.succeeded);
        assert_eq!(result.response_text, "42");
    }

    #[tokio::test(start_paused = true)]
    async fn clamped_budget_still_times_out() {
        let (engine, _) = engine(ScriptedBackend::single(vec![Step::Hang]));
        let result = engine.execute(&request(u64::MAX)).await.unwrap();
        assert_eq!(result.final_state, ExecutionState::TimedOut);
        assert!(result.duration_millis >= MAX_BUDGET.as_millis() as u64);
    }

    #[tokio::test]
    async fn stream_end_without_terminal_event_succeeds() {
        let (engine, _) = engine(ScriptedBackend::single(vec![text("plain")]));
        let result = engine.execute(&request(30)).await.unwrap();
        assert!(result.succeeded);
        assert!(result.structured_payload.is_none());
    }

    #[tokio::test]
    async fn counts_follow_any_interleaving() {
        let (engine, _) = engine(ScriptedBackend::single(vec![
            tool("Read"),
            text("a"),
            Step::Event(BackendEvent::tool_result(Some("Read".to_string()), "...", false)),
            tool("mcp__sheets__get"),
            text("b"),
            text("c"),
            tool("Read"),
            done(),
        ]));

        let result = engine.execute(&request(30)).await.unwrap();
        assert_eq!(result.message_count, 3);
        assert_eq!(result.tool_invocation_count, 3);
        assert_eq!(result.response_text, "abc");
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_preserves_partial_text_and_cancels() {
        let (engine, backend) = engine(ScriptedBackend::single(vec![
            text("partial"),
            Step::Delay(Duration::from_secs(5)),
            text(" never seen"),
            done(),
        ]));

        let result = engine.execute(&request(1)).await.unwrap();

        assert!(!result.succeeded);
        assert_eq!(result.final_state, ExecutionState::TimedOut);
        assert_eq!(result.response_text, "partial");
        assert_eq!(result.message_count, 1);
        assert_eq!(result.failure_category(), Some(FailureCategory::Timeout));
        assert!(result.duration_millis >= 1000);
        assert!(result.duration_millis < 5000);
        assert_eq!(backend.cancel_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_session_open_counts_against_deadline() {
        let (engine, backend) = engine(ScriptedBackend::new(vec![Script::OpenDelay(
            Duration::from_secs(10),
            vec![text("late"), done()],
        )]));

        let result = engine.execute(&request(2)).await.unwrap();
        assert_eq!(result.final_state, ExecutionState::TimedOut);
        assert_eq!(result.message_count, 0);
        // No session was handed over, so there is nothing to cancel
        assert_eq!(backend.cancel_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_that_hangs_is_bounded_by_grace() {
        let backend = ScriptedBackend::single(vec![Step::Hang]).hanging_on_cancel();
        let engine = ExecuteAgentUseCase::new(Arc::new(backend))
            .with_params(EngineParams::default().with_cancel_grace(Duration::from_secs(1)));

        let result = engine.execute(&request(3)).await.unwrap();
        assert_eq!(result.final_state, ExecutionState::TimedOut);
        assert_eq!(result.duration_millis, 3000);
    }

    #[tokio::test]
    async fn backend_error_faults_and_keeps_counters() {
        let (engine, backend) = engine(ScriptedBackend::single(vec![
            text("step one"),
            tool("Read"),
            Step::Error(BackendError::Connection("connection reset by peer".to_string())),
            text("unreachable"),
        ]));

        let result = engine.execute(&request(30)).await.unwrap();

        assert!(!result.succeeded);
        assert_eq!(result.final_state, ExecutionState::Faulted);
        assert_eq!(result.response_text, "step one");
        assert_eq!(result.message_count, 1);
        assert_eq!(result.tool_invocation_count, 1);
        let failure = result.failure.as_ref().unwrap();
        assert_eq!(failure.category, None);
        assert_eq!(failure.detail.source, FailureSource::Transport);
        assert_eq!(backend.cancel_count(), 1);
    }

    #[tokio::test]
    async fn terminal_failure_event_faults() {
        let (engine, _) = engine(ScriptedBackend::single(vec![
            text("trying"),
            Step::Event(BackendEvent::failed("429 Too Many Requests")),
        ]));

        let result = engine.execute(&request(30)).await.unwrap();
        assert_eq!(result.final_state, ExecutionState::Faulted);
        assert_eq!(
            result.failure.as_ref().unwrap().detail,
            RawFailure::backend("429 Too Many Requests")
        );
    }

    #[tokio::test]
    async fn open_error_faults_without_session() {
        let (engine, backend) = engine(ScriptedBackend::new(vec![Script::OpenError(
            BackendError::Rejected {
                status: Some(401),
                message: "unauthorized".to_string(),
            },
        )]));

        let result = engine.execute(&request(30)).await.unwrap();
        assert_eq!(result.final_state, ExecutionState::Faulted);
        assert_eq!(result.failure.as_ref().unwrap().detail.status_code, Some(401));
        assert_eq!(backend.cancel_count(), 0);
    }

    #[tokio::test]
    async fn invalid_request_fails_fast() {
        let (engine, backend) = engine(ScriptedBackend::single(vec![done()]));
        let mut bad = request(30);
        bad.prompt = String::new();

        let err = engine.execute(&bad).await.unwrap_err();
        assert!(err.is_invalid_request());
        assert!(backend.opened().is_empty());
    }

    #[tokio::test]
    async fn session_spec_carries_scope() {
        let (engine, backend) = engine(ScriptedBackend::single(vec![done()]));
        engine
            .execute(&request(30).with_model("opus"))
            .await
            .unwrap();

        let specs = backend.opened();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].max_turns, 5);
        assert_eq!(specs[0].model_id.as_deref(), Some("opus"));
        assert_eq!(specs[0].capabilities.patterns(), ["Read", "mcp__sheets__*"]);
    }

    #[tokio::test]
    async fn trace_mirrors_events_in_order() {
        let (engine, _) = engine(ScriptedBackend::single(vec![
            text("hi"),
            tool("Bash"),
            Step::Event(BackendEvent::tool_result(Some("Bash".to_string()), "ok", false)),
            done(),
        ]));
        let trace = Arc::new(CollectingTrace::default());

        engine
            .execute(&request(30).with_trace_sink(trace.clone()))
            .await
            .unwrap();

        assert_eq!(
            trace.kinds(),
            vec!["start", "text", "tool_call", "scope_violation", "tool_result", "status", "end"]
        );
        let records = trace.records();
        assert!(records[3].detail.starts_with("Bash not permitted"));
        assert!(records.last().unwrap().detail.starts_with("completed"));
    }

    #[tokio::test(start_paused = true)]
    async fn trace_keeps_partial_progress_on_timeout() {
        let (engine, _) = engine(ScriptedBackend::single(vec![text("half"), Step::Hang]));
        let trace = Arc::new(CollectingTrace::default());

        engine
            .execute(&request(1).with_trace_sink(trace.clone()))
            .await
            .unwrap();

        assert_eq!(trace.kinds(), vec!["start", "text", "deadline", "end"]);
        assert_eq!(trace.records()[1].detail, "half");
    }

    #[tokio::test]
    async fn caller_cancellation_faults() {
        let token = CancellationToken::new();
        token.cancel();
        let engine = ExecuteAgentUseCase::new(Arc::new(ScriptedBackend::single(vec![Step::Hang])))
            .with_cancellation(token);

        let result = engine.execute(&request(30)).await.unwrap();
        assert_eq!(result.final_state, ExecutionState::Faulted);
        assert!(result.failure.unwrap().message.contains("cancelled"));
    }

    #[tokio::test]
    async fn progress_sees_every_event() {
        let (engine, _) = engine(ScriptedBackend::single(vec![text("a"), tool("Read"), done()]));
        let progress = RecordingProgress::default();

        engine
            .execute_with_progress(&request(30), &progress)
            .await
            .unwrap();

        assert_eq!(
            *progress.events.lock().unwrap(),
            vec!["start", "text", "tool_call", "status"]
        );
        assert!(progress.finished.lock().unwrap().as_ref().unwrap().succeeded);
    }
}
