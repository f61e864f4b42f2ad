//! Scripted port implementations shared by the use case tests.

use crate::ports::inference_backend::{BackendError, BackendSession, InferenceBackend, SessionSpec};
use crate::ports::progress::ExecutionProgress;
use crate::ports::trace_sink::{TraceRecord, TraceSink};
use async_trait::async_trait;
use fleet_domain::{BackendEvent, ExecutionResult};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One step of a scripted session.
#[derive(Debug, Clone)]
pub(crate) enum Step {
    Event(BackendEvent),
    Error(BackendError),
    /// Sleep before the next step (uses tokio time, so paused clocks apply).
    Delay(Duration),
    /// Never yield again.
    Hang,
}

/// What one `open_session` call does.
#[derive(Debug, Clone)]
pub(crate) enum Script {
    Steps(Vec<Step>),
    OpenError(BackendError),
    OpenDelay(Duration, Vec<Step>),
}

/// Backend that plays back one script per opened session, in order.
pub(crate) struct ScriptedBackend {
    scripts: Mutex<VecDeque<Script>>,
    specs: Mutex<Vec<SessionSpec>>,
    cancels: Arc<AtomicUsize>,
    hang_on_cancel: bool,
}

impl ScriptedBackend {
    pub(crate) fn new(scripts: Vec<Script>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into()),
            specs: Mutex::new(Vec::new()),
            cancels: Arc::new(AtomicUsize::new(0)),
            hang_on_cancel: false,
        }
    }

    pub(crate) fn single(steps: Vec<Step>) -> Self {
        Self::new(vec![Script::Steps(steps)])
    }

    pub(crate) fn hanging_on_cancel(mut self) -> Self {
        self.hang_on_cancel = true;
        self
    }

    pub(crate) fn opened(&self) -> Vec<SessionSpec> {
        self.specs.lock().unwrap().clone()
    }

    pub(crate) fn cancel_count(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InferenceBackend for ScriptedBackend {
    async fn open_session(&self, spec: &SessionSpec) -> Result<Box<dyn BackendSession>, BackendError> {
        self.specs.lock().unwrap().push(spec.clone());
        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Script::Steps(vec![Step::Event(BackendEvent::completed())]));

        let steps = match script {
            Script::Steps(steps) => steps,
            Script::OpenError(e) => return Err(e),
            Script::OpenDelay(delay, steps) => {
                tokio::time::sleep(delay).await;
                steps
            }
        };
        Ok(Box::new(ScriptedSession {
            steps: steps.into(),
            cancels: self.cancels.clone(),
            hang_on_cancel: self.hang_on_cancel,
        }))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

struct ScriptedSession {
    steps: VecDeque<Step>,
    cancels: Arc<AtomicUsize>,
    hang_on_cancel: bool,
}

#[async_trait]
impl BackendSession for ScriptedSession {
    async fn next_event(&mut self) -> Result<Option<BackendEvent>, BackendError> {
        loop {
            match self.steps.pop_front() {
                None => return Ok(None),
                Some(Step::Event(event)) => return Ok(Some(event)),
                Some(Step::Error(e)) => return Err(e),
                Some(Step::Delay(delay)) => tokio::time::sleep(delay).await,
                Some(Step::Hang) => std::future::pending::<()>().await,
            }
        }
    }

    async fn cancel(&mut self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        if self.hang_on_cancel {
            std::future::pending::<()>().await;
        }
    }
}

/// Trace sink that keeps every record in memory.
#[derive(Default)]
pub(crate) struct CollectingTrace {
    records: Mutex<Vec<TraceRecord>>,
}

impl CollectingTrace {
    pub(crate) fn kinds(&self) -> Vec<&'static str> {
        self.records.lock().unwrap().iter().map(|r| r.kind).collect()
    }

    pub(crate) fn records(&self) -> Vec<TraceRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl TraceSink for CollectingTrace {
    fn record(&self, record: TraceRecord) {
        self.records.lock().unwrap().push(record);
    }
}

/// Progress notifier that remembers what it saw.
#[derive(Default)]
pub(crate) struct RecordingProgress {
    pub(crate) events: Mutex<Vec<&'static str>>,
    pub(crate) finished: Mutex<Option<ExecutionResult>>,
}

impl ExecutionProgress for RecordingProgress {
    fn on_start(&self, _label: &str, _timeout_seconds: u64) {
        self.events.lock().unwrap().push("start");
    }

    fn on_event(&self, event: &BackendEvent) {
        self.events.lock().unwrap().push(event.label());
    }

    fn on_finish(&self, result: &ExecutionResult) {
        *self.finished.lock().unwrap() = Some(result.clone());
    }
}

pub(crate) fn text(t: &str) -> Step {
    Step::Event(BackendEvent::text(t))
}

pub(crate) fn tool(name: &str) -> Step {
    Step::Event(BackendEvent::tool_invocation(name, serde_json::json!({})))
}

pub(crate) fn done() -> Step {
    Step::Event(BackendEvent::completed())
}
