//! Inference backend that runs one child process per session.
//!
//! The child gets the prompt on stdin and streams [`protocol`](super::protocol)
//! lines on stdout. Stderr is drained in the background and the tail is kept
//! for fault messages.

use super::error::ProcessBackendError;
use super::protocol::{ParsedLine, parse_line};
use async_trait::async_trait;
use fleet_application::{BackendError, BackendSession, InferenceBackend, SessionSpec};
use fleet_domain::BackendEvent;
use fleet_domain::core::string::truncate;
use std::collections::VecDeque;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdout, Command};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

/// How long to wait for the stderr drain after the child exits.
const STDERR_DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Process backend configuration
#[derive(Debug, Clone)]
pub struct ProcessBackendConfig {
    pub command: String,
    /// Arguments placed before the per-session flags
    pub args: Vec<String>,
    pub stderr_tail_bytes: usize,
}

impl ProcessBackendConfig {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            stderr_tail_bytes: 4_096,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_stderr_tail_bytes(mut self, bytes: usize) -> Self {
        self.stderr_tail_bytes = bytes;
        self
    }
}

pub struct ProcessBackend {
    config: ProcessBackendConfig,
}

impl ProcessBackend {
    pub fn new(config: ProcessBackendConfig) -> Self {
        Self { config }
    }

    fn command(&self, spec: &SessionSpec) -> Command {
        let mut cmd = Command::new(&self.config.command);
        cmd.args(&self.config.args)
            .arg("--max-turns")
            .arg(spec.max_turns.to_string());

        if !spec.capabilities.is_unrestricted() {
            // An empty list still restricts: no tools at all
            cmd.arg("--allowed-tools")
                .arg(spec.capabilities.patterns().join(","));
        }
        if let Some(model) = &spec.model_id {
            cmd.arg("--model").arg(model);
        }

        cmd.current_dir(&spec.working_root)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Linux: request kernel to send SIGTERM to child when parent dies.
        // This catches cases where Drop doesn't run (SIGKILL, OOM kill).
        #[cfg(target_os = "linux")]
        unsafe {
            cmd.pre_exec(|| {
                libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGTERM);
                Ok(())
            });
        }

        cmd
    }

    async fn spawn(&self, spec: &SessionSpec) -> Result<ProcessSession, ProcessBackendError> {
        debug!(
            "Spawning backend: {} (root: {}, max_turns: {})",
            self.config.command,
            spec.working_root.display(),
            spec.max_turns
        );

        let mut child = self
            .command(spec)
            .spawn()
            .map_err(|source| ProcessBackendError::Spawn {
                command: self.config.command.clone(),
                source,
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or(ProcessBackendError::MissingPipe("stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or(ProcessBackendError::MissingPipe("stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or(ProcessBackendError::MissingPipe("stderr"))?;

        let tail_bytes = self.config.stderr_tail_bytes;
        let stderr_task = tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            let mut tail = String::new();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!("backend stderr: {}", line);
                tail.push_str(&line);
                tail.push('\n');
                if tail.len() > tail_bytes.saturating_mul(2) {
                    tail = keep_tail(&tail, tail_bytes);
                }
            }
            keep_tail(&tail, tail_bytes)
        });

        stdin
            .write_all(spec.prompt.as_bytes())
            .await
            .map_err(ProcessBackendError::Stdin)?;
        // Closing stdin marks the end of the prompt
        drop(stdin);

        info!("Backend session started (pid {:?})", child.id());

        Ok(ProcessSession {
            child,
            lines: BufReader::new(stdout).lines(),
            stderr_task: Some(stderr_task),
            pending: VecDeque::new(),
            finished: false,
        })
    }
}

#[async_trait]
impl InferenceBackend for ProcessBackend {
    async fn open_session(
        &self,
        spec: &SessionSpec,
    ) -> Result<Box<dyn BackendSession>, BackendError> {
        let session = self.spawn(spec).await?;
        Ok(Box::new(session))
    }

    fn name(&self) -> &str {
        "process"
    }
}

/// The last `max_bytes` of `text`, cut at a char boundary.
fn keep_tail(text: &str, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text.to_string();
    }
    let mut start = text.len() - max_bytes;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    text[start..].to_string()
}

pub struct ProcessSession {
    child: Child,
    lines: Lines<BufReader<ChildStdout>>,
    stderr_task: Option<JoinHandle<String>>,
    /// Events from one envelope line not yet handed out
    pending: VecDeque<BackendEvent>,
    /// Set once a terminal event, fault, or EOF has been seen
    finished: bool,
}

impl ProcessSession {
    async fn stderr_tail(&mut self) -> String {
        match self.stderr_task.take() {
            Some(task) => tokio::time::timeout(STDERR_DRAIN_TIMEOUT, task)
                .await
                .ok()
                .and_then(|joined| joined.ok())
                .unwrap_or_default(),
            None => String::new(),
        }
    }

    /// Child closed stdout without a terminal line.
    async fn on_eof(&mut self) -> Result<Option<BackendEvent>, BackendError> {
        self.finished = true;
        let status = self.child.wait().await.map_err(ProcessBackendError::Wait)?;
        if status.success() {
            debug!("Backend exited cleanly without a result line");
            return Ok(None);
        }

        let stderr = self.stderr_tail().await;
        warn!("Backend exited with {}", status);
        Err(ProcessBackendError::Exited {
            status: status.to_string(),
            stderr,
        }
        .into())
    }
}

#[async_trait]
impl BackendSession for ProcessSession {
    async fn next_event(&mut self) -> Result<Option<BackendEvent>, BackendError> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Ok(Some(event));
            }
            if self.finished {
                return Ok(None);
            }

            let line = match self.lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => return self.on_eof().await,
                Err(e) => {
                    self.finished = true;
                    return Err(ProcessBackendError::Read(e).into());
                }
            };

            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            trace!("backend line: {}", truncate(line, 200));

            match parse_line(line) {
                ParsedLine::Events(events) => {
                    // Anything after a terminal event is not part of the run
                    if let Some(end) = events.iter().position(BackendEvent::is_terminal) {
                        self.pending.extend(events.into_iter().take(end + 1));
                        self.finished = true;
                    } else {
                        self.pending.extend(events);
                    }
                }
                ParsedLine::Fault(error) => {
                    self.finished = true;
                    return Err(error);
                }
                ParsedLine::Ignored => {}
            }
        }
    }

    async fn cancel(&mut self) {
        self.finished = true;
        self.pending.clear();
        if let Err(e) = self.child.start_kill() {
            // Already exited
            debug!("Backend kill skipped: {}", e);
        }
        match self.child.wait().await {
            Ok(status) => debug!("Backend session reaped ({})", status),
            Err(e) => warn!("Failed to reap backend process: {}", e),
        }
        if let Some(task) = self.stderr_task.take() {
            task.abort();
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use fleet_domain::CapabilityScope;
    use std::path::Path;

    fn sh(script: &str) -> ProcessBackend {
        ProcessBackend::new(ProcessBackendConfig::new("sh").with_args(["-c", script]))
    }

    fn spec(root: &Path, prompt: &str) -> SessionSpec {
        SessionSpec {
            prompt: prompt.to_string(),
            capabilities: CapabilityScope::new(["Read"]).unwrap(),
            working_root: root.to_path_buf(),
            max_turns: 5,
            model_id: Some("sonnet".to_string()),
        }
    }

    async fn drain(session: &mut Box<dyn BackendSession>) -> Result<Vec<BackendEvent>, BackendError> {
        let mut events = Vec::new();
        while let Some(event) = session.next_event().await? {
            events.push(event);
        }
        Ok(events)
    }

    #[tokio::test]
    async fn test_streams_events_until_result() {
        let dir = tempfile::tempdir().unwrap();
        let backend = sh(r#"cat >/dev/null
printf '%s\n' '{"type":"system","subtype":"init"}'
printf '%s\n' '{"type":"text","text":"hi"}'
printf '%s\n' '{"type":"tool_use","name":"Read","input":{}}'
printf '%s\n' '{"type":"result","subtype":"success","is_error":false}'
printf '%s\n' '{"type":"text","text":"after the end"}'"#);

        let mut session = backend.open_session(&spec(dir.path(), "task")).await.unwrap();
        let events = drain(&mut session).await.unwrap();

        assert_eq!(events.len(), 3);
        assert_eq!(events[0], BackendEvent::text("hi"));
        assert_eq!(events[2], BackendEvent::completed());
        session.cancel().await;
    }

    #[tokio::test]
    async fn test_prompt_goes_to_stdin_and_flags_to_args() {
        let dir = tempfile::tempdir().unwrap();
        // Under `sh -c`, trailing arguments become $0, $1, ...
        let backend = sh(r#"read -r prompt
printf '{"type":"text","text":"%s|%s %s|%s %s|%s %s"}\n' "$prompt" "$0" "$1" "$2" "$3" "$4" "$5""#);

        let mut session = backend
            .open_session(&spec(dir.path(), "summarize the week"))
            .await
            .unwrap();
        let events = drain(&mut session).await.unwrap();

        assert_eq!(
            events,
            vec![BackendEvent::text(
                "summarize the week|--max-turns 5|--allowed-tools Read|--model sonnet"
            )]
        );
    }

    #[tokio::test]
    async fn test_nonzero_exit_carries_stderr_tail() {
        let dir = tempfile::tempdir().unwrap();
        let backend = sh(r#"cat >/dev/null
printf '%s\n' '{"type":"text","text":"partial"}'
echo 'API Error: 429 rate limit exceeded' >&2
exit 3"#);

        let mut session = backend.open_session(&spec(dir.path(), "x")).await.unwrap();
        assert_eq!(
            session.next_event().await.unwrap(),
            Some(BackendEvent::text("partial"))
        );
        let err = session.next_event().await.unwrap_err();
        match err {
            BackendError::Session(message) => {
                assert!(message.contains("429 rate limit exceeded"), "{}", message);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_error_line_is_fault() {
        let dir = tempfile::tempdir().unwrap();
        let backend = sh(r#"cat >/dev/null
printf '%s\n' '{"type":"error","status":401,"message":"invalid api key"}'"#);

        let mut session = backend.open_session(&spec(dir.path(), "x")).await.unwrap();
        assert_eq!(
            session.next_event().await.unwrap_err(),
            BackendError::Rejected {
                status: Some(401),
                message: "invalid api key".to_string()
            }
        );
        assert_eq!(session.next_event().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_cancel_kills_hanging_child() {
        let dir = tempfile::tempdir().unwrap();
        let backend = sh("cat >/dev/null; sleep 30");

        let mut session = backend.open_session(&spec(dir.path(), "x")).await.unwrap();
        let cancelled = tokio::time::timeout(Duration::from_secs(5), session.cancel()).await;
        assert!(cancelled.is_ok());
        // Idempotent
        session.cancel().await;
        assert_eq!(session.next_event().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_missing_executable() {
        let dir = tempfile::tempdir().unwrap();
        let backend =
            ProcessBackend::new(ProcessBackendConfig::new("/nonexistent/agent-fleet-backend"));
        let err = match backend.open_session(&spec(dir.path(), "x")).await {
            Ok(_) => panic!("spawn should fail"),
            Err(e) => e,
        };
        assert!(matches!(err, BackendError::Other(_)));
    }

    #[test]
    fn test_keep_tail_respects_char_boundary() {
        assert_eq!(keep_tail("abcdef", 3), "def");
        assert_eq!(keep_tail("ab", 3), "ab");
        // 'é' is two bytes; cutting inside it moves forward
        assert_eq!(keep_tail("aéb", 2), "b");
    }
}
