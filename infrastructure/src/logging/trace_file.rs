//! Append-only trace file for one or more executions.
//!
//! Each [`TraceRecord`] becomes one line, `<rfc3339 ms> [kind] detail`, with
//! continuation lines of multi-line details indented by two spaces. Records
//! go through a bounded channel to a background writer so the engine never
//! waits on the disk. A full buffer, a failed write, or a write exceeding the
//! timeout loses that record and logs a warning; the run is unaffected.

use chrono::{SecondsFormat, Utc};
use fleet_application::{TraceRecord, TraceSink};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Writer tuning for [`FileTraceSink`].
#[derive(Debug, Clone, Copy)]
pub struct FileTraceOptions {
    /// Records queued ahead of the writer
    pub buffer: usize,
    /// Upper bound on one line write
    pub write_timeout: Duration,
}

impl Default for FileTraceOptions {
    fn default() -> Self {
        Self {
            buffer: 256,
            write_timeout: Duration::from_secs(2),
        }
    }
}

/// Trace sink appending to a file through a background task.
pub struct FileTraceSink {
    sender: Mutex<Option<mpsc::Sender<TraceRecord>>>,
    writer: Mutex<Option<JoinHandle<()>>>,
    dropped: Arc<AtomicU64>,
    path: PathBuf,
}

impl FileTraceSink {
    /// Open (append) the trace file and start the writer task.
    ///
    /// Creates parent directories as needed. Returns `None` if the file
    /// cannot be opened. Must be called from within a Tokio runtime.
    pub fn create(path: impl AsRef<Path>, options: FileTraceOptions) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(
                "Could not create trace directory {}: {}",
                parent.display(),
                e
            );
            return None;
        }

        let file = match std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
        {
            Ok(f) => tokio::fs::File::from_std(f),
            Err(e) => {
                warn!("Could not open trace file {}: {}", path.display(), e);
                return None;
            }
        };

        let (sender, receiver) = mpsc::channel(options.buffer.max(1));
        let dropped = Arc::new(AtomicU64::new(0));
        let writer = tokio::spawn(write_loop(
            file,
            receiver,
            options.write_timeout,
            dropped.clone(),
            path.to_path_buf(),
        ));

        debug!("Trace file opened: {}", path.display());

        Some(Self {
            sender: Mutex::new(Some(sender)),
            writer: Mutex::new(Some(writer)),
            dropped,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records lost to a full buffer, failed writes, or timeouts.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Stop accepting records and wait for queued ones to be written.
    pub async fn close(&self) {
        drop(
            self.sender
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .take(),
        );
        let writer = self
            .writer
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(writer) = writer
            && let Err(e) = writer.await
        {
            warn!("Trace writer for {} ended abnormally: {}", self.path.display(), e);
        }
    }
}

impl TraceSink for FileTraceSink {
    fn record(&self, record: TraceRecord) {
        let guard = self.sender.lock().unwrap_or_else(|e| e.into_inner());
        let Some(sender) = guard.as_ref() else {
            return;
        };

        match sender.try_send(record) {
            Ok(()) => {}
            Err(TrySendError::Full(record)) => {
                // Warn once per sink; later drops only count
                if self.dropped.fetch_add(1, Ordering::Relaxed) == 0 {
                    warn!(
                        "Trace buffer full for {}; dropping records (first: {})",
                        self.path.display(),
                        record.kind
                    );
                }
            }
            Err(TrySendError::Closed(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

async fn write_loop(
    mut file: tokio::fs::File,
    mut receiver: mpsc::Receiver<TraceRecord>,
    write_timeout: Duration,
    dropped: Arc<AtomicU64>,
    path: PathBuf,
) {
    while let Some(record) = receiver.recv().await {
        let line = format_record(&record);
        let write = async {
            file.write_all(line.as_bytes()).await?;
            file.flush().await
        };
        match tokio::time::timeout(write_timeout, write).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                dropped.fetch_add(1, Ordering::Relaxed);
                warn!("Trace write to {} failed: {}", path.display(), e);
            }
            Err(_) => {
                dropped.fetch_add(1, Ordering::Relaxed);
                warn!(
                    "Trace write to {} exceeded {:?}; record dropped",
                    path.display(),
                    write_timeout
                );
            }
        }
    }
    if let Err(e) = file.flush().await {
        warn!("Final trace flush for {} failed: {}", path.display(), e);
    }
}

fn format_record(record: &TraceRecord) -> String {
    let mut lines = record.detail.lines();
    let mut out = format!(
        "{} [{}] {}\n",
        record.at.to_rfc3339_opts(SecondsFormat::Millis, true),
        record.kind,
        lines.next().unwrap_or_default()
    );
    for line in lines {
        out.push_str("  ");
        out.push_str(line);
        out.push('\n');
    }
    out
}

/// Default trace file location for a run: `<dir>/<label>-<utc stamp>.trace`.
pub fn trace_path(dir: &Path, label: &str) -> PathBuf {
    let label: String = label
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let stamp = Utc::now().format("%Y%m%dT%H%M%S%.3fZ");
    dir.join(format!("{}-{}.trace", label, stamp))
}
