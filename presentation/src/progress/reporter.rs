//! Progress reporting while an execution streams

use colored::Colorize;
use fleet_application::ExecutionProgress;
use fleet_domain::{BackendEvent, ExecutionResult, truncate};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;

/// Spinner showing the current agent, elapsed time and live counters
pub struct ProgressReporter {
    bar: Mutex<Option<ProgressBar>>,
    counts: Mutex<(u64, u64)>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
            counts: Mutex::new((0, 0)),
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold.cyan} [{elapsed}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionProgress for ProgressReporter {
    fn on_start(&self, label: &str, timeout_seconds: u64) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(Self::spinner_style());
        pb.set_prefix(label.to_string());
        pb.set_message(format!("starting (budget {}s)", timeout_seconds));
        pb.enable_steady_tick(Duration::from_millis(120));

        *self.counts.lock().unwrap_or_else(|e| e.into_inner()) = (0, 0);
        // A retry replaces the previous attempt's spinner
        if let Some(old) = self
            .bar
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .replace(pb)
        {
            old.finish_and_clear();
        }
    }

    fn on_event(&self, event: &BackendEvent) {
        let (messages, tools) = {
            let mut counts = self.counts.lock().unwrap_or_else(|e| e.into_inner());
            match event {
                BackendEvent::Text { .. } => counts.0 += 1,
                BackendEvent::ToolInvocation { .. } => counts.1 += 1,
                _ => {}
            }
            *counts
        };

        let current = match event {
            BackendEvent::ToolInvocation { name, .. } => format!("tool {}", name),
            BackendEvent::Text { text } => truncate(text.trim(), 40).replace('\n', " "),
            _ => String::new(),
        };

        if let Some(pb) = self.bar.lock().unwrap_or_else(|e| e.into_inner()).as_ref() {
            pb.set_message(format!("{} msg / {} tools  {}", messages, tools, current));
        }
    }

    fn on_finish(&self, result: &ExecutionResult) {
        if let Some(pb) = self.bar.lock().unwrap_or_else(|e| e.into_inner()).take() {
            let status = if result.succeeded {
                format!("{} {}", "v".green(), result.final_state)
            } else {
                format!("{} {}", "x".red(), result.final_state)
            };
            pb.finish_with_message(format!("{} in {}ms", status, result.duration_millis));
        }
    }
}

/// Simple text-based progress (no fancy UI), for non-terminal stderr
pub struct SimpleProgress;

impl ExecutionProgress for SimpleProgress {
    fn on_start(&self, label: &str, timeout_seconds: u64) {
        eprintln!(
            "{} {} (budget {}s)",
            "->".cyan(),
            label.bold(),
            timeout_seconds
        );
    }

    fn on_event(&self, event: &BackendEvent) {
        if let BackendEvent::ToolInvocation { name, .. } = event {
            eprintln!("  {} {}", "tool".dimmed(), name);
        }
    }

    fn on_finish(&self, result: &ExecutionResult) {
        if result.succeeded {
            eprintln!("  {} {}", "v".green(), result.final_state);
        } else {
            eprintln!("  {} {}", "x".red(), result.final_state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_domain::ExecutionTally;

    #[test]
    fn test_reporter_counts_events_and_finishes() {
        let reporter = ProgressReporter::new();
        reporter.on_start("crm", 30);
        reporter.on_event(&BackendEvent::text("hello"));
        reporter.on_event(&BackendEvent::tool_invocation("Read", serde_json::Value::Null));
        reporter.on_event(&BackendEvent::text("world"));
        assert_eq!(*reporter.counts.lock().unwrap(), (2, 1));

        reporter.on_finish(&ExecutionResult::completed(ExecutionTally::new(), 5));
        assert!(reporter.bar.lock().unwrap().is_none());
    }

    #[test]
    fn test_restart_resets_counts() {
        let reporter = ProgressReporter::new();
        reporter.on_start("crm", 30);
        reporter.on_event(&BackendEvent::text("first attempt"));
        reporter.on_start("crm", 30);
        assert_eq!(*reporter.counts.lock().unwrap(), (0, 0));
    }
}
