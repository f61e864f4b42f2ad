//! Console output formatter for execution results, registry listings,
//! classifications and status snapshots

use colored::{ColoredString, Colorize};
use fleet_application::DispatchOutcome;
use fleet_domain::{
    AgentConfig, Classification, ConfigIssue, ExecutionResult, HealthState, Severity,
    StatusSnapshot,
};
use serde_json::json;

/// Formats results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    // ==================== Execution ====================

    /// Format one dispatch: the agent's final result plus the decision.
    pub fn format_dispatch(outcome: &DispatchOutcome) -> String {
        let mut output = String::new();

        output.push_str(&Self::header(&format!("Agent: {}", outcome.agent)));
        output.push('\n');
        output.push_str(&Self::format_result(&outcome.result));

        if let Some(classification) = &outcome.classification {
            output.push_str(&Self::section_header("Classification"));
            output.push_str(&Self::classification_lines(classification));
        }

        let decision = outcome.decision.to_string();
        output.push_str(&format!(
            "\n{} {} (after {} attempt{})\n",
            "Decision:".cyan().bold(),
            if outcome.decision.is_success() {
                decision.green().bold()
            } else {
                decision.red().bold()
            },
            outcome.attempts,
            if outcome.attempts == 1 { "" } else { "s" }
        ));
        output.push_str(&Self::footer());

        output
    }

    /// Format a single execution result
    pub fn format_result(result: &ExecutionResult) -> String {
        let mut output = String::new();

        let state = result.final_state.to_string();
        output.push_str(&format!(
            "{} {}  {} {}ms  {} {}  {} {}\n",
            "State:".cyan().bold(),
            if result.succeeded {
                state.green()
            } else {
                state.red()
            },
            "Duration:".cyan().bold(),
            result.duration_millis,
            "Messages:".cyan().bold(),
            result.message_count,
            "Tools:".cyan().bold(),
            result.tool_invocation_count,
        ));

        if let Some(failure) = &result.failure {
            output.push_str(&format!(
                "{} {}\n",
                "Failure:".red().bold(),
                failure.message
            ));
        }

        if !result.response_text.is_empty() {
            output.push_str(&Self::section_header("Response"));
            output.push_str(&result.response_text);
            output.push('\n');
        }

        if let Some(payload) = &result.structured_payload {
            output.push_str(&Self::section_header("Payload"));
            output.push_str(
                &serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string()),
            );
            output.push('\n');
        }

        output
    }

    pub fn format_dispatch_json(outcome: &DispatchOutcome) -> String {
        let value = json!({
            "agent": outcome.agent,
            "decision": outcome.decision.to_string(),
            "retry_after_ms": match outcome.decision {
                fleet_application::DispatchDecision::RetryLater(delay) => Some(delay.as_millis() as u64),
                _ => None,
            },
            "attempts": outcome.attempts,
            "result": outcome.result,
            "classification": outcome.classification,
        });
        serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn format_result_json(
        result: &ExecutionResult,
        classification: Option<&Classification>,
    ) -> String {
        let value = json!({
            "result": result,
            "classification": classification,
        });
        serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string())
    }

    // ==================== Classification ====================

    pub fn format_classification(classification: &Classification) -> String {
        Self::classification_lines(classification)
    }

    pub fn format_classification_json(classification: &Classification) -> String {
        serde_json::to_string_pretty(classification).unwrap_or_else(|_| "{}".to_string())
    }

    fn classification_lines(classification: &Classification) -> String {
        format!(
            "{} {}\n{} {}\n{} {}\n",
            "Category:  ".cyan().bold(),
            classification.category.to_string().yellow().bold(),
            "Action:    ".cyan().bold(),
            classification.action,
            "Diagnostic:".cyan().bold(),
            classification.diagnostic
        )
    }

    // ==================== Registry ====================

    pub fn format_agent_list(agents: &[std::sync::Arc<AgentConfig>]) -> String {
        if agents.is_empty() {
            return format!("{}\n", "No agents registered.".dimmed());
        }

        let width = agents.iter().map(|a| a.name.len()).max().unwrap_or(0);
        let mut output = String::new();
        for agent in agents {
            let name = format!("{:<width$}", agent.name, width = width);
            let name = if agent.enabled {
                name.bold()
            } else {
                name.dimmed()
            };
            output.push_str(&format!(
                "{}  {}  {}{}\n",
                name,
                agent.model_id,
                agent.capabilities,
                if agent.enabled {
                    String::new()
                } else {
                    format!("  {}", "(disabled)".dimmed())
                }
            ));
        }
        output
    }

    pub fn format_agent(agent: &AgentConfig) -> String {
        let mut output = String::new();
        output.push_str(&Self::header(&format!("Agent: {}", agent.name)));
        output.push('\n');
        let rows = [
            ("Enabled", agent.enabled.to_string()),
            ("Model", agent.model_id.clone()),
            ("Capabilities", agent.capabilities.to_string()),
            ("Working root", agent.working_root.display().to_string()),
            ("Max turns", agent.max_turns.to_string()),
            ("Timeout", format!("{}s", agent.timeout_seconds)),
        ];
        for (label, value) in rows {
            output.push_str(&format!("{} {}\n", format!("{:<13}", label).cyan().bold(), value));
        }
        output.push_str(&Self::footer());
        output
    }

    /// Format config issues, one per line. Empty input yields an empty string.
    pub fn format_issues(issues: &[ConfigIssue]) -> String {
        issues
            .iter()
            .map(|issue| {
                let tag = match issue.severity {
                    Severity::Error => "error".red().bold(),
                    Severity::Warning => "warning".yellow().bold(),
                };
                format!("  {}: {}\n", tag, issue.message)
            })
            .collect()
    }

    // ==================== Status ====================

    pub fn format_status(snapshot: &StatusSnapshot) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "{} {}  {}\n\n",
            "Overall:".cyan().bold(),
            Self::health(snapshot.overall()),
            snapshot
                .generated_at
                .format("%Y-%m-%d %H:%M:%S UTC")
                .to_string()
                .dimmed()
        ));

        let width = snapshot
            .subsystems
            .iter()
            .map(|s| s.name.len())
            .max()
            .unwrap_or(0);
        for status in &snapshot.subsystems {
            let last = status
                .last_activity
                .map(|at| at.format("%H:%M:%S").to_string())
                .unwrap_or_else(|| "-".to_string());
            output.push_str(&format!(
                "{:<width$}  {:<8}  {:>8}  {}\n",
                status.name,
                Self::health(status.health),
                last,
                status.detail.as_deref().unwrap_or(""),
                width = width
            ));
        }
        output
    }

    pub fn format_status_json(snapshot: &StatusSnapshot) -> String {
        let value = json!({
            "overall": snapshot.overall(),
            "generated_at": snapshot.generated_at,
            "subsystems": snapshot.subsystems,
        });
        serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string())
    }

    fn health(health: HealthState) -> ColoredString {
        match health {
            HealthState::Healthy => health.as_str().green(),
            HealthState::Degraded => health.as_str().yellow(),
            HealthState::Down => health.as_str().red().bold(),
        }
    }

    // ==================== Layout ====================

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }
}
