//! CLI command definitions

use clap::{Parser, Subcommand, ValueEnum};
use fleet_domain::agent::config::{DEFAULT_MAX_TURNS, DEFAULT_TIMEOUT_SECONDS};
use std::path::PathBuf;

/// Output format for results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable, colored when attached to a terminal
    #[default]
    Text,
    /// JSON output
    Json,
}

/// CLI arguments for agent-fleet
#[derive(Parser, Debug)]
#[command(name = "agent-fleet")]
#[command(author, version, about = "Run configured automation agents against an inference backend")]
#[command(long_about = r#"
agent-fleet dispatches natural-language tasks to registered agents. Each agent
has a capability scope (which tools it may invoke), a working root, and turn
and wall-clock budgets. Failures are classified (AUTH, RATE_LIMIT, NETWORK,
DATA, TOOL_PROVIDER, TIMEOUT, UNKNOWN) and mapped to a recovery action.

Configuration files are loaded from (in priority order):
1. FLEET_<SECTION>__<KEY>                 Environment overrides
2. --config <path>                        Explicit config file
3. ./fleet.toml                           Project-level config
4. ~/.config/agent-fleet/config.toml      Global config

Example:
  agent-fleet run crm "Summarize this week's new leads as JSON"
  agent-fleet exec --allow Read --allow 'mcp__sheets__*' --root ./data "Count rows"
  agent-fleet classify "HTTP 429: too many requests" --streak 3
"#)]
pub struct Cli {
    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Agent registry document (overrides registry.path)
    #[arg(long, value_name = "PATH", global = true)]
    pub registry: Option<PathBuf>,

    /// Also write diagnostic logs to daily-rolling files in this directory
    #[arg(long, value_name = "DIR", global = true)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Dispatch a task to a registered agent (with classification and retries)
    Run {
        /// Agent name from the registry
        agent: String,

        /// Task prompt; "-" reads it from stdin
        task: String,

        /// Write the execution trace to this file
        #[arg(long, value_name = "PATH")]
        trace: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Run a single ad-hoc execution without a registry entry
    Exec {
        /// Task prompt; "-" reads it from stdin
        task: String,

        /// Permitted tool pattern (repeatable; "*" for unrestricted)
        #[arg(long = "allow", value_name = "PATTERN")]
        allow: Vec<String>,

        /// Working root for tool calls
        #[arg(long, value_name = "DIR", default_value = ".")]
        root: PathBuf,

        /// Turn budget
        #[arg(long, default_value_t = DEFAULT_MAX_TURNS)]
        max_turns: u32,

        /// Wall-clock budget in seconds
        #[arg(long, value_name = "SECS", default_value_t = DEFAULT_TIMEOUT_SECONDS)]
        timeout: u64,

        /// Backend model selector
        #[arg(long)]
        model: Option<String>,

        /// Write the execution trace to this file
        #[arg(long, value_name = "PATH")]
        trace: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// List registered agents
    Agents {
        /// Include disabled agents
        #[arg(long)]
        all: bool,
    },

    /// Show one agent's configuration
    Show {
        agent: String,
    },

    /// Validate the configuration and the agent registry
    Validate,

    /// Classify a failure message and show the recovery action
    Classify {
        /// Raw failure message
        message: String,

        /// HTTP-like status code reported with the failure
        #[arg(long)]
        status: Option<u16>,

        /// Attribute the failure to this tool
        #[arg(long, value_name = "NAME", conflicts_with = "deadline")]
        tool: Option<String>,

        /// Treat the failure as the engine's own deadline
        #[arg(long)]
        deadline: bool,

        /// Consecutive same-category failures including this one
        #[arg(long, default_value_t = 1)]
        streak: u32,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Show configuration file locations
    Config,

    /// Show the status of the registry, the backend, and each agent
    Status {
        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        output: OutputFormat,
    },
}
