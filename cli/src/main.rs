//! CLI entrypoint for agent-fleet
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::Parser;
use fleet_application::{
    AgentRegistry, DispatchAgentUseCase, DispatchDecision, DispatchInput, EngineParams,
    ExecuteAgentUseCase, ExecutionProgress, ExecutionRequest, NoActivityStore, NoProgress,
    ReportStatusUseCase,
};
use fleet_domain::{CapabilityScope, FailureClassifier, FailureSource, RawFailure};
use fleet_infrastructure::{
    ConfigLoader, FileConfig, FileTraceSink, InMemoryActivityStore, ProcessBackend,
    YamlRegistrySource, trace_path,
};
use fleet_presentation::{
    Cli, Command, ConsoleFormatter, OutputFormat, ProgressReporter, SimpleProgress,
};
use std::io::{IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Exit code when the dispatch should be retried later (EX_TEMPFAIL).
const EXIT_RETRY_LATER: u8 = 75;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let _log_guard = init_logging(cli.verbose, cli.log_dir.as_deref())?;

    info!("Starting agent-fleet");

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?
    };

    if !matches!(cli.command, Command::Validate) {
        for issue in config.validate() {
            warn!("{}", issue.message);
        }
        config.check()?;
    }

    let registry_path = cli
        .registry
        .clone()
        .unwrap_or_else(|| config.registry.path.clone());

    match cli.command {
        Command::Run {
            agent,
            task,
            trace,
            output,
        } => {
            let registry = load_registry(&config, &registry_path)?;
            let task = read_task(task)?;
            run_agent(&config, registry, agent, task, trace, output, cli.quiet).await
        }
        Command::Exec {
            task,
            allow,
            root,
            max_turns,
            timeout,
            model,
            trace,
            output,
        } => {
            let capabilities = if allow.is_empty() {
                CapabilityScope::none()
            } else {
                CapabilityScope::new(allow)?
            };
            let mut request =
                ExecutionRequest::ad_hoc(read_task(task)?, capabilities, root, max_turns, timeout);
            if let Some(model) = model {
                request = request.with_model(model);
            }
            exec_request(&config, request, trace, output, cli.quiet).await
        }
        Command::Agents { all } => {
            let registry = load_registry(&config, &registry_path)?;
            let agents: Vec<_> = registry
                .list(!all)
                .iter()
                .filter_map(|name| registry.get(name).ok())
                .collect();
            print!("{}", ConsoleFormatter::format_agent_list(&agents));
            Ok(ExitCode::SUCCESS)
        }
        Command::Show { agent } => {
            let registry = load_registry(&config, &registry_path)?;
            let agent = registry.get(&agent)?;
            print!("{}", ConsoleFormatter::format_agent(&agent));
            Ok(ExitCode::SUCCESS)
        }
        Command::Validate => validate(&config, &registry_path),
        Command::Classify {
            message,
            status,
            tool,
            deadline,
            streak,
            output,
        } => {
            let mut raw = match (tool, deadline) {
                (Some(tool), _) => RawFailure::tool(tool, message),
                (None, true) => RawFailure::new(FailureSource::Deadline, message),
                (None, false) => RawFailure::backend(message),
            };
            if let Some(status) = status {
                raw = raw.with_status(status);
            }
            let classification =
                FailureClassifier::new(config.recovery.to_policy()).classify(&raw, streak);
            match output {
                OutputFormat::Text => {
                    print!("{}", ConsoleFormatter::format_classification(&classification))
                }
                OutputFormat::Json => println!(
                    "{}",
                    ConsoleFormatter::format_classification_json(&classification)
                ),
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Config => {
            ConfigLoader::print_config_sources(cli.config.as_ref());
            println!();
            println!("Effective configuration:");
            println!("{}", toml::to_string_pretty(&config)?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Status { output } => {
            let registry = load_registry(&config, &registry_path)?;
            let status = ReportStatusUseCase::new(registry, Arc::new(NoActivityStore), "process")
                .snapshot();
            match output {
                OutputFormat::Text => print!("{}", ConsoleFormatter::format_status(&status)),
                OutputFormat::Json => {
                    println!("{}", ConsoleFormatter::format_status_json(&status))
                }
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Initialize logging based on verbosity level. `RUST_LOG` takes precedence.
fn init_logging(verbose: u8, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, "agent-fleet.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(writer),
                )
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .init();
            Ok(None)
        }
    }
}

fn load_registry(config: &FileConfig, path: &Path) -> Result<Arc<AgentRegistry>> {
    let (policy, _) = config.registry.parse_unknown_agent();
    let source = Arc::new(YamlRegistrySource::from_file(path));
    Ok(Arc::new(AgentRegistry::load(source, policy)?))
}

/// `-` reads the task from stdin.
fn read_task(task: String) -> Result<String> {
    if task != "-" {
        return Ok(task);
    }
    let mut buffer = String::new();
    std::io::stdin()
        .read_to_string(&mut buffer)
        .context("Failed to read task from stdin")?;
    if buffer.trim().is_empty() {
        bail!("Task read from stdin is empty");
    }
    Ok(buffer)
}

fn progress_for(quiet: bool) -> Box<dyn ExecutionProgress> {
    if quiet {
        Box::new(NoProgress)
    } else if std::io::stderr().is_terminal() {
        Box::new(ProgressReporter::new())
    } else {
        Box::new(SimpleProgress)
    }
}

/// Cancel the execution on Ctrl-C. Teardown goes through the same path as
/// the deadline.
fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted; cancelling execution");
            child.cancel();
        }
    });
    token
}

fn engine(config: &FileConfig) -> ExecuteAgentUseCase<ProcessBackend> {
    let backend = Arc::new(ProcessBackend::new(config.backend.to_process_config()));
    ExecuteAgentUseCase::new(backend)
        .with_params(EngineParams::default().with_cancel_grace(config.backend.cancel_grace()))
        .with_cancellation(cancel_on_ctrl_c())
}

fn open_trace(
    config: &FileConfig,
    explicit: Option<PathBuf>,
    label: &str,
) -> Option<Arc<FileTraceSink>> {
    let path = explicit.or_else(|| {
        config
            .trace
            .dir
            .as_deref()
            .map(|dir| trace_path(dir, label))
    })?;
    let sink = FileTraceSink::create(&path, config.trace.to_options())?;
    info!("Tracing execution to {}", path.display());
    Some(Arc::new(sink))
}

async fn close_trace(sink: Option<Arc<FileTraceSink>>) {
    if let Some(sink) = sink {
        sink.close().await;
        if sink.dropped() > 0 {
            warn!(
                "{} trace record(s) were dropped for {}",
                sink.dropped(),
                sink.path().display()
            );
        }
    }
}

async fn run_agent(
    config: &FileConfig,
    registry: Arc<AgentRegistry>,
    agent: String,
    task: String,
    trace: Option<PathBuf>,
    output: OutputFormat,
    quiet: bool,
) -> Result<ExitCode> {
    let activity = Arc::new(InMemoryActivityStore::new(
        config.status.capacity,
        config.status.ttl(),
    ));
    let dispatcher = DispatchAgentUseCase::new(
        registry,
        engine(config),
        FailureClassifier::new(config.recovery.to_policy()),
        activity,
    )
    .with_params(config.recovery.to_dispatch_params());

    let sink = open_trace(config, trace, &agent);
    let mut input = DispatchInput::new(agent, task);
    if let Some(sink) = &sink {
        input = input.with_trace_sink(sink.clone());
    }

    let progress = progress_for(quiet || output == OutputFormat::Json);
    let outcome = dispatcher
        .dispatch_with_progress(input, progress.as_ref())
        .await;
    close_trace(sink).await;
    let outcome = outcome?;

    match output {
        OutputFormat::Text => print!("{}", ConsoleFormatter::format_dispatch(&outcome)),
        OutputFormat::Json => println!("{}", ConsoleFormatter::format_dispatch_json(&outcome)),
    }

    Ok(match outcome.decision {
        DispatchDecision::Succeeded => ExitCode::SUCCESS,
        DispatchDecision::RetryLater(_) => ExitCode::from(EXIT_RETRY_LATER),
        _ => ExitCode::FAILURE,
    })
}

async fn exec_request(
    config: &FileConfig,
    request: ExecutionRequest,
    trace: Option<PathBuf>,
    output: OutputFormat,
    quiet: bool,
) -> Result<ExitCode> {
    let sink = open_trace(config, trace, request.label());
    let request = match &sink {
        Some(sink) => request.with_trace_sink(sink.clone()),
        None => request,
    };

    let progress = progress_for(quiet || output == OutputFormat::Json);
    let result = engine(config)
        .execute_with_progress(&request, progress.as_ref())
        .await;
    close_trace(sink).await;
    let result = result?;

    let classification = RawFailure::of(&result)
        .map(|raw| FailureClassifier::new(config.recovery.to_policy()).classify(raw, 1));
    let result = match &classification {
        Some(classification) => result.classified(classification),
        None => result,
    };

    match output {
        OutputFormat::Text => {
            print!("{}", ConsoleFormatter::format_result(&result));
            if let Some(classification) = &classification {
                print!("{}", ConsoleFormatter::format_classification(classification));
            }
        }
        OutputFormat::Json => println!(
            "{}",
            ConsoleFormatter::format_result_json(&result, classification.as_ref())
        ),
    }

    Ok(if result.succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn validate(config: &FileConfig, registry_path: &Path) -> Result<ExitCode> {
    let mut failed = false;

    let config_issues = config.validate();
    println!("Configuration:");
    if config_issues.is_empty() {
        println!("  ok");
    } else {
        print!("{}", ConsoleFormatter::format_issues(&config_issues));
    }
    failed |= fleet_domain::ConfigIssue::has_errors(&config_issues);

    println!("Registry ({}):", registry_path.display());
    match load_registry(config, registry_path) {
        Ok(registry) => {
            let issues = registry.issues();
            println!("  {} agent(s) loaded", registry.list(false).len());
            print!("{}", ConsoleFormatter::format_issues(&issues));
            failed |= !issues.is_empty();
        }
        Err(e) => {
            println!("  {}", e);
            failed = true;
        }
    }

    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
