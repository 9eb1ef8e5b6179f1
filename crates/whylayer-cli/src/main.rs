// crates/whylayer-cli/src/main.rs
// ============================================================================
// Module: WhyLayer CLI Entry Point
// Description: Command dispatcher for the static server and the verifier.
// Purpose: Provide a safe, localized CLI for serving and probing the site.
// Dependencies: clap, thiserror, tokio, whylayer-harness, whylayer-serve.
// ============================================================================

//! ## Overview
//! The WhyLayer CLI hosts two workflows: `serve` runs the static file server
//! until an interrupt or termination signal arrives, and `verify` spawns the
//! server as a child process and drives the HTTP probe battery against it.
//! All user-facing strings are routed through the i18n catalog, except the
//! stdout readiness line, which is a stable machine-scraped contract.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::net::IpAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use thiserror::Error;
use whylayer_cli::i18n::Locale;
use whylayer_cli::i18n::set_locale;
use whylayer_cli::t;
use whylayer_harness::HarnessSettings;
use whylayer_harness::ProbeResult;
use whylayer_harness::ServerCommand;
use whylayer_harness::VerifyPlan;
use whylayer_serve::DEFAULT_PORT;
use whylayer_serve::ServerConfig;
use whylayer_serve::StaticFileServer;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment variable for CLI locale selection.
const LANG_ENV: &str = "WHYLAYER_LANG";

/// Default port the verifier uses for the spawned server.
const DEFAULT_VERIFY_PORT: u16 = 9999;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "whylayer", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", short = 'V', action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Preferred output language (overrides `WHYLAYER_LANG`).
    #[arg(long, value_enum, value_name = "LANG", global = true)]
    lang: Option<LangArg>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the static file server.
    Serve(ServeCommand),
    /// Spawn the server and run the HTTP probe battery against it.
    Verify(VerifyCommand),
}

/// Arguments for the `serve` command.
#[derive(Args, Debug)]
struct ServeCommand {
    /// TCP port to bind (defaults to 8080).
    #[arg(value_name = "PORT", value_parser = clap::value_parser!(u16).range(1..))]
    port: Option<u16>,
    /// Root directory served to clients.
    #[arg(long, value_name = "DIR", default_value = ".")]
    root: PathBuf,
    /// Bind host address (defaults to loopback).
    #[arg(long, value_name = "ADDR")]
    host: Option<IpAddr>,
}

/// Arguments for the `verify` command.
#[derive(Args, Debug)]
struct VerifyCommand {
    /// Port the spawned server listens on.
    #[arg(long, value_name = "PORT", default_value_t = DEFAULT_VERIFY_PORT, value_parser = clap::value_parser!(u16).range(1..))]
    port: u16,
    /// Server binary to spawn (defaults to this executable).
    #[arg(long, value_name = "PATH")]
    server_bin: Option<PathBuf>,
    /// Root directory the spawned server serves.
    #[arg(long, value_name = "DIR", default_value = ".")]
    root: PathBuf,
    /// Optional TOML probe plan (defaults to the built-in battery).
    #[arg(long, value_name = "PATH")]
    plan: Option<PathBuf>,
    /// Readiness wait window in milliseconds.
    #[arg(long, value_name = "MS", default_value_t = 2_000)]
    readiness_timeout_ms: u64,
    /// Per-request probe timeout in milliseconds.
    #[arg(long, value_name = "MS", default_value_t = 5_000)]
    request_timeout_ms: u64,
    /// Grace window before forced termination in milliseconds.
    #[arg(long, value_name = "MS", default_value_t = 2_000)]
    grace_timeout_ms: u64,
}

/// CLI locale argument values.
#[derive(ValueEnum, Copy, Clone, Debug)]
enum LangArg {
    /// English.
    En,
    /// Catalan.
    Ca,
}

impl From<LangArg> for Locale {
    fn from(value: LangArg) -> Self {
        match value {
            LangArg::En => Self::En,
            LangArg::Ca => Self::Ca,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for localized error messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a localized message.
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    let env_lang = std::env::var(LANG_ENV).ok();
    let locale = resolve_locale(cli.lang, env_lang.as_deref())?;
    set_locale(locale);
    if locale != Locale::En {
        write_stderr_line(&t!("i18n.disclaimer.machine_translated"))
            .map_err(|err| CliError::new(output_error("stderr", &err)))?;
    }

    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&t!("main.version", version = version))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    match command {
        Commands::Serve(command) => command_serve(command).await,
        Commands::Verify(command) => command_verify(command).await,
    }
}

/// Prints top-level help when no subcommand is given.
fn show_help() -> CliResult<()> {
    Cli::command()
        .print_long_help()
        .map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Resolves the output locale from the flag and environment.
fn resolve_locale(lang: Option<LangArg>, env_lang: Option<&str>) -> CliResult<Locale> {
    if let Some(lang) = lang {
        return Ok(lang.into());
    }
    if let Some(value) = env_lang {
        return Locale::parse(value).ok_or_else(|| {
            CliError::new(t!("i18n.lang.invalid_env", env = LANG_ENV, value = value))
        });
    }
    Ok(Locale::En)
}

// ============================================================================
// SECTION: Serve Command
// ============================================================================

/// Executes the `serve` command.
async fn command_serve(command: ServeCommand) -> CliResult<ExitCode> {
    let port = command.port.unwrap_or(DEFAULT_PORT);
    let config = match command.host {
        Some(host) => ServerConfig::with_host(port, &command.root, host),
        None => ServerConfig::new(port, &command.root),
    }
    .map_err(|err| CliError::new(t!("serve.config.invalid", error = err)))?;

    let server = StaticFileServer::bind(config)
        .await
        .map_err(|err| CliError::new(t!("serve.bind_failed", error = err)))?;

    // The readiness line is scraped by the verifier; it is written verbatim
    // and never localized.
    write_stdout_line(&server.readiness_line())
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;

    let handle = server.handle();
    tokio::spawn(async move {
        shutdown_signal().await;
        handle.shutdown();
    });

    server.serve().await.map_err(|err| CliError::new(t!("serve.failed", error = err)))?;
    write_stdout_line(&t!("serve.stopped"))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Resolves once an interrupt or termination signal arrives.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let Ok(mut terminate) =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        else {
            let _ = tokio::signal::ctrl_c().await;
            return;
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = terminate.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

// ============================================================================
// SECTION: Verify Command
// ============================================================================

/// Executes the `verify` command.
async fn command_verify(command: VerifyCommand) -> CliResult<ExitCode> {
    let plan = match &command.plan {
        Some(path) => VerifyPlan::load(path)
            .map_err(|err| CliError::new(t!("verify.plan.load_failed", error = err)))?,
        None => VerifyPlan::default_plan(),
    };

    let program = match command.server_bin {
        Some(path) => path,
        None => std::env::current_exe()
            .map_err(|err| CliError::new(t!("verify.infra_failed", error = err)))?,
    };
    let server_command = ServerCommand {
        program,
        args: vec![
            "serve".to_string(),
            command.port.to_string(),
            "--root".to_string(),
            command.root.display().to_string(),
        ],
    };

    write_stdout_line(&t!("verify.starting", port = command.port))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;

    let mut settings = HarnessSettings::new(server_command, command.port);
    settings.readiness_window = Duration::from_millis(command.readiness_timeout_ms);
    settings.request_timeout = Duration::from_millis(command.request_timeout_ms);
    settings.grace_window = Duration::from_millis(command.grace_timeout_ms);

    let report = whylayer_harness::run(&settings, &plan)
        .await
        .map_err(|err| CliError::new(t!("verify.infra_failed", error = err)))?;

    render_report(&report)?;
    if report.success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

/// Renders the probe report and summary lines.
fn render_report(report: &whylayer_harness::HarnessReport) -> CliResult<()> {
    let readiness = if report.readiness_observed {
        t!("verify.ready")
    } else {
        t!("verify.not_ready")
    };
    write_stdout_line(&readiness)
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;

    for result in &report.results {
        write_stdout_line(&render_probe_line(result))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    }

    for line in &report.server_stderr {
        write_stderr_line(&t!("verify.server_stderr", line = line))
            .map_err(|err| CliError::new(output_error("stderr", &err)))?;
    }
    if report.forced_kill {
        write_stderr_line(&t!("verify.teardown.forced"))
            .map_err(|err| CliError::new(output_error("stderr", &err)))?;
    }

    let seconds = format!("{:.2}", report.duration.as_secs_f64());
    write_stdout_line(&t!("verify.summary.header"))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    write_stdout_line(&t!(
        "verify.summary.counts",
        total = report.results.len(),
        passed = report.passed(),
        failed = report.failed(),
        seconds = seconds
    ))
    .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    let verdict = if report.success() {
        t!("verify.summary.ok")
    } else {
        t!("verify.summary.failed")
    };
    write_stdout_line(&verdict).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(())
}

/// Renders one probe result line.
fn render_probe_line(result: &ProbeResult) -> String {
    if result.passed {
        t!(
            "verify.probe.pass",
            name = result.scenario.name,
            path = result.scenario.target_path
        )
    } else {
        let reason = result
            .failure_reason
            .as_ref()
            .map_or_else(String::new, ToString::to_string);
        t!(
            "verify.probe.fail",
            name = result.scenario.name,
            path = result.scenario.target_path,
            reason = reason
        )
    }
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats a localized output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    let stream_label = match stream {
        "stdout" => t!("output.stream.stdout"),
        "stderr" => t!("output.stream.stderr"),
        _ => t!("output.stream.unknown"),
    };
    t!("output.write_failed", stream = stream_label, error = error)
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
