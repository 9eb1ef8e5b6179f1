// crates/whylayer-harness/src/session.rs
// ============================================================================
// Module: Harness Session
// Description: Orchestrates spawn, readiness, ordered probes, and teardown.
// Purpose: Produce a deterministic report with guaranteed child cleanup.
// Dependencies: reqwest, tokio
// ============================================================================

//! ## Overview
//! [`run`] drives one complete harness session. Probe faults are recorded,
//! never propagated, so the scenario loop cannot exit early; the only fatal
//! paths are plan validation and child spawn, both of which occur before any
//! probe. Teardown is reached on every non-fatal path and consumes the child
//! handle, so it executes exactly once per session.
//!
//! ## Invariants
//! - Probes run strictly in declaration order, never concurrently.
//! - The readiness wait precedes the first probe.
//! - No child process survives a returned report.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;
use std::time::Instant;

use thiserror::Error;

use crate::probe::ProbeResult;
use crate::probe::run_probe;
use crate::process::ServerCommand;
use crate::process::ServerProcess;
use crate::process::SpawnError;
use crate::scenario::VerifyPlan;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default wait window for the readiness marker.
pub const DEFAULT_READINESS_WINDOW: Duration = Duration::from_millis(2_000);

/// Default per-request probe timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(5_000);

/// Default grace window before a forced kill.
pub const DEFAULT_GRACE_WINDOW: Duration = Duration::from_millis(2_000);

/// Default drain delay after the child reaches ground state.
pub const DEFAULT_DRAIN_DELAY: Duration = Duration::from_millis(1_000);

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Fatal harness faults; probe failures are report data, not errors.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// The server child could not be spawned.
    #[error(transparent)]
    Spawn(#[from] SpawnError),
    /// The HTTP probe client could not be constructed.
    #[error("failed to build probe client: {0}")]
    Client(#[source] reqwest::Error),
}

// ============================================================================
// SECTION: Types
// ============================================================================

/// Settings for one harness session.
#[derive(Debug, Clone)]
pub struct HarnessSettings {
    /// Command used to start the server under test.
    pub command: ServerCommand,
    /// Port the server is expected to listen on.
    pub port: u16,
    /// Wait window for the readiness marker.
    pub readiness_window: Duration,
    /// Per-request probe timeout.
    pub request_timeout: Duration,
    /// Grace window before forced termination.
    pub grace_window: Duration,
    /// Drain delay after the child stops.
    pub drain_delay: Duration,
}

impl HarnessSettings {
    /// Builds settings with the default timing windows.
    #[must_use]
    pub const fn new(command: ServerCommand, port: u16) -> Self {
        Self {
            command,
            port,
            readiness_window: DEFAULT_READINESS_WINDOW,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            grace_window: DEFAULT_GRACE_WINDOW,
            drain_delay: DEFAULT_DRAIN_DELAY,
        }
    }
}

/// Aggregate outcome of a harness session.
#[derive(Debug)]
pub struct HarnessReport {
    /// Probe results in scenario declaration order.
    pub results: Vec<ProbeResult>,
    /// Whether the readiness marker was observed inside the window.
    pub readiness_observed: bool,
    /// Whether teardown escalated to a forced kill.
    pub forced_kill: bool,
    /// Server exit code, when it exited normally.
    pub server_exit_code: Option<i32>,
    /// Child stderr lines collected during the session.
    pub server_stderr: Vec<String>,
    /// Wall-clock duration of the session.
    pub duration: Duration,
}

impl HarnessReport {
    /// Returns the number of passed probes.
    #[must_use]
    pub fn passed(&self) -> usize {
        self.results.iter().filter(|result| result.passed).count()
    }

    /// Returns the number of failed probes.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.results.len() - self.passed()
    }

    /// Returns whether every probe passed.
    #[must_use]
    pub fn success(&self) -> bool {
        self.results.iter().all(|result| result.passed)
    }
}

// ============================================================================
// SECTION: Session
// ============================================================================

/// Runs one harness session over the given plan.
///
/// # Errors
///
/// Returns [`HarnessError`] only for infrastructure faults before probing:
/// client construction and child spawn. Every later fault is recorded in the
/// report.
pub async fn run(
    settings: &HarnessSettings,
    plan: &VerifyPlan,
) -> Result<HarnessReport, HarnessError> {
    let started = Instant::now();
    // Built before spawn: a client fault must not leak a child process.
    let client = reqwest::Client::builder().build().map_err(HarnessError::Client)?;

    let mut process = ServerProcess::spawn(&settings.command)?;
    let readiness_observed = process.await_ready(settings.readiness_window).await;

    // No fallible operation between here and teardown: probe faults are
    // recorded in results, keeping teardown on every path.
    let base_url = format!("http://127.0.0.1:{}", settings.port);
    let mut results = Vec::with_capacity(plan.scenarios.len());
    for scenario in &plan.scenarios {
        results.push(run_probe(&client, &base_url, scenario, settings.request_timeout).await);
    }

    let server_stderr = process.stderr_lines();
    let teardown = process.terminate(settings.grace_window, settings.drain_delay).await;

    Ok(HarnessReport {
        results,
        readiness_observed,
        forced_kill: teardown.forced,
        server_exit_code: teardown.exit_code,
        server_stderr,
        duration: started.elapsed(),
    })
}
