// crates/whylayer-harness/src/lib.rs
// ============================================================================
// Module: WhyLayer Harness Library
// Description: Subprocess-based verification harness for the static server.
// Purpose: Spawn the server, probe it over HTTP, and guarantee teardown.
// Dependencies: reqwest, tokio, whylayer-serve
// ============================================================================

//! ## Overview
//! The harness validates a running WhyLayer static server end to end: it
//! spawns the server binary, waits for the stdout readiness marker, executes
//! an ordered battery of HTTP probe scenarios with per-request timeouts, and
//! tears the child down on every exit path.
//! Invariants:
//! - Exactly one child handle is live per session; none survives a report.
//! - Probe failures accumulate; they never abort the remaining scenarios.
//! - Scenario order is deterministic and matches declaration order.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod probe;
pub mod process;
pub mod scenario;
pub mod session;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use probe::FailureReason;
pub use probe::ProbeResult;
pub use probe::run_probe;
pub use process::ServerCommand;
pub use process::ServerProcess;
pub use process::SpawnError;
pub use process::TeardownOutcome;
pub use scenario::ExpectedStatus;
pub use scenario::PlanError;
pub use scenario::ProbeScenario;
pub use scenario::VerifyPlan;
pub use session::DEFAULT_GRACE_WINDOW;
pub use session::DEFAULT_READINESS_WINDOW;
pub use session::DEFAULT_REQUEST_TIMEOUT;
pub use session::HarnessError;
pub use session::HarnessReport;
pub use session::HarnessSettings;
pub use session::run;
