// crates/whylayer-harness/src/process.rs
// ============================================================================
// Module: Server Process Supervision
// Description: Spawns the server child, scrapes readiness, guarantees teardown.
// Purpose: Keep exactly one child handle per session with bounded shutdown.
// Dependencies: tokio, nix (unix)
// ============================================================================

//! ## Overview
//! A [`ServerProcess`] owns one spawned child exclusively. A background task
//! scans child stdout for the readiness marker; stderr lines are collected
//! for later reporting. Teardown escalates: graceful termination signal,
//! bounded grace window, forced kill, short drain delay. The child is spawned
//! with `kill_on_drop` so even a panicking caller cannot leak it.
//!
//! ## Invariants
//! - Teardown consumes the process handle; it cannot run twice.
//! - The readiness flag is advisory; it never gates probing by itself.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use thiserror::Error;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tokio::process::Child;
use tokio::process::Command;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use whylayer_serve::READY_MARKER;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Child process creation failures. Fatal to a harness run.
#[derive(Debug, Error)]
pub enum SpawnError {
    /// The OS could not create the child process.
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The child was created without the expected stdout pipe.
    #[error("spawned child has no stdout pipe")]
    StdoutUnavailable,
    /// The child was created without the expected stderr pipe.
    #[error("spawned child has no stderr pipe")]
    StderrUnavailable,
}

// ============================================================================
// SECTION: Types
// ============================================================================

/// Program and arguments used to start the server under test.
#[derive(Debug, Clone)]
pub struct ServerCommand {
    /// Executable path.
    pub program: PathBuf,
    /// Arguments passed verbatim.
    pub args: Vec<String>,
}

/// How a supervised child reached the ground state.
#[derive(Debug, Clone, Copy)]
pub struct TeardownOutcome {
    /// Whether the forced kill path was taken after the grace window.
    pub forced: bool,
    /// Exit code when the child exited normally.
    pub exit_code: Option<i32>,
}

/// Exclusive handle over one spawned server child.
#[derive(Debug)]
pub struct ServerProcess {
    /// The supervised child; `kill_on_drop` backs the leak invariant.
    child: Child,
    /// Receiver flipped to `true` when the readiness marker is observed.
    ready_rx: watch::Receiver<bool>,
    /// Background stdout scanner; drains the pipe to EOF.
    stdout_task: JoinHandle<()>,
    /// Background stderr collector; drains the pipe to EOF.
    stderr_task: JoinHandle<()>,
    /// Collected child stderr lines for reporting.
    stderr_lines: Arc<Mutex<Vec<String>>>,
}

// ============================================================================
// SECTION: Supervision
// ============================================================================

impl ServerProcess {
    /// Spawns the server child with piped stdio.
    ///
    /// # Errors
    ///
    /// Returns [`SpawnError`] when the process cannot be created or its
    /// pipes are missing.
    pub fn spawn(command: &ServerCommand) -> Result<Self, SpawnError> {
        let mut child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| SpawnError::Spawn {
                program: command.program.display().to_string(),
                source: err,
            })?;

        let stdout = child.stdout.take().ok_or(SpawnError::StdoutUnavailable)?;
        let stderr = child.stderr.take().ok_or(SpawnError::StderrUnavailable)?;

        let (ready_tx, ready_rx) = watch::channel(false);
        let stdout_task = tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if line.contains(READY_MARKER) {
                    let _ = ready_tx.send(true);
                }
            }
        });

        let stderr_lines = Arc::new(Mutex::new(Vec::new()));
        let collected = Arc::clone(&stderr_lines);
        let stderr_task = tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if let Ok(mut sink) = collected.lock() {
                    sink.push(line);
                }
            }
        });

        Ok(Self {
            child,
            ready_rx,
            stdout_task,
            stderr_task,
            stderr_lines,
        })
    }

    /// Waits up to `window` for the readiness marker on child stdout.
    ///
    /// Returns whether the marker was observed. Not observing it is a
    /// warning condition, never a hard failure.
    pub async fn await_ready(&mut self, window: Duration) -> bool {
        let waited =
            tokio::time::timeout(window, self.ready_rx.wait_for(|observed| *observed)).await;
        matches!(waited, Ok(Ok(_)))
    }

    /// Returns whether the readiness marker has been observed so far.
    #[must_use]
    pub fn ready_observed(&self) -> bool {
        *self.ready_rx.borrow()
    }

    /// Returns the OS process id, when the child is still running.
    #[must_use]
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Returns the child stderr lines collected so far.
    #[must_use]
    pub fn stderr_lines(&self) -> Vec<String> {
        self.stderr_lines.lock().map_or_else(|_| Vec::new(), |lines| lines.clone())
    }

    /// Tears the child down: graceful signal, grace window, forced kill,
    /// drain delay. Consumes the handle so teardown runs exactly once.
    pub async fn terminate(mut self, grace: Duration, drain: Duration) -> TeardownOutcome {
        request_graceful_stop(&mut self.child);

        let mut outcome = TeardownOutcome {
            forced: false,
            exit_code: None,
        };
        match tokio::time::timeout(grace, self.child.wait()).await {
            Ok(Ok(status)) => {
                outcome.exit_code = status.code();
            }
            Ok(Err(_)) | Err(_) => {
                outcome.forced = true;
                let _ = self.child.kill().await;
            }
        }

        // Child pipes are closed now; give the readers a moment to drain.
        let _ = tokio::time::timeout(drain, self.stdout_task).await;
        let _ = tokio::time::timeout(drain, self.stderr_task).await;
        tokio::time::sleep(drain).await;
        outcome
    }
}

/// Requests a graceful stop: SIGTERM on unix, kill elsewhere.
fn request_graceful_stop(child: &mut Child) {
    #[cfg(unix)]
    {
        if let Some(pid) = child.id() {
            if let Ok(raw) = i32::try_from(pid) {
                let _ = nix::sys::signal::kill(
                    nix::unistd::Pid::from_raw(raw),
                    nix::sys::signal::Signal::SIGTERM,
                );
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = child.start_kill();
    }
}
