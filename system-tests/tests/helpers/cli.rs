// system-tests/tests/helpers/cli.rs
// ============================================================================
// Module: CLI Helpers
// Description: Shared helpers for locating and invoking the whylayer CLI.
// Purpose: Provide consistent CLI binary resolution across system-test suites.
// Dependencies: std::process, std::path
// ============================================================================

//! Helpers for invoking the whylayer CLI in system-tests.

use std::path::Path;
use std::path::PathBuf;
use std::process::Child;
use std::process::Command;
use std::process::Output;
use std::sync::OnceLock;

/// Locates the whylayer CLI binary, building it if necessary.
pub fn whylayer_binary() -> Option<PathBuf> {
    if let Some(path) = option_env!("CARGO_BIN_EXE_whylayer") {
        let candidate = PathBuf::from(path);
        if candidate.exists() {
            return Some(candidate);
        }
    }
    if let Ok(path) = std::env::var("CARGO_BIN_EXE_whylayer") {
        let candidate = PathBuf::from(path);
        if candidate.exists() {
            return Some(candidate);
        }
    }
    build_cli_binary().map_or_else(|_| resolve_cli_from_current_exe(), Some)
}

/// Runs the CLI with arguments and returns the process output.
pub fn run_cli(binary: &Path, args: &[&str]) -> Result<Output, String> {
    Command::new(binary)
        .args(args)
        .output()
        .map_err(|err| format!("run whylayer failed: {err}"))
}

/// Kills a spawned child when a test unwinds before explicit teardown.
pub struct ChildGuard {
    /// The guarded child; `None` once released.
    child: Option<Child>,
}

impl ChildGuard {
    /// Wraps a spawned child.
    #[must_use]
    pub const fn new(child: Child) -> Self {
        Self {
            child: Some(child),
        }
    }

    /// Returns mutable access to the guarded child.
    pub fn child_mut(&mut self) -> Option<&mut Child> {
        self.child.as_mut()
    }

    /// Releases the child for explicit teardown.
    pub fn release(&mut self) -> Option<Child> {
        self.child.take()
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

fn resolve_cli_from_current_exe() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    let profile_dir = exe.parent()?.parent()?;
    let candidate = profile_dir.join(format!("whylayer{}", exe_suffix()));
    if candidate.exists() { Some(candidate) } else { None }
}

fn target_dir_from_current_exe() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    let profile_dir = exe.parent()?.parent()?;
    profile_dir.parent().map(PathBuf::from)
}

fn build_cli_binary() -> Result<PathBuf, String> {
    static BUILD_RESULT: OnceLock<Result<PathBuf, String>> = OnceLock::new();
    let result = BUILD_RESULT.get_or_init(|| {
        let Some(target_dir) = target_dir_from_current_exe() else {
            return Err("unable to resolve target dir from current exe".to_string());
        };
        let output = Command::new("cargo")
            .args(["build", "-p", "whylayer-cli", "--bin", "whylayer", "--target-dir"])
            .arg(&target_dir)
            .output()
            .map_err(|err| format!("spawn cargo build failed: {err}"))?;
        if !output.status.success() {
            return Err(format!(
                "cargo build whylayer-cli failed: {}",
                String::from_utf8_lossy(&output.stderr)
            ));
        }
        resolve_cli_from_target_dir(&target_dir)
            .ok_or_else(|| "whylayer binary not found after build".to_string())
    });
    result.clone()
}

fn resolve_cli_from_target_dir(target_dir: &Path) -> Option<PathBuf> {
    let profile_dir = target_dir.join("debug");
    let candidate = profile_dir.join(format!("whylayer{}", exe_suffix()));
    if candidate.exists() { Some(candidate) } else { None }
}

const fn exe_suffix() -> &'static str {
    if cfg!(windows) { ".exe" } else { "" }
}
