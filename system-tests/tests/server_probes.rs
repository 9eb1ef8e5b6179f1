// system-tests/tests/server_probes.rs
// ============================================================================
// Module: Server Probe Tests
// Description: End-to-end harness runs against the real whylayer binary.
// Purpose: Ensure the probe battery, accumulation, and teardown guarantees.
// Dependencies: system-tests helpers, whylayer-harness
// ============================================================================

//! ## Overview
//! End-to-end harness runs against the real whylayer binary.
//! Purpose: Ensure the probe battery, accumulation, and teardown guarantees.
//! Invariants:
//! - System-test execution is deterministic and fail-closed.
//! - No spawned server survives a finished harness session.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::path::Path;
use std::process::Command;
use std::process::Stdio;
use std::time::Duration;

use helpers::cli::ChildGuard;
use helpers::cli::whylayer_binary;
use helpers::readiness::wait_for_server_ready;
use helpers::site::broken_site;
use helpers::site::free_port;
use helpers::site::reference_site;
use system_tests::env::resolve_timeout;
use whylayer_harness::FailureReason;
use whylayer_harness::HarnessSettings;
use whylayer_harness::ServerCommand;
use whylayer_harness::VerifyPlan;

mod helpers;

/// Builds harness settings for a spawned `whylayer serve` child.
fn harness_settings(binary: &Path, port: u16, root: &Path) -> HarnessSettings {
    let command = ServerCommand {
        program: binary.to_path_buf(),
        args: vec![
            "serve".to_string(),
            port.to_string(),
            "--root".to_string(),
            root.display().to_string(),
        ],
    };
    let mut settings = HarnessSettings::new(command, port);
    settings.drain_delay = Duration::from_millis(100);
    settings
}

/// Tests the full built-in battery passes and the child is torn down.
#[tokio::test(flavor = "multi_thread")]
async fn full_battery_passes_and_tears_down() -> Result<(), String> {
    let binary = whylayer_binary().ok_or("whylayer binary not found")?;
    let site = reference_site()?;
    let port = free_port()?;

    let settings = harness_settings(&binary, port, site.path());
    let report = whylayer_harness::run(&settings, &VerifyPlan::default_plan())
        .await
        .map_err(|err| format!("harness run failed: {err}"))?;

    assert!(report.readiness_observed, "readiness marker must be observed");
    assert!(report.success(), "battery failed: {:?}", report.results);
    let names: Vec<&str> =
        report.results.iter().map(|result| result.scenario.name.as_str()).collect();
    assert_eq!(names, ["index-html", "app-js", "root-alias", "missing-404"]);

    // Leak check: the spawned server must no longer be listening.
    let client = reqwest::Client::new();
    let refused = client
        .get(format!("http://127.0.0.1:{port}/index.html"))
        .timeout(Duration::from_millis(500))
        .send()
        .await;
    assert!(refused.is_err(), "server must be gone after the session");
    Ok(())
}

/// Tests one failing probe never aborts the remaining scenarios.
#[tokio::test(flavor = "multi_thread")]
async fn failure_accumulates_without_aborting() -> Result<(), String> {
    let binary = whylayer_binary().ok_or("whylayer binary not found")?;
    let site = broken_site()?;
    let port = free_port()?;

    let settings = harness_settings(&binary, port, site.path());
    let report = whylayer_harness::run(&settings, &VerifyPlan::default_plan())
        .await
        .map_err(|err| format!("harness run failed: {err}"))?;

    assert!(!report.success());
    assert_eq!(report.results.len(), 4, "every scenario must still execute");
    let app_js = &report.results[1];
    assert_eq!(app_js.scenario.name, "app-js");
    assert!(!app_js.passed);
    assert!(matches!(
        app_js.failure_reason,
        Some(FailureReason::StatusMismatch {
            expected: 200,
            ..
        })
    ));
    let missing = &report.results[3];
    assert!(missing.passed, "the 404 scenario must still pass after a failure");
    assert_eq!(report.failed(), 1);
    Ok(())
}

/// Tests the served content directly over HTTP against the real binary.
#[tokio::test(flavor = "multi_thread")]
async fn binary_serves_reference_content() -> Result<(), String> {
    let binary = whylayer_binary().ok_or("whylayer binary not found")?;
    let site = reference_site()?;
    let port = free_port()?;

    let child = Command::new(&binary)
        .args(["serve", &port.to_string(), "--root", &site.path().display().to_string()])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|err| format!("spawn serve failed: {err}"))?;
    let _guard = ChildGuard::new(child);

    let base_url = format!("http://127.0.0.1:{port}");
    let ready_timeout = resolve_timeout(Duration::from_secs(30))?;
    wait_for_server_ready(&base_url, ready_timeout).await?;

    let client = reqwest::Client::new();
    let root = client
        .get(format!("{base_url}/"))
        .send()
        .await
        .map_err(|err| format!("root request failed: {err}"))?;
    assert_eq!(root.status().as_u16(), 200);
    let root_type = root
        .headers()
        .get("content-type")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(root_type.contains("text/html"), "content type was {root_type}");
    let body = root.text().await.map_err(|err| format!("root body failed: {err}"))?;
    assert!(body.contains("WhyLayer"));

    let styles = client
        .get(format!("{base_url}/style.css"))
        .send()
        .await
        .map_err(|err| format!("style request failed: {err}"))?;
    assert_eq!(styles.status().as_u16(), 200);
    assert_eq!(
        styles
            .headers()
            .get("content-type")
            .and_then(|value| value.to_str().ok()),
        Some("text/css")
    );

    let missing = client
        .get(format!("{base_url}/does-not-exist.html"))
        .send()
        .await
        .map_err(|err| format!("missing request failed: {err}"))?;
    assert_eq!(missing.status().as_u16(), 404);
    Ok(())
}
