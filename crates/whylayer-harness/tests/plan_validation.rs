// crates/whylayer-harness/tests/plan_validation.rs
// ============================================================================
// Module: Verify Plan Tests
// Description: Validate plan loading, ordering, and fail-closed validation.
// Purpose: Ensure plans are rejected before any server process is spawned.
// Dependencies: whylayer-harness, tempfile
// ============================================================================

//! ## Overview
//! Validates the built-in battery and the TOML plan document contract.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use tempfile::TempDir;
use whylayer_harness::ExpectedStatus;
use whylayer_harness::PlanError;
use whylayer_harness::VerifyPlan;

/// Tests the built-in battery order and expectations.
#[test]
fn default_plan_matches_reference_battery() {
    let plan = VerifyPlan::default_plan();
    let names: Vec<&str> = plan.scenarios.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["index-html", "app-js", "root-alias", "missing-404"]);

    let index = &plan.scenarios[0];
    assert_eq!(index.target_path, "/index.html");
    assert_eq!(index.expected_substring.as_deref(), Some("WhyLayer"));
    assert_eq!(index.expected_content_type.as_deref(), Some("text/html"));
    assert_eq!(index.expect, ExpectedStatus::Success);

    let missing = &plan.scenarios[3];
    assert_eq!(missing.expect, ExpectedStatus::NotFound);
    assert!(plan.validate().is_ok());
}

/// Tests a TOML plan document loads in declaration order.
#[test]
fn toml_plan_loads_in_order() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("plan.toml");
    std::fs::write(
        &path,
        r#"
[[scenario]]
name = "styles"
target_path = "/style.css"
expected_content_type = "text/css"

[[scenario]]
name = "gone"
target_path = "/gone.html"
expect = "not_found"
"#,
    )
    .expect("write plan");

    let plan = VerifyPlan::load(&path).expect("load plan");
    assert_eq!(plan.scenarios.len(), 2);
    assert_eq!(plan.scenarios[0].name, "styles");
    assert_eq!(plan.scenarios[0].expect, ExpectedStatus::Success);
    assert_eq!(plan.scenarios[0].expected_substring, None);
    assert_eq!(plan.scenarios[1].name, "gone");
    assert_eq!(plan.scenarios[1].expect, ExpectedStatus::NotFound);
}

/// Tests an empty plan is rejected.
#[test]
fn empty_plan_is_rejected() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("plan.toml");
    std::fs::write(&path, "scenario = []\n").expect("write plan");
    assert!(matches!(VerifyPlan::load(&path), Err(PlanError::Empty)));
}

/// Tests a relative target path is rejected with the scenario name.
#[test]
fn relative_target_path_is_rejected() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("plan.toml");
    std::fs::write(
        &path,
        r#"
[[scenario]]
name = "bad"
target_path = "index.html"
"#,
    )
    .expect("write plan");

    match VerifyPlan::load(&path) {
        Err(PlanError::ScenarioInvalid {
            name,
            reason,
        }) => {
            assert_eq!(name, "bad");
            assert!(reason.contains("start with '/'"));
        }
        other => panic!("expected scenario rejection, got {other:?}"),
    }
}

/// Tests a missing plan file surfaces the read failure.
#[test]
fn missing_plan_file_is_read_error() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("absent.toml");
    assert!(matches!(VerifyPlan::load(&path), Err(PlanError::Read { .. })));
}
