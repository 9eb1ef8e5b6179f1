// crates/whylayer-harness/src/scenario.rs
// ============================================================================
// Module: Probe Scenarios
// Description: Declarative HTTP test cases and TOML-loadable verify plans.
// Purpose: Keep the probe battery ordered, validated, and data-driven.
// Dependencies: serde, toml, thiserror
// ============================================================================

//! ## Overview
//! A [`VerifyPlan`] is an ordered sequence of [`ProbeScenario`] values. The
//! built-in plan reproduces the standard battery for the WhyLayer frontend;
//! custom plans load from TOML documents and are validated before any server
//! process is spawned.
//!
//! ## Invariants
//! - Scenario order is preserved exactly as declared.
//! - Every target path starts with `/`.
//! - A plan is never empty.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Verify plan loading and validation failures. Fatal before spawn.
#[derive(Debug, Error)]
pub enum PlanError {
    /// The plan file could not be read.
    #[error("failed to read plan at {path}: {source}")]
    Read {
        /// Path of the plan document.
        path: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The plan file is not valid TOML for the expected shape.
    #[error("failed to parse plan at {path}: {source}")]
    Parse {
        /// Path of the plan document.
        path: String,
        /// Underlying TOML failure.
        #[source]
        source: toml::de::Error,
    },
    /// The plan declares no scenarios.
    #[error("plan declares no scenarios")]
    Empty,
    /// A scenario failed validation.
    #[error("scenario '{name}' is invalid: {reason}")]
    ScenarioInvalid {
        /// Name of the offending scenario.
        name: String,
        /// Human-readable validation failure.
        reason: String,
    },
}

// ============================================================================
// SECTION: Types
// ============================================================================

/// Status class a scenario expects from the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpectedStatus {
    /// Expect HTTP 200.
    #[default]
    Success,
    /// Expect HTTP 404.
    NotFound,
}

impl ExpectedStatus {
    /// Returns the numeric status code this expectation requires.
    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            Self::Success => 200,
            Self::NotFound => 404,
        }
    }
}

/// One declarative HTTP probe case.
#[derive(Debug, Clone, Deserialize)]
pub struct ProbeScenario {
    /// Stable scenario name used in reports.
    pub name: String,
    /// Request path, starting with `/`.
    pub target_path: String,
    /// Substring the response body must contain, when present.
    #[serde(default)]
    pub expected_substring: Option<String>,
    /// Fragment the `Content-Type` header must contain, when present.
    #[serde(default)]
    pub expected_content_type: Option<String>,
    /// Expected status class.
    #[serde(default)]
    pub expect: ExpectedStatus,
}

/// Ordered probe battery.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyPlan {
    /// Scenarios in declaration order.
    #[serde(rename = "scenario")]
    pub scenarios: Vec<ProbeScenario>,
}

// ============================================================================
// SECTION: Plans
// ============================================================================

impl VerifyPlan {
    /// Returns the built-in probe battery for the WhyLayer frontend.
    #[must_use]
    pub fn default_plan() -> Self {
        Self {
            scenarios: vec![
                ProbeScenario {
                    name: "index-html".to_string(),
                    target_path: "/index.html".to_string(),
                    expected_substring: Some("WhyLayer".to_string()),
                    expected_content_type: Some("text/html".to_string()),
                    expect: ExpectedStatus::Success,
                },
                ProbeScenario {
                    name: "app-js".to_string(),
                    target_path: "/app.js".to_string(),
                    expected_substring: Some("function".to_string()),
                    expected_content_type: Some("javascript".to_string()),
                    expect: ExpectedStatus::Success,
                },
                ProbeScenario {
                    name: "root-alias".to_string(),
                    target_path: "/".to_string(),
                    expected_substring: Some("WhyLayer".to_string()),
                    expected_content_type: None,
                    expect: ExpectedStatus::Success,
                },
                ProbeScenario {
                    name: "missing-404".to_string(),
                    target_path: "/nonexistent.html".to_string(),
                    expected_substring: None,
                    expected_content_type: None,
                    expect: ExpectedStatus::NotFound,
                },
            ],
        }
    }

    /// Loads and validates a plan from a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError`] when the file cannot be read, parsed, or
    /// validated.
    pub fn load(path: &Path) -> Result<Self, PlanError> {
        let raw = std::fs::read_to_string(path).map_err(|err| PlanError::Read {
            path: path.display().to_string(),
            source: err,
        })?;
        let plan: Self = toml::from_str(&raw).map_err(|err| PlanError::Parse {
            path: path.display().to_string(),
            source: err,
        })?;
        plan.validate()?;
        Ok(plan)
    }

    /// Validates scenario names and target paths.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError`] for an empty plan or a malformed scenario.
    pub fn validate(&self) -> Result<(), PlanError> {
        if self.scenarios.is_empty() {
            return Err(PlanError::Empty);
        }
        for scenario in &self.scenarios {
            if scenario.name.trim().is_empty() {
                return Err(PlanError::ScenarioInvalid {
                    name: scenario.target_path.clone(),
                    reason: "name must be non-empty".to_string(),
                });
            }
            if !scenario.target_path.starts_with('/') {
                return Err(PlanError::ScenarioInvalid {
                    name: scenario.name.clone(),
                    reason: "target_path must start with '/'".to_string(),
                });
            }
        }
        Ok(())
    }
}
