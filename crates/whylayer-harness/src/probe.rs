// crates/whylayer-harness/src/probe.rs
// ============================================================================
// Module: Probe Execution
// Description: Runs one probe scenario against a live server and classifies it.
// Purpose: Convert transport faults and mismatches into recorded results.
// Dependencies: reqwest, tokio
// ============================================================================

//! ## Overview
//! Each probe issues a single HTTP GET with its own timeout and records a
//! [`ProbeResult`]. Faults never propagate: timeouts, transport errors, and
//! expectation mismatches all become failed results so the scenario sequence
//! continues (accumulate-and-report).
//!
//! ## Invariants
//! - A scenario expecting 404 passes only on an observed 404.
//! - `observed_status` is absent exactly when no HTTP status was received.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use thiserror::Error;

use crate::scenario::ExpectedStatus;
use crate::scenario::ProbeScenario;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Why a probe failed. Recorded data, not a propagated error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FailureReason {
    /// No response arrived within the per-request timeout.
    #[error("request timed out")]
    Timeout,
    /// The request failed below HTTP (refused, reset, resolution).
    #[error("transport failure: {0}")]
    Transport(String),
    /// A status was observed but did not match the expectation.
    #[error("expected status {expected}, observed {observed}")]
    StatusMismatch {
        /// Expected status code.
        expected: u16,
        /// Observed status code.
        observed: u16,
    },
    /// The response body lacked the expected substring.
    #[error("body does not contain '{needle}'")]
    MissingSubstring {
        /// Substring that was required.
        needle: String,
    },
    /// The content type header lacked the expected fragment.
    #[error("content type '{observed}' does not contain '{expected}'")]
    ContentTypeMismatch {
        /// Required content type fragment.
        expected: String,
        /// Observed content type header, empty when absent.
        observed: String,
    },
}

/// Recorded outcome of one probe scenario.
#[derive(Debug, Clone)]
pub struct ProbeResult {
    /// The scenario that produced this result.
    pub scenario: ProbeScenario,
    /// Observed status code; absent on transport error or timeout.
    pub observed_status: Option<u16>,
    /// Observed `Content-Type` header value.
    pub observed_content_type: Option<String>,
    /// Observed response body.
    pub observed_body: Option<String>,
    /// Whether every expectation held.
    pub passed: bool,
    /// First unmet expectation, when the probe failed.
    pub failure_reason: Option<FailureReason>,
}

impl ProbeResult {
    /// Builds a failed result with no observed response.
    fn unreachable(scenario: &ProbeScenario, reason: FailureReason) -> Self {
        Self {
            scenario: scenario.clone(),
            observed_status: None,
            observed_content_type: None,
            observed_body: None,
            passed: false,
            failure_reason: Some(reason),
        }
    }
}

// ============================================================================
// SECTION: Execution
// ============================================================================

/// Runs one scenario against `base_url` with a per-request timeout.
pub async fn run_probe(
    client: &reqwest::Client,
    base_url: &str,
    scenario: &ProbeScenario,
    timeout: Duration,
) -> ProbeResult {
    let url = format!("{base_url}{}", scenario.target_path);
    let response = match client.get(&url).timeout(timeout).send().await {
        Ok(response) => response,
        Err(err) if err.is_timeout() => {
            return ProbeResult::unreachable(scenario, FailureReason::Timeout);
        }
        Err(err) => {
            return ProbeResult::unreachable(scenario, FailureReason::Transport(err.to_string()));
        }
    };

    let observed_status = response.status().as_u16();
    let observed_content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(ToString::to_string);
    let observed_body = match response.text().await {
        Ok(body) => Some(body),
        Err(err) if err.is_timeout() => {
            return ProbeResult::unreachable(scenario, FailureReason::Timeout);
        }
        Err(_) => None,
    };

    classify(scenario, observed_status, observed_content_type, observed_body)
}

/// Classifies an observed response against scenario expectations.
pub(crate) fn classify(
    scenario: &ProbeScenario,
    observed_status: u16,
    observed_content_type: Option<String>,
    observed_body: Option<String>,
) -> ProbeResult {
    let failure_reason = evaluate(
        scenario,
        observed_status,
        observed_content_type.as_deref(),
        observed_body.as_deref(),
    );
    ProbeResult {
        scenario: scenario.clone(),
        observed_status: Some(observed_status),
        observed_content_type,
        observed_body,
        passed: failure_reason.is_none(),
        failure_reason,
    }
}

/// Returns the first unmet expectation, if any.
fn evaluate(
    scenario: &ProbeScenario,
    observed_status: u16,
    observed_content_type: Option<&str>,
    observed_body: Option<&str>,
) -> Option<FailureReason> {
    match scenario.expect {
        ExpectedStatus::NotFound => {
            if observed_status == ExpectedStatus::NotFound.code() {
                None
            } else {
                Some(FailureReason::StatusMismatch {
                    expected: ExpectedStatus::NotFound.code(),
                    observed: observed_status,
                })
            }
        }
        ExpectedStatus::Success => {
            if observed_status != ExpectedStatus::Success.code() {
                return Some(FailureReason::StatusMismatch {
                    expected: ExpectedStatus::Success.code(),
                    observed: observed_status,
                });
            }
            if let Some(needle) = &scenario.expected_substring {
                if !observed_body.unwrap_or_default().contains(needle.as_str()) {
                    return Some(FailureReason::MissingSubstring {
                        needle: needle.clone(),
                    });
                }
            }
            if let Some(fragment) = &scenario.expected_content_type {
                let observed = observed_content_type.unwrap_or_default();
                if !observed.contains(fragment.as_str()) {
                    return Some(FailureReason::ContentTypeMismatch {
                        expected: fragment.clone(),
                        observed: observed.to_string(),
                    });
                }
            }
            None
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
