// system-tests/src/env.rs
// ============================================================================
// Module: System Test Environment
// Description: Centralized timeout configuration with env overrides.
// Purpose: Keep system-test timeouts consistent and configurable across suites.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Timeouts used by the system-test suites, overridable through
//! `WHYLAYER_SYSTEM_TEST_TIMEOUT_SEC` for slow CI hosts.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::time::Duration;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment variable raising the effective suite timeout.
pub const ENV_TIMEOUT_SECS: &str = "WHYLAYER_SYSTEM_TEST_TIMEOUT_SEC";

// ============================================================================
// SECTION: Timeouts
// ============================================================================

/// Returns the effective timeout, honoring `WHYLAYER_SYSTEM_TEST_TIMEOUT_SEC`
/// when set. The override acts as a minimum to avoid shortening explicitly
/// longer test timeouts.
///
/// # Errors
///
/// Returns a description of an unparsable override value.
pub fn resolve_timeout(requested: Duration) -> Result<Duration, String> {
    match env::var(ENV_TIMEOUT_SECS) {
        Ok(raw) => {
            let override_timeout = parse_timeout_secs(&raw)
                .map_err(|err| format!("{ENV_TIMEOUT_SECS} {err}"))?;
            Ok(std::cmp::max(requested, override_timeout))
        }
        Err(_) => Ok(requested),
    }
}

/// Parses a positive integer number of seconds.
fn parse_timeout_secs(raw: &str) -> Result<Duration, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("must be a positive integer number of seconds".to_string());
    }
    let secs: u64 =
        trimmed.parse().map_err(|_| "must be a positive integer number of seconds".to_string())?;
    if secs == 0 {
        return Err("must be greater than zero".to_string());
    }
    Ok(Duration::from_secs(secs))
}

// ============================================================================
// SECTION: Tests
// ============================================================================
