// system-tests/tests/helpers/readiness.rs
// ============================================================================
// Module: Readiness Helpers
// Description: Readiness probes for spawned static servers.
// Purpose: Ensure servers are ready without arbitrary sleeps.
// Dependencies: reqwest, tokio
// ============================================================================

use std::time::Duration;
use std::time::Instant;

use tokio::time::sleep;

/// Polls the server root until it responds or the timeout expires.
pub async fn wait_for_server_ready(base_url: &str, timeout: Duration) -> Result<(), String> {
    let client = reqwest::Client::new();
    let start = Instant::now();
    let mut attempts = 0u32;
    loop {
        attempts = attempts.saturating_add(1);
        match client
            .get(base_url)
            .timeout(Duration::from_millis(500))
            .send()
            .await
        {
            Ok(_) => return Ok(()),
            Err(err) => {
                if start.elapsed() > timeout {
                    return Err(format!(
                        "server readiness timeout after {attempts} attempts: {err}"
                    ));
                }
                sleep(Duration::from_millis(50)).await;
            }
        }
    }
}
