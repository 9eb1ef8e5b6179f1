// system-tests/tests/helpers/site.rs
// ============================================================================
// Module: Site Fixtures
// Description: Temporary site root directories for server tests.
// Purpose: Provide the document set the probe battery expects.
// Dependencies: tempfile
// ============================================================================

//! ## Overview
//! Builds throwaway site roots containing the documents the built-in
//! battery checks: an index page naming WhyLayer and a script declaring a
//! function.

use std::net::TcpListener;
use std::path::Path;

use tempfile::TempDir;

/// Creates a complete site fixture satisfying the full probe battery.
pub fn reference_site() -> Result<TempDir, String> {
    let dir = TempDir::new().map_err(|err| format!("create site dir failed: {err}"))?;
    write_site_file(
        dir.path(),
        "index.html",
        "<html><head><title>WhyLayer</title></head><body>WhyLayer explainability console</body></html>",
    )?;
    write_site_file(dir.path(), "app.js", "function bootstrap() {\n  return 'whylayer';\n}\n")?;
    write_site_file(dir.path(), "style.css", "body { margin: 0; }\n")?;
    Ok(dir)
}

/// Creates a site fixture missing `app.js` so its probe fails.
pub fn broken_site() -> Result<TempDir, String> {
    let dir = TempDir::new().map_err(|err| format!("create site dir failed: {err}"))?;
    write_site_file(
        dir.path(),
        "index.html",
        "<html><body>WhyLayer, minus the script bundle</body></html>",
    )?;
    Ok(dir)
}

/// Writes one fixture file under the site root.
fn write_site_file(root: &Path, name: &str, contents: &str) -> Result<(), String> {
    std::fs::write(root.join(name), contents)
        .map_err(|err| format!("write {name} failed: {err}"))
}

/// Returns a free loopback port for a spawned server.
pub fn free_port() -> Result<u16, String> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .map_err(|err| format!("failed to bind loopback: {err}"))?;
    let port = listener
        .local_addr()
        .map_err(|err| format!("failed to read listener address: {err}"))?
        .port();
    drop(listener);
    Ok(port)
}
