// crates/whylayer-serve/src/lib.rs
// ============================================================================
// Module: WhyLayer Serve Library
// Description: Static file server with deterministic path and MIME resolution.
// Purpose: Serve a single root directory over HTTP for the WhyLayer frontend.
// Dependencies: axum, percent-encoding, tokio
// ============================================================================

//! ## Overview
//! WhyLayer Serve maps request paths onto files under one configured root
//! directory and answers with MIME-mapped 200 responses or plain 404s.
//! Invariants:
//! - Resolution is lexical and never escapes the root.
//! - Bind failures are fatal; the server never retries a port.
//! - The stdout readiness line is a stable contract with the probe harness.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod mime;
pub mod resolve;
pub mod server;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::ConfigError;
pub use config::DEFAULT_HOST;
pub use config::DEFAULT_PORT;
pub use config::ServerConfig;
pub use mime::DEFAULT_CONTENT_TYPE;
pub use mime::content_type_for;
pub use resolve::Candidate;
pub use resolve::PathRejection;
pub use resolve::resolve_path;
pub use server::READY_MARKER;
pub use server::ServeError;
pub use server::ServerHandle;
pub use server::StaticFileServer;
