// crates/whylayer-serve/src/server.rs
// ============================================================================
// Module: Static File Server
// Description: Axum-based HTTP server over a single root directory.
// Purpose: Serve resolved files with MIME-mapped content types, 404 otherwise.
// Dependencies: axum, tokio, thiserror
// ============================================================================

//! ## Overview
//! The server moves through `Unbound -> Listening -> Stopped`, forward only.
//! [`StaticFileServer::bind`] performs the fatal bind step; [`serve`] runs
//! the request loop until a [`ServerHandle`] requests shutdown. Shutdown is
//! idempotent and safe to trigger from a signal context.
//!
//! ## Invariants
//! - The listening socket is owned exclusively by the server instance.
//! - Every response is either 200 with a MIME-mapped content type or 404.
//! - The readiness line is stable text scraped by the probe harness; it is
//!   never localized.
//!
//! [`serve`]: StaticFileServer::serve

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::State;
use axum::http::Method;
use axum::http::StatusCode;
use axum::http::Uri;
use axum::http::header;
use axum::response::IntoResponse;
use axum::response::Response;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::config::ServerConfig;
use crate::resolve::resolve_path;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Marker substring emitted on stdout once the listener is bound.
///
/// # Invariants
/// - The harness matches this exact substring; changing it breaks readiness
///   detection for already-deployed verifiers.
pub const READY_MARKER: &str = "Static server";

/// Plain-text body for 404 responses.
const NOT_FOUND_BODY: &str = "Not found";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Fatal server faults.
#[derive(Debug, Error)]
pub enum ServeError {
    /// The listener could not be bound (port in use, permission denied).
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// The socket address that failed to bind.
        addr: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The accept loop failed after binding.
    #[error("server I/O failure: {0}")]
    Io(#[source] std::io::Error),
}

// ============================================================================
// SECTION: Types
// ============================================================================

/// Shared request-handling state.
#[derive(Debug)]
struct ServerState {
    /// Canonical root directory served to clients.
    root: PathBuf,
}

/// A bound static file server, ready to run its accept loop.
#[derive(Debug)]
pub struct StaticFileServer {
    /// The bound listener; released only through the shutdown path.
    listener: TcpListener,
    /// Address actually bound (resolves port 0 requests in tests).
    local_addr: SocketAddr,
    /// Shared handler state.
    state: Arc<ServerState>,
    /// Shutdown channel sender; cloned into [`ServerHandle`]s.
    shutdown_tx: watch::Sender<bool>,
}

/// Handle used to request server shutdown.
///
/// # Invariants
/// - `shutdown` is idempotent; repeat calls are no-ops.
/// - Safe to invoke from an asynchronous signal-handling context.
#[derive(Debug, Clone)]
pub struct ServerHandle {
    /// Shutdown channel sender shared with the server.
    tx: watch::Sender<bool>,
}

impl ServerHandle {
    /// Requests graceful shutdown of the associated server.
    pub fn shutdown(&self) {
        let _ = self.tx.send(true);
    }
}

// ============================================================================
// SECTION: Server
// ============================================================================

impl StaticFileServer {
    /// Binds the listener for the configured address.
    ///
    /// Bind failures are fatal: the caller should report the error and exit
    /// non-zero rather than retry.
    ///
    /// # Errors
    ///
    /// Returns [`ServeError::Bind`] when the socket cannot be bound.
    pub async fn bind(config: ServerConfig) -> Result<Self, ServeError> {
        let addr = config.bind_addr();
        let listener = TcpListener::bind(&addr).await.map_err(|err| ServeError::Bind {
            addr: addr.clone(),
            source: err,
        })?;
        let local_addr = listener.local_addr().map_err(ServeError::Io)?;
        let (shutdown_tx, _) = watch::channel(false);
        Ok(Self {
            listener,
            local_addr,
            state: Arc::new(ServerState {
                root: config.root,
            }),
            shutdown_tx,
        })
    }

    /// Returns the bound socket address.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Returns a shutdown handle for this server.
    #[must_use]
    pub fn handle(&self) -> ServerHandle {
        ServerHandle {
            tx: self.shutdown_tx.clone(),
        }
    }

    /// Renders the stdout readiness line for this server.
    ///
    /// Contains [`READY_MARKER`], the root directory, and the serving URL.
    #[must_use]
    pub fn readiness_line(&self) -> String {
        let url = format!("http://localhost:{}", self.local_addr.port());
        format!("{READY_MARKER} serving {} on {url}", self.state.root.display())
    }

    /// Runs the accept loop until a handle requests shutdown.
    ///
    /// Consumes the server; the listener is released when the loop drains.
    ///
    /// # Errors
    ///
    /// Returns [`ServeError::Io`] when the accept loop fails.
    pub async fn serve(self) -> Result<(), ServeError> {
        let Self {
            listener,
            local_addr: _,
            state,
            shutdown_tx,
        } = self;
        let mut shutdown_rx = shutdown_tx.subscribe();
        let router = Router::new().fallback(serve_request).with_state(state);
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                // Holding the sender here keeps the channel open so a
                // dropped handle never reads as a shutdown request.
                let _keep_open = shutdown_tx;
                let _ = shutdown_rx.wait_for(|stopped| *stopped).await;
            })
            .await
            .map_err(ServeError::Io)
    }
}

// ============================================================================
// SECTION: Request Handling
// ============================================================================

/// Answers a single request from the resolved filesystem candidate.
async fn serve_request(
    State(state): State<Arc<ServerState>>,
    method: Method,
    uri: Uri,
) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return not_found();
    }
    let Ok(candidate) = resolve_path(&state.root, uri.path()) else {
        return not_found();
    };
    // Stat faults (missing, permission denied) share the 404 surface; the
    // specified contract exposes only {200, 404}.
    let Ok(metadata) = tokio::fs::metadata(&candidate.path).await else {
        return not_found();
    };
    if !metadata.is_file() {
        return not_found();
    }
    let Ok(bytes) = tokio::fs::read(&candidate.path).await else {
        return not_found();
    };
    let body = if method == Method::HEAD {
        Body::empty()
    } else {
        Body::from(bytes)
    };
    ([(header::CONTENT_TYPE, candidate.content_type)], body).into_response()
}

/// Builds the uniform 404 response.
fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        [(header::CONTENT_TYPE, "text/plain")],
        NOT_FOUND_BODY,
    )
        .into_response()
}
