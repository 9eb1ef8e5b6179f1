// crates/whylayer-serve/src/config.rs
// ============================================================================
// Module: Server Configuration
// Description: Immutable configuration for the static file server.
// Purpose: Validate port and root directory before a listener is created.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! A [`ServerConfig`] is built once at process start and never mutated. The
//! root directory is canonicalized during construction so request resolution
//! can compare candidate paths against a stable prefix.
//!
//! ## Invariants
//! - `port` is nonzero.
//! - `root` is an existing directory in canonical form.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::IpAddr;
use std::net::Ipv4Addr;
use std::path::Path;
use std::path::PathBuf;

use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default TCP port when none is supplied on the command line.
pub const DEFAULT_PORT: u16 = 8080;

/// Default bind host. Loopback only; exposure beyond localhost is opt-in.
pub const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration validation failures. All are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Port zero cannot be served; the contract requires a fixed port.
    #[error("port must be between 1 and 65535")]
    PortZero,
    /// The root directory could not be canonicalized.
    #[error("failed to resolve root directory '{path}': {source}")]
    RootUnresolvable {
        /// The root path as supplied.
        path: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The root path exists but is not a directory.
    #[error("root '{path}' is not a directory")]
    RootNotDirectory {
        /// The canonicalized root path.
        path: String,
    },
}

// ============================================================================
// SECTION: Types
// ============================================================================

/// Immutable static file server configuration.
///
/// # Invariants
/// - Lives for the process lifetime; never mutated after construction.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// TCP port the server binds.
    pub port: u16,
    /// Canonicalized root directory served to clients.
    pub root: PathBuf,
    /// Bind host address.
    pub host: IpAddr,
}

impl ServerConfig {
    /// Builds a validated configuration bound to loopback.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the port is zero or the root directory is
    /// missing or not a directory.
    pub fn new(port: u16, root: &Path) -> Result<Self, ConfigError> {
        Self::with_host(port, root, DEFAULT_HOST)
    }

    /// Builds a validated configuration with an explicit bind host.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the port is zero or the root directory is
    /// missing or not a directory.
    pub fn with_host(port: u16, root: &Path, host: IpAddr) -> Result<Self, ConfigError> {
        if port == 0 {
            return Err(ConfigError::PortZero);
        }
        let canonical_root =
            std::fs::canonicalize(root).map_err(|err| ConfigError::RootUnresolvable {
                path: root.display().to_string(),
                source: err,
            })?;
        if !canonical_root.is_dir() {
            return Err(ConfigError::RootNotDirectory {
                path: canonical_root.display().to_string(),
            });
        }
        Ok(Self {
            port,
            root: canonical_root,
            host,
        })
    }

    /// Returns the socket address string for the configured host and port.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
