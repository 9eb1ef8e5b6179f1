// crates/whylayer-serve/src/resolve.rs
// ============================================================================
// Module: Request Path Resolution
// Description: Maps decoded request paths onto files under the server root.
// Purpose: Keep URL-to-filesystem translation deterministic and contained.
// Dependencies: percent-encoding
// ============================================================================

//! ## Overview
//! Resolution is purely lexical: the raw request path is stripped of its
//! query string, percent-decoded, normalized segment by segment, and joined
//! onto the canonical root. Any path whose normalization escapes the root is
//! rejected before the filesystem is consulted.
//!
//! ## Invariants
//! - `/` resolves to `/index.html`.
//! - A resolved candidate is always a descendant of the root directory.
//! - Rejections carry no filesystem information.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;

use percent_encoding::percent_decode_str;

use crate::mime::content_type_for;
use crate::mime::dotted_extension;

// ============================================================================
// SECTION: Types
// ============================================================================

/// A candidate filesystem target for a request, prior to any stat call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Absolute path under the server root.
    pub path: PathBuf,
    /// Content type derived from the candidate's extension.
    pub content_type: &'static str,
}

/// Lexical rejection of a request path.
///
/// # Invariants
/// - Every rejection is answered 404; variants exist for reporting only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathRejection {
    /// Percent-decoding produced invalid UTF-8.
    Undecodable,
    /// Normalization escaped the configured root directory.
    OutsideRoot,
}

// ============================================================================
// SECTION: Resolution
// ============================================================================

/// Resolves a raw request path to a filesystem candidate under `root`.
///
/// The raw path may still carry a query string; everything from the first
/// `?` is discarded. `root` must already be canonical.
///
/// # Errors
///
/// Returns [`PathRejection`] when the path cannot be decoded or escapes the
/// root.
pub fn resolve_path(root: &Path, raw_path: &str) -> Result<Candidate, PathRejection> {
    let without_query = raw_path.split('?').next().unwrap_or_default();
    let decoded = percent_decode_str(without_query)
        .decode_utf8()
        .map_err(|_| PathRejection::Undecodable)?;
    let request_path = if decoded == "/" {
        "/index.html"
    } else {
        decoded.as_ref()
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in request_path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(PathRejection::OutsideRoot);
                }
            }
            other => segments.push(other),
        }
    }

    let mut path = root.to_path_buf();
    for segment in &segments {
        path.push(segment);
    }

    let file_name = segments.last().copied().unwrap_or_default();
    let content_type = content_type_for(&dotted_extension(file_name));
    Ok(Candidate {
        path,
        content_type,
    })
}
