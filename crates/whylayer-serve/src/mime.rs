// crates/whylayer-serve/src/mime.rs
// ============================================================================
// Module: MIME Table
// Description: Static extension-to-content-type mapping for responses.
// Purpose: Keep content-type selection deterministic and allocation-free.
// Dependencies: std
// ============================================================================

//! ## Overview
//! The table maps lowercase file extensions (with the leading dot) to the
//! content type sent in the `Content-Type` response header. Lookups that miss
//! fall back to [`DEFAULT_CONTENT_TYPE`]. The table is constant for the
//! process; there is no registration or mutation surface.

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Content type used when an extension has no table entry.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Extension-to-content-type entries, lowercase with leading dot.
///
/// # Invariants
/// - Keys are unique; ordering is stable for deterministic presentation.
const MIME_TABLE: &[(&str, &str)] = &[
    (".html", "text/html"),
    (".js", "application/javascript"),
    (".css", "text/css"),
    (".json", "application/json"),
    (".png", "image/png"),
    (".jpg", "image/jpeg"),
    (".jpeg", "image/jpeg"),
    (".svg", "image/svg+xml"),
    (".ico", "image/x-icon"),
    (".txt", "text/plain"),
    (".wasm", "application/wasm"),
];

// ============================================================================
// SECTION: Lookup
// ============================================================================

/// Returns the content type for a lowercase dotted extension.
///
/// Unknown extensions (and the empty string) map to
/// [`DEFAULT_CONTENT_TYPE`].
#[must_use]
pub fn content_type_for(extension: &str) -> &'static str {
    MIME_TABLE
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map_or(DEFAULT_CONTENT_TYPE, |(_, content_type)| content_type)
}

/// Extracts the lowercase dotted extension from a file name.
///
/// Returns an empty string when the name has no extension.
#[must_use]
pub fn dotted_extension(file_name: &str) -> String {
    file_name
        .rsplit_once('.')
        .filter(|(stem, _)| !stem.is_empty())
        .map(|(_, ext)| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default()
}

// ============================================================================
// SECTION: Tests
// ============================================================================
