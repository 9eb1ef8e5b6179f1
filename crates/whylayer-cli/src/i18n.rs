// crates/whylayer-cli/src/i18n.rs
// ============================================================================
// Module: CLI Internationalization Helpers
// Description: Provides message catalog and translation utilities for the CLI.
// Purpose: Centralize user-facing strings for future localization support.
// Dependencies: Standard library collections and formatting utilities.
// ============================================================================

//! ## Overview
//! The WhyLayer CLI stores user-facing strings in a small translation catalog
//! to enforce consistent messaging and to prepare for future locales. All
//! runtime output should be routed through the [`t!`](crate::t) macro.
//!
//! ## Invariants
//! - The catalog is initialized once and read-only thereafter.
//! - Missing keys fall back to English and then to the key itself.
//! - The server readiness line never passes through the catalog.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::OnceLock;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Supported CLI locales.
///
/// # Invariants
/// - Variants are stable for CLI parsing and catalog lookup.
/// - [`Locale::En`] is the default fallback locale.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Locale {
    /// English (default).
    En,
    /// Catalan.
    Ca,
}

impl Locale {
    /// Returns the canonical locale label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Ca => "ca",
        }
    }

    /// Attempts to parse a locale value (case-insensitive, tolerant of region tags).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        let normalized = value.to_ascii_lowercase();
        let lang = normalized.split(['-', '_']).next().unwrap_or("");
        match lang {
            "en" => Some(Self::En),
            "ca" => Some(Self::Ca),
            _ => None,
        }
    }
}

/// Ordered list of supported CLI locales.
///
/// # Invariants
/// - Ordering is stable for deterministic presentation.
pub const SUPPORTED_LOCALES: &[Locale] = &[Locale::En, Locale::Ca];

/// A formatted message argument captured by the [`macro@crate::t`] macro.
///
/// # Invariants
/// - `key` matches a placeholder name without braces (for example, `path`).
/// - `value` is preformatted and should be safe for display.
#[derive(Clone)]
pub struct MessageArg {
    /// The placeholder name used in message templates (e.g., `"path"`).
    pub key: &'static str,
    /// The formatted string value to substitute for this placeholder.
    pub value: String,
}

impl MessageArg {
    /// Constructs a new [`MessageArg`] from a key and displayable value.
    pub fn new(key: &'static str, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }
}

// ============================================================================
// SECTION: Locale Selection
// ============================================================================

/// Global locale selection for CLI output.
static CURRENT_LOCALE: OnceLock<Locale> = OnceLock::new();

/// Sets the CLI locale. Only the first call wins.
pub fn set_locale(locale: Locale) {
    let _ = CURRENT_LOCALE.set(locale);
}

/// Returns the current CLI locale (defaults to English).
#[must_use]
pub fn current_locale() -> Locale {
    CURRENT_LOCALE.get().copied().unwrap_or(Locale::En)
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// Static English catalog entries loaded into the localized message bundle.
const CATALOG_EN: &[(&str, &str)] = &[
    ("main.version", "whylayer {version}"),
    ("serve.config.invalid", "Invalid server configuration: {error}"),
    ("serve.bind_failed", "Failed to start static server: {error}"),
    ("serve.failed", "Static server failed: {error}"),
    ("serve.stopped", "Static server stopped."),
    ("verify.starting", "Starting static server on port {port}..."),
    ("verify.ready", "Server started successfully"),
    (
        "verify.not_ready",
        "Server may not be fully ready yet, proceeding with probes...",
    ),
    ("verify.infra_failed", "Verification could not run: {error}"),
    ("verify.plan.load_failed", "Failed to load verify plan: {error}"),
    ("verify.probe.pass", "PASS {name}: GET {path}"),
    ("verify.probe.fail", "FAIL {name}: GET {path} - {reason}"),
    ("verify.server_stderr", "Server error output: {line}"),
    (
        "verify.teardown.forced",
        "Server ignored graceful stop; forced termination applied.",
    ),
    ("verify.summary.header", "Verification summary:"),
    (
        "verify.summary.counts",
        "Total probes: {total} Passed: {passed} Failed: {failed} Duration: {seconds}s",
    ),
    ("verify.summary.ok", "All probes passed."),
    ("verify.summary.failed", "Some probes failed; review the report above."),
    ("output.stream.stdout", "stdout"),
    ("output.stream.stderr", "stderr"),
    ("output.stream.unknown", "output"),
    ("output.write_failed", "Failed to write to {stream}: {error}"),
    ("i18n.lang.invalid_env", "Invalid value for {env}: {value}. Expected 'en' or 'ca'."),
    (
        "i18n.disclaimer.machine_translated",
        "Note: non-English output is machine translated and may be inaccurate.",
    ),
];

/// Static Catalan catalog entries loaded into the localized message bundle.
const CATALOG_CA: &[(&str, &str)] = &[
    ("main.version", "whylayer {version}"),
    ("serve.config.invalid", "Configuració del servidor no vàlida: {error}"),
    ("serve.bind_failed", "No s'ha pogut iniciar el servidor estàtic: {error}"),
    ("serve.failed", "El servidor estàtic ha fallat: {error}"),
    ("serve.stopped", "Servidor estàtic aturat."),
    ("verify.starting", "Iniciant el servidor estàtic al port {port}..."),
    ("verify.ready", "El servidor s'ha iniciat correctament"),
    (
        "verify.not_ready",
        "És possible que el servidor encara no estigui a punt; es continua amb les proves...",
    ),
    ("verify.infra_failed", "No s'ha pogut executar la verificació: {error}"),
    ("verify.plan.load_failed", "No s'ha pogut carregar el pla de verificació: {error}"),
    ("verify.probe.pass", "APROVAT {name}: GET {path}"),
    ("verify.probe.fail", "FALLAT {name}: GET {path} - {reason}"),
    ("verify.server_stderr", "Sortida d'error del servidor: {line}"),
    (
        "verify.teardown.forced",
        "El servidor ha ignorat l'aturada ordenada; s'ha aplicat la terminació forçada.",
    ),
    ("verify.summary.header", "Resum de la verificació:"),
    (
        "verify.summary.counts",
        "Proves totals: {total} Aprovades: {passed} Fallades: {failed} Durada: {seconds}s",
    ),
    ("verify.summary.ok", "Totes les proves han passat."),
    ("verify.summary.failed", "Algunes proves han fallat; reviseu l'informe anterior."),
    ("output.stream.stdout", "stdout"),
    ("output.stream.stderr", "stderr"),
    ("output.stream.unknown", "sortida"),
    ("output.write_failed", "No s'ha pogut escriure a {stream}: {error}"),
    ("i18n.lang.invalid_env", "Valor no vàlid per a {env}: {value}. S'esperava 'en' o 'ca'."),
    (
        "i18n.disclaimer.machine_translated",
        "Nota: la sortida que no és en anglès està traduïda automàticament i pot ser inexacta.",
    ),
];

/// Returns the message catalog for the requested locale.
pub(crate) fn catalog_for(locale: Locale) -> &'static HashMap<&'static str, &'static str> {
    static CATALOG_EN_MAP: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    static CATALOG_CA_MAP: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    match locale {
        Locale::En => CATALOG_EN_MAP.get_or_init(|| CATALOG_EN.iter().copied().collect()),
        Locale::Ca => CATALOG_CA_MAP.get_or_init(|| CATALOG_CA.iter().copied().collect()),
    }
}

// ============================================================================
// SECTION: Translation
// ============================================================================

/// Translates `key` using the selected locale while substituting `args`.
#[must_use]
pub fn translate(key: &str, args: Vec<MessageArg>) -> String {
    let locale = current_locale();
    let template = catalog_for(locale)
        .get(key)
        .copied()
        .or_else(|| catalog_for(Locale::En).get(key).copied())
        .unwrap_or(key);
    if args.is_empty() {
        return template.to_string();
    }

    let mut result = template.to_string();
    for arg in args {
        let placeholder = format!("{{{}}}", arg.key);
        result = result.replace(&placeholder, &arg.value);
    }
    result
}

// ============================================================================
// SECTION: Macro
// ============================================================================

/// Formats a localized message from a key and named arguments.
///
/// # Arguments
///
/// - `$key` must match a catalog entry.
/// - Named arguments are substituted into `{placeholder}` positions.
///
/// # Returns
///
/// A localized [`String`] with placeholders substituted.
#[macro_export]
macro_rules! t {
    ($key:literal $(, $name:ident = $value:expr )* $(,)?) => {{
        let args = ::std::vec![
            $(
                $crate::i18n::MessageArg::new(stringify!($name), $value.to_string()),
            )*
        ];
        $crate::i18n::translate($key, args)
    }};
}

// ============================================================================
// SECTION: Tests
// ============================================================================
