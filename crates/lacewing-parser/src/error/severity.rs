//! Severity levels for diagnostics.

use std::fmt;

/// The severity level of a diagnostic.
///
/// - [`Severity::Error`] is fatal: the query cannot be used.
/// - [`Severity::Warning`] is advisory; the query still parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// A fatal error that prevents the query from being built.
    Error,

    /// A non-fatal warning about a suspicious but valid query.
    Warning,
}

impl Severity {
    /// Returns `true` if this is an error severity.
    pub fn is_error(&self) -> bool {
        matches!(self, Severity::Error)
    }

    /// Returns `true` if this is a warning severity.
    pub fn is_warning(&self) -> bool {
        matches!(self, Severity::Warning)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}
