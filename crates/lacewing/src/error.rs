//! Error types for Lacewing operations.
//!
//! This module provides the main error type [`LacewingError`] which wraps
//! the error conditions that can occur while parsing commands or mapping
//! permalinks.

use thiserror::Error;

use lacewing_core::resolve::ResolutionError;
use lacewing_parser::ParseError;

/// The main error type for Lacewing operations.
///
/// The `Parse` variant carries the structured diagnostics with source spans
/// alongside the offending command text, so callers can highlight the exact
/// failing substring back to the user.
#[derive(Debug, Error)]
pub enum LacewingError {
    #[error("{err}")]
    Parse { err: ParseError, src: String },

    #[error("unrecognized permalink: {url}")]
    UnrecognizedUrl { url: String },

    /// A lookup collaborator failed; passed through unmodified.
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
}

impl LacewingError {
    /// Create a new `Parse` error with the associated command text.
    pub fn new_parse_error(err: ParseError, src: impl Into<String>) -> Self {
        Self::Parse {
            err,
            src: src.into(),
        }
    }

    /// Create a new `UnrecognizedUrl` error.
    pub fn unrecognized_url(url: impl Into<String>) -> Self {
        Self::UnrecognizedUrl { url: url.into() }
    }
}
