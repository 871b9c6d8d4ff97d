//! Error codes for the Lacewing diagnostic system.
//!
//! Error codes are organized by phase:
//! - `E0xx` - tokenize errors
//! - `E1xx` - grammar errors
//! - `E2xx` - query validation errors

use std::fmt;

/// Error codes for categorizing diagnostic errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Tokenize errors (E0xx)
    // =========================================================================
    /// Unterminated quoted phrase.
    ///
    /// A phrase was opened with a double quote but never closed.
    E001,

    /// Unexpected character.
    ///
    /// A character was encountered that cannot start any token.
    E002,

    // =========================================================================
    // Grammar errors (E1xx)
    // =========================================================================
    /// Unexpected token.
    ///
    /// The grammar engine encountered a token it did not expect at this
    /// position; the message carries the expected-vs-found description.
    E100,

    /// Incomplete input.
    ///
    /// The input ended before a required clause was complete.
    E101,

    // =========================================================================
    // Query validation errors (E2xx)
    // =========================================================================
    /// Empty query.
    ///
    /// The input produced no macro, taxon selector, or option clause.
    E200,

    /// Duplicate date clause.
    ///
    /// Two date clauses constrain the same date field.
    E201,

    /// Duplicate setting.
    ///
    /// The same option map entry was given twice.
    E202,

    /// Invalid per-page count.
    ///
    /// The `per-page` payload is not a whole number.
    E203,

    /// Unknown option keyword.
    ///
    /// An option keyword from the configuration has no selector kind
    /// associated with it.
    E204,
}

impl ErrorCode {
    /// Returns the numeric code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            // Tokenize errors
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            // Grammar errors
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            // Validation errors
            ErrorCode::E200 => "E200",
            ErrorCode::E201 => "E201",
            ErrorCode::E202 => "E202",
            ErrorCode::E203 => "E203",
            ErrorCode::E204 => "E204",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            // Tokenize errors
            ErrorCode::E001 => "unterminated quoted phrase",
            ErrorCode::E002 => "unexpected character",
            // Grammar errors
            ErrorCode::E100 => "unexpected token",
            ErrorCode::E101 => "incomplete input",
            // Validation errors
            ErrorCode::E200 => "empty query",
            ErrorCode::E201 => "duplicate date clause",
            ErrorCode::E202 => "duplicate setting",
            ErrorCode::E203 => "invalid per-page count",
            ErrorCode::E204 => "unknown option keyword",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::E001.to_string(), "E001");
        assert_eq!(ErrorCode::E200.to_string(), "E200");
    }

    #[test]
    fn test_error_code_description() {
        assert_eq!(ErrorCode::E001.description(), "unterminated quoted phrase");
        assert_eq!(ErrorCode::E100.description(), "unexpected token");
        assert_eq!(ErrorCode::E200.description(), "empty query");
    }
}
