//! Error and diagnostic system for the Lacewing parser.
//!
//! Every failure in the parsing lifecycle (tokenizing, grammar parsing,
//! query validation) is reported as a [`Diagnostic`]: a severity, an
//! optional error code, a message, one or more labeled source spans, and
//! optional help text. One or more diagnostics are wrapped in a
//! [`ParseError`] for returning to the caller.
//!
//! Parsing fails fast at the first structural problem - there is no partial
//! recovery - so a diagnostic's primary label always points at the exact
//! failing substring of the user's command.
//!
//! # Example
//!
//! ```
//! # use lacewing_parser::error::{Diagnostic, ErrorCode};
//! # use lacewing_parser::Span;
//!
//! let span = Span::new(8..13);
//! let diag = Diagnostic::error("duplicate date clause for `since`")
//!     .with_code(ErrorCode::E201)
//!     .with_label(span, "second value here")
//!     .with_help("a query may constrain each date field once");
//! ```

mod collector;
mod diagnostic;
mod error_code;
mod label;
mod parse_error;
mod severity;

pub(crate) use collector::DiagnosticCollector;

pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use label::Label;
pub use parse_error::ParseError;
pub use severity::Severity;
