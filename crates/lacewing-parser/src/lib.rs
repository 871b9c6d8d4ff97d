//! # Lacewing Parser
//!
//! Parser for the Lacewing observation query language. This crate provides
//! the parsing pipeline from a chat command string to an immutable
//! [`lacewing_core::Query`] document.
//!
//! ## Usage
//!
//! ```
//! # use lacewing_core::KeywordConfig;
//! # use lacewing_parser::{parse, ParseError};
//!
//! fn main() -> Result<(), ParseError> {
//!     let config = KeywordConfig::default();
//!     let query = parse("rg birds from home since june", &config)?;
//!
//!     assert_eq!(query.macros(), ["rg"]);
//!     assert_eq!(query.to_string(), "rg birds from home since june");
//!     Ok(())
//! }
//! ```
//!
//! Parsing is synchronous, allocation-light, and a pure function of
//! `(source, config)`: no external lookups happen here. Selector payloads
//! leave the parser unresolved; the caller executes the query's
//! [`resolution_requests`](lacewing_core::Query::resolution_requests)
//! against its own collaborators.

mod elaborate;
pub mod error;
mod lexer;
mod normalize;
mod parser;
mod parser_types;
mod span;
mod tokens;

pub use error::{Diagnostic, ErrorCode, Label, ParseError, Severity};
pub use span::{Span, Spanned};

use log::{debug, trace};

use lacewing_core::{KeywordConfig, Query};

use elaborate::Builder;

/// Parse a command string into a query document.
///
/// This is the main entry point. It orchestrates the complete pipeline:
///
/// 1. **Tokenize** - split the command into words, numbers, quoted phrases,
///    and structural tokens
/// 2. **Normalize** - fold two-word keyword phrases (`id by`) into canonical
///    compound tokens (`id-by`)
/// 3. **Parse** - run the positional grammar over the token stream
/// 4. **Elaborate** - assign selector kinds, validate invariants, freeze the
///    [`Query`]
///
/// # Errors
///
/// Returns a [`ParseError`] carrying one or more diagnostics with source
/// spans: tokenize errors (`E0xx`), grammar errors (`E1xx`), or query
/// validation errors (`E2xx`). Parsing fails fast at the first structural
/// problem.
pub fn parse(source: &str, config: &KeywordConfig) -> Result<Query, ParseError> {
    // Step 1: Tokenize
    let tokens = lexer::tokenize(source)?;
    trace!(count = tokens.len(); "tokenized command");

    // Step 2: Normalize compound keywords
    let tokens = normalize::normalize(tokens, config);

    // Step 3: Parse
    let ast = parser::build_query(&tokens, config).map_err(ParseError::from)?;

    // Step 4: Elaborate
    let query = Builder::new(source).build(&ast).map_err(ParseError::from)?;
    debug!("parsed query command");

    Ok(query)
}
