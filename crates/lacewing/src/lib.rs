//! Lacewing - a natural-language-like query language for biodiversity
//! observation records.
//!
//! A user types a compact command such as `my rg birds from home since june`
//! into a chat interface; Lacewing parses it into an immutable
//! [`Query`](lacewing_core::Query) document that downstream code translates
//! into an API request. The reverse path is covered too: the [`url`] module
//! maps a record permalink back to canonical query text.

pub mod url;

mod error;

pub use lacewing_core::{keywords, query, resolve, selector};

pub use error::LacewingError;
pub use lacewing_core::{KeywordConfig, Query};

use log::{debug, info, trace};

/// Builder for parsing Lacewing query commands.
///
/// Holds the keyword configuration and provides the parse and
/// canonical-text operations. Parsing is synchronous and side-effect-free;
/// the returned query enumerates any external lookups via
/// [`Query::resolution_requests`](lacewing_core::Query::resolution_requests).
///
/// # Examples
///
/// ```
/// use lacewing::QueryBuilder;
///
/// let builder = QueryBuilder::default();
///
/// let query = builder.parse("rg birds from home since june")
///     .expect("failed to parse");
///
/// assert_eq!(query.macros(), ["rg"]);
/// assert_eq!(builder.canonical(&query), "rg birds from home since june");
/// ```
#[derive(Default)]
pub struct QueryBuilder {
    config: KeywordConfig,
}

impl QueryBuilder {
    /// Create a new query builder with the given keyword configuration.
    pub fn new(config: KeywordConfig) -> Self {
        Self { config }
    }

    /// The keyword configuration this builder parses with.
    pub fn config(&self) -> &KeywordConfig {
        &self.config
    }

    /// Parse a command string into a query document.
    ///
    /// # Errors
    ///
    /// Returns `LacewingError::Parse` carrying the diagnostics and the
    /// offending command text for tokenize errors, grammar errors, and
    /// query validation errors.
    ///
    /// # Examples
    ///
    /// ```
    /// use lacewing::QueryBuilder;
    ///
    /// let builder = QueryBuilder::default();
    /// let query = builder.parse("prunella in animalia by me")
    ///     .expect("failed to parse");
    /// assert!(query.taxon_selector().is_some());
    /// ```
    pub fn parse(&self, source: &str) -> Result<Query, LacewingError> {
        info!("Parsing query command");

        let query = lacewing_parser::parse(source, &self.config)
            .map_err(|err| LacewingError::new_parse_error(err, source))?;

        debug!("Query command parsed successfully");
        trace!(query:? = query; "Parsed query");

        Ok(query)
    }

    /// Render a query back to canonical text.
    ///
    /// The output re-parses to a structurally equal query: selector and
    /// option order are preserved, macros are hoisted to the head, and
    /// keyword phrases are emitted in hyphenated canonical form.
    pub fn canonical(&self, query: &Query) -> String {
        query.to_string()
    }
}
