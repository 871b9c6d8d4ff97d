//! Core types and definitions for Lacewing queries.
//!
//! Lacewing turns compact, natural-language-like commands such as
//! `my birds from home since june` into a structured [`Query`] document that
//! downstream code can translate into a biodiversity API request. This crate
//! holds everything the parser produces and everything the caller consumes:
//!
//! - [`keywords`] - the immutable keyword tables driving tokenization and
//!   grammar classification
//! - [`query`] - the [`Query`] document, taxon selectors, and canonical
//!   serialization
//! - [`selector`] - per-kind selector records (user, place, project, date,
//!   controlled term) and payload text runs
//! - [`resolve`] - contracts for the external lookup collaborators and the
//!   request objects a caller must execute to resolve a query
//!
//! Parsing itself lives in `lacewing-parser`; this crate deliberately
//! contains no parsing code so the model can be consumed without pulling the
//! front end in.

pub mod keywords;
pub mod query;
pub mod resolve;
pub mod selector;

pub use keywords::KeywordConfig;
pub use query::{Query, QueryError, TaxonClause, TaxonSelector};
pub use resolve::{ResolutionError, ResolutionRequest, TaxonId};
