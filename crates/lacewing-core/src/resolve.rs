//! Contracts for the external lookup collaborators.
//!
//! The parser never performs name-to-id resolution, date parsing, or group
//! expansion: those cross process boundaries and may block, fail transiently,
//! or need network access. Instead the core hands the caller explicit
//! [`ResolutionRequest`] objects (via
//! [`Query::resolution_requests`](crate::Query::resolution_requests)) and
//! declares the traits an executor must provide. The caller decides whether
//! to await, retry, time-box, or cancel; errors pass through unmodified.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::selector::{DateField, UserRole};

/// Numeric taxon identifier.
pub type TaxonId = u64;

/// Numeric observation identifier.
pub type ObservationId = u64;

/// A reference to an entity in a permalink: numeric id or URL slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityRef {
    Id(u64),
    Slug(String),
}

/// A resolved taxon: canonical name plus ancestor names, root first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonSummary {
    pub id: TaxonId,
    pub name: String,
    /// Ancestor clade names ordered from the root down to the direct parent.
    pub ancestors: Vec<String>,
}

/// Result of resolving a taxon id: the target taxon plus any other taxa
/// sharing its canonical name.
///
/// When `homonyms` is non-empty the name alone is ambiguous and callers
/// should qualify it with a distinguishing ancestor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonLookup {
    pub target: TaxonSummary,
    pub homonyms: Vec<TaxonSummary>,
}

/// A parsed date expression as produced by the external date collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateExpression {
    /// A single date (ISO 8601 text).
    Date(String),
    /// An inclusive date range; either bound may be open.
    Range {
        start: Option<String>,
        end: Option<String>,
    },
}

/// Errors surfaced by lookup collaborators.
///
/// These pass through the core unmodified; retrying or surfacing them is the
/// caller's responsibility.
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("{what} not found")]
    NotFound { what: String },

    #[error("lookup service unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("malformed lookup input: {input}")]
    Malformed { input: String },
}

/// Resolves a taxon id to its canonical name and same-named candidates.
pub trait TaxonResolver {
    fn resolve_taxon(&self, id: TaxonId) -> Result<TaxonLookup, ResolutionError>;
}

/// Resolves an observation id to the taxon it records.
pub trait ObservationResolver {
    fn observation_taxon(&self, id: ObservationId) -> Result<TaxonId, ResolutionError>;
}

/// Resolves a place id or slug to its display name.
pub trait PlaceResolver {
    fn resolve_place(&self, place: &EntityRef) -> Result<String, ResolutionError>;
}

/// Resolves a user id or login slug to a login name.
pub trait UserResolver {
    fn resolve_user(&self, user: &EntityRef) -> Result<String, ResolutionError>;
}

/// Resolves a project id or slug to its title.
pub trait ProjectResolver {
    fn resolve_project(&self, project: &EntityRef) -> Result<String, ResolutionError>;
}

/// Parses relative or absolute natural-language date text.
pub trait DateExpressionParser {
    fn parse_date_expression(&self, text: &str) -> Result<DateExpression, ResolutionError>;
}

/// Expands a group keyword to its fixed taxon id list.
pub trait GroupExpander {
    fn expand_group(&self, keyword: &str) -> Result<Vec<TaxonId>, ResolutionError>;
}

/// One external lookup a caller must run to fully resolve a parsed query.
///
/// The grammar engine stays synchronous and deterministic by returning these
/// instead of calling collaborators itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionRequest {
    /// Resolve a taxon name (optionally scoped to an ancestor clade) to ids.
    TaxonName {
        name: String,
        ancestor: Option<String>,
    },
    /// Expand a group keyword to its taxon id list.
    ExpandGroup { keyword: String },
    /// Parse a date expression for the given field.
    ParseDate { field: DateField, expression: String },
    /// Resolve a user identifier (may be an alias like `me`).
    ResolveUser { role: UserRole, who: String },
    /// Resolve a place name (may be the alias `home`).
    ResolvePlace { place: String },
    /// Resolve a project name.
    ResolveProject { project: String },
}
