//! Permalink-to-query mapping.
//!
//! The reverse path of the parser: given a record permalink such as
//! `https://www.inaturalist.org/taxa/12345`, produce canonical query text
//! that selects the same entity. Numeric ids are resolved to names through
//! the caller's resolver collaborators; slugs are made human-readable by
//! replacing `-` with a space. The output is assembled through the query
//! document's own serialization, so it is guaranteed to re-parse.
//!
//! When a taxon id resolves to a name shared by other taxa, the emitted name
//! is qualified with `in <ancestor>`, naming the outermost ancestor the
//! homonyms do not share (`prunella in animalia` vs `prunella in plantae`).

use log::debug;
use serde::{Deserialize, Serialize};
use url::Url;

use lacewing_core::KeywordConfig;
use lacewing_core::query::{Clause, NameQuery, Query, TaxonClause, TaxonSelector};
use lacewing_core::resolve::{
    EntityRef, ObservationResolver, PlaceResolver, ProjectResolver, TaxonId, TaxonResolver,
    TaxonSummary, UserResolver,
};
use lacewing_core::selector::{
    PlaceSelector, ProjectSelector, TextPart, TextRun, UserRole, UserSelector,
};

use crate::LacewingError;

/// Hosts whose permalinks the mapper recognizes.
///
/// The default set covers the main network sites; partner subdomains
/// (`<partner>.inaturalist.org`) match through suffix comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteConfig {
    hosts: Vec<String>,
}

impl SiteConfig {
    pub fn new(hosts: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            hosts: hosts.into_iter().map(Into::into).collect(),
        }
    }

    /// Does `host` belong to a recognized site, either exactly or as a
    /// subdomain (`www.`, partner prefixes)?
    pub fn is_known_host(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        self.hosts
            .iter()
            .any(|known| host == *known || host.ends_with(&format!(".{known}")))
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self::new([
            "inaturalist.org",
            "inaturalist.ca",
            "inaturalist.lu",
            "inaturalist.nz",
            "inaturalist.se",
            "naturalista.mx",
            "naturalista.uy",
            "biodiversity4all.org",
            "argentinat.org",
            "inaturalist.ala.org.au",
            "inaturalist.laji.fi",
            "inaturalist.mma.gob.cl",
        ])
    }
}

/// The lookup collaborators the mapper resolves numeric ids through.
pub struct Resolvers<'a> {
    pub taxa: &'a dyn TaxonResolver,
    pub observations: &'a dyn ObservationResolver,
    pub places: &'a dyn PlaceResolver,
    pub users: &'a dyn UserResolver,
    pub projects: &'a dyn ProjectResolver,
}

/// Maps permalinks to canonical query text.
pub struct UrlMapper<'a> {
    config: KeywordConfig,
    site: SiteConfig,
    resolvers: Resolvers<'a>,
}

impl<'a> UrlMapper<'a> {
    pub fn new(config: KeywordConfig, resolvers: Resolvers<'a>) -> Self {
        Self {
            config,
            site: SiteConfig::default(),
            resolvers,
        }
    }

    /// Replace the recognized host list.
    pub fn with_site(mut self, site: SiteConfig) -> Self {
        self.site = site;
        self
    }

    /// Map a permalink to canonical query text.
    ///
    /// # Errors
    ///
    /// `LacewingError::UnrecognizedUrl` for hosts or path shapes outside the
    /// known permalink forms; resolver failures pass through as
    /// `LacewingError::Resolution`.
    pub fn query_text(&self, link: &str) -> Result<String, LacewingError> {
        let url =
            Url::parse(link).map_err(|_| LacewingError::unrecognized_url(link))?;
        let host = url
            .host_str()
            .ok_or_else(|| LacewingError::unrecognized_url(link))?;
        if !self.site.is_known_host(host) {
            return Err(LacewingError::unrecognized_url(link));
        }

        let segments: Vec<&str> = url
            .path_segments()
            .map(|parts| parts.filter(|part| !part.is_empty()).collect())
            .unwrap_or_default();
        if segments.len() != 2 {
            return Err(LacewingError::unrecognized_url(link));
        }
        let (kind, entity) = (segments[0], segments[1]);

        let mut builder = Query::builder(link);
        match kind {
            "taxa" => {
                let id = leading_digits(entity)
                    .ok_or_else(|| LacewingError::unrecognized_url(link))?;
                let clause = self.taxon_clause(id)?;
                builder.set_taxa(
                    TaxonSelector::new(vec![clause]).expect("one taxon clause"),
                );
            }
            "observations" => {
                let id = leading_digits(entity)
                    .ok_or_else(|| LacewingError::unrecognized_url(link))?;
                let taxon_id = self.resolvers.observations.observation_taxon(id)?;
                let clause = self.taxon_clause(taxon_id)?;
                builder.set_taxa(
                    TaxonSelector::new(vec![clause]).expect("one taxon clause"),
                );
            }
            "places" => {
                let reference = entity_ref(entity);
                let name = match &reference {
                    EntityRef::Id(_) => self.resolvers.places.resolve_place(&reference)?,
                    EntityRef::Slug(slug) => slug_name(slug),
                };
                builder.push_clause(Clause::Place(PlaceSelector {
                    place: self.payload(&name),
                }));
            }
            "projects" => {
                let reference = entity_ref(entity);
                let name = match &reference {
                    EntityRef::Id(_) => self.resolvers.projects.resolve_project(&reference)?,
                    EntityRef::Slug(slug) => slug_name(slug),
                };
                builder.push_clause(Clause::Project(ProjectSelector {
                    project: self.payload(&name),
                }));
            }
            // A login is an identifier, not a display name: numeric ids
            // resolve to the login, slugs pass through verbatim.
            "people" | "users" => {
                let reference = entity_ref(entity);
                let login = match &reference {
                    EntityRef::Id(_) => self.resolvers.users.resolve_user(&reference)?,
                    EntityRef::Slug(slug) => slug.clone(),
                };
                builder.push_clause(Clause::User(UserSelector {
                    role: UserRole::ObservedBy,
                    who: self.payload(&login),
                }));
            }
            _ => return Err(LacewingError::unrecognized_url(link)),
        }

        let query = builder.finish().expect("mapper output is never empty");
        let text = query.to_string();
        debug!(url = link, query = &*text; "Mapped permalink to query text");
        Ok(text)
    }

    /// Resolve a taxon id to a name clause, qualifying homonyms with their
    /// distinguishing ancestor.
    fn taxon_clause(&self, id: TaxonId) -> Result<TaxonClause, LacewingError> {
        let lookup = self.resolvers.taxa.resolve_taxon(id)?;
        let target = &lookup.target;

        let rivals: Vec<&TaxonSummary> = lookup
            .homonyms
            .iter()
            .filter(|h| h.id != target.id && h.name.eq_ignore_ascii_case(&target.name))
            .collect();

        let ancestor = if rivals.is_empty() {
            None
        } else {
            distinguishing_ancestor(target, &rivals)
        };

        Ok(TaxonClause::Name {
            name: self.name_query(&target.name),
            ancestor: ancestor.map(|a| self.name_query(a)),
        })
    }

    fn name_query(&self, name: &str) -> NameQuery {
        NameQuery::Terms(self.payload(name))
    }

    /// Turn a resolved name into payload text that is guaranteed to
    /// re-parse: if any word of the name would act as a keyword or a
    /// numeric id, the whole name is emitted as a quoted phrase.
    fn payload(&self, name: &str) -> TextRun {
        let words: Vec<&str> = name.split_whitespace().collect();
        let collides = words.iter().any(|word| {
            self.config.is_any_keyword(word)
                || self.config.is_ancestor_keyword(word)
                || self.config.compound_of_single(word).is_some()
                || word.chars().all(|c| c.is_ascii_digit())
                || word.contains([',', '=', '"'])
        });

        if collides || words.is_empty() {
            TextRun::new(vec![TextPart::Phrase(name.to_string())])
        } else {
            TextRun::new(
                words
                    .into_iter()
                    .map(|word| TextPart::Word(word.to_string()))
                    .collect(),
            )
        }
    }
}

/// The outermost ancestor of `target` that no rival shares.
///
/// Ancestor chains are root-first, so the first non-shared entry is the
/// broadest clade that tells the homonyms apart (`animalia` vs `plantae`).
fn distinguishing_ancestor<'t>(
    target: &'t TaxonSummary,
    rivals: &[&TaxonSummary],
) -> Option<&'t str> {
    target
        .ancestors
        .iter()
        .find(|ancestor| {
            !rivals.iter().any(|rival| {
                rival
                    .ancestors
                    .iter()
                    .any(|ra| ra.eq_ignore_ascii_case(ancestor))
            })
        })
        .map(String::as_str)
}

/// Leading digits of a permalink entity segment (`1-Animalia` carries id 1).
fn leading_digits(segment: &str) -> Option<u64> {
    let digits: &str = {
        let end = segment
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(segment.len());
        &segment[..end]
    };
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// Classify a place/project/user segment as numeric id or slug.
fn entity_ref(segment: &str) -> EntityRef {
    if !segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit()) {
        if let Ok(id) = segment.parse() {
            return EntityRef::Id(id);
        }
    }
    EntityRef::Slug(segment.to_string())
}

/// A slug becomes human-readable by replacing `-` with a space.
fn slug_name(slug: &str) -> String {
    slug.replace('-', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use lacewing_core::resolve::{ObservationId, ResolutionError, TaxonLookup};

    struct StubResolvers;

    impl TaxonResolver for StubResolvers {
        fn resolve_taxon(&self, id: TaxonId) -> Result<TaxonLookup, ResolutionError> {
            match id {
                64515 => Ok(TaxonLookup {
                    target: TaxonSummary {
                        id: 64515,
                        name: "Prunella".to_string(),
                        ancestors: vec![
                            "Life".to_string(),
                            "Animalia".to_string(),
                            "Chordata".to_string(),
                            "Aves".to_string(),
                        ],
                    },
                    homonyms: vec![TaxonSummary {
                        id: 57047,
                        name: "Prunella".to_string(),
                        ancestors: vec![
                            "Life".to_string(),
                            "Plantae".to_string(),
                            "Tracheophyta".to_string(),
                        ],
                    }],
                }),
                47113 => Ok(TaxonLookup {
                    target: TaxonSummary {
                        id: 47113,
                        name: "Ardea herodias".to_string(),
                        ancestors: vec!["Life".to_string(), "Animalia".to_string()],
                    },
                    homonyms: Vec::new(),
                }),
                _ => Err(ResolutionError::NotFound {
                    what: format!("taxon {id}"),
                }),
            }
        }
    }

    impl ObservationResolver for StubResolvers {
        fn observation_taxon(&self, id: ObservationId) -> Result<TaxonId, ResolutionError> {
            match id {
                111222 => Ok(64515),
                _ => Err(ResolutionError::NotFound {
                    what: format!("observation {id}"),
                }),
            }
        }
    }

    impl PlaceResolver for StubResolvers {
        fn resolve_place(&self, place: &EntityRef) -> Result<String, ResolutionError> {
            match place {
                EntityRef::Id(6853) => Ok("Nova Scotia".to_string()),
                other => Err(ResolutionError::NotFound {
                    what: format!("place {other:?}"),
                }),
            }
        }
    }

    impl UserResolver for StubResolvers {
        fn resolve_user(&self, user: &EntityRef) -> Result<String, ResolutionError> {
            match user {
                EntityRef::Id(545640) => Ok("benarmstrong".to_string()),
                other => Err(ResolutionError::NotFound {
                    what: format!("user {other:?}"),
                }),
            }
        }
    }

    impl ProjectResolver for StubResolvers {
        fn resolve_project(&self, project: &EntityRef) -> Result<String, ResolutionError> {
            match project {
                EntityRef::Id(2222) => Ok("Arthropods on Snow".to_string()),
                other => Err(ResolutionError::NotFound {
                    what: format!("project {other:?}"),
                }),
            }
        }
    }

    fn mapper(stub: &StubResolvers) -> UrlMapper<'_> {
        UrlMapper::new(
            KeywordConfig::standard(),
            Resolvers {
                taxa: stub,
                observations: stub,
                places: stub,
                users: stub,
                projects: stub,
            },
        )
    }

    #[test]
    fn test_unambiguous_taxon_permalink() {
        let stub = StubResolvers;
        let text = mapper(&stub)
            .query_text("https://www.inaturalist.org/taxa/47113")
            .unwrap();
        assert_eq!(text, "Ardea herodias");
    }

    #[test]
    fn test_homonym_taxon_gets_ancestor_qualifier() {
        let stub = StubResolvers;
        let text = mapper(&stub)
            .query_text("https://www.inaturalist.org/taxa/64515")
            .unwrap();
        assert_eq!(text, "Prunella in Animalia");
    }

    #[test]
    fn test_observation_permalink_resolves_through_taxon() {
        let stub = StubResolvers;
        let text = mapper(&stub)
            .query_text("https://www.inaturalist.org/observations/111222")
            .unwrap();
        assert_eq!(text, "Prunella in Animalia");
    }

    #[test]
    fn test_taxon_segment_with_name_suffix() {
        let stub = StubResolvers;
        let text = mapper(&stub)
            .query_text("https://www.inaturalist.org/taxa/47113-Ardea-herodias")
            .unwrap();
        assert_eq!(text, "Ardea herodias");
    }

    #[test]
    fn test_place_slug_dehyphenated_without_lookup() {
        let stub = StubResolvers;
        let text = mapper(&stub)
            .query_text("https://www.inaturalist.org/places/nova-scotia")
            .unwrap();
        assert_eq!(text, "from nova scotia");
    }

    #[test]
    fn test_place_id_resolved() {
        let stub = StubResolvers;
        let text = mapper(&stub)
            .query_text("https://inaturalist.ca/places/6853")
            .unwrap();
        assert_eq!(text, "from Nova Scotia");
    }

    #[test]
    fn test_project_id_resolved() {
        let stub = StubResolvers;
        let text = mapper(&stub)
            .query_text("https://www.inaturalist.org/projects/2222")
            .unwrap();
        assert_eq!(text, "in-prj Arthropods on Snow");
    }

    #[test]
    fn test_user_permalink_both_shapes() {
        let stub = StubResolvers;
        let text = mapper(&stub)
            .query_text("https://www.inaturalist.org/people/545640")
            .unwrap();
        assert_eq!(text, "by benarmstrong");

        let text = mapper(&stub)
            .query_text("https://www.inaturalist.org/users/benarmstrong")
            .unwrap();
        assert_eq!(text, "by benarmstrong");
    }

    #[test]
    fn test_partner_subdomain_recognized() {
        let stub = StubResolvers;
        let text = mapper(&stub)
            .query_text("https://uk.inaturalist.org/taxa/47113")
            .unwrap();
        assert_eq!(text, "Ardea herodias");
    }

    #[test]
    fn test_unknown_host_rejected() {
        let stub = StubResolvers;
        let err = mapper(&stub)
            .query_text("https://example.com/taxa/47113")
            .unwrap_err();
        assert!(matches!(err, LacewingError::UnrecognizedUrl { .. }));
    }

    #[test]
    fn test_unknown_shape_rejected() {
        let stub = StubResolvers;
        let err = mapper(&stub)
            .query_text("https://www.inaturalist.org/pages/help")
            .unwrap_err();
        assert!(matches!(err, LacewingError::UnrecognizedUrl { .. }));
    }

    #[test]
    fn test_resolution_errors_pass_through() {
        let stub = StubResolvers;
        let err = mapper(&stub)
            .query_text("https://www.inaturalist.org/taxa/99999")
            .unwrap_err();
        assert!(matches!(err, LacewingError::Resolution(_)));
    }

    #[test]
    fn test_keyword_colliding_name_is_quoted() {
        struct KeywordyPlace;
        impl PlaceResolver for KeywordyPlace {
            fn resolve_place(&self, _: &EntityRef) -> Result<String, ResolutionError> {
                Ok("Snails by Night".to_string())
            }
        }

        let stub = StubResolvers;
        let place = KeywordyPlace;
        let mapper = UrlMapper::new(
            KeywordConfig::standard(),
            Resolvers {
                taxa: &stub,
                observations: &stub,
                places: &place,
                users: &stub,
                projects: &stub,
            },
        );

        let text = mapper
            .query_text("https://www.inaturalist.org/places/42")
            .unwrap();
        assert_eq!(text, r#"from "Snails by Night""#);
    }
}
