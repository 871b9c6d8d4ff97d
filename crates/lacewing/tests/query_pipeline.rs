use lacewing::query::{Clause, TaxonClause};
use lacewing::resolve::{
    EntityRef, ObservationId, ObservationResolver, PlaceResolver, ProjectResolver,
    ResolutionError, ResolutionRequest, TaxonId, TaxonLookup, TaxonResolver, TaxonSummary,
    UserResolver,
};
use lacewing::selector::{DateField, UserRole};
use lacewing::url::{Resolvers, UrlMapper};
use lacewing::{KeywordConfig, LacewingError, QueryBuilder};

#[test]
fn test_parse_full_command() {
    let builder = QueryBuilder::default();

    let query = builder
        .parse("my rg myrtle warbler from home since june")
        .expect("failed to parse");

    assert_eq!(query.macros(), ["my", "rg"]);
    let clauses = query.taxon_selector().expect("taxon selector").clauses();
    assert!(matches!(&clauses[0], TaxonClause::Name { .. }));
    assert_eq!(query.places().next().unwrap().place.text(), "home");
    assert_eq!(
        query.dates().next().unwrap().field,
        DateField::ObservedSince
    );
}

#[test]
fn test_canonical_text_reparses_equal() {
    let builder = QueryBuilder::default();

    for command in [
        "52775,48484",
        "waspsonly",
        "prunella in animalia by me",
        r#"in prj "arthropods on snow" id by cam"#,
        "birds by ben my rank species until 2021",
        "home nid sort-by observed per-page 30",
    ] {
        let query = builder.parse(command).expect("failed to parse");
        let canonical = builder.canonical(&query);
        let reparsed = builder.parse(&canonical).expect("canonical must reparse");
        assert_eq!(query, reparsed, "round trip failed for `{command}`");
    }
}

#[test]
fn test_parse_error_carries_source() {
    let builder = QueryBuilder::default();

    let err = builder.parse("in plantae").unwrap_err();
    match err {
        LacewingError::Parse { src, .. } => assert_eq!(src, "in plantae"),
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn test_resolution_requests_surface_external_work() {
    let builder = QueryBuilder::default();

    let query = builder
        .parse("prunella in animalia by me since last week")
        .expect("failed to parse");

    let requests = query.resolution_requests();
    assert!(requests.iter().any(|r| matches!(
        r,
        ResolutionRequest::TaxonName { name, ancestor: Some(a) }
            if name == "prunella" && a == "animalia"
    )));
    assert!(requests.iter().any(|r| matches!(
        r,
        ResolutionRequest::ResolveUser { role: UserRole::ObservedBy, who } if who == "me"
    )));
    assert!(requests.iter().any(|r| matches!(
        r,
        ResolutionRequest::ParseDate { field: DateField::ObservedSince, expression }
            if expression == "last week"
    )));
}

#[test]
fn test_custom_keyword_config() {
    let config = KeywordConfig::new(
        ["by", "from"],
        ["mine"],
        None::<&str>,
        None::<(&str, &[&str])>,
    );
    let builder = QueryBuilder::new(config);

    let query = builder.parse("mine sparrows by ben").expect("failed to parse");
    assert_eq!(query.macros(), ["mine"]);

    // `rg` is not a macro in this configuration, so it is a taxon word.
    let query = builder.parse("rg sparrows").expect("failed to parse");
    assert!(query.macros().is_empty());
    let clauses = query.taxon_selector().unwrap().clauses();
    assert!(matches!(&clauses[0], TaxonClause::Name { .. }));
}

// =============================================================================
// Permalink mapping through the same serialization contract
// =============================================================================

struct Stub;

impl TaxonResolver for Stub {
    fn resolve_taxon(&self, id: TaxonId) -> Result<TaxonLookup, ResolutionError> {
        if id != 64515 {
            return Err(ResolutionError::NotFound {
                what: format!("taxon {id}"),
            });
        }
        Ok(TaxonLookup {
            target: TaxonSummary {
                id: 64515,
                name: "Prunella".to_string(),
                ancestors: vec!["Life".to_string(), "Animalia".to_string(), "Aves".to_string()],
            },
            homonyms: vec![TaxonSummary {
                id: 57047,
                name: "Prunella".to_string(),
                ancestors: vec!["Life".to_string(), "Plantae".to_string()],
            }],
        })
    }
}

impl ObservationResolver for Stub {
    fn observation_taxon(&self, _: ObservationId) -> Result<TaxonId, ResolutionError> {
        Ok(64515)
    }
}

impl PlaceResolver for Stub {
    fn resolve_place(&self, _: &EntityRef) -> Result<String, ResolutionError> {
        Ok("Nova Scotia".to_string())
    }
}

impl UserResolver for Stub {
    fn resolve_user(&self, _: &EntityRef) -> Result<String, ResolutionError> {
        Ok("benarmstrong".to_string())
    }
}

impl ProjectResolver for Stub {
    fn resolve_project(&self, _: &EntityRef) -> Result<String, ResolutionError> {
        Ok("Arthropods on Snow".to_string())
    }
}

#[test]
fn test_ambiguous_observation_permalink_maps_and_reparses() {
    let stub = Stub;
    let mapper = UrlMapper::new(
        KeywordConfig::standard(),
        Resolvers {
            taxa: &stub,
            observations: &stub,
            places: &stub,
            users: &stub,
            projects: &stub,
        },
    );

    let text = mapper
        .query_text("https://www.inaturalist.org/observations/111222")
        .expect("failed to map permalink");
    assert!(text.contains("in Animalia"), "query text: {text}");

    // The mapper output is guaranteed parseable.
    let builder = QueryBuilder::default();
    let query = builder.parse(&text).expect("mapper output must parse");
    let clauses = query.taxon_selector().expect("taxon selector").clauses();
    match &clauses[0] {
        TaxonClause::Name { name, ancestor } => {
            assert_eq!(name.text(), "Prunella");
            assert_eq!(ancestor.as_ref().unwrap().text(), "Animalia");
        }
        other => panic!("expected name clause, got {other:?}"),
    }
}

#[test]
fn test_mapped_place_permalink_parses_as_place_clause() {
    let stub = Stub;
    let mapper = UrlMapper::new(
        KeywordConfig::standard(),
        Resolvers {
            taxa: &stub,
            observations: &stub,
            places: &stub,
            users: &stub,
            projects: &stub,
        },
    );

    let text = mapper
        .query_text("https://www.inaturalist.org/places/6853")
        .expect("failed to map permalink");
    let query = QueryBuilder::default()
        .parse(&text)
        .expect("mapper output must parse");

    match &query.clauses()[0] {
        Clause::Place(place) => assert_eq!(place.place.text(), "Nova Scotia"),
        other => panic!("expected place clause, got {other:?}"),
    }
}
