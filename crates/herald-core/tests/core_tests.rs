//! Comprehensive tests for herald-core: entity vocabulary, descriptors, errors

use herald_core::*;

// ===========================================================================
// EntityId
// ===========================================================================

#[test]
fn entity_id_new_and_display() {
    let id = EntityId::new("https://localhost:8080/api/catalogs/42");
    assert_eq!(id.as_str(), "https://localhost:8080/api/catalogs/42");
    assert_eq!(format!("{}", id), "https://localhost:8080/api/catalogs/42");
}

#[test]
fn entity_id_clone_is_cheap() {
    let id = EntityId::new("abc");
    let cloned = id.clone();
    assert_eq!(id, cloned);
    assert_eq!(id.as_str(), cloned.as_str());
}

#[test]
fn entity_id_from_string() {
    let id: EntityId = "hello".into();
    assert_eq!(id.as_str(), "hello");
    let id2: EntityId = String::from("world").into();
    assert_eq!(id2.as_str(), "world");
}

#[test]
fn entity_id_equality_and_hash() {
    use std::collections::HashSet;
    let a = EntityId::new("same");
    let b = EntityId::new("same");
    let c = EntityId::new("different");
    assert_eq!(a, b);
    assert_ne!(a, c);
    let mut set = HashSet::new();
    set.insert(a.clone());
    assert!(set.contains(&b));
    assert!(!set.contains(&c));
}

#[test]
fn entity_id_serde_is_a_plain_string() {
    let id = EntityId::new("x-1");
    assert_eq!(serde_json::to_string(&id).unwrap(), r#""x-1""#);
    let back: EntityId = serde_json::from_str(r#""x-1""#).unwrap();
    assert_eq!(back, id);
}

#[test]
fn entity_id_empty_detection() {
    assert!(EntityId::new("").is_empty());
    assert!(!EntityId::new("a").is_empty());
}

// ===========================================================================
// EntityKind / Relation
// ===========================================================================

#[test]
fn entity_kind_serializes_lowercase() {
    assert_eq!(
        serde_json::to_string(&EntityKind::Catalog).unwrap(),
        r#""catalog""#
    );
    assert_eq!(
        serde_json::to_string(&EntityKind::Representation).unwrap(),
        r#""representation""#
    );
}

#[test]
fn relation_endpoints_and_display() {
    assert_eq!(
        Relation::CatalogOffer.endpoints(),
        (EntityKind::Catalog, EntityKind::Resource)
    );
    assert_eq!(
        Relation::ContractRule.endpoints(),
        (EntityKind::Contract, EntityKind::Rule)
    );
    assert_eq!(format!("{}", Relation::OfferRepresentation), "offer-representation");
}

#[test]
fn relation_joining_finds_legal_pairs() {
    assert_eq!(
        Relation::joining(EntityKind::Representation, EntityKind::Artifact),
        Some(Relation::RepresentationArtifact)
    );
    assert_eq!(Relation::joining(EntityKind::Artifact, EntityKind::Contract), None);
    assert!(Relation::CatalogOffer.is_legal(EntityKind::Catalog, EntityKind::Resource));
    assert!(!Relation::ContractRule.is_legal(EntityKind::Rule, EntityKind::Catalog));
}

#[test]
fn link_display_names_all_parts() {
    let link = Link::new(
        Relation::OfferContract,
        EntityId::new("res-1"),
        EntityId::new("con-1"),
    );
    let text = format!("{}", link);
    assert!(text.contains("offer-contract"));
    assert!(text.contains("res-1"));
    assert!(text.contains("con-1"));
}

// ===========================================================================
// ResourceMeta / RepresentationMeta
// ===========================================================================

#[test]
fn resource_meta_builder_chain() {
    let meta = ResourceMeta::titled("Demo Resource", "An offer used in examples")
        .with_publisher("https://example.org")
        .with_license("https://spdx.org/licenses/CC0-1.0")
        .with_language("EN")
        .with_asset_type("dataset")
        .with_keyword("weather")
        .with_keyword("sensor");
    assert_eq!(meta.title, "Demo Resource");
    assert_eq!(meta.keywords, vec!["weather", "sensor"]);
    assert_eq!(meta.asset_type.as_deref(), Some("dataset"));
}

#[test]
fn resource_meta_omits_empty_fields_on_the_wire() {
    let meta = ResourceMeta::titled("Bare", "");
    let json = serde_json::to_value(&meta).unwrap();
    let obj = json.as_object().unwrap();
    assert!(obj.contains_key("title"));
    assert!(!obj.contains_key("assetType"));
    assert!(!obj.contains_key("keywords"));
}

#[test]
fn representation_meta_media_type() {
    let meta = RepresentationMeta::titled("JSON view").with_media_type("application/json");
    assert_eq!(meta.media_type.as_deref(), Some("application/json"));
}

// ===========================================================================
// ApiCredential / ArtifactSpec
// ===========================================================================

#[test]
fn credential_authorization_shorthand() {
    let cred = ApiCredential::authorization("Bearer tok");
    assert_eq!(cred.header, "Authorization");
    assert_eq!(cred.value, "Bearer tok");
}

#[test]
fn credential_debug_redacts_value() {
    let cred = ApiCredential::new("X-Api-Key", "sekret");
    let dbg = format!("{cred:?}");
    assert!(dbg.contains("X-Api-Key"));
    assert!(!dbg.contains("sekret"));
}

#[test]
fn artifact_spec_tagged_serialization() {
    let inline = ArtifactSpec::inline("Readings", "19.5");
    let json = serde_json::to_value(&inline).unwrap();
    assert_eq!(json["type"], "inline");
    assert_eq!(json["value"], "19.5");

    let remote = ArtifactSpec::remote("Feed", "http://backend:5000/data", None);
    let json = serde_json::to_value(&remote).unwrap();
    assert_eq!(json["type"], "remote");
    assert_eq!(json["accessUrl"], "http://backend:5000/data");
    assert!(json.get("credential").is_none());
}

#[test]
fn artifact_spec_title_accessor() {
    assert_eq!(ArtifactSpec::inline("A", "v").title(), "A");
    assert_eq!(ArtifactSpec::remote("B", "u", None).title(), "B");
}

// ===========================================================================
// ContractWindow
// ===========================================================================

#[test]
fn window_valid_when_start_before_end() {
    let window = ContractWindow::new(
        "2023-04-06T13:33:44.995+02:00".parse().unwrap(),
        "2024-12-06T13:33:44.995+02:00".parse().unwrap(),
    );
    assert!(window.is_valid());
    assert!(window.check().is_ok());
}

#[test]
fn window_rejects_start_at_or_after_end() {
    let t = "2023-04-06T13:33:44.995+02:00".parse().unwrap();
    let window = ContractWindow::new(t, t);
    assert!(!window.is_valid());
    let err = window.check().unwrap_err();
    match err {
        Error::CreateFailed { entity, kind, .. } => {
            assert_eq!(entity, EntityKind::Contract);
            assert_eq!(kind, CreateFailureKind::InvalidWindow);
        }
        other => panic!("expected CreateFailed, got {other}"),
    }
}

// ===========================================================================
// PolicyDocument
// ===========================================================================

#[test]
fn usage_count_policy_is_well_formed() {
    let policy = PolicyDocument::usage_count_limit(1000);
    assert!(policy.check().is_ok());
    let wire = policy.to_wire_string();
    assert!(wire.contains("COUNT"));
    assert!(wire.contains("LTEQ"));
    assert!(wire.contains("1000"));
}

#[test]
fn policy_from_str_parses_json() {
    let policy: PolicyDocument = r#"{"action": ["USE"]}"#.parse().unwrap();
    assert!(policy.check().is_ok());
}

#[test]
fn malformed_policy_fails_check() {
    let policy: PolicyDocument = r#"{"note": "no action here"}"#.parse().unwrap();
    let err = policy.check().unwrap_err();
    match err {
        Error::CreateFailed { entity, kind, .. } => {
            assert_eq!(entity, EntityKind::Rule);
            assert_eq!(kind, CreateFailureKind::InvalidPolicy);
        }
        other => panic!("expected CreateFailed, got {other}"),
    }
}

// ===========================================================================
// BackendEndpoint / join_url
// ===========================================================================

#[test]
fn backend_endpoint_builds_remote_descriptor() {
    let spec = BackendEndpoint::new("http://backend:5000/")
        .with_bearer_token("token-1")
        .artifact("/measurements", "Live feed");
    match spec {
        ArtifactSpec::Remote {
            access_url,
            credential,
            ..
        } => {
            assert_eq!(access_url, "http://backend:5000/measurements");
            assert!(credential.is_some());
        }
        other => panic!("expected remote spec, got {other:?}"),
    }
}

#[test]
fn join_url_is_pure_textual() {
    assert_eq!(join_url("http://h/a/", "/b"), "http://h/a/b");
    assert_eq!(join_url("http://h", ""), "http://h");
}

// ===========================================================================
// Errors
// ===========================================================================

#[test]
fn lint_violation_converts_into_error() {
    let violation = LintViolation::EmptyId {
        relation: Relation::CatalogOffer,
        role: LinkRole::Child,
    };
    let err: Error = violation.clone().into();
    assert_eq!(err.to_string(), violation.to_string());
}

#[test]
fn link_failed_message_is_complete() {
    let err = Error::link_failed(
        Relation::RepresentationArtifact,
        &EntityId::new("rep-1"),
        &EntityId::new("art-1"),
        "store returned 404",
    );
    let msg = err.to_string();
    assert!(msg.contains("representation-artifact"));
    assert!(msg.contains("rep-1"));
    assert!(msg.contains("art-1"));
    assert!(msg.contains("404"));
}

#[test]
fn cancelled_is_terse() {
    assert_eq!(Error::Cancelled.to_string(), "cancelled");
}

// ===========================================================================
// Config
// ===========================================================================

#[test]
fn config_round_trips_through_json() {
    let cfg = HeraldConfig::default();
    let json = serde_json::to_string(&cfg).unwrap();
    let back: HeraldConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back.broker.public_host, cfg.broker.public_host);
    assert_eq!(back.retry.attempts, cfg.retry.attempts);
}

#[test]
fn config_discover_without_file_yields_defaults() {
    let cfg = HeraldConfig::discover(Some(std::path::Path::new(
        "/nonexistent/offer.json",
    )))
    .unwrap();
    assert_eq!(cfg.store.timeout_secs, 30);
}
