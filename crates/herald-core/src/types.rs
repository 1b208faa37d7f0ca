//! Core types for the offer graph

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Store-assigned entity identifier: a URI-shaped string, cheaply cloneable.
///
/// Ids are opaque to this crate: the store mints them, the graph builder
/// threads them through link calls, the publisher rewrites only the host
/// segment. Nothing here parses or fabricates them.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct EntityId(Arc<str>);

impl EntityId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(Arc::from(s.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl Serialize for EntityId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self::new(String::deserialize(deserializer)?))
    }
}

/// Entity kinds in the offer graph.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Catalog,
    Resource,
    Representation,
    Artifact,
    Contract,
    Rule,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Catalog => write!(f, "catalog"),
            Self::Resource => write!(f, "resource"),
            Self::Representation => write!(f, "representation"),
            Self::Artifact => write!(f, "artifact"),
            Self::Contract => write!(f, "contract"),
            Self::Rule => write!(f, "rule"),
        }
    }
}

/// Directed link relations. Each relation is legal for exactly one
/// parent/child kind pair.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    /// Catalog → Resource
    CatalogOffer,
    /// Resource → Representation
    OfferRepresentation,
    /// Representation → Artifact
    RepresentationArtifact,
    /// Resource → Contract
    OfferContract,
    /// Contract → Rule
    ContractRule,
}

impl Relation {
    /// The (parent, child) kind pair this relation joins.
    pub fn endpoints(&self) -> (EntityKind, EntityKind) {
        match self {
            Self::CatalogOffer => (EntityKind::Catalog, EntityKind::Resource),
            Self::OfferRepresentation => (EntityKind::Resource, EntityKind::Representation),
            Self::RepresentationArtifact => (EntityKind::Representation, EntityKind::Artifact),
            Self::OfferContract => (EntityKind::Resource, EntityKind::Contract),
            Self::ContractRule => (EntityKind::Contract, EntityKind::Rule),
        }
    }

    pub fn is_legal(&self, parent: EntityKind, child: EntityKind) -> bool {
        self.endpoints() == (parent, child)
    }

    /// Reverse lookup: the relation joining a kind pair, if any.
    pub fn joining(parent: EntityKind, child: EntityKind) -> Option<Relation> {
        [
            Self::CatalogOffer,
            Self::OfferRepresentation,
            Self::RepresentationArtifact,
            Self::OfferContract,
            Self::ContractRule,
        ]
        .into_iter()
        .find(|r| r.is_legal(parent, child))
    }
}

impl std::fmt::Display for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CatalogOffer => write!(f, "catalog-offer"),
            Self::OfferRepresentation => write!(f, "offer-representation"),
            Self::RepresentationArtifact => write!(f, "representation-artifact"),
            Self::OfferContract => write!(f, "offer-contract"),
            Self::ContractRule => write!(f, "contract-rule"),
        }
    }
}

/// A committed directed link between two created entities.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Link {
    pub relation: Relation,
    pub parent: EntityId,
    pub child: EntityId,
}

impl Link {
    pub fn new(relation: Relation, parent: EntityId, child: EntityId) -> Self {
        Self {
            relation,
            parent,
            child,
        }
    }
}

impl std::fmt::Display for Link {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} -> {}", self.relation, self.parent, self.child)
    }
}

/// Metadata block for an offered resource.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ResourceMeta {
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    pub publisher: String,
    pub license: String,
    pub language: String,
    /// Asset-type tag, emitted under the ontology key on the wire.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_type: Option<String>,
    /// Free-form extension attributes passed through to the store document.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub additional: BTreeMap<String, String>,
}

impl ResourceMeta {
    pub fn titled(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn with_publisher(mut self, publisher: impl Into<String>) -> Self {
        self.publisher = publisher.into();
        self
    }

    pub fn with_license(mut self, license: impl Into<String>) -> Self {
        self.license = license.into();
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_asset_type(mut self, asset_type: impl Into<String>) -> Self {
        self.asset_type = Some(asset_type.into());
        self
    }

    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keywords.push(keyword.into());
        self
    }
}

/// Metadata block for a named view of a resource.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct RepresentationMeta {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl RepresentationMeta {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }
}

/// Header name/value pair a consumer presents to a backend.
///
/// The value is an opaque secret. `Debug` redacts it; it must never reach
/// logs or error text. Serialization carries the real pair because the
/// store document and the offer manifest need it.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiCredential {
    pub header: String,
    pub value: String,
}

impl ApiCredential {
    pub fn new(header: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            value: value.into(),
        }
    }

    /// Credential sent in the `Authorization` header, value as given
    /// (callers supply any `Bearer ` prefix themselves).
    pub fn authorization(value: impl Into<String>) -> Self {
        Self::new("Authorization", value)
    }
}

impl std::fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCredential")
            .field("header", &self.header)
            .field("value", &"<redacted>")
            .finish()
    }
}

/// The retrievable payload backing a representation.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ArtifactSpec {
    /// Literal payload embedded in the store document.
    Inline { title: String, value: String },
    /// Proxy to a backend URL, optionally authenticated by a credential
    /// the consumer replays against that URL.
    #[serde(rename_all = "camelCase")]
    Remote {
        title: String,
        access_url: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        credential: Option<ApiCredential>,
    },
}

impl ArtifactSpec {
    pub fn inline(title: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Inline {
            title: title.into(),
            value: value.into(),
        }
    }

    pub fn remote(
        title: impl Into<String>,
        access_url: impl Into<String>,
        credential: Option<ApiCredential>,
    ) -> Self {
        Self::Remote {
            title: title.into(),
            access_url: access_url.into(),
            credential,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Inline { title, .. } => title,
            Self::Remote { title, .. } => title,
        }
    }
}

/// Contract validity window `[start, end)`. Deserializable in any state;
/// `check` enforces start < end at creation time; an inverted window is
/// an error, never swapped or clamped.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ContractWindow {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

impl ContractWindow {
    pub fn new(start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> Self {
        Self { start, end }
    }

    pub fn is_valid(&self) -> bool {
        self.start < self.end
    }

    /// Store-side validation: fails with `CreateFailed(InvalidWindow, _)`.
    pub fn check(&self) -> crate::error::Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(crate::error::Error::create_failed(
                EntityKind::Contract,
                crate::error::CreateFailureKind::InvalidWindow,
                format!("start {} is not before end {}", self.start, self.end),
            ))
        }
    }
}

/// Usage policy passed to rule creation. Opaque beyond well-formedness:
/// a JSON object carrying an action; constraints, when present, each name
/// a left operand, an operator, and a right operand. Both plain and
/// `ids:`-prefixed keys are accepted.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct PolicyDocument(serde_json::Value);

impl PolicyDocument {
    pub fn from_value(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    /// The document as the string the store document embeds.
    pub fn to_wire_string(&self) -> String {
        self.0.to_string()
    }

    /// Template for an n-times-usage permission: action USE, constraint
    /// COUNT ≤ `limit`.
    pub fn usage_count_limit(limit: u64) -> Self {
        let permission_id = format!(
            "https://w3id.org/idsa/autogen/permission/{}",
            uuid::Uuid::new_v4()
        );
        let constraint_id = format!(
            "https://w3id.org/idsa/autogen/constraint/{}",
            uuid::Uuid::new_v4()
        );
        Self(serde_json::json!({
            "@context": {
                "ids": "https://w3id.org/idsa/core/",
                "idsc": "https://w3id.org/idsa/code/"
            },
            "@type": "ids:Permission",
            "@id": permission_id,
            "ids:description": [
                { "@value": "n-times-usage", "@type": "http://www.w3.org/2001/XMLSchema#string" }
            ],
            "ids:title": [
                { "@value": "Usage Policy", "@type": "http://www.w3.org/2001/XMLSchema#string" }
            ],
            "ids:action": [ { "@id": "idsc:USE" } ],
            "ids:constraint": [{
                "@type": "ids:Constraint",
                "@id": constraint_id,
                "ids:leftOperand": { "@id": "idsc:COUNT" },
                "ids:operator": { "@id": "idsc:LTEQ" },
                "ids:rightOperand": {
                    "@value": limit.to_string(),
                    "@type": "http://www.w3.org/2001/XMLSchema#double"
                }
            }]
        }))
    }

    /// Store-side validation: fails with `CreateFailed(InvalidPolicy, _)`.
    pub fn check(&self) -> crate::error::Result<()> {
        self.well_formed().map_err(|cause| {
            crate::error::Error::create_failed(
                EntityKind::Rule,
                crate::error::CreateFailureKind::InvalidPolicy,
                cause,
            )
        })
    }

    fn well_formed(&self) -> Result<(), String> {
        let obj = match self.0.as_object() {
            Some(obj) => obj,
            None => return Err("policy is not a JSON object".into()),
        };
        let action = obj.get("ids:action").or_else(|| obj.get("action"));
        match action {
            None | Some(serde_json::Value::Null) => return Err("policy has no action".into()),
            Some(serde_json::Value::Array(a)) if a.is_empty() => {
                return Err("policy action list is empty".into())
            }
            Some(_) => {}
        }
        let constraints = obj.get("ids:constraint").or_else(|| obj.get("constraint"));
        if let Some(value) = constraints {
            let list = match value {
                serde_json::Value::Array(list) => list.as_slice(),
                single => std::slice::from_ref(single),
            };
            for (idx, c) in list.iter().enumerate() {
                let c = c
                    .as_object()
                    .ok_or_else(|| format!("constraint {idx} is not an object"))?;
                for part in ["leftOperand", "operator", "rightOperand"] {
                    let prefixed = format!("ids:{part}");
                    if !c.contains_key(part) && !c.contains_key(prefixed.as_str()) {
                        return Err(format!("constraint {idx} is missing {part}"));
                    }
                }
            }
        }
        Ok(())
    }
}

impl std::str::FromStr for PolicyDocument {
    type Err = serde_json::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(serde_json::from_str(s)?))
    }
}
