//! Dataspace connector management API client
//!
//! Talks to the connector's REST surface: one POST per entity kind, the
//! minted id read from the `Location` header (body `_links.self.href` as a
//! fallback), and link calls that POST a one-element child array to the
//! parent's sub-route. Ids are the connector's own dereferenceable URLs, so
//! link routes are built on the parent id itself.

use crate::store::EntityStore;
use async_trait::async_trait;
use herald_core::{
    ApiCredential, ArtifactSpec, ContractWindow, CreateFailureKind, EntityId, EntityKind, Error,
    PolicyDocument, Relation, RepresentationMeta, ResourceMeta, Result, StoreConfig,
};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, error};

/// Ontology key the connector stores the asset-type tag under.
const ASSET_TYPE_KEY: &str = "https://www.trusts-data.eu/ontology/asset_type";
const ASSET_TYPE_PREFIX: &str = "https://www.trusts-data.eu/ontology/";

pub struct HttpEntityStore {
    client: Client,
    base_url: String,
    user: String,
    password: String,
}

impl HttpEntityStore {
    pub fn from_config(cfg: &StoreConfig) -> std::result::Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(cfg.timeout())
            .danger_accept_invalid_certs(cfg.accept_invalid_certs)
            .build()?;
        Ok(Self {
            client,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            user: cfg.user.clone(),
            password: cfg.password.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn create<B>(&self, entity: EntityKind, route: &str, body: &B) -> Result<EntityId>
    where
        B: Serialize + Sync + ?Sized,
    {
        let url = format!("{}/{}", self.base_url, route);
        let response = self
            .client
            .post(&url)
            .basic_auth(&self.user, Some(&self.password))
            .json(body)
            .send()
            .await
            .map_err(|e| transport_create(entity, e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!(%entity, %status, "store rejected create");
            return Err(Error::create_failed(
                entity,
                CreateFailureKind::Rejected,
                format!("{status}: {text}"),
            ));
        }

        let id = created_id(entity, response).await?;
        debug!(%entity, %id, "created entity");
        Ok(id)
    }
}

#[async_trait]
impl EntityStore for HttpEntityStore {
    fn name(&self) -> &str {
        "connector"
    }

    async fn create_catalog(&self) -> Result<EntityId> {
        self.create(EntityKind::Catalog, "api/catalogs", &serde_json::json!({}))
            .await
    }

    async fn create_resource(&self, meta: &ResourceMeta) -> Result<EntityId> {
        self.create(EntityKind::Resource, "api/offers", &OfferDoc::from(meta))
            .await
    }

    async fn create_representation(&self, meta: &RepresentationMeta) -> Result<EntityId> {
        self.create(
            EntityKind::Representation,
            "api/representations",
            &RepresentationDoc::from(meta),
        )
        .await
    }

    async fn create_artifact(&self, spec: &ArtifactSpec) -> Result<EntityId> {
        self.create(
            EntityKind::Artifact,
            "api/artifacts",
            &ArtifactDoc::from(spec),
        )
        .await
    }

    async fn create_contract(&self, window: &ContractWindow) -> Result<EntityId> {
        window.check()?;
        self.create(
            EntityKind::Contract,
            "api/contracts",
            &ContractDoc::from(window),
        )
        .await
    }

    async fn create_rule(&self, policy: &PolicyDocument) -> Result<EntityId> {
        policy.check()?;
        self.create(EntityKind::Rule, "api/rules", &RuleDoc::from(policy))
            .await
    }

    async fn link(&self, relation: Relation, parent: &EntityId, child: &EntityId) -> Result<()> {
        let url = format!(
            "{}/{}",
            parent.as_str().trim_end_matches('/'),
            link_segment(relation)
        );
        let response = self
            .client
            .post(&url)
            .basic_auth(&self.user, Some(&self.password))
            .json(&[child.as_str()])
            .send()
            .await
            .map_err(|e| Error::link_failed(relation, parent, child, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!(%relation, %status, "store rejected link");
            return Err(Error::link_failed(
                relation,
                parent,
                child,
                format!("{status}: {text}"),
            ));
        }
        debug!(%relation, %parent, %child, "linked entities");
        Ok(())
    }
}

/// Sub-route under the parent id that accepts the child array.
fn link_segment(relation: Relation) -> &'static str {
    match relation {
        Relation::CatalogOffer => "offers",
        Relation::OfferRepresentation => "representations",
        Relation::RepresentationArtifact => "artifacts",
        Relation::OfferContract => "contracts",
        Relation::ContractRule => "rules",
    }
}

fn transport_create(entity: EntityKind, err: reqwest::Error) -> Error {
    let kind = if err.is_timeout() {
        CreateFailureKind::Timeout
    } else {
        CreateFailureKind::Unreachable
    };
    Error::create_failed(entity, kind, err.to_string())
}

async fn created_id(entity: EntityKind, response: Response) -> Result<EntityId> {
    let location = response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    if let Some(location) = location {
        return Ok(EntityId::new(location));
    }
    let doc: CreatedDoc = response.json().await.map_err(|e| {
        Error::create_failed(
            entity,
            CreateFailureKind::Rejected,
            format!("response carried no usable id: {e}"),
        )
    })?;
    Ok(EntityId::new(doc.links.self_link.href))
}

fn asset_type_value(tag: &str) -> String {
    if tag.starts_with("http://") || tag.starts_with("https://") {
        tag.to_string()
    } else {
        format!("{ASSET_TYPE_PREFIX}{tag}")
    }
}

#[derive(Serialize)]
struct OfferDoc<'a> {
    title: &'a str,
    description: &'a str,
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    keywords: &'a [String],
    publisher: &'a str,
    license: &'a str,
    language: &'a str,
    #[serde(rename = "https://www.trusts-data.eu/ontology/asset_type")]
    #[serde(skip_serializing_if = "Option::is_none")]
    asset_type: Option<String>,
    #[serde(flatten)]
    additional: &'a BTreeMap<String, String>,
}

impl<'a> From<&'a ResourceMeta> for OfferDoc<'a> {
    fn from(meta: &'a ResourceMeta) -> Self {
        Self {
            title: &meta.title,
            description: &meta.description,
            keywords: &meta.keywords,
            publisher: &meta.publisher,
            license: &meta.license,
            language: &meta.language,
            asset_type: meta.asset_type.as_deref().map(asset_type_value),
            additional: &meta.additional,
        }
    }
}

#[derive(Serialize)]
struct RepresentationDoc<'a> {
    title: &'a str,
    #[serde(rename = "mediaType", skip_serializing_if = "Option::is_none")]
    media_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<&'a str>,
}

impl<'a> From<&'a RepresentationMeta> for RepresentationDoc<'a> {
    fn from(meta: &'a RepresentationMeta) -> Self {
        Self {
            title: &meta.title,
            media_type: meta.media_type.as_deref(),
            language: meta.language.as_deref(),
        }
    }
}

#[derive(Serialize)]
struct ArtifactDoc<'a> {
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<&'a str>,
    #[serde(rename = "accessUrl", skip_serializing_if = "Option::is_none")]
    access_url: Option<&'a str>,
    #[serde(rename = "apiKey", skip_serializing_if = "Option::is_none")]
    api_key: Option<ApiKeyDoc<'a>>,
}

impl<'a> From<&'a ArtifactSpec> for ArtifactDoc<'a> {
    fn from(spec: &'a ArtifactSpec) -> Self {
        match spec {
            ArtifactSpec::Inline { title, value } => Self {
                title,
                value: Some(value),
                access_url: None,
                api_key: None,
            },
            ArtifactSpec::Remote {
                title,
                access_url,
                credential,
            } => Self {
                title,
                value: None,
                access_url: Some(access_url),
                api_key: credential.as_ref().map(ApiKeyDoc::from),
            },
        }
    }
}

#[derive(Serialize)]
struct ApiKeyDoc<'a> {
    key: &'a str,
    value: &'a str,
}

impl<'a> From<&'a ApiCredential> for ApiKeyDoc<'a> {
    fn from(cred: &'a ApiCredential) -> Self {
        Self {
            key: &cred.header,
            value: &cred.value,
        }
    }
}

#[derive(Serialize)]
struct ContractDoc {
    start: String,
    end: String,
}

impl From<&ContractWindow> for ContractDoc {
    fn from(window: &ContractWindow) -> Self {
        Self {
            start: window.start.to_rfc3339(),
            end: window.end.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
struct RuleDoc {
    value: String,
}

impl From<&PolicyDocument> for RuleDoc {
    fn from(policy: &PolicyDocument) -> Self {
        Self {
            value: policy.to_wire_string(),
        }
    }
}

#[derive(Deserialize)]
struct CreatedDoc {
    #[serde(rename = "_links")]
    links: LinksDoc,
}

#[derive(Deserialize)]
struct LinksDoc {
    #[serde(rename = "self")]
    self_link: HrefDoc,
}

#[derive(Deserialize)]
struct HrefDoc {
    href: String,
}
