//! In-memory store and broker
//!
//! Backs `--dry-run` and the test suites. Mints URL-shaped ids the way the
//! connector would, applies the same window/policy checks, and records
//! every call so a finished run is inspectable. Links are kept as an
//! append-only list: duplicates are accepted here on purpose, matching the
//! connector, so the linter stays the only duplicate guard.

use crate::broker::{Broker, BrokerAck};
use crate::store::EntityStore;
use async_trait::async_trait;
use herald_core::{
    ArtifactSpec, ContractWindow, CreateFailureKind, EntityId, EntityKind, Error, Link,
    PolicyDocument, PublishFailureKind, Relation, RepresentationMeta, ResourceMeta, Result,
};
use tokio::sync::Mutex;
use tracing::debug;

/// Scripted failure, consumed by the first matching call.
#[derive(Clone, Debug)]
pub enum StoreFault {
    /// Reject the next create of this kind with the given failure kind.
    Create(EntityKind, CreateFailureKind),
    /// Fail the next link of this relation.
    Link(Relation),
}

#[derive(Default)]
struct MemoryState {
    entities: Vec<(EntityId, EntityKind)>,
    links: Vec<Link>,
    create_calls: usize,
    link_calls: usize,
    faults: Vec<StoreFault>,
}

impl MemoryState {
    fn kind_of(&self, id: &EntityId) -> Option<EntityKind> {
        self.entities
            .iter()
            .find(|(known, _)| known == id)
            .map(|(_, kind)| *kind)
    }

    fn take_create_fault(&mut self, kind: EntityKind) -> Option<CreateFailureKind> {
        let pos = self
            .faults
            .iter()
            .position(|f| matches!(f, StoreFault::Create(k, _) if *k == kind))?;
        match self.faults.remove(pos) {
            StoreFault::Create(_, failure) => Some(failure),
            StoreFault::Link(_) => None,
        }
    }

    fn take_link_fault(&mut self, relation: Relation) -> bool {
        let pos = self
            .faults
            .iter()
            .position(|f| matches!(f, StoreFault::Link(r) if *r == relation));
        match pos {
            Some(pos) => {
                self.faults.remove(pos);
                true
            }
            None => false,
        }
    }
}

pub struct MemoryStore {
    authority: String,
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_authority("localhost:8080")
    }

    pub fn with_authority(authority: impl Into<String>) -> Self {
        Self {
            authority: authority.into(),
            state: Mutex::new(MemoryState::default()),
        }
    }

    /// Script a failure for the first matching future call.
    pub async fn fail_next(&self, fault: StoreFault) {
        self.state.lock().await.faults.push(fault);
    }

    /// Register an id minted elsewhere, e.g. an adopted catalog.
    pub async fn adopt(&self, id: &EntityId, kind: EntityKind) {
        self.state.lock().await.entities.push((id.clone(), kind));
    }

    pub async fn created(&self) -> Vec<(EntityId, EntityKind)> {
        self.state.lock().await.entities.clone()
    }

    pub async fn links(&self) -> Vec<Link> {
        self.state.lock().await.links.clone()
    }

    pub async fn create_calls(&self) -> usize {
        self.state.lock().await.create_calls
    }

    pub async fn link_calls(&self) -> usize {
        self.state.lock().await.link_calls
    }

    async fn mint(&self, kind: EntityKind) -> Result<EntityId> {
        let mut state = self.state.lock().await;
        state.create_calls += 1;
        if let Some(failure) = state.take_create_fault(kind) {
            return Err(Error::create_failed(kind, failure, "scripted failure"));
        }
        let id = EntityId::new(format!(
            "http://{}/api/{}/{}",
            self.authority,
            route_segment(kind),
            uuid::Uuid::new_v4()
        ));
        state.entities.push((id.clone(), kind));
        debug!(%kind, %id, "minted entity");
        Ok(id)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn route_segment(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Catalog => "catalogs",
        EntityKind::Resource => "offers",
        EntityKind::Representation => "representations",
        EntityKind::Artifact => "artifacts",
        EntityKind::Contract => "contracts",
        EntityKind::Rule => "rules",
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn create_catalog(&self) -> Result<EntityId> {
        self.mint(EntityKind::Catalog).await
    }

    async fn create_resource(&self, _meta: &ResourceMeta) -> Result<EntityId> {
        self.mint(EntityKind::Resource).await
    }

    async fn create_representation(&self, _meta: &RepresentationMeta) -> Result<EntityId> {
        self.mint(EntityKind::Representation).await
    }

    async fn create_artifact(&self, _spec: &ArtifactSpec) -> Result<EntityId> {
        self.mint(EntityKind::Artifact).await
    }

    async fn create_contract(&self, window: &ContractWindow) -> Result<EntityId> {
        window.check()?;
        self.mint(EntityKind::Contract).await
    }

    async fn create_rule(&self, policy: &PolicyDocument) -> Result<EntityId> {
        policy.check()?;
        self.mint(EntityKind::Rule).await
    }

    async fn link(&self, relation: Relation, parent: &EntityId, child: &EntityId) -> Result<()> {
        let mut state = self.state.lock().await;
        state.link_calls += 1;
        if state.take_link_fault(relation) {
            return Err(Error::link_failed(
                relation,
                parent,
                child,
                "scripted failure",
            ));
        }
        let parent_kind = state
            .kind_of(parent)
            .ok_or_else(|| Error::link_failed(relation, parent, child, "unknown parent id"))?;
        let child_kind = state
            .kind_of(child)
            .ok_or_else(|| Error::link_failed(relation, parent, child, "unknown child id"))?;
        if !relation.is_legal(parent_kind, child_kind) {
            return Err(Error::link_failed(
                relation,
                parent,
                child,
                format!("relation does not join {parent_kind} -> {child_kind}"),
            ));
        }
        state
            .links
            .push(Link::new(relation, parent.clone(), child.clone()));
        Ok(())
    }
}

#[derive(Default)]
struct BrokerState {
    registered: Vec<EntityId>,
    calls: usize,
    faults: Vec<PublishFailureKind>,
}

/// Broker double. Scripted faults are consumed one per call, so a retry
/// ladder can be exercised by queueing transient failures ahead of a
/// success.
#[derive(Default)]
pub struct MemoryBroker {
    state: Mutex<BrokerState>,
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn fail_next(&self, kind: PublishFailureKind) {
        self.state.lock().await.faults.push(kind);
    }

    pub async fn registered(&self) -> Vec<EntityId> {
        self.state.lock().await.registered.clone()
    }

    pub async fn calls(&self) -> usize {
        self.state.lock().await.calls
    }
}

#[async_trait]
impl Broker for MemoryBroker {
    fn name(&self) -> &str {
        "memory"
    }

    async fn register(&self, resource_id: &EntityId) -> Result<BrokerAck> {
        let mut state = self.state.lock().await;
        state.calls += 1;
        if !state.faults.is_empty() {
            let kind = state.faults.remove(0);
            return Err(Error::publish_failed(kind, "scripted failure"));
        }
        state.registered.push(resource_id.clone());
        debug!(resource = %resource_id, "registered resource");
        Ok(BrokerAck {
            resource_id: resource_id.clone(),
            detail: "registered".into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn minted_ids_are_url_shaped_and_distinct() {
        let store = MemoryStore::new();
        let a = store.create_catalog().await.unwrap();
        let b = store.create_catalog().await.unwrap();
        assert!(a.as_str().starts_with("http://localhost:8080/api/catalogs/"));
        assert_ne!(a, b);
        assert_eq!(store.create_calls().await, 2);
    }

    #[tokio::test]
    async fn link_requires_known_ids_and_legal_relation() {
        let store = MemoryStore::new();
        let catalog = store.create_catalog().await.unwrap();
        let resource = store
            .create_resource(&ResourceMeta::titled("t", "d"))
            .await
            .unwrap();

        store
            .link(Relation::CatalogOffer, &catalog, &resource)
            .await
            .unwrap();

        let unknown = EntityId::new("http://localhost:8080/api/offers/nope");
        let err = store
            .link(Relation::CatalogOffer, &catalog, &unknown)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("unknown child id"));

        let err = store
            .link(Relation::ContractRule, &catalog, &resource)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("does not join"));
    }

    #[tokio::test]
    async fn duplicate_links_are_accepted_by_the_store() {
        let store = MemoryStore::new();
        let catalog = store.create_catalog().await.unwrap();
        let resource = store
            .create_resource(&ResourceMeta::titled("t", "d"))
            .await
            .unwrap();
        store
            .link(Relation::CatalogOffer, &catalog, &resource)
            .await
            .unwrap();
        store
            .link(Relation::CatalogOffer, &catalog, &resource)
            .await
            .unwrap();
        assert_eq!(store.links().await.len(), 2);
    }

    #[tokio::test]
    async fn scripted_create_fault_fires_once() {
        let store = MemoryStore::new();
        store
            .fail_next(StoreFault::Create(
                EntityKind::Artifact,
                CreateFailureKind::Rejected,
            ))
            .await;

        let spec = ArtifactSpec::inline("a", "v");
        let err = store.create_artifact(&spec).await.unwrap_err();
        match err {
            Error::CreateFailed { entity, kind, .. } => {
                assert_eq!(entity, EntityKind::Artifact);
                assert_eq!(kind, CreateFailureKind::Rejected);
            }
            other => panic!("expected CreateFailed, got {other}"),
        }
        store.create_artifact(&spec).await.unwrap();
    }

    #[tokio::test]
    async fn adopted_id_is_linkable() {
        let store = MemoryStore::new();
        let adopted = EntityId::new("http://elsewhere/api/catalogs/known");
        store.adopt(&adopted, EntityKind::Catalog).await;
        let resource = store
            .create_resource(&ResourceMeta::titled("t", "d"))
            .await
            .unwrap();
        store
            .link(Relation::CatalogOffer, &adopted, &resource)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn invalid_window_fails_without_minting() {
        let store = MemoryStore::new();
        let t = "2023-04-06T13:33:44.995+02:00".parse().unwrap();
        let err = store
            .create_contract(&ContractWindow::new(t, t))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::CreateFailed {
                kind: CreateFailureKind::InvalidWindow,
                ..
            }
        ));
        assert!(store.created().await.is_empty());
    }

    #[tokio::test]
    async fn broker_faults_consume_in_order() {
        let broker = MemoryBroker::new();
        broker.fail_next(PublishFailureKind::Unreachable).await;
        broker.fail_next(PublishFailureKind::Timeout).await;

        let id = EntityId::new("http://service-provider:8080/api/offers/1");
        assert!(broker.register(&id).await.is_err());
        assert!(broker.register(&id).await.is_err());
        let ack = broker.register(&id).await.unwrap();
        assert_eq!(ack.resource_id, id);
        assert_eq!(broker.calls().await, 3);
        assert_eq!(broker.registered().await, vec![id]);
    }
}
