//! EntityStore boundary

use async_trait::async_trait;
use herald_core::{
    ArtifactSpec, ContractWindow, EntityId, PolicyDocument, Relation, RepresentationMeta,
    ResourceMeta, Result,
};

/// Create/link operations against a metadata store.
///
/// Creates return the store-assigned id of the new entity. Links attach an
/// already-created child under an already-created parent and are issued
/// strictly after the creates that minted both ids. Implementations enforce
/// input validity (window, policy) but not call ordering; ordering is the
/// graph builder's contract.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    async fn create_catalog(&self) -> Result<EntityId>;

    async fn create_resource(&self, meta: &ResourceMeta) -> Result<EntityId>;

    async fn create_representation(&self, meta: &RepresentationMeta) -> Result<EntityId>;

    async fn create_artifact(&self, spec: &ArtifactSpec) -> Result<EntityId>;

    /// Fails with `CreateFailed(InvalidWindow, _)` before any request when
    /// the window is inverted.
    async fn create_contract(&self, window: &ContractWindow) -> Result<EntityId>;

    /// Fails with `CreateFailed(InvalidPolicy, _)` before any request when
    /// the policy document is malformed.
    async fn create_rule(&self, policy: &PolicyDocument) -> Result<EntityId>;

    /// Attach `child` under `parent`.
    async fn link(&self, relation: Relation, parent: &EntityId, child: &EntityId) -> Result<()>;
}
