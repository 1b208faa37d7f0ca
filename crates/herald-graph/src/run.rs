//! Publication run state
//!
//! One `Publication` per run, produced by the builder and advanced by the
//! publisher. Everything the run minted or committed is held here, so a
//! partial failure leaves an inspectable record instead of an implicit
//! position in control flow.

use herald_core::{EntityId, Link};
use herald_store::BrokerAck;
use serde::Serialize;

/// How far a run has progressed.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RunPhase {
    /// Creates in flight; ids partially minted.
    Creating,
    /// Every entity exists; links not yet issued.
    Created,
    /// Offer graph complete; not yet registered.
    Linked,
    /// Registered with the broker.
    Published,
}

#[derive(Clone, Debug, Serialize)]
pub struct Publication {
    pub run_id: String,
    pub phase: RunPhase,
    pub catalog: Option<EntityId>,
    /// False when the catalog was adopted rather than minted by this run.
    pub catalog_created: bool,
    pub resource: Option<EntityId>,
    pub representations: Vec<EntityId>,
    pub artifacts: Vec<EntityId>,
    pub contract: Option<EntityId>,
    pub rules: Vec<EntityId>,
    pub links: Vec<Link>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ack: Option<BrokerAck>,
}

impl Publication {
    pub(crate) fn new() -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            phase: RunPhase::Creating,
            catalog: None,
            catalog_created: false,
            resource: None,
            representations: Vec::new(),
            artifacts: Vec::new(),
            contract: None,
            rules: Vec::new(),
            links: Vec::new(),
            ack: None,
        }
    }

    pub fn resource_id(&self) -> Option<&EntityId> {
        self.resource.as_ref()
    }

    /// Entities this run created (an adopted catalog is not counted).
    pub fn created_count(&self) -> usize {
        let mut count = self.representations.len() + self.artifacts.len() + self.rules.len();
        count += usize::from(self.catalog_created);
        count += usize::from(self.resource.is_some());
        count += usize::from(self.contract.is_some());
        count
    }

    pub fn is_published(&self) -> bool {
        self.phase == RunPhase::Published
    }
}
