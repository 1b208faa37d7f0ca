//! Offer description, the input to a publication run

use herald_core::{
    ArtifactSpec, ContractWindow, EntityId, PolicyDocument, RepresentationMeta, ResourceMeta,
    Result,
};
use serde::{Deserialize, Serialize};

/// Which catalog receives the offer.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum CatalogSpec {
    /// Mint a fresh catalog at the start of the run.
    #[default]
    New,
    /// Adopt a catalog created by an earlier run.
    Existing(EntityId),
}

/// One representation and the artifact backing it. Exactly one artifact
/// per representation, by construction.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RepresentationDescription {
    #[serde(flatten)]
    pub meta: RepresentationMeta,
    pub artifact: ArtifactSpec,
}

impl RepresentationDescription {
    pub fn new(meta: RepresentationMeta, artifact: ArtifactSpec) -> Self {
        Self { meta, artifact }
    }
}

/// Usage-control envelope for the offer.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ContractDescription {
    #[serde(flatten)]
    pub window: ContractWindow,
    pub rules: Vec<PolicyDocument>,
}

impl ContractDescription {
    pub fn new(window: ContractWindow, rules: Vec<PolicyDocument>) -> Self {
        Self { window, rules }
    }
}

/// Complete input for one publication run.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OfferDescription {
    #[serde(default)]
    pub catalog: CatalogSpec,
    pub resource: ResourceMeta,
    pub representations: Vec<RepresentationDescription>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract: Option<ContractDescription>,
}

impl OfferDescription {
    /// Offline validation: the checks a store would apply at creation
    /// time, without issuing any call. Used by the `lint` command.
    pub fn validate(&self) -> Result<()> {
        if let Some(contract) = &self.contract {
            contract.window.check()?;
            for rule in &contract.rules {
                rule.check()?;
            }
        }
        Ok(())
    }

    /// Number of link calls a successful run will issue.
    pub fn planned_links(&self) -> usize {
        let reps = self.representations.len();
        let contract = match &self.contract {
            Some(c) => 1 + c.rules.len(),
            None => 0,
        };
        1 + reps * 2 + contract
    }
}
