//! Graph builder - drives a publication run against an EntityStore
//!
//! Strict phases: every entity is created before any link is issued, so a
//! failed create aborts the run with no links to unwind. A link failure
//! after at least one committed link surfaces as `PartiallyLinked` with
//! the committed set; recovery is an idempotent re-run, never a rollback.

use crate::lint::LinkLinter;
use crate::offer::{CatalogSpec, OfferDescription};
use crate::run::{Publication, RunPhase};
use herald_core::{EntityId, EntityKind, Error, Link, Relation, Result};
use herald_store::EntityStore;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub struct GraphBuilder {
    store: Arc<dyn EntityStore>,
}

impl GraphBuilder {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn EntityStore> {
        &self.store
    }

    /// Build without cancellation support.
    pub async fn build(&self, offer: &OfferDescription) -> Result<Publication> {
        // Use a token that is never cancelled
        let cancel = CancellationToken::new();
        self.build_cancellable(offer, &cancel).await
    }

    /// Build with cancellation support. When `cancel` fires, the in-flight
    /// store call is abandoned and no further call is issued; the run
    /// reports `Cancelled`.
    pub async fn build_cancellable(
        &self,
        offer: &OfferDescription,
        cancel: &CancellationToken,
    ) -> Result<Publication> {
        let mut publication = Publication::new();
        let mut linter = LinkLinter::new();
        info!(
            run = %publication.run_id,
            store = self.store.name(),
            representations = offer.representations.len(),
            "starting publication run"
        );

        // Create phase, top-down. Any failure aborts before any link call.
        let catalog = match &offer.catalog {
            CatalogSpec::New => {
                let id = guarded(cancel, self.store.create_catalog()).await?;
                publication.catalog_created = true;
                id
            }
            CatalogSpec::Existing(id) => {
                debug!(catalog = %id, "adopting existing catalog");
                id.clone()
            }
        };
        linter.learn(&catalog, EntityKind::Catalog);
        publication.catalog = Some(catalog.clone());

        let resource = guarded(cancel, self.store.create_resource(&offer.resource)).await?;
        linter.learn(&resource, EntityKind::Resource);
        publication.resource = Some(resource.clone());

        for rep in &offer.representations {
            let id = guarded(cancel, self.store.create_representation(&rep.meta)).await?;
            linter.learn(&id, EntityKind::Representation);
            publication.representations.push(id);
        }

        for rep in &offer.representations {
            let id = guarded(cancel, self.store.create_artifact(&rep.artifact)).await?;
            linter.learn(&id, EntityKind::Artifact);
            publication.artifacts.push(id);
        }

        if let Some(contract) = &offer.contract {
            let id = guarded(cancel, self.store.create_contract(&contract.window)).await?;
            linter.learn(&id, EntityKind::Contract);
            publication.contract = Some(id);

            for rule in &contract.rules {
                let id = guarded(cancel, self.store.create_rule(rule)).await?;
                linter.learn(&id, EntityKind::Rule);
                publication.rules.push(id);
            }
        }

        publication.phase = RunPhase::Created;
        debug!(
            run = %publication.run_id,
            creates = publication.created_count(),
            "create phase complete"
        );

        // Link phase, strictly after every create succeeded.
        let planned = offer.planned_links();
        self.issue_link(
            &mut publication,
            &mut linter,
            cancel,
            planned,
            Relation::CatalogOffer,
            &catalog,
            &resource,
        )
        .await?;

        for rep_id in publication.representations.clone() {
            self.issue_link(
                &mut publication,
                &mut linter,
                cancel,
                planned,
                Relation::OfferRepresentation,
                &resource,
                &rep_id,
            )
            .await?;
        }

        let pairs: Vec<(EntityId, EntityId)> = publication
            .representations
            .iter()
            .cloned()
            .zip(publication.artifacts.iter().cloned())
            .collect();
        for (rep_id, artifact_id) in pairs {
            self.issue_link(
                &mut publication,
                &mut linter,
                cancel,
                planned,
                Relation::RepresentationArtifact,
                &rep_id,
                &artifact_id,
            )
            .await?;
        }

        if let Some(contract_id) = publication.contract.clone() {
            self.issue_link(
                &mut publication,
                &mut linter,
                cancel,
                planned,
                Relation::OfferContract,
                &resource,
                &contract_id,
            )
            .await?;

            for rule_id in publication.rules.clone() {
                self.issue_link(
                    &mut publication,
                    &mut linter,
                    cancel,
                    planned,
                    Relation::ContractRule,
                    &contract_id,
                    &rule_id,
                )
                .await?;
            }
        }

        publication.phase = RunPhase::Linked;
        info!(
            run = %publication.run_id,
            resource = %resource,
            links = publication.links.len(),
            "offer graph linked"
        );
        Ok(publication)
    }

    #[allow(clippy::too_many_arguments)]
    async fn issue_link(
        &self,
        publication: &mut Publication,
        linter: &mut LinkLinter,
        cancel: &CancellationToken,
        planned: usize,
        relation: Relation,
        parent: &EntityId,
        child: &EntityId,
    ) -> Result<()> {
        linter.check(relation, parent, child)?;
        match guarded(cancel, self.store.link(relation, parent, child)).await {
            Ok(()) => {
                linter.commit(relation, parent, child);
                publication
                    .links
                    .push(Link::new(relation, parent.clone(), child.clone()));
                Ok(())
            }
            Err(Error::LinkFailed {
                relation,
                parent,
                child,
                cause,
            }) if !publication.links.is_empty() => Err(Error::PartiallyLinked {
                committed: publication.links.clone(),
                attempted: planned,
                relation,
                parent,
                child,
                cause,
            }),
            Err(e) => Err(e),
        }
    }
}

/// Run one store call under the run's cancellation token. The token is
/// checked before the call is issued and raced against it in flight, so a
/// fired token means no further request leaves this process.
async fn guarded<T, F>(cancel: &CancellationToken, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        result = call => result,
    }
}
