//! Pre-link validation
//!
//! Every link is checked here before the store sees it. The linter only
//! trusts ids it watched being minted (plus an adopted catalog), so a
//! guessed or stale identifier can never reach a link call.

use herald_core::{EntityId, EntityKind, LinkRole, LintViolation, Relation};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct LinkLinter {
    known: HashMap<EntityId, EntityKind>,
    committed: Vec<(Relation, EntityId, EntityId)>,
    bound: HashMap<EntityId, EntityId>,
}

impl LinkLinter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an id this run minted (or adopted).
    pub fn learn(&mut self, id: &EntityId, kind: EntityKind) {
        self.known.insert(id.clone(), kind);
    }

    pub fn knows(&self, id: &EntityId) -> bool {
        self.known.contains_key(id)
    }

    /// Clear one prospective link for issue. Any violation is fatal for
    /// the run.
    pub fn check(
        &self,
        relation: Relation,
        parent: &EntityId,
        child: &EntityId,
    ) -> Result<(), LintViolation> {
        if parent.is_empty() {
            return Err(LintViolation::EmptyId {
                relation,
                role: LinkRole::Parent,
            });
        }
        if child.is_empty() {
            return Err(LintViolation::EmptyId {
                relation,
                role: LinkRole::Child,
            });
        }
        let parent_kind = *self.known.get(parent).ok_or_else(|| LintViolation::UnknownId {
            relation,
            role: LinkRole::Parent,
            id: parent.clone(),
        })?;
        let child_kind = *self.known.get(child).ok_or_else(|| LintViolation::UnknownId {
            relation,
            role: LinkRole::Child,
            id: child.clone(),
        })?;
        if !relation.is_legal(parent_kind, child_kind) {
            return Err(LintViolation::KindMismatch {
                relation,
                parent_kind,
                child_kind,
            });
        }
        if self
            .committed
            .iter()
            .any(|(r, p, c)| *r == relation && p == parent && c == child)
        {
            return Err(LintViolation::Duplicate {
                relation,
                parent: parent.clone(),
                child: child.clone(),
            });
        }
        if relation == Relation::RepresentationArtifact {
            if let Some(existing) = self.bound.get(parent) {
                return Err(LintViolation::ArtifactRebound {
                    representation: parent.clone(),
                    bound: existing.clone(),
                    offered: child.clone(),
                });
            }
        }
        Ok(())
    }

    /// Record a link the store accepted.
    pub fn commit(&mut self, relation: Relation, parent: &EntityId, child: &EntityId) {
        self.committed
            .push((relation, parent.clone(), child.clone()));
        if relation == Relation::RepresentationArtifact {
            self.bound.insert(parent.clone(), child.clone());
        }
    }
}
