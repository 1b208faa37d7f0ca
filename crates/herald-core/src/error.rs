//! Error taxonomy for publication runs
//!
//! Every failure is a value returned to the caller; nothing here is fatal
//! to the host process beyond the single run. Credential values never
//! appear in any variant; causes carry status text and ids only.

use crate::types::{EntityId, EntityKind, Link, Relation};
use thiserror::Error;

/// Why a create call failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CreateFailureKind {
    /// Contract window with start ≥ end.
    InvalidWindow,
    /// Policy document that does not parse as well-formed policy data.
    InvalidPolicy,
    /// The store rejected the metadata document.
    Rejected,
    /// The store could not be reached.
    Unreachable,
    /// The store did not answer within the request timeout.
    Timeout,
}

impl std::fmt::Display for CreateFailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidWindow => write!(f, "invalid window"),
            Self::InvalidPolicy => write!(f, "invalid policy"),
            Self::Rejected => write!(f, "rejected"),
            Self::Unreachable => write!(f, "unreachable"),
            Self::Timeout => write!(f, "timeout"),
        }
    }
}

/// Why a broker registration failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PublishFailureKind {
    Unreachable,
    /// Broker-side validation failure. Never retried.
    Rejected,
    Timeout,
}

impl PublishFailureKind {
    /// Transient failures are the only ones a retry may help with.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unreachable | Self::Timeout)
    }
}

impl std::fmt::Display for PublishFailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unreachable => write!(f, "unreachable"),
            Self::Rejected => write!(f, "rejected"),
            Self::Timeout => write!(f, "timeout"),
        }
    }
}

/// Which end of a link a lint finding points at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkRole {
    Parent,
    Child,
}

impl std::fmt::Display for LinkRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parent => write!(f, "parent"),
            Self::Child => write!(f, "child"),
        }
    }
}

/// Pre-link validation finding. Any violation is fatal for the run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LintViolation {
    #[error("link {relation}: empty {role} id")]
    EmptyId { relation: Relation, role: LinkRole },

    #[error("link {relation}: {role} id {id} was not created by this run")]
    UnknownId {
        relation: Relation,
        role: LinkRole,
        id: EntityId,
    },

    #[error("relation {relation} cannot join {parent_kind} -> {child_kind}")]
    KindMismatch {
        relation: Relation,
        parent_kind: EntityKind,
        child_kind: EntityKind,
    },

    #[error("duplicate link {relation} {parent} -> {child}")]
    Duplicate {
        relation: Relation,
        parent: EntityId,
        child: EntityId,
    },

    #[error("representation {representation} is already backed by artifact {bound}; refusing {offered}")]
    ArtifactRebound {
        representation: EntityId,
        bound: EntityId,
        offered: EntityId,
    },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("create {entity} failed: {kind}: {cause}")]
    CreateFailed {
        entity: EntityKind,
        kind: CreateFailureKind,
        cause: String,
    },

    #[error(transparent)]
    Lint(#[from] LintViolation),

    #[error("link {relation} {parent} -> {child} failed: {cause}")]
    LinkFailed {
        relation: Relation,
        parent: EntityId,
        child: EntityId,
        cause: String,
    },

    /// Link phase died after some links were committed. The graph is not
    /// rolled back; an idempotent re-run is the recovery path.
    #[error(
        "partially linked: {}/{attempted} links committed before {relation} {parent} -> {child} failed: {cause}",
        committed.len()
    )]
    PartiallyLinked {
        committed: Vec<Link>,
        attempted: usize,
        relation: Relation,
        parent: EntityId,
        child: EntityId,
        cause: String,
    },

    #[error("broker publish failed: {kind}: {cause}")]
    PublishFailed {
        kind: PublishFailureKind,
        cause: String,
    },

    #[error("cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn create_failed(
        entity: EntityKind,
        kind: CreateFailureKind,
        cause: impl Into<String>,
    ) -> Self {
        Self::CreateFailed {
            entity,
            kind,
            cause: cause.into(),
        }
    }

    pub fn link_failed(
        relation: Relation,
        parent: &EntityId,
        child: &EntityId,
        cause: impl Into<String>,
    ) -> Self {
        Self::LinkFailed {
            relation,
            parent: parent.clone(),
            child: child.clone(),
            cause: cause.into(),
        }
    }

    pub fn publish_failed(kind: PublishFailureKind, cause: impl Into<String>) -> Self {
        Self::PublishFailed {
            kind,
            cause: cause.into(),
        }
    }
}
