//! Runtime-typed entity wrapper.

use super::{merge_with, BomEntity, ListMergeStrategy, MergeOutcome, Mergeable};
use crate::error::{BomError, Result};
use crate::model::{
    Component, Composition, Dependency, EntityKind, ExternalReference, Hash, Service, Tool,
    Vulnerability,
};

/// One of the top-level mergeable entities, for callers that only know the
/// kind at runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum AnyEntity {
    Component(Component),
    Service(Service),
    Dependency(Dependency),
    Vulnerability(Vulnerability),
    Tool(Tool),
    Hash(Hash),
    ExternalReference(ExternalReference),
    Composition(Composition),
}

macro_rules! dispatch {
    ($value:expr, $entity:ident => $body:expr) => {
        match $value {
            AnyEntity::Component($entity) => $body,
            AnyEntity::Service($entity) => $body,
            AnyEntity::Dependency($entity) => $body,
            AnyEntity::Vulnerability($entity) => $body,
            AnyEntity::Tool($entity) => $body,
            AnyEntity::Hash($entity) => $body,
            AnyEntity::ExternalReference($entity) => $body,
            AnyEntity::Composition($entity) => $body,
        }
    };
}

fn typed<T: Mergeable>(
    entity: &mut T,
    other: &T,
    strategy: ListMergeStrategy,
) -> Result<MergeOutcome> {
    merge_with(entity, Some(other), strategy)
}

impl AnyEntity {
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Component(_) => EntityKind::Component,
            Self::Service(_) => EntityKind::Service,
            Self::Dependency(_) => EntityKind::Dependency,
            Self::Vulnerability(_) => EntityKind::Vulnerability,
            Self::Tool(_) => EntityKind::Tool,
            Self::Hash(_) => EntityKind::Hash,
            Self::ExternalReference(_) => EntityKind::ExternalReference,
            Self::Composition(_) => EntityKind::Composition,
        }
    }

    #[must_use]
    pub fn canonical_bytes(&self) -> Vec<u8> {
        dispatch!(self, e => e.canonical_bytes())
    }

    /// Equality of canonical forms. Different kinds are never equal.
    #[must_use]
    pub fn entity_eq(&self, other: &Self) -> bool {
        self.kind() == other.kind() && self.canonical_bytes() == other.canonical_bytes()
    }

    /// Merge `other` into `self`; both must be the same kind.
    pub fn merge_with(&mut self, other: &Self, strategy: ListMergeStrategy) -> Result<MergeOutcome> {
        match (self, other) {
            (Self::Component(a), Self::Component(b)) => typed(a, b, strategy),
            (Self::Service(a), Self::Service(b)) => typed(a, b, strategy),
            (Self::Dependency(a), Self::Dependency(b)) => typed(a, b, strategy),
            (Self::Vulnerability(a), Self::Vulnerability(b)) => typed(a, b, strategy),
            (Self::Tool(a), Self::Tool(b)) => typed(a, b, strategy),
            (Self::Hash(a), Self::Hash(b)) => typed(a, b, strategy),
            (Self::ExternalReference(a), Self::ExternalReference(b)) => typed(a, b, strategy),
            (Self::Composition(a), Self::Composition(b)) => typed(a, b, strategy),
            (a, b) => Err(BomError::incompatible_entities(
                a.kind().name(),
                b.kind().name(),
            )),
        }
    }
}

macro_rules! impl_from {
    ($($variant:ident),+) => {
        $(
            impl From<$variant> for AnyEntity {
                fn from(value: $variant) -> Self {
                    Self::$variant(value)
                }
            }
        )+
    };
}

impl_from!(
    Component,
    Service,
    Dependency,
    Vulnerability,
    Tool,
    Hash,
    ExternalReference,
    Composition
);
