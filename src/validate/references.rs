//! Reference-link validation.

use crate::model::{allowed_targets, bom_ref_sites, ref_link_sites, Bom, EntityKind};
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// A reference that does not resolve to an allowed entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokenReference {
    /// Kind of the entity holding the reference.
    pub source: EntityKind,
    /// Identifier of that entity, when it has one.
    pub source_ref: Option<String>,
    /// Wire name of the reference field.
    pub field: &'static str,
    /// The dangling value.
    pub reference: String,
    /// Kinds the field may point at in the document's version.
    pub allowed: Vec<EntityKind>,
}

impl fmt::Display for BrokenReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{} -> '{}'", self.source, self.field, self.reference)?;
        if let Some(source_ref) = &self.source_ref {
            write!(f, " (in '{source_ref}')")?;
        }
        let allowed: Vec<&str> = self.allowed.iter().map(|k| k.name()).collect();
        write!(f, " does not resolve to any of [{}]", allowed.join(", "))
    }
}

/// Identifier index: every bom-ref with the kinds of the entities carrying it.
pub(crate) fn identifier_index(bom: &Bom) -> IndexMap<&str, Vec<EntityKind>> {
    let mut index: IndexMap<&str, Vec<EntityKind>> = IndexMap::new();
    for (kind, bom_ref) in bom_ref_sites(bom) {
        index.entry(bom_ref).or_default().push(kind);
    }
    index
}

/// Every reference in `bom` that does not resolve to an entity of an allowed
/// kind at the document's declared version, in document order.
///
/// Read-only; documents without references yield an empty list.
#[must_use]
pub fn validate_references(bom: &Bom) -> Vec<BrokenReference> {
    let index = identifier_index(bom);
    let mut broken = Vec::new();
    for site in ref_link_sites(bom) {
        let allowed = allowed_targets(site.source, site.field, bom.spec_version);
        let resolves = index
            .get(site.reference)
            .is_some_and(|kinds| kinds.iter().any(|k| allowed.contains(k)));
        if !resolves {
            tracing::trace!(
                source = %site.source,
                field = site.field,
                reference = site.reference,
                "dangling reference"
            );
            broken.push(BrokenReference {
                source: site.source,
                source_ref: site.source_ref.map(str::to_string),
                field: site.field,
                reference: site.reference.to_string(),
                allowed: allowed.to_vec(),
            });
        }
    }
    broken
}
