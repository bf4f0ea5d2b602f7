//! Per-field version availability.
//!
//! The table in this module is the single source of truth for which fields
//! a given specification version can carry. The downgrade engine clears
//! rows whose `since` is newer than the target, and the codecs consult
//! [`is_field_available`] when a wire shape depends on the version.

use super::SpecVersion;
use serde::Serialize;
use std::fmt;

/// Every entity kind in the document model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum EntityKind {
    Bom,
    Metadata,
    Tool,
    ToolChoices,
    Component,
    Pedigree,
    Evidence,
    EvidenceIdentity,
    Service,
    DataFlow,
    Dependency,
    Composition,
    ExternalReference,
    Hash,
    LicenseChoice,
    License,
    OrganizationalEntity,
    OrganizationalContact,
    Property,
    Vulnerability,
    VulnerabilityAnalysis,
    Affects,
    Annotation,
    Formula,
    Declarations,
    Assessor,
    Attestation,
    AttestationMap,
    Claim,
    DeclarationEvidence,
    Definitions,
    Standard,
    Requirement,
    Level,
}

impl EntityKind {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bom => "Bom",
            Self::Metadata => "Metadata",
            Self::Tool => "Tool",
            Self::ToolChoices => "ToolChoices",
            Self::Component => "Component",
            Self::Pedigree => "Pedigree",
            Self::Evidence => "Evidence",
            Self::EvidenceIdentity => "EvidenceIdentity",
            Self::Service => "Service",
            Self::DataFlow => "DataFlow",
            Self::Dependency => "Dependency",
            Self::Composition => "Composition",
            Self::ExternalReference => "ExternalReference",
            Self::Hash => "Hash",
            Self::LicenseChoice => "LicenseChoice",
            Self::License => "License",
            Self::OrganizationalEntity => "OrganizationalEntity",
            Self::OrganizationalContact => "OrganizationalContact",
            Self::Property => "Property",
            Self::Vulnerability => "Vulnerability",
            Self::VulnerabilityAnalysis => "VulnerabilityAnalysis",
            Self::Affects => "Affects",
            Self::Annotation => "Annotation",
            Self::Formula => "Formula",
            Self::Declarations => "Declarations",
            Self::Assessor => "Assessor",
            Self::Attestation => "Attestation",
            Self::AttestationMap => "AttestationMap",
            Self::Claim => "Claim",
            Self::DeclarationEvidence => "DeclarationEvidence",
            Self::Definitions => "Definitions",
            Self::Standard => "Standard",
            Self::Requirement => "Requirement",
            Self::Level => "Level",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Associates a model type with its [`EntityKind`].
pub trait Entity {
    const KIND: EntityKind;
}

/// A version-gated field: `field` (wire name) of `kind` exists from `since`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldAvailability {
    pub kind: EntityKind,
    pub field: &'static str,
    pub since: SpecVersion,
}

const fn row(kind: EntityKind, field: &'static str, since: SpecVersion) -> FieldAvailability {
    FieldAvailability { kind, field, since }
}

use EntityKind as K;
use SpecVersion as V;

/// Fields that did not exist in CycloneDX 1.0. Fields absent from this table
/// are available in every version their entity exists in.
pub static FIELD_AVAILABILITY: &[FieldAvailability] = &[
    // 1.1
    row(K::Bom, "serialNumber", V::V1_1),
    row(K::Bom, "externalReferences", V::V1_1),
    row(K::Component, "bom-ref", V::V1_1),
    row(K::Component, "pedigree", V::V1_1),
    row(K::Component, "externalReferences", V::V1_1),
    // 1.2
    row(K::Bom, "metadata", V::V1_2),
    row(K::Bom, "dependencies", V::V1_2),
    row(K::Bom, "services", V::V1_2),
    row(K::Component, "author", V::V1_2),
    row(K::Component, "mimeType", V::V1_2),
    row(K::Component, "supplier", V::V1_2),
    row(K::Component, "swid", V::V1_2),
    row(K::Pedigree, "patches", V::V1_2),
    // 1.3
    row(K::Bom, "compositions", V::V1_3),
    row(K::Metadata, "licenses", V::V1_3),
    row(K::Metadata, "properties", V::V1_3),
    row(K::Component, "properties", V::V1_3),
    row(K::Component, "evidence", V::V1_3),
    row(K::Service, "properties", V::V1_3),
    row(K::ExternalReference, "hashes", V::V1_3),
    // 1.4
    row(K::Bom, "vulnerabilities", V::V1_4),
    row(K::Component, "releaseNotes", V::V1_4),
    row(K::Service, "releaseNotes", V::V1_4),
    row(K::Tool, "externalReferences", V::V1_4),
    // 1.5
    row(K::Bom, "annotations", V::V1_5),
    row(K::Bom, "properties", V::V1_5),
    row(K::Bom, "formulation", V::V1_5),
    row(K::Metadata, "lifecycles", V::V1_5),
    row(K::ToolChoices, "components", V::V1_5),
    row(K::ToolChoices, "services", V::V1_5),
    row(K::Component, "modelCard", V::V1_5),
    row(K::Component, "data", V::V1_5),
    row(K::Service, "trustZone", V::V1_5),
    row(K::DataFlow, "name", V::V1_5),
    row(K::DataFlow, "description", V::V1_5),
    row(K::DataFlow, "governance", V::V1_5),
    row(K::DataFlow, "source", V::V1_5),
    row(K::DataFlow, "destination", V::V1_5),
    row(K::Composition, "bom-ref", V::V1_5),
    row(K::Composition, "vulnerabilities", V::V1_5),
    row(K::Vulnerability, "rejected", V::V1_5),
    row(K::Vulnerability, "proofOfConcept", V::V1_5),
    row(K::Vulnerability, "workaround", V::V1_5),
    row(K::VulnerabilityAnalysis, "firstIssued", V::V1_5),
    row(K::VulnerabilityAnalysis, "lastUpdated", V::V1_5),
    row(K::Evidence, "identity", V::V1_5),
    row(K::Evidence, "occurrences", V::V1_5),
    row(K::Evidence, "callstack", V::V1_5),
    row(K::LicenseChoice, "bom-ref", V::V1_5),
    row(K::License, "bom-ref", V::V1_5),
    row(K::License, "licensing", V::V1_5),
    row(K::License, "properties", V::V1_5),
    row(K::OrganizationalEntity, "bom-ref", V::V1_5),
    row(K::OrganizationalContact, "bom-ref", V::V1_5),
    // 1.6
    row(K::Bom, "declarations", V::V1_6),
    row(K::Bom, "definitions", V::V1_6),
    row(K::Metadata, "manufacturer", V::V1_6),
    row(K::Component, "cryptoProperties", V::V1_6),
    row(K::Component, "tags", V::V1_6),
    row(K::Component, "omniborId", V::V1_6),
    row(K::Component, "swhid", V::V1_6),
    row(K::Component, "authors", V::V1_6),
    row(K::Component, "manufacturer", V::V1_6),
    row(K::OrganizationalEntity, "address", V::V1_6),
    row(K::Service, "tags", V::V1_6),
    row(K::Dependency, "provides", V::V1_6),
    row(K::License, "acknowledgement", V::V1_6),
    row(K::LicenseChoice, "acknowledgement", V::V1_6),
    row(K::EvidenceIdentity, "concludedValue", V::V1_6),
];

/// Version that introduced `kind.field`, or `None` when the field is not gated.
#[must_use]
pub fn field_since(kind: EntityKind, field: &str) -> Option<SpecVersion> {
    FIELD_AVAILABILITY
        .iter()
        .find(|r| r.kind == kind && r.field == field)
        .map(|r| r.since)
}

/// Whether `kind.field` may be serialized at `version`.
#[must_use]
pub fn is_field_available(kind: EntityKind, field: &str, version: SpecVersion) -> bool {
    field_since(kind, field).map_or(true, |since| since <= version)
}

/// Fields of `kind` introduced exactly at `version`.
pub fn fields_introduced_at(
    kind: EntityKind,
    version: SpecVersion,
) -> impl Iterator<Item = &'static str> {
    FIELD_AVAILABILITY
        .iter()
        .filter(move |r| r.kind == kind && r.since == version)
        .map(|r| r.field)
}

/// Entity kinds with at least one field introduced at `version`.
#[must_use]
pub fn kinds_gated_at(version: SpecVersion) -> Vec<EntityKind> {
    let mut kinds: Vec<EntityKind> = FIELD_AVAILABILITY
        .iter()
        .filter(|r| r.since == version)
        .map(|r| r.kind)
        .collect();
    kinds.sort();
    kinds.dedup();
    kinds
}

/// An entity whose version-gated fields can be cleared by wire name.
pub trait VersionGated: Entity {
    /// Clear `field`. Returns `false` when the entity has no such gated field.
    fn clear_field(&mut self, field: &str) -> bool;

    /// Clear every field introduced at `threshold`.
    fn clear_fields_introduced_at(&mut self, threshold: SpecVersion) {
        for field in fields_introduced_at(Self::KIND, threshold) {
            let cleared = self.clear_field(field);
            debug_assert!(cleared, "{}.{field} is gated but not clearable", Self::KIND);
        }
    }
}

/// An enumeration whose value set grew across versions.
pub trait VersionedEnum: Sized {
    /// Version that introduced this value.
    fn since(&self) -> SpecVersion;

    /// Closest older value to rewrite to, or `None` to drop the owner.
    fn fallback(&self) -> Option<Self>;

    /// Rewrite `self` until it is representable at `target`.
    ///
    /// Returns `false` when no representable value exists and the owning
    /// entry has to be removed.
    fn clamp_to(&mut self, target: SpecVersion) -> bool {
        while self.since() > target {
            match self.fallback() {
                Some(older) if older.since() < self.since() => *self = older,
                _ => return false,
            }
        }
        true
    }
}
