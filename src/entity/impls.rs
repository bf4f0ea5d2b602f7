//! Per-type equivalence and field reconciliation.

use super::lists::{fill, merge_field, require_same, union_values};
use super::{BomEntity, ListMergeStrategy, Mergeable};
use crate::error::Result;
use crate::model::{
    Affects, Annotation, Assessor, Attestation, AttestationMap, Bom, Claim, Component,
    Composition, DataFlow, DeclarationEvidence, Declarations, Definitions, Dependency, Entity,
    Evidence, EvidenceIdentity, ExternalReference, Formula, Hash, Level, License, LicenseChoice,
    Metadata, OrganizationalContact, OrganizationalEntity, Pedigree, Property, Requirement,
    Service, Standard, Tool, ToolChoices, Vulnerability, VulnerabilityAnalysis,
};
use serde::Serialize;

macro_rules! impl_bom_entity {
    ($($ty:ty),+ $(,)?) => {
        $(impl BomEntity for $ty {})+
    };
}

impl_bom_entity!(
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
);

/// The wire form of a dependency only names its direct children, so the
/// canonical form lists the whole nested graph in pre-order instead.
impl BomEntity for Dependency {
    fn canonical_bytes(&self) -> Vec<u8> {
        #[derive(Serialize)]
        struct Node<'a> {
            depth: usize,
            #[serde(rename = "ref")]
            dep_ref: &'a str,
            #[serde(skip_serializing_if = "Option::is_none")]
            provides: Option<&'a Vec<String>>,
            leaf: bool,
        }

        let mut nodes = Vec::new();
        let mut stack = vec![(0, self)];
        while let Some((depth, dep)) = stack.pop() {
            nodes.push(Node {
                depth,
                dep_ref: &dep.dep_ref,
                provides: dep.provides.as_ref(),
                leaf: dep.dependencies.is_none(),
            });
            for child in dep.dependencies.iter().flatten().rev() {
                stack.push((depth + 1, child));
            }
        }
        serde_json::to_vec(&nodes).unwrap_or_default()
    }
}

fn key(parts: &[Option<&str>]) -> String {
    parts
        .iter()
        .map(|p| p.unwrap_or_default())
        .collect::<Vec<_>>()
        .join("\u{1f}")
}

// ============================================================================
// Components and services
// ============================================================================

/// Same bom-ref when both carry one, otherwise same coordinates.
fn same_identity(
    refs: (Option<&str>, Option<&str>),
    coords: ([Option<&str>; 3], [Option<&str>; 3]),
) -> bool {
    match refs {
        (Some(a), Some(b)) => a == b,
        _ => coords.0 == coords.1,
    }
}

impl Mergeable for Component {
    const NESTED_SLOTS: usize = 4;

    fn equivalent(&self, other: &Self) -> bool {
        let purl_agrees = match (self.purl.as_deref(), other.purl.as_deref()) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        };
        same_identity(
            (self.bom_ref.as_deref(), other.bom_ref.as_deref()),
            (
                [Some(self.name.as_str()), self.group.as_deref(), self.version.as_deref()],
                [Some(other.name.as_str()), other.group.as_deref(), other.version.as_deref()],
            ),
        ) && purl_agrees
    }

    fn merge_fields(&mut self, other: Self, strategy: ListMergeStrategy) -> Result<()> {
        const K: crate::model::EntityKind = Component::KIND;
        require_same(K, "type", &self.component_type, &other.component_type)?;
        require_same(K, "name", &self.name, &other.name)?;
        fill(K, "bom-ref", &mut self.bom_ref, other.bom_ref)?;
        fill(K, "mime-type", &mut self.mime_type, other.mime_type)?;
        fill(K, "supplier", &mut self.supplier, other.supplier)?;
        fill(K, "manufacturer", &mut self.manufacturer, other.manufacturer)?;
        merge_field(&mut self.authors, other.authors, strategy)?;
        fill(K, "author", &mut self.author, other.author)?;
        fill(K, "publisher", &mut self.publisher, other.publisher)?;
        fill(K, "group", &mut self.group, other.group)?;
        fill(K, "version", &mut self.version, other.version)?;
        fill(K, "description", &mut self.description, other.description)?;
        fill(K, "scope", &mut self.scope, other.scope)?;
        merge_field(&mut self.hashes, other.hashes, strategy)?;
        merge_field(&mut self.licenses, other.licenses, strategy)?;
        fill(K, "copyright", &mut self.copyright, other.copyright)?;
        fill(K, "cpe", &mut self.cpe, other.cpe)?;
        fill(K, "purl", &mut self.purl, other.purl)?;
        union_values(&mut self.omnibor_id, other.omnibor_id);
        union_values(&mut self.swhid, other.swhid);
        fill(K, "swid", &mut self.swid, other.swid)?;
        fill(K, "modified", &mut self.modified, other.modified)?;
        merge_pedigree(&mut self.pedigree, other.pedigree)?;
        merge_field(&mut self.external_references, other.external_references, strategy)?;
        merge_field(&mut self.properties, other.properties, strategy)?;
        fill(K, "evidence", &mut self.evidence, other.evidence)?;
        fill(K, "releaseNotes", &mut self.release_notes, other.release_notes)?;
        fill(K, "modelCard", &mut self.model_card, other.model_card)?;
        union_values(&mut self.data, other.data);
        fill(K, "cryptoProperties", &mut self.crypto_properties, other.crypto_properties)?;
        union_values(&mut self.tags, other.tags);
        // `components` and the pedigree component lists are merged by the caller.
        Ok(())
    }

    fn sort_key(&self) -> String {
        key(&[
            self.bom_ref.as_deref(),
            self.group.as_deref(),
            Some(self.name.as_str()),
            self.version.as_deref(),
        ])
    }

    fn nested_slot_mut(&mut self, slot: usize) -> Option<&mut Option<Vec<Self>>> {
        match slot {
            0 => Some(&mut self.components),
            1 => self.pedigree.as_mut().map(|p| &mut p.ancestors),
            2 => self.pedigree.as_mut().map(|p| &mut p.descendants),
            3 => self.pedigree.as_mut().map(|p| &mut p.variants),
            _ => None,
        }
    }
}

/// Pedigree scalars and value lists. The component lists were detached.
fn merge_pedigree(mine: &mut Option<Pedigree>, theirs: Option<Pedigree>) -> Result<()> {
    let Some(theirs) = theirs else {
        return Ok(());
    };
    let Some(pedigree) = mine.as_mut() else {
        *mine = Some(theirs);
        return Ok(());
    };
    union_values(&mut pedigree.commits, theirs.commits);
    union_values(&mut pedigree.patches, theirs.patches);
    fill(Pedigree::KIND, "notes", &mut pedigree.notes, theirs.notes)?;
    for (slot, list) in [
        (&mut pedigree.ancestors, theirs.ancestors),
        (&mut pedigree.descendants, theirs.descendants),
        (&mut pedigree.variants, theirs.variants),
    ] {
        if slot.as_ref().map_or(true, Vec::is_empty) && list.is_some() {
            *slot = list;
        }
    }
    Ok(())
}

impl Mergeable for Service {
    const NESTED_SLOTS: usize = 1;

    fn equivalent(&self, other: &Self) -> bool {
        same_identity(
            (self.bom_ref.as_deref(), other.bom_ref.as_deref()),
            (
                [Some(self.name.as_str()), self.group.as_deref(), self.version.as_deref()],
                [Some(other.name.as_str()), other.group.as_deref(), other.version.as_deref()],
            ),
        )
    }

    fn merge_fields(&mut self, other: Self, strategy: ListMergeStrategy) -> Result<()> {
        const K: crate::model::EntityKind = Service::KIND;
        require_same(K, "name", &self.name, &other.name)?;
        fill(K, "bom-ref", &mut self.bom_ref, other.bom_ref)?;
        fill(K, "provider", &mut self.provider, other.provider)?;
        fill(K, "group", &mut self.group, other.group)?;
        fill(K, "version", &mut self.version, other.version)?;
        fill(K, "description", &mut self.description, other.description)?;
        union_values(&mut self.endpoints, other.endpoints);
        fill(K, "authenticated", &mut self.authenticated, other.authenticated)?;
        fill(K, "x-trust-boundary", &mut self.x_trust_boundary, other.x_trust_boundary)?;
        fill(K, "trustZone", &mut self.trust_zone, other.trust_zone)?;
        match (self.data.as_mut(), other.data) {
            (Some(mine), Some(theirs)) => union_flows(&mut mine.flows, theirs.flows),
            (None, theirs) => self.data = theirs,
            (Some(_), None) => {}
        }
        merge_field(&mut self.licenses, other.licenses, strategy)?;
        merge_field(&mut self.external_references, other.external_references, strategy)?;
        merge_field(&mut self.properties, other.properties, strategy)?;
        fill(K, "releaseNotes", &mut self.release_notes, other.release_notes)?;
        union_values(&mut self.tags, other.tags);
        Ok(())
    }

    fn sort_key(&self) -> String {
        key(&[
            self.bom_ref.as_deref(),
            self.group.as_deref(),
            Some(self.name.as_str()),
            self.version.as_deref(),
        ])
    }

    fn nested_slot_mut(&mut self, slot: usize) -> Option<&mut Option<Vec<Self>>> {
        (slot == 0).then_some(&mut self.services)
    }
}

fn union_flows(mine: &mut Vec<DataFlow>, theirs: Vec<DataFlow>) {
    for flow in theirs {
        if !mine.contains(&flow) {
            mine.push(flow);
        }
    }
}

// ============================================================================
// Graph and tooling
// ============================================================================

impl Mergeable for Dependency {
    const NESTED_SLOTS: usize = 1;

    fn equivalent(&self, other: &Self) -> bool {
        self.dep_ref == other.dep_ref
    }

    fn merge_fields(&mut self, other: Self, _strategy: ListMergeStrategy) -> Result<()> {
        union_values(&mut self.provides, other.provides);
        Ok(())
    }

    fn sort_key(&self) -> String {
        self.dep_ref.clone()
    }

    fn nested_slot_mut(&mut self, slot: usize) -> Option<&mut Option<Vec<Self>>> {
        (slot == 0).then_some(&mut self.dependencies)
    }
}

impl Mergeable for Tool {
    fn equivalent(&self, other: &Self) -> bool {
        self.vendor == other.vendor && self.name == other.name && self.version == other.version
    }

    fn merge_fields(&mut self, other: Self, strategy: ListMergeStrategy) -> Result<()> {
        merge_field(&mut self.hashes, other.hashes, strategy)?;
        merge_field(&mut self.external_references, other.external_references, strategy)
    }

    fn sort_key(&self) -> String {
        key(&[
            self.vendor.as_deref(),
            self.name.as_deref(),
            self.version.as_deref(),
        ])
    }
}

/// Merge two tool records list by list.
pub(crate) fn merge_tool_choices(
    mine: &mut Option<ToolChoices>,
    theirs: Option<ToolChoices>,
    strategy: ListMergeStrategy,
) -> Result<()> {
    let Some(theirs) = theirs else {
        return Ok(());
    };
    let Some(tools) = mine.as_mut() else {
        *mine = Some(theirs);
        return Ok(());
    };
    merge_field(&mut tools.tools, theirs.tools, strategy)?;
    merge_field(&mut tools.components, theirs.components, strategy)?;
    merge_field(&mut tools.services, theirs.services, strategy)?;
    Ok(())
}

impl Mergeable for Hash {
    fn equivalent(&self, other: &Self) -> bool {
        self.alg == other.alg
    }

    fn merge_fields(&mut self, other: Self, _strategy: ListMergeStrategy) -> Result<()> {
        if self.content.is_empty() {
            self.content = other.content;
            return Ok(());
        }
        if other.content.is_empty() {
            return Ok(());
        }
        require_same(Self::KIND, "content", &self.content, &other.content)
    }

    fn sort_key(&self) -> String {
        format!("{}\u{1f}{}", self.alg, self.content)
    }
}

impl Mergeable for ExternalReference {
    fn sort_key(&self) -> String {
        format!("{}\u{1f}{}", self.url, self.reference_type)
    }
}

impl Mergeable for Property {
    fn sort_key(&self) -> String {
        key(&[Some(self.name.as_str()), self.value.as_deref()])
    }
}

// ============================================================================
// Vulnerabilities
// ============================================================================

impl Mergeable for Vulnerability {
    fn equivalent(&self, other: &Self) -> bool {
        match (self.bom_ref.as_deref(), other.bom_ref.as_deref()) {
            (Some(a), Some(b)) => a == b,
            _ => {
                self.id.is_some()
                    && self.id == other.id
                    && self.source.as_ref().and_then(|s| s.name.as_deref())
                        == other.source.as_ref().and_then(|s| s.name.as_deref())
            }
        }
    }

    fn merge_fields(&mut self, other: Self, strategy: ListMergeStrategy) -> Result<()> {
        const K: crate::model::EntityKind = Vulnerability::KIND;
        fill(K, "bom-ref", &mut self.bom_ref, other.bom_ref)?;
        fill(K, "id", &mut self.id, other.id)?;
        fill(K, "source", &mut self.source, other.source)?;
        union_values(&mut self.references, other.references);
        union_values(&mut self.ratings, other.ratings);
        union_values(&mut self.cwes, other.cwes);
        fill(K, "description", &mut self.description, other.description)?;
        fill(K, "detail", &mut self.detail, other.detail)?;
        fill(K, "recommendation", &mut self.recommendation, other.recommendation)?;
        fill(K, "workaround", &mut self.workaround, other.workaround)?;
        fill(K, "proofOfConcept", &mut self.proof_of_concept, other.proof_of_concept)?;
        union_values(&mut self.advisories, other.advisories);
        fill(K, "created", &mut self.created, other.created)?;
        fill(K, "published", &mut self.published, other.published)?;
        fill(K, "updated", &mut self.updated, other.updated)?;
        fill(K, "rejected", &mut self.rejected, other.rejected)?;
        fill(K, "credits", &mut self.credits, other.credits)?;
        merge_tool_choices(&mut self.tools, other.tools, strategy)?;
        fill(K, "analysis", &mut self.analysis, other.analysis)?;
        merge_field(&mut self.affects, other.affects, strategy)?;
        merge_field(&mut self.properties, other.properties, strategy)?;
        Ok(())
    }

    fn sort_key(&self) -> String {
        key(&[self.bom_ref.as_deref(), self.id.as_deref()])
    }
}

impl Mergeable for Affects {
    fn equivalent(&self, other: &Self) -> bool {
        self.affects_ref == other.affects_ref
    }

    fn merge_fields(&mut self, other: Self, _strategy: ListMergeStrategy) -> Result<()> {
        union_values(&mut self.versions, other.versions);
        Ok(())
    }

    fn sort_key(&self) -> String {
        self.affects_ref.clone()
    }
}

// Equality-only entities.
impl Mergeable for Composition {}
impl Mergeable for LicenseChoice {}
impl Mergeable for OrganizationalEntity {}
impl Mergeable for OrganizationalContact {}
impl Mergeable for Annotation {}
impl Mergeable for Formula {}
impl Mergeable for Assessor {}
impl Mergeable for Attestation {}
impl Mergeable for Claim {}
impl Mergeable for DeclarationEvidence {}
impl Mergeable for Standard {}
