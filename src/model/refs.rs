//! Identifier and reference capabilities.
//!
//! Entities that can be referenced implement [`HasBomRef`]. Entities with
//! fields pointing at other entities implement [`HasStringRefLink`] for
//! single references and [`HasStringListRefLink`] for reference lists. The
//! allowed target kinds of every reference field are listed by
//! [`allowed_targets`].

use super::capability::{Entity, EntityKind};
use super::walk::{
    all_components, all_contacts, all_dependencies, all_license_choices, all_organizations,
    all_services, for_each_component_mut, for_each_contact_mut, for_each_dependency_mut,
    for_each_license_choice_mut, for_each_organization_mut, for_each_service_mut,
};
use super::{
    Affects, Annotation, Assessor, Attestation, AttestationMap, Bom, Claim, Component,
    Composition, DeclarationEvidence, Dependency, EvidenceIdentity, Formula, Level, License,
    LicenseChoice, OrganizationalContact, OrganizationalEntity, Requirement, Service, SpecVersion,
    Standard, Vulnerability,
};

/// An entity carrying a document-local `bom-ref` identifier.
pub trait HasBomRef: Entity {
    fn bom_ref(&self) -> Option<&str>;
    fn bom_ref_mut(&mut self) -> &mut Option<String>;
}

macro_rules! impl_has_bom_ref {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl HasBomRef for $ty {
                fn bom_ref(&self) -> Option<&str> {
                    self.bom_ref.as_deref()
                }

                fn bom_ref_mut(&mut self) -> &mut Option<String> {
                    &mut self.bom_ref
                }
            }
        )+
    };
}

impl_has_bom_ref!(
    Component,
    Service,
    Vulnerability,
    Composition,
    Annotation,
    Formula,
    OrganizationalEntity,
    OrganizationalContact,
    License,
    LicenseChoice,
    Assessor,
    Claim,
    DeclarationEvidence,
    Standard,
    Requirement,
    Level,
);

/// An entity with single-valued reference fields.
pub trait HasStringRefLink: Entity {
    /// `(field, reference)` for each populated reference field.
    fn ref_links(&self) -> Vec<(&'static str, &str)>;
    fn ref_links_mut(&mut self) -> Vec<&mut String>;
}

/// An entity with reference-list fields.
pub trait HasStringListRefLink: Entity {
    /// `(field, references)` for each populated reference list.
    fn ref_link_lists(&self) -> Vec<(&'static str, &[String])>;
    fn ref_link_lists_mut(&mut self) -> Vec<&mut Vec<String>>;
}

impl HasStringRefLink for Dependency {
    fn ref_links(&self) -> Vec<(&'static str, &str)> {
        vec![("ref", self.dep_ref.as_str())]
    }

    fn ref_links_mut(&mut self) -> Vec<&mut String> {
        vec![&mut self.dep_ref]
    }
}

impl HasStringListRefLink for Dependency {
    fn ref_link_lists(&self) -> Vec<(&'static str, &[String])> {
        self.provides
            .as_deref()
            .map(|p| ("provides", p))
            .into_iter()
            .collect()
    }

    fn ref_link_lists_mut(&mut self) -> Vec<&mut Vec<String>> {
        self.provides.as_mut().into_iter().collect()
    }
}

impl HasStringListRefLink for Composition {
    fn ref_link_lists(&self) -> Vec<(&'static str, &[String])> {
        [
            ("assemblies", self.assemblies.as_deref()),
            ("dependencies", self.dependencies.as_deref()),
            ("vulnerabilities", self.vulnerabilities.as_deref()),
        ]
        .into_iter()
        .filter_map(|(field, refs)| refs.map(|r| (field, r)))
        .collect()
    }

    fn ref_link_lists_mut(&mut self) -> Vec<&mut Vec<String>> {
        [
            self.assemblies.as_mut(),
            self.dependencies.as_mut(),
            self.vulnerabilities.as_mut(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

impl HasStringRefLink for Affects {
    fn ref_links(&self) -> Vec<(&'static str, &str)> {
        vec![("ref", self.affects_ref.as_str())]
    }

    fn ref_links_mut(&mut self) -> Vec<&mut String> {
        vec![&mut self.affects_ref]
    }
}

impl HasStringListRefLink for Annotation {
    fn ref_link_lists(&self) -> Vec<(&'static str, &[String])> {
        vec![("subjects", self.subjects.as_slice())]
    }

    fn ref_link_lists_mut(&mut self) -> Vec<&mut Vec<String>> {
        vec![&mut self.subjects]
    }
}

impl HasStringListRefLink for EvidenceIdentity {
    fn ref_link_lists(&self) -> Vec<(&'static str, &[String])> {
        self.tools
            .as_deref()
            .map(|t| ("tools", t))
            .into_iter()
            .collect()
    }

    fn ref_link_lists_mut(&mut self) -> Vec<&mut Vec<String>> {
        self.tools.as_mut().into_iter().collect()
    }
}

impl HasStringRefLink for Attestation {
    fn ref_links(&self) -> Vec<(&'static str, &str)> {
        self.assessor
            .as_deref()
            .map(|a| ("assessor", a))
            .into_iter()
            .collect()
    }

    fn ref_links_mut(&mut self) -> Vec<&mut String> {
        self.assessor.as_mut().into_iter().collect()
    }
}

impl HasStringRefLink for AttestationMap {
    fn ref_links(&self) -> Vec<(&'static str, &str)> {
        self.requirement
            .as_deref()
            .map(|r| ("requirement", r))
            .into_iter()
            .collect()
    }

    fn ref_links_mut(&mut self) -> Vec<&mut String> {
        self.requirement.as_mut().into_iter().collect()
    }
}

impl HasStringListRefLink for AttestationMap {
    fn ref_link_lists(&self) -> Vec<(&'static str, &[String])> {
        [
            ("claims", self.claims.as_deref()),
            ("counterClaims", self.counter_claims.as_deref()),
        ]
        .into_iter()
        .filter_map(|(field, refs)| refs.map(|r| (field, r)))
        .collect()
    }

    fn ref_link_lists_mut(&mut self) -> Vec<&mut Vec<String>> {
        [self.claims.as_mut(), self.counter_claims.as_mut()]
            .into_iter()
            .flatten()
            .collect()
    }
}

impl HasStringRefLink for Claim {
    fn ref_links(&self) -> Vec<(&'static str, &str)> {
        self.target
            .as_deref()
            .map(|t| ("target", t))
            .into_iter()
            .collect()
    }

    fn ref_links_mut(&mut self) -> Vec<&mut String> {
        self.target.as_mut().into_iter().collect()
    }
}

impl HasStringListRefLink for Claim {
    fn ref_link_lists(&self) -> Vec<(&'static str, &[String])> {
        [
            ("mitigationStrategies", self.mitigation_strategies.as_deref()),
            ("evidence", self.evidence.as_deref()),
            ("counterEvidence", self.counter_evidence.as_deref()),
        ]
        .into_iter()
        .filter_map(|(field, refs)| refs.map(|r| (field, r)))
        .collect()
    }

    fn ref_link_lists_mut(&mut self) -> Vec<&mut Vec<String>> {
        [
            self.mitigation_strategies.as_mut(),
            self.evidence.as_mut(),
            self.counter_evidence.as_mut(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

impl HasStringRefLink for Requirement {
    fn ref_links(&self) -> Vec<(&'static str, &str)> {
        self.parent
            .as_deref()
            .map(|p| ("parent", p))
            .into_iter()
            .collect()
    }

    fn ref_links_mut(&mut self) -> Vec<&mut String> {
        self.parent.as_mut().into_iter().collect()
    }
}

impl HasStringListRefLink for Level {
    fn ref_link_lists(&self) -> Vec<(&'static str, &[String])> {
        self.requirements
            .as_deref()
            .map(|r| ("requirements", r))
            .into_iter()
            .collect()
    }

    fn ref_link_lists_mut(&mut self) -> Vec<&mut Vec<String>> {
        self.requirements.as_mut().into_iter().collect()
    }
}

// ============================================================================
// Allowed targets
// ============================================================================

use EntityKind as K;

const COMPONENT: &[EntityKind] = &[K::Component];
const COMPONENT_OR_SERVICE: &[EntityKind] = &[K::Component, K::Service];
const VULNERABILITY: &[EntityKind] = &[K::Vulnerability];
const REFERENCEABLE: &[EntityKind] = &[
    K::Component,
    K::Service,
    K::Vulnerability,
    K::Composition,
    K::Annotation,
    K::Formula,
    K::OrganizationalEntity,
    K::OrganizationalContact,
    K::License,
    K::LicenseChoice,
    K::Assessor,
    K::Claim,
    K::DeclarationEvidence,
    K::Standard,
    K::Requirement,
    K::Level,
];
const CLAIM_TARGET: &[EntityKind] = &[
    K::Component,
    K::Service,
    K::OrganizationalEntity,
    K::OrganizationalContact,
];

/// Entity kinds a reference in `kind.field` may resolve to at `version`.
///
/// Unknown fields allow nothing.
#[must_use]
pub fn allowed_targets(kind: EntityKind, field: &str, version: SpecVersion) -> &'static [EntityKind] {
    match (kind, field) {
        (K::Dependency, "ref" | "dependsOn") if version < SpecVersion::V1_5 => COMPONENT,
        (K::Dependency, "ref" | "dependsOn" | "provides") => COMPONENT_OR_SERVICE,
        (K::Composition, "assemblies" | "dependencies") => COMPONENT_OR_SERVICE,
        (K::Composition, "vulnerabilities") => VULNERABILITY,
        (K::Affects, "ref") => COMPONENT_OR_SERVICE,
        (K::EvidenceIdentity, "tools") => COMPONENT_OR_SERVICE,
        (K::Annotation, "subjects") => REFERENCEABLE,
        (K::Attestation, "assessor") => &[K::Assessor],
        (K::AttestationMap, "requirement") => &[K::Requirement],
        (K::AttestationMap, "claims" | "counterClaims") => &[K::Claim],
        (K::Claim, "target") => CLAIM_TARGET,
        (K::Claim, "evidence" | "counterEvidence" | "mitigationStrategies") => {
            &[K::DeclarationEvidence]
        }
        (K::Requirement, "parent") | (K::Level, "requirements") => &[K::Requirement],
        _ => &[],
    }
}

// ============================================================================
// Document-wide identifier and reference sites
// ============================================================================

/// One reference in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefLinkSite<'a> {
    pub source: EntityKind,
    /// Identifier of the entity holding the reference, when it has one.
    pub source_ref: Option<&'a str>,
    pub field: &'static str,
    pub reference: &'a str,
    /// Identifies the reference list holding this site (sites of one list
    /// share it). `None` for single-valued fields.
    pub list: Option<usize>,
}

fn single_sites<'a, T: HasStringRefLink>(
    out: &mut Vec<RefLinkSite<'a>>,
    entity: &'a T,
    source_ref: Option<&'a str>,
) {
    for (field, reference) in entity.ref_links() {
        out.push(RefLinkSite {
            source: T::KIND,
            source_ref,
            field,
            reference,
            list: None,
        });
    }
}

fn list_sites<'a, T: HasStringListRefLink>(
    out: &mut Vec<RefLinkSite<'a>>,
    entity: &'a T,
    source_ref: Option<&'a str>,
) {
    for (field, references) in entity.ref_link_lists() {
        let list = out.len();
        for reference in references {
            out.push(RefLinkSite {
                source: T::KIND,
                source_ref,
                field,
                reference,
                list: Some(list),
            });
        }
    }
}

/// Every reference in the document, in a stable order.
#[must_use]
pub fn ref_link_sites(bom: &Bom) -> Vec<RefLinkSite<'_>> {
    let mut out = Vec::new();
    for dep in all_dependencies(bom) {
        single_sites(&mut out, dep, None);
        list_sites(&mut out, dep, None);
    }
    for composition in bom.compositions.iter().flatten() {
        list_sites(&mut out, composition, composition.bom_ref());
    }
    for vuln in bom.vulnerabilities.iter().flatten() {
        for affects in vuln.affects.iter().flatten() {
            single_sites(&mut out, affects, vuln.bom_ref());
        }
    }
    for annotation in bom.annotations.iter().flatten() {
        list_sites(&mut out, annotation, annotation.bom_ref());
    }
    for component in all_components(bom) {
        let identities = component
            .evidence
            .as_ref()
            .and_then(|e| e.identity.as_ref());
        for identity in identities.into_iter().flat_map(|ids| ids.items.iter()) {
            list_sites(&mut out, identity, component.bom_ref());
        }
    }
    if let Some(decl) = &bom.declarations {
        for attestation in decl.attestations.iter().flatten() {
            single_sites(&mut out, attestation, None);
            for map in attestation.map.iter().flatten() {
                single_sites(&mut out, map, None);
                list_sites(&mut out, map, None);
            }
        }
        for claim in decl.claims.iter().flatten() {
            single_sites(&mut out, claim, claim.bom_ref());
            list_sites(&mut out, claim, claim.bom_ref());
        }
    }
    if let Some(defs) = &bom.definitions {
        for standard in defs.standards.iter().flatten() {
            for requirement in standard.requirements.iter().flatten() {
                single_sites(&mut out, requirement, requirement.bom_ref());
            }
            for level in standard.levels.iter().flatten() {
                list_sites(&mut out, level, level.bom_ref());
            }
        }
    }
    out
}

/// Every reference string in the document, mutably.
pub fn for_each_ref_link_mut(bom: &mut Bom, mut f: impl FnMut(&mut String)) {
    fn apply<T: HasStringListRefLink>(entity: &mut T, f: &mut impl FnMut(&mut String)) {
        for list in entity.ref_link_lists_mut() {
            list.iter_mut().for_each(&mut *f);
        }
    }

    for_each_dependency_mut(bom, |dep| {
        dep.ref_links_mut().into_iter().for_each(&mut f);
        apply(dep, &mut f);
    });
    for composition in bom.compositions.iter_mut().flatten() {
        apply(composition, &mut f);
    }
    for vuln in bom.vulnerabilities.iter_mut().flatten() {
        for affects in vuln.affects.iter_mut().flatten() {
            affects.ref_links_mut().into_iter().for_each(&mut f);
        }
    }
    for annotation in bom.annotations.iter_mut().flatten() {
        apply(annotation, &mut f);
    }
    for_each_component_mut(bom, |component| {
        let identities = component
            .evidence
            .as_mut()
            .and_then(|e| e.identity.as_mut());
        for identity in identities.into_iter().flat_map(|ids| ids.items.iter_mut()) {
            apply(identity, &mut f);
        }
    });
    if let Some(decl) = bom.declarations.as_mut() {
        for attestation in decl.attestations.iter_mut().flatten() {
            attestation.ref_links_mut().into_iter().for_each(&mut f);
            for map in attestation.map.iter_mut().flatten() {
                map.ref_links_mut().into_iter().for_each(&mut f);
                apply(map, &mut f);
            }
        }
        for claim in decl.claims.iter_mut().flatten() {
            claim.ref_links_mut().into_iter().for_each(&mut f);
            apply(claim, &mut f);
        }
    }
    if let Some(defs) = bom.definitions.as_mut() {
        for standard in defs.standards.iter_mut().flatten() {
            for requirement in standard.requirements.iter_mut().flatten() {
                requirement.ref_links_mut().into_iter().for_each(&mut f);
            }
            for level in standard.levels.iter_mut().flatten() {
                apply(level, &mut f);
            }
        }
    }
}

/// Every populated `bom-ref` in the document with the kind of its owner.
#[must_use]
pub fn bom_ref_sites(bom: &Bom) -> Vec<(EntityKind, &str)> {
    fn push<'a, T: HasBomRef>(out: &mut Vec<(EntityKind, &'a str)>, entity: &'a T) {
        if let Some(r) = entity.bom_ref() {
            out.push((T::KIND, r));
        }
    }

    let mut out = Vec::new();
    for c in all_components(bom) {
        push(&mut out, c);
    }
    for s in all_services(bom) {
        push(&mut out, s);
    }
    for v in bom.vulnerabilities.iter().flatten() {
        push(&mut out, v);
    }
    for c in bom.compositions.iter().flatten() {
        push(&mut out, c);
    }
    for a in bom.annotations.iter().flatten() {
        push(&mut out, a);
    }
    for f in bom.formulation.iter().flatten() {
        push(&mut out, f);
    }
    for o in all_organizations(bom) {
        push(&mut out, o);
    }
    for c in all_contacts(bom) {
        push(&mut out, c);
    }
    for choice in all_license_choices(bom) {
        push(&mut out, choice);
        if let Some(license) = &choice.license {
            push(&mut out, license);
        }
    }
    if let Some(decl) = &bom.declarations {
        for a in decl.assessors.iter().flatten() {
            push(&mut out, a);
        }
        for c in decl.claims.iter().flatten() {
            push(&mut out, c);
        }
        for e in decl.evidence.iter().flatten() {
            push(&mut out, e);
        }
    }
    if let Some(defs) = &bom.definitions {
        for s in defs.standards.iter().flatten() {
            push(&mut out, s);
            for r in s.requirements.iter().flatten() {
                push(&mut out, r);
            }
            for l in s.levels.iter().flatten() {
                push(&mut out, l);
            }
        }
    }
    out
}

/// Every `bom-ref` slot in the document, populated or not, mutably.
pub fn for_each_bom_ref_mut(bom: &mut Bom, mut f: impl FnMut(&mut Option<String>)) {
    for_each_component_mut(bom, |c| f(c.bom_ref_mut()));
    for_each_service_mut(bom, |s| f(s.bom_ref_mut()));
    for v in bom.vulnerabilities.iter_mut().flatten() {
        f(v.bom_ref_mut());
    }
    for c in bom.compositions.iter_mut().flatten() {
        f(c.bom_ref_mut());
    }
    for a in bom.annotations.iter_mut().flatten() {
        f(a.bom_ref_mut());
    }
    for formula in bom.formulation.iter_mut().flatten() {
        f(formula.bom_ref_mut());
    }
    for_each_organization_mut(bom, |o| f(o.bom_ref_mut()));
    for_each_contact_mut(bom, |c| f(c.bom_ref_mut()));
    for_each_license_choice_mut(bom, |choice| {
        f(choice.bom_ref_mut());
        if let Some(license) = choice.license.as_mut() {
            f(license.bom_ref_mut());
        }
    });
    if let Some(decl) = bom.declarations.as_mut() {
        for a in decl.assessors.iter_mut().flatten() {
            f(a.bom_ref_mut());
        }
        for c in decl.claims.iter_mut().flatten() {
            f(c.bom_ref_mut());
        }
        for e in decl.evidence.iter_mut().flatten() {
            f(e.bom_ref_mut());
        }
    }
    if let Some(defs) = bom.definitions.as_mut() {
        for s in defs.standards.iter_mut().flatten() {
            f(s.bom_ref_mut());
            for r in s.requirements.iter_mut().flatten() {
                f(r.bom_ref_mut());
            }
            for l in s.levels.iter_mut().flatten() {
                f(l.bom_ref_mut());
            }
        }
    }
}
