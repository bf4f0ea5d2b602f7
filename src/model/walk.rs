//! Iterative traversal of the document tree.
//!
//! Component, service and dependency trees can be nested arbitrarily deep
//! and may come from untrusted input, so every walker here keeps its own
//! work stack on the heap instead of recursing. Visit order is pre-order in
//! document order.

use super::{
    Bom, Component, Dependency, ExternalReference, LicenseChoice, Metadata,
    OrganizationalContact, OrganizationalEntity, Pedigree, Service, Tool, ToolChoices, Vulnerability,
};

// ============================================================================
// Generic tree walks
// ============================================================================

fn walk_tree<'a, T>(
    roots: Vec<&'a T>,
    children: impl Fn(&'a T) -> Vec<&'a T>,
    mut f: impl FnMut(&'a T),
) {
    let mut stack = roots;
    stack.reverse();
    while let Some(node) = stack.pop() {
        f(node);
        let mut kids = children(node);
        kids.reverse();
        stack.extend(kids);
    }
}

fn walk_tree_mut<'a, T>(
    roots: Vec<&'a mut T>,
    children: impl Fn(&'a mut T) -> Vec<&'a mut T>,
    mut f: impl FnMut(&mut T),
) {
    let mut stack = roots;
    stack.reverse();
    while let Some(node) = stack.pop() {
        f(node);
        let mut kids = children(node);
        kids.reverse();
        stack.extend(kids);
    }
}

fn component_children(c: &Component) -> Vec<&Component> {
    let mut kids: Vec<&Component> = c.components.iter().flatten().collect();
    if let Some(p) = &c.pedigree {
        kids.extend(p.ancestors.iter().flatten());
        kids.extend(p.descendants.iter().flatten());
        kids.extend(p.variants.iter().flatten());
    }
    kids
}

fn component_children_mut(c: &mut Component) -> Vec<&mut Component> {
    let Component {
        components,
        pedigree,
        ..
    } = c;
    let mut kids: Vec<&mut Component> = components.iter_mut().flatten().collect();
    if let Some(Pedigree {
        ancestors,
        descendants,
        variants,
        ..
    }) = pedigree
    {
        kids.extend(ancestors.iter_mut().flatten());
        kids.extend(descendants.iter_mut().flatten());
        kids.extend(variants.iter_mut().flatten());
    }
    kids
}

fn service_children(s: &Service) -> Vec<&Service> {
    s.services.iter().flatten().collect()
}

fn service_children_mut(s: &mut Service) -> Vec<&mut Service> {
    s.services.iter_mut().flatten().collect()
}

fn dependency_children(d: &Dependency) -> Vec<&Dependency> {
    d.dependencies.iter().flatten().collect()
}

fn dependency_children_mut(d: &mut Dependency) -> Vec<&mut Dependency> {
    d.dependencies.iter_mut().flatten().collect()
}

// ============================================================================
// Roots
// ============================================================================

/// Top-level component slots: the metadata component, tool components,
/// the component list, annotators, formulas and declaration targets.
fn component_roots(bom: &Bom) -> Vec<&Component> {
    let mut roots = Vec::new();
    if let Some(meta) = &bom.metadata {
        roots.extend(meta.component.as_ref());
        if let Some(tools) = &meta.tools {
            roots.extend(tools.components.iter().flatten());
        }
    }
    roots.extend(bom.components.iter().flatten());
    for vuln in bom.vulnerabilities.iter().flatten() {
        if let Some(tools) = &vuln.tools {
            roots.extend(tools.components.iter().flatten());
        }
    }
    for annotation in bom.annotations.iter().flatten() {
        roots.extend(annotation.annotator.component.as_ref());
    }
    for formula in bom.formulation.iter().flatten() {
        roots.extend(formula.components.iter().flatten());
    }
    if let Some(targets) = bom.declarations.as_ref().and_then(|d| d.targets.as_ref()) {
        roots.extend(targets.components.iter().flatten());
    }
    roots
}

fn component_roots_mut(bom: &mut Bom) -> Vec<&mut Component> {
    let Bom {
        metadata,
        components,
        vulnerabilities,
        annotations,
        formulation,
        declarations,
        ..
    } = bom;
    let mut roots = Vec::new();
    if let Some(Metadata {
        component, tools, ..
    }) = metadata
    {
        roots.extend(component.as_mut());
        if let Some(tools) = tools {
            roots.extend(tools.components.iter_mut().flatten());
        }
    }
    roots.extend(components.iter_mut().flatten());
    for vuln in vulnerabilities.iter_mut().flatten() {
        if let Some(tools) = &mut vuln.tools {
            roots.extend(tools.components.iter_mut().flatten());
        }
    }
    for annotation in annotations.iter_mut().flatten() {
        roots.extend(annotation.annotator.component.as_mut());
    }
    for formula in formulation.iter_mut().flatten() {
        roots.extend(formula.components.iter_mut().flatten());
    }
    if let Some(targets) = declarations.as_mut().and_then(|d| d.targets.as_mut()) {
        roots.extend(targets.components.iter_mut().flatten());
    }
    roots
}

fn service_roots(bom: &Bom) -> Vec<&Service> {
    let mut roots = Vec::new();
    if let Some(tools) = bom.metadata.as_ref().and_then(|m| m.tools.as_ref()) {
        roots.extend(tools.services.iter().flatten());
    }
    roots.extend(bom.services.iter().flatten());
    for vuln in bom.vulnerabilities.iter().flatten() {
        if let Some(tools) = &vuln.tools {
            roots.extend(tools.services.iter().flatten());
        }
    }
    for annotation in bom.annotations.iter().flatten() {
        roots.extend(annotation.annotator.service.as_ref());
    }
    for formula in bom.formulation.iter().flatten() {
        roots.extend(formula.services.iter().flatten());
    }
    if let Some(targets) = bom.declarations.as_ref().and_then(|d| d.targets.as_ref()) {
        roots.extend(targets.services.iter().flatten());
    }
    roots
}

fn service_roots_mut(bom: &mut Bom) -> Vec<&mut Service> {
    let Bom {
        metadata,
        services,
        vulnerabilities,
        annotations,
        formulation,
        declarations,
        ..
    } = bom;
    let mut roots = Vec::new();
    if let Some(tools) = metadata.as_mut().and_then(|m| m.tools.as_mut()) {
        roots.extend(tools.services.iter_mut().flatten());
    }
    roots.extend(services.iter_mut().flatten());
    for vuln in vulnerabilities.iter_mut().flatten() {
        if let Some(tools) = &mut vuln.tools {
            roots.extend(tools.services.iter_mut().flatten());
        }
    }
    for annotation in annotations.iter_mut().flatten() {
        roots.extend(annotation.annotator.service.as_mut());
    }
    for formula in formulation.iter_mut().flatten() {
        roots.extend(formula.services.iter_mut().flatten());
    }
    if let Some(targets) = declarations.as_mut().and_then(|d| d.targets.as_mut()) {
        roots.extend(targets.services.iter_mut().flatten());
    }
    roots
}

// ============================================================================
// Public walkers
// ============================================================================

/// Every component in the document, including nested and pedigree components.
#[must_use]
pub fn all_components(bom: &Bom) -> Vec<&Component> {
    let mut out = Vec::new();
    walk_tree(component_roots(bom), component_children, |c| out.push(c));
    out
}

pub fn for_each_component_mut(bom: &mut Bom, f: impl FnMut(&mut Component)) {
    walk_tree_mut(component_roots_mut(bom), component_children_mut, f);
}

/// Every service in the document, including nested services.
#[must_use]
pub fn all_services(bom: &Bom) -> Vec<&Service> {
    let mut out = Vec::new();
    walk_tree(service_roots(bom), service_children, |s| out.push(s));
    out
}

pub fn for_each_service_mut(bom: &mut Bom, f: impl FnMut(&mut Service)) {
    walk_tree_mut(service_roots_mut(bom), service_children_mut, f);
}

/// Every dependency record, top-level and nested.
#[must_use]
pub fn all_dependencies(bom: &Bom) -> Vec<&Dependency> {
    let mut out = Vec::new();
    let roots = bom.dependencies.iter().flatten().collect();
    walk_tree(roots, dependency_children, |d| out.push(d));
    out
}

pub fn for_each_dependency_mut(bom: &mut Bom, f: impl FnMut(&mut Dependency)) {
    let roots = bom.dependencies.iter_mut().flatten().collect();
    walk_tree_mut(roots, dependency_children_mut, f);
}

/// Every nested dependency below `roots`, roots included.
pub fn for_each_dependency_in_mut(roots: &mut [Dependency], f: impl FnMut(&mut Dependency)) {
    walk_tree_mut(roots.iter_mut().collect(), dependency_children_mut, f);
}

/// Every nested component below `roots`, roots included.
pub fn for_each_component_in_mut(roots: &mut [Component], f: impl FnMut(&mut Component)) {
    walk_tree_mut(roots.iter_mut().collect(), component_children_mut, f);
}

/// Tool records of the metadata and of every vulnerability.
pub fn for_each_tool_choices_mut(bom: &mut Bom, mut f: impl FnMut(&mut ToolChoices)) {
    if let Some(tools) = bom.metadata.as_mut().and_then(|m| m.tools.as_mut()) {
        f(tools);
    }
    for vuln in bom.vulnerabilities.iter_mut().flatten() {
        if let Some(tools) = vuln.tools.as_mut() {
            f(tools);
        }
    }
}

/// Vulnerabilities only appear at the top level.
pub fn for_each_vulnerability_mut(bom: &mut Bom, f: impl FnMut(&mut Vulnerability)) {
    bom.vulnerabilities.iter_mut().flatten().for_each(f);
}

/// Legacy tool entries.
pub fn for_each_tool_mut(bom: &mut Bom, mut f: impl FnMut(&mut Tool)) {
    for_each_tool_choices_mut(bom, |choices| {
        for tool in choices.tools.iter_mut().flatten() {
            f(tool);
        }
    });
}

#[must_use]
pub fn all_organizations(bom: &Bom) -> Vec<&OrganizationalEntity> {
    let mut out = Vec::new();
    for c in all_components(bom) {
        out.extend(c.supplier.as_ref());
        out.extend(c.manufacturer.as_ref());
    }
    for s in all_services(bom) {
        out.extend(s.provider.as_ref());
    }
    if let Some(meta) = &bom.metadata {
        out.extend(meta.manufacture.as_ref());
        out.extend(meta.manufacturer.as_ref());
        out.extend(meta.supplier.as_ref());
    }
    for annotation in bom.annotations.iter().flatten() {
        out.extend(annotation.annotator.organization.as_ref());
    }
    if let Some(decl) = &bom.declarations {
        for assessor in decl.assessors.iter().flatten() {
            out.extend(assessor.organization.as_ref());
        }
        if let Some(targets) = &decl.targets {
            out.extend(targets.organizations.iter().flatten());
        }
    }
    out
}

pub fn for_each_organization_mut(bom: &mut Bom, mut f: impl FnMut(&mut OrganizationalEntity)) {
    for_each_component_mut(bom, |c| {
        if let Some(org) = c.supplier.as_mut() {
            f(org);
        }
        if let Some(org) = c.manufacturer.as_mut() {
            f(org);
        }
    });
    for_each_service_mut(bom, |s| {
        if let Some(org) = s.provider.as_mut() {
            f(org);
        }
    });
    if let Some(meta) = bom.metadata.as_mut() {
        for org in [
            meta.manufacture.as_mut(),
            meta.manufacturer.as_mut(),
            meta.supplier.as_mut(),
        ]
        .into_iter()
        .flatten()
        {
            f(org);
        }
    }
    for annotation in bom.annotations.iter_mut().flatten() {
        if let Some(org) = annotation.annotator.organization.as_mut() {
            f(org);
        }
    }
    if let Some(decl) = bom.declarations.as_mut() {
        for assessor in decl.assessors.iter_mut().flatten() {
            if let Some(org) = assessor.organization.as_mut() {
                f(org);
            }
        }
        if let Some(targets) = decl.targets.as_mut() {
            for org in targets.organizations.iter_mut().flatten() {
                f(org);
            }
        }
    }
}

#[must_use]
pub fn all_contacts(bom: &Bom) -> Vec<&OrganizationalContact> {
    let mut out = Vec::new();
    if let Some(meta) = &bom.metadata {
        out.extend(meta.authors.iter().flatten());
    }
    for c in all_components(bom) {
        out.extend(c.authors.iter().flatten());
    }
    for org in all_organizations(bom) {
        out.extend(org.contact.iter().flatten());
    }
    for annotation in bom.annotations.iter().flatten() {
        out.extend(annotation.annotator.individual.as_ref());
    }
    if let Some(decl) = &bom.declarations {
        for evidence in decl.evidence.iter().flatten() {
            out.extend(evidence.author.as_ref());
            out.extend(evidence.reviewer.as_ref());
        }
    }
    out
}

pub fn for_each_contact_mut(bom: &mut Bom, mut f: impl FnMut(&mut OrganizationalContact)) {
    if let Some(meta) = bom.metadata.as_mut() {
        for contact in meta.authors.iter_mut().flatten() {
            f(contact);
        }
    }
    for_each_component_mut(bom, |c| {
        for contact in c.authors.iter_mut().flatten() {
            f(contact);
        }
    });
    for_each_organization_mut(bom, |org| {
        for contact in org.contact.iter_mut().flatten() {
            f(contact);
        }
    });
    for annotation in bom.annotations.iter_mut().flatten() {
        if let Some(contact) = annotation.annotator.individual.as_mut() {
            f(contact);
        }
    }
    if let Some(decl) = bom.declarations.as_mut() {
        for evidence in decl.evidence.iter_mut().flatten() {
            if let Some(contact) = evidence.author.as_mut() {
                f(contact);
            }
            if let Some(contact) = evidence.reviewer.as_mut() {
                f(contact);
            }
        }
    }
}

#[must_use]
pub fn all_license_choices(bom: &Bom) -> Vec<&LicenseChoice> {
    let mut out = Vec::new();
    if let Some(meta) = &bom.metadata {
        out.extend(meta.licenses.iter().flatten());
    }
    for c in all_components(bom) {
        out.extend(c.licenses.iter().flatten());
        if let Some(evidence) = &c.evidence {
            out.extend(evidence.licenses.iter().flatten());
        }
    }
    for s in all_services(bom) {
        out.extend(s.licenses.iter().flatten());
    }
    out
}

pub fn for_each_license_choice_mut(bom: &mut Bom, mut f: impl FnMut(&mut LicenseChoice)) {
    if let Some(meta) = bom.metadata.as_mut() {
        for choice in meta.licenses.iter_mut().flatten() {
            f(choice);
        }
    }
    for_each_component_mut(bom, |c| {
        for choice in c.licenses.iter_mut().flatten() {
            f(choice);
        }
        if let Some(evidence) = c.evidence.as_mut() {
            for choice in evidence.licenses.iter_mut().flatten() {
                f(choice);
            }
        }
    });
    for_each_service_mut(bom, |s| {
        for choice in s.licenses.iter_mut().flatten() {
            f(choice);
        }
    });
}

pub fn for_each_external_reference_mut(bom: &mut Bom, mut f: impl FnMut(&mut ExternalReference)) {
    for reference in bom.external_references.iter_mut().flatten() {
        f(reference);
    }
    for_each_component_mut(bom, |c| {
        for reference in c.external_references.iter_mut().flatten() {
            f(reference);
        }
    });
    for_each_service_mut(bom, |s| {
        for reference in s.external_references.iter_mut().flatten() {
            f(reference);
        }
    });
    for_each_tool_mut(bom, |t| {
        for reference in t.external_references.iter_mut().flatten() {
            f(reference);
        }
    });
    if let Some(decl) = bom.declarations.as_mut() {
        for claim in decl.claims.iter_mut().flatten() {
            for reference in claim.external_references.iter_mut().flatten() {
                f(reference);
            }
        }
    }
    if let Some(defs) = bom.definitions.as_mut() {
        for standard in defs.standards.iter_mut().flatten() {
            for reference in standard.external_references.iter_mut().flatten() {
                f(reference);
            }
            for requirement in standard.requirements.iter_mut().flatten() {
                for reference in requirement.external_references.iter_mut().flatten() {
                    f(reference);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ComponentType, Vulnerability};

    fn nested_chain(depth: usize) -> Component {
        let mut node = Component::new(ComponentType::Library, format!("leaf-{depth}"));
        for i in (0..depth).rev() {
            let mut parent = Component::new(ComponentType::Library, format!("node-{i}"));
            parent.components = Some(vec![node]);
            node = parent;
        }
        node
    }

    #[test]
    fn test_visits_every_component_slot() {
        let mut bom = Bom::default();
        bom.metadata_mut().component = Some(Component::new(ComponentType::Application, "app"));
        bom.metadata_mut().tools = Some(ToolChoices::components(vec![Component::new(
            ComponentType::Application,
            "tool",
        )]));
        let mut lib = Component::new(ComponentType::Library, "lib");
        lib.pedigree = Some(Pedigree {
            ancestors: Some(vec![Component::new(ComponentType::Library, "upstream")]),
            ..Pedigree::default()
        });
        bom.components = Some(vec![lib]);
        let mut vuln = Vulnerability::new("CVE-1");
        vuln.tools = Some(ToolChoices::components(vec![Component::new(
            ComponentType::Application,
            "vuln-tool",
        )]));
        bom.vulnerabilities = Some(vec![vuln]);

        let names: Vec<&str> = all_components(&bom).iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["app", "tool", "lib", "upstream", "vuln-tool"]);
    }

    #[test]
    fn test_deep_nesting_does_not_overflow() {
        let mut bom = Bom::default();
        bom.components = Some(vec![nested_chain(50_000)]);

        assert_eq!(all_components(&bom).len(), 50_001);

        let mut visited = 0;
        for_each_component_mut(&mut bom, |c| {
            c.version = Some("1".into());
            visited += 1;
        });
        assert_eq!(visited, 50_001);

        // Tear the chain down iteratively as well.
        let mut pending = bom.components.take().unwrap_or_default();
        while let Some(mut c) = pending.pop() {
            pending.extend(c.components.take().into_iter().flatten());
        }
    }

    #[test]
    fn test_mutations_are_visible_to_children_walk() {
        let mut bom = Bom::default();
        bom.components = Some(vec![nested_chain(3)]);
        for_each_component_mut(&mut bom, |c| {
            if c.name == "node-1" {
                c.components = None;
            }
        });
        assert_eq!(all_components(&bom).len(), 2);
    }

    #[test]
    fn test_dependency_walk_includes_nested() {
        let mut bom = Bom::default();
        let mut root = Dependency::new("a");
        root.dependencies = Some(vec![Dependency::with_depends_on("b", ["c"])]);
        bom.dependencies = Some(vec![root]);

        let refs: Vec<&str> = all_dependencies(&bom)
            .iter()
            .map(|d| d.dep_ref.as_str())
            .collect();
        assert_eq!(refs, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_organization_and_contact_walks() {
        let mut bom = Bom::default();
        let mut supplier = OrganizationalEntity::named("acme");
        supplier.contact = Some(vec![OrganizationalContact {
            name: Some("ops".into()),
            ..OrganizationalContact::default()
        }]);
        let mut lib = Component::new(ComponentType::Library, "lib");
        lib.supplier = Some(supplier);
        bom.components = Some(vec![lib]);
        bom.metadata_mut().supplier = Some(OrganizationalEntity::named("vendor"));

        assert_eq!(all_organizations(&bom).len(), 2);
        assert_eq!(all_contacts(&bom).len(), 1);

        let mut count = 0;
        for_each_organization_mut(&mut bom, |_| count += 1);
        assert_eq!(count, 2);
    }
}
