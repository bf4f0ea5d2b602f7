//! Passes run over a merge result before it is returned.

use crate::entity::{merge_with, BomEntity, ListMergeStrategy, Normalize};
use crate::error::Result;
use crate::model::{Bom, Component, Declarations, Definitions, Metadata, Targets};

fn describes_same(candidate: &Component, subject: &Component) -> bool {
    let same_ref = candidate.bom_ref.is_some() && candidate.bom_ref == subject.bom_ref;
    same_ref || candidate.entity_eq(subject)
}

/// Fold components that repeat the metadata component into it.
///
/// A top-level component equal to `metadata.component`, or sharing its
/// bom-ref, is merged into the metadata component and removed from
/// `components`.
pub fn cleanup_metadata_component(bom: &mut Bom, strategy: ListMergeStrategy) -> Result<()> {
    let Bom {
        metadata,
        components,
        ..
    } = bom;
    let Some(subject) = metadata.as_mut().and_then(|m| m.component.as_mut()) else {
        return Ok(());
    };
    let Some(list) = components.as_mut() else {
        return Ok(());
    };

    let mut index = 0;
    while index < list.len() {
        if describes_same(&list[index], subject) {
            let outcome = merge_with(subject, Some(&list[index]), strategy)?;
            if outcome.is_contained() {
                let evicted = list.remove(index);
                tracing::trace!(name = %evicted.name, "folded into metadata component");
                continue;
            }
        }
        index += 1;
    }
    Ok(())
}

fn prune<T>(list: &mut Option<Vec<T>>) {
    if list.as_ref().is_some_and(Vec::is_empty) {
        *list = None;
    }
}

/// Replace every empty collection with `None`, then drop `metadata`,
/// `declarations` and `definitions` when nothing is left in them.
pub fn cleanup_empty_lists(bom: &mut Bom) {
    prune(&mut bom.components);
    prune(&mut bom.services);
    prune(&mut bom.external_references);
    prune(&mut bom.dependencies);
    prune(&mut bom.compositions);
    prune(&mut bom.properties);
    prune(&mut bom.vulnerabilities);
    prune(&mut bom.annotations);
    prune(&mut bom.formulation);

    if let Some(metadata) = bom.metadata.as_mut() {
        if let Some(tools) = metadata.tools.as_mut() {
            prune(&mut tools.tools);
            prune(&mut tools.components);
            prune(&mut tools.services);
        }
        if metadata.tools.as_ref().is_some_and(|t| t.is_empty()) {
            metadata.tools = None;
        }
        prune(&mut metadata.lifecycles);
        prune(&mut metadata.authors);
        prune(&mut metadata.licenses);
        prune(&mut metadata.properties);
    }
    if bom.metadata.as_ref() == Some(&Metadata::default()) {
        bom.metadata = None;
    }

    if let Some(declarations) = bom.declarations.as_mut() {
        prune(&mut declarations.assessors);
        prune(&mut declarations.attestations);
        prune(&mut declarations.claims);
        prune(&mut declarations.evidence);
        if let Some(targets) = declarations.targets.as_mut() {
            prune(&mut targets.organizations);
            prune(&mut targets.components);
            prune(&mut targets.services);
        }
        if declarations.targets.as_ref() == Some(&Targets::default()) {
            declarations.targets = None;
        }
    }
    if bom.declarations.as_ref() == Some(&Declarations::default()) {
        bom.declarations = None;
    }

    if let Some(definitions) = bom.definitions.as_mut() {
        prune(&mut definitions.standards);
    }
    if bom.definitions.as_ref() == Some(&Definitions::default()) {
        bom.definitions = None;
    }
}

/// Recursively normalise the top-level and tool lists.
pub fn cleanup_sort_lists(bom: &mut Bom) {
    tracing::debug!("sorting merged lists");
    bom.normalize(true);
}
