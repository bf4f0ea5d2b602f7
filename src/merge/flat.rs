//! Flat merge: one deduplicated document without input boundaries.

use super::cleanup::{cleanup_empty_lists, cleanup_metadata_component, cleanup_sort_lists};
use super::{finish_identity, MergeOptions};
use crate::entity::{
    dedupe_list, fill, merge_field, merge_lists, merge_tool_choices, merge_with, BomEntity,
    ListMergeStrategy,
};
use crate::error::{BomError, ErrorContext, Result};
use crate::model::{
    bom_ref_sites, Bom, Component, Declarations, Definitions, Dependency, EntityKind, SpecVersion,
};
use std::collections::BTreeSet;

/// Merge `right` into `left`.
///
/// `left` is the shell of the result: its identity and metadata are kept,
/// and its lists come first. Every top-level collection of `right` is
/// folded in with [`merge_lists`]. The metadata component of `right` is
/// merged into that of `left` when the two describe the same thing, and is
/// otherwise appended to `components` unless an equal entry is already
/// there.
///
/// # Errors
///
/// `EntityConflict` when two equivalent entities disagree on a field.
pub fn flat_merge_pair(left: Bom, right: Bom, options: &MergeOptions) -> Result<Bom> {
    let strategy = options.strategy;
    let mut result = left;
    let Bom {
        metadata,
        components,
        services,
        external_references,
        dependencies,
        compositions,
        properties,
        vulnerabilities,
        annotations,
        formulation,
        declarations,
        definitions,
        ..
    } = right;
    let (tools, subject) = metadata.map_or((None, None), |m| (m.tools, m.component));

    if tools.is_some() {
        merge_tool_choices(&mut result.metadata_mut().tools, tools, strategy)?;
    }
    result.components = merge_lists(result.components.take(), components, strategy)?;
    if let Some(subject) = subject {
        absorb_metadata_component(&mut result, subject, strategy)?;
    }
    result.services = merge_lists(result.services.take(), services, strategy)?;
    result.external_references =
        merge_lists(result.external_references.take(), external_references, strategy)?;
    result.dependencies = merge_lists(result.dependencies.take(), dependencies, strategy)?;
    result.compositions = merge_lists(result.compositions.take(), compositions, strategy)?;
    result.properties = merge_lists(result.properties.take(), properties, strategy)?;
    result.vulnerabilities = merge_lists(result.vulnerabilities.take(), vulnerabilities, strategy)?;
    result.annotations = merge_lists(result.annotations.take(), annotations, strategy)?;
    result.formulation = merge_lists(result.formulation.take(), formulation, strategy)?;
    merge_declarations(&mut result.declarations, declarations, strategy)?;
    merge_definitions(&mut result.definitions, definitions, strategy)?;

    finish_identity(&mut result, options);
    cleanup_metadata_component(&mut result, strategy)?;
    cleanup_empty_lists(&mut result);
    Ok(result)
}

fn absorb_metadata_component(
    result: &mut Bom,
    subject: Component,
    strategy: ListMergeStrategy,
) -> Result<()> {
    if result
        .components
        .iter()
        .flatten()
        .any(|c| c.entity_eq(&subject))
    {
        return Ok(());
    }

    if let Some(existing) = result.metadata.as_mut().and_then(|m| m.component.as_mut()) {
        let same_ref = existing.bom_ref.is_some() && existing.bom_ref == subject.bom_ref;
        if same_ref || existing.entity_eq(&subject) {
            tracing::debug!(name = %subject.name, "merging metadata components");
            if merge_with(existing, Some(&subject), strategy)?.is_contained() {
                return Ok(());
            }
        }
    }

    tracing::debug!(name = %subject.name, "keeping metadata component as a component");
    result.components.get_or_insert_with(Vec::new).push(subject);
    Ok(())
}

pub(super) fn merge_declarations(
    mine: &mut Option<Declarations>,
    theirs: Option<Declarations>,
    strategy: ListMergeStrategy,
) -> Result<()> {
    let Some(theirs) = theirs else {
        return Ok(());
    };
    let Some(declarations) = mine.as_mut() else {
        *mine = Some(theirs);
        return Ok(());
    };
    merge_field(&mut declarations.assessors, theirs.assessors, strategy)?;
    merge_field(&mut declarations.attestations, theirs.attestations, strategy)?;
    merge_field(&mut declarations.claims, theirs.claims, strategy)?;
    merge_field(&mut declarations.evidence, theirs.evidence, strategy)?;
    if let Some(other) = theirs.targets {
        if let Some(targets) = declarations.targets.as_mut() {
            merge_field(&mut targets.organizations, other.organizations, strategy)?;
            merge_field(&mut targets.components, other.components, strategy)?;
            merge_field(&mut targets.services, other.services, strategy)?;
        } else {
            declarations.targets = Some(other);
        }
    }
    fill(
        EntityKind::Declarations,
        "affirmation",
        &mut declarations.affirmation,
        theirs.affirmation,
    )
}

pub(super) fn merge_definitions(
    mine: &mut Option<Definitions>,
    theirs: Option<Definitions>,
    strategy: ListMergeStrategy,
) -> Result<()> {
    let Some(theirs) = theirs else {
        return Ok(());
    };
    match mine.as_mut() {
        Some(definitions) => merge_field(&mut definitions.standards, theirs.standards, strategy),
        None => {
            *mine = Some(theirs);
            Ok(())
        }
    }
}

/// Fold equivalent entries within each top-level list of `bom`.
fn dedupe_document(bom: &mut Bom, strategy: ListMergeStrategy) -> Result<()> {
    if let Some(tools) = bom.metadata.as_mut().and_then(|m| m.tools.as_mut()) {
        tools.tools = dedupe_list(tools.tools.take(), strategy)?;
        tools.components = dedupe_list(tools.components.take(), strategy)?;
        tools.services = dedupe_list(tools.services.take(), strategy)?;
    }
    bom.components = dedupe_list(bom.components.take(), strategy)?;
    bom.services = dedupe_list(bom.services.take(), strategy)?;
    bom.external_references = dedupe_list(bom.external_references.take(), strategy)?;
    bom.dependencies = dedupe_list(bom.dependencies.take(), strategy)?;
    bom.compositions = dedupe_list(bom.compositions.take(), strategy)?;
    bom.properties = dedupe_list(bom.properties.take(), strategy)?;
    bom.vulnerabilities = dedupe_list(bom.vulnerabilities.take(), strategy)?;
    bom.annotations = dedupe_list(bom.annotations.take(), strategy)?;
    bom.formulation = dedupe_list(bom.formulation.take(), strategy)?;
    if let Some(declarations) = bom.declarations.as_mut() {
        declarations.assessors = dedupe_list(declarations.assessors.take(), strategy)?;
        declarations.attestations = dedupe_list(declarations.attestations.take(), strategy)?;
        declarations.claims = dedupe_list(declarations.claims.take(), strategy)?;
        declarations.evidence = dedupe_list(declarations.evidence.take(), strategy)?;
    }
    if let Some(definitions) = bom.definitions.as_mut() {
        definitions.standards = dedupe_list(definitions.standards.take(), strategy)?;
    }
    Ok(())
}

fn collect_bom_refs(bom: &Bom, into: &mut BTreeSet<String>) {
    into.extend(bom_ref_sites(bom).into_iter().map(|(_, r)| r.to_string()));
}

/// Merge any number of documents into one.
///
/// A quick pass first folds every input into an empty document,
/// deduplicating byte-identical entities only. A careful pass then folds
/// equivalent entries of the much shorter lists into each other and merges
/// the outcome into a fresh result, which receives the identity options.
///
/// With a `subject`, the result describes it: it becomes the metadata
/// component with bom-ref `group.name@version` (or `name@version`), and a
/// dependency record makes it depend on every input's metadata component.
/// Inputs whose metadata component has no bom-ref are left out of that
/// record.
///
/// # Errors
///
/// - `MissingMetadataComponent` when a `subject` is given and an input
///   has no metadata component.
/// - `EntityConflict` when two equivalent entities disagree on a field.
pub fn flat_merge(boms: &[Bom], subject: Option<Component>, options: &MergeOptions) -> Result<Bom> {
    if subject.is_some() {
        if let Some(bom) = boms.iter().find(|b| b.metadata_component().is_none()) {
            return Err(BomError::missing_metadata_component(
                bom.serial_number.as_deref(),
            ));
        }
    }

    let mut input_refs = BTreeSet::new();
    let quick = MergeOptions::intermediate(ListMergeStrategy::Quick);
    let mut folded = Bom::new(SpecVersion::CURRENT);
    for (index, bom) in boms.iter().enumerate() {
        collect_bom_refs(bom, &mut input_refs);
        folded = flat_merge_pair(folded, bom.clone(), &quick).with_context(|| {
            format!(
                "document {index} ({})",
                bom.serial_number.as_deref().unwrap_or("no serial number")
            )
        })?;
        tracing::debug!(document = index, "folded document into flat merge");
    }

    dedupe_document(&mut folded, options.strategy)
        .with_context(|| format!("combining {} documents", boms.len()))?;

    let mut head = Bom::new(SpecVersion::CURRENT);
    let subject_ref = subject.map(|mut subject| {
        let bom_ref = subject.namespace();
        subject.bom_ref = Some(bom_ref.clone());
        head.metadata_mut().component = Some(subject);
        input_refs.insert(bom_ref.clone());
        bom_ref
    });

    let careful = MergeOptions {
        sort_lists: false,
        ..options.clone()
    };
    let mut result = flat_merge_pair(head, folded, &careful)?;

    if let Some(subject_ref) = subject_ref {
        let mut children = Vec::new();
        for bom in boms {
            match bom.metadata_component().and_then(|c| c.bom_ref.as_deref()) {
                Some(child) => children.push(Dependency::new(child)),
                None => tracing::warn!(
                    serial_number = bom.serial_number.as_deref().unwrap_or("<none>"),
                    "metadata component has no bom-ref; not listed under the subject"
                ),
            }
        }
        let record = Dependency {
            dependencies: Some(children),
            ..Dependency::new(subject_ref)
        };
        result.dependencies = merge_lists(
            result.dependencies.take(),
            Some(vec![record]),
            options.strategy,
        )?;
    }

    cleanup_metadata_component(&mut result, options.strategy)?;
    cleanup_empty_lists(&mut result);
    if options.sort_lists {
        cleanup_sort_lists(&mut result);
    }

    let mut output_refs = BTreeSet::new();
    collect_bom_refs(&result, &mut output_refs);
    if input_refs != output_refs {
        tracing::warn!(
            inputs = input_refs.len(),
            result = output_refs.len(),
            "merged document carries a different set of bom-refs than its inputs"
        );
    }
    Ok(result)
}
