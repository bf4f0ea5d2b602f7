//! Renaming identifiers across a document.

use crate::error::{BomError, Result};
use crate::model::{
    all_dependencies, for_each_bom_ref_mut, for_each_ref_link_mut, ref_link_sites, Bom,
    EntityKind,
};
use indexmap::IndexMap;

/// Rename the identifier `old` to `new` and rewrite every reference to it.
///
/// Returns the number of identifiers and references rewritten. The document
/// is left untouched when an error is returned.
///
/// # Errors
///
/// `EntityConflict` when one reference list (or the children of one
/// dependency record) names `old` more than once.
pub fn rename_bom_ref(bom: &mut Bom, old: &str, new: &str) -> Result<usize> {
    if old == new {
        return Ok(0);
    }

    let mut per_list: IndexMap<usize, (EntityKind, &'static str, usize)> = IndexMap::new();
    for site in ref_link_sites(bom).into_iter().filter(|s| s.reference == old) {
        if let Some(list) = site.list {
            per_list.entry(list).or_insert((site.source, site.field, 0)).2 += 1;
        }
    }
    if let Some((kind, field, _)) = per_list.values().find(|(_, _, n)| *n > 1) {
        return Err(BomError::entity_conflict(
            kind.name(),
            *field,
            format!("'{old}' is listed more than once"),
        ));
    }
    for dependency in all_dependencies(bom) {
        let listed = dependency
            .dependencies
            .iter()
            .flatten()
            .filter(|d| d.dep_ref == old)
            .count();
        if listed > 1 {
            return Err(BomError::entity_conflict(
                EntityKind::Dependency.name(),
                "dependsOn",
                format!("'{old}' is listed more than once under '{}'", dependency.dep_ref),
            ));
        }
    }

    let mut renamed = 0;
    for_each_bom_ref_mut(bom, |slot| {
        if slot.as_deref() == Some(old) {
            *slot = Some(new.to_string());
            renamed += 1;
        }
    });
    for_each_ref_link_mut(bom, |reference| {
        if reference == old {
            *reference = new.to_string();
            renamed += 1;
        }
    });
    tracing::debug!(old, new, renamed, "renamed bom-ref");
    Ok(renamed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Aggregate, Component, ComponentType, Composition, Dependency};
    use crate::validate::validate_references;

    fn sample() -> Bom {
        let mut bom = Bom::default();
        bom.components = Some(vec![
            Component::new(ComponentType::Library, "a").with_bom_ref("a"),
            Component::new(ComponentType::Library, "b").with_bom_ref("b"),
        ]);
        bom.dependencies = Some(vec![
            Dependency::with_depends_on("a", ["b"]),
            Dependency::new("b"),
        ]);
        let mut composition = Composition::new(Aggregate::Complete);
        composition.assemblies = Some(vec!["a".into(), "b".into()]);
        bom.compositions = Some(vec![composition]);
        bom
    }

    #[test]
    fn test_rename_rewrites_identifier_and_references() {
        let mut bom = sample();
        let renamed = rename_bom_ref(&mut bom, "b", "pkg:b").unwrap();

        // One identifier, two dependency refs, one assembly.
        assert_eq!(renamed, 4);
        let components = bom.components.as_ref().unwrap();
        assert_eq!(components[1].bom_ref.as_deref(), Some("pkg:b"));
        assert_eq!(bom.dependencies.as_ref().unwrap()[0].depends_on(), vec!["pkg:b"]);
        assert!(validate_references(&bom).is_empty());
    }

    #[test]
    fn test_unknown_ref_is_a_noop() {
        let mut bom = sample();
        let before = bom.clone();
        assert_eq!(rename_bom_ref(&mut bom, "zzz", "yyy").unwrap(), 0);
        assert_eq!(rename_bom_ref(&mut bom, "a", "a").unwrap(), 0);
        assert_eq!(bom, before);
    }

    #[test]
    fn test_duplicate_in_list_conflicts() {
        let mut bom = sample();
        if let Some(composition) = bom.compositions.as_mut().and_then(|c| c.first_mut()) {
            composition.assemblies = Some(vec!["b".into(), "b".into()]);
        }
        let before = bom.clone();

        let err = rename_bom_ref(&mut bom, "b", "c").unwrap_err();
        assert!(err.is_entity_conflict());
        assert_eq!(bom, before);
    }

    #[test]
    fn test_duplicate_dependency_child_conflicts() {
        let mut bom = sample();
        bom.dependencies = Some(vec![Dependency::with_depends_on("a", ["b", "b"])]);
        let err = rename_bom_ref(&mut bom, "b", "c").unwrap_err();
        assert!(err.is_entity_conflict());
    }
}
