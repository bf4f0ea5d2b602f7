//! List merging and field reconciliation helpers.

use super::Mergeable;
use crate::error::{BomError, Result};
use crate::model::EntityKind;
use crate::utils::{content_hash, CanonicalSet};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Debug;

/// How [`merge_lists`] decides that two entries are the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ListMergeStrategy {
    /// Equal entries are skipped, equivalent entries are merged field by field.
    #[default]
    Careful,
    /// Only byte-identical entries are deduplicated.
    Quick,
}

/// Merge two optional lists into one.
///
/// When either side is absent or empty the other side is returned as is,
/// without copying or deduplicating it. Otherwise the entries of `list1`
/// and then `list2` are folded into a fresh list: an entry equal to one
/// already present is skipped, an entry equivalent to one already present
/// is merged into the first such entry, anything else is appended. The
/// result keeps first-occurrence order.
///
/// Nested self-typed lists of merged entries (component children, pedigree
/// lists, nested services and dependencies) are merged the same way on a
/// work queue, so arbitrarily deep trees do not grow the call stack.
pub fn merge_lists<T: Mergeable>(
    list1: Option<Vec<T>>,
    list2: Option<Vec<T>>,
    strategy: ListMergeStrategy,
) -> Result<Option<Vec<T>>> {
    let (list1, list2) = match (list1, list2) {
        (Some(a), Some(b)) if !a.is_empty() && !b.is_empty() => (a, b),
        (a, b) if a.as_ref().map_or(true, Vec::is_empty) => {
            return Ok(if b.is_some() { b } else { a });
        }
        (a, _) => return Ok(a),
    };

    tracing::trace!(
        kind = %T::KIND,
        left = list1.len(),
        right = list2.len(),
        ?strategy,
        "merging lists"
    );

    let merged = match strategy {
        ListMergeStrategy::Quick => quick_merge(list1, list2),
        ListMergeStrategy::Careful => careful_merge(list1, list2, strategy)?,
    };
    Ok(Some(merged))
}

/// Fold the entries of a single list into each other with the rules of
/// [`merge_lists`].
pub(crate) fn dedupe_list<T: Mergeable>(
    list: Option<Vec<T>>,
    strategy: ListMergeStrategy,
) -> Result<Option<Vec<T>>> {
    match list {
        Some(items) if items.len() > 1 => Ok(Some(match strategy {
            ListMergeStrategy::Quick => quick_merge(items, Vec::new()),
            ListMergeStrategy::Careful => careful_merge(items, Vec::new(), strategy)?,
        })),
        other => Ok(other),
    }
}

fn quick_merge<T: Mergeable>(list1: Vec<T>, list2: Vec<T>) -> Vec<T> {
    let mut seen = CanonicalSet::new();
    let mut result = Vec::with_capacity(list1.len() + list2.len());

    for item in list1.into_iter().chain(list2) {
        if !seen.insert(item.canonical_bytes()) {
            tracing::trace!(kind = %T::KIND, "dropping duplicate entry");
            continue;
        }
        result.push(item);
    }
    result
}

/// A list being rebuilt, plus where to put it back once done.
struct Frame<T> {
    list: Vec<T>,
    hashes: Vec<u64>,
    incoming: Vec<T>,
    /// `(frame, entry, slot)` this list belongs to.
    parent: Option<(usize, usize, usize)>,
}

impl<T> Frame<T> {
    fn new(incoming: Vec<T>, parent: Option<(usize, usize, usize)>) -> Self {
        Self {
            list: Vec::with_capacity(incoming.len()),
            hashes: Vec::with_capacity(incoming.len()),
            incoming,
            parent,
        }
    }
}

fn careful_merge<T: Mergeable>(
    list1: Vec<T>,
    list2: Vec<T>,
    strategy: ListMergeStrategy,
) -> Result<Vec<T>> {
    let incoming = list1.into_iter().chain(list2).collect();
    let mut frames = vec![Frame::new(incoming, None)];
    let mut open: HashMap<(usize, usize, usize), usize> = HashMap::new();

    let mut current = 0;
    while current < frames.len() {
        let incoming = std::mem::take(&mut frames[current].incoming);
        for item in incoming {
            fold_item(&mut frames, &mut open, current, item, strategy)?;
        }
        current += 1;
    }

    // Children were created after their parents, so reattaching in reverse
    // creation order always finds the parent list still detached.
    while frames.len() > 1 {
        let Some(frame) = frames.pop() else { break };
        if let Some((parent, entry, slot)) = frame.parent {
            if let Some(target) = frames[parent]
                .list
                .get_mut(entry)
                .and_then(|e| e.nested_slot_mut(slot))
            {
                *target = Some(frame.list);
            }
        }
    }
    Ok(frames.pop().map(|f| f.list).unwrap_or_default())
}

fn fold_item<T: Mergeable>(
    frames: &mut Vec<Frame<T>>,
    open: &mut HashMap<(usize, usize, usize), usize>,
    current: usize,
    mut item: T,
    strategy: ListMergeStrategy,
) -> Result<()> {
    let bytes = item.canonical_bytes();
    let hash = content_hash(&bytes);

    let frame = &mut frames[current];
    let mut position = None;
    for (i, existing) in frame.list.iter().enumerate() {
        if frame.hashes[i] == hash && existing.canonical_bytes() == bytes {
            tracing::trace!(kind = %T::KIND, "skipping equal entry");
            return Ok(());
        }
        if existing.equivalent(&item) {
            position = Some(i);
            break;
        }
    }

    let Some(entry) = position else {
        frame.hashes.push(hash);
        frame.list.push(item);
        return Ok(());
    };

    tracing::trace!(kind = %T::KIND, entry, "merging equivalent entry");
    let mut nested = Vec::new();
    for slot in 0..T::NESTED_SLOTS {
        if let Some(list) = item.nested_slot_mut(slot).and_then(Option::take) {
            nested.push((slot, list));
        }
    }
    frame.list[entry].merge_fields(item, strategy)?;

    let mut spawned = Vec::new();
    for (slot, incoming) in nested {
        if let Some(&child) = open.get(&(current, entry, slot)) {
            frames[child].incoming.extend(incoming);
            continue;
        }
        let Some(mine) = frames[current].list[entry].nested_slot_mut(slot) else {
            continue;
        };
        match mine.take() {
            Some(existing) if !existing.is_empty() && !incoming.is_empty() => {
                spawned.push((slot, existing.into_iter().chain(incoming).collect()));
            }
            Some(existing) if !existing.is_empty() => *mine = Some(existing),
            _ => *mine = Some(incoming),
        }
    }
    for (slot, incoming) in spawned {
        open.insert((current, entry, slot), frames.len());
        frames.push(Frame::new(incoming, Some((current, entry, slot))));
    }

    let frame = &mut frames[current];
    frame.hashes[entry] = frame.list[entry].content_hash();
    Ok(())
}

// ============================================================================
// Field reconciliation
// ============================================================================

/// Fill an absent value from the peer; two present, different values conflict.
pub(crate) fn fill<V: PartialEq + Debug>(
    kind: EntityKind,
    field: &str,
    mine: &mut Option<V>,
    theirs: Option<V>,
) -> Result<()> {
    let Some(theirs) = theirs else {
        return Ok(());
    };
    match mine {
        Some(value) if *value == theirs => Ok(()),
        Some(value) => Err(BomError::entity_conflict(
            kind.name(),
            field,
            format!("{value:?} vs {theirs:?}"),
        )),
        None => {
            *mine = Some(theirs);
            Ok(())
        }
    }
}

/// Required values must agree.
pub(crate) fn require_same<V: PartialEq + Debug>(
    kind: EntityKind,
    field: &str,
    mine: &V,
    theirs: &V,
) -> Result<()> {
    if mine == theirs {
        Ok(())
    } else {
        Err(BomError::entity_conflict(
            kind.name(),
            field,
            format!("{mine:?} vs {theirs:?}"),
        ))
    }
}

/// Merge an entity list field in place.
pub(crate) fn merge_field<T: Mergeable>(
    mine: &mut Option<Vec<T>>,
    theirs: Option<Vec<T>>,
    strategy: ListMergeStrategy,
) -> Result<()> {
    *mine = merge_lists(mine.take(), theirs, strategy)?;
    Ok(())
}

/// Union two plain value lists, keeping first-occurrence order.
pub fn union_values<V: PartialEq>(mine: &mut Option<Vec<V>>, theirs: Option<Vec<V>>) {
    let Some(theirs) = theirs else { return };
    let list = mine.get_or_insert_with(Vec::new);
    for value in theirs {
        if !list.contains(&value) {
            list.push(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Component, ComponentType, Dependency, Hash, HashAlgorithm};

    fn lib(name: &str, version: &str) -> Component {
        Component::new(ComponentType::Library, name).with_version(version)
    }

    #[test]
    fn test_shortcut_returns_other_side() {
        let list = vec![lib("a", "1"), lib("a", "1")];

        let merged = merge_lists(None, Some(list.clone()), ListMergeStrategy::Careful).unwrap();
        assert_eq!(merged, Some(list.clone()));

        let merged = merge_lists(Some(list.clone()), Some(vec![]), ListMergeStrategy::Careful)
            .unwrap();
        assert_eq!(merged, Some(list.clone()), "duplicates survive the shortcut");

        let merged: Option<Vec<Component>> =
            merge_lists(None, None, ListMergeStrategy::Careful).unwrap();
        assert_eq!(merged, None);

        let merged: Option<Vec<Component>> =
            merge_lists(Some(vec![]), None, ListMergeStrategy::Careful).unwrap();
        assert_eq!(merged, Some(vec![]));
    }

    #[test]
    fn test_careful_dedupes_and_keeps_order() {
        let left = vec![lib("a", "1"), lib("b", "1")];
        let right = vec![lib("c", "1"), lib("a", "1")];
        let merged = merge_lists(Some(left), Some(right), ListMergeStrategy::Careful)
            .unwrap()
            .unwrap();
        let names: Vec<&str> = merged.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_careful_merges_equivalent_entries() {
        let mut richer = lib("a", "1");
        richer.description = Some("alpha".into());
        let merged = merge_lists(
            Some(vec![lib("a", "1")]),
            Some(vec![richer]),
            ListMergeStrategy::Careful,
        )
        .unwrap()
        .unwrap();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].description.as_deref(), Some("alpha"));
    }

    #[test]
    fn test_quick_only_drops_identical_entries() {
        let mut richer = lib("a", "1");
        richer.description = Some("alpha".into());
        let merged = merge_lists(
            Some(vec![lib("a", "1")]),
            Some(vec![lib("a", "1"), richer]),
            ListMergeStrategy::Quick,
        )
        .unwrap()
        .unwrap();
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_nested_children_are_merged() {
        let mut left = lib("app", "1");
        left.components = Some(vec![lib("x", "1")]);
        let mut right = lib("app", "1");
        let mut y = lib("y", "1");
        y.components = Some(vec![lib("z", "1")]);
        right.components = Some(vec![lib("x", "1"), y]);

        let merged = merge_lists(Some(vec![left]), Some(vec![right]), ListMergeStrategy::Careful)
            .unwrap()
            .unwrap();
        assert_eq!(merged.len(), 1);
        let children = merged[0].components.as_ref().unwrap();
        let names: Vec<&str> = children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["x", "y"]);
        assert_eq!(children[1].components.as_ref().unwrap()[0].name, "z");
    }

    #[test]
    fn test_repeated_merges_into_same_entry_keep_all_children() {
        let mut first = lib("app", "1");
        first.components = Some(vec![lib("x", "1")]);
        let mut second = lib("app", "1");
        second.components = Some(vec![lib("y", "1")]);
        let mut third = lib("app", "1");
        third.components = Some(vec![lib("z", "1")]);

        let merged = merge_lists(
            Some(vec![first]),
            Some(vec![second, third]),
            ListMergeStrategy::Careful,
        )
        .unwrap()
        .unwrap();
        let names: Vec<&str> = merged[0]
            .components
            .iter()
            .flatten()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["x", "y", "z"]);
    }

    #[test]
    fn test_deep_dependency_merge() {
        fn chain(depth: usize, leaf: &str) -> Dependency {
            let mut node = Dependency::new(leaf);
            for i in (0..depth).rev() {
                let mut parent = Dependency::new(format!("n{i}"));
                parent.dependencies = Some(vec![node]);
                node = parent;
            }
            node
        }

        let merged = merge_lists(
            Some(vec![chain(500, "left-leaf")]),
            Some(vec![chain(500, "right-leaf")]),
            ListMergeStrategy::Careful,
        )
        .unwrap()
        .unwrap();
        assert_eq!(merged.len(), 1);

        let mut node = &merged[0];
        for _ in 0..499 {
            node = &node.dependencies.as_ref().unwrap()[0];
        }
        assert_eq!(node.depends_on(), vec!["left-leaf", "right-leaf"]);
    }

    #[test]
    fn test_conflict_propagates() {
        let err = merge_lists(
            Some(vec![Hash::new(HashAlgorithm::Sha1, "aa")]),
            Some(vec![Hash::new(HashAlgorithm::Sha1, "bb")]),
            ListMergeStrategy::Careful,
        )
        .unwrap_err();
        assert!(err.is_entity_conflict());
    }

    #[test]
    fn test_fill_and_union() {
        let mut mine = None;
        fill(EntityKind::Component, "version", &mut mine, Some("1".to_string())).unwrap();
        assert_eq!(mine.as_deref(), Some("1"));
        fill(EntityKind::Component, "version", &mut mine, Some("1".to_string())).unwrap();
        assert!(fill(EntityKind::Component, "version", &mut mine, Some("2".to_string())).is_err());

        let mut tags = Some(vec!["a".to_string()]);
        union_values(&mut tags, Some(vec!["b".into(), "a".into()]));
        assert_eq!(tags, Some(vec!["a".to_string(), "b".to_string()]));
    }

    #[test]
    fn test_dedupe_single_list() {
        let list = Some(vec![
            Component::new(ComponentType::Library, "a").with_version("1"),
            Component::new(ComponentType::Library, "b").with_version("1"),
            Component::new(ComponentType::Library, "a").with_version("1"),
        ]);
        let deduped = dedupe_list(list, ListMergeStrategy::Careful).unwrap().unwrap();
        assert_eq!(deduped.len(), 2);

        let single = Some(vec![Hash::new(HashAlgorithm::Sha1, "aa")]);
        assert_eq!(
            dedupe_list(single.clone(), ListMergeStrategy::Careful).unwrap(),
            single
        );
    }
}
