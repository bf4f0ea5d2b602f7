//! Deterministic ordering of entity lists.

use super::{BomEntity, Mergeable};
use crate::model::{
    for_each_component_in_mut, for_each_component_mut, for_each_dependency_mut,
    for_each_service_mut, for_each_vulnerability_mut, Bom, Component,
};
use std::cmp::Ordering;

/// Stable sort of `list` by `key`.
///
/// Entries with equal keys keep their relative order in both directions.
pub fn sort_stable<T, K: Ord>(list: &mut [T], mut key: impl FnMut(&T) -> K, ascending: bool) {
    list.sort_by(|a, b| {
        let ordering: Ordering = key(a).cmp(&key(b));
        if ascending {
            ordering
        } else {
            ordering.reverse()
        }
    });
}

fn sort_entities<T: Mergeable>(list: &mut Option<Vec<T>>) {
    if let Some(list) = list.as_mut() {
        sort_stable(list, Mergeable::sort_key, true);
    }
}

fn sort_component_lists(component: &mut Component) {
    sort_entities(&mut component.components);
    sort_entities(&mut component.hashes);
    sort_entities(&mut component.licenses);
    sort_entities(&mut component.external_references);
    sort_entities(&mut component.properties);
    sort_entities(&mut component.authors);
    if let Some(pedigree) = component.pedigree.as_mut() {
        sort_entities(&mut pedigree.ancestors);
        sort_entities(&mut pedigree.descendants);
        sort_entities(&mut pedigree.variants);
    }
}

/// Put an entity's lists in a canonical order.
pub trait Normalize {
    /// Sort the entity's own lists. With `recursive`, every nested entity
    /// is normalised too, before the lists holding it are sorted.
    fn normalize(&mut self, recursive: bool);
}

impl Normalize for Component {
    fn normalize(&mut self, recursive: bool) {
        if recursive {
            for_each_component_in_mut(std::slice::from_mut(self), sort_component_lists);
        } else {
            sort_component_lists(self);
        }
    }
}

impl Normalize for Bom {
    fn normalize(&mut self, recursive: bool) {
        if recursive {
            // Sort keys of components, services and dependencies do not read
            // their nested lists, so one pre-order pass is enough for them.
            for_each_component_mut(self, sort_component_lists);
            for_each_service_mut(self, |service| {
                sort_entities(&mut service.services);
                sort_entities(&mut service.licenses);
                sort_entities(&mut service.external_references);
                sort_entities(&mut service.properties);
            });
            for_each_dependency_mut(self, |dep| sort_entities(&mut dep.dependencies));
            for_each_vulnerability_mut(self, |vuln| {
                sort_entities(&mut vuln.affects);
                sort_entities(&mut vuln.properties);
                if let Some(tools) = vuln.tools.as_mut() {
                    sort_entities(&mut tools.tools);
                }
            });
        }

        if let Some(metadata) = self.metadata.as_mut() {
            if let Some(tools) = metadata.tools.as_mut() {
                sort_entities(&mut tools.tools);
                sort_entities(&mut tools.components);
                sort_entities(&mut tools.services);
            }
            sort_entities(&mut metadata.properties);
        }
        sort_entities(&mut self.components);
        sort_entities(&mut self.services);
        sort_entities(&mut self.external_references);
        sort_entities(&mut self.dependencies);
        sort_entities(&mut self.compositions);
        sort_entities(&mut self.properties);
        sort_entities(&mut self.vulnerabilities);
        sort_entities(&mut self.annotations);
        sort_entities(&mut self.formulation);
    }
}

/// Hash of the recursively normalised document.
///
/// Two documents with the same fingerprint differ at most in list order.
#[must_use]
pub fn bom_fingerprint(bom: &Bom) -> u64 {
    let mut normalized = bom.clone();
    normalized.normalize(true);
    normalized.content_hash()
}
