//! Equality, equivalence and merging of document entities.
//!
//! Two entities are *equal* when their canonical serialisations are
//! byte-identical. They are *equivalent* when they describe the same real
//! thing, which is type specific (see [`Mergeable::equivalent`]). Merging
//! reconciles an equivalent but unequal peer into an existing entity, and
//! [`merge_lists`] folds whole lists that way.
//!
//! ```ignore
//! use cdx_tools::entity::{merge_lists, ListMergeStrategy};
//!
//! let merged = merge_lists(left.components, right.components, ListMergeStrategy::Careful)?;
//! ```

mod any;
mod impls;
mod lists;
mod normalize;

pub use any::AnyEntity;
pub use lists::{merge_lists, union_values, ListMergeStrategy};
pub use normalize::{bom_fingerprint, sort_stable, Normalize};

pub(crate) use impls::merge_tool_choices;
pub(crate) use lists::{dedupe_list, fill, merge_field};

use crate::error::{BomError, Result};
use crate::model::Entity;
use crate::utils::content_hash;
use serde::Serialize;

/// Canonical form of an entity: compact JSON of its current shape.
pub trait BomEntity: Entity + Serialize + Clone {
    /// Canonical bytes. Every model type serialises infallibly to JSON.
    fn canonical_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_default()
    }

    /// xxh3 hash of the canonical bytes.
    fn content_hash(&self) -> u64 {
        content_hash(&self.canonical_bytes())
    }

    /// Byte equality of the canonical forms.
    fn entity_eq(&self, other: &Self) -> bool {
        self.canonical_bytes() == other.canonical_bytes()
    }
}

/// An entity that can be deduplicated and merged with its peers.
pub trait Mergeable: BomEntity {
    /// Number of self-typed child lists (component children, pedigree
    /// lists, nested services, nested dependencies).
    const NESTED_SLOTS: usize = 0;

    /// Whether `other` describes the same real thing.
    fn equivalent(&self, other: &Self) -> bool {
        self.entity_eq(other)
    }

    /// Fold an equivalent, unequal peer into `self`.
    ///
    /// Nested self-typed lists of `other` have already been detached by the
    /// caller, which merges them separately.
    fn merge_fields(&mut self, other: Self, strategy: ListMergeStrategy) -> Result<()> {
        let _ = (other, strategy);
        Err(BomError::entity_conflict(
            Self::KIND.name(),
            "*",
            "equivalent entities differ and carry no field-level merge",
        ))
    }

    /// Key for stable sorting.
    fn sort_key(&self) -> String {
        String::from_utf8(self.canonical_bytes()).unwrap_or_default()
    }

    /// Self-typed child list number `slot`, for `slot < NESTED_SLOTS`.
    fn nested_slot_mut(&mut self, slot: usize) -> Option<&mut Option<Vec<Self>>> {
        let _ = slot;
        None
    }
}

/// Result of [`merge_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// `other` was absent or already equal.
    Unchanged,
    /// `other` was equivalent and its data was folded in.
    Merged,
    /// `other` describes a different thing; the caller keeps both.
    NotEquivalent,
}

impl MergeOutcome {
    /// Whether `other` is now represented by `self`.
    #[must_use]
    pub const fn is_contained(self) -> bool {
        !matches!(self, Self::NotEquivalent)
    }
}

/// Merge a single pair.
///
/// Nested self-typed lists are merged with [`merge_lists`], so deep trees
/// are handled without recursion.
pub fn merge_with<T: Mergeable>(
    entity: &mut T,
    other: Option<&T>,
    strategy: ListMergeStrategy,
) -> Result<MergeOutcome> {
    let Some(other) = other else {
        return Ok(MergeOutcome::Unchanged);
    };
    if entity.entity_eq(other) {
        return Ok(MergeOutcome::Unchanged);
    }
    if !entity.equivalent(other) {
        return Ok(MergeOutcome::NotEquivalent);
    }
    let merged = merge_lists(
        Some(vec![entity.clone()]),
        Some(vec![other.clone()]),
        strategy,
    )?;
    match merged.and_then(|mut list| (list.len() == 1).then(|| list.swap_remove(0))) {
        Some(result) => {
            *entity = result;
            Ok(MergeOutcome::Merged)
        }
        None => Ok(MergeOutcome::NotEquivalent),
    }
}
