//! Multi-document merging.
//!
//! Two engines combine documents:
//!
//! - [`flat_merge`] folds every top-level collection of every input into
//!   one document, deduplicating equivalent entities. Which input an entity
//!   came from is not preserved.
//! - [`hierarchical_merge`] keeps each input as a subtree below its own
//!   metadata component and prefixes every identifier with that
//!   component's namespace, so identifiers from different inputs never
//!   collide.
//!
//! Both produce a document tagged with [`SpecVersion::CURRENT`]; downgrade
//! it afterwards to write an older version.
//!
//! ```ignore
//! use cdx_tools::merge::{flat_merge, MergeOptions};
//!
//! let merged = flat_merge(&[left, right], None, &MergeOptions::default())?;
//! ```

mod cleanup;
mod flat;
mod hierarchical;
mod rename;

pub use cleanup::{cleanup_empty_lists, cleanup_metadata_component, cleanup_sort_lists};
pub use flat::{flat_merge, flat_merge_pair};
pub use hierarchical::hierarchical_merge;
pub use rename::rename_bom_ref;

use crate::entity::ListMergeStrategy;
use crate::model::{Bom, Component, ComponentType, SpecVersion, Tool};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Vendor and name under which merged documents record this library.
pub const TOOLKIT_NAME: &str = "cdx-tools";

/// Which merge engine to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum MergeMode {
    /// One document, deduplicated, without input boundaries.
    #[default]
    Flat,
    /// One subtree per input below its metadata component.
    Hierarchical,
}

/// Knobs shared by both engines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOptions {
    pub strategy: ListMergeStrategy,
    /// New serial number, revision 1 and current timestamp on the result.
    pub refresh_identity: bool,
    /// Record this library in the result's tools.
    pub refer_toolkit: bool,
    /// Normalise the result's top-level lists (flat merge only).
    pub sort_lists: bool,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            strategy: ListMergeStrategy::Careful,
            refresh_identity: true,
            refer_toolkit: true,
            sort_lists: false,
        }
    }
}

impl MergeOptions {
    /// Options for intermediate folds: no identity changes, no extra tools.
    #[must_use]
    pub fn intermediate(strategy: ListMergeStrategy) -> Self {
        Self {
            strategy,
            refresh_identity: false,
            refer_toolkit: false,
            sort_lists: false,
        }
    }
}

/// Legacy tool record naming this library.
#[must_use]
pub fn toolkit_tool() -> Tool {
    Tool::new(TOOLKIT_NAME, TOOLKIT_NAME, env!("CARGO_PKG_VERSION"))
}

/// Tool component naming this library.
#[must_use]
pub fn toolkit_component() -> Component {
    let mut component = Component::new(ComponentType::Library, TOOLKIT_NAME)
        .with_version(env!("CARGO_PKG_VERSION"));
    component.publisher = Some(TOOLKIT_NAME.to_string());
    component
}

/// Apply the identity options to a finished merge result.
///
/// The toolkit goes into the list the document already uses: tool
/// components when the modern form is populated, legacy tools otherwise.
pub(crate) fn finish_identity(bom: &mut Bom, options: &MergeOptions) {
    if options.refresh_identity {
        bom.refresh_identity();
    }
    if options.refer_toolkit {
        let tools = bom.metadata_mut().tools.get_or_insert_with(Default::default);
        let modern = tools.components.as_ref().is_some_and(|c| !c.is_empty())
            || tools.services.as_ref().is_some_and(|s| !s.is_empty());
        if modern {
            let toolkit = toolkit_component();
            let list = tools.components.get_or_insert_with(Vec::new);
            if !list.contains(&toolkit) {
                list.push(toolkit);
            }
        } else {
            let toolkit = toolkit_tool();
            let list = tools.tools.get_or_insert_with(Vec::new);
            if !list.contains(&toolkit) {
                list.push(toolkit);
            }
        }
    }
    crate::model::retag_version(bom, SpecVersion::CURRENT);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ToolChoices;

    #[test]
    fn test_default_options() {
        let options = MergeOptions::default();
        assert_eq!(options.strategy, ListMergeStrategy::Careful);
        assert!(options.refresh_identity);
        assert!(options.refer_toolkit);
        assert!(!options.sort_lists);
    }

    #[test]
    fn test_toolkit_goes_to_legacy_tools_by_default() {
        let mut bom = Bom::default();
        finish_identity(&mut bom, &MergeOptions::default());
        finish_identity(&mut bom, &MergeOptions::default());

        let tools = bom.metadata.as_ref().and_then(|m| m.tools.as_ref()).unwrap();
        assert_eq!(tools.tools.as_deref(), Some(&[toolkit_tool()][..]));
        assert!(tools.components.is_none());
        assert!(bom.serial_number.is_some());
    }

    #[test]
    fn test_toolkit_follows_modern_tools() {
        let mut bom = Bom::default();
        bom.metadata_mut().tools = Some(ToolChoices::components(vec![Component::new(
            ComponentType::Application,
            "scanner",
        )]));
        finish_identity(&mut bom, &MergeOptions::default());

        let tools = bom.metadata.as_ref().and_then(|m| m.tools.as_ref()).unwrap();
        assert!(tools.tools.is_none());
        assert_eq!(tools.components.as_ref().map(Vec::len), Some(2));
    }

    #[test]
    fn test_intermediate_options_keep_identity() {
        let mut bom = Bom::default();
        finish_identity(&mut bom, &MergeOptions::intermediate(ListMergeStrategy::Quick));
        assert!(bom.serial_number.is_none());
        assert!(bom.metadata.is_none());
    }
}
