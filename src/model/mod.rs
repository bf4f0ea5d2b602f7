//! In-memory CycloneDX document model.
//!
//! Entities mirror the CycloneDX object model from 1.0 to 1.6. Fields that
//! only exist from a given version are listed in [`FIELD_AVAILABILITY`]
//! rather than annotated on the structs, so the downgrade engine and the
//! codecs read the same table.
//!
//! A few entities change their wire shape with the version (tool choices,
//! service data, evidence identities). They carry a version tag that
//! [`retag_version`] keeps in step with the document:
//!
//! ```ignore
//! let mut bom = Bom::new(SpecVersion::V1_6);
//! // ... populate ...
//! retag_version(&mut bom, SpecVersion::V1_4);
//! assert_eq!(bom.spec_version, SpecVersion::V1_4);
//! ```

mod bom;
mod capability;
mod common;
mod component;
mod declarations;
mod dependency;
mod enums;
mod license;
mod refs;
mod service;
mod version;
mod vulnerability;
mod walk;

pub use bom::*;
pub use capability::*;
pub use common::*;
pub use component::*;
pub use declarations::*;
pub use dependency::*;
pub use enums::*;
pub use license::*;
pub use refs::*;
pub use service::*;
pub use version::*;
pub use vulnerability::*;
pub use walk::*;

/// Set the document version and cascade it into every version-shaped child.
///
/// Applying the same version twice is a no-op the second time.
pub fn retag_version(bom: &mut Bom, version: SpecVersion) {
    bom.spec_version = version;
    for_each_tool_choices_mut(bom, |tools| tools.spec_version = version);
    for_each_service_mut(bom, |service| {
        if let Some(data) = service.data.as_mut() {
            data.spec_version = version;
        }
    });
    for_each_component_mut(bom, |component| {
        if let Some(identity) = component
            .evidence
            .as_mut()
            .and_then(|e| e.identity.as_mut())
        {
            identity.spec_version = version;
        }
    });
}
