//! Version downgrade engine.
//!
//! Downgrading crosses every version threshold above the target, oldest
//! first. Each step clears the fields introduced at that threshold (read
//! from [`FIELD_AVAILABILITY`](crate::model::FIELD_AVAILABILITY)), rewrites
//! enum values introduced there, and applies the few reshaping rules that
//! are not plain removals. Later steps can rely on earlier ones, so a whole
//! section removed at 1.2 is never walked again at 1.5.
//!
//! ```ignore
//! use cdx_tools::{downgrade, SpecVersion};
//!
//! let legacy = downgrade(&bom, SpecVersion::V1_3);
//! assert_eq!(legacy.spec_version, SpecVersion::V1_3);
//! ```

use crate::model::{
    for_each_component_mut, for_each_contact_mut, for_each_dependency_mut,
    for_each_external_reference_mut, for_each_license_choice_mut, for_each_organization_mut,
    for_each_service_mut, for_each_tool_choices_mut, for_each_tool_mut,
    for_each_vulnerability_mut, retag_version, Bom, Component, Evidence, Hash, SpecVersion,
    VersionGated, VersionedEnum,
};

/// Version placeholder for components without one; pre-1.4 schemas require it.
pub const DEFAULT_COMPONENT_VERSION: &str = "0.0.0";

/// A copy of `bom` reduced to what `target` can represent.
///
/// The caller's document is left untouched. Downgrading is lossy but never
/// fails; format support is checked by the codecs.
#[must_use]
pub fn downgrade(bom: &Bom, target: SpecVersion) -> Bom {
    let mut copy = bom.clone();
    downgrade_in_place(&mut copy, target);
    copy
}

/// [`downgrade`] on a document the caller owns.
pub fn downgrade_in_place(bom: &mut Bom, target: SpecVersion) {
    for threshold in target.thresholds_above() {
        tracing::debug!(%threshold, %target, "stripping fields introduced at threshold");
        strip_threshold(bom, threshold, target);
    }
    // Always retag, even to the same version: it resets the wire shape of
    // tool choices, service data and evidence identities.
    retag_version(bom, target);
}

fn strip_threshold(bom: &mut Bom, threshold: SpecVersion, target: SpecVersion) {
    bom.clear_fields_introduced_at(threshold);
    if let Some(metadata) = bom.metadata.as_mut() {
        metadata.clear_fields_introduced_at(threshold);
    }

    for_each_tool_choices_mut(bom, |choices| choices.clear_fields_introduced_at(threshold));
    for_each_tool_mut(bom, |tool| {
        tool.clear_fields_introduced_at(threshold);
        retain_representable(&mut tool.hashes, threshold, target, |h: &mut Hash| &mut h.alg);
    });
    for_each_component_mut(bom, |component| strip_component(component, threshold, target));
    for_each_service_mut(bom, |service| {
        service.clear_fields_introduced_at(threshold);
        if let Some(data) = service.data.as_mut() {
            for flow in &mut data.flows {
                flow.clear_fields_introduced_at(threshold);
            }
        }
    });
    for_each_dependency_mut(bom, |dependency| dependency.clear_fields_introduced_at(threshold));

    for composition in bom.compositions.iter_mut().flatten() {
        composition.clear_fields_introduced_at(threshold);
        if composition.aggregate.since() == threshold {
            composition.aggregate.clamp_to(target);
        }
    }

    for_each_external_reference_mut(bom, |reference| {
        reference.clear_fields_introduced_at(threshold);
        if reference.reference_type.since() == threshold {
            reference.reference_type.clamp_to(target);
        }
        retain_representable(&mut reference.hashes, threshold, target, |h: &mut Hash| {
            &mut h.alg
        });
    });
    for_each_license_choice_mut(bom, |choice| {
        choice.clear_fields_introduced_at(threshold);
        if let Some(license) = choice.license.as_mut() {
            license.clear_fields_introduced_at(threshold);
        }
    });
    for_each_organization_mut(bom, |org| org.clear_fields_introduced_at(threshold));
    for_each_contact_mut(bom, |contact| contact.clear_fields_introduced_at(threshold));

    for_each_vulnerability_mut(bom, |vulnerability| {
        vulnerability.clear_fields_introduced_at(threshold);
        if let Some(analysis) = vulnerability.analysis.as_mut() {
            analysis.clear_fields_introduced_at(threshold);
        }
        for rating in vulnerability.ratings.iter_mut().flatten() {
            if let Some(method) = rating.method.as_mut() {
                if method.since() == threshold && !method.clamp_to(target) {
                    rating.method = None;
                }
            }
        }
    });
}

fn strip_component(component: &mut Component, threshold: SpecVersion, target: SpecVersion) {
    if let Some(evidence) = component.evidence.as_mut() {
        if threshold == SpecVersion::V1_6 {
            keep_first_identity(evidence);
        }
        strip_evidence(evidence, threshold, target);
    }
    if threshold == SpecVersion::V1_6 {
        remove_environmental_considerations(component);
    }

    component.clear_fields_introduced_at(threshold);
    if let Some(pedigree) = component.pedigree.as_mut() {
        pedigree.clear_fields_introduced_at(threshold);
    }

    if component.component_type.since() == threshold {
        component.component_type.clamp_to(target);
    }
    if let Some(scope) = component.scope.as_mut() {
        if scope.since() == threshold && !scope.clamp_to(target) {
            component.scope = None;
        }
    }
    retain_representable(&mut component.hashes, threshold, target, |h: &mut Hash| {
        &mut h.alg
    });

    if threshold == SpecVersion::V1_4 && component.version.is_none() {
        component.version = Some(DEFAULT_COMPONENT_VERSION.to_string());
    }
}

fn strip_evidence(evidence: &mut Evidence, threshold: SpecVersion, target: SpecVersion) {
    evidence.clear_fields_introduced_at(threshold);
    let Some(identity) = evidence.identity.as_mut() else {
        return;
    };
    let before = identity.items.len();
    identity
        .items
        .retain_mut(|item| item.field.since() != threshold || item.field.clamp_to(target));
    for item in &mut identity.items {
        item.clear_fields_introduced_at(threshold);
    }
    if identity.items.is_empty() && before > 0 {
        evidence.identity = None;
    }
}

/// 1.5 holds a single identity object.
fn keep_first_identity(evidence: &mut Evidence) {
    if let Some(identity) = evidence.identity.as_mut() {
        identity.items.truncate(1);
    }
}

fn remove_environmental_considerations(component: &mut Component) {
    let considerations = component
        .model_card
        .as_mut()
        .and_then(|card| card.get_mut("considerations"))
        .and_then(serde_json::Value::as_object_mut);
    if let Some(considerations) = considerations {
        considerations.remove("environmentalConsiderations");
    }
}

/// Clamp the enum of every entry introduced at `threshold`, dropping the
/// entries that have no representable value. A list emptied this way
/// becomes absent.
fn retain_representable<T, E: VersionedEnum>(
    list: &mut Option<Vec<T>>,
    threshold: SpecVersion,
    target: SpecVersion,
    mut value: impl FnMut(&mut T) -> &mut E,
) {
    let Some(items) = list.as_mut() else {
        return;
    };
    let before = items.len();
    items.retain_mut(|item| {
        let value = value(item);
        value.since() != threshold || value.clamp_to(target)
    });
    if items.is_empty() && before > 0 {
        *list = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Aggregate, ComponentScope, ComponentType, Composition, Dependency, EvidenceField,
        EvidenceIdentities, EvidenceIdentity, ExternalReference, ExternalReferenceType,
        HashAlgorithm, LicenseChoice, OrganizationalEntity, Rating, ScoreMethod, Service,
        ToolChoices, Vulnerability,
    };
    use serde_json::json;

    fn lib(name: &str) -> Component {
        Component::new(ComponentType::Library, name)
    }

    fn rich_document() -> Bom {
        let mut model = Component::new(ComponentType::MachineLearningModel, "classifier")
            .with_version("2.0")
            .with_bom_ref("model");
        model.model_card = Some(json!({
            "considerations": {
                "users": ["analysts"],
                "environmentalConsiderations": {"energyConsumptions": []}
            }
        }));
        model.data = Some(vec![json!({"type": "dataset"})]);
        model.tags = Some(vec!["ml".into()]);
        model.evidence = Some(Evidence {
            identity: Some(EvidenceIdentities::new(vec![
                EvidenceIdentity {
                    concluded_value: Some("pkg:generic/classifier".into()),
                    ..EvidenceIdentity::new(EvidenceField::Purl)
                },
                EvidenceIdentity::new(EvidenceField::Name),
            ])),
            ..Evidence::default()
        });
        model.hashes = Some(vec![
            Hash::new(HashAlgorithm::Sha256, "aa"),
            Hash::new(HashAlgorithm::Blake3, "bb"),
        ]);
        model.external_references = Some(vec![ExternalReference::new(
            ExternalReferenceType::Rfc9116,
            "https://example.com/security.txt",
        )]);

        let mut unversioned = lib("unversioned");
        unversioned.scope = Some(ComponentScope::Excluded);

        let mut bom = Bom::default();
        bom.serial_number = Some("urn:uuid:3e671687-395b-41f5-a30f-a58921a69b79".into());
        bom.metadata_mut().component = Some(Component::new(ComponentType::Application, "app"));
        bom.metadata_mut().tools = Some(ToolChoices::components(vec![lib("scanner")]));
        bom.metadata_mut().supplier = Some(OrganizationalEntity {
            bom_ref: Some("acme".into()),
            address: Some(json!({"country": "NL"})),
            ..OrganizationalEntity::named("acme")
        });
        bom.components = Some(vec![model, unversioned]);
        bom.services = Some(vec![Service::new("api")]);
        bom.dependencies = Some(vec![Dependency {
            provides: Some(vec!["crypto".into()]),
            ..Dependency::new("model")
        }]);
        bom.compositions = Some(vec![Composition::new(
            Aggregate::IncompleteThirdPartyOpensourceOnly,
        )]);
        let mut vuln = Vulnerability::new("CVE-2024-0001");
        vuln.ratings = Some(vec![Rating {
            method: Some(ScoreMethod::CvssV4),
            ..Rating::default()
        }]);
        vuln.workaround = Some("disable feature".into());
        bom.vulnerabilities = Some(vec![vuln]);
        bom.metadata_mut().licenses = Some(vec![LicenseChoice::id("MIT")]);
        bom
    }

    fn model(bom: &Bom) -> &Component {
        &bom.components.as_ref().unwrap()[0]
    }

    #[test]
    fn test_original_is_untouched() {
        let original = rich_document();
        let snapshot = original.clone();
        let _ = downgrade(&original, SpecVersion::V1_0);
        assert_eq!(original, snapshot);
    }

    #[test]
    fn test_downgrade_to_1_5() {
        let out = downgrade(&rich_document(), SpecVersion::V1_5);
        assert_eq!(out.spec_version, SpecVersion::V1_5);

        let model = model(&out);
        assert_eq!(model.tags, None);
        assert_eq!(model.component_type, ComponentType::MachineLearningModel);
        let identity = model.evidence.as_ref().unwrap().identity.as_ref().unwrap();
        assert_eq!(identity.items.len(), 1);
        assert_eq!(identity.items[0].concluded_value, None);
        assert_eq!(identity.spec_version(), SpecVersion::V1_5);
        assert_eq!(
            model.model_card,
            Some(json!({"considerations": {"users": ["analysts"]}}))
        );
        assert_eq!(
            model.external_references.as_ref().unwrap()[0].reference_type,
            ExternalReferenceType::Other
        );
        let supplier = out.metadata.as_ref().unwrap().supplier.as_ref().unwrap();
        assert_eq!(supplier.address, None);
        assert_eq!(supplier.bom_ref.as_deref(), Some("acme"));
        assert_eq!(out.dependencies.as_ref().unwrap()[0].provides, None);
    }

    #[test]
    fn test_downgrade_to_1_3() {
        let out = downgrade(&rich_document(), SpecVersion::V1_3);

        let model = model(&out);
        assert_eq!(model.component_type, ComponentType::Library);
        assert_eq!(model.model_card, None);
        assert_eq!(model.data, None);
        assert_eq!(model.evidence.as_ref().unwrap().identity, None);
        assert_eq!(out.vulnerabilities, None);
        assert_eq!(
            out.compositions.as_ref().unwrap()[0].aggregate,
            Aggregate::IncompleteThirdPartyOnly
        );
        let tools = out.metadata.as_ref().unwrap().tools.as_ref().unwrap();
        assert_eq!(tools.components, None);
        assert_eq!(tools.spec_version(), SpecVersion::V1_3);
        let license = &out.metadata.as_ref().unwrap().licenses.as_ref().unwrap()[0];
        assert_eq!(license.license.as_ref().unwrap().id.as_deref(), Some("MIT"));

        let unversioned = &out.components.as_ref().unwrap()[1];
        assert_eq!(unversioned.version.as_deref(), Some(DEFAULT_COMPONENT_VERSION));
        assert_eq!(
            out.metadata.as_ref().unwrap().component.as_ref().unwrap().version.as_deref(),
            Some(DEFAULT_COMPONENT_VERSION)
        );
    }

    #[test]
    fn test_version_placeholder_only_below_1_4() {
        let out = downgrade(&rich_document(), SpecVersion::V1_4);
        assert_eq!(out.components.as_ref().unwrap()[1].version, None);
        assert!(out.vulnerabilities.is_some());
        let rating = &out.vulnerabilities.as_ref().unwrap()[0].ratings.as_ref().unwrap()[0];
        assert_eq!(rating.method, Some(ScoreMethod::Other));
        assert_eq!(out.vulnerabilities.as_ref().unwrap()[0].workaround, None);
    }

    #[test]
    fn test_downgrade_to_1_0() {
        let out = downgrade(&rich_document(), SpecVersion::V1_0);

        assert_eq!(out.serial_number, None);
        assert_eq!(out.metadata, None);
        assert_eq!(out.services, None);
        assert_eq!(out.dependencies, None);

        let model = model(&out);
        assert_eq!(model.bom_ref, None);
        assert_eq!(model.external_references, None);
        assert_eq!(
            model.hashes,
            Some(vec![Hash::new(HashAlgorithm::Sha256, "aa")]),
            "hash algorithms newer than the target are dropped"
        );
        assert_eq!(out.components.as_ref().unwrap()[1].scope, None);
    }

    #[test]
    fn test_identity_entries_of_newer_fields_are_dropped() {
        let mut component = lib("x");
        component.evidence = Some(Evidence {
            identity: Some(EvidenceIdentities::new(vec![
                EvidenceIdentity::new(EvidenceField::Swhid),
                EvidenceIdentity::new(EvidenceField::Name),
            ])),
            ..Evidence::default()
        });
        let mut bom = Bom::default();
        bom.components = Some(vec![component]);

        let out = downgrade(&bom, SpecVersion::V1_5);
        let evidence = model(&out).evidence.as_ref().unwrap();
        assert_eq!(evidence.identity, None, "the kept first entry is not representable");
    }

    #[test]
    fn test_current_target_only_retags() {
        let mut bom = rich_document();
        bom.spec_version = SpecVersion::V1_4;
        let out = downgrade(&bom, SpecVersion::CURRENT);
        let mut expected = rich_document();
        expected.spec_version = SpecVersion::CURRENT;
        assert_eq!(out, expected);
    }

    #[test]
    fn test_idempotent_for_every_version() {
        for version in SpecVersion::ALL {
            let once = downgrade(&rich_document(), version);
            let twice = downgrade(&once, version);
            assert_eq!(once, twice, "downgrade to {version} is not idempotent");
        }
    }

    #[test]
    fn test_in_place_matches_copy() {
        let mut bom = rich_document();
        let copy = downgrade(&bom, SpecVersion::V1_2);
        downgrade_in_place(&mut bom, SpecVersion::V1_2);
        assert_eq!(bom, copy);
    }
}
