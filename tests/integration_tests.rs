//! End-to-end tests over the model, the downgrade engine, the merge engines
//! and the reference validator, driven by real fixture documents.

use cdx_tools::error::MergeErrorKind;
use cdx_tools::merge::{flat_merge, hierarchical_merge, MergeOptions};
use cdx_tools::model::{Bom, Component, ComponentType, Dependency, EntityKind, SpecVersion};
use cdx_tools::serialization::{self, Format};
use cdx_tools::validate::{validate_references, SchemaValidator, StructuralJsonValidator};
use cdx_tools::{downgrade, ListMergeStrategy};
use serde_json::{json, Value};
use std::path::Path;

// ============================================================================
// Test Fixtures
// ============================================================================

const FIXTURES_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

fn fixture(name: &str) -> Bom {
    let path = Path::new(FIXTURES_DIR).join("cyclonedx").join(name);
    let bytes = std::fs::read(&path).expect("fixture should exist");
    serialization::deserialize_any(&bytes).expect("fixture should decode")
}

/// Merge options that leave identity and tools alone, so results compare.
fn plain() -> MergeOptions {
    MergeOptions::intermediate(ListMergeStrategy::Careful)
}

fn ml_model_document() -> Bom {
    let mut model = Component::new(ComponentType::MachineLearningModel, "sentiment")
        .with_version("4.2")
        .with_bom_ref("sentiment");
    model.model_card = Some(json!({
        "modelParameters": {"task": "text-classification"},
        "quantitativeAnalysis": {"performanceMetrics": [{"type": "accuracy", "value": "0.91"}]}
    }));
    model.data = Some(vec![json!({"type": "dataset", "name": "reviews"})]);

    let mut bom = Bom::new(SpecVersion::V1_5);
    bom.serial_number = Some("urn:uuid:8f4a8c1e-6d0c-4b8e-9a64-3cbbf2b4a001".into());
    bom.components = Some(vec![model]);
    bom
}

// ============================================================================
// Fixture Decoding
// ============================================================================

mod decoding {
    use super::*;

    #[test]
    fn documents_are_tagged_with_their_version() {
        assert_eq!(fixture("web-1.5.cdx.json").spec_version, SpecVersion::V1_5);
        assert_eq!(fixture("api-1.4.cdx.json").spec_version, SpecVersion::V1_4);
        assert_eq!(fixture("legacy-1.2.cdx.xml").spec_version, SpecVersion::V1_2);
    }

    #[test]
    fn xml_nested_dependencies_are_read() {
        let bom = fixture("legacy-1.2.cdx.xml");
        let worker = bom
            .dependencies
            .iter()
            .flatten()
            .find(|d| d.dep_ref == "worker")
            .expect("worker record");
        assert_eq!(
            worker.depends_on(),
            vec!["pkg:npm/left-pad@1.3.0", "base-image"]
        );
        let types: Vec<ComponentType> = bom
            .components
            .iter()
            .flatten()
            .map(|c| c.component_type)
            .collect();
        assert_eq!(types, vec![ComponentType::Library, ComponentType::Container]);
    }

    #[test]
    fn same_version_round_trip_is_lossless() {
        let cases = [
            ("web-1.5.cdx.json", &[Format::Json, Format::Binary][..]),
            ("api-1.4.cdx.json", &[Format::Json, Format::Binary][..]),
            ("legacy-1.2.cdx.xml", &[Format::Xml, Format::Json][..]),
        ];
        for (name, formats) in cases {
            let bom = fixture(name);
            for &format in formats {
                let bytes = serialization::serialize(&bom, format, bom.spec_version).unwrap();
                let back = serialization::deserialize(&bytes, format).unwrap();
                assert_eq!(back, bom, "{name} through {format}");
            }
        }
    }
}

// ============================================================================
// Downgrade Scenarios
// ============================================================================

mod downgrade_scenarios {
    use super::*;

    #[test]
    fn ml_model_round_trips_at_1_5() {
        let bom = ml_model_document();
        let bytes = serialization::serialize(&bom, Format::Json, SpecVersion::V1_5).unwrap();
        let back = serialization::deserialize(&bytes, Format::Json).unwrap();
        assert_eq!(back, bom);
    }

    #[test]
    fn ml_model_loses_new_content_at_1_3() {
        let original = ml_model_document();
        let downgraded = downgrade(&original, SpecVersion::V1_3);

        // The caller's document is untouched.
        assert_eq!(original, ml_model_document());

        let bytes = serialization::serialize(&downgraded, Format::Json, SpecVersion::V1_3).unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(!text.contains("modelCard"));
        assert!(!text.contains("\"data\""));

        let value: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["specVersion"], "1.3");
        assert_eq!(value["components"][0]["type"], "library");

        let report = StructuralJsonValidator.validate(&bytes, SpecVersion::V1_3);
        assert!(report.valid, "{:?}", report.messages);
    }

    #[test]
    fn serializing_at_an_older_version_downgrades() {
        let web = fixture("web-1.5.cdx.json");
        let bytes = serialization::serialize(&web, Format::Json, SpecVersion::V1_2).unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();

        // Tool components are a 1.5 addition; the services survive from 1.2.
        assert!(value["metadata"]["tools"]
            .as_array()
            .map_or(true, Vec::is_empty));
        assert_eq!(value["services"][0]["name"], "session-store");
        assert!(value["components"][0].get("licenses").is_some());
        let report = StructuralJsonValidator.validate(&bytes, SpecVersion::V1_2);
        assert!(report.valid, "{:?}", report.messages);
    }

    #[test]
    fn versionless_components_get_a_placeholder_below_1_4() {
        let mut bom = Bom::new(SpecVersion::V1_6);
        bom.components = Some(vec![Component::new(ComponentType::Library, "unversioned")]);

        let old = downgrade(&bom, SpecVersion::V1_3);
        assert_eq!(
            old.components.unwrap()[0].version.as_deref(),
            Some("0.0.0")
        );
        let recent = downgrade(&bom, SpecVersion::V1_4);
        assert_eq!(recent.components.unwrap()[0].version, None);
    }

    #[test]
    fn binary_is_undefined_below_1_3() {
        let err = serialization::serialize(&fixture("legacy-1.2.cdx.xml"), Format::Binary, SpecVersion::V1_2)
            .unwrap_err();
        assert!(err.is_unsupported_format_version());
    }
}

// ============================================================================
// Merge Scenarios
// ============================================================================

mod merge_scenarios {
    use super::*;

    fn single_component_document() -> Bom {
        let mut bom = Bom::new(SpecVersion::V1_6);
        bom.components = Some(vec![
            Component::new(ComponentType::Library, "zlib").with_version("1.3.1").with_group("madler")
        ]);
        bom
    }

    #[test]
    fn flat_merge_dedupes_identical_components() {
        let boms = vec![single_component_document(); 3];
        let merged = flat_merge(&boms, None, &plain()).unwrap();
        assert_eq!(merged.components.map(|c| c.len()), Some(1));
    }

    #[test]
    fn flat_merge_across_formats_and_versions() {
        let merged = flat_merge(
            &[fixture("web-1.5.cdx.json"), fixture("legacy-1.2.cdx.xml")],
            None,
            &MergeOptions::default(),
        )
        .unwrap();

        assert_eq!(merged.spec_version, SpecVersion::CURRENT);
        let left_pad: Vec<&Component> = merged
            .components
            .iter()
            .flatten()
            .filter(|c| c.name == "left-pad")
            .collect();
        assert_eq!(left_pad.len(), 1);
        // The XML copy had no license; the JSON copy fills it in.
        assert!(left_pad[0].licenses.is_some());
        assert!(merged.serial_number.is_some());
        assert!(validate_references(&merged).is_empty());
    }

    #[test]
    fn flat_merge_reports_conflicting_identifiers() {
        let err = flat_merge(
            &[fixture("web-1.5.cdx.json"), fixture("api-1.4.cdx.json")],
            None,
            &plain(),
        )
        .unwrap_err();
        assert!(matches!(
            err.merge_kind(),
            Some(MergeErrorKind::EntityConflict { .. })
        ));
    }

    #[test]
    fn hierarchical_merge_keeps_colliding_identifiers_apart() {
        let merged = hierarchical_merge(
            &[fixture("web-1.5.cdx.json"), fixture("api-1.4.cdx.json")],
            Some(Component::new(ComponentType::Application, "platform").with_version("1")),
            &plain(),
        )
        .unwrap();

        let refs: Vec<&str> = merged
            .dependencies
            .iter()
            .flatten()
            .map(|d| d.dep_ref.as_str())
            .filter(|r| r.ends_with(":shared-id"))
            .collect();
        assert_eq!(refs, vec!["acme.web@2.4.0:shared-id", "api@5.0.1:shared-id"]);

        let subject = merged
            .dependencies
            .iter()
            .flatten()
            .find(|d| d.dep_ref == "platform@1")
            .expect("subject record");
        assert_eq!(
            subject.depends_on(),
            vec!["acme.web@2.4.0:web", "api@5.0.1:api"]
        );
        assert!(validate_references(&merged).is_empty());
    }

    #[test]
    fn hierarchical_merge_requires_metadata_component() {
        let err = hierarchical_merge(
            &[fixture("broken-refs-1.6.cdx.json")],
            Some(Component::new(ComponentType::Application, "platform")),
            &plain(),
        )
        .unwrap_err();
        assert!(err.is_missing_metadata_component());
    }
}

// ============================================================================
// Reference Validation
// ============================================================================

mod references {
    use super::*;

    #[test]
    fn broken_reference_is_reported_once() {
        let broken = validate_references(&fixture("broken-refs-1.6.cdx.json"));
        assert_eq!(broken.len(), 1);
        assert_eq!(broken[0].reference, "missing-id");
        assert_eq!(broken[0].source, EntityKind::Dependency);
        assert_eq!(
            broken[0].allowed,
            vec![EntityKind::Component, EntityKind::Service]
        );
    }

    #[test]
    fn services_are_not_dependency_targets_before_1_5() {
        let mut bom = fixture("web-1.5.cdx.json");
        assert!(validate_references(&bom).is_empty());

        cdx_tools::retag_version(&mut bom, SpecVersion::V1_4);
        let broken = validate_references(&bom);
        assert_eq!(broken.len(), 1);
        assert_eq!(broken[0].reference, "session-store");
        assert_eq!(broken[0].allowed, vec![EntityKind::Component]);
    }

    #[test]
    fn validator_never_mutates() {
        let bom = fixture("broken-refs-1.6.cdx.json");
        let before = bom.clone();
        let _ = validate_references(&bom);
        assert_eq!(bom, before);
        assert!(validate_references(&Bom::default()).is_empty());
        let _ = Dependency::new("unused");
    }
}
