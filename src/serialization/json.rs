//! CycloneDX JSON codec.

use super::{BomCodec, Format};
use crate::error::{BomError, Result, SerializationErrorKind};
use crate::model::{Bom, SpecVersion, BOM_FORMAT};
use serde_json::Value;

/// JSON codec. Output is indented when `pretty` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsonCodec {
    pub pretty: bool,
}

impl Default for JsonCodec {
    fn default() -> Self {
        Self { pretty: true }
    }
}

impl JsonCodec {
    #[must_use]
    pub const fn compact() -> Self {
        Self { pretty: false }
    }
}

fn invalid(message: impl Into<String>) -> BomError {
    BomError::serialization("JSON", SerializationErrorKind::InvalidJson(message.into()))
}

/// Check the envelope before the typed decode so that version problems
/// surface as such rather than as generic shape errors.
fn check_envelope(document: &Value) -> Result<SpecVersion> {
    let root = document
        .as_object()
        .ok_or_else(|| invalid("document root is not an object"))?;
    match root.get("bomFormat").and_then(Value::as_str) {
        Some(BOM_FORMAT) | None => {}
        Some(other) => return Err(invalid(format!("bomFormat is '{other}'"))),
    }
    let raw = root
        .get("specVersion")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid("missing specVersion"))?;
    raw.parse::<SpecVersion>().map_err(|_| {
        BomError::serialization(
            "JSON",
            SerializationErrorKind::UnsupportedSpecVersion(raw.to_string()),
        )
    })
}

impl BomCodec for JsonCodec {
    fn format(&self) -> Format {
        Format::Json
    }

    fn encode(&self, bom: &Bom) -> Result<Vec<u8>> {
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(bom)?
        } else {
            serde_json::to_vec(bom)?
        };
        Ok(bytes)
    }

    fn decode(&self, bytes: &[u8]) -> Result<Bom> {
        let document: Value = serde_json::from_slice(bytes)?;
        let version = check_envelope(&document)?;
        tracing::trace!(%version, "decoding JSON document");
        Ok(serde_json::from_value(document)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Component, ComponentType, ToolChoices};

    fn sample() -> Bom {
        let mut bom = Bom::new(SpecVersion::V1_6);
        bom.serial_number = Some("urn:uuid:3e671687-395b-41f5-a30f-a58921a69b79".into());
        bom.metadata_mut().tools = Some(ToolChoices::components(vec![Component::new(
            ComponentType::Application,
            "scanner",
        )]));
        bom.components = Some(vec![
            Component::new(ComponentType::Library, "lib").with_version("1.0.0")
        ]);
        bom
    }

    #[test]
    fn test_envelope_is_written() {
        let bytes = JsonCodec::compact().encode(&sample()).unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["bomFormat"], "CycloneDX");
        assert_eq!(value["specVersion"], "1.6");
        assert_eq!(value["components"][0]["name"], "lib");
    }

    #[test]
    fn test_write_and_read_back() {
        let codec = JsonCodec::default();
        let bytes = codec.serialize(&sample(), SpecVersion::V1_6).unwrap();
        let back = codec.deserialize(&bytes).unwrap();
        assert_eq!(back, sample());
    }

    #[test]
    fn test_older_version_writes_legacy_tools() {
        let codec = JsonCodec::compact();
        let bytes = codec.serialize(&sample(), SpecVersion::V1_4).unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["specVersion"], "1.4");
        assert!(value["metadata"]["tools"].is_array());
    }

    #[test]
    fn test_newer_content_is_stripped_at_its_own_tag() {
        let mut model = Component::new(ComponentType::MachineLearningModel, "classifier");
        model.model_card = Some(serde_json::json!({"modelParameters": {}}));
        let mut bom = Bom::new(SpecVersion::V1_3);
        bom.components = Some(vec![model]);

        let bytes = JsonCodec::compact().serialize(&bom, SpecVersion::V1_3).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(!text.contains("modelCard"), "{text}");
        assert!(!text.contains("machine-learning-model"), "{text}");
        assert!(text.contains("classifier"), "{text}");
    }

    #[test]
    fn test_deserialize_tags_version() {
        let input = br#"{
            "bomFormat": "CycloneDX",
            "specVersion": "1.4",
            "version": 1,
            "metadata": {"tools": [{"vendor": "acme", "name": "scan", "version": "1"}]}
        }"#;
        let bom = JsonCodec::default().deserialize(input).unwrap();
        assert_eq!(bom.spec_version, SpecVersion::V1_4);
        let tools = bom.metadata.as_ref().and_then(|m| m.tools.as_ref()).unwrap();
        assert_eq!(tools.spec_version(), SpecVersion::V1_4);
    }

    #[test]
    fn test_unknown_version() {
        let err = JsonCodec::default()
            .decode(br#"{"bomFormat": "CycloneDX", "specVersion": "2.1"}"#)
            .unwrap_err();
        assert_eq!(
            err.serialization_kind(),
            Some(&SerializationErrorKind::UnsupportedSpecVersion("2.1".into()))
        );
    }

    #[test]
    fn test_not_cyclonedx() {
        let err = JsonCodec::default()
            .decode(br#"{"spdxVersion": "SPDX-2.3"}"#)
            .unwrap_err();
        assert!(matches!(
            err.serialization_kind(),
            Some(SerializationErrorKind::InvalidJson(_))
        ));
        assert!(JsonCodec::default().decode(b"[1, 2").is_err());
    }

    #[test]
    fn test_json_below_1_2_is_rejected() {
        let err = JsonCodec::default()
            .serialize(&sample(), SpecVersion::V1_1)
            .unwrap_err();
        assert!(err.is_unsupported_format_version());
    }
}
