//! Schema validation interface.
//!
//! Full JSON-schema and XSD validation is left to external validators that
//! implement [`SchemaValidator`]. [`StructuralJsonValidator`] checks the
//! CycloneDX envelope and the version gating of document and component
//! fields, which is what the downgrade and codec tests need.

use super::report::is_valid_serial_number;
use crate::model::{is_field_available, EntityKind, SpecVersion};
use crate::serialization::Format;
use serde::Serialize;
use serde_json::Value;

/// Outcome of a schema validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemaValidation {
    pub valid: bool,
    pub messages: Vec<String>,
}

impl SchemaValidation {
    fn from_messages(messages: Vec<String>) -> Self {
        Self {
            valid: messages.is_empty(),
            messages,
        }
    }
}

/// Validates serialized documents against the schema of a version.
pub trait SchemaValidator {
    fn validate(&self, bytes: &[u8], version: SpecVersion) -> SchemaValidation;
}

/// Structural checks on CycloneDX JSON documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralJsonValidator;

impl SchemaValidator for StructuralJsonValidator {
    fn validate(&self, bytes: &[u8], version: SpecVersion) -> SchemaValidation {
        if !Format::Json.supports(version) {
            return SchemaValidation::from_messages(vec![format!(
                "JSON is not defined for CycloneDX {version}"
            )]);
        }
        let document: Value = match serde_json::from_slice(bytes) {
            Ok(value) => value,
            Err(e) => return SchemaValidation::from_messages(vec![format!("invalid JSON: {e}")]),
        };
        let Some(root) = document.as_object() else {
            return SchemaValidation::from_messages(vec!["document is not an object".into()]);
        };

        let mut messages = Vec::new();
        if root.get("bomFormat").and_then(Value::as_str) != Some("CycloneDX") {
            messages.push("bomFormat must be \"CycloneDX\"".to_string());
        }
        match root.get("specVersion").and_then(Value::as_str) {
            Some(declared) if declared == version.as_str() => {}
            Some(declared) => messages.push(format!(
                "specVersion {declared} does not match expected {version}"
            )),
            None => messages.push("specVersion is missing".to_string()),
        }
        if let Some(serial) = root.get("serialNumber") {
            if !serial.as_str().is_some_and(is_valid_serial_number) {
                messages.push(format!("serialNumber {serial} is not a urn:uuid"));
            }
        }
        if let Some(revision) = root.get("version") {
            if !revision.as_u64().is_some_and(|v| v >= 1) {
                messages.push(format!("version {revision} is not a positive integer"));
            }
        }
        check_fields(root, EntityKind::Bom, version, "$", &mut messages);
        check_components(root, version, &mut messages);
        check_dependencies(root, &mut messages);

        SchemaValidation::from_messages(messages)
    }
}

fn check_fields(
    object: &serde_json::Map<String, Value>,
    kind: EntityKind,
    version: SpecVersion,
    path: &str,
    messages: &mut Vec<String>,
) {
    for key in object.keys() {
        if !is_field_available(kind, key, version) {
            messages.push(format!("{path}.{key} is not allowed in CycloneDX {version}"));
        }
    }
}

fn check_components(
    root: &serde_json::Map<String, Value>,
    version: SpecVersion,
    messages: &mut Vec<String>,
) {
    let mut stack: Vec<(String, &Value)> = Vec::new();
    if let Some(component) = root.get("metadata").and_then(|m| m.get("component")) {
        stack.push(("$.metadata.component".to_string(), component));
    }
    if let Some(components) = root.get("components").and_then(Value::as_array) {
        for (i, component) in components.iter().enumerate().rev() {
            stack.push((format!("$.components[{i}]"), component));
        }
    }

    while let Some((path, component)) = stack.pop() {
        let Some(object) = component.as_object() else {
            messages.push(format!("{path} is not an object"));
            continue;
        };
        for required in ["type", "name"] {
            if !object.get(required).is_some_and(Value::is_string) {
                messages.push(format!("{path}.{required} is required"));
            }
        }
        if version < SpecVersion::V1_4 && !object.get("version").is_some_and(Value::is_string) {
            messages.push(format!("{path}.version is required before 1.4"));
        }
        check_fields(object, EntityKind::Component, version, &path, messages);

        if let Some(children) = object.get("components").and_then(Value::as_array) {
            for (i, child) in children.iter().enumerate().rev() {
                stack.push((format!("{path}.components[{i}]"), child));
            }
        }
        if let Some(pedigree) = object.get("pedigree") {
            for list in ["ancestors", "descendants", "variants"] {
                if let Some(items) = pedigree.get(list).and_then(Value::as_array) {
                    for (i, item) in items.iter().enumerate().rev() {
                        stack.push((format!("{path}.pedigree.{list}[{i}]"), item));
                    }
                }
            }
        }
    }
}

fn check_dependencies(root: &serde_json::Map<String, Value>, messages: &mut Vec<String>) {
    let Some(dependencies) = root.get("dependencies").and_then(Value::as_array) else {
        return;
    };
    for (i, dependency) in dependencies.iter().enumerate() {
        if !dependency.get("ref").is_some_and(Value::is_string) {
            messages.push(format!("$.dependencies[{i}].ref is required"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn check(document: &Value, version: SpecVersion) -> SchemaValidation {
        StructuralJsonValidator.validate(document.to_string().as_bytes(), version)
    }

    #[test]
    fn test_minimal_document_is_valid() {
        let result = check(
            &json!({"bomFormat": "CycloneDX", "specVersion": "1.6", "version": 1}),
            SpecVersion::V1_6,
        );
        assert!(result.valid, "{:?}", result.messages);
    }

    #[test]
    fn test_gated_fields_are_reported() {
        let document = json!({
            "bomFormat": "CycloneDX",
            "specVersion": "1.3",
            "vulnerabilities": [],
            "components": [{
                "type": "library",
                "name": "x",
                "version": "1",
                "components": [{"type": "library", "name": "y", "modelCard": {}}]
            }]
        });
        let result = check(&document, SpecVersion::V1_3);
        assert!(!result.valid);
        assert_eq!(
            result.messages,
            vec![
                "$.vulnerabilities is not allowed in CycloneDX 1.3",
                "$.components[0].components[0].version is required before 1.4",
                "$.components[0].components[0].modelCard is not allowed in CycloneDX 1.3",
            ]
        );
    }

    #[test]
    fn test_envelope_errors() {
        let result = check(&json!({"specVersion": "1.5"}), SpecVersion::V1_6);
        assert_eq!(result.messages.len(), 2);

        let result = StructuralJsonValidator.validate(b"not json", SpecVersion::V1_6);
        assert!(!result.valid);

        let result = check(&json!({}), SpecVersion::V1_1);
        assert_eq!(result.messages, vec!["JSON is not defined for CycloneDX 1.1"]);
    }
}
