//! The document root, its metadata and tooling records.

use super::capability::{Entity, EntityKind, VersionGated};
use super::{
    Component, Composition, Declarations, Definitions, Dependency, ExternalReference, Hash,
    LicenseChoice, OrganizationalContact, OrganizationalEntity, Property, Service, SpecVersion,
    Vulnerability,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Value of `bomFormat` in every CycloneDX document.
pub const BOM_FORMAT: &str = "CycloneDX";

/// A CycloneDX document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bom {
    #[serde(default = "default_bom_format")]
    pub bom_format: String,
    pub spec_version: SpecVersion,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Vec<Component>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub services: Option<Vec<Service>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_references: Option<Vec<ExternalReference>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Vec<Dependency>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compositions: Option<Vec<Composition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Vec<Property>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vulnerabilities: Option<Vec<Vulnerability>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotations: Option<Vec<Annotation>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formulation: Option<Vec<Formula>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declarations: Option<Declarations>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definitions: Option<Definitions>,
}

fn default_bom_format() -> String {
    BOM_FORMAT.to_string()
}

impl Default for Bom {
    fn default() -> Self {
        Self {
            bom_format: default_bom_format(),
            spec_version: SpecVersion::CURRENT,
            serial_number: None,
            version: Some(1),
            metadata: None,
            components: None,
            services: None,
            external_references: None,
            dependencies: None,
            compositions: None,
            properties: None,
            vulnerabilities: None,
            annotations: None,
            formulation: None,
            declarations: None,
            definitions: None,
        }
    }
}

impl Bom {
    /// An empty document at `spec_version`.
    #[must_use]
    pub fn new(spec_version: SpecVersion) -> Self {
        Self {
            spec_version,
            ..Self::default()
        }
    }

    /// The metadata component, if any.
    #[must_use]
    pub fn metadata_component(&self) -> Option<&Component> {
        self.metadata.as_ref().and_then(|m| m.component.as_ref())
    }

    /// Metadata, created empty when absent.
    pub fn metadata_mut(&mut self) -> &mut Metadata {
        self.metadata.get_or_insert_with(Metadata::default)
    }

    /// Give the document a fresh identity: a new `urn:uuid` serial number,
    /// revision 1 and the current timestamp.
    pub fn refresh_identity(&mut self) {
        self.serial_number = Some(format!("urn:uuid:{}", uuid::Uuid::new_v4()));
        self.version = Some(1);
        self.metadata_mut().timestamp = Some(Utc::now());
    }
}

/// Document-level metadata.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lifecycles: Option<Vec<serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolChoices>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authors: Option<Vec<OrganizationalContact>>,
    /// The subject of the document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<Component>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacture: Option<OrganizationalEntity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<OrganizationalEntity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier: Option<OrganizationalEntity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub licenses: Option<Vec<LicenseChoice>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Vec<Property>>,
}

/// Legacy tool record (superseded by tool components and services in 1.5).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hashes: Option<Vec<Hash>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_references: Option<Vec<ExternalReference>>,
}

impl Tool {
    #[must_use]
    pub fn new(
        vendor: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            vendor: Some(vendor.into()),
            name: Some(name.into()),
            version: Some(version.into()),
            ..Self::default()
        }
    }
}

/// The tools that produced a document or an analysis.
///
/// Read from either the legacy array of [`Tool`] records or the 1.5 object
/// of tool components and services. Written as the legacy array when tagged
/// below 1.5 or when only legacy tools exist, otherwise as the object. The
/// tag is not part of equality.
#[derive(Debug, Clone, Default)]
pub struct ToolChoices {
    pub tools: Option<Vec<Tool>>,
    pub components: Option<Vec<Component>>,
    pub services: Option<Vec<Service>>,
    pub(crate) spec_version: SpecVersion,
}

impl ToolChoices {
    #[must_use]
    pub fn legacy(tools: Vec<Tool>) -> Self {
        Self {
            tools: Some(tools),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn components(components: Vec<Component>) -> Self {
        Self {
            components: Some(components),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn spec_version(&self) -> SpecVersion {
        self.spec_version
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.as_ref().map_or(true, Vec::is_empty)
            && self.components.as_ref().map_or(true, Vec::is_empty)
            && self.services.as_ref().map_or(true, Vec::is_empty)
    }

    fn writes_legacy_array(&self) -> bool {
        let has_modern = self.components.as_ref().is_some_and(|c| !c.is_empty())
            || self.services.as_ref().is_some_and(|s| !s.is_empty());
        self.spec_version < SpecVersion::V1_5 || !has_modern
    }
}

impl PartialEq for ToolChoices {
    fn eq(&self, other: &Self) -> bool {
        self.tools == other.tools
            && self.components == other.components
            && self.services == other.services
    }
}

impl Serialize for ToolChoices {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Modern<'a> {
            #[serde(skip_serializing_if = "Option::is_none")]
            components: Option<&'a Vec<Component>>,
            #[serde(skip_serializing_if = "Option::is_none")]
            services: Option<&'a Vec<Service>>,
        }

        if self.writes_legacy_array() {
            let tools: &[Tool] = self.tools.as_deref().unwrap_or_default();
            return tools.serialize(serializer);
        }
        if self.tools.as_ref().is_some_and(|t| !t.is_empty()) {
            tracing::warn!(
                "legacy tool entries cannot be written next to tool components; dropping them"
            );
        }
        Modern {
            components: self.components.as_ref(),
            services: self.services.as_ref(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ToolChoices {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Modern {
            #[serde(default)]
            components: Option<Vec<Component>>,
            #[serde(default)]
            services: Option<Vec<Service>>,
        }

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Shape {
            Legacy(Vec<Tool>),
            Modern(Modern),
        }

        Ok(match Shape::deserialize(deserializer)? {
            Shape::Legacy(tools) => Self::legacy(tools),
            Shape::Modern(m) => Self {
                tools: None,
                components: m.components,
                services: m.services,
                spec_version: SpecVersion::CURRENT,
            },
        })
    }
}

/// A comment attached to one or more entities.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(rename = "bom-ref", skip_serializing_if = "Option::is_none")]
    pub bom_ref: Option<String>,
    pub subjects: Vec<String>,
    pub annotator: Annotator,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    pub text: String,
}

/// Author of an annotation. Exactly one field is expected to be set.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Annotator {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<OrganizationalEntity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub individual: Option<OrganizationalContact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<Component>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<Service>,
}

/// How a component or service was built, tested or deployed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Formula {
    #[serde(rename = "bom-ref", skip_serializing_if = "Option::is_none")]
    pub bom_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Vec<Component>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub services: Option<Vec<Service>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflows: Option<Vec<serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Vec<Property>>,
}

impl Entity for Bom {
    const KIND: EntityKind = EntityKind::Bom;
}

impl VersionGated for Bom {
    fn clear_field(&mut self, field: &str) -> bool {
        match field {
            "serialNumber" => self.serial_number = None,
            "externalReferences" => self.external_references = None,
            "metadata" => self.metadata = None,
            "dependencies" => self.dependencies = None,
            "services" => self.services = None,
            "compositions" => self.compositions = None,
            "vulnerabilities" => self.vulnerabilities = None,
            "annotations" => self.annotations = None,
            "properties" => self.properties = None,
            "formulation" => self.formulation = None,
            "declarations" => self.declarations = None,
            "definitions" => self.definitions = None,
            _ => return false,
        }
        true
    }
}

impl Entity for Metadata {
    const KIND: EntityKind = EntityKind::Metadata;
}

impl VersionGated for Metadata {
    fn clear_field(&mut self, field: &str) -> bool {
        match field {
            "licenses" => self.licenses = None,
            "properties" => self.properties = None,
            "lifecycles" => self.lifecycles = None,
            "manufacturer" => self.manufacturer = None,
            _ => return false,
        }
        true
    }
}

impl Entity for Tool {
    const KIND: EntityKind = EntityKind::Tool;
}

impl VersionGated for Tool {
    fn clear_field(&mut self, field: &str) -> bool {
        match field {
            "externalReferences" => self.external_references = None,
            _ => return false,
        }
        true
    }
}

impl Entity for ToolChoices {
    const KIND: EntityKind = EntityKind::ToolChoices;
}

impl VersionGated for ToolChoices {
    fn clear_field(&mut self, field: &str) -> bool {
        match field {
            "components" => self.components = None,
            "services" => self.services = None,
            _ => return false,
        }
        true
    }
}

impl Entity for Annotation {
    const KIND: EntityKind = EntityKind::Annotation;
}

impl Entity for Formula {
    const KIND: EntityKind = EntityKind::Formula;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ComponentType;

    #[test]
    fn test_default_document() {
        let bom = Bom::default();
        assert_eq!(bom.bom_format, "CycloneDX");
        assert_eq!(bom.spec_version, SpecVersion::CURRENT);
        assert_eq!(bom.version, Some(1));
    }

    #[test]
    fn test_refresh_identity() {
        let mut bom = Bom::default();
        bom.version = Some(7);
        bom.refresh_identity();
        let serial = bom.serial_number.clone().unwrap();
        assert!(serial.starts_with("urn:uuid:"));
        assert_eq!(bom.version, Some(1));
        assert!(bom.metadata.as_ref().unwrap().timestamp.is_some());

        bom.refresh_identity();
        assert_ne!(bom.serial_number.unwrap(), serial);
    }

    #[test]
    fn test_tool_choices_read_legacy_array() {
        let tools: ToolChoices =
            serde_json::from_str(r#"[{"vendor":"acme","name":"scanner","version":"2"}]"#)
                .unwrap();
        assert_eq!(tools.tools.as_ref().unwrap().len(), 1);
        assert!(tools.components.is_none());
    }

    #[test]
    fn test_tool_choices_read_object() {
        let tools: ToolChoices = serde_json::from_str(
            r#"{"components":[{"type":"application","name":"scanner"}]}"#,
        )
        .unwrap();
        assert!(tools.tools.is_none());
        assert_eq!(tools.components.as_ref().unwrap()[0].name, "scanner");
    }

    #[test]
    fn test_tool_choices_write_shape_follows_tag() {
        let mut tools = ToolChoices::components(vec![Component::new(
            ComponentType::Application,
            "scanner",
        )]);
        assert!(serde_json::to_value(&tools).unwrap().is_object());

        tools.spec_version = SpecVersion::V1_4;
        assert!(serde_json::to_value(&tools).unwrap().is_array());

        let legacy = ToolChoices::legacy(vec![Tool::new("acme", "scanner", "2")]);
        assert!(serde_json::to_value(&legacy).unwrap().is_array());
    }

    #[test]
    fn test_tool_choices_equality_ignores_tag() {
        let a = ToolChoices::legacy(vec![Tool::new("acme", "scanner", "2")]);
        let mut b = a.clone();
        b.spec_version = SpecVersion::V1_2;
        assert_eq!(a, b);
    }
}
