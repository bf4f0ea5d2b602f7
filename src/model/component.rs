//! Components and their pedigree and evidence.

use super::capability::{Entity, EntityKind, VersionGated};
use super::{
    ComponentScope, ComponentType, EvidenceField, ExternalReference, Hash, LicenseChoice,
    OrganizationalContact, OrganizationalEntity, Property, SpecVersion,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A piece of software, hardware or data.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    #[serde(rename = "type")]
    pub component_type: ComponentType,
    #[serde(rename = "mime-type", skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(rename = "bom-ref", skip_serializing_if = "Option::is_none")]
    pub bom_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier: Option<OrganizationalEntity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<OrganizationalEntity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authors: Option<Vec<OrganizationalContact>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<ComponentScope>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hashes: Option<Vec<Hash>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub licenses: Option<Vec<LicenseChoice>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copyright: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpe: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purl: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub omnibor_id: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swhid: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swid: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pedigree: Option<Pedigree>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_references: Option<Vec<ExternalReference>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Vec<Property>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Vec<Component>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<Evidence>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_notes: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_card: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crypto_properties: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl Component {
    #[must_use]
    pub fn new(component_type: ComponentType, name: impl Into<String>) -> Self {
        Self {
            component_type,
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    #[must_use]
    pub fn with_bom_ref(mut self, bom_ref: impl Into<String>) -> Self {
        self.bom_ref = Some(bom_ref.into());
        self
    }

    #[must_use]
    pub fn with_purl(mut self, purl: impl Into<String>) -> Self {
        self.purl = Some(purl.into());
        self
    }

    /// `group.name@version`, or `name@version` without a group.
    ///
    /// Used as the namespace of a document when merging hierarchically.
    #[must_use]
    pub fn namespace(&self) -> String {
        let version = self.version.as_deref().unwrap_or_default();
        match self.group.as_deref() {
            Some(group) if !group.is_empty() => format!("{group}.{}@{version}", self.name),
            _ => format!("{}@{version}", self.name),
        }
    }
}

/// Ancestry of a component.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Pedigree {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ancestors: Option<Vec<Component>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descendants: Option<Vec<Component>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variants: Option<Vec<Component>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commits: Option<Vec<serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patches: Option<Vec<serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Evidence collected about a component.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Evidence {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<EvidenceIdentities>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occurrences: Option<Vec<serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callstack: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub licenses: Option<Vec<LicenseChoice>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copyright: Option<Vec<serde_json::Value>>,
}

/// Identity evidence list.
///
/// 1.5 documents carry a single object, 1.6 documents an array. The wire
/// shape follows the tagged version, which [`super::retag_version`] keeps in
/// step with the owning document. The tag is not part of equality.
#[derive(Debug, Clone, Default)]
pub struct EvidenceIdentities {
    pub items: Vec<EvidenceIdentity>,
    pub(crate) spec_version: SpecVersion,
}

impl EvidenceIdentities {
    #[must_use]
    pub fn new(items: Vec<EvidenceIdentity>) -> Self {
        Self {
            items,
            spec_version: SpecVersion::CURRENT,
        }
    }

    #[must_use]
    pub const fn spec_version(&self) -> SpecVersion {
        self.spec_version
    }
}

impl PartialEq for EvidenceIdentities {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl Serialize for EvidenceIdentities {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.items.first() {
            Some(first) if self.spec_version < SpecVersion::V1_6 => first.serialize(serializer),
            _ => self.items.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for EvidenceIdentities {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Shape {
            Many(Vec<EvidenceIdentity>),
            One(EvidenceIdentity),
        }

        let items = match Shape::deserialize(deserializer)? {
            Shape::Many(items) => items,
            Shape::One(item) => vec![item],
        };
        Ok(Self::new(items))
    }
}

/// Evidence supporting one identity field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceIdentity {
    pub field: EvidenceField,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concluded_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub methods: Option<Vec<serde_json::Value>>,
    /// References to the components or services that produced the evidence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<String>>,
}

impl EvidenceIdentity {
    #[must_use]
    pub const fn new(field: EvidenceField) -> Self {
        Self {
            field,
            confidence: None,
            concluded_value: None,
            methods: None,
            tools: None,
        }
    }
}

impl Entity for Component {
    const KIND: EntityKind = EntityKind::Component;
}

impl VersionGated for Component {
    fn clear_field(&mut self, field: &str) -> bool {
        match field {
            "bom-ref" => self.bom_ref = None,
            "pedigree" => self.pedigree = None,
            "externalReferences" => self.external_references = None,
            "author" => self.author = None,
            "mimeType" => self.mime_type = None,
            "supplier" => self.supplier = None,
            "swid" => self.swid = None,
            "properties" => self.properties = None,
            "evidence" => self.evidence = None,
            "releaseNotes" => self.release_notes = None,
            "modelCard" => self.model_card = None,
            "data" => self.data = None,
            "cryptoProperties" => self.crypto_properties = None,
            "tags" => self.tags = None,
            "omniborId" => self.omnibor_id = None,
            "swhid" => self.swhid = None,
            "authors" => self.authors = None,
            "manufacturer" => self.manufacturer = None,
            _ => return false,
        }
        true
    }
}

impl Entity for Pedigree {
    const KIND: EntityKind = EntityKind::Pedigree;
}

impl VersionGated for Pedigree {
    fn clear_field(&mut self, field: &str) -> bool {
        match field {
            "patches" => self.patches = None,
            _ => return false,
        }
        true
    }
}

impl Entity for Evidence {
    const KIND: EntityKind = EntityKind::Evidence;
}

impl VersionGated for Evidence {
    fn clear_field(&mut self, field: &str) -> bool {
        match field {
            "identity" => self.identity = None,
            "occurrences" => self.occurrences = None,
            "callstack" => self.callstack = None,
            _ => return false,
        }
        true
    }
}

impl Entity for EvidenceIdentity {
    const KIND: EntityKind = EntityKind::EvidenceIdentity;
}

impl VersionGated for EvidenceIdentity {
    fn clear_field(&mut self, field: &str) -> bool {
        match field {
            "concludedValue" => self.concluded_value = None,
            _ => return false,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace() {
        let plain = Component::new(ComponentType::Application, "app").with_version("1.0");
        assert_eq!(plain.namespace(), "app@1.0");

        let grouped = plain.clone().with_group("org.acme");
        assert_eq!(grouped.namespace(), "org.acme.app@1.0");
    }

    #[test]
    fn test_identity_reads_both_shapes() {
        let one: EvidenceIdentities =
            serde_json::from_str(r#"{"field":"purl","confidence":1}"#).unwrap();
        assert_eq!(one.items.len(), 1);

        let many: EvidenceIdentities =
            serde_json::from_str(r#"[{"field":"purl"},{"field":"name"}]"#).unwrap();
        assert_eq!(many.items.len(), 2);
    }

    #[test]
    fn test_identity_writes_shape_for_version() {
        let mut ids = EvidenceIdentities::new(vec![EvidenceIdentity::new(EvidenceField::Name)]);
        assert!(serde_json::to_value(&ids).unwrap().is_array());

        ids.spec_version = SpecVersion::V1_5;
        assert!(serde_json::to_value(&ids).unwrap().is_object());
    }

    #[test]
    fn test_identity_equality_ignores_tag() {
        let a = EvidenceIdentities::new(vec![EvidenceIdentity::new(EvidenceField::Cpe)]);
        let mut b = a.clone();
        b.spec_version = SpecVersion::V1_5;
        assert_eq!(a, b);
    }
}
