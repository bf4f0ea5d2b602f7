//! Leaf entities shared across the document tree.

use super::capability::{Entity, EntityKind, VersionGated};
use super::{ExternalReferenceType, HashAlgorithm};
use serde::{Deserialize, Serialize};

/// A file or content digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hash {
    pub alg: HashAlgorithm,
    pub content: String,
}

impl Hash {
    #[must_use]
    pub fn new(alg: HashAlgorithm, content: impl Into<String>) -> Self {
        Self {
            alg,
            content: content.into(),
        }
    }
}

/// Name/value extension property.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Property {
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }
}

/// Pointer to a resource outside the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalReference {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(rename = "type")]
    pub reference_type: ExternalReferenceType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hashes: Option<Vec<Hash>>,
}

impl ExternalReference {
    #[must_use]
    pub fn new(reference_type: ExternalReferenceType, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            comment: None,
            reference_type,
            hashes: None,
        }
    }
}

/// An organization such as a supplier or manufacturer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OrganizationalEntity {
    #[serde(rename = "bom-ref", skip_serializing_if = "Option::is_none")]
    pub bom_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<Vec<OrganizationalContact>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<serde_json::Value>,
}

impl OrganizationalEntity {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

/// A person, usually an author or point of contact.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OrganizationalContact {
    #[serde(rename = "bom-ref", skip_serializing_if = "Option::is_none")]
    pub bom_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl Entity for Hash {
    const KIND: EntityKind = EntityKind::Hash;
}

impl Entity for Property {
    const KIND: EntityKind = EntityKind::Property;
}

impl Entity for ExternalReference {
    const KIND: EntityKind = EntityKind::ExternalReference;
}

impl VersionGated for ExternalReference {
    fn clear_field(&mut self, field: &str) -> bool {
        match field {
            "hashes" => self.hashes = None,
            _ => return false,
        }
        true
    }
}

impl Entity for OrganizationalEntity {
    const KIND: EntityKind = EntityKind::OrganizationalEntity;
}

impl VersionGated for OrganizationalEntity {
    fn clear_field(&mut self, field: &str) -> bool {
        match field {
            "bom-ref" => self.bom_ref = None,
            "address" => self.address = None,
            _ => return false,
        }
        true
    }
}

impl Entity for OrganizationalContact {
    const KIND: EntityKind = EntityKind::OrganizationalContact;
}

impl VersionGated for OrganizationalContact {
    fn clear_field(&mut self, field: &str) -> bool {
        match field {
            "bom-ref" => self.bom_ref = None,
            _ => return false,
        }
        true
    }
}
