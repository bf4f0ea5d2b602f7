//! License choices.

use super::capability::{Entity, EntityKind, VersionGated};
use super::Property;
use serde::{Deserialize, Serialize};

/// One entry of a `licenses` list: either a single license or an SPDX expression.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LicenseChoice {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<License>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
    /// Identifier of an expression entry.
    #[serde(rename = "bom-ref", skip_serializing_if = "Option::is_none")]
    pub bom_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acknowledgement: Option<String>,
}

impl LicenseChoice {
    #[must_use]
    pub fn id(spdx_id: impl Into<String>) -> Self {
        Self {
            license: Some(License {
                id: Some(spdx_id.into()),
                ..License::default()
            }),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn expression(expression: impl Into<String>) -> Self {
        Self {
            expression: Some(expression.into()),
            ..Self::default()
        }
    }
}

/// A single license by SPDX id or free-form name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct License {
    #[serde(rename = "bom-ref", skip_serializing_if = "Option::is_none")]
    pub bom_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acknowledgement: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub licensing: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Vec<Property>>,
}

impl Entity for LicenseChoice {
    const KIND: EntityKind = EntityKind::LicenseChoice;
}

impl VersionGated for LicenseChoice {
    fn clear_field(&mut self, field: &str) -> bool {
        match field {
            "bom-ref" => self.bom_ref = None,
            "acknowledgement" => self.acknowledgement = None,
            _ => return false,
        }
        true
    }
}

impl Entity for License {
    const KIND: EntityKind = EntityKind::License;
}

impl VersionGated for License {
    fn clear_field(&mut self, field: &str) -> bool {
        match field {
            "bom-ref" => self.bom_ref = None,
            "acknowledgement" => self.acknowledgement = None,
            "licensing" => self.licensing = None,
            "properties" => self.properties = None,
            _ => return false,
        }
        true
    }
}
