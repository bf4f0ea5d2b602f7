//! Vulnerability records.

use super::capability::{Entity, EntityKind, VersionGated};
use super::{Property, ScoreMethod, ToolChoices};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A vulnerability and its impact on entities of the document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vulnerability {
    #[serde(rename = "bom-ref", skip_serializing_if = "Option::is_none")]
    pub bom_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<VulnerabilitySource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub references: Option<Vec<VulnerabilityReference>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratings: Option<Vec<Rating>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwes: Option<Vec<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workaround: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof_of_concept: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advisories: Option<Vec<serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejected: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credits: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolChoices>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<VulnerabilityAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affects: Option<Vec<Affects>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Vec<Property>>,
}

impl Vulnerability {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VulnerabilitySource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VulnerabilityReference {
    pub id: String,
    pub source: VulnerabilitySource,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Rating {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<VulnerabilitySource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<ScoreMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub justification: Option<String>,
}

/// Impact analysis of a vulnerability.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VulnerabilityAnalysis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub justification: Option<String>,
    #[serde(rename = "response", skip_serializing_if = "Option::is_none")]
    pub responses: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_issued: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

/// An entity affected by a vulnerability.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Affects {
    #[serde(rename = "ref")]
    pub affects_ref: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub versions: Option<Vec<serde_json::Value>>,
}

impl Affects {
    #[must_use]
    pub fn new(affects_ref: impl Into<String>) -> Self {
        Self {
            affects_ref: affects_ref.into(),
            versions: None,
        }
    }
}

impl Entity for Vulnerability {
    const KIND: EntityKind = EntityKind::Vulnerability;
}

impl VersionGated for Vulnerability {
    fn clear_field(&mut self, field: &str) -> bool {
        match field {
            "rejected" => self.rejected = None,
            "proofOfConcept" => self.proof_of_concept = None,
            "workaround" => self.workaround = None,
            _ => return false,
        }
        true
    }
}

impl Entity for VulnerabilityAnalysis {
    const KIND: EntityKind = EntityKind::VulnerabilityAnalysis;
}

impl VersionGated for VulnerabilityAnalysis {
    fn clear_field(&mut self, field: &str) -> bool {
        match field {
            "firstIssued" => self.first_issued = None,
            "lastUpdated" => self.last_updated = None,
            _ => return false,
        }
        true
    }
}

impl Entity for Affects {
    const KIND: EntityKind = EntityKind::Affects;
}
