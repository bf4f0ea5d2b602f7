//! Services and their data flows.

use super::capability::{Entity, EntityKind, VersionGated};
use super::{
    DataFlowDirection, ExternalReference, LicenseChoice, OrganizationalEntity, Property,
    SpecVersion,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A networked or otherwise remotely invoked service.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    #[serde(rename = "bom-ref", skip_serializing_if = "Option::is_none")]
    pub bom_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<OrganizationalEntity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoints: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authenticated: Option<bool>,
    #[serde(rename = "x-trust-boundary", skip_serializing_if = "Option::is_none")]
    pub x_trust_boundary: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trust_zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ServiceData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub licenses: Option<Vec<LicenseChoice>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_references: Option<Vec<ExternalReference>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Vec<Property>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub services: Option<Vec<Service>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_notes: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl Service {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_bom_ref(mut self, bom_ref: impl Into<String>) -> Self {
        self.bom_ref = Some(bom_ref.into());
        self
    }

    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

/// The data a service exchanges.
///
/// Before 1.5 each entry was a bare classification with a flow direction.
/// 1.5 grew entries into data flows with names, governance and endpoints.
/// Both shapes live in this one list; when tagged below 1.5 only the
/// classification part is written.
#[derive(Debug, Clone, Default)]
pub struct ServiceData {
    pub flows: Vec<DataFlow>,
    pub(crate) spec_version: SpecVersion,
}

impl ServiceData {
    #[must_use]
    pub fn new(flows: Vec<DataFlow>) -> Self {
        Self {
            flows,
            spec_version: SpecVersion::CURRENT,
        }
    }

    #[must_use]
    pub const fn spec_version(&self) -> SpecVersion {
        self.spec_version
    }
}

impl PartialEq for ServiceData {
    fn eq(&self, other: &Self) -> bool {
        self.flows == other.flows
    }
}

impl Serialize for ServiceData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.spec_version >= SpecVersion::V1_5 {
            return self.flows.serialize(serializer);
        }

        #[derive(Serialize)]
        struct Classification<'a> {
            flow: DataFlowDirection,
            classification: &'a str,
        }

        let legacy: Vec<Classification<'_>> = self
            .flows
            .iter()
            .map(|f| Classification {
                flow: f.flow,
                classification: &f.classification,
            })
            .collect();
        legacy.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ServiceData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<DataFlow>::deserialize(deserializer).map(Self::new)
    }
}

/// One data flow, or a bare classification in pre-1.5 documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataFlow {
    pub flow: DataFlowDirection,
    pub classification: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub governance: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<Vec<String>>,
}

impl DataFlow {
    #[must_use]
    pub fn classification(flow: DataFlowDirection, classification: impl Into<String>) -> Self {
        Self {
            flow,
            classification: classification.into(),
            name: None,
            description: None,
            governance: None,
            source: None,
            destination: None,
        }
    }
}

impl Entity for Service {
    const KIND: EntityKind = EntityKind::Service;
}

impl VersionGated for Service {
    fn clear_field(&mut self, field: &str) -> bool {
        match field {
            "properties" => self.properties = None,
            "releaseNotes" => self.release_notes = None,
            "trustZone" => self.trust_zone = None,
            "tags" => self.tags = None,
            _ => return false,
        }
        true
    }
}

impl Entity for DataFlow {
    const KIND: EntityKind = EntityKind::DataFlow;
}

impl VersionGated for DataFlow {
    fn clear_field(&mut self, field: &str) -> bool {
        match field {
            "name" => self.name = None,
            "description" => self.description = None,
            "governance" => self.governance = None,
            "source" => self.source = None,
            "destination" => self.destination = None,
            _ => return false,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rich_flow() -> DataFlow {
        DataFlow {
            name: Some("telemetry".into()),
            source: Some(vec!["https://client".into()]),
            ..DataFlow::classification(DataFlowDirection::Outbound, "PII")
        }
    }

    #[test]
    fn test_legacy_shape_below_1_5() {
        let mut data = ServiceData::new(vec![rich_flow()]);
        data.spec_version = SpecVersion::V1_4;
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{"flow": "outbound", "classification": "PII"}])
        );
    }

    #[test]
    fn test_dataflow_shape_from_1_5() {
        let data = ServiceData::new(vec![rich_flow()]);
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json[0]["name"], "telemetry");
        assert_eq!(json[0]["source"][0], "https://client");
    }

    #[test]
    fn test_reads_legacy_entries() {
        let data: ServiceData =
            serde_json::from_str(r#"[{"flow":"inbound","classification":"public"}]"#).unwrap();
        assert_eq!(data.flows[0].flow, DataFlowDirection::Inbound);
        assert_eq!(data.flows[0].name, None);
    }
}
