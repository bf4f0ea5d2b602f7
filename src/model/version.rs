//! CycloneDX specification versions.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const XML_NAMESPACE_PREFIX: &str = "http://cyclonedx.org/schema/bom/";

/// A CycloneDX specification version.
///
/// Ordering follows release order, so `V1_2 < V1_5`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SpecVersion {
    V1_0,
    V1_1,
    V1_2,
    V1_3,
    V1_4,
    V1_5,
    #[default]
    V1_6,
}

impl SpecVersion {
    /// The newest version this library models.
    pub const CURRENT: Self = Self::V1_6;

    /// Every supported version, oldest first.
    pub const ALL: [Self; 7] = [
        Self::V1_0,
        Self::V1_1,
        Self::V1_2,
        Self::V1_3,
        Self::V1_4,
        Self::V1_5,
        Self::V1_6,
    ];

    /// The `"1.x"` form used by `specVersion` and media types.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::V1_0 => "1.0",
            Self::V1_1 => "1.1",
            Self::V1_2 => "1.2",
            Self::V1_3 => "1.3",
            Self::V1_4 => "1.4",
            Self::V1_5 => "1.5",
            Self::V1_6 => "1.6",
        }
    }

    /// The next newer version, if any.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::V1_0 => Some(Self::V1_1),
            Self::V1_1 => Some(Self::V1_2),
            Self::V1_2 => Some(Self::V1_3),
            Self::V1_3 => Some(Self::V1_4),
            Self::V1_4 => Some(Self::V1_5),
            Self::V1_5 => Some(Self::V1_6),
            Self::V1_6 => None,
        }
    }

    /// Versions strictly newer than `self`, oldest first.
    ///
    /// These are the thresholds a downgrade to `self` has to cross.
    pub fn thresholds_above(self) -> impl Iterator<Item = Self> {
        Self::ALL.into_iter().filter(move |v| *v > self)
    }

    /// XML namespace URI for this version.
    #[must_use]
    pub fn xml_namespace(self) -> String {
        format!("{XML_NAMESPACE_PREFIX}{}", self.as_str())
    }

    /// Resolve a version from its XML namespace URI.
    #[must_use]
    pub fn from_xml_namespace(namespace: &str) -> Option<Self> {
        namespace
            .trim()
            .strip_prefix(XML_NAMESPACE_PREFIX)
            .and_then(|v| v.parse().ok())
    }
}

impl fmt::Display for SpecVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpecVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == s.trim())
            .ok_or_else(|| format!("unsupported CycloneDX version '{s}'"))
    }
}

impl Serialize for SpecVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SpecVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
