//! Wire formats for CycloneDX documents.
//!
//! Three codecs implement [`BomCodec`]:
//!
//! - [`JsonCodec`] for the JSON form (1.2 and later),
//! - [`XmlCodec`] for the XML form (every version),
//! - [`BinaryCodec`] for a compact CBOR form (1.3 and later).
//!
//! Writing goes through [`BomCodec::serialize`], which rejects format and
//! version pairs without a wire representation and downgrades the document
//! to the requested version first. Reading goes through
//! [`BomCodec::deserialize`], which tags the in-memory document with the
//! version found in the input.
//!
//! ```ignore
//! use cdx_tools::model::SpecVersion;
//! use cdx_tools::serialization::{BomCodec, Format};
//!
//! let bytes = Format::Xml.codec().serialize(&bom, SpecVersion::V1_4)?;
//! let back = cdx_tools::serialization::deserialize_any(&bytes)?;
//! ```

mod binary;
mod detection;
mod json;
mod media_type;
mod traits;
mod xml;

pub use binary::BinaryCodec;
pub use detection::{detect_format, FormatConfidence, FormatDetection};
pub use json::JsonCodec;
pub use media_type::{media_type, parse_media_type};
pub use traits::BomCodec;
pub use xml::XmlCodec;

use crate::error::{BomError, Result, SerializationErrorKind};
use crate::model::{Bom, SpecVersion};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A CycloneDX wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Xml,
    #[default]
    Json,
    Binary,
}

impl Format {
    /// Every format.
    pub const ALL: [Self; 3] = [Self::Xml, Self::Json, Self::Binary];

    /// The oldest version the format is defined for.
    #[must_use]
    pub const fn since(self) -> SpecVersion {
        match self {
            Self::Xml => SpecVersion::V1_0,
            Self::Json => SpecVersion::V1_2,
            Self::Binary => SpecVersion::V1_3,
        }
    }

    /// Whether documents of `version` can be written in this format.
    #[must_use]
    pub fn supports(self, version: SpecVersion) -> bool {
        version >= self.since()
    }

    /// Fails with `UnsupportedFormatVersion` when `version` has no
    /// representation in this format.
    pub fn ensure_supports(self, version: SpecVersion) -> Result<()> {
        if self.supports(version) {
            Ok(())
        } else {
            Err(BomError::unsupported_format_version(
                self.to_string(),
                version.as_str(),
            ))
        }
    }

    /// Conventional file extension.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Xml => "xml",
            Self::Json => "json",
            Self::Binary => "cdx",
        }
    }

    /// The codec for this format with default settings.
    #[must_use]
    pub fn codec(self) -> Box<dyn BomCodec + Send + Sync> {
        match self {
            Self::Xml => Box::new(XmlCodec::default()),
            Self::Json => Box::new(JsonCodec::default()),
            Self::Binary => Box::new(BinaryCodec),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Xml => "XML",
            Self::Json => "JSON",
            Self::Binary => "binary",
        })
    }
}

impl FromStr for Format {
    type Err = BomError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xml" => Ok(Self::Xml),
            "json" => Ok(Self::Json),
            "binary" | "cbor" | "cdx" => Ok(Self::Binary),
            _ => Err(BomError::serialization(
                format!("format name '{s}'"),
                SerializationErrorKind::UnknownFormat,
            )),
        }
    }
}

/// Write `bom` as `format` at `version`.
pub fn serialize(bom: &Bom, format: Format, version: SpecVersion) -> Result<Vec<u8>> {
    format.codec().serialize(bom, version)
}

/// Read a document whose format is known.
pub fn deserialize(bytes: &[u8], format: Format) -> Result<Bom> {
    format.codec().deserialize(bytes)
}

/// Detect the format of `bytes`, then read it.
pub fn deserialize_any(bytes: &[u8]) -> Result<Bom> {
    let detection = detect_format(bytes);
    let format = detection.format.ok_or_else(|| {
        BomError::serialization(
            "detecting document format",
            SerializationErrorKind::UnknownFormat,
        )
    })?;
    tracing::debug!(
        format = %format,
        confidence = detection.confidence.value(),
        "detected document format"
    );
    deserialize(bytes, format)
}
