//! Compact binary codec.
//!
//! Documents are CBOR maps with the same field names as the JSON form, so
//! the version is read from the `specVersion` entry.

use super::{BomCodec, Format};
use crate::error::{BomError, Result, SerializationErrorKind};
use crate::model::Bom;

/// CBOR codec.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BinaryCodec;

fn invalid(message: impl Into<String>) -> BomError {
    BomError::serialization(
        "binary",
        SerializationErrorKind::InvalidBinary(message.into()),
    )
}

impl BomCodec for BinaryCodec {
    fn format(&self) -> Format {
        Format::Binary
    }

    fn encode(&self, bom: &Bom) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        ciborium::into_writer(bom, &mut bytes).map_err(|e| invalid(e.to_string()))?;
        Ok(bytes)
    }

    fn decode(&self, bytes: &[u8]) -> Result<Bom> {
        let bom: Bom = ciborium::from_reader(bytes).map_err(|e| invalid(e.to_string()))?;
        if !Format::Binary.supports(bom.spec_version) {
            return Err(BomError::unsupported_format_version(
                Format::Binary.to_string(),
                bom.spec_version.as_str(),
            ));
        }
        Ok(bom)
    }
}
