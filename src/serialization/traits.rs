//! The codec trait shared by every wire format.

use super::Format;
use crate::downgrade::downgrade;
use crate::error::Result;
use crate::model::{retag_version, Bom, SpecVersion};

/// Encodes and decodes documents in one wire format.
///
/// Implementors provide the raw [`encode`](Self::encode) and
/// [`decode`](Self::decode) steps; the provided methods add the version
/// handling every format needs.
pub trait BomCodec {
    /// The format this codec handles.
    fn format(&self) -> Format;

    /// Encode a document exactly as tagged.
    fn encode(&self, bom: &Bom) -> Result<Vec<u8>>;

    /// Decode a document. `spec_version` holds the version found in the
    /// input; version-shaped children may still carry another tag.
    fn decode(&self, bytes: &[u8]) -> Result<Bom>;

    /// Write `bom` at `version`. A copy is always downgraded first, since a
    /// document's tag says nothing about the fields it holds.
    ///
    /// # Errors
    ///
    /// `UnsupportedFormatVersion` when the format has no representation
    /// for `version`; encoding errors otherwise.
    fn serialize(&self, bom: &Bom, version: SpecVersion) -> Result<Vec<u8>> {
        self.format().ensure_supports(version)?;
        tracing::debug!(
            from = %bom.spec_version,
            to = %version,
            format = %self.format(),
            "downgrading before write"
        );
        self.encode(&downgrade(bom, version))
    }

    /// Read a document and tag it with the version found in the input.
    fn deserialize(&self, bytes: &[u8]) -> Result<Bom> {
        let mut bom = self.decode(bytes)?;
        let version = bom.spec_version;
        retag_version(&mut bom, version);
        Ok(bom)
    }
}
