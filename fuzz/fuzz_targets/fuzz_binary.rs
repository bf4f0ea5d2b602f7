#![no_main]
use cdx_tools::model::SpecVersion;
use cdx_tools::serialization::{BinaryCodec, BomCodec};
use libfuzzer_sys::fuzz_target;

/// Fuzz the CBOR codec. Decoded documents are written back at 1.3.
fuzz_target!(|data: &[u8]| {
    if let Ok(bom) = BinaryCodec.deserialize(data) {
        let _ = BinaryCodec.serialize(&bom, SpecVersion::V1_3);
    }
});
