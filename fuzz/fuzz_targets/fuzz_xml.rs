#![no_main]
use cdx_tools::model::SpecVersion;
use cdx_tools::serialization::{BomCodec, XmlCodec};
use libfuzzer_sys::fuzz_target;

const MAX_WRAPPED_INPUT_LEN: usize = 10_000;

/// Fuzz the XML codec, raw and inside a 1.4 document envelope.
fuzz_target!(|data: &[u8]| {
    let codec = XmlCodec::default();
    if let Ok(bom) = codec.deserialize(data) {
        let _ = codec.serialize(&bom, SpecVersion::V1_0);
    }

    if let Ok(s) = std::str::from_utf8(data) {
        if s.len() < MAX_WRAPPED_INPUT_LEN {
            let wrapped = format!(
                r#"<?xml version="1.0"?><bom xmlns="http://cyclonedx.org/schema/bom/1.4" version="1"><components>{s}</components></bom>"#,
            );
            if let Ok(bom) = codec.deserialize(wrapped.as_bytes()) {
                let _ = codec.serialize(&bom, SpecVersion::V1_4);
            }
        }
    }
});
