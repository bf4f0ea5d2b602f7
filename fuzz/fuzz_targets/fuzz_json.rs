#![no_main]
use cdx_tools::model::SpecVersion;
use cdx_tools::serialization::{BomCodec, JsonCodec};
use libfuzzer_sys::fuzz_target;

const MAX_WRAPPED_INPUT_LEN: usize = 10_000;

/// Fuzz the JSON codec.
///
/// Also wraps the input as a component list so that most runs get past the
/// document envelope. Anything that decodes must encode again at 1.2.
fuzz_target!(|data: &[u8]| {
    let codec = JsonCodec::default();
    if let Ok(bom) = codec.deserialize(data) {
        let _ = codec.serialize(&bom, SpecVersion::V1_2);
    }

    if let Ok(s) = std::str::from_utf8(data) {
        if s.len() < MAX_WRAPPED_INPUT_LEN {
            let wrapped = format!(
                r#"{{"bomFormat":"CycloneDX","specVersion":"1.6","components":[{s}]}}"#,
            );
            if let Ok(bom) = codec.deserialize(wrapped.as_bytes()) {
                let _ = codec.serialize(&bom, SpecVersion::V1_3);
            }
        }
    }
});
