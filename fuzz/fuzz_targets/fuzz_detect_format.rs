#![no_main]
use libfuzzer_sys::fuzz_target;

/// Fuzz format detection and the detect-then-decode path.
fuzz_target!(|data: &[u8]| {
    let detection = cdx_tools::serialization::detect_format(data);
    if detection.is_cyclonedx() {
        let _ = cdx_tools::serialization::deserialize_any(data);
    }
});
