//! Format detection from document content.
//!
//! Detection looks at the first significant byte and a few markers; it
//! never decodes the whole document.

use super::Format;
use crate::model::SpecVersion;
use regex::Regex;
use std::sync::LazyLock;

static JSON_SPEC_VERSION: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#""specVersion"\s*:\s*"([0-9]+\.[0-9]+)""#).ok());

static XML_NAMESPACE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"cyclonedx\.org/schema/bom/([0-9]+\.[0-9]+)").ok());

/// Confidence of a detection, from 0.0 to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct FormatConfidence(f32);

impl FormatConfidence {
    /// Definitely not a known format
    pub const NONE: Self = Self(0.0);
    /// Right syntax, no CycloneDX markers
    pub const LOW: Self = Self(0.25);
    /// Some CycloneDX markers
    pub const MEDIUM: Self = Self(0.5);
    /// Strong CycloneDX markers
    pub const HIGH: Self = Self(0.75);
    /// Definitely CycloneDX in this format
    pub const CERTAIN: Self = Self(1.0);

    #[must_use]
    pub const fn value(&self) -> f32 {
        self.0
    }
}

/// Outcome of [`detect_format`].
#[derive(Debug, Clone, PartialEq)]
pub struct FormatDetection {
    pub format: Option<Format>,
    pub confidence: FormatConfidence,
    /// Version announced by the content, when it could be read cheaply.
    pub spec_version: Option<SpecVersion>,
}

impl FormatDetection {
    const fn none() -> Self {
        Self {
            format: None,
            confidence: FormatConfidence::NONE,
            spec_version: None,
        }
    }

    const fn found(format: Format, confidence: FormatConfidence) -> Self {
        Self {
            format: Some(format),
            confidence,
            spec_version: None,
        }
    }

    #[must_use]
    pub fn is_cyclonedx(&self) -> bool {
        self.format.is_some() && self.confidence >= FormatConfidence::MEDIUM
    }
}

fn capture_version(pattern: &LazyLock<Option<Regex>>, text: &str) -> Option<SpecVersion> {
    pattern
        .as_ref()?
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Decide which codec should read `bytes`.
#[must_use]
pub fn detect_format(bytes: &[u8]) -> FormatDetection {
    let body = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let Some(start) = body.iter().position(|b| !b.is_ascii_whitespace()) else {
        return FormatDetection::none();
    };

    match body[start] {
        b'{' => detect_json(&String::from_utf8_lossy(&body[start..])),
        b'<' => detect_xml(&String::from_utf8_lossy(&body[start..])),
        // CBOR maps: major type 5, definite or indefinite length.
        0xa0..=0xbf => detect_binary(body),
        _ => FormatDetection::none(),
    }
}

fn detect_json(text: &str) -> FormatDetection {
    let mut detection = if text.contains("\"bomFormat\"") && text.contains("\"CycloneDX\"") {
        FormatDetection::found(Format::Json, FormatConfidence::CERTAIN)
    } else if text.contains("\"specVersion\"") {
        FormatDetection::found(Format::Json, FormatConfidence::MEDIUM)
    } else {
        FormatDetection::found(Format::Json, FormatConfidence::LOW)
    };
    detection.spec_version = capture_version(&JSON_SPEC_VERSION, text);
    detection
}

fn detect_xml(text: &str) -> FormatDetection {
    let version = capture_version(&XML_NAMESPACE, text);
    let mut detection = if version.is_some() {
        FormatDetection::found(Format::Xml, FormatConfidence::CERTAIN)
    } else if text.contains("<bom") || text.contains(":bom") {
        FormatDetection::found(Format::Xml, FormatConfidence::MEDIUM)
    } else {
        FormatDetection::found(Format::Xml, FormatConfidence::LOW)
    };
    detection.spec_version = version;
    detection
}

fn detect_binary(bytes: &[u8]) -> FormatDetection {
    let contains = |needle: &[u8]| bytes.windows(needle.len()).any(|w| w == needle);
    if contains(b"bomFormat") && contains(b"CycloneDX") {
        FormatDetection::found(Format::Binary, FormatConfidence::HIGH)
    } else {
        FormatDetection::none()
    }
}
