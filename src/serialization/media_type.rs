//! Media types of the CycloneDX formats.

use super::Format;
use crate::error::{BomError, Result, SerializationErrorKind};
use crate::model::SpecVersion;

const XML_MEDIA_TYPE: &str = "application/vnd.cyclonedx+xml";
const JSON_MEDIA_TYPE: &str = "application/vnd.cyclonedx+json";
const BINARY_MEDIA_TYPE: &str = "application/x.vnd.cyclonedx+cbor";

const fn base(format: Format) -> &'static str {
    match format {
        Format::Xml => XML_MEDIA_TYPE,
        Format::Json => JSON_MEDIA_TYPE,
        Format::Binary => BINARY_MEDIA_TYPE,
    }
}

/// The media type of `format` at `version`, e.g.
/// `application/vnd.cyclonedx+json; version=1.5`.
///
/// # Errors
///
/// `UnsupportedFormatVersion` for JSON below 1.2 and binary below 1.3.
pub fn media_type(format: Format, version: SpecVersion) -> Result<String> {
    format.ensure_supports(version)?;
    Ok(format!("{}; version={version}", base(format)))
}

/// Parse a media type back to its format and, when given, its version.
///
/// Parameters other than `version` are ignored.
///
/// # Errors
///
/// `UnknownFormat` for media types that are not CycloneDX;
/// `UnsupportedSpecVersion` for an unknown `version` parameter.
pub fn parse_media_type(value: &str) -> Result<(Format, Option<SpecVersion>)> {
    let mut parts = value.split(';').map(str::trim);
    let essence = parts.next().unwrap_or_default().to_ascii_lowercase();
    let format = Format::ALL
        .into_iter()
        .find(|f| base(*f) == essence)
        .ok_or_else(|| {
            BomError::serialization(
                format!("media type '{value}'"),
                SerializationErrorKind::UnknownFormat,
            )
        })?;

    let mut version = None;
    for parameter in parts {
        let Some((key, raw)) = parameter.split_once('=') else {
            continue;
        };
        if key.trim().eq_ignore_ascii_case("version") {
            let raw = raw.trim().trim_matches('"');
            let parsed = raw.parse::<SpecVersion>().map_err(|_| {
                BomError::serialization(
                    format!("media type '{value}'"),
                    SerializationErrorKind::UnsupportedSpecVersion(raw.to_string()),
                )
            })?;
            version = Some(parsed);
        }
    }
    Ok((format, version))
}
