//! Unified error types for cdx-tools.
//!
//! This module provides the error hierarchy for the library. Merge and
//! serialization failures carry a chained context string plus a typed kind,
//! so callers can both print a readable trail and match on the cause.

use thiserror::Error;

/// Main error type for cdx-tools operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum BomError {
    /// Errors raised while combining entities or documents
    #[error("Merge failed: {context}")]
    Merge {
        context: String,
        #[source]
        source: MergeErrorKind,
    },

    /// Errors raised by the wire-format codecs
    #[error("Serialization failed: {context}")]
    Serialization {
        context: String,
        #[source]
        source: SerializationErrorKind,
    },
}

/// Specific merge error kinds
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MergeErrorKind {
    /// Two equivalent entities disagree on a field value.
    #[error("conflicting values for {entity}.{field}: {detail}")]
    EntityConflict {
        entity: String,
        field: String,
        detail: String,
    },

    /// Entities of different kinds were handed to the same merge.
    #[error("cannot merge {left} with {right}")]
    IncompatibleEntities { left: String, right: String },

    /// An input document lacks `metadata.component`.
    #[error("{}", missing_metadata_message(.serial_number.as_deref()))]
    MissingMetadataComponent { serial_number: Option<String> },
}

fn missing_metadata_message(serial_number: Option<&str>) -> String {
    match serial_number {
        Some(serial) => {
            format!("Required metadata (top level) component is missing from BOM {serial}.")
        }
        None => "Required metadata (top level) component is missing from BOM.".to_string(),
    }
}

/// Specific serialization error kinds
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SerializationErrorKind {
    #[error("{format} has no representation for specification version {version}")]
    UnsupportedFormatVersion { format: String, version: String },

    #[error("Unsupported specification version: {0}")]
    UnsupportedSpecVersion(String),

    #[error("Unknown document format - expected XML, JSON or binary CycloneDX")]
    UnknownFormat,

    #[error("Invalid JSON structure: {0}")]
    InvalidJson(String),

    #[error("Invalid XML structure: {0}")]
    InvalidXml(String),

    #[error("Invalid binary structure: {0}")]
    InvalidBinary(String),
}

// ============================================================================
// Result type alias
// ============================================================================

/// Convenient Result type for cdx-tools operations
pub type Result<T> = std::result::Result<T, BomError>;

// ============================================================================
// Error construction helpers
// ============================================================================

impl BomError {
    /// Create a merge error with context
    pub fn merge(context: impl Into<String>, source: MergeErrorKind) -> Self {
        Self::Merge {
            context: context.into(),
            source,
        }
    }

    /// Create a serialization error with context
    pub fn serialization(context: impl Into<String>, source: SerializationErrorKind) -> Self {
        Self::Serialization {
            context: context.into(),
            source,
        }
    }

    /// Two equivalent entities disagree on `field`.
    pub fn entity_conflict(
        entity: impl Into<String>,
        field: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self::merge(
            "",
            MergeErrorKind::EntityConflict {
                entity: entity.into(),
                field: field.into(),
                detail: detail.into(),
            },
        )
    }

    /// Entities of different kinds were merged.
    pub fn incompatible_entities(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self::merge(
            "",
            MergeErrorKind::IncompatibleEntities {
                left: left.into(),
                right: right.into(),
            },
        )
    }

    /// A document without `metadata.component` reached a merge that needs one.
    pub fn missing_metadata_component(serial_number: Option<&str>) -> Self {
        Self::merge(
            "",
            MergeErrorKind::MissingMetadataComponent {
                serial_number: serial_number.map(str::to_string),
            },
        )
    }

    /// The requested format cannot represent the requested version.
    pub fn unsupported_format_version(
        format: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self::serialization(
            "",
            SerializationErrorKind::UnsupportedFormatVersion {
                format: format.into(),
                version: version.into(),
            },
        )
    }

    /// The merge error kind, if this is a merge error.
    #[must_use]
    pub const fn merge_kind(&self) -> Option<&MergeErrorKind> {
        match self {
            Self::Merge { source, .. } => Some(source),
            _ => None,
        }
    }

    /// The serialization error kind, if this is a serialization error.
    #[must_use]
    pub const fn serialization_kind(&self) -> Option<&SerializationErrorKind> {
        match self {
            Self::Serialization { source, .. } => Some(source),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_entity_conflict(&self) -> bool {
        matches!(self.merge_kind(), Some(MergeErrorKind::EntityConflict { .. }))
    }

    #[must_use]
    pub const fn is_missing_metadata_component(&self) -> bool {
        matches!(
            self.merge_kind(),
            Some(MergeErrorKind::MissingMetadataComponent { .. })
        )
    }

    #[must_use]
    pub const fn is_unsupported_format_version(&self) -> bool {
        matches!(
            self.serialization_kind(),
            Some(SerializationErrorKind::UnsupportedFormatVersion { .. })
        )
    }
}

// ============================================================================
// Conversions
// ============================================================================

impl From<serde_json::Error> for BomError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(
            "JSON",
            SerializationErrorKind::InvalidJson(err.to_string()),
        )
    }
}

// ============================================================================
// Error context extension trait
// ============================================================================

/// Extension trait for adding context to errors.
///
/// Context strings are prepended to the existing context, so the final
/// message reads outermost first.
///
/// ```ignore
/// use cdx_tools::error::ErrorContext;
///
/// let merged = merge_lists(left, right, ListMergeStrategy::Careful)
///     .with_context(|| format!("merging components of {serial}"))?;
/// ```
pub trait ErrorContext<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context from a closure, evaluated only on the error path.
    fn with_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T, E: Into<BomError>> ErrorContext<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        let ctx: String = context.into();
        self.map_err(|e| add_context_to_error(e.into(), &ctx))
    }

    fn with_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.map_err(|e| {
            let ctx: String = f().into();
            add_context_to_error(e.into(), &ctx)
        })
    }
}

/// Add context to an error, chaining with any existing context.
fn add_context_to_error(err: BomError, new_ctx: &str) -> BomError {
    match err {
        BomError::Merge {
            context: existing,
            source,
        } => BomError::Merge {
            context: chain_context(new_ctx, &existing),
            source,
        },
        BomError::Serialization {
            context: existing,
            source,
        } => BomError::Serialization {
            context: chain_context(new_ctx, &existing),
            source,
        },
    }
}

/// Chain two context strings together.
///
/// If the existing context is empty, returns just the new context.
/// Otherwise, returns "`new_context`: `existing_context`".
fn chain_context(new: &str, existing: &str) -> String {
    if existing.is_empty() {
        new.to_string()
    } else {
        format!("{new}: {existing}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BomError::entity_conflict("Component", "version", "1.0 vs 2.0");
        let display = err.to_string();
        assert!(display.contains("Merge"), "{display}");

        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(
            source.as_deref(),
            Some("conflicting values for Component.version: 1.0 vs 2.0")
        );
    }

    #[test]
    fn test_missing_metadata_message_names_serial() {
        let with_serial = MergeErrorKind::MissingMetadataComponent {
            serial_number: Some("urn:uuid:1234".to_string()),
        };
        assert_eq!(
            with_serial.to_string(),
            "Required metadata (top level) component is missing from BOM urn:uuid:1234."
        );

        let without = MergeErrorKind::MissingMetadataComponent {
            serial_number: None,
        };
        assert!(without.to_string().ends_with("missing from BOM."));
    }

    #[test]
    fn test_predicates() {
        assert!(BomError::missing_metadata_component(None).is_missing_metadata_component());
        assert!(BomError::unsupported_format_version("Binary", "1.2").is_unsupported_format_version());
        assert!(BomError::entity_conflict("Hash", "content", "x").is_entity_conflict());
        assert!(!BomError::incompatible_entities("Component", "Service").is_entity_conflict());
        assert!(!BomError::entity_conflict("Hash", "content", "x").is_unsupported_format_version());
    }

    #[test]
    fn test_context_chaining() {
        let initial_err: Result<()> = Err(BomError::merge(
            "initial context",
            MergeErrorKind::IncompatibleEntities {
                left: "Component".into(),
                right: "Service".into(),
            },
        ));

        let err_with_context = initial_err.context("outer context");

        match err_with_context {
            Err(BomError::Merge { context, .. }) => {
                assert_eq!(context, "outer context: initial context");
            }
            _ => panic!("Expected Merge error"),
        }
    }

    #[test]
    fn test_context_reaches_serialization_errors() {
        let err: Result<()> =
            Err(BomError::unsupported_format_version("binary", "1.2")).context("writing merged.cdx");
        let err = err.unwrap_err();
        assert_eq!(err.to_string(), "Serialization failed: writing merged.cdx");
        assert!(err.is_unsupported_format_version());
    }

    #[test]
    fn test_context_chaining_multiple_levels() {
        fn inner() -> Result<()> {
            Err(BomError::entity_conflict("Hash", "content", "a vs b"))
        }

        fn middle() -> Result<()> {
            inner().context("middle layer")
        }

        fn outer() -> Result<()> {
            middle().context("outer layer")
        }

        match outer() {
            Err(BomError::Merge { context, source }) => {
                assert_eq!(context, "outer layer: middle layer");
                assert!(matches!(source, MergeErrorKind::EntityConflict { .. }));
            }
            _ => panic!("Expected Merge error"),
        }
    }

    #[test]
    fn test_with_context_lazy_evaluation() {
        let mut called = false;

        let ok_result: Result<i32> = Ok(42);
        let _ = ok_result.with_context(|| {
            called = true;
            "should not be called"
        });
        assert!(!called, "Closure should not be called for Ok result");

        let err_result: Result<i32> = Err(BomError::missing_metadata_component(None));
        let _ = err_result.with_context(|| {
            called = true;
            "should be called"
        });
        assert!(called, "Closure should be called for Err result");
    }

    #[test]
    fn test_serde_json_conversion() {
        let err: BomError = serde_json::from_str::<serde_json::Value>("{")
            .map_err(BomError::from)
            .unwrap_err();
        assert!(matches!(
            err.serialization_kind(),
            Some(SerializationErrorKind::InvalidJson(_))
        ));
    }

    #[test]
    fn test_chain_context_helper() {
        assert_eq!(chain_context("new", ""), "new");
        assert_eq!(chain_context("new", "existing"), "new: existing");
        assert_eq!(
            chain_context("outer", "middle: inner"),
            "outer: middle: inner"
        );
    }
}
