//! **Read, merge, downgrade and write CycloneDX documents from 1.0 to 1.6.**
//!
//! `cdx-tools` holds one in-memory model for every CycloneDX version. Documents
//! are decoded from XML, JSON or the binary (CBOR) form, merged, checked for
//! dangling references, and written back at any version the target format
//! defines. Writing at an older version first strips what that version
//! cannot express.
//!
//! ## Core Concepts & Modules
//!
//! - **[`model`]**: the document model and the field availability table
//!   ([`model::FIELD_AVAILABILITY`]) that says from which version each
//!   field exists.
//! - **[`entity`]**: equality, equivalence and field-by-field merging of
//!   entities, and [`merge_lists`] for whole lists.
//! - **[`downgrade`]**: [`downgrade`] rewrites a document for an older
//!   version.
//! - **[`merge`]**: [`flat_merge`] and [`hierarchical_merge`].
//! - **[`validate`]**: reference checks and a document report.
//! - **[`serialization`]**: the three codecs, format detection and media types.
//! - **[`pipeline`]**: load → merge → check → write, driven by [`AppConfig`].
//!
//! ## Merging two documents
//!
//! ```no_run
//! use cdx_tools::{flat_merge, serialization, Format, MergeOptions, SpecVersion};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let left = serialization::deserialize_any(&std::fs::read("left.cdx.json")?)?;
//!     let right = serialization::deserialize_any(&std::fs::read("right.cdx.xml")?)?;
//!
//!     let merged = flat_merge(&[left, right], None, &MergeOptions::default())?;
//!     let bytes = serialization::serialize(&merged, Format::Xml, SpecVersion::V1_4)?;
//!     std::fs::write("merged.cdx.xml", bytes)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Running the configured pipeline
//!
//! ```no_run
//! use cdx_tools::config::load_or_default;
//! use cdx_tools::pipeline::{run, OutputTarget};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (config, _) = load_or_default(None);
//!     cdx_tools::logging::init_logging(&config.logging);
//!     let target = OutputTarget::from_option(config.output.file.clone());
//!     let outcome = run(&config, &["a.cdx.json", "b.cdx.json"], &target)?;
//!     eprintln!("{} issue(s)", outcome.report.issue_count());
//!     Ok(())
//! }
//! ```

// Lint to discourage unwrap() in production code - prefer explicit error handling
#![warn(clippy::unwrap_used)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::too_many_lines,
    clippy::struct_excessive_bools,
    clippy::module_name_repetitions
)]

pub mod config;
pub mod downgrade;
pub mod entity;
pub mod error;
pub mod logging;
pub mod merge;
pub mod model;
pub mod pipeline;
pub mod serialization;
pub mod utils;
pub mod validate;

// Re-export main types for convenience
pub use config::{AppConfig, AppConfigBuilder, ConfigPreset, LoggingConfig, MergeConfig};
pub use config::{ConfigError, OutputConfig, SubjectConfig, Validatable, ValidationConfig};
pub use downgrade::{downgrade, downgrade_in_place};
pub use entity::{merge_lists, BomEntity, ListMergeStrategy, Mergeable};
pub use error::{
    BomError, ErrorContext, MergeErrorKind, Result, SerializationErrorKind,
};
pub use merge::{flat_merge, flat_merge_pair, hierarchical_merge, MergeMode, MergeOptions};
pub use model::{retag_version, Bom, Component, Dependency, Service, SpecVersion};
pub use pipeline::{OutputTarget, PipelineError};
pub use serialization::{detect_format, media_type, parse_media_type, BomCodec, Format};
pub use validate::{validate_document, validate_references, BrokenReference, ValidationReport};
