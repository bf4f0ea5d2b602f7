//! Document validation.
//!
//! - [`validate_references`] reports references that do not resolve to an
//!   entity of an allowed kind at the document's declared version.
//! - [`validate_document`] adds identifier uniqueness and serial number
//!   checks into a [`ValidationReport`].
//! - [`SchemaValidator`] is the seam for external schema validators.
//!
//! All checks are read-only and report findings as data.

mod references;
mod report;
mod schema;

pub use references::{validate_references, BrokenReference};
pub use report::{is_valid_serial_number, validate_document, ValidationReport};
pub use schema::{SchemaValidation, SchemaValidator, StructuralJsonValidator};
