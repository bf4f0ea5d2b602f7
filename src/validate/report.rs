//! Document-level validation report.

use super::references::{identifier_index, validate_references, BrokenReference};
use crate::config::ValidationConfig;
use crate::model::{Bom, SpecVersion};
use indexmap::IndexMap;
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static SERIAL_NUMBER: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"^urn:uuid:[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$",
    )
    .ok()
});

/// Whether `serial` is a `urn:uuid` serial number.
#[must_use]
pub fn is_valid_serial_number(serial: &str) -> bool {
    SERIAL_NUMBER
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(serial))
}

/// Findings of [`validate_document`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub spec_version: SpecVersion,
    pub broken_references: Vec<BrokenReference>,
    /// Identifiers carried by more than one entity.
    pub duplicate_bom_refs: Vec<String>,
    /// Refs described by more than one top-level dependency record.
    pub duplicate_dependency_refs: Vec<String>,
    /// The serial number, when present and not a `urn:uuid`.
    pub invalid_serial_number: Option<String>,
}

impl ValidationReport {
    /// Whether nothing was found.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.issue_count() == 0
    }

    #[must_use]
    pub fn issue_count(&self) -> usize {
        self.broken_references.len()
            + self.duplicate_bom_refs.len()
            + self.duplicate_dependency_refs.len()
            + usize::from(self.invalid_serial_number.is_some())
    }

    /// One line per finding.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        let mut messages: Vec<String> = self
            .broken_references
            .iter()
            .map(|b| format!("broken reference: {b}"))
            .collect();
        messages.extend(
            self.duplicate_bom_refs
                .iter()
                .map(|r| format!("duplicate bom-ref '{r}'")),
        );
        messages.extend(
            self.duplicate_dependency_refs
                .iter()
                .map(|r| format!("duplicate dependency record for '{r}'")),
        );
        if let Some(serial) = &self.invalid_serial_number {
            messages.push(format!("serial number '{serial}' is not a urn:uuid"));
        }
        messages
    }
}

fn duplicates<'a>(values: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut counts: IndexMap<&str, usize> = IndexMap::new();
    for value in values {
        *counts.entry(value).or_default() += 1;
    }
    counts
        .into_iter()
        .filter(|(_, n)| *n > 1)
        .map(|(v, _)| v.to_string())
        .collect()
}

/// Run the checks enabled in `config` over `bom`.
#[must_use]
pub fn validate_document(bom: &Bom, config: &ValidationConfig) -> ValidationReport {
    let broken_references = if config.check_references {
        validate_references(bom)
    } else {
        Vec::new()
    };

    let index = identifier_index(bom);
    let duplicate_bom_refs = index
        .iter()
        .filter(|(_, kinds)| kinds.len() > 1)
        .map(|(r, _)| (*r).to_string())
        .collect();

    let duplicate_dependency_refs = duplicates(
        bom.dependencies
            .iter()
            .flatten()
            .map(|d| d.dep_ref.as_str()),
    );

    let invalid_serial_number = bom
        .serial_number
        .as_deref()
        .filter(|serial| config.check_serial_number && !is_valid_serial_number(serial))
        .map(str::to_string);

    let report = ValidationReport {
        spec_version: bom.spec_version,
        broken_references,
        duplicate_bom_refs,
        duplicate_dependency_refs,
        invalid_serial_number,
    };
    tracing::debug!(issues = report.issue_count(), "validated document");
    report
}
