//! Merge and check stages.

use super::PipelineError;
use crate::config::{MergeConfig, ValidationConfig};
use crate::merge::{flat_merge, hierarchical_merge, MergeMode};
use crate::model::Bom;
use crate::validate::{validate_document, ValidationReport};

/// Run the configured merge engine over `boms`.
pub fn merge_boms(boms: &[Bom], config: &MergeConfig) -> Result<Bom, PipelineError> {
    let options = config.to_options();
    let subject = config.subject_component();
    tracing::info!(
        inputs = boms.len(),
        mode = ?config.mode,
        strategy = ?options.strategy,
        "Merging documents"
    );

    let merged = match config.mode {
        MergeMode::Flat => flat_merge(boms, subject, &options),
        MergeMode::Hierarchical => hierarchical_merge(boms, subject, &options),
    };
    merged.map_err(|source| PipelineError::MergeFailed {
        source: source.into(),
    })
}

/// Check the merged document. Findings are logged as warnings; broken
/// references fail the stage when `fail_on_broken_references` is set.
pub fn check_bom(bom: &Bom, config: &ValidationConfig) -> Result<ValidationReport, PipelineError> {
    let report = validate_document(bom, config);
    for message in report.messages() {
        tracing::warn!("{message}");
    }
    if config.fail_on_broken_references && !report.broken_references.is_empty() {
        return Err(PipelineError::ValidationFailed {
            issues: report.broken_references.len(),
        });
    }
    Ok(report)
}
