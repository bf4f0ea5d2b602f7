//! Pipeline orchestration for document operations.
//!
//! Chains load → merge → check → write, with each stage available on its
//! own for callers that need only part of the flow.

mod load;
mod merge_stage;
mod output;

pub use load::{load_bom, load_boms};
pub use merge_stage::{check_bom, merge_boms};
pub use output::{codec_for, render_bom, write_bom, OutputTarget};

use crate::config::{AppConfig, Validatable};
use crate::model::Bom;
use crate::validate::ValidationReport;
use std::path::Path;

/// Structured pipeline error types for better diagnostics.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The configuration failed validation
    #[error("Invalid configuration: {}", .errors.join("; "))]
    InvalidConfig { errors: Vec<String> },

    /// No input documents were given
    #[error("No input documents")]
    NoInputs,

    /// Failed to read or decode a document
    #[error("Load failed for {path}: {source}")]
    LoadFailed {
        path: String,
        source: anyhow::Error,
    },

    /// The merge engine rejected the inputs
    #[error("Merge failed: {source}")]
    MergeFailed {
        #[source]
        source: anyhow::Error,
    },

    /// The merged document has broken references
    #[error("Validation failed: {issues} broken reference(s)")]
    ValidationFailed { issues: usize },

    /// Serialisation or output failed
    #[error("Write failed: {source}")]
    WriteFailed {
        #[source]
        source: anyhow::Error,
    },
}

/// What a full [`run`] produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// The merged document as held in memory, before any downgrade.
    pub merged: Bom,
    pub report: ValidationReport,
    pub bytes_written: usize,
}

/// Load `inputs`, merge them, check the result and write it to `target`.
pub fn run<P>(
    config: &AppConfig,
    inputs: &[P],
    target: &OutputTarget,
) -> Result<RunOutcome, PipelineError>
where
    P: AsRef<Path> + Sync,
{
    let errors = config.validate();
    if !errors.is_empty() {
        return Err(PipelineError::InvalidConfig {
            errors: errors.iter().map(ToString::to_string).collect(),
        });
    }
    if inputs.is_empty() {
        return Err(PipelineError::NoInputs);
    }

    let boms = load_boms(inputs)?;
    let merged = merge_boms(&boms, &config.merge)?;
    let report = check_bom(&merged, &config.validation)?;
    let bytes_written = write_bom(&merged, &config.output, target)?;
    tracing::info!(
        inputs = inputs.len(),
        bytes = bytes_written,
        issues = report.issue_count(),
        "Pipeline finished"
    );

    Ok(RunOutcome {
        merged,
        report,
        bytes_written,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SpecVersion;
    use crate::serialization::Format;
    use tempfile::TempDir;

    #[test]
    fn test_run_rejects_invalid_config() {
        let config = AppConfig::builder()
            .output_format(Format::Json)
            .spec_version(SpecVersion::V1_0)
            .build();
        let inputs: [&Path; 0] = [];
        let err = run(&config, &inputs, &OutputTarget::Stdout).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidConfig { .. }));
        assert!(err.to_string().contains("output.spec_version"));
    }

    #[test]
    fn test_run_needs_inputs() {
        let inputs: [&Path; 0] = [];
        let err = run(&AppConfig::default(), &inputs, &OutputTarget::Stdout).unwrap_err();
        assert!(matches!(err, PipelineError::NoInputs));
    }

    #[test]
    fn test_run_end_to_end() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("in.json");
        let output = tmp.path().join("out.xml");
        std::fs::write(
            &input,
            r#"{"bomFormat": "CycloneDX", "specVersion": "1.5", "version": 1,
                "components": [{"type": "library", "name": "lib", "bom-ref": "lib"}]}"#,
        )
        .unwrap();

        let config = AppConfig::builder()
            .output_format(Format::Xml)
            .spec_version(SpecVersion::V1_3)
            .build();
        let outcome = run(&config, &[&input], &OutputTarget::File(output.clone())).unwrap();

        assert!(outcome.report.is_clean());
        assert_eq!(outcome.merged.spec_version, SpecVersion::CURRENT);
        let written = std::fs::read_to_string(&output).unwrap();
        assert_eq!(written.len(), outcome.bytes_written);
        assert!(written.contains("http://cyclonedx.org/schema/bom/1.3"));
    }
}
