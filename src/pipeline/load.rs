//! Document loading.

use super::PipelineError;
use crate::model::Bom;
use crate::serialization::{detect_format, BomCodec as _};
use anyhow::{anyhow, Context, Result};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

fn decode_file(path: &Path) -> Result<Bom> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let detection = detect_format(&bytes);
    let format = detection
        .format
        .filter(|_| detection.is_cyclonedx())
        .ok_or_else(|| anyhow!("not a CycloneDX document"))?;
    let bom = format
        .codec()
        .deserialize(&bytes)
        .with_context(|| format!("Invalid {format} document"))?;

    if let Some(announced) = detection.spec_version {
        if announced != bom.spec_version {
            tracing::warn!(
                path = %path.display(),
                %announced,
                decoded = %bom.spec_version,
                "specVersion differs from the detected version"
            );
        }
    }
    Ok(bom)
}

/// Read one document, detecting its format.
///
/// The result is tagged with the version the document declares.
pub fn load_bom(path: &Path) -> Result<Bom, PipelineError> {
    tracing::info!("Loading {}", path.display());
    decode_file(path).map_err(|source| PipelineError::LoadFailed {
        path: path.display().to_string(),
        source,
    })
}

/// Read several documents in parallel. The result keeps the input order.
///
/// Fails with the first failing path in input order.
pub fn load_boms<P>(paths: &[P]) -> Result<Vec<Bom>, PipelineError>
where
    P: AsRef<Path> + Sync,
{
    let loaded: Vec<(PathBuf, Result<Bom>)> = paths
        .par_iter()
        .map(|path| {
            let path = path.as_ref();
            (path.to_path_buf(), decode_file(path))
        })
        .collect();

    loaded
        .into_iter()
        .map(|(path, result)| {
            result.map_err(|source| PipelineError::LoadFailed {
                path: path.display().to_string(),
                source,
            })
        })
        .collect()
}
