//! Writing merged documents.

use super::PipelineError;
use crate::config::OutputConfig;
use crate::model::Bom;
use crate::serialization::{BinaryCodec, BomCodec, Format, JsonCodec, XmlCodec};
use anyhow::{Context, Result};
use std::io::Write as _;
use std::path::PathBuf;

/// Target for output - either stdout or a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// Write to stdout
    Stdout,
    /// Write to a file
    File(PathBuf),
}

impl OutputTarget {
    /// Create output target from optional path
    #[must_use]
    pub fn from_option(path: Option<PathBuf>) -> Self {
        path.map_or(Self::Stdout, Self::File)
    }
}

/// The codec for `config.format`, honouring `config.pretty`.
#[must_use]
pub fn codec_for(config: &OutputConfig) -> Box<dyn BomCodec + Send + Sync> {
    match config.format {
        Format::Xml => Box::new(XmlCodec {
            pretty: config.pretty,
        }),
        Format::Json => Box::new(JsonCodec {
            pretty: config.pretty,
        }),
        Format::Binary => Box::new(BinaryCodec),
    }
}

/// Serialise `bom` at the configured format and version.
///
/// Documents tagged above the target version are downgraded on the way.
pub fn render_bom(bom: &Bom, config: &OutputConfig) -> Result<Vec<u8>, PipelineError> {
    codec_for(config)
        .serialize(bom, config.spec_version)
        .with_context(|| format!("{} output at {}", config.format, config.spec_version))
        .map_err(|source| PipelineError::WriteFailed { source })
}

fn write_bytes(bytes: &[u8], target: &OutputTarget) -> Result<()> {
    match target {
        OutputTarget::Stdout => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(bytes).context("Failed to write to stdout")?;
            stdout.flush().context("Failed to flush stdout")?;
        }
        OutputTarget::File(path) => {
            std::fs::write(path, bytes)
                .with_context(|| format!("Failed to write output to {}", path.display()))?;
            tracing::info!("Document written to {}", path.display());
        }
    }
    Ok(())
}

/// Serialise `bom` and write it to `target`. Returns the number of bytes written.
pub fn write_bom(
    bom: &Bom,
    config: &OutputConfig,
    target: &OutputTarget,
) -> Result<usize, PipelineError> {
    let bytes = render_bom(bom, config)?;
    write_bytes(&bytes, target).map_err(|source| PipelineError::WriteFailed { source })?;
    Ok(bytes.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Component, ComponentType, SpecVersion};
    use crate::serialization::deserialize_any;
    use tempfile::TempDir;

    fn sample() -> Bom {
        let mut bom = Bom::new(SpecVersion::V1_6);
        bom.components = Some(vec![Component::new(ComponentType::Library, "lib")]);
        bom
    }

    #[test]
    fn test_output_target_from_option() {
        assert_eq!(OutputTarget::from_option(None), OutputTarget::Stdout);
        let path = PathBuf::from("/tmp/out.json");
        assert_eq!(
            OutputTarget::from_option(Some(path.clone())),
            OutputTarget::File(path)
        );
    }

    #[test]
    fn test_write_bom_to_file_downgrades() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out.xml");
        let config = OutputConfig {
            format: Format::Xml,
            spec_version: SpecVersion::V1_1,
            ..OutputConfig::default()
        };

        let written = write_bom(&sample(), &config, &OutputTarget::File(path.clone())).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(written, bytes.len());

        let back = deserialize_any(&bytes).unwrap();
        assert_eq!(back.spec_version, SpecVersion::V1_1);
        assert_eq!(back.components.unwrap()[0].name, "lib");
    }

    #[test]
    fn test_compact_json() {
        let config = OutputConfig {
            pretty: false,
            ..OutputConfig::default()
        };
        let bytes = render_bom(&sample(), &config).unwrap();
        assert!(!bytes.contains(&b'\n'));
    }

    #[test]
    fn test_unsupported_pair() {
        let config = OutputConfig {
            format: Format::Binary,
            spec_version: SpecVersion::V1_2,
            ..OutputConfig::default()
        };
        let err = render_bom(&sample(), &config).unwrap_err();
        assert!(matches!(err, PipelineError::WriteFailed { .. }));
    }
}
