//! Default configurations and presets for cdx-tools.
//!
//! Provides named presets for common use cases.

use super::types::{AppConfig, LoggingConfig, MergeConfig, OutputConfig, ValidationConfig};
use crate::entity::ListMergeStrategy;

// ============================================================================
// Configuration Presets
// ============================================================================

/// Named configuration presets for common use cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigPreset {
    /// Careful flat merge, current version, reference check with warnings
    Default,
    /// Broken references and malformed serial numbers fail the run
    Strict,
    /// Quick hash-based deduplication, compact output, no checks
    Fast,
    /// Stable output: sorted lists, no fresh serial number or timestamp
    Reproducible,
}

impl ConfigPreset {
    /// Get the preset name as a string.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Strict => "strict",
            Self::Fast => "fast",
            Self::Reproducible => "reproducible",
        }
    }

    /// Parse a preset from a string name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "default" | "balanced" => Some(Self::Default),
            "strict" | "ci" => Some(Self::Strict),
            "fast" | "quick" => Some(Self::Fast),
            "reproducible" | "stable" | "deterministic" => Some(Self::Reproducible),
            _ => None,
        }
    }

    /// Get a description of this preset.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Default => "Careful flat merge written at the current specification version",
            Self::Strict => "Fails on broken references and non-UUID serial numbers",
            Self::Fast => "Hash-based deduplication and compact output for large inputs",
            Self::Reproducible => "Byte-stable output for identical inputs",
        }
    }

    /// Get all available presets.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Default, Self::Strict, Self::Fast, Self::Reproducible]
    }
}

impl std::fmt::Display for ConfigPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ============================================================================
// Preset Implementations
// ============================================================================

impl AppConfig {
    /// Create an `AppConfig` from a named preset.
    #[must_use]
    pub fn from_preset(preset: ConfigPreset) -> Self {
        match preset {
            ConfigPreset::Default => Self::default(),
            ConfigPreset::Strict => Self::strict_preset(),
            ConfigPreset::Fast => Self::fast_preset(),
            ConfigPreset::Reproducible => Self::reproducible_preset(),
        }
    }

    /// Strict preset.
    ///
    /// - Broken references abort the run
    /// - Serial numbers must be `urn:uuid`
    #[must_use]
    pub fn strict_preset() -> Self {
        Self {
            merge: MergeConfig::default(),
            output: OutputConfig::default(),
            validation: ValidationConfig {
                check_references: true,
                fail_on_broken_references: true,
                check_serial_number: true,
            },
            logging: LoggingConfig::default(),
        }
    }

    /// Fast preset for large inputs.
    ///
    /// - Quick list strategy (identical entries only)
    /// - Compact JSON
    /// - No reference check
    #[must_use]
    pub fn fast_preset() -> Self {
        Self {
            merge: MergeConfig {
                list_strategy: ListMergeStrategy::Quick,
                ..MergeConfig::default()
            },
            output: OutputConfig {
                pretty: false,
                ..OutputConfig::default()
            },
            validation: ValidationConfig {
                check_references: false,
                fail_on_broken_references: false,
                check_serial_number: false,
            },
            logging: LoggingConfig::default(),
        }
    }

    /// Reproducible preset.
    ///
    /// - Keeps the serial number and version of the first input
    /// - Sorts the merged lists
    #[must_use]
    pub fn reproducible_preset() -> Self {
        Self {
            merge: MergeConfig {
                refresh_identity: false,
                sort_lists: true,
                ..MergeConfig::default()
            },
            output: OutputConfig::default(),
            validation: ValidationConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
