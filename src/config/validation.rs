//! Configuration validation for cdx-tools.
//!
//! Provides validation traits and implementations for all configuration types.

use super::types::{AppConfig, LoggingConfig, MergeConfig, OutputConfig, ValidationConfig};
use crate::merge::MergeMode;
use tracing_subscriber::EnvFilter;

// ============================================================================
// Configuration Error
// ============================================================================

/// Error type for configuration validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    /// The field that failed validation
    pub field: String,
    /// Description of the validation error
    pub message: String,
}

impl ConfigError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Validation Trait
// ============================================================================

/// Trait for validatable configuration types.
pub trait Validatable {
    /// Validate the configuration, returning any errors found.
    fn validate(&self) -> Vec<ConfigError>;

    /// Check if the configuration is valid.
    fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

// ============================================================================
// Validation Implementations
// ============================================================================

impl Validatable for AppConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        errors.extend(self.merge.validate());
        errors.extend(self.output.validate());
        errors.extend(self.validation.validate());
        errors.extend(self.logging.validate());
        errors
    }
}

impl Validatable for MergeConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if let Some(subject) = &self.subject {
            if subject.name.trim().is_empty() {
                errors.push(ConfigError::new(
                    "merge.subject.name",
                    "Subject must have a name",
                ));
            }
        }
        if self.sort_lists && self.mode == MergeMode::Hierarchical {
            errors.push(ConfigError::new(
                "merge.sort_lists",
                "List sorting applies to flat merges only",
            ));
        }
        errors
    }
}

impl Validatable for OutputConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if !self.format.supports(self.spec_version) {
            errors.push(ConfigError::new(
                "output.spec_version",
                format!(
                    "{} output is defined from {} on, got {}",
                    self.format,
                    self.format.since(),
                    self.spec_version
                ),
            ));
        }
        if let Some(file) = &self.file {
            if file.as_os_str().is_empty() {
                errors.push(ConfigError::new("output.file", "Output path is empty"));
            }
        }
        errors
    }
}

impl Validatable for ValidationConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if self.fail_on_broken_references && !self.check_references {
            errors.push(ConfigError::new(
                "validation.fail_on_broken_references",
                "Requires validation.check_references",
            ));
        }
        errors
    }
}

impl Validatable for LoggingConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if let Err(e) = EnvFilter::try_new(&self.level) {
            errors.push(ConfigError::new(
                "logging.level",
                format!("Invalid filter directive '{}': {e}", self.level),
            ));
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SubjectConfig;
    use crate::model::SpecVersion;
    use crate::serialization::Format;

    #[test]
    fn test_default_config_is_valid() {
        assert!(AppConfig::default().is_valid());
        assert!(AppConfig::strict_preset().is_valid());
        assert!(AppConfig::fast_preset().is_valid());
        assert!(AppConfig::reproducible_preset().is_valid());
    }

    #[test]
    fn test_format_version_pairs() {
        let json_1_1 = OutputConfig {
            spec_version: SpecVersion::V1_1,
            ..OutputConfig::default()
        };
        let errors = json_1_1.validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "output.spec_version");

        let binary_1_2 = OutputConfig {
            format: Format::Binary,
            spec_version: SpecVersion::V1_2,
            ..OutputConfig::default()
        };
        assert!(!binary_1_2.is_valid());

        let xml_1_0 = OutputConfig {
            format: Format::Xml,
            spec_version: SpecVersion::V1_0,
            ..OutputConfig::default()
        };
        assert!(xml_1_0.is_valid());
    }

    #[test]
    fn test_subject_needs_name() {
        let config = MergeConfig {
            subject: Some(SubjectConfig::new("  ")),
            ..MergeConfig::default()
        };
        let errors = config.validate();
        assert_eq!(errors[0].field, "merge.subject.name");
    }

    #[test]
    fn test_sorting_hierarchical_merge() {
        let config = MergeConfig {
            mode: MergeMode::Hierarchical,
            sort_lists: true,
            ..MergeConfig::default()
        };
        assert!(!config.is_valid());
    }

    #[test]
    fn test_fail_without_check() {
        let config = ValidationConfig {
            check_references: false,
            fail_on_broken_references: true,
            check_serial_number: false,
        };
        assert!(!config.is_valid());
    }

    #[test]
    fn test_error_display() {
        let error = ConfigError::new("logging.level", "bad");
        assert_eq!(error.to_string(), "logging.level: bad");
    }
}
