//! Configuration module for cdx-tools.
//!
//! This module provides a unified configuration system with:
//! - Type-safe configuration structures
//! - Validation for all configuration values
//! - Named presets for common use cases
//! - YAML config file loading and discovery
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use cdx_tools::config::{AppConfig, ConfigPreset};
//!
//! // Use defaults
//! let config = AppConfig::default();
//!
//! // Use a preset
//! let config = AppConfig::from_preset(ConfigPreset::Reproducible);
//!
//! // Use builder
//! let config = AppConfig::builder()
//!     .merge_mode(MergeMode::Hierarchical)
//!     .output_format(Format::Xml)
//!     .spec_version(SpecVersion::V1_4)
//!     .build();
//!
//! // Load from file
//! use cdx_tools::config::file::load_or_default;
//! let (config, loaded_from) = load_or_default(None);
//! ```
//!
//! # Configuration File
//!
//! Place a `.cdx-tools.yaml` file in your project root or `~/.config/cdx-tools/`:
//!
//! ```yaml
//! merge:
//!   mode: hierarchical
//!   subject:
//!     name: platform
//! output:
//!   format: xml
//!   spec_version: '1.4'
//! ```

mod defaults;
pub mod file;
mod types;
mod validation;

pub use defaults::ConfigPreset;
pub use types::{
    AppConfig, AppConfigBuilder, LoggingConfig, MergeConfig, OutputConfig, SubjectConfig,
    ValidationConfig, DEBUG_MERGE_ENV,
};
pub use validation::{ConfigError, Validatable};

pub use file::{
    discover_config_file, generate_example_config, generate_full_example_config, load_config_file,
    load_or_default, ConfigFileError,
};

/// Generate a JSON Schema for the `AppConfig` configuration format.
///
/// This schema documents all configuration options that can be set in
/// `.cdx-tools.yaml` config files. It can be used by editors for
/// validation and autocompletion.
///
/// # Errors
///
/// Returns an error if the schema cannot be rendered as JSON.
pub fn generate_json_schema() -> Result<String, serde_json::Error> {
    let schema = schemars::schema_for!(AppConfig);
    serde_json::to_string_pretty(&schema)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_schema_lists_sections() {
        let schema = generate_json_schema().unwrap();
        for section in ["merge", "output", "validation", "logging", "list_strategy"] {
            assert!(schema.contains(section), "missing {section}");
        }
    }
}
