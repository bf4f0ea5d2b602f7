//! Configuration types for cdx-tools operations.
//!
//! Provides structured configuration for merging, writing and checking
//! CycloneDX documents.

use crate::entity::ListMergeStrategy;
use crate::merge::{MergeMode, MergeOptions};
use crate::model::{Component, ComponentType, SpecVersion};
use crate::serialization::Format;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable that overrides [`LoggingConfig::debug_merge`].
pub const DEBUG_MERGE_ENV: &str = "CDX_TOOLS_DEBUG_MERGE";

// ============================================================================
// Unified Application Configuration
// ============================================================================

/// Unified application configuration that can be loaded from config files
/// or built in code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AppConfig {
    /// Merge engine and its options
    pub merge: MergeConfig,
    /// Output format, version and destination
    pub output: OutputConfig,
    /// Document checks run on the merged result
    pub validation: ValidationConfig,
    /// Diagnostic logging
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Create a new `AppConfig` with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an `AppConfig` builder.
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }
}

// ============================================================================
// Builder for AppConfig
// ============================================================================

/// Builder for constructing `AppConfig` with fluent API.
#[derive(Debug, Default)]
#[must_use]
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl AppConfigBuilder {
    /// Set the merge engine.
    pub const fn merge_mode(mut self, mode: MergeMode) -> Self {
        self.config.merge.mode = mode;
        self
    }

    /// Set how list entries are compared while merging.
    pub const fn list_strategy(mut self, strategy: ListMergeStrategy) -> Self {
        self.config.merge.list_strategy = strategy;
        self
    }

    /// Give the merged document a fresh serial number, version and timestamp.
    pub const fn refresh_identity(mut self, refresh: bool) -> Self {
        self.config.merge.refresh_identity = refresh;
        self
    }

    /// Record this library as a tool of the merged document.
    pub const fn refer_toolkit(mut self, refer: bool) -> Self {
        self.config.merge.refer_toolkit = refer;
        self
    }

    /// Sort the merged document's top-level lists.
    pub const fn sort_lists(mut self, sort: bool) -> Self {
        self.config.merge.sort_lists = sort;
        self
    }

    /// Set the component the merged document describes.
    pub fn subject(mut self, subject: Option<SubjectConfig>) -> Self {
        self.config.merge.subject = subject;
        self
    }

    /// Set the output format.
    pub const fn output_format(mut self, format: Format) -> Self {
        self.config.output.format = format;
        self
    }

    /// Set the specification version written.
    pub const fn spec_version(mut self, version: SpecVersion) -> Self {
        self.config.output.spec_version = version;
        self
    }

    /// Indent JSON output.
    pub const fn pretty(mut self, pretty: bool) -> Self {
        self.config.output.pretty = pretty;
        self
    }

    /// Set the output file.
    pub fn output_file(mut self, file: Option<PathBuf>) -> Self {
        self.config.output.file = file;
        self
    }

    /// Fail the run when the merged document has broken references.
    pub const fn fail_on_broken_references(mut self, fail: bool) -> Self {
        self.config.validation.fail_on_broken_references = fail;
        self
    }

    /// Set the merge debug level.
    pub const fn debug_merge(mut self, level: u8) -> Self {
        self.config.logging.debug_merge = level;
        self
    }

    /// Build the `AppConfig`.
    #[must_use]
    pub fn build(self) -> AppConfig {
        self.config
    }
}

// ============================================================================
// Sub-configuration Types
// ============================================================================

/// Merge configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct MergeConfig {
    /// Merge engine: flat or hierarchical
    pub mode: MergeMode,
    /// Entry comparison: careful or quick
    pub list_strategy: ListMergeStrategy,
    /// New serial number, version 1 and timestamp on the merged document
    pub refresh_identity: bool,
    /// Record cdx-tools in the merged document's tools
    pub refer_toolkit: bool,
    /// Sort top-level lists after a flat merge
    pub sort_lists: bool,
    /// Component the merged document describes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<SubjectConfig>,
}

impl Default for MergeConfig {
    fn default() -> Self {
        let options = MergeOptions::default();
        Self {
            mode: MergeMode::default(),
            list_strategy: options.strategy,
            refresh_identity: options.refresh_identity,
            refer_toolkit: options.refer_toolkit,
            sort_lists: options.sort_lists,
            subject: None,
        }
    }
}

impl MergeConfig {
    /// The options handed to the merge engines.
    #[must_use]
    pub const fn to_options(&self) -> MergeOptions {
        MergeOptions {
            strategy: self.list_strategy,
            refresh_identity: self.refresh_identity,
            refer_toolkit: self.refer_toolkit,
            sort_lists: self.sort_lists,
        }
    }

    /// The subject as an application component, when configured.
    #[must_use]
    pub fn subject_component(&self) -> Option<Component> {
        self.subject.as_ref().map(SubjectConfig::to_component)
    }
}

/// Group, name and version of the merged document's subject.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SubjectConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl SubjectConfig {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn to_component(&self) -> Component {
        let mut component = Component::new(ComponentType::Application, self.name.clone());
        component.group.clone_from(&self.group);
        component.version.clone_from(&self.version);
        component
    }
}

/// Output configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format: xml, json or binary
    pub format: Format,
    /// Specification version written, e.g. "1.4"
    #[schemars(with = "String")]
    pub spec_version: SpecVersion,
    /// Indent JSON output
    pub pretty: bool,
    /// Output file path (None for stdout)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: Format::Json,
            spec_version: SpecVersion::CURRENT,
            pretty: true,
            file: None,
        }
    }
}

/// Checks run on the merged document before it is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ValidationConfig {
    /// Look for references that name no identifier
    pub check_references: bool,
    /// Abort instead of warning when broken references are found
    pub fail_on_broken_references: bool,
    /// Require `urn:uuid` serial numbers
    pub check_serial_number: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            check_references: true,
            fail_on_broken_references: false,
            check_serial_number: false,
        }
    }
}

/// Diagnostic logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
    /// Merge tracing: 0 off, 1 debug, 2 or more trace
    pub debug_merge: u8,
    /// Include module targets in log lines
    pub show_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            debug_merge: 0,
            show_target: false,
        }
    }
}

impl LoggingConfig {
    /// Apply `CDX_TOOLS_DEBUG_MERGE` when it holds an integer.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(raw) = std::env::var(DEBUG_MERGE_ENV) {
            self.apply_debug_merge_override(&raw);
        }
    }

    fn apply_debug_merge_override(&mut self, raw: &str) {
        match raw.trim().parse::<u8>() {
            Ok(level) => self.debug_merge = level,
            Err(_) => tracing::warn!(value = raw, "ignoring non-numeric {DEBUG_MERGE_ENV}"),
        }
    }

    /// Filter directive for the merge module, if merge tracing is on.
    #[must_use]
    pub const fn merge_directive(&self) -> Option<&'static str> {
        match self.debug_merge {
            0 => None,
            1 => Some("cdx_tools::merge=debug"),
            _ => Some("cdx_tools::merge=trace"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_merge_options() {
        let config = MergeConfig::default();
        assert_eq!(config.to_options(), MergeOptions::default());
        assert_eq!(config.mode, MergeMode::Flat);
    }

    #[test]
    fn test_builder() {
        let config = AppConfig::builder()
            .merge_mode(MergeMode::Hierarchical)
            .list_strategy(ListMergeStrategy::Quick)
            .refresh_identity(false)
            .output_format(Format::Xml)
            .spec_version(SpecVersion::V1_2)
            .subject(Some(SubjectConfig::new("platform")))
            .debug_merge(2)
            .build();

        assert_eq!(config.merge.mode, MergeMode::Hierarchical);
        assert_eq!(config.merge.to_options().strategy, ListMergeStrategy::Quick);
        assert!(!config.merge.to_options().refresh_identity);
        assert_eq!(config.output.format, Format::Xml);
        assert_eq!(config.output.spec_version, SpecVersion::V1_2);
        assert_eq!(config.logging.debug_merge, 2);
        assert_eq!(
            config.merge.subject_component().map(|c| c.name),
            Some("platform".to_string())
        );
    }

    #[test]
    fn test_subject_component() {
        let subject = SubjectConfig {
            group: Some("acme".into()),
            name: "platform".into(),
            version: Some("2.0".into()),
        };
        let component = subject.to_component();
        assert_eq!(component.component_type, ComponentType::Application);
        assert_eq!(component.group.as_deref(), Some("acme"));
        assert_eq!(component.version.as_deref(), Some("2.0"));
    }

    #[test]
    fn test_merge_directive() {
        let mut logging = LoggingConfig::default();
        assert_eq!(logging.merge_directive(), None);
        logging.apply_debug_merge_override("1");
        assert_eq!(logging.merge_directive(), Some("cdx_tools::merge=debug"));
        logging.apply_debug_merge_override(" 3 ");
        assert_eq!(logging.merge_directive(), Some("cdx_tools::merge=trace"));
        logging.apply_debug_merge_override("verbose");
        assert_eq!(logging.debug_merge, 3);
    }

    #[test]
    fn test_yaml_shape() {
        let yaml = "merge:\n  mode: hierarchical\n  subject:\n    name: app\noutput:\n  format: xml\n  spec_version: '1.3'\n";
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.merge.mode, MergeMode::Hierarchical);
        assert!(config.merge.refresh_identity);
        assert_eq!(config.output.format, Format::Xml);
        assert_eq!(config.output.spec_version, SpecVersion::V1_3);
        assert!(config.output.pretty);
    }
}
