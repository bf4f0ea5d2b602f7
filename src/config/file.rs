//! Configuration file loading and discovery.
//!
//! Supports loading configuration from YAML files with automatic discovery.

use super::types::{AppConfig, LoggingConfig, MergeConfig, OutputConfig, ValidationConfig};
use std::path::{Path, PathBuf};

// ============================================================================
// Configuration File Discovery
// ============================================================================

/// Standard config file names to search for.
const CONFIG_FILE_NAMES: &[&str] = &[
    ".cdx-tools.yaml",
    ".cdx-tools.yml",
    "cdx-tools.yaml",
    "cdx-tools.yml",
];

/// Discover a config file by searching standard locations.
///
/// Search order:
/// 1. Explicit path if provided
/// 2. Current directory
/// 3. Git repository root (if in a repo)
/// 4. User config directory (~/.config/cdx-tools/)
/// 5. Home directory
#[must_use]
pub fn discover_config_file(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path.filter(|path| path.exists()) {
        return Some(path.to_path_buf());
    }

    let cwd = std::env::current_dir().ok();
    let config_dir = dirs::config_dir().map(|dir| dir.join("cdx-tools"));
    let candidates = [cwd, find_git_root(), config_dir, dirs::home_dir()];

    candidates
        .iter()
        .flatten()
        .find_map(|dir| find_config_in_dir(dir))
}

/// Find a config file in a specific directory.
fn find_config_in_dir(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.exists())
}

/// Find the git repository root by walking up the directory tree.
fn find_git_root() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    let mut current = cwd.as_path();

    loop {
        if current.join(".git").exists() {
            return Some(current.to_path_buf());
        }
        current = current.parent()?;
    }
}

// ============================================================================
// Configuration File Loading
// ============================================================================

/// Failure to read a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Load an `AppConfig` from a YAML file. A blank file yields the defaults.
pub fn load_config_file(path: &Path) -> Result<AppConfig, ConfigFileError> {
    if !path.exists() {
        return Err(ConfigFileError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path).map_err(|source| ConfigFileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if content.trim().is_empty() {
        return Ok(AppConfig::default());
    }
    serde_yaml::from_str(&content).map_err(|source| ConfigFileError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load config from discovered file, or return default.
#[must_use]
pub fn load_or_default(explicit_path: Option<&Path>) -> (AppConfig, Option<PathBuf>) {
    discover_config_file(explicit_path).map_or_else(
        || (AppConfig::default(), None),
        |path| match load_config_file(&path) {
            Ok(config) => (config, Some(path)),
            Err(e) => {
                tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                (AppConfig::default(), None)
            }
        },
    )
}

// ============================================================================
// Configuration Merging
// ============================================================================

impl AppConfig {
    /// Merge another config into this one, with `other` taking precedence.
    ///
    /// Only values of `other` that differ from the defaults override, so
    /// code-built overrides can be layered over file config.
    pub fn merge(&mut self, other: &Self) {
        let merge_defaults = MergeConfig::default();
        if other.merge.mode != merge_defaults.mode {
            self.merge.mode = other.merge.mode;
        }
        if other.merge.list_strategy != merge_defaults.list_strategy {
            self.merge.list_strategy = other.merge.list_strategy;
        }
        if other.merge.refresh_identity != merge_defaults.refresh_identity {
            self.merge.refresh_identity = other.merge.refresh_identity;
        }
        if other.merge.refer_toolkit != merge_defaults.refer_toolkit {
            self.merge.refer_toolkit = other.merge.refer_toolkit;
        }
        if other.merge.sort_lists {
            self.merge.sort_lists = true;
        }
        if other.merge.subject.is_some() {
            self.merge.subject.clone_from(&other.merge.subject);
        }

        let output_defaults = OutputConfig::default();
        if other.output.format != output_defaults.format {
            self.output.format = other.output.format;
        }
        if other.output.spec_version != output_defaults.spec_version {
            self.output.spec_version = other.output.spec_version;
        }
        if other.output.pretty != output_defaults.pretty {
            self.output.pretty = other.output.pretty;
        }
        if other.output.file.is_some() {
            self.output.file.clone_from(&other.output.file);
        }

        let validation_defaults = ValidationConfig::default();
        if other.validation.check_references != validation_defaults.check_references {
            self.validation.check_references = other.validation.check_references;
        }
        if other.validation.fail_on_broken_references {
            self.validation.fail_on_broken_references = true;
        }
        if other.validation.check_serial_number {
            self.validation.check_serial_number = true;
        }

        let logging_defaults = LoggingConfig::default();
        if other.logging.level != logging_defaults.level {
            self.logging.level.clone_from(&other.logging.level);
        }
        if other.logging.debug_merge != logging_defaults.debug_merge {
            self.logging.debug_merge = other.logging.debug_merge;
        }
        if other.logging.show_target {
            self.logging.show_target = true;
        }
    }

    /// Load from file and merge with overrides.
    #[must_use]
    pub fn from_file_with_overrides(
        config_path: Option<&Path>,
        overrides: &Self,
    ) -> (Self, Option<PathBuf>) {
        let (mut config, loaded_from) = load_or_default(config_path);
        config.merge(overrides);
        (config, loaded_from)
    }
}

// ============================================================================
// Example Config Generation
// ============================================================================

/// Generate an example config file content.
#[must_use]
pub fn generate_example_config() -> String {
    let example = AppConfig::default();
    format!(
        r"# cdx-tools Configuration
# Place this file at .cdx-tools.yaml in your project root or ~/.config/cdx-tools/

{}
",
        serde_yaml::to_string(&example).unwrap_or_default()
    )
}

/// Generate a commented example config with all options.
#[must_use]
pub fn generate_full_example_config() -> String {
    r"# cdx-tools Configuration File
# ============================
#
# This file configures how CycloneDX documents are merged and written.
# Place it at:
#   - .cdx-tools.yaml in your project root
#   - ~/.config/cdx-tools/cdx-tools.yaml for global config

# Merge configuration
merge:
  # Engine: flat (one deduplicated document) or hierarchical (one subtree per input)
  mode: flat
  # Entry comparison: careful (merge equivalent entries) or quick (identical only)
  list_strategy: careful
  # New serial number, version 1 and timestamp on the result
  refresh_identity: true
  # Record cdx-tools in the result's metadata tools
  refer_toolkit: true
  # Sort top-level lists (flat merge only)
  sort_lists: false
  # Component the merged document describes
  # subject:
  #   group: acme
  #   name: platform
  #   version: '1.0.0'

# Output configuration
output:
  # Format: xml, json, binary
  format: json
  # Specification version: 1.0 to 1.6 (JSON needs 1.2+, binary 1.3+)
  spec_version: '1.6'
  # Indent JSON output
  pretty: true
  # Output file path (omit for stdout)
  # file: merged.cdx.json

# Checks on the merged document
validation:
  check_references: true
  # Abort on broken references instead of warning
  fail_on_broken_references: false
  # Require urn:uuid serial numbers
  check_serial_number: false

# Diagnostics
logging:
  # Default filter when RUST_LOG is unset
  level: warn
  # Merge tracing: 0 off, 1 debug, 2 trace (CDX_TOOLS_DEBUG_MERGE overrides)
  debug_merge: 0
  show_target: false
"
    .to_string()
}
