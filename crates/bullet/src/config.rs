//! Module options (bullet.toml)
//!
//! Options controlling how the module is assembled: its name and version,
//! whether enum labels are published at module scope and the construction
//! info used by default-constructed collision configurations.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use bullet_collision::DefaultCollisionConstructionInfo;

/// Errors that can occur while loading options
#[derive(Debug, Error)]
pub enum OptionsError {
    /// Failed to read the options file
    #[error("Failed to read options file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse options: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Validation error
    #[error("Invalid options: {0}")]
    ValidationError(String),
}

/// Module assembly options
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModuleOptions {
    /// Module metadata
    #[serde(default)]
    pub module: ModuleInfo,

    /// Collision configuration defaults
    #[serde(default)]
    pub collision: CollisionOptions,
}

/// Module metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModuleInfo {
    /// Module name as imported by the runtime (default: "bullet")
    #[serde(default = "default_module_name")]
    pub name: String,

    /// Semver version (default: this crate's version)
    #[serde(default = "default_module_version")]
    pub version: String,

    /// Publish enum labels at module scope (default: true)
    #[serde(default = "default_true")]
    pub export_values: bool,
}

fn default_module_name() -> String {
    "bullet".to_string()
}

fn default_module_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_true() -> bool {
    true
}

impl Default for ModuleInfo {
    fn default() -> Self {
        Self {
            name: default_module_name(),
            version: default_module_version(),
            export_values: true,
        }
    }
}

/// Defaults for `btDefaultCollisionConfiguration()`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CollisionOptions {
    /// Persistent manifold pool size (default: 4096)
    #[serde(default = "default_pool_size")]
    pub manifold_pool_size: usize,

    /// Collision algorithm pool size (default: 4096)
    #[serde(default = "default_pool_size")]
    pub algorithm_pool_size: usize,

    /// Use EPA for penetration depth (default: true)
    #[serde(default = "default_true")]
    pub use_epa: bool,
}

fn default_pool_size() -> usize {
    bullet_collision::dispatch::DEFAULT_POOL_SIZE
}

impl Default for CollisionOptions {
    fn default() -> Self {
        Self {
            manifold_pool_size: default_pool_size(),
            algorithm_pool_size: default_pool_size(),
            use_epa: true,
        }
    }
}

impl CollisionOptions {
    /// Native construction info for these options
    pub fn construction_info(&self) -> DefaultCollisionConstructionInfo {
        DefaultCollisionConstructionInfo {
            default_max_persistent_manifold_pool_size: self.manifold_pool_size,
            default_max_collision_algorithm_pool_size: self.algorithm_pool_size,
            use_epa_penetration_algorithm: self.use_epa,
            ..Default::default()
        }
    }
}

impl Default for ModuleOptions {
    fn default() -> Self {
        Self {
            module: ModuleInfo::default(),
            collision: CollisionOptions::default(),
        }
    }
}

impl ModuleOptions {
    /// Load options from a file
    pub fn from_file(path: &Path) -> Result<Self, OptionsError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse options from a string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, OptionsError> {
        let options: ModuleOptions = toml::from_str(content)?;
        options.validate()?;
        Ok(options)
    }

    /// Validate the options
    pub fn validate(&self) -> Result<(), OptionsError> {
        if !is_valid_module_name(&self.module.name) {
            return Err(OptionsError::ValidationError(format!(
                "Invalid module name: '{}'. Must be a non-empty identifier",
                self.module.name
            )));
        }

        if !is_valid_version(&self.module.version) {
            return Err(OptionsError::ValidationError(format!(
                "Invalid version: {}. Must be valid semver (e.g., 1.2.3)",
                self.module.version
            )));
        }

        if self.collision.manifold_pool_size == 0 {
            return Err(OptionsError::ValidationError(
                "manifold_pool_size must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Serialize to TOML
    pub fn to_toml(&self) -> Result<String, OptionsError> {
        toml::to_string_pretty(self).map_err(|e| OptionsError::ValidationError(e.to_string()))
    }
}

/// Identifier: a letter or underscore, then alphanumerics or underscores
fn is_valid_module_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Basic semver validation (MAJOR.MINOR.PATCH)
fn is_valid_version(version: &str) -> bool {
    let parts: Vec<&str> = version.split('.').collect();
    if parts.len() != 3 {
        return false;
    }

    parts.iter().all(|p| p.parse::<u32>().is_ok())
}
