//! # Editor Configuration
//!
//! Tunables for interactive construction and batched rendering.
//!
//! ## Configuration Categories
//!
//! - **Construction**: where synthesized points land and how their coordinates are rounded
//! - **Arena**: capacity of the shared vertex blocks
//! - **Display**: how far infinite lines and planes are drawn

use serde::{Serialize, Deserialize};

use crate::config::{Config, ConfigError};

/// Capacity of each shared mesh block, in vertices
pub const DEFAULT_BLOCK_VERTEX_CAPACITY: u32 = 65_536;

/// Distance along the click ray at which unsnapped points are placed
pub const DEFAULT_CLICK_DEPTH: f64 = 10.0;

/// # Arena Configuration
///
/// Controls how the GPU buffer arena sizes its blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Vertices per shared block
    pub block_vertex_capacity: u32,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            block_vertex_capacity: DEFAULT_BLOCK_VERTEX_CAPACITY,
        }
    }
}

/// # Display Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Scale applied to a plane's pivot triangle around its center
    pub plane_extent: f64,
    /// Half-length of the segment drawn for an infinite line
    pub line_extent: f64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            plane_extent: 10.0,
            line_extent: 1000.0,
        }
    }
}

/// # Editor Configuration
///
/// Top-level configuration loaded by hosts via [`Config::load_from_file`].
///
/// ```toml
/// click_depth = 10.0
/// coordinate_digits = 4
///
/// [arena]
/// block_vertex_capacity = 65536
///
/// [display]
/// plane_extent = 10.0
/// line_extent = 1000.0
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Depth along the camera ray for points created without a snap
    pub click_depth: f64,
    /// Decimal digits kept when rounding synthesized coordinates
    pub coordinate_digits: u32,
    /// Mesh arena settings
    pub arena: ArenaConfig,
    /// Display settings
    pub display: DisplayConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            click_depth: DEFAULT_CLICK_DEPTH,
            coordinate_digits: 4,
            arena: ArenaConfig::default(),
            display: DisplayConfig::default(),
        }
    }
}

impl EditorConfig {
    /// Set the click depth
    pub fn with_click_depth(mut self, depth: f64) -> Self {
        self.click_depth = depth;
        self
    }

    /// Set the arena block capacity
    pub fn with_block_capacity(mut self, vertices: u32) -> Self {
        self.arena.block_vertex_capacity = vertices;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.click_depth.is_finite() && self.click_depth > 0.0) {
            return Err(ConfigError::Invalid(format!("click_depth must be positive, got {}", self.click_depth)));
        }
        if self.coordinate_digits > 12 {
            return Err(ConfigError::Invalid(format!("coordinate_digits must not exceed 12, got {}", self.coordinate_digits)));
        }
        if self.arena.block_vertex_capacity == 0 {
            return Err(ConfigError::Invalid("arena.block_vertex_capacity must be at least 1".to_string()));
        }
        if self.display.plane_extent <= 0.0 || self.display.line_extent <= 0.0 {
            return Err(ConfigError::Invalid("display extents must be positive".to_string()));
        }
        Ok(())
    }
}

impl Config for EditorConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = EditorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.arena.block_vertex_capacity, 65_536);
        assert_eq!(config.coordinate_digits, 4);
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let config: EditorConfig = toml::from_str("click_depth = 4.5\n[arena]\nblock_vertex_capacity = 16\n")
            .expect("valid toml");
        assert_eq!(config.click_depth, 4.5);
        assert_eq!(config.arena.block_vertex_capacity, 16);
        assert_eq!(config.display, DisplayConfig::default());
    }

    #[test]
    fn test_ron_round_trip_through_file() {
        let path = std::env::temp_dir().join(format!("stereo_engine_config_{}.ron", std::process::id()));
        let config = EditorConfig::default().with_click_depth(7.0);
        config.save_to_file(&path).expect("save");
        let loaded = EditorConfig::load_from_file(&path).expect("load");
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let err = EditorConfig::default().save_to_file("editor.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_zero_capacity_is_invalid() {
        let config = EditorConfig::default().with_block_capacity(0);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
