//! # Core Module
//!
//! Shared configuration consumed by the scene, the builders and the mesh arena.

pub mod config;

pub use config::{ArenaConfig, DisplayConfig, EditorConfig};
pub use crate::config::{Config, ConfigError};
