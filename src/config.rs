//! Application configuration
//!
//! Configuration is loaded from multiple sources with the following priority (lowest to highest):
//! 1. `config/default.toml` (version controlled)
//! 2. `config/user.toml` (gitignored, user overrides)
//! 3. Environment variables (`R2D_SECTION__KEY`)

use figment::{Figment, providers::{Format, Toml, Env}};
use rust2d_core::{Color, EngineConfig};
use serde::{Serialize, Deserialize};
use std::path::Path;
use thiserror::Error;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Window configuration
    #[serde(default)]
    pub window: WindowConfig,
    /// Loop timing and simulation
    #[serde(default)]
    pub engine: EngineSection,
    /// Rendering configuration
    #[serde(default)]
    pub rendering: RenderingConfig,
    /// Debug configuration
    #[serde(default)]
    pub debug: DebugConfig,
    /// Demo scene
    #[serde(default)]
    pub demo: DemoConfig,
}

impl AppConfig {
    /// Load configuration from default locations
    ///
    /// Priority (lowest to highest):
    /// 1. `config/default.toml`
    /// 2. `config/user.toml`
    /// 3. Environment variables (`R2D_*`)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific config directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();
        let default_path = config_dir.join("default.toml");
        let user_path = config_dir.join("user.toml");

        let mut figment = Figment::new();

        if default_path.exists() {
            figment = figment.merge(Toml::file(&default_path));
        }

        // Optional
        if user_path.exists() {
            figment = figment.merge(Toml::file(&user_path));
        }

        // R2D_ENGINE__TICK_RATE=60 -> engine.tick_rate = 60
        figment = figment.merge(Env::prefixed("R2D_").split("__"));

        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that parse but cannot run
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.to_engine_config()
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if self.rendering.batch_capacity == 0 {
            return Err(ConfigError::Invalid(
                "rendering.batch_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Runtime settings for the engine loop
    pub fn to_engine_config(&self) -> EngineConfig {
        EngineConfig {
            tick_rate: self.engine.tick_rate,
            max_catch_up_ticks: self.engine.max_catch_up_ticks,
            clear_color: Color::from(self.rendering.clear_color),
        }
    }
}

/// Window configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window title
    pub title: String,
    /// Window width in pixels
    pub width: u32,
    /// Window height in pixels
    pub height: u32,
    /// Start in fullscreen mode
    pub fullscreen: bool,
    /// Enable VSync
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Rust2D".to_string(),
            width: 1280,
            height: 720,
            fullscreen: false,
            vsync: true,
        }
    }
}

/// Engine loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSection {
    /// Fixed ticks per second
    pub tick_rate: f64,
    /// Most ticks run before a frame is rendered anyway
    pub max_catch_up_ticks: u32,
    /// Run the entity overlap scan each tick
    pub entity_collision: bool,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            tick_rate: 25.0,
            max_catch_up_ticks: 5,
            entity_collision: true,
        }
    }
}

/// Rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderingConfig {
    /// Instances per batch before a forced flush
    pub batch_capacity: usize,
    /// Background color [r, g, b, a]
    pub clear_color: [f32; 4],
}

impl Default for RenderingConfig {
    fn default() -> Self {
        Self {
            batch_capacity: 1000,
            clear_color: [0.02, 0.02, 0.08, 1.0],
        }
    }
}

/// Debug configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
    /// Outline every bounding volume
    pub show_bounds: bool,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            show_bounds: false,
        }
    }
}

/// Demo scene configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Boxes spawned at start
    pub boxes: usize,
    /// Contacts a box survives
    pub box_health: u32,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            boxes: 12,
            box_health: 5,
        }
    }
}

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Load(#[from] figment::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.engine.tick_rate, 25.0);
        assert_eq!(config.engine.max_catch_up_ticks, 5);
        assert_eq!(config.rendering.batch_capacity, 1000);
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml = toml::to_string(&config).unwrap();
        assert!(toml.contains("title"));
        assert!(toml.contains("tick_rate"));
        assert!(toml.contains("batch_capacity"));
    }

    #[test]
    fn test_partial_sections_use_defaults() {
        let config: AppConfig = toml::from_str("[engine]\ntick_rate = 60.0\n").unwrap();
        assert_eq!(config.engine.tick_rate, 60.0);
        assert_eq!(config.engine.max_catch_up_ticks, 5);
        assert_eq!(config.window.title, "Rust2D");
    }

    #[test]
    fn test_validate_rejects_stalling_values() {
        assert!(AppConfig::default().validate().is_ok());

        let mut config = AppConfig::default();
        config.engine.tick_rate = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = AppConfig::default();
        config.engine.tick_rate = -1.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = AppConfig::default();
        config.engine.max_catch_up_ticks = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = AppConfig::default();
        config.rendering.batch_capacity = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_to_engine_config() {
        let mut config = AppConfig::default();
        config.engine.tick_rate = 50.0;
        config.rendering.clear_color = [1.0, 0.0, 0.0, 1.0];
        let engine = config.to_engine_config();
        assert_eq!(engine.tick_rate, 50.0);
        assert_eq!(engine.tick_duration(), 0.02);
        assert_eq!(engine.clear_color, Color::RED);
    }
}
