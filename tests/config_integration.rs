//! Integration tests for configuration loading
//!
//! Tests that verify config loading from files and environment variables.

use rust2d::config::{AppConfig, ConfigError};
use serial_test::serial;

#[test]
#[serial]
fn test_env_override() {
    std::env::set_var("R2D_WINDOW__TITLE", "Test From Env");
    let config = AppConfig::load().unwrap();
    assert_eq!(config.window.title, "Test From Env");
    std::env::remove_var("R2D_WINDOW__TITLE");
}

#[test]
#[serial]
fn test_env_override_engine_section() {
    std::env::set_var("R2D_ENGINE__TICK_RATE", "60");
    std::env::set_var("R2D_ENGINE__MAX_CATCH_UP_TICKS", "3");
    let config = AppConfig::load().unwrap();
    std::env::remove_var("R2D_ENGINE__TICK_RATE");
    std::env::remove_var("R2D_ENGINE__MAX_CATCH_UP_TICKS");

    let engine = config.to_engine_config();
    assert_eq!(engine.tick_rate, 60.0);
    assert_eq!(engine.max_catch_up_ticks, 3);
}

#[test]
#[serial]
fn test_default_file_loading() {
    std::env::remove_var("R2D_WINDOW__TITLE");

    let cwd = std::env::current_dir().unwrap();
    assert!(cwd.join("config/default.toml").exists());

    let config = AppConfig::load().unwrap();
    assert_eq!(config.engine.tick_rate, 25.0);
    assert_eq!(config.engine.max_catch_up_ticks, 5);
    assert_eq!(config.rendering.batch_capacity, 1000);
}

#[test]
#[serial]
fn test_missing_directory_gives_defaults() {
    let config = AppConfig::load_from("does/not/exist").unwrap();
    assert_eq!(config.window.title, "Rust2D");
    assert!(config.engine.entity_collision);
}

#[test]
#[serial]
fn test_bad_value_is_an_error() {
    std::env::set_var("R2D_ENGINE__TICK_RATE", "fast");
    let result = AppConfig::load();
    std::env::remove_var("R2D_ENGINE__TICK_RATE");

    let err = result.unwrap_err();
    assert!(err.to_string().starts_with("Configuration error"));
}

#[test]
#[serial]
fn test_zero_tick_rate_from_env_is_rejected() {
    std::env::set_var("R2D_ENGINE__TICK_RATE", "0");
    let result = AppConfig::load();
    std::env::remove_var("R2D_ENGINE__TICK_RATE");

    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}

#[test]
#[serial]
fn test_zero_catch_up_from_env_is_rejected() {
    std::env::set_var("R2D_ENGINE__MAX_CATCH_UP_TICKS", "0");
    let result = AppConfig::load();
    std::env::remove_var("R2D_ENGINE__MAX_CATCH_UP_TICKS");

    let err = result.unwrap_err();
    assert!(err.to_string().contains("max_catch_up_ticks"), "got {}", err);
}
