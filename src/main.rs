//! Rust2D - fixed-timestep 2D engine
//!
//! Opens a window, sets up the batched renderer and runs the demo state.

use std::process::ExitCode;

use rust2d::config::AppConfig;
use rust2d::demo::{self, DemoState};
use rust2d::systems::WinitWindow;
use rust2d_core::{Engine, RunOutcome, Vec2};
use rust2d_render::{font::builtin, BatchRenderer, WgpuDevice};

/// Half size of one builtin glyph in clip space
const GLYPH_HALF_SIZE: Vec2 = Vec2::new(0.012, 0.02);

fn run(config: AppConfig) -> Result<RunOutcome, Box<dyn std::error::Error>> {
    let window = WinitWindow::create(&config.window)?;
    let device = WgpuDevice::new(window.handle(), config.window.vsync, config.rendering.batch_capacity)?;
    let mut renderer = BatchRenderer::new(Box::new(device), config.rendering.batch_capacity);

    let font_texture =
        renderer.create_texture("builtin.font", builtin::WIDTH, builtin::HEIGHT, &builtin::pixels())?;
    let font = builtin::font(font_texture, GLYPH_HALF_SIZE);
    let font_name = font.name().to_string();

    let mut engine = Engine::new(config.to_engine_config(), Box::new(window), renderer);
    engine.register_font(font)?;
    engine.use_font(&font_name)?;
    demo::register_assets(&mut engine)?;
    engine.register_state(DemoState::new(&config))?;
    engine.set_current_state(DemoState::ID)?;

    Ok(engine.run()?)
}

fn main() -> ExitCode {
    let (config, config_error) = match AppConfig::load() {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    // RUST_LOG wins over the configured level
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.debug.log_level.as_str()),
    )
    .init();
    if let Some(e) = config_error {
        log::warn!("Failed to load config: {}. Using defaults.", e);
    }
    log::info!("Starting Rust2D");

    match run(config) {
        Ok(RunOutcome::Stopped) => ExitCode::SUCCESS,
        Ok(RunOutcome::ForceQuit) => {
            log::warn!("Engine was force quit");
            ExitCode::FAILURE
        }
        Err(e) => {
            log::error!("Fatal: {}", e);
            ExitCode::FAILURE
        }
    }
}
