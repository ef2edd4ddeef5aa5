pub mod app;
pub mod canvas;
pub mod config;
pub mod editor;
pub mod error;
pub mod export;
pub mod geometry;
pub mod imaging;
pub mod input;
pub mod logging;
pub mod state;
pub mod template;
#[cfg(feature = "ui")]
pub mod ui;
pub use error::{AppError, AppResult};

/// Loads configuration, installs logging and runs the desktop editor.
#[cfg(feature = "ui")]
pub fn run() -> AppResult<()> {
    let config = config::load_app_config();
    logging::init(config.debug_logging);
    tracing::info!("starting memegen");

    ui::run(config)?;

    tracing::info!("memegen exited");
    Ok(())
}
