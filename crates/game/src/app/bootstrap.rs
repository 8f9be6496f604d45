use engine::{resolve_app_paths, AppError, GameSession, LoopConfig, TileMap};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::settings::{load_settings, SettingsError, SETTINGS_FILE};

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) session: GameSession,
}

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    App(#[from] AppError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

pub(crate) fn build_app() -> Result<AppWiring, BootstrapError> {
    let paths = resolve_app_paths().map_err(AppError::from)?;
    info!(
        root = %paths.root.display(),
        assets_dir = %paths.assets_dir.display(),
        version = env!("CARGO_PKG_VERSION"),
        "startup"
    );

    let settings = load_settings(&paths.assets_dir.join(SETTINGS_FILE))?;
    let level_path = settings.level_path(&paths.assets_dir);
    let map = TileMap::load(&level_path).map_err(AppError::from)?;
    info!(
        level = %level_path.display(),
        width = map.width(),
        height = map.height(),
        "map_loaded"
    );

    Ok(AppWiring {
        config: settings.loop_config(),
        session: GameSession::new(map, settings.session_config()),
    })
}

pub(crate) fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}
