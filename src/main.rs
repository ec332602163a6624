use std::process::ExitCode;

use portal_scene::{AppError, SceneConfig};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), AppError> {
    let config = match std::env::args_os().nth(1) {
        Some(path) => {
            log::info!("loading config from {}", path.to_string_lossy());
            SceneConfig::load(path)?
        }
        None => SceneConfig::default(),
    };
    portal_scene::run(config)
}
