mod app;

use std::{
    fs::{self, OpenOptions},
    sync::{Arc, Mutex},
};

use anyhow::{Context, Result};
use metroquest_core::{
    config::{self, AppConfig},
    CityRegistry, GameEngine, GameState, HttpGraphService,
};
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = config::ensure_default_config()?;
    let config = AppConfig::load()?;
    init_logging(&config)?;
    info!(
        config = %config_path.display(),
        api = %config.api_base_url,
        city = %config.default_city,
        "starting metroquest"
    );

    let service =
        HttpGraphService::from_config(&config).context("failed to build graph service client")?;
    let state = GameState::new(CityRegistry::builtin(), &config.default_city);
    let (engine, responses) = GameEngine::new(Arc::new(service), state);

    let mut app = app::MetroQuestApp::new(engine);
    app.run(responses).await
}

fn init_logging(config: &AppConfig) -> Result<()> {
    let log_dir = std::env::current_dir()?.join(&config.log_dir);
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;
    let log_path = log_dir.join("metroquest.log");
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open log file {}", log_path.display()))?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // The terminal belongs to the UI, so logs only go to the file.
    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .compact()
        .with_writer(Mutex::new(log_file));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(())
}
