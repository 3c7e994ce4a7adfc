use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::filter::LevelFilter;

use glowd::Config;
use glowd::api;
use glowd::api::AppState;
use glowd::predict::HttpRuleSource;
use glowd::settings::SettingsStore;
use glowd::status;
use glowd::store::Store;

/// Smart lighting control daemon
#[derive(Parser)]
#[command(name = "glowd", version)]
struct Args {
    /// Path to the TOML config file; built-in defaults apply when omitted
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    // Initialize tracing/logging
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::from(config.logging.level))
        .init();

    tracing::info!("glowd starting");
    if let Some(path) = &args.config {
        tracing::info!("Loaded config from: {}", path.display());
    }

    let settings_store = Arc::new(SettingsStore::new(config.storage.settings_path.clone()));

    // Settings are the only thing that survives a restart. The persisted
    // record may carry a password; the in-memory copy never does.
    let mut state = config.seed_state();
    state.settings = settings_store.load();
    state.settings.password.clear();
    tracing::info!(
        lights = state.lights.len(),
        settings_path = %settings_store.path().display(),
        "state seeded"
    );

    let store = Arc::new(Store::new(state, config.auth.secret.clone()));
    let rules = Arc::new(HttpRuleSource::new(&config.prediction)?);
    tracing::info!(endpoint = %config.prediction.endpoint, "prediction service configured");

    let status_task = status::spawn(store.clone());

    let app_state = Arc::new(AppState {
        store,
        settings_store,
        rules,
        version: env!("CARGO_PKG_VERSION"),
    });

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Received shutdown signal");
                let _ = shutdown_tx.send(());
            }
            Err(e) => {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
        }
    });

    api::serve(config.api.listen.clone(), config.api.port, app_state, shutdown_rx).await?;

    status_task.abort();
    tracing::info!("glowd shutdown complete");

    Ok(())
}
