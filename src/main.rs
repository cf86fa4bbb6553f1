//! Séance - a haunted front-end for the Gopher archive
//!
//! Main entry point: loads configuration, starts the session loop and
//! runs the egui window.

use anyhow::{anyhow, Result};
use eframe::egui;
use seance::integration::{build_runtime, SeanceConfig};
use seance::ui::{AppState, OverlayStage, SeanceApp};
use seance::SeanceError;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Tell the user what went wrong before the window ever opened
fn startup_failure(e: SeanceError) -> anyhow::Error {
    error!("{}", e.user_message());
    anyhow!(e)
}

fn main() -> Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "seance=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Séance");

    let config = SeanceConfig::from_env().map_err(startup_failure)?;
    config.validate().map_err(startup_failure)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()?;

    let stage = OverlayStage::new(config.sting.exit_animation);
    let (session, handle, _output, client) =
        build_runtime(&config, Box::new(stage.clone()), runtime.handle().clone())
            .map_err(startup_failure)?;
    let session_thread = session.start().map_err(startup_failure)?;

    let state = AppState::connected(handle.clone(), client, runtime.handle().clone());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 760.0])
            .with_min_inner_size([640.0, 480.0])
            .with_title("Séance"),
        ..Default::default()
    };

    let result = eframe::run_native(
        "Séance",
        options,
        Box::new(move |cc| Ok(Box::new(SeanceApp::new(cc, state, stage)))),
    )
    .map_err(|e| anyhow!("UI error: {}", e));

    // on_exit already asked the loop to stop unless the window failed to open
    let _ = handle.shutdown();
    if session_thread.join().is_err() {
        warn!("Session loop panicked");
    }

    info!("Séance ended");
    result
}
