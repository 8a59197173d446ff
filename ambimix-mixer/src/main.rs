//! Ambient sound mixer (ambimix-mixer) - Main entry point
//!
//! Runs the mixer service loop and serves the HTTP/SSE API.

use std::net::SocketAddr;
use std::path::PathBuf;

use ambimix_common::events::EventBus;
use ambimix_mixer::api::{self, AppState};
use ambimix_mixer::config::{MixerConfig, Overrides};
use ambimix_mixer::playback::VirtualBackend;
use ambimix_mixer::presets::{FileStorage, STORAGE_KEY};
use ambimix_mixer::service::{MixerParts, MixerService};
use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Capacity of the presentation event channel
const EVENT_CAPACITY: usize = 256;

/// Command-line arguments for ambimix-mixer
#[derive(Parser, Debug)]
#[command(name = "ambimix-mixer")]
#[command(about = "Ambient sound mixer service")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "AMBIMIX_PORT")]
    port: Option<u16>,

    /// Folder holding persisted presets
    #[arg(short, long, env = "AMBIMIX_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Folder holding the audio files named in the catalog
    #[arg(short, long, env = "AMBIMIX_AUDIO_FOLDER")]
    audio_folder: Option<PathBuf>,

    /// Configuration file (defaults to the platform config location)
    #[arg(short, long, env = "AMBIMIX_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = MixerConfig::load(
        args.config.as_deref(),
        Overrides {
            root_folder: args.root_folder,
            port: args.port,
            audio_folder: args.audio_folder,
        },
    )
    .context("Failed to load configuration")?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.default_log_filter().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ambimix mixer on port {}", config.port);
    info!("Root folder: {}", config.root_folder.display());

    let backend = match &config.audio_folder {
        Some(folder) => {
            info!("Audio folder: {}", folder.display());
            VirtualBackend::with_audio_folder(folder.clone(), config.verify_files)
        }
        None => VirtualBackend::new(),
    };
    let storage = FileStorage::new(&config.root_folder, STORAGE_KEY);
    info!("Presets stored in {}", storage.path().display());

    let events = EventBus::new(EVENT_CAPACITY);
    let (mixer, service_task) = MixerService::launch(MixerParts {
        catalog: config.catalog.clone(),
        backend: Box::new(backend),
        storage: Box::new(storage),
        events: events.clone(),
        initial_master_volume: config.initial_master_volume,
    });

    let app = api::create_router(AppState {
        mixer,
        events,
        port: config.port,
    });

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    service_task.abort();
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
