//! tilawa-bookmarks - Bookmark reconciliation service
//!
//! Serves bookmark status for the reading UI and keeps stored bookmarks
//! consistent with the verses they reference.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tilawa_bookmarks::content_client::ContentApiClient;
use tilawa_bookmarks::fetch::VerseCache;
use tilawa_bookmarks::store::SqliteBookmarkStore;
use tilawa_bookmarks::{build_router, AppState, BookmarkService};
use tilawa_common::config::{
    default_config_path, RootFolderInitializer, RootFolderResolver, TomlConfig,
};
use tilawa_common::db::init_database;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for tilawa-bookmarks
#[derive(Parser, Debug)]
#[command(name = "tilawa-bookmarks")]
#[command(about = "Bookmark reconciliation service for Tilawa")]
#[command(version)]
struct Args {
    /// Port to listen on (overrides config)
    #[arg(short, long, env = "TILAWA_BOOKMARKS_PORT")]
    port: Option<u16>,

    /// Root folder holding tilawa.db
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// Path to tilawa.toml
    #[arg(short, long, env = "TILAWA_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args.config.clone().or_else(default_config_path);
    let toml = config_path
        .as_deref()
        .map(TomlConfig::load_or_default)
        .unwrap_or_default();

    let level = toml.log_level().to_string();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("tilawa_bookmarks={level},tilawa_common={level},tower_http={level}").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting Tilawa Bookmarks (tilawa-bookmarks) v{}",
        env!("CARGO_PKG_VERSION")
    );
    match &config_path {
        Some(path) if path.exists() => info!("Config file: {}", path.display()),
        _ => info!("No config file found, using defaults"),
    }

    let root_folder = RootFolderResolver::new("tilawa-bookmarks")
        .with_cli_arg(args.root_folder.clone())
        .with_toml(&toml)
        .resolve();
    let initializer = RootFolderInitializer::new(root_folder);
    initializer.ensure_directory_exists()?;

    let db_path = initializer.database_path();
    info!("Database path: {}", db_path.display());
    let pool = init_database(&db_path)
        .await
        .context("Failed to initialize database")?;

    let client = ContentApiClient::new(toml.content_api_url(), toml.translation_id())
        .context("Failed to create content API client")?;
    info!("Content API: {}", toml.content_api_url());

    let store = Arc::new(SqliteBookmarkStore::new(pool));
    let verses = VerseCache::new(Arc::new(client));
    let service = BookmarkService::new(store, verses, Vec::new(), toml.fallback_translation.clone());

    // Without chapters only verse keys and direct ids resolve; reload later via the API
    if let Err(e) = service.load_chapters().await {
        warn!("Could not load chapter list: {}", e);
    }

    let _listener_task = service.spawn_settle_listener();

    let app = build_router(AppState::new(service));

    let port = args.port.unwrap_or_else(|| toml.port());
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("tilawa-bookmarks listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("tilawa-bookmarks stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
    }
}
