// Coin dashboard server
// Serves the market list, coin detail pages and a JSON API on top of CoinGecko

use actix_web::{middleware::Logger, web, App, HttpServer};
use log::{error, info};
use reqwest::Client;
use shared::{FileBackend, PreferenceStore, RefreshScheduler, RequestFence, SystemClock};
use std::sync::{Arc, Mutex};

mod client;
mod config;
mod data;
mod handlers;
mod render;
mod types;

#[cfg(test)]
mod test_support;

use client::CoinGeckoClient;
use config::ServerConfig;
use data::{refresh_coins, run_refresh_scheduler};
use types::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let config = ServerConfig::load().map_err(|e| {
        eprintln!("Failed to load server configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, e)
    })?;

    config.setup_logging();

    let source = CoinGeckoClient::new(Client::new(), config.api_base.clone(), config.api_key.clone());

    let backend = FileBackend::open(&config.preferences_path);
    info!("Preferences stored in {}", backend.path().display());
    let preferences = PreferenceStore::load(backend);

    let scheduler = RefreshScheduler::new(config.refresh_interval_seconds, Arc::new(SystemClock))
        .with_min_visible(config.min_refresh_visible);

    let state = web::Data::new(AppState {
        source: Arc::new(source),
        cache: Arc::new(Mutex::new(None)),
        scheduler: Arc::new(Mutex::new(scheduler)),
        preferences: Arc::new(Mutex::new(preferences)),
        fence: Arc::new(RequestFence::new()),
        page_size: config.page_size,
    });

    info!("Fetching initial coin list...");
    match refresh_coins(&state).await {
        Ok(count) => info!("Loaded {} coins", count),
        Err(e) => {
            error!("Initial fetch failed: {}", e);
            info!("Server will start with an empty list and retry on the next request");
        }
    }

    tokio::spawn(run_refresh_scheduler(state.clone()));

    info!(
        "Starting coin dashboard on http://{}:{}",
        config.http_host, config.http_port
    );

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .configure(handlers::configure)
    })
    .bind((config.http_host.as_str(), config.http_port))?
    .run()
    .await
}
