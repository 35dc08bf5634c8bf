use actix_web::web;
use chrono::Utc;
use log::{debug, error, info};
use shared::{ChartPoint, CoinDetail, Currency, MarketError, Tick};
use std::time::Duration;
use tokio::time;

use crate::types::{lock, AppState, CoinSnapshot};

/// Fetches the coin list in the preferred currency and stores it, unless a
/// newer fetch already landed while this one was in flight.
///
/// Returns the number of coins fetched, whether or not they were applied.
pub async fn refresh_coins(state: &AppState) -> Result<usize, MarketError> {
    let ticket = state.fence.next_ticket();
    let currency = state.currency();

    let coins = state.source.list_coins(currency, state.page_size).await?;
    let count = coins.len();

    // fence check and store happen under one lock so an older list can never
    // land after a newer one
    let mut cache = lock(&state.cache);
    if state.fence.try_apply(ticket) {
        *cache = Some(CoinSnapshot {
            currency,
            coins,
            fetched_at: Utc::now(),
        });
        debug!("Applied coin list #{} ({} coins, {})", ticket.value(), count, currency);
    } else {
        debug!("Discarding stale coin list #{}", ticket.value());
    }

    Ok(count)
}

/// Runs one fetch to completion and clears the scheduler's in-flight mark.
async fn run_dispatched_refresh(state: web::Data<AppState>) {
    if let Err(e) = refresh_coins(&state).await {
        error!("Scheduled refresh failed, keeping previous list: {}", e);
    }
    lock(&state.scheduler).finish_refresh();
}

/// Spawns a fetch for a `Tick::Refresh`. Periodic and manual refreshes never
/// cancel each other; the fence decides which response is kept.
pub fn dispatch_refresh(state: web::Data<AppState>) {
    tokio::spawn(run_dispatched_refresh(state));
}

/// Drives the refresh countdown once per second for the life of the server.
pub async fn run_refresh_scheduler(state: web::Data<AppState>) {
    {
        let mut scheduler = lock(&state.scheduler);
        scheduler.start();
        info!(
            "Auto refresh every {} seconds",
            scheduler.interval_seconds()
        );
    }

    let mut interval = time::interval(Duration::from_secs(1));
    // the first tick of a tokio interval completes immediately
    interval.tick().await;

    loop {
        interval.tick().await;

        let tick = lock(&state.scheduler).tick();
        if tick == Tick::Refresh {
            info!("Auto refresh triggered");
            dispatch_refresh(state.clone());
        }
    }
}

/// Coin list for `currency`, fetching it first when the cache is empty or
/// holds another currency.
pub async fn ensure_coins(state: &AppState, currency: Currency) -> Result<CoinSnapshot, MarketError> {
    if let Some(snapshot) = state.snapshot().filter(|s| s.currency == currency) {
        return Ok(snapshot);
    }

    refresh_coins(state).await?;
    match state.snapshot() {
        Some(snapshot) if snapshot.currency == currency => Ok(snapshot),
        // a concurrent currency switch won the race
        Some(snapshot) => Ok(snapshot),
        None => Err(MarketError::transient("no market data available")),
    }
}

/// Detail and chart are requested together; the view needs both, so either
/// failure fails the whole load.
pub async fn load_detail(
    state: &AppState,
    coin_id: &str,
    currency: Currency,
    days: u32,
) -> Result<(CoinDetail, Vec<ChartPoint>), MarketError> {
    let source = &state.source;
    tokio::try_join!(
        source.get_coin_detail(coin_id),
        source.get_coin_chart(coin_id, currency, days)
    )
}
