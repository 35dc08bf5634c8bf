use actix_web::http::{header, StatusCode};
use actix_web::{get, post, web, HttpResponse, Responder};
use chrono::Utc;
use log::{error, info, warn};
use shared::{compose, Coin, Currency, MarketError, MarketStats, Tick, Watchlist};

use crate::data::{dispatch_refresh, ensure_coins, load_detail};
use crate::render::{self, DashboardView, DetailView};
use crate::types::{
    is_valid_coin_id, lock, AppState, CoinSnapshot, CoinsResponse, DashboardQuery, DetailQuery, DetailResponse,
    ErrorBody, RedirectQuery, RefreshStatus,
};

fn html(status: StatusCode, body: String) -> HttpResponse {
    HttpResponse::build(status)
        .content_type("text/html; charset=utf-8")
        .body(body)
}

fn json_error(status: StatusCode, message: impl Into<String>) -> HttpResponse {
    HttpResponse::build(status).json(ErrorBody {
        error: message.into(),
    })
}

fn redirect(target: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, target))
        .finish()
}

fn error_status(err: &MarketError) -> StatusCode {
    if err.is_not_found() {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::BAD_GATEWAY
    }
}

fn refresh_status(state: &AppState) -> RefreshStatus {
    RefreshStatus::from_scheduler(&lock(&state.scheduler))
}

/// Snapshot shaped for one view: filtered list plus whole-market totals.
struct ComposedList {
    snapshot: CoinSnapshot,
    coins: Vec<Coin>,
    stats: MarketStats,
    watchlist: Watchlist,
}

async fn compose_list(state: &AppState, query: &DashboardQuery) -> Result<ComposedList, MarketError> {
    let snapshot = ensure_coins(state, state.currency()).await?;
    let watchlist = lock(&state.preferences).watchlist().clone();

    let coins = compose(&snapshot.coins, query.search(), query.filter(), &watchlist);
    let stats = MarketStats::from_coins(&snapshot.coins);

    Ok(ComposedList {
        snapshot,
        coins,
        stats,
        watchlist,
    })
}

#[get("/")]
pub async fn dashboard(query: web::Query<DashboardQuery>, state: web::Data<AppState>) -> impl Responder {
    let list = match compose_list(&state, &query).await {
        Ok(list) => list,
        Err(e) => {
            error!("Dashboard unavailable: {}", e);
            let retry = render::dashboard_href(query.search(), query.filter());
            return html(
                StatusCode::SERVICE_UNAVAILABLE,
                render::render_error_page("Failed to load cryptocurrency data. Please try again.", &retry),
            );
        }
    };

    let view = DashboardView {
        currency: list.snapshot.currency,
        filter: query.filter(),
        query: query.search(),
        coins: &list.coins,
        stats: list.stats,
        watchlist: &list.watchlist,
        refresh: refresh_status(&state),
        last_updated: list.snapshot.fetched_at.format("%H:%M:%S UTC").to_string(),
    };

    html(StatusCode::OK, render::render_dashboard(&view))
}

#[get("/coins/{id}")]
pub async fn coin_detail(
    path: web::Path<String>,
    query: web::Query<DetailQuery>,
    state: web::Data<AppState>,
) -> impl Responder {
    let coin_id = path.into_inner();
    let back = query.back();
    let range = query.range();

    if !is_valid_coin_id(&coin_id) {
        return html(
            StatusCode::BAD_REQUEST,
            render::render_error_page("Unknown coin.", back),
        );
    }

    // pages follow the stored preference; only POST /currency changes it
    let currency = state.currency();
    info!("Detail request: {} ({}, {} days)", coin_id, currency, range.days());

    match load_detail(&state, &coin_id, currency, range.days()).await {
        Ok((detail, chart)) => {
            let view = DetailView {
                detail: &detail,
                chart: &chart,
                currency,
                range,
                back,
            };
            html(StatusCode::OK, render::render_detail(&view))
        }
        Err(e) => {
            warn!("Detail for {} failed: {}", coin_id, e);
            let message = if e.is_not_found() {
                "This coin could not be found."
            } else {
                "Failed to load coin details. Please try again."
            };
            html(
                error_status(&e),
                render::render_detail_error(&coin_id, message, range, back),
            )
        }
    }
}

#[post("/watchlist/{id}/toggle")]
pub async fn toggle_watchlist(
    path: web::Path<String>,
    query: web::Query<RedirectQuery>,
    state: web::Data<AppState>,
) -> impl Responder {
    let coin_id = path.into_inner();
    if !is_valid_coin_id(&coin_id) {
        return html(
            StatusCode::BAD_REQUEST,
            render::render_error_page("Unknown coin.", query.target()),
        );
    }

    match lock(&state.preferences).toggle_watchlist(&coin_id) {
        Ok(true) => info!("Added {} to watchlist", coin_id),
        Ok(false) => info!("Removed {} from watchlist", coin_id),
        Err(e) => error!("Failed to persist watchlist: {}", e),
    }

    redirect(query.target())
}

#[post("/currency/{currency}")]
pub async fn switch_currency(
    path: web::Path<String>,
    query: web::Query<RedirectQuery>,
    state: web::Data<AppState>,
) -> impl Responder {
    let currency: Currency = match path.parse() {
        Ok(currency) => currency,
        Err(e) => {
            return html(
                StatusCode::BAD_REQUEST,
                render::render_error_page(&e, query.target()),
            )
        }
    };

    if let Err(e) = lock(&state.preferences).set_currency(currency) {
        error!("Failed to persist currency {}: {}", currency, e);
    }
    info!("Display currency set to {}", currency);

    redirect(query.target())
}

#[post("/refresh")]
pub async fn refresh_now(query: web::Query<RedirectQuery>, state: web::Data<AppState>) -> impl Responder {
    let tick = lock(&state.scheduler).refresh_now();
    if tick == Tick::Refresh {
        info!("Manual refresh requested");
        dispatch_refresh(state.clone());
    }
    redirect(query.target())
}

#[get("/api/coins")]
pub async fn api_coins(query: web::Query<DashboardQuery>, state: web::Data<AppState>) -> impl Responder {
    match compose_list(&state, &query).await {
        Ok(list) => HttpResponse::Ok().json(CoinsResponse {
            currency: list.snapshot.currency,
            filter: query.filter(),
            query: query.search().to_string(),
            coins: list.coins,
            stats: list.stats,
            watchlist: list.watchlist.iter().map(str::to_string).collect(),
            refresh: refresh_status(&state),
            last_updated: list.snapshot.fetched_at,
        }),
        Err(e) => json_error(StatusCode::SERVICE_UNAVAILABLE, e.to_string()),
    }
}

#[get("/api/coins/{id}")]
pub async fn api_coin_detail(
    path: web::Path<String>,
    query: web::Query<DetailQuery>,
    state: web::Data<AppState>,
) -> impl Responder {
    let coin_id = path.into_inner();
    if !is_valid_coin_id(&coin_id) {
        return json_error(StatusCode::BAD_REQUEST, format!("invalid coin id: {}", coin_id));
    }

    let currency = query.currency().unwrap_or_else(|| state.currency());
    let days = query.range().days();

    match load_detail(&state, &coin_id, currency, days).await {
        Ok((detail, chart)) => HttpResponse::Ok().json(DetailResponse {
            currency,
            days,
            detail,
            chart,
        }),
        Err(e) => json_error(error_status(&e), e.to_string()),
    }
}

#[get("/api/coins/{id}/chart")]
pub async fn api_coin_chart(
    path: web::Path<String>,
    query: web::Query<DetailQuery>,
    state: web::Data<AppState>,
) -> impl Responder {
    let coin_id = path.into_inner();
    if !is_valid_coin_id(&coin_id) {
        return json_error(StatusCode::BAD_REQUEST, format!("invalid coin id: {}", coin_id));
    }

    let currency = query.currency().unwrap_or_else(|| state.currency());
    match state.source.get_coin_chart(&coin_id, currency, query.range().days()).await {
        Ok(points) => HttpResponse::Ok().json(points),
        Err(e) => json_error(error_status(&e), e.to_string()),
    }
}

#[get("/api/trending")]
pub async fn api_trending(state: web::Data<AppState>) -> impl Responder {
    match state.source.get_trending().await {
        Ok(trending) => HttpResponse::Ok().json(trending),
        Err(e) => json_error(StatusCode::BAD_GATEWAY, e.to_string()),
    }
}

/// Totals over the full cached list, ignoring search and filter.
#[get("/api/summary")]
pub async fn api_summary(state: web::Data<AppState>) -> impl Responder {
    match ensure_coins(&state, state.currency()).await {
        Ok(snapshot) => {
            let stats = MarketStats::from_coins(&snapshot.coins);
            HttpResponse::Ok().json(serde_json::json!({
                "currency": snapshot.currency,
                "stats": stats,
                "btc_dominance_display": stats.btc_dominance_display(),
                "last_updated": snapshot.fetched_at,
            }))
        }
        Err(e) => json_error(StatusCode::SERVICE_UNAVAILABLE, e.to_string()),
    }
}

#[get("/health")]
pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let snapshot = state.snapshot();
    web::Json(serde_json::json!({
        "status": "ok",
        "timestamp": Utc::now(),
        "coins_cached": snapshot.as_ref().map_or(0, |s| s.coins.len()),
        "last_updated": snapshot.map(|s| s.fetched_at),
        "refresh": refresh_status(&state),
    }))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(dashboard)
        .service(coin_detail)
        .service(toggle_watchlist)
        .service(switch_currency)
        .service(refresh_now)
        .service(api_coins)
        .service(api_coin_chart)
        .service(api_coin_detail)
        .service(api_trending)
        .service(api_summary)
        .service(health_check);
}
