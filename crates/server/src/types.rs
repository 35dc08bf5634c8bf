use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{
    ChartPoint, ChartRange, Coin, CoinDetail, Currency, Filter, MarketStats, PreferenceStore, RefreshScheduler,
    RefreshState, RequestFence,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::client::MarketDataSource;

/// The coin list from the most recently applied fetch.
#[derive(Debug, Clone, Serialize)]
pub struct CoinSnapshot {
    pub currency: Currency,
    pub coins: Vec<Coin>,
    pub fetched_at: DateTime<Utc>,
}

pub struct AppState {
    pub source: Arc<dyn MarketDataSource>,
    pub cache: Arc<Mutex<Option<CoinSnapshot>>>,
    pub scheduler: Arc<Mutex<RefreshScheduler>>,
    pub preferences: Arc<Mutex<PreferenceStore>>,
    pub fence: Arc<RequestFence>,
    pub page_size: u32,
}

/// Locks a shared value, recovering the data if a panicking thread poisoned it.
pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl AppState {
    pub fn currency(&self) -> Currency {
        lock(&self.preferences).currency()
    }

    pub fn snapshot(&self) -> Option<CoinSnapshot> {
        lock(&self.cache).clone()
    }
}

/// Query string of the dashboard page and `/api/coins`. The currency always
/// comes from the stored preference.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct DashboardQuery {
    pub q: Option<String>,
    pub filter: Option<String>,
}

impl DashboardQuery {
    pub fn search(&self) -> &str {
        self.q.as_deref().map(str::trim).unwrap_or("")
    }

    pub fn filter(&self) -> Filter {
        Filter::parse_or_default(self.filter.as_deref())
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct DetailQuery {
    pub days: Option<u32>,
    pub currency: Option<String>,
    pub back: Option<String>,
}

impl DetailQuery {
    /// Unsupported day counts fall back to the default range.
    pub fn range(&self) -> ChartRange {
        self.days.and_then(ChartRange::from_days).unwrap_or_default()
    }

    /// Per-request currency for the JSON API; never stored.
    pub fn currency(&self) -> Option<Currency> {
        self.currency.as_deref().and_then(|c| c.parse().ok())
    }

    /// Dashboard URL the close button returns to.
    pub fn back(&self) -> &str {
        same_site(self.back.as_deref())
    }
}

fn same_site(path: Option<&str>) -> &str {
    match path {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path,
        _ => "/",
    }
}

/// Where to send the browser after a form post.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RedirectQuery {
    pub next: Option<String>,
}

impl RedirectQuery {
    /// Only same-site paths are followed.
    pub fn target(&self) -> &str {
        same_site(self.next.as_deref())
    }
}

/// Countdown state exposed to the page and the JSON API.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RefreshStatus {
    pub seconds_left: u32,
    pub interval_seconds: u32,
    pub state: RefreshState,
}

impl RefreshStatus {
    pub fn from_scheduler(scheduler: &RefreshScheduler) -> Self {
        RefreshStatus {
            seconds_left: scheduler.seconds_left(),
            interval_seconds: scheduler.interval_seconds(),
            state: scheduler.state(),
        }
    }

    pub fn is_refreshing(&self) -> bool {
        self.state == RefreshState::Refreshing
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CoinsResponse {
    pub currency: Currency,
    pub filter: Filter,
    pub query: String,
    pub coins: Vec<Coin>,
    pub stats: MarketStats,
    pub watchlist: Vec<String>,
    pub refresh: RefreshStatus,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DetailResponse {
    pub currency: Currency,
    pub days: u32,
    pub detail: CoinDetail,
    pub chart: Vec<ChartPoint>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// CoinGecko ids are lowercase slugs; anything else never reaches the API.
pub fn is_valid_coin_id(coin_id: &str) -> bool {
    !coin_id.is_empty()
        && coin_id.len() <= 128
        && coin_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        && coin_id != "."
        && coin_id != ".."
}
