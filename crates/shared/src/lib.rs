// Domain library for the coin dashboard: market records, list composition,
// formatting, auto-refresh scheduling and persisted preferences.

pub mod composer;
pub mod error;
pub mod fence;
pub mod format;
pub mod logging;
pub mod preferences;
pub mod scheduler;
pub mod types;
pub mod watchlist;

pub use composer::{compose, MarketStats};
pub use error::MarketError;
pub use fence::{RequestFence, Ticket};
pub use format::{format_currency, format_large_number, format_percentage};
pub use logging::init_logging;
pub use preferences::{FileBackend, MemoryBackend, PreferenceError, PreferenceStore, StorageBackend};
pub use scheduler::{Clock, ManualClock, RefreshScheduler, RefreshState, SystemClock, Tick};
pub use types::{
    ChartPoint, ChartRange, Coin, CoinDescription, CoinDetail, CoinImage, CoinMarketData, Currency,
    Filter, LocalizedValue, TrendingCoin, TrendingItem,
};
pub use watchlist::Watchlist;
