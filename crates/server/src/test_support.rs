// Fixtures shared by the server's unit tests

use async_trait::async_trait;
use shared::{
    ChartPoint, Coin, CoinDetail, Currency, LocalizedValue, ManualClock, MarketError, MemoryBackend,
    PreferenceStore, RefreshScheduler, RequestFence, TrendingCoin, TrendingItem,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use std::time::Duration;

use crate::client::MarketDataSource;
use crate::types::AppState;

pub fn create_test_coin(id: &str, symbol: &str, name: &str, change: f64, market_cap: f64) -> Coin {
    Coin {
        id: id.to_string(),
        symbol: symbol.to_string(),
        name: name.to_string(),
        image: format!("https://assets.example.test/{}.png", id),
        current_price: 100.0,
        market_cap,
        market_cap_rank: None,
        price_change_percentage_24h: Some(change),
        total_volume: market_cap / 20.0,
    }
}

#[derive(Default)]
pub struct FakeSource {
    markets_fail: AtomicBool,
    chart_fail: AtomicBool,
    markets_calls: AtomicUsize,
    markets_gate: Mutex<Option<Arc<Notify>>>,
}

impl FakeSource {
    pub fn fail_markets(&self, fail: bool) {
        self.markets_fail.store(fail, Ordering::SeqCst);
    }

    pub fn fail_chart(&self, fail: bool) {
        self.chart_fail.store(fail, Ordering::SeqCst);
    }

    /// The next `list_coins` call waits until the returned gate is notified.
    pub fn hold_next_markets(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.markets_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn market_calls(&self) -> usize {
        self.markets_calls.load(Ordering::SeqCst)
    }
}

fn localized(usd: f64) -> LocalizedValue {
    LocalizedValue {
        usd: Some(usd),
        idr: Some(usd * 16_000.0),
    }
}

#[async_trait]
impl MarketDataSource for FakeSource {
    async fn list_coins(&self, currency: Currency, _page_size: u32) -> Result<Vec<Coin>, MarketError> {
        self.markets_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.markets_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.markets_fail.load(Ordering::SeqCst) {
            return Err(MarketError::transient("API error: 503 Service Unavailable"));
        }

        let scale = match currency {
            Currency::Usd => 1.0,
            Currency::Idr => 16_000.0,
        };
        Ok(vec![
            create_test_coin("bitcoin", "btc", "Bitcoin", 2.5, 1_300_000_000_000.0 * scale),
            create_test_coin("ethereum", "eth", "Ethereum", -1.5, 400_000_000_000.0 * scale),
            create_test_coin("solana", "sol", "Solana", 6.0, 80_000_000_000.0 * scale),
        ])
    }

    async fn get_coin_detail(&self, coin_id: &str) -> Result<CoinDetail, MarketError> {
        if coin_id != "bitcoin" {
            return Err(MarketError::NotFound(coin_id.to_string()));
        }

        let mut detail = CoinDetail {
            id: "bitcoin".to_string(),
            symbol: "btc".to_string(),
            name: "Bitcoin".to_string(),
            image: Default::default(),
            market_data: Default::default(),
            description: Default::default(),
        };
        detail.image.large = "https://assets.example.test/bitcoin-large.png".to_string();
        detail.market_data.current_price = localized(67_000.0);
        detail.market_data.market_cap = localized(1_300_000_000_000.0);
        detail.market_data.total_volume = localized(25_000_000_000.0);
        detail.market_data.high_24h = localized(68_000.0);
        detail.market_data.low_24h = localized(65_500.0);
        detail.market_data.ath = localized(73_750.0);
        detail.market_data.atl = localized(67.81);
        detail.market_data.price_change_percentage_24h = Some(2.5);
        detail.market_data.price_change_percentage_7d = Some(-3.1);
        detail.market_data.circulating_supply = Some(19_700_000.0);
        detail.description.en = Some(
            "Bitcoin is the first cryptocurrency. It uses <a href=\"https://bitcoin.org\">proof of work</a>. \
             Supply is capped. Blocks arrive every ten minutes."
                .to_string(),
        );
        Ok(detail)
    }

    async fn get_coin_chart(&self, coin_id: &str, _currency: Currency, days: u32) -> Result<Vec<ChartPoint>, MarketError> {
        if coin_id != "bitcoin" {
            return Err(MarketError::NotFound(coin_id.to_string()));
        }
        if self.chart_fail.load(Ordering::SeqCst) {
            return Err(MarketError::transient("API error: 500 Internal Server Error"));
        }

        let step = i64::from(days) * 86_400_000 / 2;
        Ok(vec![
            ChartPoint { timestamp: 1_704_067_200_000, price: 64_000.0 },
            ChartPoint { timestamp: 1_704_067_200_000 + step, price: 66_500.0 },
            ChartPoint { timestamp: 1_704_067_200_000 + 2 * step, price: 67_000.0 },
        ])
    }

    async fn get_trending(&self) -> Result<Vec<TrendingCoin>, MarketError> {
        Ok(vec![TrendingCoin {
            item: TrendingItem {
                id: "pepe".to_string(),
                coin_id: 29850,
                name: "Pepe".to_string(),
                symbol: "PEPE".to_string(),
                market_cap_rank: Some(24),
                thumb: String::new(),
                small: String::new(),
                large: String::new(),
                slug: "pepe".to_string(),
                price_btc: 1.5e-10,
                score: 0,
            },
        }])
    }
}

pub fn create_test_state(source: Arc<dyn MarketDataSource>) -> AppState {
    let scheduler = RefreshScheduler::new(60, Arc::new(ManualClock::new()))
        .with_min_visible(Duration::ZERO);

    AppState {
        source,
        cache: Arc::new(Mutex::new(None)),
        scheduler: Arc::new(Mutex::new(scheduler)),
        preferences: Arc::new(Mutex::new(PreferenceStore::load(MemoryBackend::new()))),
        fence: Arc::new(RequestFence::new()),
        page_size: 100,
    }
}
