use async_trait::async_trait;
use log::{debug, error, info, warn};
use reqwest::{header, Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use shared::{ChartPoint, Coin, CoinDetail, Currency, MarketError, TrendingCoin};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

pub const API_KEY_HEADER: &str = "x-cg-pro-api-key";
/// Window during which detail and chart responses are reused.
pub const REVALIDATE_WINDOW: Duration = Duration::from_secs(60);

/// Read-only market data operations the dashboard needs.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Coins ordered by market cap, descending, exactly as the API returns them.
    async fn list_coins(&self, currency: Currency, page_size: u32) -> Result<Vec<Coin>, MarketError>;

    async fn get_coin_detail(&self, coin_id: &str) -> Result<CoinDetail, MarketError>;

    /// Price series, oldest first.
    async fn get_coin_chart(&self, coin_id: &str, currency: Currency, days: u32) -> Result<Vec<ChartPoint>, MarketError>;

    async fn get_trending(&self) -> Result<Vec<TrendingCoin>, MarketError>;
}

#[derive(Debug, Deserialize)]
struct MarketChartResponse {
    prices: Vec<[f64; 2]>,
}

#[derive(Debug, Deserialize)]
struct TrendingResponse {
    #[serde(default)]
    coins: Vec<TrendingCoin>,
}

/// Bodies keyed by request URL, valid for a fixed window.
struct ResponseCache {
    entries: Mutex<HashMap<String, (String, Instant)>>,
    ttl: Duration,
}

impl ResponseCache {
    fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    fn get(&self, url: &str) -> Option<String> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(url)
            .filter(|(_, stored)| stored.elapsed() < self.ttl)
            .map(|(body, _)| body.clone())
    }

    fn insert(&self, url: String, body: String) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.retain(|_, (_, stored)| stored.elapsed() < self.ttl);
        entries.insert(url, (body, Instant::now()));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Freshness {
    /// Always hit the API.
    NoStore,
    /// Reuse a response younger than the revalidation window.
    Revalidate,
}

pub struct CoinGeckoClient {
    client: Client,
    api_base: String,
    api_key: Option<String>,
    cache: ResponseCache,
}

impl CoinGeckoClient {
    pub fn new(client: Client, api_base: impl Into<String>, api_key: Option<String>) -> Self {
        CoinGeckoClient {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_key,
            cache: ResponseCache::new(REVALIDATE_WINDOW),
        }
    }

    pub fn markets_url(&self, currency: Currency, page_size: u32) -> String {
        format!(
            "{}/coins/markets?vs_currency={}&order=market_cap_desc&per_page={}&page=1&sparkline=false&price_change_percentage=24h",
            self.api_base, currency, page_size
        )
    }

    pub fn detail_url(&self, coin_id: &str) -> String {
        format!(
            "{}/coins/{}?localization=false&tickers=false&community_data=false&developer_data=false",
            self.api_base, coin_id
        )
    }

    pub fn chart_url(&self, coin_id: &str, currency: Currency, days: u32) -> String {
        format!(
            "{}/coins/{}/market_chart?vs_currency={}&days={}",
            self.api_base, coin_id, currency, days
        )
    }

    pub fn trending_url(&self) -> String {
        format!("{}/search/trending", self.api_base)
    }

    async fn fetch_body(&self, url: &str, freshness: Freshness) -> Result<String, FetchError> {
        if freshness == Freshness::Revalidate {
            if let Some(body) = self.cache.get(url) {
                debug!("Serving cached response for {}", url);
                return Ok(body);
            }
        }

        let mut request = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/json");
        if freshness == Freshness::NoStore {
            request = request.header(header::CACHE_CONTROL, "no-cache");
        }
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request.send().await.map_err(|e| {
            error!("Request to {} failed: {}", url, e);
            FetchError::Transport(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            if status == StatusCode::TOO_MANY_REQUESTS {
                warn!("CoinGecko rate limit reached for {}", url);
            } else {
                error!("CoinGecko returned status {} for {}", status, url);
            }
            return Err(FetchError::Status(status));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        if freshness == Freshness::Revalidate {
            self.cache.insert(url.to_string(), body.clone());
        }
        Ok(body)
    }

    async fn fetch_json<T: DeserializeOwned>(&self, url: &str, freshness: Freshness) -> Result<T, MarketError> {
        let body = self.fetch_body(url, freshness).await.map_err(MarketError::from)?;
        parse_body(&body)
    }
}

enum FetchError {
    Transport(String),
    Status(StatusCode),
}

impl From<FetchError> for MarketError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Transport(message) => MarketError::Transient(message),
            FetchError::Status(status) => MarketError::Transient(format!("API error: {}", status)),
        }
    }
}

/// Malformed bodies are reported as transient, never passed inward.
pub fn parse_body<T: DeserializeOwned>(body: &str) -> Result<T, MarketError> {
    serde_json::from_str(body).map_err(|e| {
        error!("Failed to parse CoinGecko response: {}", e);
        MarketError::Transient(format!("malformed response: {}", e))
    })
}

/// Maps `[[timestamp_ms, price], ...]` to points, oldest first.
pub fn parse_chart(body: &str) -> Result<Vec<ChartPoint>, MarketError> {
    let raw: MarketChartResponse = parse_body(body)?;
    let mut points: Vec<ChartPoint> = raw
        .prices
        .into_iter()
        .map(|[timestamp, price]| ChartPoint {
            timestamp: timestamp as i64,
            price,
        })
        .collect();
    points.sort_by_key(|p| p.timestamp);
    Ok(points)
}

#[async_trait]
impl MarketDataSource for CoinGeckoClient {
    async fn list_coins(&self, currency: Currency, page_size: u32) -> Result<Vec<Coin>, MarketError> {
        let url = self.markets_url(currency, page_size);
        info!("Fetching {} coins in {} from CoinGecko", page_size, currency.code());

        let coins: Vec<Coin> = self.fetch_json(&url, Freshness::NoStore).await?;
        info!("Successfully fetched {} coins", coins.len());
        Ok(coins)
    }

    async fn get_coin_detail(&self, coin_id: &str) -> Result<CoinDetail, MarketError> {
        let url = self.detail_url(coin_id);
        match self.fetch_body(&url, Freshness::Revalidate).await {
            Ok(body) => parse_body(&body),
            Err(FetchError::Status(status)) if status == StatusCode::NOT_FOUND => {
                warn!("Unknown coin id: {}", coin_id);
                Err(MarketError::NotFound(coin_id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_coin_chart(&self, coin_id: &str, currency: Currency, days: u32) -> Result<Vec<ChartPoint>, MarketError> {
        let url = self.chart_url(coin_id, currency, days);
        let body = self.fetch_body(&url, Freshness::Revalidate).await?;
        let points = parse_chart(&body)?;
        debug!("Fetched {} chart points for {} ({} days)", points.len(), coin_id, days);
        Ok(points)
    }

    async fn get_trending(&self) -> Result<Vec<TrendingCoin>, MarketError> {
        let url = self.trending_url();
        let response: TrendingResponse = self.fetch_json(&url, Freshness::NoStore).await?;
        Ok(response.coins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_client() -> CoinGeckoClient {
        CoinGeckoClient::new(Client::new(), "https://api.example.test/api/v3/", None)
    }

    #[test]
    fn test_request_urls() {
        let client = create_test_client();

        assert_eq!(
            client.markets_url(Currency::Idr, 100),
            "https://api.example.test/api/v3/coins/markets?vs_currency=idr&order=market_cap_desc&per_page=100&page=1&sparkline=false&price_change_percentage=24h"
        );
        assert_eq!(
            client.detail_url("bitcoin"),
            "https://api.example.test/api/v3/coins/bitcoin?localization=false&tickers=false&community_data=false&developer_data=false"
        );
        assert_eq!(
            client.chart_url("ethereum", Currency::Usd, 30),
            "https://api.example.test/api/v3/coins/ethereum/market_chart?vs_currency=usd&days=30"
        );
        assert_eq!(client.trending_url(), "https://api.example.test/api/v3/search/trending");
    }

    #[test]
    fn test_parse_chart_orders_points() {
        let body = r#"{
            "prices": [[1704153600000, 45100.5], [1704067200000, 44000.0]],
            "market_caps": [],
            "total_volumes": []
        }"#;

        let points = parse_chart(body).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].timestamp, 1704067200000);
        assert_eq!(points[0].price, 44000.0);
        assert_eq!(points[1].price, 45100.5);
    }

    #[test]
    fn test_parse_chart_rejects_malformed_points() {
        let body = r#"{ "prices": [[1704067200000]] }"#;
        let err = parse_chart(body).unwrap_err();
        assert!(matches!(err, MarketError::Transient(_)));

        let err = parse_chart(r#"{ "status": "error" }"#).unwrap_err();
        assert!(matches!(err, MarketError::Transient(_)));
    }

    #[test]
    fn test_parse_markets_body() {
        let body = r#"[
            {"id":"bitcoin","symbol":"btc","name":"Bitcoin","image":"b.png","current_price":67000,
             "market_cap":1300000000000,"market_cap_rank":1,"total_volume":25000000000,
             "price_change_percentage_24h":1.5},
            {"id":"ethereum","symbol":"eth","name":"Ethereum","image":"e.png","current_price":3500,
             "market_cap":420000000000,"market_cap_rank":2,"total_volume":12000000000,
             "price_change_percentage_24h":-0.7}
        ]"#;

        let coins: Vec<Coin> = parse_body(body).unwrap();
        assert_eq!(coins.len(), 2);
        assert_eq!(coins[0].id, "bitcoin");
        assert_eq!(coins[1].price_change_percentage_24h, Some(-0.7));
    }

    #[test]
    fn test_parse_trending_without_coins_key() {
        let response: TrendingResponse = parse_body(r#"{ "nfts": [] }"#).unwrap();
        assert!(response.coins.is_empty());
    }

    #[test]
    fn test_fetch_error_mapping() {
        let err: MarketError = FetchError::Status(StatusCode::SERVICE_UNAVAILABLE).into();
        assert_eq!(err, MarketError::Transient("API error: 503 Service Unavailable".to_string()));

        let err: MarketError = FetchError::Transport("connection refused".to_string()).into();
        assert_eq!(err, MarketError::Transient("connection refused".to_string()));
    }

    #[test]
    fn test_response_cache_expiry() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        cache.insert("https://a".to_string(), "body".to_string());
        assert_eq!(cache.get("https://a").as_deref(), Some("body"));
        assert!(cache.get("https://b").is_none());

        let expired = ResponseCache::new(Duration::ZERO);
        expired.insert("https://a".to_string(), "body".to_string());
        assert!(expired.get("https://a").is_none());
    }

    #[tokio::test]
    async fn test_unreachable_api_is_transient() {
        let client = CoinGeckoClient::new(Client::new(), "http://127.0.0.1:9", None);
        let err = client.list_coins(Currency::Usd, 10).await.unwrap_err();
        assert!(matches!(err, MarketError::Transient(_)));
    }
}
