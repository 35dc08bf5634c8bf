use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

// Shared data structures used by the server and its presentation layer

/// Fiat currency the dashboard quotes prices in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    #[default]
    Usd,
    Idr,
}

impl Currency {
    pub const ALL: [Currency; 2] = [Currency::Usd, Currency::Idr];

    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Usd => "usd",
            Currency::Idr => "idr",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Idr => "IDR",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "usd" => Ok(Currency::Usd),
            "idr" => Ok(Currency::Idr),
            other => Err(format!("unsupported currency: {}", other)),
        }
    }
}

/// View transform applied to the coin list. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    #[default]
    All,
    Gainers,
    Losers,
    Volume,
    Watchlist,
}

impl Filter {
    pub const ALL: [Filter; 5] = [
        Filter::All,
        Filter::Gainers,
        Filter::Losers,
        Filter::Volume,
        Filter::Watchlist,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Filter::All => "all",
            Filter::Gainers => "gainers",
            Filter::Losers => "losers",
            Filter::Volume => "volume",
            Filter::Watchlist => "watchlist",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Filter::All => "All",
            Filter::Gainers => "Top Gainers",
            Filter::Losers => "Top Losers",
            Filter::Volume => "Highest Volume",
            Filter::Watchlist => "Watchlist",
        }
    }

    /// Lenient parse for query strings: anything unknown shows everything.
    pub fn parse_or_default(value: Option<&str>) -> Filter {
        value.and_then(|v| v.parse().ok()).unwrap_or_default()
    }
}

impl FromStr for Filter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Filter::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| format!("unknown filter: {}", s))
    }
}

/// Selectable chart windows in the detail view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChartRange {
    OneDay,
    #[default]
    SevenDays,
    ThirtyDays,
    OneYear,
}

impl ChartRange {
    pub const ALL: [ChartRange; 4] = [
        ChartRange::OneDay,
        ChartRange::SevenDays,
        ChartRange::ThirtyDays,
        ChartRange::OneYear,
    ];

    pub fn days(&self) -> u32 {
        match self {
            ChartRange::OneDay => 1,
            ChartRange::SevenDays => 7,
            ChartRange::ThirtyDays => 30,
            ChartRange::OneYear => 365,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ChartRange::OneDay => "1D",
            ChartRange::SevenDays => "7D",
            ChartRange::ThirtyDays => "30D",
            ChartRange::OneYear => "1Y",
        }
    }

    pub fn from_days(days: u32) -> Option<ChartRange> {
        ChartRange::ALL.into_iter().find(|r| r.days() == days)
    }
}

// CoinGecko occasionally sends null for numeric market fields
fn null_as_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or_default())
}

/// One row of `/coins/markets`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coin {
    pub id: String,
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub image: String,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub current_price: f64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub market_cap: f64,
    #[serde(default)]
    pub market_cap_rank: Option<u32>,
    #[serde(default)]
    pub price_change_percentage_24h: Option<f64>,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub total_volume: f64,
}

/// A per-currency value from the detail endpoint. Only the currencies the
/// dashboard supports are kept; the rest of the map is ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalizedValue {
    #[serde(default)]
    pub usd: Option<f64>,
    #[serde(default)]
    pub idr: Option<f64>,
}

impl LocalizedValue {
    pub fn get(&self, currency: Currency) -> Option<f64> {
        match currency {
            Currency::Usd => self.usd,
            Currency::Idr => self.idr,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoinImage {
    #[serde(default)]
    pub large: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoinDescription {
    #[serde(default)]
    pub en: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoinMarketData {
    #[serde(default)]
    pub current_price: LocalizedValue,
    #[serde(default)]
    pub market_cap: LocalizedValue,
    #[serde(default)]
    pub total_volume: LocalizedValue,
    #[serde(default)]
    pub high_24h: LocalizedValue,
    #[serde(default)]
    pub low_24h: LocalizedValue,
    #[serde(default)]
    pub ath: LocalizedValue,
    #[serde(default)]
    pub atl: LocalizedValue,
    #[serde(default)]
    pub price_change_percentage_24h: Option<f64>,
    #[serde(default)]
    pub price_change_percentage_7d: Option<f64>,
    #[serde(default)]
    pub price_change_percentage_30d: Option<f64>,
    #[serde(default)]
    pub circulating_supply: Option<f64>,
    #[serde(default)]
    pub total_supply: Option<f64>,
}

/// Response of `/coins/{id}` with the community and ticker sections disabled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinDetail {
    pub id: String,
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub image: CoinImage,
    #[serde(default)]
    pub market_data: CoinMarketData,
    #[serde(default)]
    pub description: CoinDescription,
}

impl CoinDetail {
    /// First three sentences of the English description, or None when the
    /// coin has no description.
    pub fn summary(&self) -> Option<String> {
        let text = self.description.en.as_deref()?.trim();
        if text.is_empty() {
            return None;
        }
        let sentences: Vec<&str> = text.split(". ").take(3).collect();
        let mut summary = sentences.join(". ");
        if !summary.ends_with('.') {
            summary.push('.');
        }
        Some(summary)
    }
}

/// Price sample of a market chart, timestamp in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub timestamp: i64,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendingItem {
    pub id: String,
    #[serde(default)]
    pub coin_id: u64,
    pub name: String,
    pub symbol: String,
    #[serde(default)]
    pub market_cap_rank: Option<u32>,
    #[serde(default)]
    pub thumb: String,
    #[serde(default)]
    pub small: String,
    #[serde(default)]
    pub large: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub price_btc: f64,
    #[serde(default)]
    pub score: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendingCoin {
    pub item: TrendingItem,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_parsing() {
        assert_eq!("usd".parse::<Currency>(), Ok(Currency::Usd));
        assert_eq!("idr".parse::<Currency>(), Ok(Currency::Idr));
        assert!("eur".parse::<Currency>().is_err());
        assert!("USD".parse::<Currency>().is_err());
        assert_eq!(Currency::default(), Currency::Usd);
        assert_eq!(Currency::Idr.to_string(), "idr");
        assert_eq!(Currency::Idr.code(), "IDR");
    }

    #[test]
    fn test_filter_parse_or_default() {
        assert_eq!(Filter::parse_or_default(Some("gainers")), Filter::Gainers);
        assert_eq!(Filter::parse_or_default(Some("watchlist")), Filter::Watchlist);
        assert_eq!(Filter::parse_or_default(Some("bogus")), Filter::All);
        assert_eq!(Filter::parse_or_default(None), Filter::All);
    }

    #[test]
    fn test_chart_range_days() {
        assert_eq!(ChartRange::default().days(), 7);
        assert_eq!(ChartRange::from_days(365), Some(ChartRange::OneYear));
        assert_eq!(ChartRange::from_days(14), None);
        let labels: Vec<&str> = ChartRange::ALL.iter().map(|r| r.label()).collect();
        assert_eq!(labels, vec!["1D", "7D", "30D", "1Y"]);
    }

    #[test]
    fn test_coin_deserialization_with_nulls() {
        let json = r#"{
            "id": "bitcoin",
            "symbol": "btc",
            "name": "Bitcoin",
            "image": "https://assets.coingecko.com/coins/images/1/large/bitcoin.png",
            "current_price": 67000.5,
            "market_cap": 1320000000000,
            "market_cap_rank": 1,
            "price_change_percentage_24h": null,
            "total_volume": null,
            "ath": 73000
        }"#;

        let coin: Coin = serde_json::from_str(json).unwrap();
        assert_eq!(coin.id, "bitcoin");
        assert_eq!(coin.market_cap_rank, Some(1));
        assert_eq!(coin.current_price, 67000.5);
        assert!(coin.price_change_percentage_24h.is_none());
        assert_eq!(coin.total_volume, 0.0);
    }

    #[test]
    fn test_coin_detail_localized_fields() {
        let json = r#"{
            "id": "ethereum",
            "symbol": "eth",
            "name": "Ethereum",
            "image": { "thumb": "t.png", "large": "l.png" },
            "market_data": {
                "current_price": { "usd": 3500.0, "idr": 55000000.0, "eur": 3200.0 },
                "high_24h": { "usd": 3600.0, "idr": 56000000.0 },
                "price_change_percentage_24h": -1.25,
                "circulating_supply": 120000000.0,
                "total_supply": null
            },
            "description": { "en": "Ethereum is a platform. It runs contracts. It has ether. It is popular." }
        }"#;

        let detail: CoinDetail = serde_json::from_str(json).unwrap();
        assert_eq!(detail.image.large, "l.png");
        assert_eq!(detail.market_data.current_price.get(Currency::Usd), Some(3500.0));
        assert_eq!(detail.market_data.current_price.get(Currency::Idr), Some(55000000.0));
        assert_eq!(detail.market_data.low_24h.get(Currency::Usd), None);
        assert_eq!(detail.market_data.price_change_percentage_24h, Some(-1.25));
        assert!(detail.market_data.total_supply.is_none());
        assert_eq!(
            detail.summary().as_deref(),
            Some("Ethereum is a platform. It runs contracts. It has ether.")
        );
    }

    #[test]
    fn test_coin_detail_without_description() {
        let json = r#"{ "id": "x", "symbol": "x", "name": "X", "description": { "en": "" } }"#;
        let detail: CoinDetail = serde_json::from_str(json).unwrap();
        assert!(detail.summary().is_none());
    }

    #[test]
    fn test_trending_item_deserialization() {
        let json = r#"{
            "item": {
                "id": "pepe",
                "coin_id": 29850,
                "name": "Pepe",
                "symbol": "PEPE",
                "market_cap_rank": 24,
                "thumb": "thumb.png",
                "small": "small.png",
                "large": "large.png",
                "slug": "pepe",
                "price_btc": 1.5e-10,
                "score": 0
            }
        }"#;

        let trending: TrendingCoin = serde_json::from_str(json).unwrap();
        assert_eq!(trending.item.id, "pepe");
        assert_eq!(trending.item.coin_id, 29850);
        assert_eq!(trending.item.market_cap_rank, Some(24));
    }
}
