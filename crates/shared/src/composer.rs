use crate::types::{Coin, Filter};
use crate::watchlist::Watchlist;
use serde::{Deserialize, Serialize};

/// Builds the list the dashboard renders from the fetched coins and the
/// current view inputs. Pure: identical inputs always produce identical
/// output, and the incoming slice is never mutated.
///
/// The incoming order (market cap descending, as the API returns it) is kept
/// for `all` and `watchlist`. Sorts are stable, so ties keep that order too.
pub fn compose(coins: &[Coin], search_query: &str, filter: Filter, watchlist: &Watchlist) -> Vec<Coin> {
    let query = search_query.trim().to_lowercase();

    let mut composed: Vec<Coin> = coins
        .iter()
        .filter(|coin| query.is_empty() || matches_query(coin, &query))
        .cloned()
        .collect();

    match filter {
        Filter::All => {}
        Filter::Gainers => {
            composed.retain(|coin| change_24h(coin) > 0.0);
            composed.sort_by(|a, b| change_24h(b).total_cmp(&change_24h(a)));
        }
        Filter::Losers => {
            composed.retain(|coin| change_24h(coin) < 0.0);
            composed.sort_by(|a, b| change_24h(a).total_cmp(&change_24h(b)));
        }
        Filter::Volume => {
            composed.sort_by(|a, b| b.total_volume.total_cmp(&a.total_volume));
        }
        Filter::Watchlist => {
            composed.retain(|coin| watchlist.contains(&coin.id));
        }
    }

    composed
}

fn matches_query(coin: &Coin, lowercase_query: &str) -> bool {
    coin.name.to_lowercase().contains(lowercase_query)
        || coin.symbol.to_lowercase().contains(lowercase_query)
}

// A coin without a reported change is neither a gainer nor a loser
fn change_24h(coin: &Coin) -> f64 {
    match coin.price_change_percentage_24h {
        Some(change) if change.is_finite() => change,
        _ => 0.0,
    }
}

/// Totals shown in the market summary strip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketStats {
    pub total_market_cap: f64,
    pub total_24h_volume: f64,
    /// Bitcoin's share of `total_market_cap` in percent, 0 when bitcoin is
    /// not in the list.
    pub btc_dominance: f64,
}

impl MarketStats {
    pub fn from_coins(coins: &[Coin]) -> Self {
        let total_market_cap: f64 = coins.iter().map(|c| c.market_cap).sum();
        let total_24h_volume: f64 = coins.iter().map(|c| c.total_volume).sum();

        let btc_dominance = coins
            .iter()
            .find(|c| c.id == "bitcoin")
            .filter(|_| total_market_cap > 0.0)
            .map(|btc| btc.market_cap / total_market_cap * 100.0)
            .unwrap_or(0.0);

        MarketStats {
            total_market_cap,
            total_24h_volume,
            btc_dominance,
        }
    }

    pub fn btc_dominance_display(&self) -> String {
        format!("{:.1}%", self.btc_dominance)
    }
}
