//! Server-side HTML for the dashboard and the coin detail view.
//!
//! Every function here is a pure function of its inputs; handlers gather the
//! data and these turn it into markup.

use chrono::DateTime;
use shared::format::{format_currency_whole, format_supply};
use shared::{
    format_currency, format_large_number, format_percentage, ChartPoint, ChartRange, Coin, CoinDetail,
    Currency, Filter, MarketStats, Watchlist,
};
use std::fmt::Write;

use crate::types::RefreshStatus;

const CHART_WIDTH: f64 = 800.0;
const CHART_HEIGHT: f64 = 300.0;
const CHART_PADDING: f64 = 8.0;
const CHART_LABELS: usize = 5;

const STYLE: &str = "\
body{margin:0;font-family:system-ui,sans-serif;background:#0f172a;color:#f8fafc}\
main{max-width:1200px;margin:0 auto;padding:32px 16px}\
a{color:inherit}\
header{display:flex;flex-wrap:wrap;justify-content:space-between;align-items:center;gap:16px;margin-bottom:24px}\
.muted{color:#94a3b8}\
.toolbar{display:flex;flex-wrap:wrap;gap:8px;align-items:center;margin-bottom:16px}\
.btn{display:inline-block;padding:6px 14px;border-radius:8px;border:0;background:#1e293b;color:#cbd5e1;text-decoration:none;cursor:pointer;font:inherit}\
.btn.active{background:#f8fafc;color:#0f172a}\
.btn[disabled]{opacity:.5;cursor:not-allowed}\
.inline{display:inline}\
.summary{display:grid;grid-template-columns:repeat(auto-fit,minmax(220px,1fr));gap:16px;margin-bottom:24px}\
.card{background:#1e293b;border-radius:16px;padding:20px}\
.card p{margin:0}\
.card .value{font-size:1.5rem;font-weight:700;margin-top:8px}\
table{width:100%;border-collapse:collapse}\
th,td{padding:12px;border-bottom:1px solid #1e293b}\
th{font-size:.75rem;text-transform:uppercase;color:#94a3b8}\
.num{text-align:right}\
.up{color:#6ee7b7}.down{color:#fca5a5}\
.coin{display:flex;align-items:center;gap:12px;text-decoration:none}\
.coin img{border-radius:50%}\
.star{background:none;border:0;color:#64748b;cursor:pointer;font-size:1.1rem}\
.star.on{color:#facc15}\
.empty{text-align:center;padding:48px;background:#1e293b;border-radius:16px}\
.overlay{position:fixed;inset:0;background:rgba(0,0,0,.6);display:block}\
.modal{position:relative;max-width:900px;margin:32px auto;background:#1e293b;border-radius:24px;padding:24px}\
.stats{display:grid;grid-template-columns:repeat(auto-fit,minmax(180px,1fr));gap:12px;margin:16px 0}\
.chart{background:#0f172a;border-radius:16px;padding:12px}\
.chart-labels{display:flex;justify-content:space-between;font-size:.75rem;color:#94a3b8}\
";

/// Escapes text for element content and double-quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Drops markup from API-provided descriptions, keeping the text.
pub fn strip_tags(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(ch),
            _ => {}
        }
    }
    text
}

/// Link to the dashboard with the given view inputs; defaults are omitted.
/// Currency is never part of a link, it only changes through the switcher.
pub fn dashboard_href(query: &str, filter: Filter) -> String {
    let mut params = Vec::new();
    if !query.is_empty() {
        params.push(format!("q={}", urlencoding::encode(query)));
    }
    if filter != Filter::All {
        params.push(format!("filter={}", filter.as_str()));
    }
    if params.is_empty() {
        "/".to_string()
    } else {
        format!("/?{}", params.join("&"))
    }
}

pub fn detail_href(coin_id: &str, range: ChartRange, back: &str) -> String {
    format!(
        "/coins/{}?days={}&back={}",
        urlencoding::encode(coin_id),
        range.days(),
        urlencoding::encode(back)
    )
}

fn change_class(change: Option<f64>) -> &'static str {
    match change {
        Some(c) if c < 0.0 => "down",
        _ => "up",
    }
}

fn page(title: &str, refresh_after: Option<u32>, body: &str) -> String {
    let refresh_meta = refresh_after
        .map(|seconds| format!("<noscript><meta http-equiv=\"refresh\" content=\"{}\"></noscript>", seconds))
        .unwrap_or_default();

    format!(
        "<!DOCTYPE html>\
<html lang=\"en\"><head><meta charset=\"utf-8\">\
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\
<title>{title}</title>\
<meta name=\"description\" content=\"Live cryptocurrency prices and market data\">\
<meta property=\"og:title\" content=\"{title}\">\
<meta property=\"og:description\" content=\"Track live cryptocurrency prices, market cap, and 24h changes\">\
<meta property=\"og:type\" content=\"website\">\
{refresh_meta}<style>{STYLE}</style></head>\
<body><main>{body}</main></body></html>",
        title = escape_html(title),
        refresh_meta = refresh_meta,
        body = body,
    )
}

/// One form per currency, each posting back to the current view.
pub fn render_currency_switcher(current: Currency, next: &str) -> String {
    let mut html = String::from("<div class=\"toolbar\">");
    for currency in Currency::ALL {
        let active = if currency == current { " active" } else { "" };
        let _ = write!(
            html,
            "<form class=\"inline\" method=\"post\" action=\"/currency/{}?next={}\">\
<button class=\"btn{}\" type=\"submit\">{}</button></form>",
            currency,
            urlencoding::encode(next),
            active,
            currency.code()
        );
    }
    html.push_str("</div>");
    html
}

pub fn render_search(query: &str, filter: Filter) -> String {
    format!(
        "<form class=\"toolbar\" method=\"get\" action=\"/\">\
<input type=\"hidden\" name=\"filter\" value=\"{}\">\
<input type=\"search\" name=\"q\" value=\"{}\" placeholder=\"Search by name or symbol\" aria-label=\"Search coins\">\
<button class=\"btn\" type=\"submit\">Search</button></form>",
        filter.as_str(),
        escape_html(query)
    )
}

pub fn render_filters(active: Filter, query: &str) -> String {
    let mut html = String::from("<nav class=\"toolbar\">");
    for filter in Filter::ALL {
        let class = if filter == active { "btn active" } else { "btn" };
        let _ = write!(
            html,
            "<a class=\"{}\" href=\"{}\">{}</a>",
            class,
            escape_html(&dashboard_href(query, filter)),
            filter.label()
        );
    }
    html.push_str("</nav>");
    html
}

pub fn render_market_summary(stats: &MarketStats, currency: Currency) -> String {
    format!(
        "<section class=\"summary\">\
<div class=\"card\"><p class=\"muted\">Market Cap</p><p class=\"value\">{}</p></div>\
<div class=\"card\"><p class=\"muted\">24h Volume</p><p class=\"value\">{}</p></div>\
<div class=\"card\"><p class=\"muted\">BTC Dominance</p><p class=\"value\">{}</p></div>\
</section>",
        escape_html(&format_large_number(stats.total_market_cap, currency)),
        escape_html(&format_large_number(stats.total_24h_volume, currency)),
        stats.btc_dominance_display()
    )
}

/// Ticks the countdown once per second and reloads when it runs out. While a
/// refresh is in flight it polls `/health` and reloads once the server is
/// back to counting.
const COUNTDOWN_SCRIPT: &str = "<script>(function(){\
var el=document.getElementById('refresh-countdown');\
if(!el)return;\
var left=parseInt(el.getAttribute('data-seconds-left'),10);\
var btn=document.getElementById('refresh-button');\
if(btn&&btn.disabled){\
var poll=setInterval(function(){\
fetch('/health',{cache:'no-store'}).then(function(r){return r.json();}).then(function(h){\
if(h.refresh&&h.refresh.state!=='refreshing'){clearInterval(poll);location.reload();}\
}).catch(function(){});\
},500);\
}\
setInterval(function(){\
left-=1;\
if(left<=0){location.reload();return;}\
el.textContent=left+'s';\
},1000);\
})();</script>";

pub fn render_countdown(refresh: &RefreshStatus, next: &str) -> String {
    let (icon, label, disabled) = if refresh.is_refreshing() {
        ("&#8635;", "Refreshing...", " disabled")
    } else {
        ("&#8634;", "Refresh Now", "")
    };

    format!(
        "<div class=\"toolbar muted\"><span aria-hidden=\"true\">{}</span>\
<span>Auto refresh in <strong id=\"refresh-countdown\" data-seconds-left=\"{secs}\">{secs}s</strong></span>\
<form class=\"inline\" method=\"post\" action=\"/refresh?next={}\">\
<button class=\"btn\" id=\"refresh-button\" type=\"submit\"{}>{}</button></form>\
<span>&bull; Powered by CoinGecko API</span></div>{}",
        icon,
        urlencoding::encode(next),
        disabled,
        label,
        COUNTDOWN_SCRIPT,
        secs = refresh.seconds_left,
    )
}

pub fn render_no_results(query: &str, filter: Filter) -> String {
    let hint = if filter == Filter::Watchlist && query.is_empty() {
        "Your watchlist is empty. Star a coin to add it.".to_string()
    } else if query.is_empty() {
        format!("No coins match the {} filter.", filter.label())
    } else {
        format!("No coins found for \"{}\".", escape_html(query))
    };

    format!(
        "<div class=\"empty\" role=\"status\"><h2>No results</h2><p class=\"muted\">{}</p></div>",
        hint
    )
}

/// Composed rows as a table. Callers render [`render_no_results`] instead
/// when `coins` is empty.
pub fn render_coin_table(coins: &[Coin], currency: Currency, watchlist: &Watchlist, back: &str) -> String {
    let mut html = String::from(
        "<table><thead><tr><th>#</th><th>Coin</th><th class=\"num\">Price</th>\
<th class=\"num\">24h %</th><th class=\"num\">Market Cap</th><th class=\"num\">Volume (24h)</th>\
</tr></thead><tbody>",
    );

    for coin in coins {
        let watched = watchlist.contains(&coin.id);
        let rank = coin
            .market_cap_rank
            .map(|r| r.to_string())
            .unwrap_or_else(|| "-".to_string());

        let _ = write!(
            html,
            "<tr><td><form class=\"inline\" method=\"post\" action=\"/watchlist/{id}/toggle?next={next}\">\
<button class=\"star{star_class}\" type=\"submit\" aria-label=\"{star_label}\">{star}</button></form> {rank}</td>\
<td><a class=\"coin\" href=\"{href}\"><img src=\"{image}\" alt=\"{name}\" width=\"32\" height=\"32\">\
<span><strong>{name}</strong><br><span class=\"muted\">{symbol}</span></span></a></td>\
<td class=\"num\">{price}</td><td class=\"num {change_class}\">{change}</td>\
<td class=\"num\">{market_cap}</td><td class=\"num\">{volume}</td></tr>",
            id = urlencoding::encode(&coin.id),
            next = urlencoding::encode(back),
            star_class = if watched { " on" } else { "" },
            star_label = if watched { "Remove from watchlist" } else { "Add to watchlist" },
            star = if watched { "&#9733;" } else { "&#9734;" },
            rank = rank,
            href = escape_html(&detail_href(&coin.id, ChartRange::default(), back)),
            image = escape_html(&coin.image),
            name = escape_html(&coin.name),
            symbol = escape_html(&coin.symbol.to_uppercase()),
            price = escape_html(&format_currency(coin.current_price, currency)),
            change_class = change_class(coin.price_change_percentage_24h),
            change = format_percentage(coin.price_change_percentage_24h),
            market_cap = escape_html(&format_large_number(coin.market_cap, currency)),
            volume = escape_html(&format_large_number(coin.total_volume, currency)),
        );
    }

    html.push_str("</tbody></table>");
    html
}

/// Inputs of the dashboard page, already composed.
pub struct DashboardView<'a> {
    pub currency: Currency,
    pub filter: Filter,
    pub query: &'a str,
    pub coins: &'a [Coin],
    pub stats: MarketStats,
    pub watchlist: &'a Watchlist,
    pub refresh: RefreshStatus,
    pub last_updated: String,
}

pub fn render_dashboard(view: &DashboardView) -> String {
    let here = dashboard_href(view.query, view.filter);

    let mut body = String::new();
    let _ = write!(
        body,
        "<header><div><h1>Crypto Market</h1>\
<p class=\"muted\">Live cryptocurrency prices and market data</p></div>{}</header>",
        render_currency_switcher(view.currency, &here)
    );
    body.push_str(&render_market_summary(&view.stats, view.currency));
    body.push_str(&render_countdown(&view.refresh, &here));
    body.push_str(&render_search(view.query, view.filter));
    body.push_str(&render_filters(view.filter, view.query));

    if view.coins.is_empty() {
        body.push_str(&render_no_results(view.query, view.filter));
    } else {
        body.push_str(&render_coin_table(view.coins, view.currency, view.watchlist, &here));
    }

    let _ = write!(
        body,
        "<footer class=\"muted\"><p>Last updated {} &bull; Data updates every {} seconds &bull; Powered by CoinGecko API</p></footer>",
        escape_html(&view.last_updated),
        view.refresh.interval_seconds
    );

    // without scripts, reload just after the server's next scheduled refresh
    page("Crypto Market", Some(view.refresh.seconds_left + 1), &body)
}

/// Axis label for a chart timestamp: time of day for the 1D range, month and
/// day otherwise.
pub fn chart_label(timestamp_ms: i64, range: ChartRange) -> String {
    match DateTime::from_timestamp_millis(timestamp_ms) {
        Some(dt) if range == ChartRange::OneDay => dt.format("%H:%M").to_string(),
        Some(dt) => dt.format("%b %-d").to_string(),
        None => String::new(),
    }
}

/// Polyline points scaled into the chart's viewbox.
pub fn chart_polyline(points: &[ChartPoint]) -> String {
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return String::new();
    };

    let min_price = points.iter().map(|p| p.price).fold(f64::INFINITY, f64::min);
    let max_price = points.iter().map(|p| p.price).fold(f64::NEG_INFINITY, f64::max);
    let price_span = (max_price - min_price).max(f64::EPSILON);
    let time_span = ((last.timestamp - first.timestamp) as f64).max(1.0);

    let plot_width = CHART_WIDTH - 2.0 * CHART_PADDING;
    let plot_height = CHART_HEIGHT - 2.0 * CHART_PADDING;

    points
        .iter()
        .map(|p| {
            let x = CHART_PADDING + (p.timestamp - first.timestamp) as f64 / time_span * plot_width;
            let y = CHART_PADDING + (max_price - p.price) / price_span * plot_height;
            format!("{:.1},{:.1}", x, y)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn render_chart(points: &[ChartPoint], range: ChartRange, currency: Currency, positive: bool) -> String {
    if points.is_empty() {
        return "<div class=\"chart muted\">No chart data for this period.</div>".to_string();
    }

    let stroke = if positive { "#6ee7b7" } else { "#fca5a5" };
    let min_price = points.iter().map(|p| p.price).fold(f64::INFINITY, f64::min);
    let max_price = points.iter().map(|p| p.price).fold(f64::NEG_INFINITY, f64::max);

    let label_count = CHART_LABELS.min(points.len());
    let labels: String = (0..label_count)
        .map(|i| {
            let index = if label_count > 1 {
                i * (points.len() - 1) / (label_count - 1)
            } else {
                0
            };
            format!("<span>{}</span>", chart_label(points[index].timestamp, range))
        })
        .collect();

    format!(
        "<div class=\"chart\"><div class=\"chart-labels\"><span>{max}</span><span>{min}</span></div>\
<svg viewBox=\"0 0 {w} {h}\" width=\"100%\" height=\"{h}\" preserveAspectRatio=\"none\" role=\"img\" aria-label=\"Price chart\">\
<polyline fill=\"none\" stroke=\"{stroke}\" stroke-width=\"2\" points=\"{points}\"/></svg>\
<div class=\"chart-labels\">{labels}</div></div>",
        max = escape_html(&format_currency_whole(max_price, currency)),
        min = escape_html(&format_currency_whole(min_price, currency)),
        w = CHART_WIDTH,
        h = CHART_HEIGHT,
        stroke = stroke,
        points = chart_polyline(points),
        labels = labels,
    )
}

pub struct DetailView<'a> {
    pub detail: &'a CoinDetail,
    pub chart: &'a [ChartPoint],
    pub currency: Currency,
    pub range: ChartRange,
    pub back: &'a str,
}

fn stat_card(label: &str, value: &str) -> String {
    format!(
        "<div class=\"card\"><p class=\"muted\">{}</p><p class=\"value\">{}</p></div>",
        label,
        escape_html(value)
    )
}

fn detail_shell(title: &str, back: &str, content: &str) -> String {
    // the overlay is a link back so a click outside the modal closes it
    let body = format!(
        "<a class=\"overlay\" href=\"{back}\" aria-label=\"Close\"></a>\
<div class=\"modal\" role=\"dialog\" aria-modal=\"true\">\
<a class=\"btn\" href=\"{back}\" style=\"float:right\" aria-label=\"Close\">&times;</a>{content}</div>",
        back = escape_html(back),
        content = content,
    );
    page(title, None, &body)
}

pub fn render_detail(view: &DetailView) -> String {
    let detail = view.detail;
    let market = &detail.market_data;
    let currency = view.currency;
    let change_24h = market.price_change_percentage_24h;
    let positive = change_24h.map_or(true, |c| c >= 0.0);

    let money = |value: Option<f64>| {
        value
            .map(|v| format_currency(v, currency))
            .unwrap_or_else(|| "N/A".to_string())
    };
    let large = |value: Option<f64>| {
        value
            .map(|v| format_large_number(v, currency))
            .unwrap_or_else(|| "N/A".to_string())
    };

    let mut content = String::new();
    let _ = write!(
        content,
        "<div class=\"coin\"><img src=\"{}\" alt=\"{}\" width=\"48\" height=\"48\">\
<div><h2>{}</h2><p class=\"muted\">{}</p></div></div>",
        escape_html(&detail.image.large),
        escape_html(&detail.name),
        escape_html(&detail.name),
        escape_html(&detail.symbol.to_uppercase())
    );
    let _ = write!(
        content,
        "<p class=\"value\" style=\"font-size:2rem;font-weight:700\">{}</p>\
<p class=\"{}\">{} (24h)</p>",
        escape_html(&money(market.current_price.get(currency))),
        change_class(change_24h),
        format_percentage(change_24h)
    );

    content.push_str("<nav class=\"toolbar\">");
    for range in ChartRange::ALL {
        let class = if range == view.range { "btn active" } else { "btn" };
        let _ = write!(
            content,
            "<a class=\"{}\" href=\"{}\">{}</a>",
            class,
            escape_html(&detail_href(&detail.id, range, view.back)),
            range.label()
        );
    }
    content.push_str("</nav>");
    content.push_str(&render_chart(view.chart, view.range, currency, positive));

    content.push_str("<section class=\"stats\">");
    content.push_str(&stat_card("Market Cap", &large(market.market_cap.get(currency))));
    content.push_str(&stat_card("24h Volume", &large(market.total_volume.get(currency))));
    content.push_str(&stat_card("24h High", &money(market.high_24h.get(currency))));
    content.push_str(&stat_card("24h Low", &money(market.low_24h.get(currency))));
    content.push_str(&stat_card("All-Time High", &money(market.ath.get(currency))));
    content.push_str(&stat_card("All-Time Low", &money(market.atl.get(currency))));
    content.push_str(&stat_card("7d Change", &format_percentage(market.price_change_percentage_7d)));
    content.push_str(&stat_card("30d Change", &format_percentage(market.price_change_percentage_30d)));
    content.push_str(&stat_card("Circulating Supply", &format_supply(market.circulating_supply)));
    content.push_str(&stat_card("Total Supply", &format_supply(market.total_supply)));
    content.push_str("</section>");

    if let Some(summary) = detail.summary() {
        let _ = write!(
            content,
            "<div class=\"card\"><h3>About {}</h3><p>{}</p></div>",
            escape_html(&detail.name),
            escape_html(&strip_tags(&summary))
        );
    }

    detail_shell(&format!("{} | Crypto Market", detail.name), view.back, &content)
}

/// Modal-local failure; the list underneath is unaffected.
pub fn render_detail_error(coin_id: &str, message: &str, range: ChartRange, back: &str) -> String {
    let content = format!(
        "<div class=\"empty\" role=\"alert\"><h2>Could not load {}</h2><p class=\"muted\">{}</p>\
<a class=\"btn\" href=\"{}\">Try again</a></div>",
        escape_html(coin_id),
        escape_html(message),
        escape_html(&detail_href(coin_id, range, back))
    );
    detail_shell("Crypto Market", back, &content)
}

/// Full-page error for when the initial coin list cannot be loaded.
pub fn render_error_page(message: &str, retry_href: &str) -> String {
    let body = format!(
        "<div class=\"empty\" role=\"alert\"><h2>Something went wrong</h2>\
<p class=\"muted\">{}</p><a class=\"btn active\" href=\"{}\">Try again</a></div>",
        escape_html(if message.is_empty() {
            "Failed to load cryptocurrency data. Please try again."
        } else {
            message
        }),
        escape_html(retry_href)
    );
    page("Something went wrong | Crypto Market", None, &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::create_test_coin;
    use shared::RefreshState;

    fn create_test_refresh(state: RefreshState) -> RefreshStatus {
        RefreshStatus {
            seconds_left: 42,
            interval_seconds: 60,
            state,
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<script>alert(\"x\") & 'y'</script>"),
            "&lt;script&gt;alert(&quot;x&quot;) &amp; &#39;y&#39;&lt;/script&gt;"
        );
    }

    #[test]
    fn test_strip_tags() {
        assert_eq!(
            strip_tags("Uses <a href=\"https://bitcoin.org\">proof of work</a>."),
            "Uses proof of work."
        );
    }

    #[test]
    fn test_dashboard_href_omits_defaults() {
        assert_eq!(dashboard_href("", Filter::All), "/");
        assert_eq!(dashboard_href("", Filter::Volume), "/?filter=volume");
        assert_eq!(
            dashboard_href("sol ana", Filter::Gainers),
            "/?q=sol%20ana&filter=gainers"
        );
    }

    #[test]
    fn test_detail_href_encodes_back_link() {
        assert_eq!(
            detail_href("bitcoin", ChartRange::ThirtyDays, "/?filter=gainers&q=a"),
            "/coins/bitcoin?days=30&back=%2F%3Ffilter%3Dgainers%26q%3Da"
        );
    }

    #[test]
    fn test_empty_list_renders_no_results_state() {
        let watchlist = Watchlist::default();
        let view = DashboardView {
            currency: Currency::Usd,
            filter: Filter::Gainers,
            query: "zzz",
            coins: &[],
            stats: MarketStats::from_coins(&[]),
            watchlist: &watchlist,
            refresh: create_test_refresh(RefreshState::Counting),
            last_updated: "12:00:00 UTC".to_string(),
        };

        let html = render_dashboard(&view);
        assert!(html.contains("No results"));
        assert!(html.contains("No coins found for &quot;zzz&quot;."));
        assert!(!html.contains("<table"));
    }

    #[test]
    fn test_dashboard_renders_rows_and_summary() {
        let coins = vec![
            create_test_coin("bitcoin", "btc", "Bitcoin", 2.5, 1_500_000_000_000.0),
            create_test_coin("ethereum", "eth", "Ethereum", -3.75, 400_000_000_000.0),
        ];
        let watchlist = Watchlist::from_ids(["ethereum"]);
        let view = DashboardView {
            currency: Currency::Usd,
            filter: Filter::All,
            query: "",
            coins: &coins,
            stats: MarketStats::from_coins(&coins),
            watchlist: &watchlist,
            refresh: create_test_refresh(RefreshState::Counting),
            last_updated: "12:00:00 UTC".to_string(),
        };

        let html = render_dashboard(&view);
        assert!(html.contains("<table"));
        assert!(html.contains("Bitcoin"));
        assert!(html.contains("BTC"));
        assert!(html.contains("+2.50%"));
        assert!(html.contains("-3.75%"));
        assert!(html.contains("$1.50T"));
        assert!(html.contains("$1.90T"));
        assert!(html.contains("78.9%"));
        assert!(html.contains("data-seconds-left=\"42\">42s</strong>"));
        assert!(html.contains("<noscript><meta http-equiv=\"refresh\" content=\"43\"></noscript>"));
        assert!(html.contains("Refresh Now"));
        assert_eq!(html.matches("star on").count(), 1);
        assert_eq!(html.matches("<tr>").count(), 3);
    }

    #[test]
    fn test_currency_switcher_posts_back_to_current_view() {
        let html = render_currency_switcher(Currency::Usd, "/?filter=losers");
        assert!(html.contains("action=\"/currency/idr?next=%2F%3Ffilter%3Dlosers\""));
        assert!(html.contains("action=\"/currency/usd?next=%2F%3Ffilter%3Dlosers\""));
        assert!(html.contains("btn active\" type=\"submit\">USD"));
    }

    #[test]
    fn test_dashboard_links_carry_no_currency() {
        let coins = vec![create_test_coin("bitcoin", "btc", "Bitcoin", 1.0, 1_000_000.0)];
        let watchlist = Watchlist::default();
        let view = DashboardView {
            currency: Currency::Idr,
            filter: Filter::All,
            query: "",
            coins: &coins,
            stats: MarketStats::from_coins(&coins),
            watchlist: &watchlist,
            refresh: create_test_refresh(RefreshState::Counting),
            last_updated: "12:00:00 UTC".to_string(),
        };

        let html = render_dashboard(&view);
        assert!(!html.contains("currency="));
        assert!(!html.contains("name=\"currency\""));
    }

    #[test]
    fn test_countdown_ticks_in_the_browser() {
        let html = render_countdown(&create_test_refresh(RefreshState::Counting), "/");
        assert!(html.contains("id=\"refresh-countdown\" data-seconds-left=\"42\""));
        assert!(html.contains("<script>"));
        assert!(html.contains("setInterval"));
        assert!(html.contains("location.reload()"));
        assert!(!html.contains(" disabled>"));
    }

    #[test]
    fn test_countdown_while_refreshing() {
        let html = render_countdown(&create_test_refresh(RefreshState::Refreshing), "/");
        assert!(html.contains("Refreshing..."));
        assert!(html.contains("id=\"refresh-button\" type=\"submit\" disabled>"));
        // the disabled state clears by polling the server's refresh state
        assert!(html.contains("fetch('/health'"));
    }

    #[test]
    fn test_watchlist_empty_hint() {
        let html = render_no_results("", Filter::Watchlist);
        assert!(html.contains("watchlist is empty"));
    }

    #[test]
    fn test_chart_label_by_range() {
        // 2024-01-01T13:45:00Z
        let ts = 1_704_116_700_000;
        assert_eq!(chart_label(ts, ChartRange::OneDay), "13:45");
        assert_eq!(chart_label(ts, ChartRange::SevenDays), "Jan 1");
    }

    #[test]
    fn test_chart_polyline_scaling() {
        let points = vec![
            ChartPoint { timestamp: 0, price: 10.0 },
            ChartPoint { timestamp: 50, price: 20.0 },
            ChartPoint { timestamp: 100, price: 15.0 },
        ];

        let polyline = chart_polyline(&points);
        let coords: Vec<&str> = polyline.split(' ').collect();
        assert_eq!(coords.len(), 3);
        // lowest price at the bottom, highest at the top
        assert_eq!(coords[0], "8.0,292.0");
        assert_eq!(coords[1], "400.0,8.0");
        assert_eq!(coords[2], "792.0,150.0");
        assert_eq!(chart_polyline(&[]), "");
    }

    #[test]
    fn test_render_chart_empty_series() {
        let html = render_chart(&[], ChartRange::OneDay, Currency::Usd, true);
        assert!(html.contains("No chart data"));
    }

    #[test]
    fn test_error_page() {
        let html = render_error_page("", "/");
        assert!(html.contains("Something went wrong"));
        assert!(html.contains("Failed to load cryptocurrency data"));
        assert!(html.contains("Try again"));
    }
}
