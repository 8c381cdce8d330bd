use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

use super::http::fetch_json;
use super::traits::MarketDataProvider;
use crate::errors::CoreError;
use crate::models::coin::{CoinDetail, CoinMarketRow};
use crate::models::price::{ChartPoint, PriceHorizon};

pub const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";
const PROVIDER: &str = "CoinGecko";

/// CoinGecko API provider for cryptocurrency market data.
///
/// - **Free tier**: no API key, but tight per-minute limits on chart endpoints.
/// - **Endpoints**: `/coins/markets`, `/coins/{id}`, `/coins/{id}/market_chart`,
///   `/simple/price`
///
/// Ids are CoinGecko's lowercase slugs ("bitcoin", "ethereum"). All prices
/// are requested in USD.
pub struct CoinGeckoProvider {
    client: Client,
    base_url: String,
}

impl CoinGeckoProvider {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

// ── CoinGecko API response types ────────────────────────────────────

#[derive(Deserialize)]
struct MarketChartResponse {
    prices: Vec<[f64; 2]>,
}

#[derive(Deserialize)]
struct CoinResponse {
    id: String,
    symbol: String,
    name: String,
    #[serde(default)]
    description: HashMap<String, Option<String>>,
    #[serde(default)]
    links: Option<CoinLinks>,
    #[serde(default)]
    image: Option<CoinImage>,
    #[serde(default)]
    market_cap_rank: Option<u32>,
    #[serde(default)]
    market_data: Option<CoinMarketData>,
}

#[derive(Deserialize)]
struct CoinLinks {
    #[serde(default)]
    homepage: Vec<String>,
}

#[derive(Deserialize)]
struct CoinImage {
    #[serde(default)]
    large: Option<String>,
}

#[derive(Deserialize)]
struct CoinMarketData {
    #[serde(default)]
    current_price: HashMap<String, f64>,
}

impl From<CoinResponse> for CoinDetail {
    fn from(coin: CoinResponse) -> Self {
        CoinDetail {
            id: coin.id,
            symbol: coin.symbol,
            name: coin.name,
            description: coin
                .description
                .get("en")
                .cloned()
                .flatten()
                .filter(|d| !d.is_empty()),
            homepage: coin
                .links
                .and_then(|l| l.homepage.into_iter().find(|h| !h.is_empty())),
            image: coin.image.and_then(|i| i.large),
            current_price_usd: coin
                .market_data
                .and_then(|m| m.current_price.get("usd").copied()),
            market_cap_rank: coin.market_cap_rank,
        }
    }
}

fn horizons_param(horizons: &[PriceHorizon]) -> String {
    horizons
        .iter()
        .map(|h| h.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

#[async_trait]
impl MarketDataProvider for CoinGeckoProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn fetch_markets(
        &self,
        ids: &[String],
        horizons: &[PriceHorizon],
    ) -> Result<Vec<CoinMarketRow>, CoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let url = format!("{}/coins/markets", self.base_url);
        let joined = ids.join(",");
        debug!(ids = %joined, "Requesting markets");

        let mut query = vec![
            ("vs_currency", "usd".to_string()),
            ("ids", joined.clone()),
            ("per_page", ids.len().max(1).to_string()),
            ("sparkline", "false".to_string()),
        ];
        if !horizons.is_empty() {
            query.push(("price_change_percentage", horizons_param(horizons)));
        }

        fetch_json(
            PROVIDER,
            &format!("markets for {joined}"),
            self.client.get(&url).query(&query),
        )
        .await
    }

    async fn fetch_chart(
        &self,
        id: &str,
        days: u32,
        interval: &str,
    ) -> Result<Vec<ChartPoint>, CoreError> {
        let url = format!("{}/coins/{id}/market_chart", self.base_url);
        let resp: MarketChartResponse = fetch_json(
            PROVIDER,
            &format!("market chart for {id}"),
            self.client.get(&url).query(&[
                ("vs_currency", "usd".to_string()),
                ("days", days.to_string()),
                ("interval", interval.to_string()),
            ]),
        )
        .await?;

        Ok(resp
            .prices
            .into_iter()
            .map(|[ts, price]| ChartPoint {
                timestamp_ms: ts as i64,
                price,
            })
            .collect())
    }

    async fn list_markets(
        &self,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<CoinMarketRow>, CoreError> {
        let url = format!("{}/coins/markets", self.base_url);
        fetch_json(
            PROVIDER,
            &format!("markets page {page}"),
            self.client.get(&url).query(&[
                ("vs_currency", "usd".to_string()),
                ("order", "market_cap_desc".to_string()),
                ("per_page", per_page.to_string()),
                ("page", page.to_string()),
                ("sparkline", "false".to_string()),
            ]),
        )
        .await
    }

    async fn get_coin(&self, id: &str) -> Result<CoinDetail, CoreError> {
        let url = format!("{}/coins/{id}", self.base_url);
        let resp: CoinResponse = fetch_json(
            PROVIDER,
            &format!("coin {id}"),
            self.client.get(&url).query(&[
                ("localization", "false"),
                ("tickers", "false"),
                ("community_data", "false"),
                ("developer_data", "false"),
            ]),
        )
        .await?;
        Ok(resp.into())
    }

    async fn simple_prices(&self, ids: &[String]) -> Result<HashMap<String, f64>, CoreError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let url = format!("{}/simple/price", self.base_url);
        let joined = ids.join(",");
        let resp: HashMap<String, HashMap<String, f64>> = fetch_json(
            PROVIDER,
            &format!("simple prices for {joined}"),
            self.client
                .get(&url)
                .query(&[("ids", joined.as_str()), ("vs_currencies", "usd")]),
        )
        .await?;

        Ok(resp
            .into_iter()
            .filter_map(|(id, quotes)| quotes.get("usd").map(|p| (id, *p)))
            .collect())
    }
}
