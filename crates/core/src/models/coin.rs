use serde::{Deserialize, Serialize};

use super::price::PriceChanges;

/// One row of the provider's markets listing (USD-denominated).
///
/// Numeric fields are optional because the provider omits them for thinly
/// traded coins; an absent `current_price` means "no price", never zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinMarketRow {
    pub id: String,
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub current_price: Option<f64>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub market_cap_rank: Option<u32>,
    #[serde(default)]
    pub total_volume: Option<f64>,
    #[serde(default, rename = "price_change_percentage_1h_in_currency")]
    pub price_change_1h: Option<f64>,
    #[serde(default, rename = "price_change_percentage_24h_in_currency")]
    pub price_change_24h: Option<f64>,
    #[serde(default, rename = "price_change_percentage_7d_in_currency")]
    pub price_change_7d: Option<f64>,
}

impl CoinMarketRow {
    /// Missing percentages are reported by the provider as "no change".
    pub fn price_changes(&self) -> PriceChanges {
        PriceChanges::new(
            self.price_change_1h.unwrap_or(0.0),
            self.price_change_24h.unwrap_or(0.0),
            self.price_change_7d.unwrap_or(0.0),
        )
    }
}

/// Descriptive data for a single coin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinDetail {
    pub id: String,
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub current_price_usd: Option<f64>,
    #[serde(default)]
    pub market_cap_rank: Option<u32>,
}
