use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Look-back window for a percentage price change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PriceHorizon {
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "24h")]
    OneDay,
    #[serde(rename = "7d")]
    SevenDays,
}

impl PriceHorizon {
    pub const ALL: [PriceHorizon; 3] = [
        PriceHorizon::OneHour,
        PriceHorizon::OneDay,
        PriceHorizon::SevenDays,
    ];

    /// Query-string token understood by the market-data provider.
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceHorizon::OneHour => "1h",
            PriceHorizon::OneDay => "24h",
            PriceHorizon::SevenDays => "7d",
        }
    }
}

impl std::fmt::Display for PriceHorizon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Percentage price changes over the supported horizons.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceChanges {
    #[serde(rename = "1h")]
    pub one_hour: f64,
    #[serde(rename = "24h")]
    pub one_day: f64,
    #[serde(rename = "7d")]
    pub seven_days: f64,
}

impl PriceChanges {
    pub fn new(one_hour: f64, one_day: f64, seven_days: f64) -> Self {
        Self {
            one_hour,
            one_day,
            seven_days,
        }
    }

    pub fn get(&self, horizon: PriceHorizon) -> f64 {
        match horizon {
            PriceHorizon::OneHour => self.one_hour,
            PriceHorizon::OneDay => self.one_day,
            PriceHorizon::SevenDays => self.seven_days,
        }
    }

    pub fn set(&mut self, horizon: PriceHorizon, value: f64) {
        match horizon {
            PriceHorizon::OneHour => self.one_hour = value,
            PriceHorizon::OneDay => self.one_day = value,
            PriceHorizon::SevenDays => self.seven_days = value,
        }
    }
}

/// Current USD price of a coin plus its recent changes, as fetched at `fetched_at`.
///
/// Lives only in the price cache, keyed by `coin_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSnapshot {
    pub coin_id: String,
    pub current_price: f64,
    pub price_changes: PriceChanges,
    pub fetched_at: DateTime<Utc>,
}

/// Multi-horizon prices derived from a 30-day chart, used for performance
/// calculations. Cached under `history-{coin_id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHistoryPoint {
    pub current_price: f64,
    pub price_24h: f64,
    pub price_7d: f64,
    pub price_30d: f64,
}

/// A single `[timestamp_ms, price]` pair from a market chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub timestamp_ms: i64,
    pub price: f64,
}

/// Fiat exchange rate between two currencies, as fetched at `fetched_at`.
/// Cached under `{from}-{to}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub from_currency: String,
    pub to_currency: String,
    pub rate: f64,
    pub fetched_at: DateTime<Utc>,
}
