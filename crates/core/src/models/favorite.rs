use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A coin the user watches, with optional percentage-move thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteCoin {
    pub id: Uuid,
    pub user_id: Uuid,
    pub coin_id: String,
    #[serde(default)]
    pub alert_on_price_increase: Option<f64>,
    #[serde(default)]
    pub alert_on_price_decrease: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// A favourite together with its current USD price.
///
/// `current_price` is `None` when no price could be resolved, never a
/// made-up zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteWithPrice {
    pub favorite: FavoriteCoin,
    pub current_price: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FavoriteThresholds {
    #[serde(default)]
    pub alert_on_price_increase: Option<f64>,
    #[serde(default)]
    pub alert_on_price_decrease: Option<f64>,
}
