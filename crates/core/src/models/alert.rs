use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Direction of the threshold crossing an alert waits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertType {
    Above,
    Below,
}

impl AlertType {
    /// Inclusive on both sides: reaching the target counts as crossing it.
    pub fn is_crossed(&self, price: f64, target: f64) -> bool {
        match self {
            AlertType::Above => price >= target,
            AlertType::Below => price <= target,
        }
    }
}

impl std::fmt::Display for AlertType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertType::Above => write!(f, "ABOVE"),
            AlertType::Below => write!(f, "BELOW"),
        }
    }
}

/// One-shot price alert. `PENDING` until the threshold is crossed, then
/// `TRIGGERED` for good: a triggered alert is never re-armed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceAlert {
    pub id: Uuid,
    pub user_id: Uuid,
    pub coin_id: String,
    pub target_price: f64,
    pub alert_type: AlertType,
    pub triggered: bool,
    #[serde(default)]
    pub triggered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl PriceAlert {
    pub fn new(
        user_id: Uuid,
        coin_id: impl Into<String>,
        target_price: f64,
        alert_type: AlertType,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            coin_id: coin_id.into().to_lowercase(),
            target_price,
            alert_type,
            triggered: false,
            triggered_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_pending(&self) -> bool {
        !self.triggered
    }

    pub fn should_trigger(&self, price: f64) -> bool {
        self.is_pending() && self.alert_type.is_crossed(price, self.target_price)
    }
}

/// Input for creating an alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPriceAlert {
    pub coin_id: String,
    pub target_price: f64,
    pub alert_type: AlertType,
}

/// Outcome of one evaluation pass over the pending alerts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertRunReport {
    pub checked: usize,
    pub triggered: usize,
    pub failed: usize,
}
