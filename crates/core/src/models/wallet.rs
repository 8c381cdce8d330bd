use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::chain::Chain;

/// A quantity of one coin bought at a known USD price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub id: Uuid,
    pub coin_id: String,
    pub quantity: f64,
    pub purchase_price_usd: f64,
    pub purchase_date: DateTime<Utc>,
}

impl Holding {
    pub fn new(
        coin_id: impl Into<String>,
        quantity: f64,
        purchase_price_usd: f64,
        purchase_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            coin_id: coin_id.into().to_lowercase(),
            quantity,
            purchase_price_usd,
            purchase_date,
        }
    }
}

/// A named group of holdings owned by one user.
///
/// Wallets with both `address` and `chain` also get on-chain balances and
/// transactions attached when read; those are never stored here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub icon: String,
    pub icon_color: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub chain: Option<Chain>,
    #[serde(default)]
    pub holdings: Vec<Holding>,
    pub created_at: DateTime<Utc>,
}

impl Wallet {
    /// Address and chain, when both are set.
    pub fn on_chain(&self) -> Option<(&str, Chain)> {
        match (&self.address, self.chain) {
            (Some(address), Some(chain)) => Some((address.as_str(), chain)),
            _ => None,
        }
    }
}

/// Input for creating a wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewWallet {
    pub name: String,
    pub icon: String,
    pub icon_color: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub chain: Option<Chain>,
}

/// Input for adding a holding to a wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewHolding {
    pub coin_id: String,
    pub quantity: f64,
    pub purchase_price_usd: f64,
    pub purchase_date: DateTime<Utc>,
}

/// Partial update of a holding; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HoldingUpdate {
    #[serde(default)]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub purchase_price_usd: Option<f64>,
    #[serde(default)]
    pub purchase_date: Option<DateTime<Utc>>,
}
