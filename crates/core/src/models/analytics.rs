use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::chain::{WalletBalances, WalletTransaction};
use super::price::PriceChanges;
use super::wallet::Holding;

/// Valuation of a single holding in the display currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingValuation {
    pub holding: Holding,

    /// Purchase price converted to the display currency
    pub purchase_price: f64,

    /// Current price converted to the display currency
    pub current_price: f64,

    /// Percentage changes reported for the coin (currency-independent)
    pub price_changes: PriceChanges,

    /// quantity × purchase_price
    pub total_invested: f64,

    /// quantity × current_price
    pub current_total: f64,

    /// current_total − total_invested
    pub profit_loss: f64,

    /// profit_loss / total_invested × 100, or 0 when nothing was invested
    pub profit_loss_percentage: f64,

    /// Share of the wallet's current value, in percent
    pub allocation: f64,

    pub currency: String,
}

/// Valuation of a wallet: every holding priced, or none at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletValuation {
    pub wallet_id: Uuid,
    pub name: String,
    pub icon: String,
    pub icon_color: String,
    pub currency: String,
    pub holdings: Vec<HoldingValuation>,
    pub current_total: f64,
    pub total_invested: f64,
    pub profit_loss: f64,
    pub profit_loss_percentage: f64,

    /// Value-weighted price changes across the holdings
    pub price_changes: PriceChanges,
}

/// A wallet valuation with the on-chain data attached at read time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletDetails {
    pub valuation: WalletValuation,
    #[serde(default)]
    pub balances: Option<WalletBalances>,
    #[serde(default)]
    pub transactions: Option<Vec<WalletTransaction>>,
}

/// A holding as it appears in the cross-wallet performance ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedHolding {
    pub coin_id: String,
    pub wallet_name: String,
    pub quantity: f64,
    pub purchase_price: f64,
    pub current_price: f64,
    pub current_total: f64,
    pub total_invested: f64,
    pub profit_loss: f64,
    pub profit_loss_percentage: f64,
}

impl RankedHolding {
    pub fn from_valuation(wallet_name: &str, valuation: &HoldingValuation) -> Self {
        Self {
            coin_id: valuation.holding.coin_id.clone(),
            wallet_name: wallet_name.to_string(),
            quantity: valuation.holding.quantity,
            purchase_price: valuation.purchase_price,
            current_price: valuation.current_price,
            current_total: valuation.current_total,
            total_invested: valuation.total_invested,
            profit_loss: valuation.profit_loss,
            profit_loss_percentage: valuation.profit_loss_percentage,
        }
    }
}

/// Per-wallet line in the portfolio overview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletSummary {
    pub wallet_id: Uuid,
    pub name: String,
    pub icon: String,
    pub icon_color: String,
    pub value: f64,

    /// Share of the portfolio's current value, in percent
    pub allocation: f64,
}

/// All of a user's wallets valued together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioValuation {
    pub currency: String,
    pub current_total: f64,
    pub total_invested: f64,
    pub profit_loss: f64,
    pub profit_loss_percentage: f64,
    pub price_changes: PriceChanges,

    /// Top 3 holdings by profit/loss percentage, best first
    pub best_performing: Vec<RankedHolding>,

    /// Bottom 3 holdings by profit/loss percentage, worst first
    pub worst_performing: Vec<RankedHolding>,

    pub wallets: Vec<WalletSummary>,
}

/// Value of one holding now and at each look-back horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingPerformance {
    pub coin_id: String,
    pub wallet_name: String,
    pub quantity: f64,
    pub purchase_value: f64,
    pub current_value: f64,
    pub value_24h: f64,
    pub value_7d: f64,
    pub value_30d: f64,
}

/// Portfolio value now versus 24 hours, 7 days and 30 days ago.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceHistory {
    pub currency: String,
    pub current_value: f64,
    pub value_24h: f64,
    pub value_7d: f64,
    pub value_30d: f64,
    pub change_24h: f64,
    pub change_7d: f64,
    pub change_30d: f64,
    pub holdings: Vec<HoldingPerformance>,
}
