use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use futures::future::try_join_all;
use tracing::debug;

use crate::errors::CoreError;
use crate::models::analytics::{
    HoldingPerformance, HoldingValuation, PerformanceHistory, PortfolioValuation, RankedHolding,
    WalletSummary, WalletValuation,
};
use crate::models::price::{PriceChanges, PriceHistoryPoint, PriceHorizon};
use crate::models::wallet::{Holding, Wallet};
use crate::services::currency_service::CurrencyService;
use crate::services::price_service::PriceService;

/// Currency every provider price and purchase price is quoted in.
pub const BASE_CURRENCY: &str = "USD";

/// Holdings listed in each of the best/worst performer rankings.
pub const RANKING_SIZE: usize = 3;

/// Computes wallet and portfolio figures: value, cost basis, profit/loss,
/// allocation and value-weighted price changes.
///
/// A wallet is valued completely or not at all: if any holding cannot be
/// priced, the whole wallet valuation fails.
pub struct ValuationService {
    prices: Arc<PriceService>,
    currency: Arc<CurrencyService>,
}

impl ValuationService {
    pub fn new(prices: Arc<PriceService>, currency: Arc<CurrencyService>) -> Self {
        Self { prices, currency }
    }

    /// Value every holding of `wallet` in `currency`.
    ///
    /// Holdings are priced concurrently; allocation and weighted changes are
    /// computed once all of them have resolved.
    pub async fn value_wallet(
        &self,
        wallet: &Wallet,
        currency: &str,
    ) -> Result<WalletValuation, CoreError> {
        let currency = currency.trim().to_uppercase();
        let rate = self.display_rate(&currency, !wallet.holdings.is_empty()).await?;
        self.value_wallet_at(wallet, &currency, rate).await
    }

    /// Value all `wallets` together. Fails if any wallet fails.
    pub async fn value_portfolio(
        &self,
        wallets: &[Wallet],
        currency: &str,
    ) -> Result<PortfolioValuation, CoreError> {
        let currency = currency.trim().to_uppercase();
        let has_holdings = wallets.iter().any(|w| !w.holdings.is_empty());
        let rate = self.display_rate(&currency, has_holdings).await?;
        let valuations = try_join_all(
            wallets
                .iter()
                .map(|wallet| self.value_wallet_at(wallet, &currency, rate)),
        )
        .await?;

        Ok(summarize_portfolio(&currency, &valuations))
    }

    /// Portfolio value now against 24 hours, 7 days and 30 days ago.
    ///
    /// Each distinct coin's history is fetched once; history fetches are
    /// rate limited, so they run one after another.
    pub async fn performance_history(
        &self,
        wallets: &[Wallet],
        currency: &str,
    ) -> Result<PerformanceHistory, CoreError> {
        let currency = currency.trim().to_uppercase();
        let rate = self.currency.get_rate(BASE_CURRENCY, &currency).await?;

        let mut histories: HashMap<String, PriceHistoryPoint> = HashMap::new();
        let mut holdings = Vec::new();
        for wallet in wallets {
            for holding in &wallet.holdings {
                let history = match histories.get(&holding.coin_id) {
                    Some(history) => history.clone(),
                    None => {
                        let history = self
                            .prices
                            .get_history(&holding.coin_id)
                            .await
                            .map_err(|e| missing_price(&holding.coin_id, e))?;
                        histories.insert(holding.coin_id.clone(), history.clone());
                        history
                    }
                };

                let value = |price: f64| holding.quantity * price * rate;
                holdings.push(HoldingPerformance {
                    coin_id: holding.coin_id.clone(),
                    wallet_name: wallet.name.clone(),
                    quantity: holding.quantity,
                    purchase_value: value(holding.purchase_price_usd),
                    current_value: value(history.current_price),
                    value_24h: value(history.price_24h),
                    value_7d: value(history.price_7d),
                    value_30d: value(history.price_30d),
                });
            }
        }

        let current_value: f64 = holdings.iter().map(|h| h.current_value).sum();
        let value_24h: f64 = holdings.iter().map(|h| h.value_24h).sum();
        let value_7d: f64 = holdings.iter().map(|h| h.value_7d).sum();
        let value_30d: f64 = holdings.iter().map(|h| h.value_30d).sum();

        Ok(PerformanceHistory {
            currency,
            current_value,
            value_24h,
            value_7d,
            value_30d,
            change_24h: profit_loss_percentage(current_value - value_24h, value_24h),
            change_7d: profit_loss_percentage(current_value - value_7d, value_7d),
            change_30d: profit_loss_percentage(current_value - value_30d, value_30d),
            holdings,
        })
    }

    /// USD to `currency`, resolved once per valuation. Nothing to convert
    /// means no lookup.
    async fn display_rate(&self, currency: &str, needed: bool) -> Result<f64, CoreError> {
        if !needed {
            return Ok(1.0);
        }
        self.currency.get_rate(BASE_CURRENCY, currency).await
    }

    async fn value_wallet_at(
        &self,
        wallet: &Wallet,
        currency: &str,
        rate: f64,
    ) -> Result<WalletValuation, CoreError> {
        let holdings = try_join_all(
            wallet
                .holdings
                .iter()
                .map(|holding| self.value_holding(holding, currency, rate)),
        )
        .await?;

        debug!(wallet_id = %wallet.id, holdings = holdings.len(), currency = %currency, "Valued wallet");
        Ok(summarize_wallet(wallet, currency, holdings))
    }

    async fn value_holding(
        &self,
        holding: &Holding,
        currency: &str,
        rate: f64,
    ) -> Result<HoldingValuation, CoreError> {
        let snapshot = self
            .prices
            .get(&holding.coin_id)
            .await
            .map_err(|e| missing_price(&holding.coin_id, e))?;

        let purchase_price = holding.purchase_price_usd * rate;
        let current_price = snapshot.current_price * rate;

        let total_invested = holding.quantity * purchase_price;
        let current_total = holding.quantity * current_price;
        let profit_loss = current_total - total_invested;

        Ok(HoldingValuation {
            holding: holding.clone(),
            purchase_price,
            current_price,
            price_changes: snapshot.price_changes,
            total_invested,
            current_total,
            profit_loss,
            profit_loss_percentage: profit_loss_percentage(profit_loss, total_invested),
            allocation: 0.0, // filled by summarize_wallet
            currency: currency.to_string(),
        })
    }
}

/// A coin the provider has no price for is an invalid state for a valuation.
/// Upstream failures keep their own kind.
fn missing_price(coin_id: &str, error: CoreError) -> CoreError {
    match error {
        CoreError::NotFound(_) => {
            CoreError::InvalidState(format!("No price available for coin '{coin_id}'"))
        }
        other => other,
    }
}

// ── Pure aggregation ────────────────────────────────────────────────

/// `profit_loss / total_invested × 100`, or 0 when nothing was invested.
pub fn profit_loss_percentage(profit_loss: f64, total_invested: f64) -> f64 {
    if total_invested == 0.0 {
        return 0.0;
    }
    let pct = profit_loss / total_invested * 100.0;
    if pct.is_finite() {
        pct
    } else {
        0.0
    }
}

/// Share of `total` taken by `value`, in percent. 0 when the total is not positive.
pub fn allocation(value: f64, total: f64) -> f64 {
    if total > 0.0 {
        value / total * 100.0
    } else {
        0.0
    }
}

/// Σ change × allocation / 100 for every horizon.
pub fn weighted_price_changes<I>(items: I) -> PriceChanges
where
    I: IntoIterator<Item = (PriceChanges, f64)>,
{
    let mut weighted = PriceChanges::default();
    for (changes, allocation) in items {
        for horizon in PriceHorizon::ALL {
            let value = weighted.get(horizon) + changes.get(horizon) * allocation / 100.0;
            weighted.set(horizon, value);
        }
    }
    weighted
}

/// Best and worst holdings by profit/loss percentage.
///
/// Both sorts are stable, so ties keep their input order.
pub fn rank_holdings(holdings: &[RankedHolding]) -> (Vec<RankedHolding>, Vec<RankedHolding>) {
    let by_pct = |a: &RankedHolding, b: &RankedHolding| {
        a.profit_loss_percentage
            .partial_cmp(&b.profit_loss_percentage)
            .unwrap_or(Ordering::Equal)
    };

    let mut best = holdings.to_vec();
    best.sort_by(|a, b| by_pct(b, a));
    best.truncate(RANKING_SIZE);

    let mut worst = holdings.to_vec();
    worst.sort_by(by_pct);
    worst.truncate(RANKING_SIZE);

    (best, worst)
}

/// Wallet totals from valued holdings; fills in each holding's allocation.
pub fn summarize_wallet(
    wallet: &Wallet,
    currency: &str,
    mut holdings: Vec<HoldingValuation>,
) -> WalletValuation {
    let current_total: f64 = holdings.iter().map(|h| h.current_total).sum();
    let total_invested: f64 = holdings.iter().map(|h| h.total_invested).sum();

    for holding in &mut holdings {
        holding.allocation = allocation(holding.current_total, current_total);
    }
    let price_changes =
        weighted_price_changes(holdings.iter().map(|h| (h.price_changes, h.allocation)));

    let profit_loss = current_total - total_invested;
    WalletValuation {
        wallet_id: wallet.id,
        name: wallet.name.clone(),
        icon: wallet.icon.clone(),
        icon_color: wallet.icon_color.clone(),
        currency: currency.to_string(),
        holdings,
        current_total,
        total_invested,
        profit_loss,
        profit_loss_percentage: profit_loss_percentage(profit_loss, total_invested),
        price_changes,
    }
}

/// Portfolio totals across wallet valuations, with per-wallet allocation
/// and the best/worst holdings over all wallets.
pub fn summarize_portfolio(currency: &str, wallets: &[WalletValuation]) -> PortfolioValuation {
    let current_total: f64 = wallets.iter().map(|w| w.current_total).sum();
    let total_invested: f64 = wallets.iter().map(|w| w.total_invested).sum();
    let profit_loss = current_total - total_invested;

    let price_changes = weighted_price_changes(wallets.iter().flat_map(|w| {
        w.holdings
            .iter()
            .map(|h| (h.price_changes, allocation(h.current_total, current_total)))
    }));

    let ranked: Vec<RankedHolding> = wallets
        .iter()
        .flat_map(|w| {
            w.holdings
                .iter()
                .map(|h| RankedHolding::from_valuation(&w.name, h))
        })
        .collect();
    let (best_performing, worst_performing) = rank_holdings(&ranked);

    let summaries = wallets
        .iter()
        .map(|w| WalletSummary {
            wallet_id: w.wallet_id,
            name: w.name.clone(),
            icon: w.icon.clone(),
            icon_color: w.icon_color.clone(),
            value: w.current_total,
            allocation: allocation(w.current_total, current_total),
        })
        .collect();

    PortfolioValuation {
        currency: currency.to_string(),
        current_total,
        total_invested,
        profit_loss,
        profit_loss_percentage: profit_loss_percentage(profit_loss, total_invested),
        price_changes,
        best_performing,
        worst_performing,
        wallets: summaries,
    }
}
