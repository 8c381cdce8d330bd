use async_trait::async_trait;
use std::collections::HashMap;

use crate::errors::CoreError;
use crate::models::chain::{Chain, NativeBalance, TokenBalance, WalletTransaction};
use crate::models::coin::{CoinDetail, CoinMarketRow};
use crate::models::price::{ChartPoint, PriceHorizon};

/// Third-party market data (prices, changes, charts, coin catalogue).
///
/// All prices are USD. Implementations report transport failures, timeouts
/// and non-success statuses as `CoreError::UpstreamUnavailable`.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    /// Price plus percentage changes for the given ids, in one call.
    /// Ids the provider does not know are simply absent from the result.
    async fn fetch_markets(
        &self,
        ids: &[String],
        horizons: &[PriceHorizon],
    ) -> Result<Vec<CoinMarketRow>, CoreError>;

    /// `[timestamp, price]` series covering the last `days` days.
    async fn fetch_chart(
        &self,
        id: &str,
        days: u32,
        interval: &str,
    ) -> Result<Vec<ChartPoint>, CoreError>;

    /// Coins ordered by market cap, descending.
    async fn list_markets(&self, page: u32, per_page: u32)
        -> Result<Vec<CoinMarketRow>, CoreError>;

    async fn get_coin(&self, id: &str) -> Result<CoinDetail, CoreError>;

    /// Bare USD prices for the given ids, in one call.
    async fn simple_prices(&self, ids: &[String]) -> Result<HashMap<String, f64>, CoreError>;
}

/// Fiat exchange rates.
#[async_trait]
pub trait ExchangeRateProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Every rate quoted against `base` (1 `base` = rate × currency).
    async fn fetch_rates(&self, base: &str) -> Result<HashMap<String, f64>, CoreError>;
}

/// On-chain balances and transactions for EVM addresses.
#[async_trait]
pub trait BlockchainDataProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn get_native_balance(
        &self,
        address: &str,
        chain: Chain,
    ) -> Result<NativeBalance, CoreError>;

    async fn get_token_balances(
        &self,
        address: &str,
        chain: Chain,
    ) -> Result<Vec<TokenBalance>, CoreError>;

    async fn get_transactions(
        &self,
        address: &str,
        chain: Chain,
        limit: u32,
    ) -> Result<Vec<WalletTransaction>, CoreError>;
}

/// Delivery channel for push notifications.
#[async_trait]
pub trait PushGateway: Send + Sync {
    async fn push(&self, token: &str, title: &str, body: &str) -> Result<(), CoreError>;
}
