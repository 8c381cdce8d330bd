// Shared mock collaborators for the service and integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use coinfolio_core::clock::ManualClock;
use coinfolio_core::config::EngineConfig;
use coinfolio_core::errors::CoreError;
use coinfolio_core::models::chain::{
    Chain, NativeBalance, TokenBalance, WalletTransaction,
};
use coinfolio_core::models::coin::{CoinDetail, CoinMarketRow};
use coinfolio_core::models::price::{ChartPoint, PriceChanges, PriceHorizon};
use coinfolio_core::providers::traits::{
    BlockchainDataProvider, ExchangeRateProvider, MarketDataProvider, PushGateway,
};

pub const DAY_MS: i64 = 24 * 60 * 60 * 1000;

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap()
}

pub fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(start_time()))
}

pub fn config() -> EngineConfig {
    EngineConfig::default()
}

pub fn ids(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

// ═══════════════════════════════════════════════════════════════════
// Market data
// ═══════════════════════════════════════════════════════════════════

/// In-memory market: prices and changes per coin, plus call counters.
#[derive(Default)]
pub struct MockMarketData {
    prices: Mutex<HashMap<String, (f64, PriceChanges)>>,
    charts: Mutex<HashMap<String, Vec<ChartPoint>>>,
    chart_latency: Mutex<Option<std::time::Duration>>,
    failing: AtomicBool,
    pub market_calls: AtomicUsize,
    pub chart_calls: AtomicUsize,
}

impl MockMarketData {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_prices(prices: &[(&str, f64)]) -> Arc<Self> {
        let market = Self::new();
        for (id, price) in prices {
            market.set_price(id, *price);
        }
        market
    }

    pub fn set_price(&self, id: &str, price: f64) {
        self.set_quote(id, price, PriceChanges::default());
    }

    pub fn set_quote(&self, id: &str, price: f64, changes: PriceChanges) {
        self.prices
            .lock()
            .unwrap()
            .insert(id.to_string(), (price, changes));
    }

    pub fn remove(&self, id: &str) {
        self.prices.lock().unwrap().remove(id);
    }

    /// Daily chart of 31 points ending at `latest`, rising by `step` per day.
    pub fn set_linear_chart(&self, id: &str, latest: f64, step: f64) {
        let end = 1_736_942_400_000; // 2025-01-15T12:00:00Z
        let points = (0..=30)
            .map(|d| ChartPoint {
                timestamp_ms: end - (30 - d) * DAY_MS,
                price: latest - (30 - d) as f64 * step,
            })
            .collect();
        self.charts.lock().unwrap().insert(id.to_string(), points);
    }

    /// Chart fetches sleep this long before answering.
    pub fn set_chart_latency(&self, latency: std::time::Duration) {
        *self.chart_latency.lock().unwrap() = Some(latency);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn market_calls(&self) -> usize {
        self.market_calls.load(Ordering::SeqCst)
    }

    pub fn chart_calls(&self) -> usize {
        self.chart_calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), CoreError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(CoreError::upstream("MockMarket", "simulated outage"))
        } else {
            Ok(())
        }
    }

    fn row(id: &str, price: f64, changes: PriceChanges) -> CoinMarketRow {
        CoinMarketRow {
            id: id.to_string(),
            symbol: id.chars().take(3).collect(),
            name: id.to_string(),
            image: None,
            current_price: Some(price),
            market_cap: None,
            market_cap_rank: None,
            total_volume: None,
            price_change_1h: Some(changes.one_hour),
            price_change_24h: Some(changes.one_day),
            price_change_7d: Some(changes.seven_days),
        }
    }
}

#[async_trait]
impl MarketDataProvider for MockMarketData {
    fn name(&self) -> &str {
        "MockMarket"
    }

    async fn fetch_markets(
        &self,
        ids: &[String],
        _horizons: &[PriceHorizon],
    ) -> Result<Vec<CoinMarketRow>, CoreError> {
        self.market_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let prices = self.prices.lock().unwrap();
        Ok(ids
            .iter()
            .filter_map(|id| {
                prices
                    .get(id)
                    .map(|(price, changes)| Self::row(id, *price, *changes))
            })
            .collect())
    }

    async fn fetch_chart(
        &self,
        id: &str,
        _days: u32,
        _interval: &str,
    ) -> Result<Vec<ChartPoint>, CoreError> {
        self.chart_calls.fetch_add(1, Ordering::SeqCst);
        let latency = *self.chart_latency.lock().unwrap();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        self.check()?;
        Ok(self
            .charts
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_markets(
        &self,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<CoinMarketRow>, CoreError> {
        self.check()?;
        let prices = self.prices.lock().unwrap();
        let mut rows: Vec<CoinMarketRow> = prices
            .iter()
            .map(|(id, (price, changes))| Self::row(id, *price, *changes))
            .collect();
        rows.sort_by(|a, b| a.id.cmp(&b.id));
        let start = ((page - 1) * per_page) as usize;
        Ok(rows.into_iter().skip(start).take(per_page as usize).collect())
    }

    async fn get_coin(&self, id: &str) -> Result<CoinDetail, CoreError> {
        self.check()?;
        let prices = self.prices.lock().unwrap();
        let (price, _) = prices
            .get(id)
            .ok_or_else(|| CoreError::NotFound(format!("coin {id}")))?;
        Ok(CoinDetail {
            id: id.to_string(),
            symbol: id.chars().take(3).collect(),
            name: id.to_string(),
            description: None,
            homepage: None,
            image: None,
            current_price_usd: Some(*price),
            market_cap_rank: None,
        })
    }

    async fn simple_prices(&self, ids: &[String]) -> Result<HashMap<String, f64>, CoreError> {
        self.check()?;
        let prices = self.prices.lock().unwrap();
        Ok(ids
            .iter()
            .filter_map(|id| prices.get(id).map(|(p, _)| (id.clone(), *p)))
            .collect())
    }
}

// ═══════════════════════════════════════════════════════════════════
// Exchange rates
// ═══════════════════════════════════════════════════════════════════

#[derive(Default)]
pub struct MockRates {
    rates: Mutex<HashMap<String, HashMap<String, f64>>>,
    failing: AtomicBool,
    yielding: AtomicBool,
    pub calls: AtomicUsize,
}

impl MockRates {
    /// USD-based rates, e.g. `[("EUR", 0.5)]`.
    pub fn usd(rates: &[(&str, f64)]) -> Arc<Self> {
        let mock = Self::default();
        mock.set_rate("USD", "USD", 1.0);
        for (currency, rate) in rates {
            mock.set_rate("USD", currency, *rate);
        }
        Arc::new(mock)
    }

    pub fn set_rate(&self, base: &str, currency: &str, rate: f64) {
        self.rates
            .lock()
            .unwrap()
            .entry(base.to_string())
            .or_default()
            .insert(currency.to_string(), rate);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Suspend once per fetch, like a real network call would.
    pub fn set_yielding(&self, yielding: bool) {
        self.yielding.store(yielding, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExchangeRateProvider for MockRates {
    fn name(&self) -> &str {
        "MockRates"
    }

    async fn fetch_rates(&self, base: &str) -> Result<HashMap<String, f64>, CoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.yielding.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(CoreError::upstream("MockRates", "simulated outage"));
        }
        self.rates
            .lock()
            .unwrap()
            .get(base)
            .cloned()
            .ok_or_else(|| CoreError::upstream("MockRates", format!("unknown base {base}")))
    }
}

// ═══════════════════════════════════════════════════════════════════
// Blockchain data
// ═══════════════════════════════════════════════════════════════════

#[derive(Default)]
pub struct MockBlockchain {
    pub failing: AtomicBool,
    pub calls: AtomicUsize,
}

impl MockBlockchain {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        let mock = Self::default();
        mock.failing.store(true, Ordering::SeqCst);
        Arc::new(mock)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), CoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            Err(CoreError::upstream("MockChain", "simulated outage"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl BlockchainDataProvider for MockBlockchain {
    fn name(&self) -> &str {
        "MockChain"
    }

    async fn get_native_balance(
        &self,
        _address: &str,
        chain: Chain,
    ) -> Result<NativeBalance, CoreError> {
        self.check()?;
        Ok(NativeBalance {
            balance: "1.5".into(),
            symbol: chain.native_symbol().into(),
        })
    }

    async fn get_token_balances(
        &self,
        _address: &str,
        _chain: Chain,
    ) -> Result<Vec<TokenBalance>, CoreError> {
        self.check()?;
        Ok(vec![TokenBalance {
            address: "0xa0b8".into(),
            symbol: "USDC".into(),
            name: "USD Coin".into(),
            balance: "250".into(),
            decimals: 6,
        }])
    }

    async fn get_transactions(
        &self,
        address: &str,
        _chain: Chain,
        limit: u32,
    ) -> Result<Vec<WalletTransaction>, CoreError> {
        self.check()?;
        Ok((0..limit.min(3))
            .map(|i| WalletTransaction {
                hash: format!("0x{i:064x}"),
                from: address.to_string(),
                to: Some("0x2222".into()),
                value: "0.1".into(),
                gas: "21000".into(),
                gas_price: "1".into(),
                timestamp: "2025-01-15T10:00:00Z".into(),
            })
            .collect())
    }
}

// ═══════════════════════════════════════════════════════════════════
// Push
// ═══════════════════════════════════════════════════════════════════

/// Records every push; can be told to fail.
#[derive(Default)]
pub struct RecordingPush {
    pub sent: Mutex<Vec<(String, String, String)>>,
    pub failing: AtomicBool,
}

impl RecordingPush {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        let push = Self::default();
        push.failing.store(true, Ordering::SeqCst);
        Arc::new(push)
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl PushGateway for RecordingPush {
    async fn push(&self, token: &str, title: &str, body: &str) -> Result<(), CoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CoreError::upstream("MockPush", "device unreachable"));
        }
        self.sent
            .lock()
            .unwrap()
            .push((token.into(), title.into(), body.into()));
        Ok(())
    }
}
