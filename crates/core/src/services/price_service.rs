use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, warn};

use super::rate_limiter::RateLimiter;
use crate::cache::TtlCache;
use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::errors::CoreError;
use crate::models::coin::{CoinDetail, CoinMarketRow};
use crate::models::price::{ChartPoint, PriceHistoryPoint, PriceHorizon, PriceSnapshot};
use crate::providers::traits::MarketDataProvider;

/// Days of chart data fetched for a price history.
pub const HISTORY_DAYS: u32 = 30;
const HISTORY_INTERVAL: &str = "daily";
const MAX_PAGE_SIZE: u32 = 250;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Fetches USD coin prices from the market-data provider with TTL caching.
///
/// Cache strategy:
/// - **Snapshots** (price + 1h/24h/7d changes): fresh for `price_ttl`, keyed by coin id.
/// - **Histories** (now / 24h / 7d / 30d prices): fresh for `history_ttl`, keyed by
///   `history-{coin_id}`. Fetches go through a global [`RateLimiter`].
/// - Stale entries are kept. When a fetch fails, a stale entry is returned in
///   place of the error; without one the error propagates unchanged.
///
/// **Note on precision**: prices are `f64`. Values are never substituted with
/// zero on failure; a zero price only ever comes from the provider itself.
pub struct PriceService {
    provider: Arc<dyn MarketDataProvider>,
    clock: Arc<dyn Clock>,
    snapshots: TtlCache<PriceSnapshot>,
    histories: TtlCache<PriceHistoryPoint>,
    history_limiter: RateLimiter,
}

impl PriceService {
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        clock: Arc<dyn Clock>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            provider,
            clock,
            snapshots: TtlCache::new("price", config.price_ttl()),
            histories: TtlCache::new("history", config.history_ttl()),
            history_limiter: RateLimiter::new(config.history_min_spacing()),
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Current snapshot for one coin.
    ///
    /// 1. Fresh cache entry → return it, no network call.
    /// 2. Otherwise fetch, store with `fetched_at = now` and return.
    /// 3. On failure, return the stale entry if any, else the error.
    pub async fn get(&self, coin_id: &str) -> Result<PriceSnapshot, CoreError> {
        let key = normalize(coin_id);
        if let Some(snapshot) = self.snapshots.get_fresh(&key, self.clock.now()) {
            return Ok(snapshot);
        }

        let fetched = self.fetch_snapshots(std::slice::from_ref(&key)).await;
        match fetched {
            Ok(mut fresh) => match fresh.remove(&key) {
                Some(snapshot) => Ok(snapshot),
                None => self.stale_snapshot_or(
                    &key,
                    CoreError::NotFound(format!("No price for coin '{key}'")),
                ),
            },
            Err(e) => self.stale_snapshot_or(&key, e),
        }
    }

    /// Current USD price for one coin.
    pub async fn price(&self, coin_id: &str) -> Result<f64, CoreError> {
        Ok(self.get(coin_id).await?.current_price)
    }

    /// Snapshots for many coins with a single upstream call.
    ///
    /// Fresh entries are served from the cache and only the remaining ids are
    /// requested. Ids the provider omits, or all of them when the call fails,
    /// fall back to whatever the cache holds. The result may be partial; it is
    /// an error only when not a single id resolves.
    pub async fn get_batch(
        &self,
        coin_ids: &[String],
    ) -> Result<HashMap<String, PriceSnapshot>, CoreError> {
        let mut seen = HashSet::new();
        let ids: Vec<String> = coin_ids
            .iter()
            .map(|id| normalize(id))
            .filter(|id| seen.insert(id.clone()))
            .collect();

        let now = self.clock.now();
        let mut resolved = HashMap::with_capacity(ids.len());
        let mut missing = Vec::new();
        for id in ids {
            match self.snapshots.get_fresh(&id, now) {
                Some(snapshot) => {
                    resolved.insert(id, snapshot);
                }
                None => missing.push(id),
            }
        }

        if missing.is_empty() {
            return Ok(resolved);
        }

        let mut upstream_error = None;
        match self.fetch_snapshots(&missing).await {
            Ok(fresh) => resolved.extend(fresh),
            Err(e) => {
                warn!(ids = ?missing, error = %e, "Batch price fetch failed, falling back to cache");
                upstream_error = Some(e);
            }
        }

        for id in &missing {
            if resolved.contains_key(id) {
                continue;
            }
            match self.snapshots.get_any(id) {
                Some(stale) => {
                    warn!(coin_id = %id, fetched_at = %stale.fetched_at, "Serving stale price");
                    resolved.insert(id.clone(), stale.value);
                }
                None => debug!(coin_id = %id, "No price available"),
            }
        }

        if resolved.is_empty() {
            return Err(upstream_error.unwrap_or_else(|| {
                CoreError::NotFound(format!("No prices for coins: {}", missing.join(", ")))
            }));
        }
        Ok(resolved)
    }

    /// Prices now and 24h / 7d / 30d ago, derived from a daily chart.
    ///
    /// Upstream chart calls are spaced by the history rate limiter; cache
    /// hits never wait.
    pub async fn get_history(&self, coin_id: &str) -> Result<PriceHistoryPoint, CoreError> {
        let id = normalize(coin_id);
        let key = format!("history-{id}");
        if let Some(history) = self.histories.get_fresh(&key, self.clock.now()) {
            return Ok(history);
        }

        self.history_limiter.acquire().await;
        // Another caller may have filled the entry while this one waited.
        if let Some(history) = self.histories.get_fresh(&key, self.clock.now()) {
            return Ok(history);
        }
        let fetched = self
            .provider
            .fetch_chart(&id, HISTORY_DAYS, HISTORY_INTERVAL)
            .await;

        let error = match fetched {
            Ok(points) => match derive_history(&points) {
                Some(history) => {
                    self.histories
                        .put(key.as_str(), history.clone(), self.clock.now());
                    return Ok(history);
                }
                None => CoreError::NotFound(format!("No price history for coin '{id}'")),
            },
            Err(e) => e,
        };

        match self.histories.get_any(&key) {
            Some(stale) => {
                warn!(coin_id = %id, error = %error, "Serving stale price history");
                Ok(stale.value)
            }
            None => Err(error),
        }
    }

    /// One page of the coin catalogue, largest market cap first. Not cached.
    pub async fn list_coins(
        &self,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<CoinMarketRow>, CoreError> {
        if page == 0 {
            return Err(CoreError::Validation("page starts at 1".to_string()));
        }
        if per_page == 0 || per_page > MAX_PAGE_SIZE {
            return Err(CoreError::Validation(format!(
                "per_page must be between 1 and {MAX_PAGE_SIZE}, got {per_page}"
            )));
        }
        self.provider.list_markets(page, per_page).await
    }

    /// Catalogue details for one coin. Not cached.
    pub async fn coin_details(&self, coin_id: &str) -> Result<CoinDetail, CoreError> {
        self.provider.get_coin(&normalize(coin_id)).await
    }

    /// One upstream markets call; every priced row is stored and returned.
    async fn fetch_snapshots(
        &self,
        ids: &[String],
    ) -> Result<HashMap<String, PriceSnapshot>, CoreError> {
        let rows = self.provider.fetch_markets(ids, &PriceHorizon::ALL).await?;
        let fetched_at = self.clock.now();

        let mut fresh = HashMap::with_capacity(rows.len());
        for row in rows {
            let Some(price) = row.current_price else {
                debug!(coin_id = %row.id, "Provider returned no price");
                continue;
            };
            if !price.is_finite() || price < 0.0 {
                warn!(coin_id = %row.id, price, "Ignoring invalid price from provider");
                continue;
            }
            let id = normalize(&row.id);
            let snapshot = PriceSnapshot {
                coin_id: id.clone(),
                current_price: price,
                price_changes: row.price_changes(),
                fetched_at,
            };
            self.snapshots.put(id.as_str(), snapshot.clone(), fetched_at);
            fresh.insert(id, snapshot);
        }
        Ok(fresh)
    }

    fn stale_snapshot_or(&self, key: &str, error: CoreError) -> Result<PriceSnapshot, CoreError> {
        match self.snapshots.get_any(key) {
            Some(stale) => {
                warn!(coin_id = %key, error = %error, fetched_at = %stale.fetched_at, "Serving stale price");
                Ok(stale.value)
            }
            None => Err(error),
        }
    }
}

fn normalize(coin_id: &str) -> String {
    coin_id.trim().to_lowercase()
}

/// Reduce a price chart to prices now and 1, 7 and 30 days before the
/// latest point.
///
/// Each horizon takes the latest point at or before its cutoff; when the
/// chart does not reach back that far, the oldest point is used.
/// Returns `None` for an empty chart.
pub fn derive_history(points: &[ChartPoint]) -> Option<PriceHistoryPoint> {
    let mut sorted: Vec<ChartPoint> = points
        .iter()
        .copied()
        .filter(|p| p.price.is_finite())
        .collect();
    sorted.sort_by_key(|p| p.timestamp_ms);

    let oldest = sorted.first()?;
    let latest = sorted.last()?;
    let price_at = |days: i64| {
        let cutoff = latest.timestamp_ms - days * DAY_MS;
        sorted
            .iter()
            .rev()
            .find(|p| p.timestamp_ms <= cutoff)
            .unwrap_or(oldest)
            .price
    };

    Some(PriceHistoryPoint {
        current_price: latest.price,
        price_24h: price_at(1),
        price_7d: price_at(7),
        price_30d: price_at(30),
    })
}
