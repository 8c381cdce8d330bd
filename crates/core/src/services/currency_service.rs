use std::sync::Arc;

use tracing::debug;

use crate::cache::TtlCache;
use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::errors::CoreError;
use crate::models::price::ExchangeRate;
use crate::providers::traits::ExchangeRateProvider;

/// Converts amounts between fiat currencies.
///
/// Rates are cached per `{FROM}-{TO}` pair for `rate_ttl`. A miss fetches
/// every rate for the `from` base and keeps only the requested pair.
/// Unlike prices there is no stale fallback: a failed fetch is returned to
/// the caller.
///
/// Currency codes are case-insensitive and compared after upper-casing.
pub struct CurrencyService {
    provider: Arc<dyn ExchangeRateProvider>,
    clock: Arc<dyn Clock>,
    rates: TtlCache<ExchangeRate>,
}

impl CurrencyService {
    pub fn new(
        provider: Arc<dyn ExchangeRateProvider>,
        clock: Arc<dyn Clock>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            provider,
            clock,
            rates: TtlCache::new("exchange-rate", config.rate_ttl()),
        }
    }

    /// Convert `amount` of `from_currency` into `to_currency`.
    /// E.g., convert(1000.0, "USD", "EUR") → ~920.0
    ///
    /// Same currency on both sides returns `amount` untouched, with no lookup.
    pub async fn convert(
        &self,
        amount: f64,
        from_currency: &str,
        to_currency: &str,
    ) -> Result<f64, CoreError> {
        let from = from_currency.trim().to_uppercase();
        let to = to_currency.trim().to_uppercase();

        if from == to {
            return Ok(amount);
        }

        let rate = self.rate(&from, &to).await?;
        Ok(amount * rate)
    }

    /// How many units of `to_currency` one unit of `from_currency` buys.
    pub async fn get_rate(&self, from_currency: &str, to_currency: &str) -> Result<f64, CoreError> {
        let from = from_currency.trim().to_uppercase();
        let to = to_currency.trim().to_uppercase();

        if from == to {
            return Ok(1.0);
        }
        self.rate(&from, &to).await
    }

    async fn rate(&self, from: &str, to: &str) -> Result<f64, CoreError> {
        let key = format!("{from}-{to}");
        if let Some(cached) = self.rates.get_fresh(&key, self.clock.now()) {
            return Ok(cached.rate);
        }

        let rates = self.provider.fetch_rates(from).await?;
        let rate = rates.get(to).copied().ok_or_else(|| {
            CoreError::InvalidState(format!("Unsupported currency pair {from}-{to}"))
        })?;

        if !rate.is_finite() || rate <= 0.0 {
            return Err(CoreError::InvalidState(format!(
                "Invalid exchange rate for {from}-{to}: {rate}"
            )));
        }

        let fetched_at = self.clock.now();
        debug!(pair = %key, rate, provider = self.provider.name(), "Fetched exchange rate");
        self.rates.put(
            key.as_str(),
            ExchangeRate {
                from_currency: from.to_string(),
                to_currency: to.to_string(),
                rate,
                fetched_at,
            },
            fetched_at,
        );
        Ok(rate)
    }
}
