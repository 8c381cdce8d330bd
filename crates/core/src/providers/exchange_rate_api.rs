use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;

use super::http::fetch_json;
use super::traits::ExchangeRateProvider;
use crate::errors::CoreError;

pub const DEFAULT_BASE_URL: &str = "https://api.exchangerate-api.com/v4";
const PROVIDER: &str = "ExchangeRate-API";

/// ExchangeRate-API provider for fiat exchange rates.
///
/// - **Free**: no API key on the v4 endpoint, rates refreshed daily.
/// - **Endpoint**: `/latest/{base}` returns every currency quoted against `base`.
pub struct ExchangeRateApiProvider {
    client: Client,
    base_url: String,
}

impl ExchangeRateApiProvider {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Deserialize)]
struct LatestResponse {
    rates: HashMap<String, f64>,
}

#[async_trait]
impl ExchangeRateProvider for ExchangeRateApiProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn fetch_rates(&self, base: &str) -> Result<HashMap<String, f64>, CoreError> {
        let base = base.to_uppercase();
        let url = format!("{}/latest/{base}", self.base_url);

        let resp: LatestResponse =
            fetch_json(PROVIDER, &format!("rates for {base}"), self.client.get(&url)).await?;

        Ok(resp
            .rates
            .into_iter()
            .map(|(currency, rate)| (currency.to_uppercase(), rate))
            .collect())
    }
}
