use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;

use super::http::fetch_json;
use super::traits::BlockchainDataProvider;
use crate::errors::CoreError;
use crate::models::chain::{format_units, Chain, NativeBalance, TokenBalance, WalletTransaction};

pub const DEFAULT_BASE_URL: &str = "https://deep-index.moralis.io/api/v2.2";
const PROVIDER: &str = "Moralis";
const NATIVE_DECIMALS: u32 = 18;

/// Moralis Web3 Data API provider for EVM balances and transactions.
///
/// - **Requires an API key**, sent in the `X-API-Key` header.
/// - **Endpoints**: `/{address}/balance`, `/{address}/erc20`, `/{address}`
///
/// Raw base-unit amounts are scaled into decimal strings here so callers
/// never deal with wei.
pub struct MoralisProvider {
    client: Client,
    base_url: String,
    api_key: String,
}

impl MoralisProvider {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    fn get(&self, path: &str, chain: Chain) -> RequestBuilder {
        self.client
            .get(format!("{}/{path}", self.base_url))
            .header("X-API-Key", &self.api_key)
            .query(&[("chain", chain.chain_id())])
    }
}

// ── Moralis API response types ──────────────────────────────────────

#[derive(Deserialize)]
struct NativeBalanceResponse {
    balance: String,
}

#[derive(Deserialize)]
struct Erc20Balance {
    token_address: String,
    #[serde(default)]
    symbol: Option<String>,
    #[serde(default)]
    name: Option<String>,
    balance: String,
    #[serde(default)]
    decimals: Option<u32>,
}

#[derive(Deserialize)]
struct TransactionsResponse {
    #[serde(default)]
    result: Vec<RawTransaction>,
}

#[derive(Deserialize)]
struct RawTransaction {
    hash: String,
    from_address: String,
    #[serde(default)]
    to_address: Option<String>,
    value: String,
    #[serde(default)]
    gas: Option<String>,
    #[serde(default)]
    gas_price: Option<String>,
    block_timestamp: String,
}

#[async_trait]
impl BlockchainDataProvider for MoralisProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn get_native_balance(
        &self,
        address: &str,
        chain: Chain,
    ) -> Result<NativeBalance, CoreError> {
        let resp: NativeBalanceResponse = fetch_json(
            PROVIDER,
            &format!("native balance of {address} on {chain}"),
            self.get(&format!("{address}/balance"), chain),
        )
        .await?;

        Ok(NativeBalance {
            balance: scaled(&resp.balance, NATIVE_DECIMALS)?,
            symbol: chain.native_symbol().to_string(),
        })
    }

    async fn get_token_balances(
        &self,
        address: &str,
        chain: Chain,
    ) -> Result<Vec<TokenBalance>, CoreError> {
        let resp: Vec<Erc20Balance> = fetch_json(
            PROVIDER,
            &format!("token balances of {address} on {chain}"),
            self.get(&format!("{address}/erc20"), chain),
        )
        .await?;

        resp.into_iter()
            .map(|t| {
                let decimals = t.decimals.unwrap_or(NATIVE_DECIMALS);
                Ok::<_, CoreError>(TokenBalance {
                    balance: scaled(&t.balance, decimals)?,
                    address: t.token_address,
                    symbol: t.symbol.unwrap_or_default(),
                    name: t.name.unwrap_or_default(),
                    decimals,
                })
            })
            .collect()
    }

    async fn get_transactions(
        &self,
        address: &str,
        chain: Chain,
        limit: u32,
    ) -> Result<Vec<WalletTransaction>, CoreError> {
        let resp: TransactionsResponse = fetch_json(
            PROVIDER,
            &format!("transactions of {address} on {chain}"),
            self.get(address, chain).query(&[("limit", limit)]),
        )
        .await?;

        resp.result
            .into_iter()
            .map(|tx| {
                Ok::<_, CoreError>(WalletTransaction {
                    value: scaled(&tx.value, NATIVE_DECIMALS)?,
                    hash: tx.hash,
                    from: tx.from_address,
                    to: tx.to_address,
                    gas: tx.gas.unwrap_or_default(),
                    gas_price: tx.gas_price.unwrap_or_default(),
                    timestamp: tx.block_timestamp,
                })
            })
            .collect()
    }
}

fn scaled(raw: &str, decimals: u32) -> Result<String, CoreError> {
    format_units(raw, decimals)
        .ok_or_else(|| CoreError::upstream(PROVIDER, format!("malformed amount '{raw}'")))
}
