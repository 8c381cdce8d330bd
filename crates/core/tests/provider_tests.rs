// ═══════════════════════════════════════════════════════════════════
// Provider Tests — CoinGecko, ExchangeRate-API, Moralis, HTTP client
// (against a local wiremock server)
// ═══════════════════════════════════════════════════════════════════

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use coinfolio_core::errors::CoreError;
use coinfolio_core::models::chain::Chain;
use coinfolio_core::models::price::PriceHorizon;
use coinfolio_core::providers::coingecko::CoinGeckoProvider;
use coinfolio_core::providers::exchange_rate_api::ExchangeRateApiProvider;
use coinfolio_core::providers::http::build_client;
use coinfolio_core::providers::moralis::MoralisProvider;
use coinfolio_core::providers::traits::{
    BlockchainDataProvider, ExchangeRateProvider, MarketDataProvider,
};

// ═══════════════════════════════════════════════════════════════════
// Test Helpers
// ═══════════════════════════════════════════════════════════════════

fn client() -> reqwest::Client {
    build_client(Duration::from_secs(5), 5).unwrap()
}

fn ids(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

const ADDRESS: &str = "0x52908400098527886E0F7030069857D2E4169EE7";

// ═══════════════════════════════════════════════════════════════════
// CoinGecko
// ═══════════════════════════════════════════════════════════════════

mod coingecko {
    use super::*;

    #[tokio::test]
    async fn fetch_markets_sends_ids_and_horizons() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/coins/markets"))
            .and(query_param("vs_currency", "usd"))
            .and(query_param("ids", "bitcoin,ethereum"))
            .and(query_param("price_change_percentage", "1h,24h,7d"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {
                    "id": "bitcoin", "symbol": "btc", "name": "Bitcoin",
                    "current_price": 64000.0,
                    "price_change_percentage_1h_in_currency": 0.1,
                    "price_change_percentage_24h_in_currency": 2.5,
                    "price_change_percentage_7d_in_currency": -4.0
                },
                {
                    "id": "ethereum", "symbol": "eth", "name": "Ethereum",
                    "current_price": 3100.0
                }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let provider = CoinGeckoProvider::new(client(), server.uri());
        let rows = provider
            .fetch_markets(&ids(&["bitcoin", "ethereum"]), &PriceHorizon::ALL)
            .await
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].current_price, Some(64000.0));
        assert_eq!(rows[0].price_changes().one_day, 2.5);
        assert_eq!(rows[1].price_changes().seven_days, 0.0);
    }

    #[tokio::test]
    async fn fetch_markets_with_no_ids_makes_no_call() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(0)
            .mount(&server)
            .await;

        let provider = CoinGeckoProvider::new(client(), server.uri());
        let rows = provider.fetch_markets(&[], &PriceHorizon::ALL).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn server_error_is_upstream_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/coins/markets"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let provider = CoinGeckoProvider::new(client(), server.uri());
        let err = provider
            .fetch_markets(&ids(&["bitcoin"]), &PriceHorizon::ALL)
            .await
            .unwrap_err();

        match err {
            CoreError::UpstreamUnavailable { provider, message } => {
                assert_eq!(provider, "CoinGecko");
                assert!(message.contains("503"), "{message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn rate_limited_is_upstream_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let provider = CoinGeckoProvider::new(client(), server.uri());
        let err = provider.fetch_chart("bitcoin", 30, "daily").await.unwrap_err();
        assert!(err.is_upstream());
    }

    #[tokio::test]
    async fn malformed_body_is_upstream_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/coins/markets"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let provider = CoinGeckoProvider::new(client(), server.uri());
        let err = provider
            .fetch_markets(&ids(&["bitcoin"]), &PriceHorizon::ALL)
            .await
            .unwrap_err();
        assert!(err.is_upstream());
    }

    #[tokio::test]
    async fn slow_response_times_out_as_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([]))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let client = build_client(Duration::from_millis(200), 5).unwrap();
        let provider = CoinGeckoProvider::new(client, server.uri());
        let err = provider
            .fetch_markets(&ids(&["bitcoin"]), &PriceHorizon::ALL)
            .await
            .unwrap_err();

        assert!(err.is_upstream());
        assert!(err.to_string().contains("timed out"), "{err}");
    }

    #[tokio::test]
    async fn fetch_chart_maps_pairs() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/coins/bitcoin/market_chart"))
            .and(query_param("days", "30"))
            .and(query_param("interval", "daily"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "prices": [[1700000000000.0, 35000.0], [1700086400000.0, 36000.5]]
            })))
            .mount(&server)
            .await;

        let provider = CoinGeckoProvider::new(client(), server.uri());
        let points = provider.fetch_chart("bitcoin", 30, "daily").await.unwrap();

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].timestamp_ms, 1_700_000_000_000);
        assert_eq!(points[1].price, 36000.5);
    }

    #[tokio::test]
    async fn list_markets_orders_by_market_cap() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/coins/markets"))
            .and(query_param("order", "market_cap_desc"))
            .and(query_param("page", "2"))
            .and(query_param("per_page", "50"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "dogecoin", "symbol": "doge", "name": "Dogecoin", "current_price": 0.1}
            ])))
            .mount(&server)
            .await;

        let provider = CoinGeckoProvider::new(client(), server.uri());
        let rows = provider.list_markets(2, 50).await.unwrap();
        assert_eq!(rows[0].id, "dogecoin");
    }

    #[tokio::test]
    async fn get_coin_maps_details() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/coins/bitcoin"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "bitcoin",
                "symbol": "btc",
                "name": "Bitcoin",
                "description": {"en": "Peer-to-peer cash."},
                "links": {"homepage": ["", "https://bitcoin.org"]},
                "image": {"large": "https://img/btc.png"},
                "market_cap_rank": 1,
                "market_data": {"current_price": {"usd": 64000.0, "eur": 59000.0}}
            })))
            .mount(&server)
            .await;

        let provider = CoinGeckoProvider::new(client(), server.uri());
        let coin = provider.get_coin("bitcoin").await.unwrap();

        assert_eq!(coin.description.as_deref(), Some("Peer-to-peer cash."));
        assert_eq!(coin.homepage.as_deref(), Some("https://bitcoin.org"));
        assert_eq!(coin.current_price_usd, Some(64000.0));
        assert_eq!(coin.market_cap_rank, Some(1));
    }

    #[tokio::test]
    async fn unknown_coin_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/coins/nope"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let provider = CoinGeckoProvider::new(client(), server.uri());
        let err = provider.get_coin("nope").await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn simple_prices_keep_usd_quotes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/simple/price"))
            .and(query_param("ids", "bitcoin,ethereum"))
            .and(query_param("vs_currencies", "usd"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "bitcoin": {"usd": 64000.0},
                "ethereum": {"usd": 3100.0}
            })))
            .mount(&server)
            .await;

        let provider = CoinGeckoProvider::new(client(), server.uri());
        let prices = provider
            .simple_prices(&ids(&["bitcoin", "ethereum"]))
            .await
            .unwrap();
        assert_eq!(prices["bitcoin"], 64000.0);
        assert_eq!(prices["ethereum"], 3100.0);
    }
}

// ═══════════════════════════════════════════════════════════════════
// ExchangeRate-API
// ═══════════════════════════════════════════════════════════════════

mod exchange_rate_api {
    use super::*;

    #[tokio::test]
    async fn fetch_rates_for_base() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/latest/USD"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "base": "USD",
                "rates": {"USD": 1.0, "EUR": 0.92, "pln": 4.05}
            })))
            .mount(&server)
            .await;

        let provider = ExchangeRateApiProvider::new(client(), server.uri());
        let rates = provider.fetch_rates("usd").await.unwrap();

        assert_eq!(rates["EUR"], 0.92);
        assert_eq!(rates["PLN"], 4.05);
    }

    #[tokio::test]
    async fn failure_is_upstream_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let provider = ExchangeRateApiProvider::new(client(), server.uri());
        let err = provider.fetch_rates("USD").await.unwrap_err();
        assert!(err.is_upstream());
    }
}

// ═══════════════════════════════════════════════════════════════════
// Moralis
// ═══════════════════════════════════════════════════════════════════

mod moralis {
    use super::*;

    #[tokio::test]
    async fn native_balance_is_formatted_with_chain_symbol() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/{ADDRESS}/balance")))
            .and(query_param("chain", "0x89"))
            .and(header("X-API-Key", "test-key"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"balance": "2500000000000000000"})),
            )
            .mount(&server)
            .await;

        let provider = MoralisProvider::new(client(), server.uri(), "test-key");
        let balance = provider
            .get_native_balance(ADDRESS, Chain::Polygon)
            .await
            .unwrap();

        assert_eq!(balance.balance, "2.5");
        assert_eq!(balance.symbol, "MATIC");
    }

    #[tokio::test]
    async fn token_balances_use_token_decimals() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/{ADDRESS}/erc20")))
            .and(query_param("chain", "0x1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {
                    "token_address": "0xa0b8",
                    "symbol": "USDC",
                    "name": "USD Coin",
                    "balance": "12340000",
                    "decimals": 6
                }
            ])))
            .mount(&server)
            .await;

        let provider = MoralisProvider::new(client(), server.uri(), "k");
        let tokens = provider
            .get_token_balances(ADDRESS, Chain::Eth)
            .await
            .unwrap();

        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].symbol, "USDC");
        assert_eq!(tokens[0].balance, "12.34");
    }

    #[tokio::test]
    async fn transactions_are_limited_and_mapped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/{ADDRESS}")))
            .and(query_param("chain", "0x38"))
            .and(query_param("limit", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": [{
                    "hash": "0xfeed",
                    "from_address": "0x1111",
                    "to_address": null,
                    "value": "1000000000000000000",
                    "gas": "21000",
                    "gas_price": "5000000000",
                    "block_timestamp": "2025-01-15T10:00:00.000Z"
                }]
            })))
            .mount(&server)
            .await;

        let provider = MoralisProvider::new(client(), server.uri(), "k");
        let txs = provider
            .get_transactions(ADDRESS, Chain::Bsc, 10)
            .await
            .unwrap();

        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].value, "1");
        assert_eq!(txs[0].to, None);
        assert_eq!(txs[0].gas, "21000");
    }

    #[tokio::test]
    async fn non_numeric_balance_is_upstream_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/{ADDRESS}/balance")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"balance": "12€45"})))
            .mount(&server)
            .await;

        let provider = MoralisProvider::new(client(), server.uri(), "k");
        let err = provider
            .get_native_balance(ADDRESS, Chain::Eth)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::UpstreamUnavailable { .. }));
    }

    #[tokio::test]
    async fn unauthorized_is_upstream_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let provider = MoralisProvider::new(client(), server.uri(), "bad");
        let err = provider
            .get_native_balance(ADDRESS, Chain::Eth)
            .await
            .unwrap_err();
        assert!(err.is_upstream());
    }
}

// ═══════════════════════════════════════════════════════════════════
// HTTP client
// ═══════════════════════════════════════════════════════════════════

mod http_client {
    use super::*;

    /// `/latest/USD` redirects through `hops` intermediate paths before
    /// landing on a rates body.
    async fn redirect_chain(hops: usize) -> MockServer {
        let server = MockServer::start().await;
        let mut from = "/latest/USD".to_string();
        for hop in 0..hops {
            let to = format!("/hop/{hop}");
            Mock::given(method("GET"))
                .and(path(from.as_str()))
                .respond_with(
                    ResponseTemplate::new(302)
                        .insert_header("Location", format!("{}{to}", server.uri()).as_str()),
                )
                .mount(&server)
                .await;
            from = to;
        }
        Mock::given(method("GET"))
            .and(path(from.as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "base": "USD",
                "rates": {"EUR": 0.92}
            })))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn redirects_beyond_limit_are_upstream_unavailable() {
        let server = redirect_chain(4).await;
        let client = build_client(Duration::from_secs(5), 2).unwrap();

        let provider = ExchangeRateApiProvider::new(client, server.uri());
        let err = provider.fetch_rates("USD").await.unwrap_err();
        assert!(matches!(err, CoreError::UpstreamUnavailable { .. }));
    }

    #[tokio::test]
    async fn redirects_within_limit_are_followed() {
        let server = redirect_chain(2).await;
        let client = build_client(Duration::from_secs(5), 2).unwrap();

        let provider = ExchangeRateApiProvider::new(client, server.uri());
        let rates = provider.fetch_rates("USD").await.unwrap();
        assert_eq!(rates["EUR"], 0.92);
    }
}
