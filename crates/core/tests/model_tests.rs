// ═══════════════════════════════════════════════════════════════════
// Model Tests — prices, coins, chains, wallets, alerts, serde shapes
// ═══════════════════════════════════════════════════════════════════

use chrono::{TimeZone, Utc};
use std::str::FromStr;
use uuid::Uuid;

use coinfolio_core::models::alert::{AlertType, PriceAlert};
use coinfolio_core::models::chain::{is_valid_address, Chain, WalletBalances};
use coinfolio_core::models::coin::CoinMarketRow;
use coinfolio_core::models::notification::{NotificationMetadata, NotificationType};
use coinfolio_core::models::price::{PriceChanges, PriceHorizon};
use coinfolio_core::models::wallet::{Holding, HoldingUpdate, Wallet};

// ═══════════════════════════════════════════════════════════════════
// Prices
// ═══════════════════════════════════════════════════════════════════

mod price {
    use super::*;

    #[test]
    fn horizon_tokens() {
        let tokens: Vec<&str> = PriceHorizon::ALL.iter().map(|h| h.as_str()).collect();
        assert_eq!(tokens, vec!["1h", "24h", "7d"]);
        assert_eq!(PriceHorizon::OneDay.to_string(), "24h");
    }

    #[test]
    fn changes_get_and_set() {
        let mut changes = PriceChanges::default();
        changes.set(PriceHorizon::SevenDays, -3.5);
        assert_eq!(changes.get(PriceHorizon::SevenDays), -3.5);
        assert_eq!(changes.get(PriceHorizon::OneHour), 0.0);
    }

    #[test]
    fn changes_serialize_with_horizon_keys() {
        let changes = PriceChanges::new(1.0, 2.0, 3.0);
        let json = serde_json::to_value(changes).unwrap();
        assert_eq!(json["1h"], 1.0);
        assert_eq!(json["24h"], 2.0);
        assert_eq!(json["7d"], 3.0);
    }
}

// ═══════════════════════════════════════════════════════════════════
// Coins
// ═══════════════════════════════════════════════════════════════════

mod coin {
    use super::*;

    #[test]
    fn market_row_from_provider_json() {
        let json = r#"{
            "id": "bitcoin",
            "symbol": "btc",
            "name": "Bitcoin",
            "current_price": 64000.5,
            "market_cap_rank": 1,
            "price_change_percentage_1h_in_currency": 0.2,
            "price_change_percentage_24h_in_currency": -1.5,
            "price_change_percentage_7d_in_currency": 4.0
        }"#;
        let row: CoinMarketRow = serde_json::from_str(json).unwrap();

        assert_eq!(row.current_price, Some(64000.5));
        assert_eq!(row.market_cap_rank, Some(1));
        assert_eq!(row.price_changes(), PriceChanges::new(0.2, -1.5, 4.0));
    }

    #[test]
    fn missing_fields_stay_absent() {
        let json = r#"{"id": "tiny", "symbol": "tny", "name": "Tiny", "current_price": null}"#;
        let row: CoinMarketRow = serde_json::from_str(json).unwrap();

        assert_eq!(row.current_price, None);
        assert_eq!(row.price_changes(), PriceChanges::default());
    }
}

// ═══════════════════════════════════════════════════════════════════
// Chains
// ═══════════════════════════════════════════════════════════════════

mod chain {
    use super::*;

    #[test]
    fn chain_ids_and_symbols() {
        assert_eq!(Chain::Eth.chain_id(), "0x1");
        assert_eq!(Chain::Bsc.chain_id(), "0x38");
        assert_eq!(Chain::Polygon.chain_id(), "0x89");
        assert_eq!(Chain::Avalanche.chain_id(), "0xa86a");
        assert_eq!(Chain::Bsc.native_symbol(), "BNB");
        assert_eq!(Chain::Polygon.native_symbol(), "MATIC");
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(Chain::from_str("ETH").unwrap(), Chain::Eth);
        assert_eq!(Chain::from_str("Avalanche").unwrap(), Chain::Avalanche);
        assert!(Chain::from_str("solana").is_err());
    }

    #[test]
    fn serde_is_lowercase() {
        assert_eq!(serde_json::to_string(&Chain::Polygon).unwrap(), "\"polygon\"");
        let chain: Chain = serde_json::from_str("\"bsc\"").unwrap();
        assert_eq!(chain, Chain::Bsc);
    }

    #[test]
    fn addresses() {
        assert!(is_valid_address("0x52908400098527886E0F7030069857D2E4169EE7"));
        assert!(!is_valid_address("52908400098527886E0F7030069857D2E4169EE7"));
        assert!(!is_valid_address("0x52908400098527886E0F7030069857D2E4169EZ7"));
        assert!(!is_valid_address("0x1234"));
    }

    #[test]
    fn balances_round_trip_shape() {
        let json = r#"{
            "native_balance": {"balance": "1.5", "symbol": "ETH"},
            "tokens": [{"address": "0xabc", "symbol": "USDC", "name": "USD Coin", "balance": "10", "decimals": 6}]
        }"#;
        let balances: WalletBalances = serde_json::from_str(json).unwrap();
        assert_eq!(balances.native_balance.symbol, "ETH");
        assert_eq!(balances.tokens[0].decimals, 6);
    }
}

// ═══════════════════════════════════════════════════════════════════
// Wallets & holdings
// ═══════════════════════════════════════════════════════════════════

mod wallet {
    use super::*;

    fn wallet(address: Option<&str>, chain: Option<Chain>) -> Wallet {
        Wallet {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Cold storage".into(),
            icon: "lock".into(),
            icon_color: "#123456".into(),
            address: address.map(str::to_string),
            chain,
            holdings: vec![],
            created_at: Utc::now(),
        }
    }

    #[test]
    fn holding_lowercases_coin_id() {
        let holding = Holding::new("Bitcoin", 2.0, 10_000.0, Utc::now());
        assert_eq!(holding.coin_id, "bitcoin");
    }

    #[test]
    fn on_chain_needs_address_and_chain() {
        let addr = "0x52908400098527886E0F7030069857D2E4169EE7";
        assert_eq!(
            wallet(Some(addr), Some(Chain::Eth)).on_chain(),
            Some((addr, Chain::Eth))
        );
        assert_eq!(wallet(Some(addr), None).on_chain(), None);
        assert_eq!(wallet(None, Some(Chain::Eth)).on_chain(), None);
    }

    #[test]
    fn wallet_without_optional_fields_deserializes() {
        let json = format!(
            r##"{{"id": "{}", "user_id": "{}", "name": "W", "icon": "i", "icon_color": "#fff",
                "created_at": "2025-01-15T00:00:00Z"}}"##,
            Uuid::new_v4(),
            Uuid::new_v4()
        );
        let wallet: Wallet = serde_json::from_str(&json).unwrap();
        assert!(wallet.holdings.is_empty());
        assert!(wallet.address.is_none());
    }

    #[test]
    fn holding_update_defaults_to_no_change() {
        let update = HoldingUpdate::default();
        assert!(update.quantity.is_none());
        assert!(update.purchase_price_usd.is_none());
        assert!(update.purchase_date.is_none());
    }
}

// ═══════════════════════════════════════════════════════════════════
// Alerts & notifications
// ═══════════════════════════════════════════════════════════════════

mod alert {
    use super::*;

    #[test]
    fn above_and_below_are_inclusive() {
        assert!(AlertType::Above.is_crossed(100.0, 100.0));
        assert!(AlertType::Above.is_crossed(101.0, 100.0));
        assert!(!AlertType::Above.is_crossed(99.9, 100.0));
        assert!(AlertType::Below.is_crossed(100.0, 100.0));
        assert!(AlertType::Below.is_crossed(50.0, 100.0));
        assert!(!AlertType::Below.is_crossed(100.1, 100.0));
    }

    #[test]
    fn triggered_alert_never_triggers_again() {
        let mut alert = PriceAlert::new(Uuid::new_v4(), "BTC", 50_000.0, AlertType::Above);
        assert_eq!(alert.coin_id, "btc");
        assert!(alert.should_trigger(60_000.0));

        alert.triggered = true;
        alert.triggered_at = Some(Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap());
        assert!(!alert.is_pending());
        assert!(!alert.should_trigger(60_000.0));
        assert!(!alert.should_trigger(40_000.0));
    }

    #[test]
    fn alert_type_serde_is_uppercase() {
        assert_eq!(serde_json::to_string(&AlertType::Below).unwrap(), "\"BELOW\"");
        assert_eq!(AlertType::Above.to_string(), "ABOVE");
    }

    #[test]
    fn notification_type_serde() {
        assert_eq!(
            serde_json::to_string(&NotificationType::PriceAlert).unwrap(),
            "\"PRICE_ALERT\""
        );
        assert_eq!(
            serde_json::to_string(&NotificationType::FavoriteCoinChange).unwrap(),
            "\"FAVORITE_COIN_CHANGE\""
        );
    }

    #[test]
    fn empty_metadata_serializes_empty() {
        let json = serde_json::to_string(&NotificationMetadata::default()).unwrap();
        assert_eq!(json, "{}");
    }
}
