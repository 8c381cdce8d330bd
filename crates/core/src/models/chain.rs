use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// EVM chains whose on-chain balances can be attached to a wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Eth,
    Bsc,
    Polygon,
    Avalanche,
}

impl Chain {
    /// Hex chain id as understood by the blockchain-data provider.
    pub fn chain_id(&self) -> &'static str {
        match self {
            Chain::Eth => "0x1",
            Chain::Bsc => "0x38",
            Chain::Polygon => "0x89",
            Chain::Avalanche => "0xa86a",
        }
    }

    pub fn native_symbol(&self) -> &'static str {
        match self {
            Chain::Eth => "ETH",
            Chain::Bsc => "BNB",
            Chain::Polygon => "MATIC",
            Chain::Avalanche => "AVAX",
        }
    }
}

impl std::fmt::Display for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Chain::Eth => write!(f, "eth"),
            Chain::Bsc => write!(f, "bsc"),
            Chain::Polygon => write!(f, "polygon"),
            Chain::Avalanche => write!(f, "avalanche"),
        }
    }
}

impl std::str::FromStr for Chain {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "eth" => Ok(Chain::Eth),
            "bsc" => Ok(Chain::Bsc),
            "polygon" => Ok(Chain::Polygon),
            "avalanche" => Ok(Chain::Avalanche),
            other => Err(CoreError::Validation(format!("Unsupported chain: {other}"))),
        }
    }
}

/// `0x` followed by exactly 40 hex digits.
pub fn is_valid_address(address: &str) -> bool {
    address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .is_some_and(|hex| hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NativeBalance {
    /// Human-readable amount (already scaled by 18 decimals).
    pub balance: String,
    pub symbol: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenBalance {
    pub address: String,
    pub symbol: String,
    pub name: String,
    /// Human-readable amount (already scaled by `decimals`).
    pub balance: String,
    pub decimals: u32,
}

/// Balances attached to an on-chain wallet at read time. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletBalances {
    pub native_balance: NativeBalance,
    pub tokens: Vec<TokenBalance>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletTransaction {
    pub hash: String,
    pub from: String,
    pub to: Option<String>,
    pub value: String,
    pub gas: String,
    pub gas_price: String,
    pub timestamp: String,
}

/// Scale an integer base-unit amount (e.g. wei) by `decimals` into a plain
/// decimal string without going through floating point.
///
/// Returns `None` unless `raw` is a non-empty run of ASCII digits.
pub fn format_units(raw: &str, decimals: u32) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let digits = raw.trim_start_matches('0');
    if digits.is_empty() {
        return Some("0".to_string());
    }
    let decimals = decimals as usize;
    let (int_part, frac_part) = if digits.len() > decimals {
        let split = digits.len() - decimals;
        (digits[..split].to_string(), digits[split..].to_string())
    } else {
        ("0".to_string(), format!("{digits:0>decimals$}"))
    };
    let frac_part = frac_part.trim_end_matches('0');
    if frac_part.is_empty() {
        Some(int_part)
    } else {
        Some(format!("{int_part}.{frac_part}"))
    }
}
