use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use super::valuation_service::ValuationService;
use crate::clock::Clock;
use crate::errors::CoreError;
use crate::models::analytics::WalletDetails;
use crate::models::chain::{is_valid_address, Chain, WalletBalances, WalletTransaction};
use crate::models::wallet::{Holding, HoldingUpdate, NewHolding, NewWallet, Wallet};
use crate::providers::traits::BlockchainDataProvider;
use crate::storage::repository::WalletRepository;

/// Transactions attached to wallet details.
pub const RECENT_TRANSACTIONS: u32 = 10;

/// Wallet and holding management, scoped by owning user.
///
/// Validation happens here, before anything reaches storage.
pub struct WalletService {
    wallets: Arc<dyn WalletRepository>,
    valuation: Arc<ValuationService>,
    blockchain: Option<Arc<dyn BlockchainDataProvider>>,
    clock: Arc<dyn Clock>,
}

impl WalletService {
    pub fn new(
        wallets: Arc<dyn WalletRepository>,
        valuation: Arc<ValuationService>,
        blockchain: Option<Arc<dyn BlockchainDataProvider>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            wallets,
            valuation,
            blockchain,
            clock,
        }
    }

    pub async fn create_wallet(&self, user_id: Uuid, input: NewWallet) -> Result<Wallet, CoreError> {
        validate_wallet(&input)?;

        let wallet = Wallet {
            id: Uuid::new_v4(),
            user_id,
            name: input.name.trim().to_string(),
            icon: input.icon,
            icon_color: input.icon_color,
            address: input.address.map(|a| a.trim().to_string()),
            chain: input.chain,
            holdings: Vec::new(),
            created_at: self.clock.now(),
        };
        self.wallets.insert_wallet(wallet.clone()).await?;
        debug!(wallet_id = %wallet.id, "Created wallet");
        Ok(wallet)
    }

    pub async fn list_wallets(&self, user_id: Uuid) -> Result<Vec<Wallet>, CoreError> {
        self.wallets.find_wallets(user_id).await
    }

    pub async fn get_wallet(&self, user_id: Uuid, wallet_id: Uuid) -> Result<Wallet, CoreError> {
        self.wallets
            .find_wallet(user_id, wallet_id)
            .await?
            .ok_or_else(|| wallet_not_found(wallet_id))
    }

    pub async fn delete_wallet(&self, user_id: Uuid, wallet_id: Uuid) -> Result<(), CoreError> {
        if self.wallets.delete_wallet(user_id, wallet_id).await? {
            Ok(())
        } else {
            Err(wallet_not_found(wallet_id))
        }
    }

    pub async fn add_holding(
        &self,
        user_id: Uuid,
        wallet_id: Uuid,
        input: NewHolding,
    ) -> Result<Holding, CoreError> {
        let coin_id = input.coin_id.trim();
        if coin_id.is_empty() {
            return Err(CoreError::Validation("coin id must not be empty".to_string()));
        }
        validate_quantity(input.quantity)?;
        validate_purchase_price(input.purchase_price_usd)?;

        let holding = Holding::new(
            coin_id,
            input.quantity,
            input.purchase_price_usd,
            input.purchase_date,
        );
        if !self
            .wallets
            .insert_holding(user_id, wallet_id, holding.clone())
            .await?
        {
            return Err(wallet_not_found(wallet_id));
        }
        Ok(holding)
    }

    pub async fn update_holding(
        &self,
        user_id: Uuid,
        wallet_id: Uuid,
        holding_id: Uuid,
        update: HoldingUpdate,
    ) -> Result<Holding, CoreError> {
        let wallet = self.get_wallet(user_id, wallet_id).await?;
        let mut holding = wallet
            .holdings
            .into_iter()
            .find(|h| h.id == holding_id)
            .ok_or_else(|| holding_not_found(holding_id))?;

        if let Some(quantity) = update.quantity {
            validate_quantity(quantity)?;
            holding.quantity = quantity;
        }
        if let Some(price) = update.purchase_price_usd {
            validate_purchase_price(price)?;
            holding.purchase_price_usd = price;
        }
        if let Some(date) = update.purchase_date {
            holding.purchase_date = date;
        }

        if !self
            .wallets
            .update_holding(user_id, wallet_id, holding.clone())
            .await?
        {
            return Err(holding_not_found(holding_id));
        }
        Ok(holding)
    }

    pub async fn remove_holding(
        &self,
        user_id: Uuid,
        wallet_id: Uuid,
        holding_id: Uuid,
    ) -> Result<(), CoreError> {
        // Tell a missing wallet apart from a missing holding
        self.get_wallet(user_id, wallet_id).await?;
        if self
            .wallets
            .delete_holding(user_id, wallet_id, holding_id)
            .await?
        {
            Ok(())
        } else {
            Err(holding_not_found(holding_id))
        }
    }

    /// Valuation plus on-chain data for wallets with an address and chain.
    ///
    /// Blockchain lookups never fail the call: on error the data is left
    /// out and a warning is logged.
    pub async fn get_wallet_details(
        &self,
        user_id: Uuid,
        wallet_id: Uuid,
        currency: &str,
    ) -> Result<WalletDetails, CoreError> {
        let wallet = self.get_wallet(user_id, wallet_id).await?;
        let valuation = self.valuation.value_wallet(&wallet, currency).await?;

        let (balances, transactions) = match (wallet.on_chain(), &self.blockchain) {
            (Some((address, chain)), Some(provider)) => futures::join!(
                fetch_balances(provider.as_ref(), address, chain),
                fetch_transactions(provider.as_ref(), address, chain),
            ),
            _ => (None, None),
        };

        Ok(WalletDetails {
            valuation,
            balances,
            transactions,
        })
    }
}

async fn fetch_balances(
    provider: &dyn BlockchainDataProvider,
    address: &str,
    chain: Chain,
) -> Option<WalletBalances> {
    let (native, tokens) = futures::join!(
        provider.get_native_balance(address, chain),
        provider.get_token_balances(address, chain),
    );
    match (native, tokens) {
        (Ok(native_balance), Ok(tokens)) => Some(WalletBalances {
            native_balance,
            tokens,
        }),
        (Err(e), _) | (_, Err(e)) => {
            warn!(address, chain = %chain, provider = provider.name(), error = %e, "Could not load wallet balances");
            None
        }
    }
}

async fn fetch_transactions(
    provider: &dyn BlockchainDataProvider,
    address: &str,
    chain: Chain,
) -> Option<Vec<WalletTransaction>> {
    match provider
        .get_transactions(address, chain, RECENT_TRANSACTIONS)
        .await
    {
        Ok(transactions) => Some(transactions),
        Err(e) => {
            warn!(address, chain = %chain, provider = provider.name(), error = %e, "Could not load wallet transactions");
            None
        }
    }
}

fn wallet_not_found(wallet_id: Uuid) -> CoreError {
    CoreError::NotFound(format!("Wallet {wallet_id}"))
}

fn holding_not_found(holding_id: Uuid) -> CoreError {
    CoreError::NotFound(format!("Holding {holding_id}"))
}

fn validate_wallet(input: &NewWallet) -> Result<(), CoreError> {
    if input.name.trim().is_empty() {
        return Err(CoreError::Validation("wallet name must not be empty".to_string()));
    }
    if !is_hex_color(&input.icon_color) {
        return Err(CoreError::Validation(format!(
            "icon color must be #RGB or #RRGGBB, got '{}'",
            input.icon_color
        )));
    }
    if let Some(address) = &input.address {
        if input.chain.is_none() {
            return Err(CoreError::Validation(
                "a wallet address requires a chain".to_string(),
            ));
        }
        if !is_valid_address(address.trim()) {
            return Err(CoreError::Validation(format!("invalid wallet address '{address}'")));
        }
    }
    Ok(())
}

fn validate_quantity(quantity: f64) -> Result<(), CoreError> {
    if !quantity.is_finite() || quantity <= 0.0 {
        return Err(CoreError::Validation(format!(
            "quantity must be positive, got {quantity}"
        )));
    }
    Ok(())
}

fn validate_purchase_price(price: f64) -> Result<(), CoreError> {
    if !price.is_finite() || price < 0.0 {
        return Err(CoreError::Validation(format!(
            "purchase price must not be negative, got {price}"
        )));
    }
    Ok(())
}

fn is_hex_color(color: &str) -> bool {
    match color.strip_prefix('#') {
        Some(hex) => (hex.len() == 3 || hex.len() == 6) && hex.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_wallet(color: &str, address: Option<&str>, chain: Option<Chain>) -> NewWallet {
        NewWallet {
            name: "Main".to_string(),
            icon: "wallet".to_string(),
            icon_color: color.to_string(),
            address: address.map(str::to_string),
            chain,
        }
    }

    #[test]
    fn hex_colors() {
        assert!(is_hex_color("#fff"));
        assert!(is_hex_color("#1A2b3C"));
        assert!(!is_hex_color("fff"));
        assert!(!is_hex_color("#ffff"));
        assert!(!is_hex_color("#ggg"));
    }

    #[test]
    fn address_needs_chain() {
        let address = "0x52908400098527886E0F7030069857D2E4169EE7";
        assert!(validate_wallet(&new_wallet("#000", Some(address), None)).is_err());
        assert!(validate_wallet(&new_wallet("#000", Some(address), Some(Chain::Eth))).is_ok());
        assert!(validate_wallet(&new_wallet("#000", Some("0x123"), Some(Chain::Eth))).is_err());
    }

    #[test]
    fn quantities_and_prices() {
        assert!(validate_quantity(0.0).is_err());
        assert!(validate_quantity(f64::NAN).is_err());
        assert!(validate_quantity(0.5).is_ok());
        assert!(validate_purchase_price(0.0).is_ok());
        assert!(validate_purchase_price(-1.0).is_err());
    }
}
