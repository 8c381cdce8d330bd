pub mod cache;
pub mod clock;
pub mod config;
pub mod errors;
pub mod logging;
pub mod models;
pub mod providers;
pub mod services;
pub mod storage;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use uuid::Uuid;

use clock::{Clock, SystemClock};
use config::EngineConfig;
use errors::CoreError;
use models::{
    alert::{AlertRunReport, NewPriceAlert, PriceAlert},
    analytics::{PerformanceHistory, PortfolioValuation, WalletDetails, WalletValuation},
    coin::{CoinDetail, CoinMarketRow},
    favorite::{FavoriteCoin, FavoriteThresholds, FavoriteWithPrice},
    notification::Notification,
    price::PriceSnapshot,
    user::User,
    wallet::{Holding, HoldingUpdate, NewHolding, NewWallet, Wallet},
};
use providers::{
    coingecko::CoinGeckoProvider,
    exchange_rate_api::ExchangeRateApiProvider,
    http::build_client,
    moralis::MoralisProvider,
    push::LogPushGateway,
    traits::{BlockchainDataProvider, ExchangeRateProvider, MarketDataProvider, PushGateway},
};
use services::{
    alert_service::AlertService, currency_service::CurrencyService,
    favorite_service::FavoriteService, notification_service::NotificationService,
    price_service::PriceService, scheduler::AlertScheduler, valuation_service::ValuationService,
    wallet_service::WalletService,
};
use storage::{
    manager::{Snapshot, StorageManager},
    memory::MemoryRepository,
    repository::UserRepository,
};

/// External collaborators the tracker talks to.
pub struct Collaborators {
    pub market_data: Arc<dyn MarketDataProvider>,
    pub exchange_rates: Arc<dyn ExchangeRateProvider>,
    /// `None` disables on-chain data for wallet details.
    pub blockchain: Option<Arc<dyn BlockchainDataProvider>>,
    pub push: Arc<dyn PushGateway>,
    pub clock: Arc<dyn Clock>,
}

impl Collaborators {
    /// HTTP providers at the configured URLs, sharing one client.
    ///
    /// The blockchain provider is only created when an API key is configured.
    pub fn from_config(config: &EngineConfig) -> Result<Self, CoreError> {
        let client = build_client(config.request_timeout(), config.max_redirects)?;
        let urls = &config.providers;

        let blockchain = urls.blockchain_api_key.as_ref().map(|key| {
            Arc::new(MoralisProvider::new(
                client.clone(),
                urls.blockchain_url.clone(),
                key.clone(),
            )) as Arc<dyn BlockchainDataProvider>
        });

        Ok(Self {
            market_data: Arc::new(CoinGeckoProvider::new(
                client.clone(),
                urls.market_data_url.clone(),
            )),
            exchange_rates: Arc::new(ExchangeRateApiProvider::new(
                client,
                urls.exchange_rate_url.clone(),
            )),
            blockchain,
            push: Arc::new(LogPushGateway),
            clock: Arc::new(SystemClock),
        })
    }
}

/// Main entry point for the coinfolio core library.
///
/// Owns the repository, the shared price and exchange-rate caches, and
/// every service built on them. Cheap reads go through `&self`; all state
/// lives behind the services' own locks, so one tracker can serve many
/// concurrent requests.
#[must_use]
pub struct CoinTracker {
    config: EngineConfig,
    clock: Arc<dyn Clock>,
    repository: Arc<MemoryRepository>,
    prices: Arc<PriceService>,
    currency: Arc<CurrencyService>,
    valuation: Arc<ValuationService>,
    wallets: WalletService,
    alerts: Arc<AlertService>,
    notifications: Arc<NotificationService>,
    favorites: FavoriteService,
}

impl std::fmt::Debug for CoinTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoinTracker")
            .field("market_data", &self.prices.provider_name())
            .field("config", &self.config)
            .finish()
    }
}

impl CoinTracker {
    /// A tracker with an empty repository and the configured HTTP providers.
    pub fn new(config: EngineConfig) -> Result<Self, CoreError> {
        Self::from_snapshot(config, Snapshot::default())
    }

    /// A tracker over previously saved data.
    pub fn from_snapshot(config: EngineConfig, snapshot: Snapshot) -> Result<Self, CoreError> {
        config.validate()?;
        let collaborators = Collaborators::from_config(&config)?;
        let repository = Arc::new(MemoryRepository::from_snapshot(snapshot));
        Ok(Self::with_collaborators(config, repository, collaborators))
    }

    /// Load a snapshot file and build a tracker over it.
    pub fn load_from_file<P: AsRef<Path>>(config: EngineConfig, path: P) -> Result<Self, CoreError> {
        let snapshot = StorageManager::load_from_file(path)?;
        Self::from_snapshot(config, snapshot)
    }

    /// Wire everything from explicit parts. Used by tests with mock providers.
    pub fn with_collaborators(
        config: EngineConfig,
        repository: Arc<MemoryRepository>,
        collaborators: Collaborators,
    ) -> Self {
        let Collaborators {
            market_data,
            exchange_rates,
            blockchain,
            push,
            clock,
        } = collaborators;

        let prices = Arc::new(PriceService::new(market_data, clock.clone(), &config));
        let currency = Arc::new(CurrencyService::new(exchange_rates, clock.clone(), &config));
        let valuation = Arc::new(ValuationService::new(prices.clone(), currency.clone()));
        let wallets = WalletService::new(
            repository.clone(),
            valuation.clone(),
            blockchain,
            clock.clone(),
        );
        let notifications = Arc::new(NotificationService::new(
            repository.clone(),
            repository.clone(),
            push,
            clock.clone(),
        ));
        let alerts = Arc::new(AlertService::new(
            repository.clone(),
            repository.clone(),
            prices.clone(),
            notifications.clone(),
            clock.clone(),
        ));
        let favorites = FavoriteService::new(repository.clone(), prices.clone(), clock.clone());

        Self {
            config,
            clock,
            repository,
            prices,
            currency,
            valuation,
            wallets,
            alerts,
            notifications,
            favorites,
        }
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ── Persistence ─────────────────────────────────────────────────

    /// Copy of everything stored.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.repository.snapshot()
    }

    pub fn save_to_bytes(&self) -> Result<Vec<u8>, CoreError> {
        StorageManager::save_to_bytes(&self.snapshot())
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CoreError> {
        StorageManager::save_to_file(&self.snapshot(), path)
    }

    // ── Users ───────────────────────────────────────────────────────

    pub async fn register_user(
        &self,
        name: impl Into<String>,
        email: impl Into<String>,
    ) -> Result<User, CoreError> {
        let name = name.into();
        let email = email.into();
        if name.trim().is_empty() {
            return Err(CoreError::Validation("user name must not be empty".to_string()));
        }
        if !email.contains('@') {
            return Err(CoreError::Validation(format!("invalid email '{email}'")));
        }

        let mut user = User::new(name.trim(), email.trim());
        user.created_at = self.clock.now();
        self.repository.insert_user(user.clone()).await?;
        Ok(user)
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<User, CoreError> {
        self.repository
            .find_user(user_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("User {user_id}")))
    }

    /// Register or clear the device token used for push delivery.
    pub async fn set_push_token(&self, user_id: Uuid, token: Option<String>) -> Result<(), CoreError> {
        if self.repository.set_push_token(user_id, token).await? {
            Ok(())
        } else {
            Err(CoreError::NotFound(format!("User {user_id}")))
        }
    }

    // ── Wallets ─────────────────────────────────────────────────────

    pub async fn create_wallet(&self, user_id: Uuid, input: NewWallet) -> Result<Wallet, CoreError> {
        self.get_user(user_id).await?;
        self.wallets.create_wallet(user_id, input).await
    }

    pub async fn list_wallets(&self, user_id: Uuid) -> Result<Vec<Wallet>, CoreError> {
        self.wallets.list_wallets(user_id).await
    }

    pub async fn get_wallet(&self, user_id: Uuid, wallet_id: Uuid) -> Result<Wallet, CoreError> {
        self.wallets.get_wallet(user_id, wallet_id).await
    }

    pub async fn delete_wallet(&self, user_id: Uuid, wallet_id: Uuid) -> Result<(), CoreError> {
        self.wallets.delete_wallet(user_id, wallet_id).await
    }

    pub async fn add_holding(
        &self,
        user_id: Uuid,
        wallet_id: Uuid,
        input: NewHolding,
    ) -> Result<Holding, CoreError> {
        self.wallets.add_holding(user_id, wallet_id, input).await
    }

    pub async fn update_holding(
        &self,
        user_id: Uuid,
        wallet_id: Uuid,
        holding_id: Uuid,
        update: HoldingUpdate,
    ) -> Result<Holding, CoreError> {
        self.wallets
            .update_holding(user_id, wallet_id, holding_id, update)
            .await
    }

    pub async fn remove_holding(
        &self,
        user_id: Uuid,
        wallet_id: Uuid,
        holding_id: Uuid,
    ) -> Result<(), CoreError> {
        self.wallets
            .remove_holding(user_id, wallet_id, holding_id)
            .await
    }

    // ── Valuation ───────────────────────────────────────────────────

    pub async fn wallet_valuation(
        &self,
        user_id: Uuid,
        wallet_id: Uuid,
        currency: &str,
    ) -> Result<WalletValuation, CoreError> {
        let wallet = self.wallets.get_wallet(user_id, wallet_id).await?;
        self.valuation.value_wallet(&wallet, currency).await
    }

    /// Valuation plus on-chain balances and recent transactions.
    pub async fn wallet_details(
        &self,
        user_id: Uuid,
        wallet_id: Uuid,
        currency: &str,
    ) -> Result<WalletDetails, CoreError> {
        self.wallets
            .get_wallet_details(user_id, wallet_id, currency)
            .await
    }

    /// Every wallet of the user, valued together.
    pub async fn portfolio_overview(
        &self,
        user_id: Uuid,
        currency: &str,
    ) -> Result<PortfolioValuation, CoreError> {
        let wallets = self.wallets.list_wallets(user_id).await?;
        self.valuation.value_portfolio(&wallets, currency).await
    }

    pub async fn performance_history(
        &self,
        user_id: Uuid,
        currency: &str,
    ) -> Result<PerformanceHistory, CoreError> {
        let wallets = self.wallets.list_wallets(user_id).await?;
        self.valuation.performance_history(&wallets, currency).await
    }

    // ── Prices ──────────────────────────────────────────────────────

    pub async fn coin_price(&self, coin_id: &str) -> Result<PriceSnapshot, CoreError> {
        self.prices.get(coin_id).await
    }

    /// Prices for many coins in one upstream call; may be partial.
    pub async fn coin_prices(
        &self,
        coin_ids: &[String],
    ) -> Result<HashMap<String, PriceSnapshot>, CoreError> {
        self.prices.get_batch(coin_ids).await
    }

    pub async fn list_coins(&self, page: u32, per_page: u32) -> Result<Vec<CoinMarketRow>, CoreError> {
        self.prices.list_coins(page, per_page).await
    }

    pub async fn coin_details(&self, coin_id: &str) -> Result<CoinDetail, CoreError> {
        self.prices.coin_details(coin_id).await
    }

    pub async fn convert(&self, amount: f64, from: &str, to: &str) -> Result<f64, CoreError> {
        self.currency.convert(amount, from, to).await
    }

    // ── Alerts ──────────────────────────────────────────────────────

    pub async fn create_alert(
        &self,
        user_id: Uuid,
        input: NewPriceAlert,
    ) -> Result<PriceAlert, CoreError> {
        self.alerts.create_alert(user_id, input).await
    }

    pub async fn list_alerts(&self, user_id: Uuid) -> Result<Vec<PriceAlert>, CoreError> {
        self.alerts.list_alerts(user_id).await
    }

    pub async fn delete_alert(&self, user_id: Uuid, alert_id: Uuid) -> Result<(), CoreError> {
        self.alerts.delete_alert(user_id, alert_id).await
    }

    /// Run one evaluation pass now, outside the schedule.
    pub async fn evaluate_alerts(&self) -> Result<AlertRunReport, CoreError> {
        self.alerts.evaluate_pending().await
    }

    /// Scheduler over this tracker's alerts. Drive it with `run` or `spawn`.
    pub fn alert_scheduler(&self) -> AlertScheduler {
        AlertScheduler::new(self.alerts.clone())
    }

    // ── Favorites ───────────────────────────────────────────────────

    pub async fn add_favorite(&self, user_id: Uuid, coin_id: &str) -> Result<FavoriteCoin, CoreError> {
        self.favorites.add_favorite(user_id, coin_id).await
    }

    pub async fn remove_favorite(&self, user_id: Uuid, coin_id: &str) -> Result<(), CoreError> {
        self.favorites.remove_favorite(user_id, coin_id).await
    }

    pub async fn list_favorites(&self, user_id: Uuid) -> Result<Vec<FavoriteWithPrice>, CoreError> {
        self.favorites.list_favorites(user_id).await
    }

    pub async fn update_favorite_thresholds(
        &self,
        user_id: Uuid,
        coin_id: &str,
        thresholds: FavoriteThresholds,
    ) -> Result<FavoriteCoin, CoreError> {
        self.favorites
            .update_alert_thresholds(user_id, coin_id, thresholds)
            .await
    }

    // ── Notifications ───────────────────────────────────────────────

    pub async fn notifications(&self, user_id: Uuid) -> Result<Vec<Notification>, CoreError> {
        self.notifications.list(user_id).await
    }

    pub async fn mark_notification_read(
        &self,
        user_id: Uuid,
        notification_id: Uuid,
    ) -> Result<(), CoreError> {
        self.notifications
            .mark_as_read(user_id, notification_id)
            .await
    }
}
