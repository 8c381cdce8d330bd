use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::CoreError;
use crate::models::alert::PriceAlert;
use crate::models::favorite::FavoriteCoin;
use crate::models::notification::Notification;
use crate::models::user::User;
use crate::models::wallet::{Holding, Wallet};

// Every query that reads or changes user data takes the owning user's id.
// A record owned by someone else is indistinguishable from a missing one.

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert_user(&self, user: User) -> Result<(), CoreError>;

    async fn find_user(&self, user_id: Uuid) -> Result<Option<User>, CoreError>;

    async fn set_push_token(&self, user_id: Uuid, token: Option<String>)
        -> Result<bool, CoreError>;
}

#[async_trait]
pub trait WalletRepository: Send + Sync {
    async fn insert_wallet(&self, wallet: Wallet) -> Result<(), CoreError>;

    /// Wallets in creation order.
    async fn find_wallets(&self, user_id: Uuid) -> Result<Vec<Wallet>, CoreError>;

    async fn find_wallet(&self, user_id: Uuid, wallet_id: Uuid)
        -> Result<Option<Wallet>, CoreError>;

    /// Deletes the wallet and its holdings. `false` if there was nothing to delete.
    async fn delete_wallet(&self, user_id: Uuid, wallet_id: Uuid) -> Result<bool, CoreError>;

    /// `false` if the wallet does not exist.
    async fn insert_holding(
        &self,
        user_id: Uuid,
        wallet_id: Uuid,
        holding: Holding,
    ) -> Result<bool, CoreError>;

    /// Replaces the holding with the same id. `false` if it does not exist.
    async fn update_holding(
        &self,
        user_id: Uuid,
        wallet_id: Uuid,
        holding: Holding,
    ) -> Result<bool, CoreError>;

    async fn delete_holding(
        &self,
        user_id: Uuid,
        wallet_id: Uuid,
        holding_id: Uuid,
    ) -> Result<bool, CoreError>;
}

#[async_trait]
pub trait AlertRepository: Send + Sync {
    async fn insert_alert(&self, alert: PriceAlert) -> Result<(), CoreError>;

    async fn find_alerts(&self, user_id: Uuid) -> Result<Vec<PriceAlert>, CoreError>;

    /// Every untriggered alert, across all users.
    async fn find_pending_alerts(&self) -> Result<Vec<PriceAlert>, CoreError>;

    /// Moves a pending alert to triggered.
    ///
    /// Returns `false` if the alert is gone or was already triggered, so a
    /// second caller never fires it again.
    async fn mark_triggered(&self, alert_id: Uuid, at: DateTime<Utc>) -> Result<bool, CoreError>;

    async fn delete_alert(&self, user_id: Uuid, alert_id: Uuid) -> Result<bool, CoreError>;
}

#[async_trait]
pub trait FavoriteRepository: Send + Sync {
    async fn insert_favorite(&self, favorite: FavoriteCoin) -> Result<(), CoreError>;

    async fn find_favorites(&self, user_id: Uuid) -> Result<Vec<FavoriteCoin>, CoreError>;

    async fn find_favorite(
        &self,
        user_id: Uuid,
        coin_id: &str,
    ) -> Result<Option<FavoriteCoin>, CoreError>;

    async fn update_favorite(&self, favorite: FavoriteCoin) -> Result<bool, CoreError>;

    async fn delete_favorite(&self, user_id: Uuid, coin_id: &str) -> Result<bool, CoreError>;
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn insert_notification(&self, notification: Notification) -> Result<(), CoreError>;

    async fn find_notifications(&self, user_id: Uuid) -> Result<Vec<Notification>, CoreError>;

    async fn mark_read(&self, user_id: Uuid, notification_id: Uuid) -> Result<bool, CoreError>;

    async fn mark_pushed(&self, notification_id: Uuid) -> Result<bool, CoreError>;
}
