use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use super::manager::Snapshot;
use super::repository::{
    AlertRepository, FavoriteRepository, NotificationRepository, UserRepository, WalletRepository,
};
use crate::errors::CoreError;
use crate::models::alert::PriceAlert;
use crate::models::favorite::FavoriteCoin;
use crate::models::notification::Notification;
use crate::models::user::User;
use crate::models::wallet::{Holding, Wallet};

/// In-process repository behind a single lock, snapshot-able to JSON via
/// [`StorageManager`](super::manager::StorageManager).
///
/// Vectors keep insertion order; "newest first" listings reverse them.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    data: RwLock<Snapshot>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            data: RwLock::new(snapshot),
        }
    }

    /// A copy of everything currently stored.
    pub fn snapshot(&self) -> Snapshot {
        self.read().clone()
    }

    fn read(&self) -> RwLockReadGuard<'_, Snapshot> {
        self.data.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Snapshot> {
        self.data.write().unwrap_or_else(|e| e.into_inner())
    }

    fn with_wallet<F>(&self, user_id: Uuid, wallet_id: Uuid, f: F) -> bool
    where
        F: FnOnce(&mut Wallet) -> bool,
    {
        let mut data = self.write();
        data.wallets
            .iter_mut()
            .find(|w| w.id == wallet_id && w.user_id == user_id)
            .map(f)
            .unwrap_or(false)
    }
}

#[async_trait]
impl UserRepository for MemoryRepository {
    async fn insert_user(&self, user: User) -> Result<(), CoreError> {
        let mut data = self.write();
        if data.users.iter().any(|u| u.id == user.id) {
            return Err(CoreError::Conflict(format!("User {} already exists", user.id)));
        }
        data.users.push(user);
        Ok(())
    }

    async fn find_user(&self, user_id: Uuid) -> Result<Option<User>, CoreError> {
        Ok(self.read().users.iter().find(|u| u.id == user_id).cloned())
    }

    async fn set_push_token(
        &self,
        user_id: Uuid,
        token: Option<String>,
    ) -> Result<bool, CoreError> {
        let mut data = self.write();
        Ok(match data.users.iter_mut().find(|u| u.id == user_id) {
            Some(user) => {
                user.push_token = token;
                true
            }
            None => false,
        })
    }
}

#[async_trait]
impl WalletRepository for MemoryRepository {
    async fn insert_wallet(&self, wallet: Wallet) -> Result<(), CoreError> {
        self.write().wallets.push(wallet);
        Ok(())
    }

    async fn find_wallets(&self, user_id: Uuid) -> Result<Vec<Wallet>, CoreError> {
        Ok(self
            .read()
            .wallets
            .iter()
            .filter(|w| w.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_wallet(
        &self,
        user_id: Uuid,
        wallet_id: Uuid,
    ) -> Result<Option<Wallet>, CoreError> {
        Ok(self
            .read()
            .wallets
            .iter()
            .find(|w| w.id == wallet_id && w.user_id == user_id)
            .cloned())
    }

    async fn delete_wallet(&self, user_id: Uuid, wallet_id: Uuid) -> Result<bool, CoreError> {
        let mut data = self.write();
        let before = data.wallets.len();
        data.wallets
            .retain(|w| !(w.id == wallet_id && w.user_id == user_id));
        Ok(data.wallets.len() < before)
    }

    async fn insert_holding(
        &self,
        user_id: Uuid,
        wallet_id: Uuid,
        holding: Holding,
    ) -> Result<bool, CoreError> {
        Ok(self.with_wallet(user_id, wallet_id, |wallet| {
            wallet.holdings.push(holding);
            true
        }))
    }

    async fn update_holding(
        &self,
        user_id: Uuid,
        wallet_id: Uuid,
        holding: Holding,
    ) -> Result<bool, CoreError> {
        Ok(self.with_wallet(user_id, wallet_id, |wallet| {
            match wallet.holdings.iter_mut().find(|h| h.id == holding.id) {
                Some(existing) => {
                    *existing = holding;
                    true
                }
                None => false,
            }
        }))
    }

    async fn delete_holding(
        &self,
        user_id: Uuid,
        wallet_id: Uuid,
        holding_id: Uuid,
    ) -> Result<bool, CoreError> {
        Ok(self.with_wallet(user_id, wallet_id, |wallet| {
            let before = wallet.holdings.len();
            wallet.holdings.retain(|h| h.id != holding_id);
            wallet.holdings.len() < before
        }))
    }
}

#[async_trait]
impl AlertRepository for MemoryRepository {
    async fn insert_alert(&self, alert: PriceAlert) -> Result<(), CoreError> {
        self.write().alerts.push(alert);
        Ok(())
    }

    async fn find_alerts(&self, user_id: Uuid) -> Result<Vec<PriceAlert>, CoreError> {
        Ok(self
            .read()
            .alerts
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_pending_alerts(&self) -> Result<Vec<PriceAlert>, CoreError> {
        Ok(self
            .read()
            .alerts
            .iter()
            .filter(|a| a.is_pending())
            .cloned()
            .collect())
    }

    async fn mark_triggered(&self, alert_id: Uuid, at: DateTime<Utc>) -> Result<bool, CoreError> {
        let mut data = self.write();
        Ok(
            match data
                .alerts
                .iter_mut()
                .find(|a| a.id == alert_id && a.is_pending())
            {
                Some(alert) => {
                    alert.triggered = true;
                    alert.triggered_at = Some(at);
                    true
                }
                None => false,
            },
        )
    }

    async fn delete_alert(&self, user_id: Uuid, alert_id: Uuid) -> Result<bool, CoreError> {
        let mut data = self.write();
        let before = data.alerts.len();
        data.alerts
            .retain(|a| !(a.id == alert_id && a.user_id == user_id));
        Ok(data.alerts.len() < before)
    }
}

#[async_trait]
impl FavoriteRepository for MemoryRepository {
    async fn insert_favorite(&self, favorite: FavoriteCoin) -> Result<(), CoreError> {
        let mut data = self.write();
        if data
            .favorites
            .iter()
            .any(|f| f.user_id == favorite.user_id && f.coin_id == favorite.coin_id)
        {
            return Err(CoreError::Conflict(format!(
                "Coin '{}' is already a favorite",
                favorite.coin_id
            )));
        }
        data.favorites.push(favorite);
        Ok(())
    }

    async fn find_favorites(&self, user_id: Uuid) -> Result<Vec<FavoriteCoin>, CoreError> {
        Ok(self
            .read()
            .favorites
            .iter()
            .filter(|f| f.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_favorite(
        &self,
        user_id: Uuid,
        coin_id: &str,
    ) -> Result<Option<FavoriteCoin>, CoreError> {
        Ok(self
            .read()
            .favorites
            .iter()
            .find(|f| f.user_id == user_id && f.coin_id == coin_id)
            .cloned())
    }

    async fn update_favorite(&self, favorite: FavoriteCoin) -> Result<bool, CoreError> {
        let mut data = self.write();
        Ok(
            match data
                .favorites
                .iter_mut()
                .find(|f| f.id == favorite.id && f.user_id == favorite.user_id)
            {
                Some(existing) => {
                    *existing = favorite;
                    true
                }
                None => false,
            },
        )
    }

    async fn delete_favorite(&self, user_id: Uuid, coin_id: &str) -> Result<bool, CoreError> {
        let mut data = self.write();
        let before = data.favorites.len();
        data.favorites
            .retain(|f| !(f.user_id == user_id && f.coin_id == coin_id));
        Ok(data.favorites.len() < before)
    }
}

#[async_trait]
impl NotificationRepository for MemoryRepository {
    async fn insert_notification(&self, notification: Notification) -> Result<(), CoreError> {
        self.write().notifications.push(notification);
        Ok(())
    }

    async fn find_notifications(&self, user_id: Uuid) -> Result<Vec<Notification>, CoreError> {
        Ok(self
            .read()
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn mark_read(&self, user_id: Uuid, notification_id: Uuid) -> Result<bool, CoreError> {
        let mut data = self.write();
        Ok(
            match data
                .notifications
                .iter_mut()
                .find(|n| n.id == notification_id && n.user_id == user_id)
            {
                Some(notification) => {
                    notification.read = true;
                    true
                }
                None => false,
            },
        )
    }

    async fn mark_pushed(&self, notification_id: Uuid) -> Result<bool, CoreError> {
        let mut data = self.write();
        Ok(
            match data
                .notifications
                .iter_mut()
                .find(|n| n.id == notification_id)
            {
                Some(notification) => {
                    notification.pushed = true;
                    true
                }
                None => false,
            },
        )
    }
}
