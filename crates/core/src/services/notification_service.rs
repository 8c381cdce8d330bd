use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::errors::CoreError;
use crate::models::alert::PriceAlert;
use crate::models::notification::{Notification, NotificationMetadata, NotificationType};
use crate::providers::traits::PushGateway;
use crate::storage::repository::{NotificationRepository, UserRepository};

/// Where alert evaluation sends its events.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(
        &self,
        user_id: Uuid,
        title: &str,
        body: &str,
        kind: NotificationType,
        metadata: NotificationMetadata,
    ) -> Result<Notification, CoreError>;

    /// Notify the owner of `alert` that it fired at `current_price`.
    async fn send_price_alert(
        &self,
        alert: &PriceAlert,
        current_price: f64,
    ) -> Result<Notification, CoreError> {
        let (title, body) = price_alert_message(alert, current_price);
        let metadata = NotificationMetadata {
            coin_id: Some(alert.coin_id.clone()),
            current_price: Some(current_price),
            target_price: Some(alert.target_price),
            ..Default::default()
        };
        self.send(
            alert.user_id,
            &title,
            &body,
            NotificationType::PriceAlert,
            metadata,
        )
        .await
    }
}

/// Stores notifications and pushes them to the user's device.
///
/// Storing is the notification; the push is best-effort and only attempted
/// when the user registered a push token. `pushed` records whether it went out.
pub struct NotificationService {
    notifications: Arc<dyn NotificationRepository>,
    users: Arc<dyn UserRepository>,
    push: Arc<dyn PushGateway>,
    clock: Arc<dyn Clock>,
}

impl NotificationService {
    pub fn new(
        notifications: Arc<dyn NotificationRepository>,
        users: Arc<dyn UserRepository>,
        push: Arc<dyn PushGateway>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            notifications,
            users,
            push,
            clock,
        }
    }

    /// Newest first.
    pub async fn list(&self, user_id: Uuid) -> Result<Vec<Notification>, CoreError> {
        let mut notifications = self.notifications.find_notifications(user_id).await?;
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notifications)
    }

    pub async fn mark_as_read(&self, user_id: Uuid, notification_id: Uuid) -> Result<(), CoreError> {
        if self.notifications.mark_read(user_id, notification_id).await? {
            Ok(())
        } else {
            Err(CoreError::NotFound(format!("Notification {notification_id}")))
        }
    }
}

#[async_trait]
impl Notifier for NotificationService {
    async fn send(
        &self,
        user_id: Uuid,
        title: &str,
        body: &str,
        kind: NotificationType,
        metadata: NotificationMetadata,
    ) -> Result<Notification, CoreError> {
        let user = self
            .users
            .find_user(user_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("User {user_id}")))?;

        let mut notification = Notification {
            id: Uuid::new_v4(),
            user_id,
            title: title.to_string(),
            body: body.to_string(),
            kind,
            metadata,
            read: false,
            pushed: false,
            created_at: self.clock.now(),
        };
        self.notifications
            .insert_notification(notification.clone())
            .await?;

        let Some(token) = user.push_token.as_deref() else {
            debug!(user_id = %user_id, "No push token, notification stored only");
            return Ok(notification);
        };

        match self.push.push(token, title, body).await {
            Ok(()) => {
                self.notifications.mark_pushed(notification.id).await?;
                notification.pushed = true;
            }
            Err(e) => warn!(user_id = %user_id, error = %e, "Push delivery failed"),
        }
        Ok(notification)
    }
}

/// Title and body for a fired price alert.
pub fn price_alert_message(alert: &PriceAlert, current_price: f64) -> (String, String) {
    let title = "Price Alert".to_string();
    let body = format!(
        "{} has reached ${current_price} (Target: ${})",
        alert.coin_id.to_uppercase(),
        alert.target_price
    );
    (title, body)
}
