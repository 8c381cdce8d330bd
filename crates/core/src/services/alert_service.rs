use std::sync::Arc;

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::notification_service::Notifier;
use super::price_service::PriceService;
use crate::clock::Clock;
use crate::errors::CoreError;
use crate::models::alert::{AlertRunReport, NewPriceAlert, PriceAlert};
use crate::storage::repository::{AlertRepository, UserRepository};

/// Price alerts: CRUD plus the evaluation pass run by the scheduler.
///
/// An alert moves `PENDING → TRIGGERED` exactly once. Triggered alerts are
/// never loaded for evaluation again, whatever the price does afterwards.
pub struct AlertService {
    alerts: Arc<dyn AlertRepository>,
    users: Arc<dyn UserRepository>,
    prices: Arc<PriceService>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
}

impl AlertService {
    pub fn new(
        alerts: Arc<dyn AlertRepository>,
        users: Arc<dyn UserRepository>,
        prices: Arc<PriceService>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            alerts,
            users,
            prices,
            notifier,
            clock,
        }
    }

    pub async fn create_alert(
        &self,
        user_id: Uuid,
        input: NewPriceAlert,
    ) -> Result<PriceAlert, CoreError> {
        let coin_id = input.coin_id.trim();
        if coin_id.is_empty() {
            return Err(CoreError::Validation("coin id must not be empty".to_string()));
        }
        if !input.target_price.is_finite() || input.target_price <= 0.0 {
            return Err(CoreError::Validation(format!(
                "target price must be positive, got {}",
                input.target_price
            )));
        }
        if self.users.find_user(user_id).await?.is_none() {
            return Err(CoreError::NotFound(format!("User {user_id}")));
        }

        let mut alert = PriceAlert::new(user_id, coin_id, input.target_price, input.alert_type);
        alert.created_at = self.clock.now();
        self.alerts.insert_alert(alert.clone()).await?;

        debug!(alert_id = %alert.id, coin_id = %alert.coin_id, "Created price alert");
        Ok(alert)
    }

    /// Newest first.
    pub async fn list_alerts(&self, user_id: Uuid) -> Result<Vec<PriceAlert>, CoreError> {
        let mut alerts = self.alerts.find_alerts(user_id).await?;
        alerts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(alerts)
    }

    pub async fn delete_alert(&self, user_id: Uuid, alert_id: Uuid) -> Result<(), CoreError> {
        if self.alerts.delete_alert(user_id, alert_id).await? {
            Ok(())
        } else {
            Err(CoreError::NotFound(format!("Alert {alert_id}")))
        }
    }

    /// Check every pending alert against the current price.
    ///
    /// Alerts are evaluated independently: one failing price lookup is
    /// counted in `failed` and logged, and the rest still run. Only failing
    /// to load the pending set fails the pass.
    pub async fn evaluate_pending(&self) -> Result<AlertRunReport, CoreError> {
        let pending = self.alerts.find_pending_alerts().await?;
        let mut report = AlertRunReport::default();

        for alert in &pending {
            report.checked += 1;
            match self.evaluate(alert).await {
                Ok(true) => report.triggered += 1,
                Ok(false) => {}
                Err(e) => {
                    report.failed += 1;
                    error!(alert_id = %alert.id, coin_id = %alert.coin_id, error = %e, "Alert evaluation failed");
                }
            }
        }

        Ok(report)
    }

    /// `Ok(true)` when this call triggered the alert.
    async fn evaluate(&self, alert: &PriceAlert) -> Result<bool, CoreError> {
        let price = self.prices.price(&alert.coin_id).await?;
        if !alert.should_trigger(price) {
            return Ok(false);
        }

        // The state change is committed first; a failed notification never
        // rolls it back, and a lost race means someone else already fired it.
        if !self.alerts.mark_triggered(alert.id, self.clock.now()).await? {
            debug!(alert_id = %alert.id, "Alert already triggered elsewhere");
            return Ok(false);
        }
        info!(
            alert_id = %alert.id,
            coin_id = %alert.coin_id,
            alert_type = %alert.alert_type,
            target = alert.target_price,
            price,
            "Price alert triggered"
        );

        if let Err(e) = self.notifier.send_price_alert(alert, price).await {
            warn!(alert_id = %alert.id, error = %e, "Alert notification failed");
        }
        Ok(true)
    }
}
