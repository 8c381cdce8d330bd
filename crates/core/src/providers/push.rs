use async_trait::async_trait;
use tracing::info;

use super::traits::PushGateway;
use crate::errors::CoreError;

/// Push gateway that only records deliveries in the log.
///
/// Real device delivery lives outside this library; plug it in through
/// `PushGateway`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogPushGateway;

#[async_trait]
impl PushGateway for LogPushGateway {
    async fn push(&self, token: &str, title: &str, body: &str) -> Result<(), CoreError> {
        let suffix = token.len().saturating_sub(6);
        info!(
            token = %format!("…{}", token.get(suffix..).unwrap_or_default()),
            title,
            body,
            "Push notification"
        );
        Ok(())
    }
}
