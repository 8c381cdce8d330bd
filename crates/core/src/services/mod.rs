pub mod alert_service;
pub mod currency_service;
pub mod favorite_service;
pub mod notification_service;
pub mod price_service;
pub mod rate_limiter;
pub mod scheduler;
pub mod valuation_service;
pub mod wallet_service;
