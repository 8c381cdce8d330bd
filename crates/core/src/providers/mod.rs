pub mod http;
pub mod traits;

// API provider implementations
pub mod coingecko;
pub mod exchange_rate_api;
pub mod moralis;
pub mod push;
