pub mod alert;
pub mod analytics;
pub mod chain;
pub mod coin;
pub mod favorite;
pub mod notification;
pub mod price;
pub mod user;
pub mod wallet;
