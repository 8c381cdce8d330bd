use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use super::price_service::PriceService;
use crate::clock::Clock;
use crate::errors::CoreError;
use crate::models::favorite::{FavoriteCoin, FavoriteThresholds, FavoriteWithPrice};
use crate::storage::repository::FavoriteRepository;

/// Coins a user watches, listed with their current prices.
pub struct FavoriteService {
    favorites: Arc<dyn FavoriteRepository>,
    prices: Arc<PriceService>,
    clock: Arc<dyn Clock>,
}

impl FavoriteService {
    pub fn new(
        favorites: Arc<dyn FavoriteRepository>,
        prices: Arc<PriceService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            favorites,
            prices,
            clock,
        }
    }

    /// Add a coin. Duplicates are a `Conflict`; the coin must resolve to a price.
    pub async fn add_favorite(
        &self,
        user_id: Uuid,
        coin_id: &str,
    ) -> Result<FavoriteCoin, CoreError> {
        let coin_id = coin_id.trim().to_lowercase();
        if coin_id.is_empty() {
            return Err(CoreError::Validation("coin id must not be empty".to_string()));
        }
        if self.favorites.find_favorite(user_id, &coin_id).await?.is_some() {
            return Err(CoreError::Conflict(format!(
                "Coin '{coin_id}' is already a favorite"
            )));
        }

        // Unknown coins surface as NotFound from the price lookup
        self.prices.price(&coin_id).await?;

        let favorite = FavoriteCoin {
            id: Uuid::new_v4(),
            user_id,
            coin_id,
            alert_on_price_increase: None,
            alert_on_price_decrease: None,
            created_at: self.clock.now(),
        };
        self.favorites.insert_favorite(favorite.clone()).await?;
        Ok(favorite)
    }

    pub async fn remove_favorite(&self, user_id: Uuid, coin_id: &str) -> Result<(), CoreError> {
        let coin_id = coin_id.trim().to_lowercase();
        if self.favorites.delete_favorite(user_id, &coin_id).await? {
            Ok(())
        } else {
            Err(CoreError::NotFound(format!("Favorite coin '{coin_id}'")))
        }
    }

    /// Newest first, priced with one batch lookup.
    ///
    /// A failed lookup leaves prices empty instead of failing the listing.
    pub async fn list_favorites(&self, user_id: Uuid) -> Result<Vec<FavoriteWithPrice>, CoreError> {
        let mut favorites = self.favorites.find_favorites(user_id).await?;
        favorites.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if favorites.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<String> = favorites.iter().map(|f| f.coin_id.clone()).collect();
        let prices = match self.prices.get_batch(&ids).await {
            Ok(prices) => prices,
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Could not price favorites");
                Default::default()
            }
        };

        Ok(favorites
            .into_iter()
            .map(|favorite| {
                let current_price = prices.get(&favorite.coin_id).map(|s| s.current_price);
                FavoriteWithPrice {
                    favorite,
                    current_price,
                }
            })
            .collect())
    }

    /// Set the percentage-move thresholds. `None` clears a threshold.
    pub async fn update_alert_thresholds(
        &self,
        user_id: Uuid,
        coin_id: &str,
        thresholds: FavoriteThresholds,
    ) -> Result<FavoriteCoin, CoreError> {
        for value in [
            thresholds.alert_on_price_increase,
            thresholds.alert_on_price_decrease,
        ]
        .into_iter()
        .flatten()
        {
            if !value.is_finite() || value <= 0.0 {
                return Err(CoreError::Validation(format!(
                    "thresholds must be positive percentages, got {value}"
                )));
            }
        }

        let coin_id = coin_id.trim().to_lowercase();
        let mut favorite = self
            .favorites
            .find_favorite(user_id, &coin_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Favorite coin '{coin_id}'")))?;

        favorite.alert_on_price_increase = thresholds.alert_on_price_increase;
        favorite.alert_on_price_decrease = thresholds.alert_on_price_decrease;
        if !self.favorites.update_favorite(favorite.clone()).await? {
            return Err(CoreError::NotFound(format!("Favorite coin '{coin_id}'")));
        }
        Ok(favorite)
    }
}
