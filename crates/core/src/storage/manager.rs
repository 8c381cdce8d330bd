use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::CoreError;
use crate::models::alert::PriceAlert;
use crate::models::favorite::FavoriteCoin;
use crate::models::notification::Notification;
use crate::models::user::User;
use crate::models::wallet::Wallet;

/// Current snapshot format version.
pub const CURRENT_VERSION: u16 = 1;

/// Everything the repository stores, in one serializable value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u16,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub wallets: Vec<Wallet>,
    #[serde(default)]
    pub alerts: Vec<PriceAlert>,
    #[serde(default)]
    pub favorites: Vec<FavoriteCoin>,
    #[serde(default)]
    pub notifications: Vec<Notification>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            users: Vec::new(),
            wallets: Vec::new(),
            alerts: Vec::new(),
            favorites: Vec::new(),
            notifications: Vec::new(),
        }
    }
}

/// Save/load repository snapshots to/from JSON bytes or files.
pub struct StorageManager;

impl StorageManager {
    /// Snapshot → pretty-printed JSON bytes.
    pub fn save_to_bytes(snapshot: &Snapshot) -> Result<Vec<u8>, CoreError> {
        serde_json::to_vec_pretty(snapshot)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize snapshot: {e}")))
    }

    /// JSON bytes → snapshot. Rejects versions newer than this build understands.
    pub fn load_from_bytes(data: &[u8]) -> Result<Snapshot, CoreError> {
        let snapshot: Snapshot = serde_json::from_slice(data)
            .map_err(|e| CoreError::Deserialization(format!("Failed to parse snapshot: {e}")))?;

        if snapshot.version == 0 || snapshot.version > CURRENT_VERSION {
            return Err(CoreError::Deserialization(format!(
                "Unsupported snapshot version {} (expected at most {CURRENT_VERSION})",
                snapshot.version
            )));
        }
        Ok(snapshot)
    }

    pub fn save_to_file<P: AsRef<Path>>(snapshot: &Snapshot, path: P) -> Result<(), CoreError> {
        let bytes = Self::save_to_bytes(snapshot)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Snapshot, CoreError> {
        let bytes = std::fs::read(path)?;
        Self::load_from_bytes(&bytes)
    }
}
