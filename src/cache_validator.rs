use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Checksummed wrapper for values stored in the customer cache.
///
/// The payload is kept as JSON text next to its SHA-256 digest. A value whose
/// digest no longer matches is treated as absent, which sends the caller back
/// to QBO for a fresh copy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatedCacheEntry {
    /// JSON payload.
    pub data: String,
    /// Hex-encoded SHA-256 of `data`.
    pub checksum: String,
}

impl ValidatedCacheEntry {
    pub fn new(data: String) -> Self {
        let checksum = Self::compute_checksum(&data);
        Self { data, checksum }
    }

    fn compute_checksum(data: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data.as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn is_valid(&self) -> bool {
        Self::compute_checksum(&self.data) == self.checksum
    }

    /// Serializes `value` and wraps it. `None` if `value` is not
    /// representable as JSON.
    pub fn seal<T: Serialize>(value: &T) -> Option<Self> {
        match serde_json::to_string(value) {
            Ok(data) => Some(Self::new(data)),
            Err(e) => {
                tracing::error!("Failed to serialize cache value: {}", e);
                None
            }
        }
    }

    /// Checks the digest and deserializes the payload.
    pub fn open<T: DeserializeOwned>(&self) -> Option<T> {
        if !self.is_valid() {
            tracing::warn!(
                "Cache validation failed: checksum mismatch. Expected: {}, Data length: {}",
                self.checksum,
                self.data.len()
            );
            return None;
        }

        match serde_json::from_str(&self.data) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Cached payload no longer deserializes: {}", e);
                None
            }
        }
    }
}
