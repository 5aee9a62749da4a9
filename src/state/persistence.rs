//! # Storage contract for committed state.
//!
//! [`StoragePersistence`] is what [`StateManager`](crate::state::StateManager) writes
//! committed values to and reads them back from.
//!
//! ## Contract
//! - `store` never fails from the caller's point of view: an unavailable medium is logged.
//! - `retrieve` returns `None` for "absent", "unreadable", and "undecodable" alike.
//! - Serialization is the backend's business; the built-in backends use JSON.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StorageError;

/// Key/value medium for committed state.
#[async_trait]
pub trait StoragePersistence: Send + Sync + 'static {
    /// Stores `value` under `key`, replacing any previous value.
    async fn store<T>(&self, key: &str, value: &T)
    where
        T: Serialize + Sync;

    /// Retrieves the value stored under `key`, if any can be read.
    async fn retrieve<T>(&self, key: &str) -> Option<T>
    where
        T: DeserializeOwned + Send;

    /// Human-readable backend name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// JSON encoding shared by the built-in backends.
pub(crate) fn encode<T: Serialize + ?Sized>(value: &T) -> Result<String, StorageError> {
    Ok(serde_json::to_string(value)?)
}

/// JSON decoding shared by the built-in backends.
pub(crate) fn decode<T: DeserializeOwned>(data: &str) -> Result<T, StorageError> {
    Ok(serde_json::from_str(data)?)
}

/// Logs a swallowed backend failure.
pub(crate) fn report(backend: &'static str, op: &'static str, key: &str, err: &StorageError) {
    tracing::warn!(
        backend,
        op,
        key,
        label = err.as_label(),
        error = %err,
        "storage operation failed"
    );
}
