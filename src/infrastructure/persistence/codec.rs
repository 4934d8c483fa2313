//! Value encoding for backends that store opaque bytes.

use serde::{Serialize, de::DeserializeOwned};

use crate::error::{StoreError, StoreResult};

pub(crate) fn encode<T: Serialize>(value: &T) -> StoreResult<Vec<u8>> {
    serde_json::to_vec(value).map_err(StoreError::backend)
}

/// Decodes a stored value. Undecodable bytes are reported as
/// [`StoreError::Corrupt`] and never handed to callers.
pub(crate) fn decode<T: DeserializeOwned>(key: &str, bytes: &[u8]) -> StoreResult<T> {
    serde_json::from_slice(bytes).map_err(|e| StoreError::corrupt(key, e))
}

/// Column stores have no unsigned 64-bit type; ids are stored bit-cast.
pub(crate) fn id_to_column(id: u64) -> i64 {
    id as i64
}

pub(crate) fn id_from_column(value: i64) -> u64 {
    value as u64
}
