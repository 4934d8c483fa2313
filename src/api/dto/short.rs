//! DTOs for the create and delete endpoints.

use serde::{Deserialize, Serialize};

use crate::domain::entities::ShortRecord;

/// Body of `POST /create`.
#[derive(Debug, Deserialize)]
pub struct CreateRequest {
    #[serde(rename = "Short")]
    pub short: String,
    #[serde(rename = "Long")]
    pub long: String,
}

/// Body of `POST /delete`.
#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    #[serde(rename = "Short")]
    pub short: String,
}

/// A stored alias as returned by `POST /create`.
#[derive(Debug, Serialize)]
pub struct ShortResponse {
    #[serde(rename = "Short")]
    pub short: String,
    #[serde(rename = "Long")]
    pub long: String,
    #[serde(rename = "Owner")]
    pub owner: u64,
}

impl From<ShortRecord> for ShortResponse {
    fn from(record: ShortRecord) -> Self {
        Self {
            short: record.short,
            long: record.long,
            owner: record.owner,
        }
    }
}
