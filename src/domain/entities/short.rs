//! Short alias record: the mapping stored by every backend.

use serde::{Deserialize, Serialize};

/// A short alias pointing at a long URL, owned by one user.
///
/// At most one record exists per `short`. Only the owner may overwrite or
/// delete it. The serialized field names are part of the on-disk format of
/// the embedded store and must not change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortRecord {
    #[serde(rename = "Short")]
    pub short: String,
    #[serde(rename = "Long")]
    pub long: String,
    #[serde(rename = "Owner")]
    pub owner: u64,
}

impl ShortRecord {
    /// Creates a new ShortRecord instance.
    pub fn new(short: impl Into<String>, long: impl Into<String>, owner: u64) -> Self {
        Self {
            short: short.into(),
            long: long.into(),
            owner,
        }
    }

    /// Returns true if `owner` may mutate this record.
    pub fn is_owned_by(&self, owner: u64) -> bool {
        self.owner == owner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_record_creation() {
        let record = ShortRecord::new("miserable", "pigeon", 7);

        assert_eq!(record.short, "miserable");
        assert_eq!(record.long, "pigeon");
        assert_eq!(record.owner, 7);
        assert!(record.is_owned_by(7));
        assert!(!record.is_owned_by(8));
    }

    #[test]
    fn test_short_record_wire_names() {
        let record = ShortRecord::new("a", "http://b", 3);
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["Short"], "a");
        assert_eq!(json["Long"], "http://b");
        assert_eq!(json["Owner"], 3);

        let back: ShortRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}
