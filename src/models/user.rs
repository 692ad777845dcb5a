use crate::models::SortKey;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A forum user record.
///
/// The external id is assigned by the enclosing platform; this service never
/// mints user identifiers of its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Identifier assigned by the enclosing platform
    pub external_id: String,

    /// Display name
    pub username: String,

    /// Preferred sort key for thread listings
    pub default_sort_key: SortKey,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user record
    pub fn new(external_id: String, username: String) -> Self {
        let now = Utc::now();

        Self {
            external_id,
            username,
            default_sort_key: SortKey::default(),
            created_at: now,
            updated_at: now,
        }
    }
}
