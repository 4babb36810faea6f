use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Email address on file for a user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserContact {
    pub user_id: String,
    pub email: String,
    pub updated_at: DateTime<Utc>,
}
