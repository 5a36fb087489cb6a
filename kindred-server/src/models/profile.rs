use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Dating profile, stored as one JSON document per user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub lifestyle: Lifestyle,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Lifestyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alcohol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smoking: Option<String>,
}
