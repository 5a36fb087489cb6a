use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Personality assessment outcome. The archetype code drives compatibility
/// scoring; trait scores are carried for display only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalityResult {
    pub archetype: String,
    #[serde(default)]
    pub trait_scores: HashMap<String, i32>,
    pub completed_at: DateTime<Utc>,
}
