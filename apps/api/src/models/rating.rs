use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingValue {
    Useful,
    NeedsWork,
}

impl RatingValue {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Useful => "useful",
            Self::NeedsWork => "needs_work",
        }
    }
}

/// Feedback on one displayed email variant. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingInput {
    pub email_content: String,
    pub framework: String,
    pub tone: String,
    pub product_service: String,
    pub target_audience: String,
    #[serde(default)]
    pub custom_hook: Option<String>,
    pub rating: RatingValue,
}

#[derive(Debug, Clone)]
pub struct NewRating {
    pub user_id: Uuid,
    pub input: RatingInput,
}
