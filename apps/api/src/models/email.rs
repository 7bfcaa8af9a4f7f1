use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A generated email kept in the user's history. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct GeneratedEmailRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subject_line: Option<String>,
    #[sqlx(rename = "email_content")]
    pub body: String,
    pub product_service: Option<String>,
    pub target_audience: Option<String>,
    pub tone: Option<String>,
    pub framework: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewGeneratedEmail {
    pub user_id: Uuid,
    pub subject_line: Option<String>,
    pub body: String,
    pub product_service: Option<String>,
    pub target_audience: Option<String>,
    pub tone: Option<String>,
    pub framework: Option<String>,
}
