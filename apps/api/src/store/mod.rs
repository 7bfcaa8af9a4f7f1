//! Persistence ports.
//!
//! The hosted database is the source of truth for every record here. Handlers
//! only ever see these traits through `AppState`; `PgStore` is the production
//! adapter.

use async_trait::async_trait;
use uuid::Uuid;

use crate::analysis::analyzer::AnalysisResult;
use crate::billing::subscription::Subscription;
use crate::billing::tier::Tier;
use crate::errors::AppError;
use crate::models::email::{GeneratedEmailRow, NewGeneratedEmail};
use crate::models::rating::NewRating;

pub mod pg;

pub use pg::PgStore;

/// Monthly generation counter.
///
/// The counter only ever moves through `increment`, a single atomic
/// server-side operation. Nothing reads, adds and writes it back.
#[async_trait]
pub trait UsageStore: Send + Sync {
    /// Generations recorded for the user in the current calendar month.
    async fn monthly_usage(&self, user_id: Uuid) -> Result<i64, AppError>;

    /// Adds exactly one generation and returns the post-increment count.
    async fn increment(&self, user_id: Uuid) -> Result<i64, AppError>;
}

#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// `None` when the user has no subscriber row.
    async fn subscription(&self, user_id: Uuid) -> Result<Option<Subscription>, AppError>;

    /// Seeds a QA account with the given tier.
    async fn setup_test_user(&self, email: &str, tier: Tier) -> Result<(), AppError>;
}

#[async_trait]
pub trait EmailStore: Send + Sync {
    async fn insert(&self, email: NewGeneratedEmail) -> Result<GeneratedEmailRow, AppError>;

    /// Newest first.
    async fn recent(&self, user_id: Uuid, limit: i64) -> Result<Vec<GeneratedEmailRow>, AppError>;

    /// Deletes a record owned by `user_id`. Returns false when nothing matched.
    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool, AppError>;
}

#[async_trait]
pub trait RatingStore: Send + Sync {
    async fn insert(&self, rating: NewRating) -> Result<(), AppError>;
}

#[async_trait]
pub trait AnalysisStore: Send + Sync {
    async fn insert(
        &self,
        user_id: Uuid,
        email_content: &str,
        email_type: &str,
        analysis: &AnalysisResult,
    ) -> Result<(), AppError>;
}
