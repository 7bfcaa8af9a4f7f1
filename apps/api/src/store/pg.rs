//! PostgreSQL adapter for every persistence port.
//!
//! Usage metering goes through the database's stored procedures
//! (`get_user_monthly_usage`, `increment_user_usage`, `setup_test_user`);
//! their bodies are owned by the hosted backend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::analysis::analyzer::AnalysisResult;
use crate::billing::subscription::Subscription;
use crate::billing::tier::Tier;
use crate::errors::AppError;
use crate::models::email::{GeneratedEmailRow, NewGeneratedEmail};
use crate::models::rating::NewRating;
use crate::store::{AnalysisStore, EmailStore, RatingStore, SubscriptionStore, UsageStore};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct SubscriberRow {
    subscribed: Option<bool>,
    subscription_tier: Option<String>,
    subscription_end: Option<DateTime<Utc>>,
}

#[async_trait]
impl UsageStore for PgStore {
    async fn monthly_usage(&self, user_id: Uuid) -> Result<i64, AppError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COALESCE(get_user_monthly_usage($1), 0)::BIGINT")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    async fn increment(&self, user_id: Uuid) -> Result<i64, AppError> {
        sqlx::query("SELECT increment_user_usage($1)")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        self.monthly_usage(user_id).await
    }
}

#[async_trait]
impl SubscriptionStore for PgStore {
    async fn subscription(&self, user_id: Uuid) -> Result<Option<Subscription>, AppError> {
        let row: Option<SubscriberRow> = sqlx::query_as(
            "SELECT subscribed, subscription_tier, subscription_end FROM subscribers WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| {
            Subscription::from_row(
                r.subscribed.unwrap_or(false),
                r.subscription_tier.as_deref(),
                r.subscription_end,
            )
        }))
    }

    async fn setup_test_user(&self, email: &str, tier: Tier) -> Result<(), AppError> {
        sqlx::query("SELECT setup_test_user($1, $2)")
            .bind(email)
            .bind(tier.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl EmailStore for PgStore {
    async fn insert(&self, email: NewGeneratedEmail) -> Result<GeneratedEmailRow, AppError> {
        let row = sqlx::query_as::<_, GeneratedEmailRow>(
            r#"
            INSERT INTO generated_emails
                (user_id, subject_line, email_content, product_service,
                 target_audience, tone, framework)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, user_id, subject_line, email_content, product_service,
                      target_audience, tone, framework, created_at
            "#,
        )
        .bind(email.user_id)
        .bind(email.subject_line)
        .bind(email.body)
        .bind(email.product_service)
        .bind(email.target_audience)
        .bind(email.tone)
        .bind(email.framework)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn recent(&self, user_id: Uuid, limit: i64) -> Result<Vec<GeneratedEmailRow>, AppError> {
        let rows = sqlx::query_as::<_, GeneratedEmailRow>(
            r#"
            SELECT id, user_id, subject_line, email_content, product_service,
                   target_audience, tone, framework, created_at
            FROM generated_emails
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM generated_emails WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl RatingStore for PgStore {
    async fn insert(&self, rating: NewRating) -> Result<(), AppError> {
        let input = rating.input;
        sqlx::query(
            r#"
            INSERT INTO email_ratings
                (user_id, email_content, framework, tone, product_service,
                 target_audience, custom_hook, rating)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(rating.user_id)
        .bind(input.email_content)
        .bind(input.framework)
        .bind(input.tone)
        .bind(input.product_service)
        .bind(input.target_audience)
        .bind(input.custom_hook.filter(|h| !h.trim().is_empty()))
        .bind(input.rating.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl AnalysisStore for PgStore {
    async fn insert(
        &self,
        user_id: Uuid,
        email_content: &str,
        email_type: &str,
        analysis: &AnalysisResult,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO email_analysis
                (user_id, email_content, email_type, overall_score, tone_score,
                 structure_score, clarity_score, spam_score, suggestions,
                 strengths, red_flags)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(user_id)
        .bind(email_content)
        .bind(email_type)
        .bind(analysis.overall_score)
        .bind(analysis.tone_score)
        .bind(analysis.structure_score)
        .bind(analysis.clarity_score)
        .bind(analysis.spam_score)
        .bind(json!(analysis.suggestions))
        .bind(json!(analysis.strengths))
        .bind(json!(analysis.red_flags))
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
