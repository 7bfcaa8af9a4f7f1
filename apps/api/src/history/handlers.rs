use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use tracing::info;
use uuid::Uuid;

use crate::auth::Authenticated;
use crate::errors::AppError;
use crate::extract::{AppJson, AppPath};
use crate::models::email::GeneratedEmailRow;
use crate::models::rating::{NewRating, RatingInput};
use crate::state::AppState;

/// How many records the history view shows.
const HISTORY_LIMIT: i64 = 20;

/// GET /api/v1/emails
pub async fn handle_list_emails(
    State(state): State<AppState>,
    caller: Authenticated,
) -> Result<Json<Vec<GeneratedEmailRow>>, AppError> {
    let emails = state.emails.recent(caller.user.id, HISTORY_LIMIT).await?;
    Ok(Json(emails))
}

/// DELETE /api/v1/emails/:id
///
/// Only the owner can delete a record; anyone else gets a 404.
pub async fn handle_delete_email(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    caller: Authenticated,
) -> Result<StatusCode, AppError> {
    if !state.emails.delete(caller.user.id, id).await? {
        return Err(AppError::NotFound(format!("Email {id} not found")));
    }
    info!(user_id = %caller.user.id, email_id = %id, "Deleted generated email");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/ratings
pub async fn handle_rate_email(
    State(state): State<AppState>,
    caller: Authenticated,
    AppJson(input): AppJson<RatingInput>,
) -> Result<StatusCode, AppError> {
    if input.email_content.trim().is_empty() {
        return Err(AppError::Validation(
            "email_content cannot be empty".to_string(),
        ));
    }

    info!(
        user_id = %caller.user.id,
        framework = %input.framework,
        rating = input.rating.as_str(),
        "Recording email rating"
    );
    state
        .ratings
        .insert(NewRating {
            user_id: caller.user.id,
            input,
        })
        .await?;
    Ok(StatusCode::CREATED)
}
