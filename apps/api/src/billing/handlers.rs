//! Axum route handlers for usage, subscription and billing redirects.

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::Authenticated;
use crate::billing::subscription::{Plan, RedirectUrl, Subscription};
use crate::billing::test_mode::{TestModeOverride, TestModeQuery};
use crate::billing::tier::{limit_for, Tier};
use crate::errors::AppError;
use crate::extract::{AppJson, AppQuery};
use crate::generation::gate::EntitlementGate;
use crate::models::usage::UserUsage;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub plan: Plan,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestUserRequest {
    pub email: String,
    pub tier: Tier,
}

/// GET /api/v1/usage
pub async fn handle_usage(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<TestModeQuery>,
    caller: Authenticated,
) -> Result<Json<UserUsage>, AppError> {
    let test_mode = state.test_mode(&query);
    let tier = EntitlementGate::from_state(&state)
        .resolve_tier(caller.user.id, test_mode)
        .await?;
    let current = state.usage.monthly_usage(caller.user.id).await?;

    Ok(Json(UserUsage {
        current,
        limit: limit_for(tier),
        tier,
    }))
}

/// GET /api/v1/subscription
pub async fn handle_subscription(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<TestModeQuery>,
    caller: Authenticated,
) -> Result<Json<Subscription>, AppError> {
    let test_mode = state.test_mode(&query);
    let real = if test_mode.is_active() {
        None
    } else {
        state.subscriptions.subscription(caller.user.id).await?
    };
    Ok(Json(Subscription::visible(real, test_mode)))
}

/// Checkout and portal refuse to run whenever the request asks for test mode,
/// whether or not the deployment would honour it.
fn refuse_under_test_mode(query: &TestModeQuery) -> Result<(), AppError> {
    match TestModeOverride::from_query(query).tier() {
        Some(tier) => Err(AppError::TestModeActive { tier }),
        None => Ok(()),
    }
}

/// POST /api/v1/billing/checkout
pub async fn handle_checkout(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<TestModeQuery>,
    caller: Authenticated,
    AppJson(request): AppJson<CheckoutRequest>,
) -> Result<Json<RedirectUrl>, AppError> {
    refuse_under_test_mode(&query)?;
    info!(user_id = %caller.user.id, plan = request.plan.as_str(), "Creating checkout session");
    let redirect = state
        .billing
        .create_checkout(&caller.token, request.plan)
        .await?;
    Ok(Json(redirect))
}

/// POST /api/v1/billing/portal
pub async fn handle_portal(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<TestModeQuery>,
    caller: Authenticated,
) -> Result<Json<RedirectUrl>, AppError> {
    refuse_under_test_mode(&query)?;
    info!(user_id = %caller.user.id, "Opening customer portal");
    let redirect = state.billing.customer_portal(&caller.token).await?;
    Ok(Json(redirect))
}

/// POST /api/v1/admin/test-users
///
/// Seeds a QA account's subscription. Only reachable where test mode is allowed.
pub async fn handle_setup_test_user(
    State(state): State<AppState>,
    caller: Authenticated,
    AppJson(request): AppJson<TestUserRequest>,
) -> Result<StatusCode, AppError> {
    if !state.config.allow_test_mode {
        return Err(AppError::TestModeDisabled);
    }
    if request.email.trim().is_empty() {
        return Err(AppError::Validation("email cannot be empty".to_string()));
    }

    info!(
        requested_by = %caller.user.id,
        tier = %request.tier,
        "Configuring test user"
    );
    state
        .subscriptions
        .setup_test_user(request.email.trim(), request.tier)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
