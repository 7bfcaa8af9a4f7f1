pub mod health;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::analysis::handlers as analysis;
use crate::billing::handlers as billing;
use crate::generation::handlers as generation;
use crate::history::handlers as history;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Generation
        .route("/api/v1/emails/generate", post(generation::handle_generate))
        .route(
            "/api/v1/emails/generate-dual",
            post(generation::handle_generate_dual),
        )
        .route("/api/v1/emails/analyze", post(analysis::handle_analyze))
        // History & feedback
        .route("/api/v1/emails", get(history::handle_list_emails))
        .route("/api/v1/emails/:id", delete(history::handle_delete_email))
        .route("/api/v1/ratings", post(history::handle_rate_email))
        // Usage & billing
        .route("/api/v1/usage", get(billing::handle_usage))
        .route("/api/v1/subscription", get(billing::handle_subscription))
        .route("/api/v1/billing/checkout", post(billing::handle_checkout))
        .route("/api/v1/billing/portal", post(billing::handle_portal))
        .route(
            "/api/v1/admin/test-users",
            post(billing::handle_setup_test_user),
        )
        .with_state(state)
}
