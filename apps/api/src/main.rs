use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use reachly_api::auth::SupabaseAuth;
use reachly_api::billing::subscription::SupabaseBilling;
use reachly_api::billing::tier::{ADVANCED_MODEL, STANDARD_MODEL};
use reachly_api::config::Config;
use reachly_api::db::create_pool;
use reachly_api::llm_client::LlmClient;
use reachly_api::routes::build_router;
use reachly_api::state::AppState;
use reachly_api::store::PgStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("reachly_api={}", &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Reachly API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let store = Arc::new(PgStore::new(create_pool(&config.database_url).await?));

    // Hosted auth + billing functions share one HTTP client
    let http = reqwest::Client::new();
    let auth = SupabaseAuth::new(
        http.clone(),
        &config.supabase_url,
        config.supabase_anon_key.clone(),
    );
    let billing = SupabaseBilling::new(
        http,
        &config.supabase_url,
        config.supabase_anon_key.clone(),
    );

    // Initialize LLM client
    let llm = LlmClient::new(config.anthropic_api_key.clone())?;
    if llm.has_api_key() {
        info!("LLM client initialized (models: {STANDARD_MODEL}, {ADVANCED_MODEL})");
    } else {
        warn!("ANTHROPIC_API_KEY is not set; generation requests will fail");
    }

    if config.allow_test_mode {
        warn!("Test mode overrides are enabled");
    }

    // Build app state
    let state = AppState {
        config: config.clone(),
        auth: Arc::new(auth),
        llm: Arc::new(llm),
        billing: Arc::new(billing),
        usage: store.clone(),
        subscriptions: store.clone(),
        emails: store.clone(),
        ratings: store.clone(),
        analyses: store,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins to the web app's domain

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
