//! Job Marketplace Backend
//!
//! REST backend for employers, job seekers, jobs and bids, with SQLite persistence.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod media;
mod models;
mod notify;
mod validation;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::Repository;
use media::MediaStorage;
use notify::{LogNotifier, Notifier};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub config: Arc<Config>,
    pub notifier: Arc<dyn Notifier>,
    pub media: Arc<MediaStorage>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Job Marketplace Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    if config.api_psk.is_none() {
        tracing::warn!("No API PSK configured (JOBMARKET_API_PSK). The API is open to any client!");
    }

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    let state = AppState {
        repo,
        media: Arc::new(MediaStorage::new(config.media_url.clone())),
        notifier: Arc::new(LogNotifier),
        config: Arc::new(config.clone()),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Clone PSK for the auth layer
    let psk = state.config.api_psk.clone();

    let api_routes = Router::new()
        // Users and tokens
        .route("/users", post(api::create_user))
        .route("/users/me", get(api::me))
        .route("/users/{id}", get(api::get_user).put(api::update_user))
        .route("/auth/token", post(api::login))
        .route("/auth/token/refresh", post(api::refresh_token))
        .route("/password-reset", post(api::request_password_reset))
        .route("/password-reset/confirm", post(api::confirm_password_reset))
        // Addresses
        .route("/address", get(api::list_addresses).post(api::create_address))
        // Employers
        .route("/employers", get(api::list_employers).post(api::create_employer))
        .route("/employers/count", get(api::count_employers))
        .route("/employers/ratings", get(api::list_ratings).post(api::create_rating))
        .route("/employers/drafts", get(api::list_drafts))
        .route(
            "/employers/{id}",
            get(api::get_employer)
                .put(api::update_employer)
                .delete(api::delete_employer),
        )
        .route("/employers/{id}/address", get(api::employer_address))
        // Job seekers
        .route(
            "/job-seekers",
            get(api::list_job_seekers).post(api::create_job_seeker),
        )
        .route("/job-seekers/count", get(api::count_job_seekers))
        .route("/job-seekers/search-address", get(api::search_addresses))
        .route("/job-seekers/skills", get(api::list_skills).post(api::create_skill))
        .route(
            "/job-seekers/skills/{id}",
            get(api::get_skill)
                .put(api::update_skill)
                .delete(api::delete_skill),
        )
        .route(
            "/job-seekers/{id}",
            get(api::get_job_seeker)
                .put(api::update_job_seeker)
                .delete(api::delete_job_seeker),
        )
        .route("/job-seekers/{id}/projects", get(api::job_seeker_projects))
        .route("/job-seekers/{id}/address", get(api::job_seeker_address))
        // Jobs
        .route("/jobs", get(api::list_jobs).post(api::create_job))
        .route("/jobs/count", get(api::count_jobs))
        .route("/jobs/category-counts", get(api::category_counts))
        .route("/jobs/search", get(api::search_jobs))
        .route(
            "/jobs/{id}",
            get(api::get_job).put(api::update_job).delete(api::delete_job),
        )
        .route("/jobs/{id}/age", get(api::job_age))
        // Bids
        .route("/bids", get(api::list_bids).post(api::create_bid))
        .route("/bids/per-job", get(api::bids_per_job))
        .route(
            "/bids/{id}",
            get(api::get_bid).put(api::update_bid).delete(api::delete_bid),
        )
        .route(
            "/bids/{id}/shortlist",
            get(api::get_shortlist).put(api::update_shortlist),
        )
        // Projects
        .route("/projects", get(api::list_projects).post(api::create_project))
        // Apply PSK auth middleware
        .layer(middleware::from_fn(move |req, next| {
            auth::psk_auth_layer(psk.clone(), req, next)
        }));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
