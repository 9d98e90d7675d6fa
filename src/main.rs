// ABOUTME: Main entry point for the smart-hosting storefront and admin backend
// ABOUTME: Sets up configuration, tracing, storage, the router and background session cleanup

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod auth;
mod auth_helpers;
mod authz;
mod blob;
mod config;
mod entities;
mod error;
mod handlers;
mod identity;
mod middleware;
mod migration;
mod orders;
mod packages;
mod reports;
mod roles;
mod session;
mod storage;
mod tickets;
mod types;
mod users;

#[cfg(test)]
mod integration_tests;

use blob::{BlobStore, FileBlobStore};
use config::AppConfig;
use identity::{IdentityGateway, LocalIdentity};
use session::SessionStore;
use storage::Storage;

const SESSION_CLEANUP_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub storage: Arc<Storage>,
    pub blobs: Arc<dyn BlobStore>,
    pub identity: Arc<dyn IdentityGateway>,
    pub sessions: SessionStore,
}

impl AppState {
    pub async fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let storage = Arc::new(Storage::connect(&config.database_url).await?);
        let blobs: Arc<dyn BlobStore> =
            Arc::new(FileBlobStore::open(&config.blob_dir, &config.public_base_url).await?);
        let identity: Arc<dyn IdentityGateway> = Arc::new(LocalIdentity::new(storage.clone()));
        let sessions = SessionStore::new(config.session_max_age_secs);

        Ok(Self {
            config: Arc::new(config),
            storage,
            blobs,
            identity,
            sessions,
        })
    }
}

pub fn build_router(state: AppState) -> Router {
    // Multipart framing needs headroom above the proof itself.
    let body_limit = state.config.max_proof_bytes + 64 * 1024;

    Router::new()
        .route("/health", get(handlers::health))
        .route("/packages", get(handlers::list_packages))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/auth/permissions/:action", get(auth::check_permission))
        .route(
            "/orders",
            post(handlers::submit_order)
                .get(handlers::list_own_orders)
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/dashboard", get(handlers::user_dashboard))
        .route("/admin/orders", get(handlers::list_all_orders))
        .route(
            "/admin/orders/:id/status",
            post(handlers::update_order_status),
        )
        .route(
            "/admin/orders/:id/payment-proof",
            get(handlers::payment_proof_url),
        )
        .route(
            "/payment-proofs/*key",
            get(handlers::download_payment_proof),
        )
        .route(
            "/tickets",
            post(handlers::create_ticket).get(handlers::list_own_tickets),
        )
        .route("/admin/tickets", get(handlers::list_all_tickets))
        .route("/admin/tickets/:id/reply", post(handlers::reply_ticket))
        .route("/admin/tickets/:id/close", post(handlers::close_ticket))
        .route("/admin/users", get(handlers::list_users))
        .route("/admin/users/:id", delete(handlers::delete_user))
        .route("/admin/users/:id/block", post(handlers::block_user))
        .route("/admin/users/:id/promote", post(handlers::promote_user))
        .route("/admin/dashboard", get(handlers::admin_dashboard))
        .route("/admin/analytics", get(handlers::analytics))
        .layer(axum_middleware::from_fn(middleware::security_headers))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("smart_hosting=info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();
}

fn spawn_session_cleanup(sessions: SessionStore) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            let removed = sessions.cleanup_expired_sessions();
            if removed > 0 {
                tracing::debug!(removed, "Purged expired sessions");
            }
        }
    });
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::parse();
    init_tracing();

    let bind_address = config.bind_address();
    let state = AppState::from_config(config).await?;

    if let Some(email) = state.config.bootstrap_super_admin.as_deref() {
        if !users::bootstrap_super_admin(&state.storage, email).await? {
            tracing::warn!(email = %email, "Bootstrap super_admin not registered yet; sign up and restart");
        }
    }

    spawn_session_cleanup(state.sessions.clone());

    let app = build_router(state);
    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!("Server running on http://{}", bind_address);

    axum::serve(listener, app).await?;
    Ok(())
}
