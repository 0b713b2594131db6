/*
 * Responsibility
 * - Config loading → dependency construction → Router assembly
 * - Middleware placement: access gate on protected routes, gate + admin audit
 *   on admin routes (mounted at the admin prefix), HTTP-level layers around
 *   everything
 * - axum::serve() startup
 */
use std::{panic, process, sync::Arc};

use anyhow::Result;
use axum::{Router, routing::get};
use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::api::v1::extractors::auth_ctx::BinderError;
use crate::api::v1::handlers::health::health;
use crate::config::{AppEnv, Config};
use crate::middleware;
use crate::repos::user_repo::InMemoryUserStore;
use crate::services::audit::{AdminAudit, TracingAuditSink};
use crate::services::auth::build_token_codec;
use crate::state::AppState;

fn init_tracing(app_env: AppEnv) {
    // RUST_LOG wins; e.g. RUST_LOG=info,expert_gate=debug,admin_audit=info
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    let registry = tracing_subscriber::registry().with(filter);
    if app_env.is_production() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");

        // development: crash so it gets noticed; production: default hook, keep serving
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    let config = Config::from_env()?;
    init_tracing(config.app_env);
    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting API in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config);
    let app = build_router(state)?;

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Process-level services, shared by every request.
pub fn build_state(config: &Config) -> AppState {
    AppState::new(
        build_token_codec(config),
        Arc::new(InMemoryUserStore::new()),
        Arc::new(AdminAudit::new(Arc::new(TracingAuditSink))),
        config.admin_prefix.clone(),
    )
}

pub const API_PREFIX: &str = "/api/v1";
pub const HEALTH_PATH: &str = "/health";

#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Binding(#[from] BinderError),
    #[error("admin prefix {prefix} also covers non-admin route {path}")]
    PrefixOverlap { prefix: String, path: String },
}

/// Full application router.
///
/// Admin routes are mounted at the configured admin prefix, which is also what
/// the role gate checks, so every admin handler is gated and audited. Fails when
/// a handler declares an invalid identity binding or when a non-admin route
/// would fall under the admin prefix.
pub fn build_router(state: AppState) -> Result<Router, BuildError> {
    let prefix = state.admin_prefix.clone();
    let public = api::v1::public_routes();
    let protected = api::v1::protected_routes();

    let non_admin = std::iter::once(HEALTH_PATH.to_string()).chain(
        public
            .paths()
            .iter()
            .chain(protected.paths())
            .map(|path| format!("{API_PREFIX}{path}")),
    );
    for path in non_admin {
        if prefix.matches(&path) {
            return Err(BuildError::PrefixOverlap {
                prefix: prefix.as_str().to_string(),
                path,
            });
        }
    }

    // route_layer order: the last applied runs first, so the gate wraps the audit
    let admin = middleware::audit::apply(api::v1::admin_routes().into_router()?, state.clone());
    let admin = middleware::auth::access::apply(admin, state.clone());
    let protected = middleware::auth::access::apply(protected.into_router()?, state.clone());

    let router = Router::new()
        .route(HEALTH_PATH, get(health))
        .nest(API_PREFIX, public.into_router()?.merge(protected))
        .nest(prefix.as_str(), admin)
        .with_state(state);

    Ok(middleware::http::apply(router))
}
