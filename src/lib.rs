//! MedStock API Library
//!
//! Hospital warehouse backend: item catalog and stock ledger, plus the
//! purchasing chain from requisition through goods receipt.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod logging;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod reports;
pub mod services;
pub mod tracing;

use axum::{http::HeaderValue, Router};
use slog::Logger;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
};

use crate::{
    auth::{AuthConfig, AuthRouterExt, AuthService, PermissionTable},
    config::AppConfig,
    db::DbPool,
    events::EventSender,
    handlers::AppServices,
    logging::LoggingState,
};

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: Arc<AppConfig>,
    pub event_sender: Arc<EventSender>,
    pub services: AppServices,
    pub auth: Arc<AuthService>,
    pub permissions: Arc<PermissionTable>,
}

impl AppState {
    /// Builds the services and auth pieces around an open pool and event channel,
    /// using the built-in role table.
    pub fn new(
        db: Arc<DbPool>,
        config: AppConfig,
        event_sender: EventSender,
        logger: &Logger,
    ) -> Self {
        Self::with_permissions(db, config, event_sender, logger, PermissionTable::default())
    }

    pub fn with_permissions(
        db: Arc<DbPool>,
        config: AppConfig,
        event_sender: EventSender,
        logger: &Logger,
        permissions: PermissionTable,
    ) -> Self {
        let event_sender = Arc::new(event_sender);
        let services = AppServices::new(db.clone(), event_sender.clone(), logger, &config);
        let auth = Arc::new(AuthService::new(AuthConfig::from(&config)));
        Self {
            db,
            config: Arc::new(config),
            event_sender,
            services,
            auth,
            permissions: Arc::new(permissions),
        }
    }
}

/// Versioned API routes; each group carries its own category gate.
pub fn api_v1_routes(permissions: Arc<PermissionTable>) -> Router<AppState> {
    Router::new()
        .nest("/items", handlers::items::item_routes(permissions.clone()))
        .nest(
            "/pr",
            handlers::requisitions::requisition_routes(permissions.clone()),
        )
        .nest("/rfq", handlers::rfqs::rfq_routes(permissions.clone()))
        .nest(
            "/quotation",
            handlers::quotations::quotation_routes(permissions.clone()),
        )
        .nest(
            "/po",
            handlers::purchase_orders::purchase_order_routes(permissions.clone()),
        )
        .nest(
            "/gr",
            handlers::goods_receipts::goods_receipt_routes(permissions.clone()),
        )
        .nest("/reports", handlers::reports::report_routes(permissions))
}

/// CORS from configured origins, permissive in development or when explicitly
/// allowed, same-origin otherwise.
pub fn cors_layer(cfg: &AppConfig) -> CorsLayer {
    let configured_origins: Option<Vec<HeaderValue>> = cfg
        .cors_allowed_origins
        .as_ref()
        .map(|raw| {
            raw.split(',')
                .filter_map(|origin| {
                    let trimmed = origin.trim();
                    if trimmed.is_empty() {
                        None
                    } else {
                        HeaderValue::from_str(trimmed).ok()
                    }
                })
                .collect::<Vec<_>>()
        })
        .filter(|origins| !origins.is_empty());

    if let Some(origins) = configured_origins {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    } else if cfg.should_allow_permissive_cors() {
        ::tracing::info!("Using permissive CORS because explicit origins were not configured");
        CorsLayer::permissive()
    } else {
        ::tracing::warn!(
            "No CORS origins configured; set APP__CORS_ALLOWED_ORIGINS to allow browser clients"
        );
        CorsLayer::new()
    }
}

/// Full application router: health, OpenAPI document and the v1 API.
///
/// Bearer tokens are resolved once for the whole API before any category gate
/// runs. The access log, HTTP tracing and request id layers wrap everything.
pub fn app_router(state: AppState, logger: &Logger) -> Router {
    let api = api_v1_routes(state.permissions.clone()).with_auth(state.auth.clone());

    let mut app = Router::<AppState>::new()
        .nest("/health", handlers::health::health_routes())
        .merge(openapi::openapi_routes())
        .nest("/api/v1", api);

    if state.config.access_log {
        app = app.layer(axum::middleware::from_fn_with_state(
            Arc::new(LoggingState::new(logger.clone())),
            logging::logging_middleware,
        ));
    }

    let cors = cors_layer(&state.config);
    app.layer(crate::tracing::configure_http_tracing())
        .layer(CompressionLayer::new())
        .layer(cors)
        // Ensure every request carries a request id for traceability
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
        .with_state(state)
}
