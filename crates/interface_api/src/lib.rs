//! HTTP API Layer
//!
//! This crate provides the REST API for the group expense ledger using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: Request handlers for groups and health checks
//! - **Middleware**: Request ids, tracing, timeouts, audit logging
//! - **DTOs**: Request/Response data transfer objects
//! - **Error Handling**: Consistent error responses
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::create_router;
//!
//! let app = create_router(service, config);
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod handlers;
pub mod dto;

use axum::{
    Router,
    routing::{get, post},
    middleware as axum_middleware,
};
use domain_groups::GroupService;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::handlers::{groups, health};
use crate::middleware::audit_middleware;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: GroupService,
    pub config: ApiConfig,
}

/// Creates the main API router
///
/// # Arguments
///
/// * `service` - Group service over the configured storage
/// * `config` - API configuration
///
/// # Returns
///
/// Configured Axum router with all routes and middleware
pub fn create_router(service: GroupService, config: ApiConfig) -> Router {
    let request_timeout = config.request_timeout();
    let state = AppState { service, config };

    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let group_routes = Router::new()
        .route("/", post(groups::create_group).get(groups::list_groups))
        .route("/:id", get(groups::get_group).delete(groups::delete_group))
        .route("/:id/members", post(groups::add_member))
        .route("/:id/expenses", post(groups::add_expense))
        .route("/:id/settle", post(groups::settle))
        .route("/:id/recalculate", post(groups::recalculate))
        .route("/:id/overview", get(groups::get_overview))
        .route("/:id/balances/:member", get(groups::get_balance))
        .route("/:id/balances/:member/suggestion", get(groups::get_suggestion));

    let api_routes = Router::new()
        .nest("/groups", group_routes)
        .route("/members/:member/totals", get(groups::get_member_totals))
        .layer(axum_middleware::from_fn(audit_middleware));

    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TimeoutLayer::new(request_timeout));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(middleware)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
