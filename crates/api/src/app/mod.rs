//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: storage and mail wiring
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: query parameters and page rendering
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use storefront_auth::{Hs256JwtValidator, JwtValidator};

use crate::config::ApiConfig;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router from configuration (entrypoint used by `main.rs`).
pub async fn build_app(config: &ApiConfig) -> anyhow::Result<Router> {
    let services = services::build_services(config).await?;
    let jwt = Arc::new(Hs256JwtValidator::new(config.jwt_secret.clone().into_bytes()));
    Ok(router(services, jwt))
}

/// Assemble the router over already-built services.
pub fn router(services: services::AppServices, jwt: Arc<dyn JwtValidator>) -> Router {
    let auth_state = middleware::AuthState { jwt, team: services.team.clone() };

    // Protected routes: require a valid token and carry a seller context.
    let protected = routes::router()
        .layer(Extension(Arc::new(services)))
        // Unmatched paths skip auth and fall through to 404.
        .route_layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected)
        .layer(ServiceBuilder::new().layer(axum::middleware::from_fn(middleware::trace_request)))
}
