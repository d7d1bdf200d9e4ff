use axum::{routing::get, Router};

pub mod affiliated;
pub mod system;

/// Router for all authenticated (seller-scoped) endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/products/affiliated", affiliated::router())
}
