use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};

use storefront_auth::SellerContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(Extension(ctx): Extension<SellerContext>) -> impl IntoResponse {
    Json(serde_json::json!({
        "user_id": ctx.user().to_string(),
        "seller_id": ctx.seller().to_string(),
        "role": ctx.role().map(|r| r.as_str()),
    }))
}
