//! Affiliated products: the seller's own affiliate relationships with other
//! creators' products.

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Extension, Path, Query},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse},
    routing::{delete, get},
    Json, Router,
};
use chrono::Utc;

use storefront_affiliates::{AffiliateScope, AffiliatedProductsPresenter};
use storefront_auth::{Action, SellerContext};
use storefront_core::ExternalId;
use storefront_infra::AffiliateNotice;

use crate::app::{dto, errors};
use crate::app::services::AppServices;

const PAGE_TITLE: &str = "Products";

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_affiliated_products))
        .route("/:id", delete(remove_affiliate_account))
}

pub async fn list_affiliated_products(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SellerContext>,
    headers: HeaderMap,
    params: Result<Query<dto::AffiliatedProductsParams>, QueryRejection>,
) -> axum::response::Response {
    if let Err(e) = services.policy.authorize(&ctx, Action::Index, None) {
        return errors::authz_error_to_response(e);
    }

    let Query(params) = match params {
        Ok(q) => q,
        Err(rejection) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", rejection.body_text());
        }
    };

    let (page, sort) = match params.page().and_then(|p| params.sort().map(|s| (p, s))) {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let presenter = AffiliatedProductsPresenter::new(ctx.seller())
        .query(params.query.clone())
        .page(page)
        .sort(sort)
        .per_page(services.per_page)
        .base_url(services.public_base_url.clone());

    let snapshot = match services.repo.snapshot(&presenter.scope()).await {
        Ok(s) => s,
        Err(e) => return errors::store_error_to_response(e),
    };

    let props = match presenter.page_props(&snapshot) {
        Ok(p) => p,
        Err(e) => return errors::domain_error_to_response(e),
    };

    if wants_html(&headers) {
        return match dto::render_shell(PAGE_TITLE, &props) {
            Ok(html) => Html(html).into_response(),
            Err(e) => errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, "render_error", e.to_string()),
        };
    }

    Json(props).into_response()
}

pub async fn remove_affiliate_account(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SellerContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    // Malformed ids cannot name an account; answer like any unknown id.
    let Ok(external_id) = ExternalId::parse(&id) else {
        return errors::not_found();
    };

    let scope = AffiliateScope::held_by(ctx.seller().owner()).direct().alive();
    let account = match services.repo.find_by_external_id(&scope, &external_id).await {
        Ok(Some(account)) if account.affiliate_user() == ctx.user() => account,
        Ok(_) => return errors::not_found(),
        Err(e) => return errors::store_error_to_response(e),
    };

    if let Err(e) = services.policy.authorize(&ctx, Action::Destroy, Some(&account)) {
        return errors::authz_error_to_response(e);
    }
    let Some(program_seller) = account.seller() else {
        return errors::not_found();
    };

    match services.repo.mark_removed(account.id_typed(), Utc::now()).await {
        Ok(true) => {}
        // Lost a race with a concurrent removal.
        Ok(false) => return errors::not_found(),
        Err(e) => return errors::store_error_to_response(e),
    }

    tracing::info!(
        affiliate_id = %account.external_id(),
        seller = %program_seller,
        user = %ctx.user(),
        "direct affiliate removed themself"
    );

    let notice = AffiliateNotice::DirectAffiliateSelfRemoval {
        affiliate_id: account.id_typed(),
        seller: program_seller,
        affiliate_user: account.affiliate_user(),
    };
    if let Err(e) = services.mailer.enqueue(notice) {
        tracing::warn!(affiliate_id = %account.external_id(), error = %e, "failed to enqueue removal notice");
    }

    Json(serde_json::json!({ "success": true })).into_response()
}

fn wants_html(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("text/html"))
}
