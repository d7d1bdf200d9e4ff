use std::sync::Arc;

use axum::{routing::delete, Json, Router};
use chrono::{Duration, Utc};

use storefront_affiliates::{AffiliateAccount, AffiliateProduct, AffiliateSale, Direction, Product, Sort, SortKey};
use storefront_api::app::{self, services::AppServices};
use storefront_auth::{Hs256JwtValidator, JwtClaims};
use storefront_client::{AffiliatedClient, ClientConfig, ClientError, ListParams};
use storefront_core::{ExternalId, SellerId, UserId};
use storefront_infra::{AffiliateRepository, InMemoryStore, LogTransport, QueuedMailer};

const JWT_SECRET: &[u8] = b"client-secret";

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn serve(app: Router) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn token(user: UserId, seller: SellerId) -> String {
    let now = Utc::now();
    Hs256JwtValidator::new(JWT_SECRET.to_vec())
        .sign(&JwtClaims {
            sub: user,
            seller_id: seller,
            issued_at: now,
            expires_at: now + Duration::minutes(10),
        })
        .unwrap()
}

/// API server with one direct affiliation (two products) for the seller's user.
async fn api_server() -> (TestServer, SellerId, AffiliateAccount) {
    let store = Arc::new(InMemoryStore::new());
    let seller = SellerId::new();
    let creator = SellerId::new();

    let course = Product::new(creator, "Course", "course", 4_000).unwrap();
    let zine = Product::new(creator, "Zine", "zine", 800).unwrap();
    store.insert_product(&course).await.unwrap();
    store.insert_product(&zine).await.unwrap();

    let account = AffiliateAccount::direct(
        seller.owner(),
        creator,
        vec![
            AffiliateProduct::new(course.id, 3_000).unwrap(),
            AffiliateProduct::new(zine.id, 5_000).unwrap(),
        ],
    );
    store.insert_account(&account).await.unwrap();
    store
        .record_sale(&AffiliateSale { account: account.id_typed(), product: course.id, credit_cents: 1_200 })
        .await
        .unwrap();

    let (mailer, _worker) = QueuedMailer::spawn(Arc::new(LogTransport));
    let services = AppServices::in_memory(store, Arc::new(mailer), 20, "https://shop.test");
    let jwt = Arc::new(Hs256JwtValidator::new(JWT_SECRET.to_vec()));
    let srv = TestServer::serve(app::router(services, jwt)).await;
    (srv, seller, account)
}

#[tokio::test]
async fn list_page_fetches_sorted_rows() {
    let (srv, seller, _) = api_server().await;
    let client = AffiliatedClient::new(ClientConfig::with_token(&srv.base_url, token(seller.owner(), seller)));

    let page = client
        .list_page(ListParams {
            sort: Some(Sort::new(SortKey::Commission, Direction::Desc)),
            ..ListParams::default()
        })
        .response()
        .await
        .unwrap();

    let names: Vec<&str> = page.affiliated_products.iter().map(|r| r.product_name.as_str()).collect();
    assert_eq!(names, ["Zine", "Course"]);
    assert_eq!(page.stats.total_revenue, 1_200);
    assert_eq!(page.pagination.count, 2);
}

#[tokio::test]
async fn list_page_surfaces_forbidden_as_response_error() {
    let (srv, seller, _) = api_server().await;
    let client = AffiliatedClient::new(ClientConfig::with_token(&srv.base_url, token(UserId::new(), seller)));

    let err = client.list_page(ListParams::default()).response().await.unwrap_err();
    assert!(matches!(err, ClientError::Response { status: 403, .. }), "got {err:?}");
}

#[tokio::test]
async fn cancelled_list_resolves_to_cancelled() {
    // Accepts connections but never answers, so the request cannot finish.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let _silent = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let client = AffiliatedClient::new(ClientConfig::new(base_url));
    let pending = client.list_page(ListParams { page: Some(1), ..ListParams::default() });
    pending.cancel();

    let err = pending.response().await.unwrap_err();
    assert!(matches!(err, ClientError::Cancelled), "got {err:?}");
}

#[tokio::test]
async fn remove_succeeds_once_then_reports_not_found() {
    let (srv, seller, account) = api_server().await;
    let client = AffiliatedClient::new(ClientConfig::with_token(&srv.base_url, token(seller.owner(), seller)));

    client.remove(account.external_id()).await.unwrap();

    let err = client.remove(account.external_id()).await.unwrap_err();
    assert!(matches!(err, ClientError::Response { status: 404, .. }), "got {err:?}");

    let page = client.list_page(ListParams::default()).response().await.unwrap();
    assert!(page.affiliated_products.is_empty());
}

#[tokio::test]
async fn remove_requires_an_explicit_success_flag() {
    let app = Router::new().route(
        "/products/affiliated/:id",
        delete(|| async { Json(serde_json::json!({ "success": false })) }),
    );
    let srv = TestServer::serve(app).await;
    let client = AffiliatedClient::new(ClientConfig::new(&srv.base_url));

    let err = client.remove(&ExternalId::generate()).await.unwrap_err();
    assert!(matches!(err, ClientError::Response { status: 200, .. }), "got {err:?}");
}
