//! HTTP client for the affiliated products page.
//!
//! Listing runs as a spawned task so a caller (typically a UI reacting to
//! filter changes) can abandon a stale request with [`PendingPage::cancel`].

use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tokio::task::JoinHandle;

use storefront_affiliates::{AffiliatedProductsPage, Sort};
use storefront_core::ExternalId;

/// A page of the listing as returned by the server.
pub type PagedAffiliatedProducts = AffiliatedProductsPage;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Response { status: u16, message: String },

    #[error("parse error: {0}")]
    Decode(String),

    #[error("request was cancelled")]
    Cancelled,

    #[error("request task failed: {0}")]
    Task(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub bearer_token: Option<String>,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), bearer_token: None }
    }

    pub fn with_token(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), bearer_token: Some(token.into()) }
    }
}

/// Listing filters. `None` fields are omitted from the query string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListParams {
    pub page: Option<u32>,
    pub query: Option<String>,
    pub sort: Option<Sort>,
}

impl ListParams {
    fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(query) = &self.query {
            pairs.push(("query", query.clone()));
        }
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(sort) = self.sort {
            pairs.push(("sort[key]", sort.key.as_str().to_string()));
            pairs.push(("sort[direction]", sort.direction.as_str().to_string()));
        }
        pairs
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct RemoveBody {
    success: bool,
}

#[derive(Debug, Clone)]
pub struct AffiliatedClient {
    http: reqwest::Client,
    config: Arc<ClientConfig>,
}

impl AffiliatedClient {
    pub fn new(config: ClientConfig) -> Self {
        Self::with_http(reqwest::Client::new(), config)
    }

    pub fn with_http(http: reqwest::Client, config: ClientConfig) -> Self {
        Self { http, config: Arc::new(config) }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn authorized(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.bearer_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// Start fetching one page of the listing.
    ///
    /// Must be called inside a tokio runtime.
    pub fn list_page(&self, params: ListParams) -> PendingPage {
        let client = self.clone();
        let handle = tokio::spawn(async move { client.fetch_page(&params).await });
        PendingPage { handle }
    }

    async fn fetch_page(&self, params: &ListParams) -> Result<PagedAffiliatedProducts, ClientError> {
        let req = self
            .http
            .get(self.url("/products/affiliated"))
            .query(&params.to_query());
        let resp = self.authorized(req).send().await?;

        if !resp.status().is_success() {
            return Err(response_error(resp).await);
        }

        let body = resp.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| ClientError::Decode(e.to_string()))
    }

    /// Remove the caller's direct affiliation `affiliate_id`.
    ///
    /// Only a 2xx answer whose body is `{"success": true}` counts as removed.
    pub async fn remove(&self, affiliate_id: &ExternalId) -> Result<(), ClientError> {
        let req = self
            .http
            .delete(self.url(&format!("/products/affiliated/{affiliate_id}")));
        let resp = self.authorized(req).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(response_error(resp).await);
        }

        let body = resp.bytes().await?;
        match serde_json::from_slice::<RemoveBody>(&body) {
            Ok(RemoveBody { success: true }) => {
                tracing::debug!(%affiliate_id, "affiliation removed");
                Ok(())
            }
            Ok(_) => Err(ClientError::Response {
                status: status.as_u16(),
                message: "server reported failure".to_string(),
            }),
            Err(e) => Err(ClientError::Response {
                status: status.as_u16(),
                message: format!("unexpected body: {e}"),
            }),
        }
    }
}

async fn response_error(resp: reqwest::Response) -> ClientError {
    let status = resp.status().as_u16();
    let text = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|b| b.message)
        .unwrap_or(text);
    ClientError::Response { status, message }
}

/// An in-flight listing request.
#[derive(Debug)]
pub struct PendingPage {
    handle: JoinHandle<Result<PagedAffiliatedProducts, ClientError>>,
}

impl PendingPage {
    /// Abort the request. Has no effect once it has completed.
    pub fn cancel(&self) {
        self.handle.abort();
    }

    /// Wait for the page. Yields [`ClientError::Cancelled`] after [`Self::cancel`].
    pub async fn response(self) -> Result<PagedAffiliatedProducts, ClientError> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(ClientError::Cancelled),
            Err(e) => Err(ClientError::Task(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_affiliates::{Direction, SortKey};

    #[test]
    fn list_params_encode_only_what_is_set() {
        assert!(ListParams::default().to_query().is_empty());

        let params = ListParams {
            page: Some(2),
            query: Some("presets".to_string()),
            sort: Some(Sort::new(SortKey::Commission, Direction::Desc)),
        };
        assert_eq!(
            params.to_query(),
            vec![
                ("query", "presets".to_string()),
                ("page", "2".to_string()),
                ("sort[key]", "commission".to_string()),
                ("sort[direction]", "desc".to_string()),
            ]
        );
    }

    #[test]
    fn urls_join_without_double_slashes() {
        let client = AffiliatedClient::new(ClientConfig::new("http://localhost:8080/"));
        assert_eq!(client.url("/products/affiliated"), "http://localhost:8080/products/affiliated");
    }
}
