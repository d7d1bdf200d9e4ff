//! Infrastructure wiring for the HTTP layer.

use std::sync::Arc;

use storefront_affiliates::AffiliatedPolicy;
use storefront_infra::{AffiliateRepository, InMemoryStore, LogTransport, Mailer, QueuedMailer, TeamDirectory};

use crate::config::ApiConfig;

/// Shared handler dependencies, injected as an `Extension`.
#[derive(Clone)]
pub struct AppServices {
    pub repo: Arc<dyn AffiliateRepository>,
    pub team: Arc<dyn TeamDirectory>,
    pub mailer: Arc<dyn Mailer>,
    pub policy: AffiliatedPolicy,
    pub per_page: u32,
    pub public_base_url: String,
}

impl AppServices {
    /// Services over a single in-memory store (tests/dev).
    pub fn in_memory(
        store: Arc<InMemoryStore>,
        mailer: Arc<dyn Mailer>,
        per_page: u32,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            repo: store.clone(),
            team: store,
            mailer,
            policy: AffiliatedPolicy::default(),
            per_page,
            public_base_url: public_base_url.into(),
        }
    }
}

/// Build services from configuration.
///
/// Must be called inside a tokio runtime: the mail worker is spawned here.
pub async fn build_services(config: &ApiConfig) -> anyhow::Result<AppServices> {
    let (mailer, _worker) = QueuedMailer::spawn(Arc::new(LogTransport));
    let mailer: Arc<dyn Mailer> = Arc::new(mailer);

    match &config.database_url {
        #[cfg(feature = "postgres")]
        Some(url) => {
            let store = Arc::new(storefront_infra::PostgresStore::connect(url).await?);
            store.migrate().await?;
            tracing::info!("using postgres store");
            Ok(AppServices {
                repo: store.clone(),
                team: store,
                mailer,
                policy: AffiliatedPolicy::default(),
                per_page: config.per_page,
                public_base_url: config.public_base_url.clone(),
            })
        }
        #[cfg(not(feature = "postgres"))]
        Some(_) => {
            tracing::warn!("DATABASE_URL is set but the postgres feature is disabled; using in-memory store");
            Ok(in_memory_from(config, mailer))
        }
        None => {
            tracing::info!("using in-memory store");
            Ok(in_memory_from(config, mailer))
        }
    }
}

fn in_memory_from(config: &ApiConfig, mailer: Arc<dyn Mailer>) -> AppServices {
    AppServices::in_memory(
        Arc::new(InMemoryStore::new()),
        mailer,
        config.per_page,
        config.public_base_url.clone(),
    )
}
