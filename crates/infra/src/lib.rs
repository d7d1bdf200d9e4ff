//! Infrastructure layer: storage adapters and mail delivery.

pub mod mail;
pub mod store;

pub use mail::{AffiliateNotice, LogTransport, MailError, MailTransport, Mailer, Outbox, QueuedMailer};
pub use store::{AffiliateRepository, InMemoryStore, StoreError, TeamDirectory};
#[cfg(feature = "postgres")]
pub use store::PostgresStore;
