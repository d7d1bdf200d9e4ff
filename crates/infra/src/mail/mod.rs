//! Asynchronous affiliate notifications.
//!
//! Callers enqueue and move on: a background task drains the queue into a
//! [`MailTransport`]. Delivery failures are logged and dropped (no retries
//! at this layer).

use std::sync::{Arc, Mutex};

use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use storefront_core::{AffiliateId, SellerId, UserId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MailError {
    #[error("mail queue is closed")]
    QueueClosed,

    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// A notification about an affiliate relationship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "template", rename_all = "snake_case")]
pub enum AffiliateNotice {
    /// A direct affiliate removed themself from a seller's program.
    DirectAffiliateSelfRemoval {
        affiliate_id: AffiliateId,
        seller: SellerId,
        affiliate_user: UserId,
    },
}

impl AffiliateNotice {
    pub fn template(&self) -> &'static str {
        match self {
            AffiliateNotice::DirectAffiliateSelfRemoval { .. } => "direct_affiliate_self_removal",
        }
    }
}

/// Fire-and-forget enqueue.
pub trait Mailer: Send + Sync {
    fn enqueue(&self, notice: AffiliateNotice) -> Result<(), MailError>;
}

/// Actually sends a notice (SMTP, provider API, ...).
pub trait MailTransport: Send + Sync {
    fn deliver(&self, notice: &AffiliateNotice) -> Result<(), MailError>;
}

/// Mailer backed by an in-process queue and a worker task.
#[derive(Debug, Clone)]
pub struct QueuedMailer {
    tx: mpsc::UnboundedSender<AffiliateNotice>,
}

impl QueuedMailer {
    /// Start the worker on the current tokio runtime.
    ///
    /// The worker exits once every `QueuedMailer` clone is dropped.
    pub fn spawn(transport: Arc<dyn MailTransport>) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<AffiliateNotice>();
        let handle = tokio::spawn(async move {
            while let Some(notice) = rx.recv().await {
                match transport.deliver(&notice) {
                    Ok(()) => tracing::info!(template = notice.template(), "notice delivered"),
                    Err(e) => tracing::warn!(template = notice.template(), error = %e, "notice delivery failed"),
                }
            }
            tracing::debug!("mail worker stopped");
        });
        (Self { tx }, handle)
    }
}

impl Mailer for QueuedMailer {
    fn enqueue(&self, notice: AffiliateNotice) -> Result<(), MailError> {
        self.tx.send(notice).map_err(|_| MailError::QueueClosed)
    }
}

/// Transport that only logs the notice (dev default).
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTransport;

impl MailTransport for LogTransport {
    fn deliver(&self, notice: &AffiliateNotice) -> Result<(), MailError> {
        let payload = serde_json::to_string(notice).map_err(|e| MailError::Delivery(e.to_string()))?;
        tracing::info!(template = notice.template(), %payload, "mail");
        Ok(())
    }
}

/// Transport that records delivered notices in memory (tests/dev).
#[derive(Debug, Default)]
pub struct Outbox {
    delivered: Mutex<Vec<AffiliateNotice>>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delivered(&self) -> Vec<AffiliateNotice> {
        self.delivered.lock().map(|d| d.clone()).unwrap_or_default()
    }
}

impl MailTransport for Outbox {
    fn deliver(&self, notice: &AffiliateNotice) -> Result<(), MailError> {
        self.delivered
            .lock()
            .map_err(|_| MailError::Delivery("outbox lock poisoned".to_string()))?
            .push(notice.clone());
        Ok(())
    }
}
