//! Delivery worker shipping event batches to the collection endpoint
//!
//! The sink is a trait so the scheduler and tracker can be exercised
//! against a scripted mock in tests. `HttpSink` is the production
//! implementation: one POST of a JSON array per batch, with the delivery
//! timeout applied per attempt.

use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, warn};

use super::QueuedEvent;
use crate::error::{DeliveryError, Error, Result};
use crate::models::WireEvent;

/// Transmits one batch to the collection endpoint
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Deliver a batch; classification of the failure drives the
    /// scheduler's retry policy
    async fn deliver(&self, batch: &[QueuedEvent]) -> std::result::Result<(), DeliveryError>;
}

/// HTTP sink POSTing batches as a JSON array of wire events
pub struct HttpSink {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl HttpSink {
    /// Create a sink for the given collector URL and per-attempt timeout
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.into(),
            timeout,
        })
    }

    fn classify_status(status: StatusCode, body: String) -> DeliveryError {
        if status.is_client_error() {
            DeliveryError::Malformed {
                status: status.as_u16(),
                message: body,
            }
        } else {
            DeliveryError::Transient(format!("collector returned {}: {}", status, body))
        }
    }
}

#[async_trait]
impl EventSink for HttpSink {
    async fn deliver(&self, batch: &[QueuedEvent]) -> std::result::Result<(), DeliveryError> {
        let payload: Vec<WireEvent> = batch.iter().map(|q| q.event.to_wire()).collect();

        debug!(
            batch_size = payload.len(),
            url = %self.url,
            "Delivering batch"
        );

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DeliveryError::Timeout(self.timeout)
                } else {
                    DeliveryError::Transient(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            debug!(batch_size = payload.len(), "Batch delivered");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        let error = Self::classify_status(status, body);
        warn!(
            status = status.as_u16(),
            error = %error,
            "Collector refused batch"
        );
        Err(error)
    }
}
