//! Event Publisher
//!
//! Best-effort, at-most-once emission of transaction lifecycle events to a
//! topic-based bus. The publisher keeps no state: publish failures are
//! logged by the caller and never roll back the already-committed mutation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::config::EventBusConfig;
use crate::ledger::TxStatus;

/// Lifecycle topic for settled transactions
pub const TOPIC_TRANSACTIONS: &str = "transactions";
/// Status-only updates for downstream notification consumers
pub const TOPIC_TRANSACTION_STATUS: &str = "transaction.status";

/// Kind of lifecycle event, serialized as the wire strings consumers expect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    TopUp,
    TransferSent,
    TransferReceived,
}

/// Self-describing payload: enough for a downstream consumer to build a
/// user-facing notification without querying the ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionEvent {
    pub transaction_id: i64,
    pub user_id: i64,
    /// Downstream consumers read this as a JSON number, not a string
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

impl TransactionEvent {
    pub fn new(transaction_id: i64, user_id: i64, amount: Decimal, kind: EventKind) -> Self {
        Self {
            transaction_id,
            user_id,
            amount,
            kind,
            status: TxStatus::Completed.as_str().to_string(),
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Event bus unreachable: {0}")]
    Unreachable(String),

    #[error("Event bus rejected publish: HTTP {0}")]
    Rejected(u16),
}

#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Fire-and-forget: no retry, no acknowledgment beyond transport success
    async fn publish(&self, topic: &str, event: &TransactionEvent) -> Result<(), PublishError>;
}

/// HTTP push to a bus gateway, one POST per event with a short send timeout
/// so a slow bus never stalls a committed transfer's response
pub struct HttpEventBus {
    client: reqwest::Client,
    base_url: String,
}

impl HttpEventBus {
    pub fn new(config: &EventBusConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl EventPublisher for HttpEventBus {
    async fn publish(&self, topic: &str, event: &TransactionEvent) -> Result<(), PublishError> {
        let url = format!("{}/publish/{}", self.base_url, topic);

        let response = self
            .client
            .post(&url)
            .json(event)
            .send()
            .await
            .map_err(|e| PublishError::Unreachable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PublishError::Rejected(response.status().as_u16()));
        }

        Ok(())
    }
}

/// Drops every event; used when the bus is disabled and in tests
pub struct NullPublisher;

#[async_trait]
impl EventPublisher for NullPublisher {
    async fn publish(&self, topic: &str, event: &TransactionEvent) -> Result<(), PublishError> {
        tracing::debug!(
            topic,
            transaction_id = event.transaction_id,
            "Event bus disabled, dropping event"
        );
        Ok(())
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::Mutex;

    /// Records published events; can be flipped to fail every publish
    pub struct RecordingPublisher {
        pub published: Mutex<Vec<(String, TransactionEvent)>>,
        fail: bool,
    }

    impl RecordingPublisher {
        pub fn new() -> Self {
            Self {
                published: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        pub fn failing() -> Self {
            Self {
                published: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        pub fn events(&self) -> Vec<(String, TransactionEvent)> {
            self.published.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl EventPublisher for RecordingPublisher {
        async fn publish(
            &self,
            topic: &str,
            event: &TransactionEvent,
        ) -> Result<(), PublishError> {
            if self.fail {
                return Err(PublishError::Unreachable("bus down".to_string()));
            }
            self.published
                .lock()
                .unwrap()
                .push((topic.to_string(), event.clone()));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_event_payload_wire_format() {
        let event = TransactionEvent::new(17, 42, dec!(300), EventKind::TransferSent);
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["transaction_id"], 17);
        assert_eq!(json["user_id"], 42);
        assert_eq!(json["type"], "transfer_sent");
        assert_eq!(json["status"], "completed");
        assert!(json["timestamp"].is_string());
    }

    /// Downstream consumers unmarshal `amount` into a float; a string here
    /// would break them
    #[test]
    fn test_event_amount_serializes_as_json_number() {
        let event = TransactionEvent::new(1, 2, dec!(500), EventKind::TopUp);
        let json = serde_json::to_value(&event).unwrap();

        assert!(json["amount"].is_number(), "got: {}", json["amount"]);
        assert_eq!(json["amount"], serde_json::json!(500.0));
    }

    #[test]
    fn test_event_kind_strings() {
        assert_eq!(
            serde_json::to_value(EventKind::TopUp).unwrap(),
            serde_json::json!("top_up")
        );
        assert_eq!(
            serde_json::to_value(EventKind::TransferReceived).unwrap(),
            serde_json::json!("transfer_received")
        );
    }
}
