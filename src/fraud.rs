//! Fraud-Check Client
//!
//! Bounded, timeout-guarded call to the external risk-scoring service.
//! The call is never retried here (the remote scoring call is not known to
//! be idempotent) and a timeout or transport error surfaces as a distinct
//! `Unavailable` condition, never as a verdict.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::config::FraudConfig;

/// Categorical output of the risk-scoring service
///
/// Closed enum: any future verdict must be added here, not compared as a
/// string somewhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Safe,
    Suspicious,
}

/// Risk-scoring result for one prospective transaction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FraudVerdict {
    pub score: f64,
    pub verdict: Verdict,
}

#[derive(Debug, Error)]
pub enum FraudCheckError {
    /// Timeout or transport failure; the caller decides fail-open/fail-closed
    #[error("Risk service unavailable: {0}")]
    Unavailable(String),

    #[error("Risk service returned a malformed response: {0}")]
    BadResponse(String),
}

#[async_trait]
pub trait FraudChecker: Send + Sync {
    async fn check(
        &self,
        user_id: i64,
        amount: Decimal,
        transaction_id: Option<i64>,
    ) -> Result<FraudVerdict, FraudCheckError>;
}

#[derive(Serialize)]
struct CheckRequest {
    transaction_id: i64,
    user_id: i64,
    /// The risk service reads this as a JSON number, not a string
    #[serde(with = "rust_decimal::serde::float")]
    amount: Decimal,
}

#[derive(Deserialize)]
struct CheckResponse {
    fraud_score: f64,
    status: Verdict,
}

/// HTTP client for the risk-scoring service
pub struct HttpFraudClient {
    client: reqwest::Client,
    url: String,
}

impl HttpFraudClient {
    pub fn new(config: &FraudConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            client,
            url: format!("{}/fraud/check", config.url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl FraudChecker for HttpFraudClient {
    async fn check(
        &self,
        user_id: i64,
        amount: Decimal,
        transaction_id: Option<i64>,
    ) -> Result<FraudVerdict, FraudCheckError> {
        let request = CheckRequest {
            transaction_id: transaction_id.unwrap_or(0),
            user_id,
            amount,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| FraudCheckError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FraudCheckError::Unavailable(format!(
                "Risk service returned HTTP {}",
                response.status()
            )));
        }

        let body: CheckResponse = response
            .json()
            .await
            .map_err(|e| FraudCheckError::BadResponse(e.to_string()))?;

        Ok(FraudVerdict {
            score: body.fraud_score,
            verdict: body.status,
        })
    }
}

/// Scripted checker for tests
#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Returns a fixed outcome and counts how often it was consulted
    pub struct MockFraudChecker {
        outcome: Outcome,
        pub calls: AtomicUsize,
    }

    pub enum Outcome {
        Verdict(FraudVerdict),
        Unavailable,
    }

    impl MockFraudChecker {
        pub fn safe() -> Self {
            Self::with(Outcome::Verdict(FraudVerdict {
                score: 0.0,
                verdict: Verdict::Safe,
            }))
        }

        pub fn suspicious(score: f64) -> Self {
            Self::with(Outcome::Verdict(FraudVerdict {
                score,
                verdict: Verdict::Suspicious,
            }))
        }

        pub fn unavailable() -> Self {
            Self::with(Outcome::Unavailable)
        }

        fn with(outcome: Outcome) -> Self {
            Self {
                outcome,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl FraudChecker for MockFraudChecker {
        async fn check(
            &self,
            _user_id: i64,
            _amount: Decimal,
            _transaction_id: Option<i64>,
        ) -> Result<FraudVerdict, FraudCheckError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.outcome {
                Outcome::Verdict(v) => Ok(*v),
                Outcome::Unavailable => Err(FraudCheckError::Unavailable(
                    "connection refused".to_string(),
                )),
            }
        }
    }
}
