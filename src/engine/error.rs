//! Payment Error Types
//!
//! One closed taxonomy for every orchestrated action. Error codes and HTTP
//! status suggestions live here so the gateway never re-interprets errors.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::ledger::store::StoreError;

#[derive(Error, Debug, Clone)]
pub enum PaymentError {
    // === Validation / authorization, rejected before any lock is taken ===
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("You can only transfer from your own account")]
    Unauthorized,

    // === Business rejections, abort the unit of work cleanly ===
    #[error("Account not found: {0}")]
    NotFound(String),

    #[error("Insufficient funds: balance {balance}, required {required}")]
    InsufficientFunds { balance: Decimal, required: Decimal },

    #[error("Transaction flagged as suspicious (score {score})")]
    SuspiciousTransaction { score: f64 },

    // === Concurrency ===
    /// CAS version mismatch; retried internally a bounded number of times
    /// before surfacing
    #[error("Concurrent update conflict, please retry")]
    Conflict,

    // === Dependencies / internals ===
    /// Risk-check timeout or transport failure. Absorbed by the fail-open
    /// policy on the risk path, surfaced only where no policy applies.
    #[error("Dependency unavailable: {0}")]
    DependencyUnavailable(String),

    /// Storage or transport failure; detail stays in the logs
    #[error("Internal error")]
    Internal(String),
}

impl PaymentError {
    /// Stable error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            PaymentError::InvalidInput(_) => "INVALID_INPUT",
            PaymentError::Unauthorized => "UNAUTHORIZED",
            PaymentError::NotFound(_) => "NOT_FOUND",
            PaymentError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            PaymentError::SuspiciousTransaction { .. } => "SUSPICIOUS_TRANSACTION",
            PaymentError::Conflict => "CONFLICT",
            PaymentError::DependencyUnavailable(_) => "DEPENDENCY_UNAVAILABLE",
            PaymentError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self {
            PaymentError::InvalidInput(_) => 400,
            PaymentError::Unauthorized => 403,
            PaymentError::NotFound(_) => 404,
            PaymentError::InsufficientFunds { .. } => 400,
            PaymentError::SuspiciousTransaction { .. } => 403,
            PaymentError::Conflict => 409,
            PaymentError::DependencyUnavailable(_) => 503,
            PaymentError::Internal(_) => 500,
        }
    }
}

impl From<StoreError> for PaymentError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::VersionConflict { user_id } => {
                tracing::warn!(user_id, "Balance version conflict");
                PaymentError::Conflict
            }
            StoreError::Database(e) => {
                tracing::error!("Ledger database error: {}", e);
                PaymentError::Internal(e.to_string())
            }
            StoreError::CorruptRow(detail) => {
                tracing::error!("Corrupt ledger row: {}", detail);
                PaymentError::Internal(detail)
            }
        }
    }
}

impl From<sqlx::Error> for PaymentError {
    fn from(e: sqlx::Error) -> Self {
        PaymentError::from(StoreError::Database(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_codes() {
        assert_eq!(PaymentError::Unauthorized.code(), "UNAUTHORIZED");
        assert_eq!(
            PaymentError::InsufficientFunds {
                balance: dec!(100),
                required: dec!(200)
            }
            .code(),
            "INSUFFICIENT_FUNDS"
        );
        assert_eq!(PaymentError::Conflict.code(), "CONFLICT");
    }

    #[test]
    fn test_http_status() {
        assert_eq!(PaymentError::InvalidInput("x".into()).http_status(), 400);
        assert_eq!(PaymentError::Unauthorized.http_status(), 403);
        assert_eq!(PaymentError::NotFound("y".into()).http_status(), 404);
        assert_eq!(
            PaymentError::SuspiciousTransaction { score: 1.0 }.http_status(),
            403
        );
        assert_eq!(PaymentError::Internal("z".into()).http_status(), 500);
    }

    #[test]
    fn test_internal_error_leaks_no_detail_in_display() {
        let err = PaymentError::Internal("connection string with password".into());
        assert_eq!(err.to_string(), "Internal error");
    }

    #[test]
    fn test_version_conflict_maps_to_conflict() {
        let err = PaymentError::from(StoreError::VersionConflict { user_id: 1 });
        assert!(matches!(err, PaymentError::Conflict));
    }
}
