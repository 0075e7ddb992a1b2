//! API response types and error codes
//!
//! Every endpoint answers with the unified `ApiResponse` wrapper:
//! code 0 = success, non-zero = error code from `error_codes`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::engine::PaymentError;

/// Unified API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    /// Response code: 0 for success, non-zero for errors
    pub code: i32,
    /// Response message
    pub msg: String,
    /// Response data (only present when code == 0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: 0,
            msg: "ok".to_string(),
            data: Some(data),
        }
    }
}

/// Standard API error codes
pub mod error_codes {
    pub const SUCCESS: i32 = 0;

    // Client errors (1xxx)
    pub const INVALID_PARAMETER: i32 = 1001;
    pub const INSUFFICIENT_BALANCE: i32 = 1002;

    // Auth errors (2xxx)
    pub const MISSING_AUTH: i32 = 2001;
    pub const AUTH_FAILED: i32 = 2002;
    pub const FORBIDDEN: i32 = 2003;

    // Business rejections (3xxx)
    pub const SUSPICIOUS_TRANSACTION: i32 = 3001;
    pub const CONFLICT: i32 = 3002;

    // Resource errors (4xxx)
    pub const NOT_FOUND: i32 = 4001;

    // Server errors (5xxx)
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const SERVICE_UNAVAILABLE: i32 = 5001;
}

/// Error half of a handler result; renders as an `ApiResponse` with no data
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: i32,
    pub msg: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: i32, msg: impl Into<String>) -> Self {
        Self {
            status,
            code,
            msg: msg.into(),
        }
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, error_codes::AUTH_FAILED, msg)
    }

    pub fn service_unavailable(msg: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            error_codes::SERVICE_UNAVAILABLE,
            msg,
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body: ApiResponse<()> = ApiResponse {
            code: self.code,
            msg: self.msg,
            data: None,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<PaymentError> for ApiError {
    fn from(e: PaymentError) -> Self {
        let code = match &e {
            PaymentError::InvalidInput(_) => error_codes::INVALID_PARAMETER,
            PaymentError::Unauthorized => error_codes::FORBIDDEN,
            PaymentError::NotFound(_) => error_codes::NOT_FOUND,
            PaymentError::InsufficientFunds { .. } => error_codes::INSUFFICIENT_BALANCE,
            PaymentError::SuspiciousTransaction { .. } => error_codes::SUSPICIOUS_TRANSACTION,
            PaymentError::Conflict => error_codes::CONFLICT,
            PaymentError::DependencyUnavailable(_) => error_codes::SERVICE_UNAVAILABLE,
            PaymentError::Internal(detail) => {
                // Detail stays in the server logs, the caller gets the
                // generic message from Display
                tracing::error!(%detail, "Internal error surfaced to caller");
                error_codes::INTERNAL_ERROR
            }
        };
        let status =
            StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::new(status, code, e.to_string())
    }
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// Wrap data in the success envelope
pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::success(data)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_success_envelope() {
        let response = ApiResponse::success(42);
        assert_eq!(response.code, error_codes::SUCCESS);
        assert_eq!(response.msg, "ok");
        assert_eq!(response.data, Some(42));
    }

    #[test]
    fn test_payment_error_mapping() {
        let err = ApiError::from(PaymentError::InsufficientFunds {
            balance: dec!(100),
            required: dec!(200),
        });
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, error_codes::INSUFFICIENT_BALANCE);

        let err = ApiError::from(PaymentError::SuspiciousTransaction { score: 5000.0 });
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert_eq!(err.code, error_codes::SUSPICIOUS_TRANSACTION);

        let err = ApiError::from(PaymentError::Internal("secret detail".into()));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        // Internal detail never leaks to the caller
        assert_eq!(err.msg, "Internal error");
    }
}
