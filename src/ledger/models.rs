//! Ledger row types
//!
//! `Balance` is the per-user account row, mutated only inside store-owned
//! transactions. `TransactionRecord` is immutable once committed; direction
//! is encoded by sender/recipient, the amount is always positive.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One balance row per user
///
/// `version` is the optimistic-concurrency token: it starts at 1 and is
/// incremented by exactly 1 on every committed mutation. Writers must pass
/// the version they read under the row lock back into `save`.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Balance {
    pub user_id: i64,
    pub amount: Decimal,
    pub version: i32,
    pub updated_at: DateTime<Utc>,
}

/// Transaction status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i16)]
pub enum TxStatus {
    Completed = 1,
    Failed = 2,
}

impl TxStatus {
    /// Get numeric ID for PostgreSQL storage
    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    /// Convert from PostgreSQL ID
    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            1 => Some(TxStatus::Completed),
            2 => Some(TxStatus::Failed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TxStatus::Completed => "completed",
            TxStatus::Failed => "failed",
        }
    }
}

/// Transaction type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i16)]
pub enum TxType {
    TopUp = 1,
    Transfer = 2,
}

impl TxType {
    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            1 => Some(TxType::TopUp),
            2 => Some(TxType::Transfer),
            _ => None,
        }
    }
}

/// One row per settled movement of funds
#[derive(Debug, Clone, Serialize)]
pub struct TransactionRecord {
    /// Store-assigned, monotonic; 0 until the record is appended
    pub id: i64,
    pub sender_id: i64,
    /// None for top-ups
    pub recipient_id: Option<i64>,
    pub amount: Decimal,
    pub status: TxStatus,
    #[serde(rename = "type")]
    pub tx_type: TxType,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl TransactionRecord {
    /// Build a completed top-up record, not yet appended
    pub fn top_up(user_id: i64, amount: Decimal, description: impl Into<String>) -> Self {
        Self {
            id: 0,
            sender_id: user_id,
            recipient_id: None,
            amount,
            status: TxStatus::Completed,
            tx_type: TxType::TopUp,
            description: description.into(),
            created_at: Utc::now(),
        }
    }

    /// Build a completed transfer record, not yet appended
    pub fn transfer(
        sender_id: i64,
        recipient_id: i64,
        amount: Decimal,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: 0,
            sender_id,
            recipient_id: Some(recipient_id),
            amount,
            status: TxStatus::Completed,
            tx_type: TxType::Transfer,
            description: description.into(),
            created_at: Utc::now(),
        }
    }
}
