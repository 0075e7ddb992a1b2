//! paycore - Payment Ledger Engine
//!
//! Maintains per-account balances and records transfers between accounts,
//! coordinating a synchronous fraud check before large or suspicious
//! movements and emitting lifecycle events once a transfer has settled.
//!
//! # Modules
//!
//! - [`ledger`] - Balance rows and the append-only transaction log (PostgreSQL)
//! - [`engine`] - Transfer and top-up orchestrators (the state machine)
//! - [`fraud`] - Timeout-guarded client for the external risk-scoring service
//! - [`events`] - Best-effort lifecycle event publisher
//! - [`gateway`] - Axum HTTP surface and principal resolution
//! - [`db`] - Connection pool and schema bootstrap
//! - [`config`] - YAML application configuration

pub mod config;
pub mod db;
pub mod engine;
pub mod events;
pub mod fraud;
pub mod gateway;
pub mod ledger;
pub mod logging;

// Convenient re-exports at crate root
pub use db::Database;
pub use engine::{PaymentEngine, PaymentError, TopUpRequest, TransferRequest};
pub use events::{EventPublisher, TransactionEvent};
pub use fraud::{FraudChecker, FraudVerdict, Verdict};
pub use ledger::{Balance, LedgerStore, TransactionRecord, TxStatus, TxType};
