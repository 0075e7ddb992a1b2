//! Ledger: durable account balances and the append-only transaction log

pub mod models;
pub mod store;

pub use models::{Balance, TransactionRecord, TxStatus, TxType};
pub use store::LedgerStore;
