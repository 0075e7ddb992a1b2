//! Payment engine: the transfer and top-up orchestrators
//!
//! ```text
//! ┌──────────┐   ┌────────────┐   ┌──────────────┐   ┌───────────┐
//! │ Validate │──▶│ Risk Check │──▶│ Atomic Ledger│──▶│  Publish  │
//! │          │   │ (fail-open)│   │   Mutation   │   │ (best eff)│
//! └──────────┘   └────────────┘   └──────────────┘   └───────────┘
//! ```

pub mod error;
pub mod orchestrator;

#[cfg(test)]
mod integration_tests;

pub use error::PaymentError;
pub use orchestrator::{
    PaymentEngine, TopUpOutcome, TopUpRequest, TransferOutcome, TransferRequest,
};
