//! Transfer and Top-Up Orchestrators
//!
//! Sequences validation, risk check, the atomic ledger mutation and the
//! post-commit event emission for each financial action. This is the only
//! place balances are mutated; every mutation runs inside one store
//! transaction with row locks taken in canonical order (ascending user_id)
//! and a compare-and-swap save as the second safety net.

use rust_decimal::Decimal;
use std::sync::Arc;

use crate::events::{EventKind, EventPublisher, TransactionEvent, TOPIC_TRANSACTIONS};
use crate::fraud::{FraudChecker, Verdict};
use crate::ledger::{Balance, LedgerStore, TransactionRecord};

use super::error::PaymentError;

/// Bounded internal retries on a CAS version conflict before surfacing it
const MAX_CAS_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone)]
pub struct TopUpRequest {
    pub user_id: i64,
    pub amount: Decimal,
}

#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub sender_id: i64,
    pub recipient_id: i64,
    pub amount: Decimal,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TopUpOutcome {
    pub transaction_id: i64,
    pub balance: Decimal,
}

#[derive(Debug, Clone)]
pub struct TransferOutcome {
    pub transaction_id: i64,
    pub sender_balance: Decimal,
}

/// Validate a top-up request. No side effects on failure.
fn validate_top_up(req: &TopUpRequest) -> Result<(), PaymentError> {
    if req.user_id <= 0 {
        return Err(PaymentError::InvalidInput("Invalid user_id".to_string()));
    }
    if req.amount <= Decimal::ZERO {
        return Err(PaymentError::InvalidInput(
            "Amount must be positive".to_string(),
        ));
    }
    Ok(())
}

/// Validate a transfer request against the authenticated principal.
/// No side effects on failure; rejected before any lock is taken.
fn validate_transfer(principal_id: i64, req: &TransferRequest) -> Result<(), PaymentError> {
    if req.sender_id <= 0 || req.recipient_id <= 0 {
        return Err(PaymentError::InvalidInput(
            "Invalid sender or recipient".to_string(),
        ));
    }
    if req.sender_id == req.recipient_id {
        return Err(PaymentError::InvalidInput(
            "Sender and recipient must be different".to_string(),
        ));
    }
    if req.amount <= Decimal::ZERO {
        return Err(PaymentError::InvalidInput(
            "Amount must be positive".to_string(),
        ));
    }
    if principal_id != req.sender_id {
        return Err(PaymentError::Unauthorized);
    }
    Ok(())
}

/// The state machine for top-ups and peer-to-peer transfers
pub struct PaymentEngine {
    store: LedgerStore,
    fraud: Arc<dyn FraudChecker>,
    events: Arc<dyn EventPublisher>,
    /// Top-ups at or below this amount skip the risk check
    large_amount_threshold: Decimal,
}

impl PaymentEngine {
    pub fn new(
        store: LedgerStore,
        fraud: Arc<dyn FraudChecker>,
        events: Arc<dyn EventPublisher>,
        large_amount_threshold: Decimal,
    ) -> Self {
        Self {
            store,
            fraud,
            events,
            large_amount_threshold,
        }
    }

    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    /// Credit a single account
    pub async fn top_up(&self, req: TopUpRequest) -> Result<TopUpOutcome, PaymentError> {
        validate_top_up(&req)?;

        // Amount-gated risk check; small credits skip it entirely
        if req.amount > self.large_amount_threshold {
            self.risk_check(req.user_id, req.amount).await?;
        }

        let mut attempt = 0;
        let (transaction_id, balance) = loop {
            attempt += 1;
            match self.top_up_once(&req).await {
                Ok(outcome) => break outcome,
                Err(PaymentError::Conflict) if attempt < MAX_CAS_ATTEMPTS => {
                    tracing::warn!(
                        user_id = req.user_id,
                        attempt,
                        "Top-up hit a version conflict, retrying"
                    );
                }
                Err(e) => return Err(e),
            }
        };

        self.emit(TransactionEvent::new(
            transaction_id,
            req.user_id,
            req.amount,
            EventKind::TopUp,
        ))
        .await;

        tracing::info!(
            user_id = req.user_id,
            amount = %req.amount,
            transaction_id,
            "Top-up completed"
        );

        Ok(TopUpOutcome {
            transaction_id,
            balance,
        })
    }

    /// One atomic top-up attempt; a dropped transaction rolls back
    async fn top_up_once(&self, req: &TopUpRequest) -> Result<(i64, Decimal), PaymentError> {
        let mut tx = self.store.begin().await?;

        let mut balance = LedgerStore::create_if_absent(&mut tx, req.user_id).await?;
        balance.amount += req.amount;
        LedgerStore::save(&mut tx, &balance).await?;

        let record = TransactionRecord::top_up(req.user_id, req.amount, "Balance top-up");
        let transaction_id = LedgerStore::append_transaction(&mut tx, &record).await?;

        tx.commit().await?;

        Ok((transaction_id, balance.amount))
    }

    /// Move funds between two accounts
    ///
    /// `principal_id` is the identity resolved by the external auth service;
    /// it must match the sender.
    pub async fn transfer(
        &self,
        principal_id: i64,
        req: TransferRequest,
    ) -> Result<TransferOutcome, PaymentError> {
        validate_transfer(principal_id, &req)?;

        self.risk_check(req.sender_id, req.amount).await?;

        let mut attempt = 0;
        let (transaction_id, sender_balance) = loop {
            attempt += 1;
            match self.transfer_once(&req).await {
                Ok(outcome) => break outcome,
                Err(PaymentError::Conflict) if attempt < MAX_CAS_ATTEMPTS => {
                    tracing::warn!(
                        sender_id = req.sender_id,
                        recipient_id = req.recipient_id,
                        attempt,
                        "Transfer hit a version conflict, retrying"
                    );
                }
                Err(e) => return Err(e),
            }
        };

        // Post-commit, best effort: the mutation is already durable
        self.emit(TransactionEvent::new(
            transaction_id,
            req.sender_id,
            req.amount,
            EventKind::TransferSent,
        ))
        .await;
        self.emit(TransactionEvent::new(
            transaction_id,
            req.recipient_id,
            req.amount,
            EventKind::TransferReceived,
        ))
        .await;

        tracing::info!(
            sender_id = req.sender_id,
            recipient_id = req.recipient_id,
            amount = %req.amount,
            transaction_id,
            "Transfer completed"
        );

        Ok(TransferOutcome {
            transaction_id,
            sender_balance,
        })
    }

    /// One atomic transfer attempt
    ///
    /// Rows are locked in ascending user_id order regardless of role, so two
    /// concurrent transfers between the same pair in opposite directions
    /// cannot deadlock. Any early return drops the transaction, which rolls
    /// back every write in it.
    async fn transfer_once(&self, req: &TransferRequest) -> Result<(i64, Decimal), PaymentError> {
        let mut tx = self.store.begin().await?;

        let (sender, recipient) = if req.sender_id < req.recipient_id {
            let sender = LedgerStore::load_for_update(&mut tx, req.sender_id)
                .await?
                .ok_or_else(|| PaymentError::NotFound("Sender balance not found".to_string()))?;
            let recipient = LedgerStore::create_if_absent(&mut tx, req.recipient_id).await?;
            (sender, recipient)
        } else {
            let recipient = LedgerStore::create_if_absent(&mut tx, req.recipient_id).await?;
            let sender = LedgerStore::load_for_update(&mut tx, req.sender_id)
                .await?
                .ok_or_else(|| PaymentError::NotFound("Sender balance not found".to_string()))?;
            (sender, recipient)
        };

        if sender.amount < req.amount {
            return Err(PaymentError::InsufficientFunds {
                balance: sender.amount,
                required: req.amount,
            });
        }

        let mut sender = sender;
        let mut recipient = recipient;
        sender.amount -= req.amount;
        recipient.amount += req.amount;

        LedgerStore::save(&mut tx, &sender).await?;
        LedgerStore::save(&mut tx, &recipient).await?;

        let description = req
            .description
            .clone()
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| "Transfer between users".to_string());
        let record = TransactionRecord::transfer(
            req.sender_id,
            req.recipient_id,
            req.amount,
            description,
        );
        let transaction_id = LedgerStore::append_transaction(&mut tx, &record).await?;

        tx.commit().await?;

        Ok((transaction_id, sender.amount))
    }

    /// Current balance for a user
    pub async fn get_balance(&self, user_id: i64) -> Result<Balance, PaymentError> {
        self.store
            .get_balance(user_id)
            .await?
            .ok_or_else(|| PaymentError::NotFound("Balance does not exist".to_string()))
    }

    /// Transaction history for a user, newest first
    pub async fn history(&self, user_id: i64) -> Result<Vec<TransactionRecord>, PaymentError> {
        Ok(self.store.history(user_id).await?)
    }

    /// Consult the risk service and apply the fail-open policy
    ///
    /// A `Suspicious` verdict blocks the action. An unavailable risk service
    /// does not: we log the degraded condition and proceed, by recorded
    /// product decision, rather than blocking legitimate traffic.
    async fn risk_check(&self, user_id: i64, amount: Decimal) -> Result<(), PaymentError> {
        match gate_verdict(self.fraud.check(user_id, amount, None).await) {
            Ok(()) => Ok(()),
            Err(PaymentError::DependencyUnavailable(reason)) => {
                tracing::warn!(user_id, %reason, "Risk service unavailable, failing open");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Publish one lifecycle event; failures are logged, never propagated,
    /// since the financial mutation already committed
    async fn emit(&self, event: TransactionEvent) {
        if let Err(e) = self.events.publish(TOPIC_TRANSACTIONS, &event).await {
            tracing::warn!(
                transaction_id = event.transaction_id,
                user_id = event.user_id,
                "Failed to publish transaction event: {}",
                e
            );
        }
    }
}

/// Map a raw risk-check result onto the error taxonomy
fn gate_verdict(
    result: Result<crate::fraud::FraudVerdict, crate::fraud::FraudCheckError>,
) -> Result<(), PaymentError> {
    match result {
        Ok(verdict) => match verdict.verdict {
            Verdict::Safe => Ok(()),
            Verdict::Suspicious => Err(PaymentError::SuspiciousTransaction {
                score: verdict.score,
            }),
        },
        Err(e) => Err(PaymentError::DependencyUnavailable(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fraud::{FraudCheckError, FraudVerdict};
    use rust_decimal_macros::dec;

    fn transfer_req(sender: i64, recipient: i64, amount: Decimal) -> TransferRequest {
        TransferRequest {
            sender_id: sender,
            recipient_id: recipient,
            amount,
            description: None,
        }
    }

    #[test]
    fn test_validate_transfer_accepts_valid_request() {
        assert!(validate_transfer(1, &transfer_req(1, 2, dec!(100))).is_ok());
    }

    #[test]
    fn test_self_transfer_rejected_regardless_of_balance() {
        let err = validate_transfer(5, &transfer_req(5, 5, dec!(1))).unwrap_err();
        assert!(matches!(err, PaymentError::InvalidInput(_)));
    }

    #[test]
    fn test_non_positive_amount_rejected() {
        for amount in [dec!(0), dec!(-10)] {
            let err = validate_transfer(1, &transfer_req(1, 2, amount)).unwrap_err();
            assert!(matches!(err, PaymentError::InvalidInput(_)));
        }
    }

    #[test]
    fn test_zero_identifier_rejected() {
        let err = validate_transfer(0, &transfer_req(0, 2, dec!(10))).unwrap_err();
        assert!(matches!(err, PaymentError::InvalidInput(_)));
        let err = validate_transfer(1, &transfer_req(1, 0, dec!(10))).unwrap_err();
        assert!(matches!(err, PaymentError::InvalidInput(_)));
    }

    #[test]
    fn test_principal_mismatch_is_unauthorized() {
        let err = validate_transfer(9, &transfer_req(1, 2, dec!(10))).unwrap_err();
        assert!(matches!(err, PaymentError::Unauthorized));
    }

    #[test]
    fn test_validate_top_up() {
        assert!(validate_top_up(&TopUpRequest {
            user_id: 1,
            amount: dec!(50)
        })
        .is_ok());
        assert!(validate_top_up(&TopUpRequest {
            user_id: 0,
            amount: dec!(50)
        })
        .is_err());
        assert!(validate_top_up(&TopUpRequest {
            user_id: 1,
            amount: dec!(0)
        })
        .is_err());
    }

    #[test]
    fn test_gate_verdict_safe_passes() {
        let result = gate_verdict(Ok(FraudVerdict {
            score: 0.0,
            verdict: Verdict::Safe,
        }));
        assert!(result.is_ok());
    }

    #[test]
    fn test_gate_verdict_suspicious_carries_score() {
        let err = gate_verdict(Ok(FraudVerdict {
            score: 7500.0,
            verdict: Verdict::Suspicious,
        }))
        .unwrap_err();
        match err {
            PaymentError::SuspiciousTransaction { score } => assert_eq!(score, 7500.0),
            other => panic!("expected SuspiciousTransaction, got {:?}", other),
        }
    }

    #[test]
    fn test_gate_verdict_unavailable_is_distinct_from_verdict() {
        let err = gate_verdict(Err(FraudCheckError::Unavailable("timeout".to_string())))
            .unwrap_err();
        assert!(matches!(err, PaymentError::DependencyUnavailable(_)));
    }
}
