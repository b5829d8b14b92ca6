//! Background retry worker for undelivered invoices.
//!
//! Runs one pass at startup and then on a fixed interval, picking up the
//! newest `email_failed` ledger entries and replaying delivery through the
//! same path the webhook uses.

use std::time::Duration;

use crate::checkout;
use crate::state::AppState;

/// Upper bound on ledger entries retried per pass.
pub const RETRY_BATCH_LIMIT: usize = 20;

pub fn spawn(state: AppState) {
    if !state.config.email_retry_enabled {
        tracing::info!("email retry worker disabled");
        return;
    }
    let interval = Duration::from_secs(state.config.email_retry_interval_secs.max(1));
    tokio::spawn(async move {
        tracing::info!(interval_secs = interval.as_secs(), "email retry worker started");
        let mut ticker = tokio::time::interval(interval);
        loop {
            // First tick fires immediately, giving the startup pass.
            ticker.tick().await;
            run_once(&state).await;
        }
    });
}

/// One retry pass. Each failure is retried independently; an order that
/// still cannot be delivered stays in the ledger for the next pass.
pub async fn run_once(state: &AppState) -> usize {
    let failed = state.payments.email_failed(RETRY_BATCH_LIMIT).await;
    if failed.is_empty() {
        return 0;
    }
    tracing::info!(count = failed.len(), "retrying failed invoice deliveries");
    let mut delivered = 0;
    for record in failed {
        match checkout::resend_invoice(state, &record.order_id).await {
            Ok(()) => {
                tracing::info!(order_id = %record.order_id, "invoice delivered on retry");
                delivered += 1;
            }
            Err(err) => {
                tracing::warn!(order_id = %record.order_id, error = %err, "retry failed");
            }
        }
    }
    delivered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Money;
    use crate::store::{PaymentRecord, PaymentState};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_run_once_with_empty_ledger() {
        let dir = tempdir().unwrap();
        let state = AppState::outbox(dir.path()).await;
        assert_eq!(run_once(&state).await, 0);
    }

    #[tokio::test]
    async fn test_run_once_skips_unresolvable_orders() {
        let dir = tempdir().unwrap();
        let state = AppState::outbox(dir.path()).await;
        state
            .payments
            .record(PaymentRecord {
                order_id: "ORD-GONE".into(),
                transaction_id: Some("TXN-X".into()),
                status: PaymentState::EmailFailed,
                amount: Money::from_major(299),
                payment_method: None,
                processed_at: chrono::Utc::now(),
                session_id: None,
                note: None,
            })
            .await
            .unwrap();
        // No order or session to rebuild from; the entry stays failed.
        assert_eq!(run_once(&state).await, 0);
        assert_eq!(state.payments.email_failed(10).await.len(), 1);
    }
}
