//! Payment reconciliation ledger, payment sessions, and placed orders.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::JsonFile;
use crate::domain::{Money, Order, OrderDraft};
use crate::error::Result;

/// Reconciliation state of one gateway notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentState {
    Success,
    Failed,
    /// Payment went through but invoice delivery did not; the retry worker
    /// picks these up. The only retryable state.
    EmailFailed,
    #[serde(other)]
    Unknown,
}

impl PaymentState {
    pub fn from_gateway(status: &str) -> Self {
        match status.to_lowercase().as_str() {
            "success" => PaymentState::Success,
            "failed" => PaymentState::Failed,
            "email_failed" => PaymentState::EmailFailed,
            _ => PaymentState::Unknown,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub order_id: String,
    #[serde(default)]
    pub transaction_id: Option<String>,
    pub status: PaymentState,
    pub amount: Money,
    #[serde(default)]
    pub payment_method: Option<String>,
    pub processed_at: DateTime<Utc>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

pub struct PaymentLedger {
    file: JsonFile,
    records: RwLock<Vec<PaymentRecord>>,
}

impl PaymentLedger {
    pub async fn open(dir: &Path) -> Result<Self> {
        let file = JsonFile::new(dir, "payments.json");
        let records = file.load().await?;
        Ok(Self { file, records: RwLock::new(records) })
    }

    /// Webhook idempotency check: has this transaction id been seen before.
    pub async fn is_processed(&self, transaction_id: &str) -> bool {
        if transaction_id.is_empty() {
            return false;
        }
        self.records
            .read()
            .await
            .iter()
            .any(|r| r.transaction_id.as_deref() == Some(transaction_id))
    }

    pub async fn record(&self, record: PaymentRecord) -> Result<()> {
        let mut records = self.records.write().await;
        records.push(record);
        self.file.save(&records).await
    }

    /// Flips the latest `email_failed` record for `order_id` (or the given
    /// transaction id) to `Success` after a retried delivery lands. Terminal
    /// gateway outcomes are never rewritten; when no retryable record
    /// matches, a fresh `Success` record is appended instead.
    pub async fn mark_delivered(
        &self,
        order_id: &str,
        transaction_id: Option<&str>,
        amount: Money,
    ) -> Result<()> {
        let mut records = self.records.write().await;
        let found = records.iter_mut().rev().find(|r| {
            r.status == PaymentState::EmailFailed
                && ((transaction_id.is_some() && r.transaction_id.as_deref() == transaction_id)
                    || r.order_id == order_id)
        });
        match found {
            Some(record) => {
                record.status = PaymentState::Success;
                record.processed_at = Utc::now();
            }
            None => records.push(PaymentRecord {
                order_id: order_id.to_string(),
                transaction_id: transaction_id.map(str::to_string),
                status: PaymentState::Success,
                amount,
                payment_method: None,
                processed_at: Utc::now(),
                session_id: None,
                note: None,
            }),
        }
        self.file.save(&records).await
    }

    /// Most recent `email_failed` records first, capped at `limit`.
    pub async fn email_failed(&self, limit: usize) -> Vec<PaymentRecord> {
        self.records
            .read()
            .await
            .iter()
            .rev()
            .filter(|r| r.status == PaymentState::EmailFailed)
            .take(limit)
            .cloned()
            .collect()
    }

    /// Latest record for an order id, if any.
    pub async fn latest_for_order(&self, order_id: &str) -> Option<PaymentRecord> {
        self.records
            .read()
            .await
            .iter()
            .rev()
            .find(|r| r.order_id == order_id)
            .cloned()
    }

    pub async fn count(&self) -> usize {
        self.records.read().await.len()
    }
}

/// Ephemeral hosted-gateway session: id-to-order mapping plus the order draft
/// that lets the webhook rebuild an invoice after the redirect.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PaymentSession {
    pub session_id: String,
    pub order_id: String,
    pub amount: Money,
    #[serde(default)]
    pub return_url: Option<String>,
    #[serde(default)]
    pub order_data: Option<OrderDraft>,
    pub created_at: DateTime<Utc>,
}

/// Session ids carry an `MSH` prefix, base36 time, and a random suffix.
pub fn generate_session_id() -> String {
    let mut millis = Utc::now().timestamp_millis() as u64;
    let mut base36 = String::new();
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    while millis > 0 {
        base36.insert(0, DIGITS[(millis % 36) as usize] as char);
        millis /= 36;
    }
    format!("MSH{}{:06x}", base36, rand::random::<u32>() & 0xFF_FFFF)
}

pub struct SessionStore {
    file: JsonFile,
    sessions: RwLock<Vec<PaymentSession>>,
}

impl SessionStore {
    pub async fn open(dir: &Path) -> Result<Self> {
        let file = JsonFile::new(dir, "sessions.json");
        let sessions = file.load().await?;
        Ok(Self { file, sessions: RwLock::new(sessions) })
    }

    pub async fn insert(&self, session: PaymentSession) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        sessions.push(session);
        self.file.save(&sessions).await
    }

    pub async fn get(&self, session_id: &str) -> Option<PaymentSession> {
        self.sessions
            .read()
            .await
            .iter()
            .find(|s| s.session_id == session_id)
            .cloned()
    }

    /// Latest session created for an order id.
    pub async fn latest_for_order(&self, order_id: &str) -> Option<PaymentSession> {
        self.sessions
            .read()
            .await
            .iter()
            .rev()
            .find(|s| s.order_id == order_id)
            .cloned()
    }
}

/// Orders accepted at checkout.
pub struct OrderStore {
    file: JsonFile,
    orders: RwLock<Vec<Order>>,
}

impl OrderStore {
    pub async fn open(dir: &Path) -> Result<Self> {
        let file = JsonFile::new(dir, "orders.json");
        let orders = file.load().await?;
        Ok(Self { file, orders: RwLock::new(orders) })
    }

    pub async fn insert(&self, order: Order) -> Result<()> {
        let mut orders = self.orders.write().await;
        orders.push(order);
        self.file.save(&orders).await
    }

    pub async fn get(&self, order_id: &str) -> Option<Order> {
        self.orders.read().await.iter().find(|o| o.id == order_id).cloned()
    }

    pub async fn list(&self) -> Vec<Order> {
        self.orders.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Money;

    fn record(order: &str, txn: &str, status: PaymentState) -> PaymentRecord {
        PaymentRecord {
            order_id: order.to_string(),
            transaction_id: Some(txn.to_string()),
            status,
            amount: Money::from_major(100),
            payment_method: Some("mock".to_string()),
            processed_at: Utc::now(),
            session_id: None,
            note: None,
        }
    }

    #[tokio::test]
    async fn test_idempotency_by_transaction_id() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = PaymentLedger::open(dir.path()).await.unwrap();
        assert!(!ledger.is_processed("TXN1").await);
        ledger.record(record("ORD1", "TXN1", PaymentState::Success)).await.unwrap();
        assert!(ledger.is_processed("TXN1").await);
        assert!(!ledger.is_processed("TXN2").await);
        assert!(!ledger.is_processed("").await);
    }

    #[tokio::test]
    async fn test_email_failed_listing_is_recent_first() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = PaymentLedger::open(dir.path()).await.unwrap();
        ledger.record(record("ORD1", "T1", PaymentState::EmailFailed)).await.unwrap();
        ledger.record(record("ORD2", "T2", PaymentState::Success)).await.unwrap();
        ledger.record(record("ORD3", "T3", PaymentState::EmailFailed)).await.unwrap();
        let failed = ledger.email_failed(10).await;
        assert_eq!(failed.len(), 2);
        assert_eq!(failed[0].order_id, "ORD3");
    }

    #[tokio::test]
    async fn test_mark_delivered_flips_status() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = PaymentLedger::open(dir.path()).await.unwrap();
        ledger.record(record("ORD1", "T1", PaymentState::EmailFailed)).await.unwrap();
        ledger.mark_delivered("ORD1", Some("T1"), Money::from_major(100)).await.unwrap();
        assert!(ledger.email_failed(10).await.is_empty());
    }

    #[tokio::test]
    async fn test_mark_delivered_leaves_failed_records_alone() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = PaymentLedger::open(dir.path()).await.unwrap();
        ledger.record(record("ORD1", "T1", PaymentState::Failed)).await.unwrap();
        ledger.mark_delivered("ORD1", Some("T1"), Money::from_major(100)).await.unwrap();
        let records = ledger.records.read().await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].status, PaymentState::Failed);
        assert_eq!(records[1].status, PaymentState::Success);
    }

    #[tokio::test]
    async fn test_unknown_status_round_trips() {
        let json = r#"[{"order_id":"O","transaction_id":"T","status":"chargeback",
            "amount":10.0,"processed_at":"2026-01-01T00:00:00Z"}]"#;
        let records: Vec<PaymentRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(records[0].status, PaymentState::Unknown);
    }

    #[test]
    fn test_session_id_shape() {
        let id = generate_session_id();
        assert!(id.starts_with("MSH"));
        assert!(id.len() > 10);
        assert_ne!(generate_session_id(), id);
    }
}
