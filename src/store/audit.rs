//! Optional SQLite audit mirror.
//!
//! The JSON files remain the source of truth; when `DATABASE_URL` points at a
//! sqlite database, payments, sessions, consents, and email errors are also
//! inserted there for ad-hoc querying. Mirror failures are logged and never
//! fail the request path.

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};

use super::{ConsentRecord, PaymentRecord, PaymentSession};
use crate::error::{Error, Result};

pub struct AuditMirror {
    pool: SqlitePool,
}

impl AuditMirror {
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| Error::Internal(format!("invalid DATABASE_URL: {e}")))?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| Error::Internal(format!("sqlite connect failed: {e}")))?;
        let mirror = Self { pool };
        mirror.init().await?;
        Ok(mirror)
    }

    async fn init(&self) -> Result<()> {
        let schema = [
            "CREATE TABLE IF NOT EXISTS payments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                order_id TEXT,
                transaction_id TEXT,
                status TEXT,
                amount TEXT,
                payment_method TEXT,
                processed_at TEXT,
                raw TEXT
            )",
            "CREATE TABLE IF NOT EXISTS sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT UNIQUE,
                order_id TEXT,
                amount TEXT,
                return_url TEXT,
                order_data TEXT,
                created_at TEXT
            )",
            "CREATE TABLE IF NOT EXISTS consents (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                payload TEXT,
                received_at TEXT
            )",
            "CREATE TABLE IF NOT EXISTS email_errors (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                order_id TEXT,
                transaction_id TEXT,
                error TEXT,
                created_at TEXT
            )",
        ];
        for stmt in schema {
            sqlx::query(stmt)
                .execute(&self.pool)
                .await
                .map_err(|e| Error::Internal(format!("sqlite schema: {e}")))?;
        }
        Ok(())
    }

    pub async fn mirror_payment(&self, record: &PaymentRecord) {
        let raw = serde_json::to_string(record).unwrap_or_default();
        let status = serde_json::to_value(record.status)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        let result = sqlx::query(
            "INSERT INTO payments (order_id, transaction_id, status, amount, payment_method, processed_at, raw)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&record.order_id)
        .bind(&record.transaction_id)
        .bind(status)
        .bind(record.amount.to_string())
        .bind(&record.payment_method)
        .bind(record.processed_at.to_rfc3339())
        .bind(raw)
        .execute(&self.pool)
        .await;
        if let Err(err) = result {
            tracing::warn!(error = %err, order_id = %record.order_id, "payment mirror write failed");
        }
    }

    pub async fn mirror_session(&self, session: &PaymentSession) {
        let order_data = session
            .order_data
            .as_ref()
            .and_then(|d| serde_json::to_string(d).ok());
        let result = sqlx::query(
            "INSERT OR REPLACE INTO sessions (session_id, order_id, amount, return_url, order_data, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&session.session_id)
        .bind(&session.order_id)
        .bind(session.amount.to_string())
        .bind(&session.return_url)
        .bind(order_data)
        .bind(session.created_at.to_rfc3339())
        .execute(&self.pool)
        .await;
        if let Err(err) = result {
            tracing::warn!(error = %err, session_id = %session.session_id, "session mirror write failed");
        }
    }

    pub async fn mirror_consent(&self, record: &ConsentRecord) {
        let payload = serde_json::to_string(record).unwrap_or_default();
        let result = sqlx::query("INSERT INTO consents (payload, received_at) VALUES (?1, ?2)")
            .bind(payload)
            .bind(record.received_at.to_rfc3339())
            .execute(&self.pool)
            .await;
        if let Err(err) = result {
            tracing::warn!(error = %err, "consent mirror write failed");
        }
    }

    pub async fn mirror_email_error(&self, order_id: &str, transaction_id: Option<&str>, error: &str) {
        let result = sqlx::query(
            "INSERT INTO email_errors (order_id, transaction_id, error, created_at)
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(order_id)
        .bind(transaction_id)
        .bind(error)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await;
        if let Err(err) = result {
            tracing::warn!(error = %err, order_id, "email error mirror write failed");
        }
    }

    /// `email_failed` rows, newest first. Used by the admin listing when the
    /// mirror is available.
    pub async fn failed_payments(&self, limit: i64) -> Result<Vec<serde_json::Value>> {
        let rows = sqlx::query(
            "SELECT order_id, transaction_id, amount, processed_at
             FROM payments WHERE status = 'email_failed'
             ORDER BY id DESC LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Error::Internal(format!("sqlite query: {e}")))?;
        Ok(rows
            .into_iter()
            .map(|row| {
                serde_json::json!({
                    "order_id": row.get::<Option<String>, _>(0),
                    "transaction_id": row.get::<Option<String>, _>(1),
                    "amount": row.get::<Option<String>, _>(2),
                    "processed_at": row.get::<Option<String>, _>(3),
                    "status": "email_failed",
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Money;
    use crate::store::PaymentState;

    #[tokio::test]
    async fn test_mirror_and_query_failed_payments() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}", dir.path().join("audit.db").display());
        let mirror = AuditMirror::connect(&url).await.unwrap();

        let record = PaymentRecord {
            order_id: "ORD9".to_string(),
            transaction_id: Some("TXN9".to_string()),
            status: PaymentState::EmailFailed,
            amount: Money::from_major(345),
            payment_method: Some("mock".to_string()),
            processed_at: chrono::Utc::now(),
            session_id: None,
            note: None,
        };
        mirror.mirror_payment(&record).await;

        let failed = mirror.failed_payments(10).await.unwrap();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0]["order_id"], "ORD9");
    }
}
