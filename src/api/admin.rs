//! Admin endpoints for failed-invoice triage.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::api::require_admin;
use crate::checkout;
use crate::error::Result;
use crate::state::AppState;
use crate::worker;

const LIST_LIMIT: usize = 200;

/// Lists `email_failed` ledger entries, preferring the sqlite mirror when
/// configured so operators see the same rows their dashboards query.
pub async fn failed_payments(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>> {
    require_admin(&state, &headers)?;
    if let Some(audit) = &state.audit {
        let rows = audit.failed_payments(LIST_LIMIT as i64).await?;
        return Ok(Json(json!(rows)));
    }
    let records = state.payments.email_failed(LIST_LIMIT).await;
    Ok(Json(json!(records)))
}

#[derive(Debug, Default, Deserialize)]
pub struct RetryBody {
    #[serde(default)]
    pub order_id: Option<String>,
}

pub async fn retry_failed_emails(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<RetryBody>,
) -> Result<Json<serde_json::Value>> {
    require_admin(&state, &headers)?;
    let mut targets = state.payments.email_failed(worker::RETRY_BATCH_LIMIT).await;
    if let Some(order_id) = &body.order_id {
        targets.retain(|r| &r.order_id == order_id);
    }
    if targets.is_empty() {
        return Ok(Json(json!({
            "success": true,
            "message": "No email_failed payments found",
        })));
    }

    let mut results = Vec::with_capacity(targets.len());
    for record in &targets {
        let outcome = checkout::resend_invoice(&state, &record.order_id).await;
        results.push(json!({
            "order_id": record.order_id,
            "transaction_id": record.transaction_id,
            "success": outcome.is_ok(),
        }));
    }
    Ok(Json(json!({ "success": true, "attempted": results.len(), "results": results })))
}
