//! Hosted mock gateway and payment webhook endpoints.
//!
//! `/create-payment-session` hands out a session id plus the hosted page
//! URL; the page posts back to `/mock-gateway-callback`, which runs the same
//! webhook pipeline in-process and then redirects to the session's
//! return_url. External gateways hit `/payment-webhook` directly with the
//! shared API key.

use std::collections::HashMap;

use askama::Template;
use axum::extract::{Path, Query, State};
use axum::http::header::HOST;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::{Form, Json};
use serde::Deserialize;
use serde_json::json;

use crate::checkout::{self, WebhookOutcome, WebhookPayload};
use crate::domain::{Language, Money, OrderDraft};
use crate::error::{Error, Result};
use crate::i18n::Msg;
use crate::state::AppState;
use crate::store::{generate_session_id, PaymentSession};

#[derive(Debug, Deserialize)]
pub struct CreateSessionBody {
    #[serde(default)]
    pub order_id: String,
    pub amount: Option<Money>,
    #[serde(default)]
    pub return_url: Option<String>,
    #[serde(default)]
    pub order_data: Option<OrderDraft>,
}

pub async fn create_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateSessionBody>,
) -> Result<Json<serde_json::Value>> {
    let amount = match body.amount {
        Some(amount) if !body.order_id.trim().is_empty() => amount,
        _ => {
            return Err(Error::Validation {
                msg: Msg::SessionFieldsRequired,
                language: Language::default(),
            })
        }
    };

    let session = PaymentSession {
        session_id: generate_session_id(),
        order_id: body.order_id,
        amount,
        return_url: body.return_url,
        order_data: body.order_data,
        created_at: chrono::Utc::now(),
    };
    if let Some(audit) = &state.audit {
        audit.mirror_session(&session).await;
    }
    state.sessions.insert(session.clone()).await?;
    tracing::info!(session_id = %session.session_id, order_id = %session.order_id, "payment session created");

    let path = format!("/payment-hosted-mock/{}", session.session_id);
    let url = match headers.get(HOST).and_then(|h| h.to_str().ok()) {
        Some(host) => format!("http://{host}{path}"),
        None => path,
    };
    Ok(Json(json!({ "success": true, "session_id": session.session_id, "url": url })))
}

#[derive(Template)]
#[template(path = "gateway_checkout.html")]
struct GatewayCheckout {
    session_id: String,
    order_id: String,
    amount: String,
    amount_display: String,
    txn_success: String,
    txn_fail: String,
}

pub async fn hosted_page(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Html<String>> {
    let session = state.sessions.get(&session_id).await;
    // The hidden form fields carry the bare decimal; the callback parses
    // `amount` as a number, so the currency marker stays display-only.
    let (order_id, amount, amount_display) = match &session {
        Some(s) => (s.order_id.clone(), s.amount.to_string(), s.amount.display(Language::En)),
        None => ("unknown".to_string(), "0".to_string(), "0.00 SAR".to_string()),
    };
    let base = format!("MOCKTXN{}", chrono::Utc::now().timestamp_millis());
    let page = GatewayCheckout {
        session_id,
        order_id,
        amount,
        amount_display,
        txn_success: base.clone(),
        txn_fail: format!("{base}FAIL"),
    };
    Ok(Html(page.render()?))
}

#[derive(Template)]
#[template(path = "gateway_result.html")]
struct GatewayResult {
    heading: String,
    detail: String,
    transaction_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CallbackForm {
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub order_id: String,
    pub amount: Option<Money>,
    #[serde(default)]
    pub transaction_id: String,
    #[serde(default)]
    pub status: String,
}

pub async fn gateway_callback(
    State(state): State<AppState>,
    Form(form): Form<CallbackForm>,
) -> Result<Response> {
    let payload = WebhookPayload {
        order_id: form.order_id,
        transaction_id: form.transaction_id.clone(),
        status: form.status.clone(),
        amount: form.amount,
        session_id: Some(form.session_id.clone()),
        payment_method: Some("mock".to_string()),
        order_data: None,
    };

    match checkout::process_webhook(&state, payload).await {
        Ok(_) => {}
        // Payment recorded but the invoice never left; show the customer a
        // page instead of redirecting as if everything worked.
        Err(Error::EmailDelivery { .. } | Error::MissingEmail { .. }) => {
            let page = GatewayResult {
                heading: "Payment processed but invoice delivery failed".to_string(),
                detail: "We could not send the invoice by email. Our team will retry automatically."
                    .to_string(),
                transaction_id: form.transaction_id,
            };
            return Ok((StatusCode::BAD_GATEWAY, Html(page.render()?)).into_response());
        }
        Err(err) => return Err(err),
    }

    if let Some(return_url) = state
        .sessions
        .get(&form.session_id)
        .await
        .and_then(|s| s.return_url)
    {
        let sep = if return_url.contains('?') { '&' } else { '?' };
        let target = format!(
            "{return_url}{sep}transaction_id={}&status={}",
            form.transaction_id, form.status
        );
        return Ok(Redirect::to(&target).into_response());
    }

    let page = GatewayResult {
        heading: format!("Payment {}", form.status),
        detail: String::new(),
        transaction_id: form.transaction_id,
    };
    Ok(Html(page.render()?).into_response())
}

pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    Json(payload): Json<WebhookPayload>,
) -> Result<Json<serde_json::Value>> {
    let provided = headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .or_else(|| query.get("key").map(String::as_str));
    if provided != Some(state.config.payment_api_key.as_str()) {
        return Err(Error::InvalidApiKey);
    }

    match checkout::process_webhook(&state, payload).await? {
        WebhookOutcome::Duplicate => {
            Ok(Json(json!({ "success": true, "duplicate": true })))
        }
        WebhookOutcome::GatewayFailure => {
            Ok(Json(json!({ "success": true, "message": "status recorded" })))
        }
        WebhookOutcome::Delivered { order_id } => {
            Ok(Json(json!({ "success": true, "order_id": order_id })))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ResendBody {
    #[serde(default)]
    pub order_id: String,
}

pub async fn resend_invoice(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ResendBody>,
) -> Result<Json<serde_json::Value>> {
    crate::api::require_admin(&state, &headers)?;
    if body.order_id.trim().is_empty() {
        return Err(Error::Validation {
            msg: Msg::WebhookMissingFields,
            language: Language::default(),
        });
    }
    checkout::resend_invoice(&state, &body.order_id).await?;
    Ok(Json(json!({ "success": true, "order_id": body.order_id })))
}
