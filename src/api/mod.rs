//! HTTP surface.
//!
//! Route paths match what the storefront and the admin app already call, so
//! the handlers are grouped by caller: public catalog and chat, checkout,
//! the mock gateway trio, consent, and the admin endpoints.

mod admin;
mod chat;
mod consent;
mod contact;
mod orders;
mod payments;
mod products;

use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::{Error, Result};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/products", get(products::list).post(products::create))
        .route(
            "/api/products/:id",
            get(products::get_one).put(products::update).delete(products::remove),
        )
        .route("/api/chat", post(chat::respond))
        .route("/send-order", post(orders::send_order))
        .route("/send-contact", post(contact::send_contact))
        .route("/create-payment-session", post(payments::create_session))
        .route("/payment-hosted-mock/:session_id", get(payments::hosted_page))
        .route("/mock-gateway-callback", post(payments::gateway_callback))
        .route("/payment-webhook", post(payments::webhook))
        .route("/resend-invoice", post(payments::resend_invoice))
        .route("/log-consent", post(consent::log))
        .route("/set-consent-cookie", post(consent::set_cookie))
        .route("/admin/failed-payments", get(admin::failed_payments))
        .route("/admin/retry-failed-emails", post(admin::retry_failed_emails))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "ok": true, "time": chrono::Utc::now().to_rfc3339() }))
}

/// Admin guard: only enforced once ADMIN_KEY is configured, so local setups
/// keep working without one.
fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<()> {
    match state.config.admin_key.as_deref() {
        Some(expected) => {
            let provided = headers.get("x-admin-key").and_then(|v| v.to_str().ok());
            if provided == Some(expected) {
                Ok(())
            } else {
                Err(Error::InvalidAdminKey)
            }
        }
        None => Ok(()),
    }
}
