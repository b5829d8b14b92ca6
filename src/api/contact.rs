//! Contact form endpoint.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::checkout;
use crate::domain::Language;
use crate::error::Result;
use crate::i18n::Msg;
use crate::mail::render::ContactMessage;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ContactBody {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub language: Language,
}

pub async fn send_contact(
    State(state): State<AppState>,
    Json(body): Json<ContactBody>,
) -> Result<Json<serde_json::Value>> {
    let msg = ContactMessage {
        name: &body.name,
        email: &body.email,
        phone: &body.phone,
        subject: &body.subject,
        message: &body.message,
    };
    checkout::send_contact(&state, &msg, body.language).await?;
    Ok(Json(json!({
        "success": true,
        "message": Msg::ContactSent.text(body.language),
    })))
}
