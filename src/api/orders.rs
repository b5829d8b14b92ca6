//! Cash-on-delivery checkout endpoint.

use axum::extract::State;
use axum::Json;
use serde_json::json;

use crate::checkout;
use crate::domain::OrderDraft;
use crate::error::Result;
use crate::i18n::Msg;
use crate::state::AppState;

pub async fn send_order(
    State(state): State<AppState>,
    Json(draft): Json<OrderDraft>,
) -> Result<Json<serde_json::Value>> {
    let language = draft.language;
    let order = checkout::place_order(&state, draft).await?;
    Ok(Json(json!({
        "success": true,
        "message": Msg::OrderReceived.text(language),
        "order_id": order.id,
        "totals": order.totals,
    })))
}
