//! Shop assistant endpoint.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::chatbot::{self, ChatReply};
use crate::domain::Language;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub language: Language,
}

pub async fn respond(
    State(state): State<AppState>,
    Json(body): Json<ChatBody>,
) -> Json<ChatReply> {
    let products = state.catalog.list().await;
    Json(chatbot::respond(&body.message, &products, body.language))
}
