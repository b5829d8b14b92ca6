//! Service error type mapped onto localized JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::domain::{Language, StockShortage};
use crate::i18n::Msg;

#[derive(Error, Debug)]
pub enum Error {
    #[error("validation failed")]
    Validation { msg: Msg, language: Language },

    #[error("insufficient stock")]
    OutOfStock { shortages: Vec<StockShortage>, language: Language },

    #[error("invalid API key")]
    InvalidApiKey,

    #[error("invalid admin key")]
    InvalidAdminKey,

    #[error("not found")]
    NotFound { msg: Msg, language: Language },

    #[error("customer email missing")]
    MissingEmail { language: Language },

    #[error("email delivery failed")]
    EmailDelivery { language: Language, detail: serde_json::Value },

    #[error("delivery failed")]
    Delivery { msg: Msg, language: Language },

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("template error: {0}")]
    Template(#[from] askama::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Error::Validation { msg, language } => (
                StatusCode::BAD_REQUEST,
                json!({ "success": false, "message": msg.text(language) }),
            ),
            Error::OutOfStock { shortages, language } => (
                StatusCode::BAD_REQUEST,
                json!({
                    "success": false,
                    "message": Msg::StockUnavailable.text(language),
                    "out_of_stock_items": shortages
                        .iter()
                        .map(|s| json!({
                            "id": s.product_id,
                            "name": s.name.get(language),
                            "available": s.available,
                            "requested": s.requested,
                            "message": s.message(language),
                        }))
                        .collect::<Vec<_>>(),
                }),
            ),
            Error::InvalidApiKey => (
                StatusCode::FORBIDDEN,
                json!({ "success": false, "message": Msg::InvalidApiKey.text(Language::En) }),
            ),
            Error::InvalidAdminKey => (
                StatusCode::FORBIDDEN,
                json!({ "success": false, "message": Msg::InvalidAdminKey.text(Language::En) }),
            ),
            Error::NotFound { msg, language } => (
                StatusCode::NOT_FOUND,
                json!({ "success": false, "message": msg.text(language) }),
            ),
            Error::MissingEmail { language } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "success": false, "message": Msg::MissingCustomerEmail.text(language) }),
            ),
            Error::EmailDelivery { language, detail } => (
                StatusCode::BAD_GATEWAY,
                json!({
                    "success": false,
                    "message": Msg::EmailDeliveryFailed.text(language),
                    "failures": detail,
                }),
            ),
            Error::Delivery { msg, language } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "success": false, "message": msg.text(language) }),
            ),
            Error::Storage(err) => {
                tracing::error!(error = %err, "storage failure");
                internal_body()
            }
            Error::Template(err) => {
                tracing::error!(error = %err, "template render failure");
                internal_body()
            }
            Error::Json(err) => {
                tracing::error!(error = %err, "serialization failure");
                internal_body()
            }
            Error::Internal(detail) => {
                tracing::error!(detail, "internal error");
                internal_body()
            }
        };
        (status, Json(body)).into_response()
    }
}

fn internal_body() -> (StatusCode, serde_json::Value) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "success": false, "message": Msg::Internal.text(Language::En) }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let bad_input = Error::Validation { msg: Msg::EmptyCart, language: Language::En };
        assert_eq!(bad_input.into_response().status(), StatusCode::BAD_REQUEST);
        // Delivery failures are the server's fault, not the client's.
        let undelivered = Error::Delivery { msg: Msg::ContactFailed, language: Language::En };
        assert_eq!(undelivered.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
