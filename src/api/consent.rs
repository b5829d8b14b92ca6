//! Cookie-consent endpoints.
//!
//! `/log-consent` appends to the audit trail; `/set-consent-cookie`
//! additionally sets the consent cookie server-side so the next page load
//! can skip the banner. The cookie is deliberately not HttpOnly, the banner
//! script reads it back.

use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::domain::Language;
use crate::error::{Error, Result};
use crate::i18n::Msg;
use crate::state::AppState;
use crate::store::ConsentFlags;

pub const CONSENT_COOKIE: &str = "cookie_consent";
const ONE_YEAR_SECS: u64 = 365 * 24 * 60 * 60;

#[derive(Debug, Deserialize)]
pub struct ConsentBody {
    pub consent: Option<ConsentFlags>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

pub async fn log(
    State(state): State<AppState>,
    Json(body): Json<ConsentBody>,
) -> Result<Json<serde_json::Value>> {
    let flags = body.consent.ok_or(Error::Validation {
        msg: Msg::ConsentMissing,
        language: Language::default(),
    })?;
    let record = state
        .consents
        .append(flags, body.timestamp, body.source.as_deref())
        .await?;
    if let Some(audit) = &state.audit {
        audit.mirror_consent(&record).await;
    }
    Ok(Json(json!({ "success": true })))
}

pub async fn set_cookie(
    State(state): State<AppState>,
    Json(body): Json<ConsentBody>,
) -> Result<(HeaderMap, Json<serde_json::Value>)> {
    let flags = body.consent.ok_or(Error::Validation {
        msg: Msg::ConsentMissing,
        language: Language::default(),
    })?;
    let record = state
        .consents
        .append(flags, body.timestamp, Some("cookie-endpoint"))
        .await?;
    if let Some(audit) = &state.audit {
        audit.mirror_consent(&record).await;
    }

    let value = cookie_encode(
        &json!({ "consent": flags, "timestamp": record.received_at.to_rfc3339() }).to_string(),
    );
    let mut cookie =
        format!("{CONSENT_COOKIE}={value}; Max-Age={ONE_YEAR_SECS}; Path=/; SameSite=Lax");
    if state.config.production {
        cookie.push_str("; Secure");
    }
    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, cookie.parse().map_err(|_| Error::Internal("cookie header".into()))?);
    Ok((headers, Json(json!({ "success": true }))))
}

/// Percent-encodes everything outside the unreserved set, which keeps the
/// JSON payload valid inside a cookie value.
fn cookie_encode(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
