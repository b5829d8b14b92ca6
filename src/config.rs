//! Environment-driven configuration.

use std::path::PathBuf;

use crate::domain::{Bilingual, Language};

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub data_dir: PathBuf,
    /// Brevo transactional API key. Empty means outbox-only: invoices are
    /// written to disk and no delivery is attempted.
    pub brevo_api_key: String,
    pub mail_from: String,
    pub owner_email: String,
    pub support_phone: String,
    pub business_name: Bilingual,
    pub payment_api_key: String,
    /// When set, `/admin/*` and catalog mutations require this `x-admin-key`.
    pub admin_key: Option<String>,
    pub email_retry_enabled: bool,
    pub email_retry_interval_secs: u64,
    /// Optional `sqlite:` URL enabling the audit mirror.
    pub database_url: Option<String>,
    pub production: bool,
}

impl Config {
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3000);
        let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string());
        let owner_email =
            std::env::var("OWNER_EMAIL").unwrap_or_else(|_| "orders@example.com".to_string());
        Self {
            port,
            data_dir: PathBuf::from(data_dir),
            brevo_api_key: std::env::var("BREVO_API_KEY").unwrap_or_default(),
            mail_from: std::env::var("MAIL_FROM").unwrap_or_else(|_| owner_email.clone()),
            owner_email,
            support_phone: std::env::var("SUPPORT_PHONE")
                .unwrap_or_else(|_| "0500000000".to_string()),
            business_name: Bilingual::new(
                std::env::var("BUSINESS_NAME_AR").unwrap_or_else(|_| "بوتيك العباية".to_string()),
                std::env::var("BUSINESS_NAME_EN").unwrap_or_else(|_| "Abaya Boutique".to_string()),
            ),
            payment_api_key: std::env::var("PAYMENT_API_KEY")
                .unwrap_or_else(|_| "devkey".to_string()),
            admin_key: std::env::var("ADMIN_KEY").ok().filter(|k| !k.is_empty()),
            email_retry_enabled: std::env::var("EMAIL_RETRY_ENABLED")
                .map(|v| v != "false")
                .unwrap_or(true),
            email_retry_interval_secs: std::env::var("EMAIL_RETRY_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(300),
            database_url: std::env::var("DATABASE_URL").ok().filter(|u| !u.is_empty()),
            production: std::env::var("APP_ENV").map(|v| v == "production").unwrap_or(false),
        }
    }

    pub fn business_name(&self, language: Language) -> &str {
        self.business_name.get(language)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        // from_env reads the process environment; defaults apply for unset keys.
        let cfg = Config::from_env();
        assert!(cfg.email_retry_interval_secs > 0);
        assert!(!cfg.payment_api_key.is_empty());
    }
}
