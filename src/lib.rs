//! Abaya Boutique storefront service.
//!
//! Bilingual (Arabic/English) e-commerce backend: catalog with atomic stock
//! reservation, cash-on-delivery checkout, a hosted mock payment gateway
//! with idempotent webhook processing, invoice email delivery with retries,
//! cookie-consent auditing, and a rule-based shop assistant.

pub mod api;
pub mod chatbot;
pub mod checkout;
pub mod config;
pub mod domain;
pub mod error;
pub mod i18n;
pub mod mail;
pub mod state;
pub mod store;
pub mod worker;

pub use config::Config;
pub use error::{Error, Result};
pub use state::AppState;
