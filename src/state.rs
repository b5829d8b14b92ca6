//! Shared application state handed to every handler.

use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::mail::MailService;
use crate::store::{
    AuditMirror, CatalogStore, ConsentStore, OrderStore, PaymentLedger, SessionStore,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub catalog: Arc<CatalogStore>,
    pub orders: Arc<OrderStore>,
    pub sessions: Arc<SessionStore>,
    pub payments: Arc<PaymentLedger>,
    pub consents: Arc<ConsentStore>,
    pub audit: Option<Arc<AuditMirror>>,
    pub mail: Arc<MailService>,
}

impl AppState {
    /// Opens every store under `config.data_dir` and wires the optional
    /// sqlite audit mirror. The mirror is best effort; a connection failure
    /// logs and the service runs without it.
    pub async fn init(config: Config) -> Result<Self> {
        let data_dir = config.data_dir.clone();
        let audit = match config.database_url.as_deref() {
            Some(url) => match AuditMirror::connect(url).await {
                Ok(mirror) => Some(Arc::new(mirror)),
                Err(err) => {
                    tracing::warn!(error = %err, "audit mirror unavailable, continuing without it");
                    None
                }
            },
            None => None,
        };
        let mail = Arc::new(MailService::from_config(&config));
        Ok(Self {
            config: Arc::new(config),
            catalog: Arc::new(CatalogStore::open(&data_dir).await?),
            orders: Arc::new(OrderStore::open(&data_dir).await?),
            sessions: Arc::new(SessionStore::open(&data_dir).await?),
            payments: Arc::new(PaymentLedger::open(&data_dir).await?),
            consents: Arc::new(ConsentStore::open(&data_dir).await?),
            audit,
            mail,
        })
    }

    /// State against a scratch directory with outbox-only mail. Used by the
    /// integration tests; no network, no audit mirror.
    pub async fn outbox(dir: &std::path::Path) -> Self {
        let mut config = Config::from_env();
        config.data_dir = dir.to_path_buf();
        config.admin_key = None;
        config.database_url = None;
        let mail = Arc::new(MailService::outbox(dir, "shop@example.com", "owner@example.com"));
        Self {
            config: Arc::new(config),
            catalog: Arc::new(CatalogStore::open(dir).await.unwrap()),
            orders: Arc::new(OrderStore::open(dir).await.unwrap()),
            sessions: Arc::new(SessionStore::open(dir).await.unwrap()),
            payments: Arc::new(PaymentLedger::open(dir).await.unwrap()),
            consents: Arc::new(ConsentStore::open(dir).await.unwrap()),
            audit: None,
            mail,
        }
    }
}
