//! Cookie-consent audit trail.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::JsonFile;
use crate::error::Result;

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ConsentFlags {
    pub necessary: bool,
    #[serde(default)]
    pub analytics: bool,
    #[serde(default)]
    pub marketing: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConsentRecord {
    pub consent: ConsentFlags,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    pub received_at: DateTime<Utc>,
}

pub struct ConsentStore {
    file: JsonFile,
    records: RwLock<Vec<ConsentRecord>>,
}

impl ConsentStore {
    pub async fn open(dir: &Path) -> Result<Self> {
        let file = JsonFile::new(dir, "consents.json");
        let records = file.load().await?;
        Ok(Self { file, records: RwLock::new(records) })
    }

    pub async fn append(
        &self,
        consent: ConsentFlags,
        timestamp: Option<String>,
        source: Option<&str>,
    ) -> Result<ConsentRecord> {
        let record = ConsentRecord {
            consent,
            timestamp,
            source: source.map(str::to_string),
            received_at: Utc::now(),
        };
        let mut records = self.records.write().await;
        records.push(record.clone());
        self.file.save(&records).await?;
        Ok(record)
    }

    pub async fn count(&self) -> usize {
        self.records.read().await.len()
    }
}
