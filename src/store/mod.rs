//! JSON-file-backed stores.
//!
//! Each store keeps its records in memory behind a `tokio::sync::RwLock` and
//! rewrites its file in full on mutation (temp file + rename, so a crash
//! mid-write never leaves a torn file). The file layout under `DATA_DIR`
//! matches what operators already expect: `products.json`, `orders.json`,
//! `sessions.json`, `payments.json`, `consents.json`.

pub mod audit;
pub mod catalog;
pub mod consent;
pub mod ledger;

pub use audit::AuditMirror;
pub use catalog::{seed_products, CatalogStore, ReserveOutcome};
pub use consent::{ConsentFlags, ConsentRecord, ConsentStore};
pub use ledger::{
    generate_session_id, OrderStore, PaymentLedger, PaymentRecord, PaymentSession, PaymentState,
    SessionStore,
};

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

/// One JSON array on disk.
#[derive(Debug)]
pub(crate) struct JsonFile {
    path: PathBuf,
}

impl JsonFile {
    pub(crate) fn new(dir: &Path, name: &str) -> Self {
        Self { path: dir.join(name) }
    }

    pub(crate) async fn load<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if !bytes.is_empty() => Ok(serde_json::from_slice(&bytes)?),
            Ok(_) => Ok(Vec::new()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(err) => Err(err.into()),
        }
    }

    pub(crate) async fn save<T: Serialize>(&self, records: &[T]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(records)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let file = JsonFile::new(dir.path(), "nothing.json");
        let records: Vec<u32> = file.load().await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_save_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let file = JsonFile::new(dir.path(), "nums.json");
        file.save(&[1u32, 2, 3]).await.unwrap();
        let records: Vec<u32> = file.load().await.unwrap();
        assert_eq!(records, vec![1, 2, 3]);
        assert!(!dir.path().join("nums.json.tmp").exists());
    }
}
