//! Product catalog store.

use std::path::Path;

use tokio::sync::RwLock;

use super::JsonFile;
use crate::domain::{Bilingual, Money, Product, Sku, StockShortage};
use crate::error::Result;

pub struct CatalogStore {
    file: JsonFile,
    products: RwLock<Vec<Product>>,
}

impl CatalogStore {
    /// Opens the catalog, seeding the default collection on first run so a
    /// fresh install has something to sell.
    pub async fn open(dir: &Path) -> Result<Self> {
        let file = JsonFile::new(dir, "products.json");
        let mut products: Vec<Product> = file.load().await?;
        if products.is_empty() {
            products = seed_products();
            file.save(&products).await?;
        }
        Ok(Self { file, products: RwLock::new(products) })
    }

    pub async fn list(&self) -> Vec<Product> {
        self.products.read().await.clone()
    }

    pub async fn get(&self, id: &str) -> Option<Product> {
        self.products.read().await.iter().find(|p| p.id == id).cloned()
    }

    pub async fn insert(&self, product: Product) -> Result<()> {
        let mut products = self.products.write().await;
        products.push(product);
        self.file.save(&products).await
    }

    /// Applies `apply` to the product with `id` and persists. Returns the
    /// updated product, or `None` when the id is unknown.
    pub async fn update<F>(&self, id: &str, apply: F) -> Result<Option<Product>>
    where
        F: FnOnce(&mut Product),
    {
        let mut products = self.products.write().await;
        let Some(product) = products.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        apply(product);
        product.updated_at = chrono::Utc::now();
        let updated = product.clone();
        self.file.save(&products).await?;
        Ok(Some(updated))
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let mut products = self.products.write().await;
        let before = products.len();
        products.retain(|p| p.id != id);
        if products.len() == before {
            return Ok(false);
        }
        self.file.save(&products).await?;
        Ok(true)
    }

    /// Reserves stock for every requested line under one write lock: either
    /// all lines are decremented or none are. Two concurrent orders for the
    /// last unit of a product cannot both succeed.
    pub async fn reserve(&self, lines: &[(String, u32)]) -> Result<ReserveOutcome> {
        let mut products = self.products.write().await;

        let mut shortages = Vec::new();
        for (product_id, qty) in lines {
            match products.iter().find(|p| &p.id == product_id) {
                Some(p) if p.current_stock >= *qty => {}
                Some(p) => shortages.push(StockShortage {
                    product_id: p.id.clone(),
                    name: p.name.clone(),
                    available: p.current_stock,
                    requested: *qty,
                }),
                // Unknown ids pass through, as the gateway worker did: the
                // storefront may sell items the stock file does not track.
                None => {}
            }
        }
        if !shortages.is_empty() {
            return Ok(ReserveOutcome::Short(shortages));
        }

        for (product_id, qty) in lines {
            if let Some(p) = products.iter_mut().find(|p| &p.id == product_id) {
                // Checked above under the same lock.
                p.current_stock -= qty;
                p.updated_at = chrono::Utc::now();
            }
        }
        self.file.save(&products).await?;
        Ok(ReserveOutcome::Reserved)
    }
}

#[derive(Debug)]
pub enum ReserveOutcome {
    Reserved,
    Short(Vec<StockShortage>),
}

pub fn seed_products() -> Vec<Product> {
    let defs: [(&str, &str, &str, &str, i64, u32, u32, Option<&str>); 4] = [
        ("1", "عباية سوداء كلاسيكية", "Classic Black Abaya", "ABY-001", 299, 15, 50, None),
        ("2", "عباية مطرزة بالخيط الذهبي", "Gold Thread Embroidered Abaya", "ABY-002", 449, 0, 30, Some("new")),
        ("3", "عباية كحلي بتصميم عصري", "Modern Navy Blue Abaya", "ABY-003", 349, 0, 40, None),
        ("4", "عباية رمادية بتفاصيل فضية", "Grey Abaya with Silver Details", "ABY-004", 399, 10, 35, None),
    ];
    defs.into_iter()
        .map(|(id, ar, en, sku, price, discount, stock, badge)| {
            let mut p = Product::new(
                id,
                Bilingual::new(ar, en),
                Sku::new(sku).expect("seed sku"),
                Money::from_major(price),
                stock,
            );
            p.discount = discount;
            p.image = format!("images/abaya{id}.jpg");
            p.category = "abaya".to_string();
            p.badge = badge.map(str::to_string);
            p
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn open_store() -> (tempfile::TempDir, CatalogStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = CatalogStore::open(dir.path()).await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_open_seeds_catalog() {
        let (_dir, store) = open_store().await;
        let products = store.list().await;
        assert_eq!(products.len(), 4);
        assert!(products.iter().all(|p| p.is_in_stock()));
    }

    #[tokio::test]
    async fn test_reserve_all_or_nothing() {
        let (_dir, store) = open_store().await;
        let outcome = store
            .reserve(&[("1".to_string(), 2), ("2".to_string(), 999)])
            .await
            .unwrap();
        assert!(matches!(outcome, ReserveOutcome::Short(ref s) if s.len() == 1));
        // The reservable line must not have been decremented.
        assert_eq!(store.get("1").await.unwrap().current_stock, 50);
    }

    #[tokio::test]
    async fn test_reserve_decrements() {
        let (_dir, store) = open_store().await;
        let outcome = store.reserve(&[("1".to_string(), 3)]).await.unwrap();
        assert!(matches!(outcome, ReserveOutcome::Reserved));
        assert_eq!(store.get("1").await.unwrap().current_stock, 47);
    }

    #[tokio::test]
    async fn test_last_unit_cannot_be_sold_twice() {
        let (_dir, store) = open_store().await;
        store
            .update("1", |p| {
                p.current_stock = 1;
            })
            .await
            .unwrap();
        let first = store.reserve(&[("1".to_string(), 1)]).await.unwrap();
        let second = store.reserve(&[("1".to_string(), 1)]).await.unwrap();
        assert!(matches!(first, ReserveOutcome::Reserved));
        assert!(matches!(second, ReserveOutcome::Short(_)));
    }

    #[tokio::test]
    async fn test_reopen_reads_persisted_state() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = CatalogStore::open(dir.path()).await.unwrap();
            store.reserve(&[("3".to_string(), 5)]).await.unwrap();
        }
        let store = CatalogStore::open(dir.path()).await.unwrap();
        assert_eq!(store.get("3").await.unwrap().current_stock, 35);
    }
}
