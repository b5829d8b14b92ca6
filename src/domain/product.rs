//! Catalog product record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value::{Bilingual, Language, Money, Sku};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: Bilingual,
    pub sku: Sku,
    pub price: Money,
    /// Percentage off the list price, 0..=100.
    #[serde(default)]
    pub discount: u32,
    pub initial_stock: u32,
    pub current_stock: u32,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
    #[serde(default)]
    pub description: Bilingual,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn new(id: impl Into<String>, name: Bilingual, sku: Sku, price: Money, stock: u32) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name,
            sku,
            price,
            discount: 0,
            initial_stock: stock,
            current_stock: stock,
            image: String::new(),
            category: String::new(),
            badge: None,
            description: Bilingual::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_in_stock(&self) -> bool {
        self.current_stock > 0
    }

    /// Price after the configured percentage discount.
    pub fn sale_price(&self) -> Money {
        self.price.discounted(self.discount)
    }

    /// Reserves `qty` units. Fails without mutating when stock is short.
    pub fn reserve(&mut self, qty: u32) -> Result<(), StockShortage> {
        if self.current_stock < qty {
            return Err(StockShortage {
                product_id: self.id.clone(),
                name: self.name.clone(),
                available: self.current_stock,
                requested: qty,
            });
        }
        self.current_stock -= qty;
        self.touch();
        Ok(())
    }

    pub fn restock(&mut self, qty: u32) {
        self.current_stock = self.current_stock.saturating_add(qty);
        self.touch();
    }

    /// Case-insensitive match on id or either localized name, used by the
    /// chat assistant to resolve product mentions.
    pub fn mentioned_in(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        text.contains(&self.name.ar.to_lowercase())
            || text.contains(&self.name.en.to_lowercase())
            || text.split_whitespace().any(|w| w == self.id)
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Rejected reservation line, reported back to checkout callers.
#[derive(Clone, Debug, Serialize)]
pub struct StockShortage {
    pub product_id: String,
    pub name: Bilingual,
    pub available: u32,
    pub requested: u32,
}

impl StockShortage {
    pub fn message(&self, language: Language) -> String {
        match language {
            Language::Ar if self.available == 0 => format!("{}: نفذت الكمية", self.name.ar),
            Language::Ar => format!("{}: متوفر فقط {} قطعة", self.name.ar, self.available),
            Language::En if self.available == 0 => format!("{}: sold out", self.name.en),
            Language::En => format!("{}: only {} available", self.name.en, self.available),
        }
    }
}
