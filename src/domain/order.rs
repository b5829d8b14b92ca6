//! Order record and totals math.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::value::{Bilingual, Language, Money};

/// VAT applied to every order, in percent.
pub const VAT_RATE_PERCENT: u32 = 15;
/// Orders at or above this subtotal ship free.
pub const FREE_SHIPPING_THRESHOLD: i64 = 300;
/// Flat shipping charge below the threshold, in SAR.
pub const FLAT_SHIPPING: i64 = 20;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub customer: Customer,
    pub items: Vec<LineItem>,
    pub totals: Totals,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    pub language: Language,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Customer {
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub zip_code: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: String,
    pub name: Bilingual,
    #[serde(default)]
    pub size: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub total: Money,
}

impl LineItem {
    pub fn new(
        product_id: impl Into<String>,
        name: Bilingual,
        size: impl Into<String>,
        quantity: u32,
        unit_price: Money,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            name,
            size: size.into(),
            quantity,
            unit_price,
            total: unit_price.multiply(quantity).round_dp(2),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub subtotal: Money,
    pub vat_rate: u32,
    pub vat: Money,
    pub shipping: Money,
    pub total: Money,
}

impl Totals {
    /// Recomputes every figure from the line items. Client-sent totals are
    /// never trusted; this is the single place the math lives.
    pub fn compute(items: &[LineItem]) -> Totals {
        let subtotal: Money = items
            .iter()
            .fold(Money::ZERO, |acc, i| acc.add(i.unit_price.multiply(i.quantity)))
            .round_dp(2);
        let vat = Money::new(
            (subtotal.amount() * Decimal::new(VAT_RATE_PERCENT as i64, 2)).round_dp(2),
        );
        let shipping = if items.is_empty() {
            Money::ZERO
        } else if subtotal.amount() >= Decimal::new(FREE_SHIPPING_THRESHOLD, 0) {
            Money::ZERO
        } else {
            Money::from_major(FLAT_SHIPPING)
        };
        let total = subtotal.add(vat).add(shipping).round_dp(2);
        Totals { subtotal, vat_rate: VAT_RATE_PERCENT, vat, shipping, total }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    CashOnDelivery,
    Card,
    Mock,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Paid,
    EmailFailed,
}

impl Order {
    pub fn place(
        customer: Customer,
        items: Vec<LineItem>,
        payment_method: PaymentMethod,
        language: Language,
    ) -> Self {
        let totals = Totals::compute(&items);
        Self {
            id: generate_order_id(),
            customer,
            items,
            totals,
            payment_method,
            status: OrderStatus::Pending,
            language,
            created_at: Utc::now(),
        }
    }
}

/// Client-submitted order data, carried through payment sessions so webhook
/// processing can rebuild an invoice after the hosted-gateway redirect.
/// Fields mirror the checkout form; totals are recomputed server-side.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct OrderDraft {
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub customer_email: String,
    #[serde(default)]
    pub customer_phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub zip_code: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub items: Vec<DraftItem>,
    #[serde(default)]
    pub language: Language,
}

impl OrderDraft {
    /// Fills fields missing from `self` with values from `fallback`.
    /// Present fields always win, matching webhook session-merge semantics.
    pub fn merge_missing_from(&mut self, fallback: &OrderDraft) {
        fn fill(dst: &mut String, src: &str) {
            if dst.trim().is_empty() {
                *dst = src.to_string();
            }
        }
        fill(&mut self.customer_name, &fallback.customer_name);
        fill(&mut self.customer_email, &fallback.customer_email);
        fill(&mut self.customer_phone, &fallback.customer_phone);
        fill(&mut self.address, &fallback.address);
        fill(&mut self.city, &fallback.city);
        fill(&mut self.zip_code, &fallback.zip_code);
        fill(&mut self.notes, &fallback.notes);
        if self.items.is_empty() {
            self.items = fallback.items.clone();
        }
    }

    pub fn customer(&self) -> Customer {
        Customer {
            name: self.customer_name.clone(),
            email: self.customer_email.clone(),
            phone: self.customer_phone.clone(),
            address: self.address.clone(),
            city: self.city.clone(),
            zip_code: self.zip_code.clone(),
            notes: self.notes.clone(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DraftItem {
    #[serde(alias = "id")]
    pub product_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default = "one")]
    pub quantity: u32,
    #[serde(default)]
    pub price: Option<Money>,
}

fn one() -> u32 {
    1
}

/// Order ids look like `ORD17240518x`: the `ORD` prefix plus the trailing
/// digits of the current epoch millis and a random suffix to keep two orders
/// placed in the same millisecond distinct.
pub fn generate_order_id() -> String {
    let millis = Utc::now().timestamp_millis();
    format!("ORD{}{}", millis % 100_000_000, rand::random::<u8>() % 10)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(price: i64, qty: u32) -> LineItem {
        LineItem::new(
            "1",
            Bilingual::new("عباية", "Abaya"),
            "M",
            qty,
            Money::from_major(price),
        )
    }

    #[test]
    fn test_totals_flat_shipping_below_threshold() {
        let totals = Totals::compute(&[item(100, 2)]);
        assert_eq!(totals.subtotal, Money::from_major(200));
        assert_eq!(totals.vat, Money::new(Decimal::new(3000, 2)));
        assert_eq!(totals.shipping, Money::from_major(FLAT_SHIPPING));
        assert_eq!(totals.total, Money::from_major(250));
    }

    #[test]
    fn test_totals_free_shipping_at_threshold() {
        let totals = Totals::compute(&[item(300, 1)]);
        assert_eq!(totals.shipping, Money::ZERO);
        assert_eq!(totals.total, Money::from_major(345));
    }

    #[test]
    fn test_totals_empty_cart_has_no_shipping() {
        let totals = Totals::compute(&[]);
        assert_eq!(totals.total, Money::ZERO);
        assert_eq!(totals.shipping, Money::ZERO);
    }

    #[test]
    fn test_order_id_shape() {
        let id = generate_order_id();
        assert!(id.starts_with("ORD"));
        assert!(id[3..].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_line_item_total() {
        let i = item(249, 3);
        assert_eq!(i.total, Money::from_major(747));
    }
}
