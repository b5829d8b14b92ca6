//! Domain records and value objects.

pub mod order;
pub mod product;
pub mod value;

pub use order::{Customer, DraftItem, LineItem, Order, OrderDraft, OrderStatus, PaymentMethod, Totals};
pub use product::{Product, StockShortage};
pub use value::{Bilingual, Language, Money, Sku};
