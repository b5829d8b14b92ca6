//! Rule-based shop assistant.
//!
//! No NLP; a message is matched against keyword tiers in order. Stock
//! questions get the full stock report, catalog questions get the listing,
//! a message naming one product gets that product's card, anything else
//! falls through to the canned reply.

use serde::Serialize;

use crate::domain::{Language, Product};
use crate::i18n::Msg;

const STOCK_KEYWORDS: &[&str] = &["متوفر", "available", "stock", "مخزون", "توفر", "كمية"];
const PRODUCT_KEYWORDS: &[&str] = &["منتجات", "products", "عباية", "abaya"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Stock,
    Products,
    ProductDetail,
    Fallback,
}

#[derive(Clone, Debug, Serialize)]
pub struct ChatReply {
    pub intent: Intent,
    pub reply: String,
}

pub fn respond(message: &str, products: &[Product], language: Language) -> ChatReply {
    let normalized = message.to_lowercase();

    if contains_any(&normalized, STOCK_KEYWORDS) {
        return ChatReply { intent: Intent::Stock, reply: stock_report(products, language) };
    }
    if contains_any(&normalized, PRODUCT_KEYWORDS) {
        return ChatReply { intent: Intent::Products, reply: listing(products, language) };
    }
    if let Some(product) = products.iter().find(|p| p.mentioned_in(&normalized)) {
        return ChatReply {
            intent: Intent::ProductDetail,
            reply: product_card(product, language),
        };
    }
    ChatReply {
        intent: Intent::Fallback,
        reply: Msg::ChatFallback.text(language).to_string(),
    }
}

fn contains_any(message: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| message.contains(kw))
}

fn stock_report(products: &[Product], language: Language) -> String {
    if products.is_empty() {
        return Msg::ChatCatalogEmpty.text(language).to_string();
    }
    let heading = match language {
        Language::Ar => "حالة المخزون:",
        Language::En => "Stock status:",
    };
    let mut lines = vec![heading.to_string()];
    for (index, product) in products.iter().enumerate() {
        let status = if product.is_in_stock() {
            match language {
                Language::Ar => format!("{} متوفر", product.current_stock),
                Language::En => format!("{} available", product.current_stock),
            }
        } else {
            sold_out(language).to_string()
        };
        lines.push(format!("{}. {} - {}", index + 1, product.name.get(language), status));
    }
    lines.join("\n")
}

fn listing(products: &[Product], language: Language) -> String {
    if products.is_empty() {
        return Msg::ChatCatalogEmpty.text(language).to_string();
    }
    let heading = match language {
        Language::Ar => "منتجاتنا:",
        Language::En => "Our products:",
    };
    let mut lines = vec![heading.to_string()];
    for (index, product) in products.iter().enumerate() {
        let mut line = format!(
            "{}. {} - {}",
            index + 1,
            product.name.get(language),
            product.sale_price().display(language)
        );
        if product.discount > 0 {
            let off = match language {
                Language::Ar => format!(" (خصم {}%)", product.discount),
                Language::En => format!(" ({}% off)", product.discount),
            };
            line.push_str(&off);
        }
        if !product.is_in_stock() {
            line.push_str(" - ");
            line.push_str(sold_out(language));
        }
        lines.push(line);
    }
    lines.join("\n")
}

fn product_card(product: &Product, language: Language) -> String {
    let name = product.name.get(language);
    if !product.is_in_stock() {
        return match language {
            Language::Ar => format!("{name}: نفذت الكمية"),
            Language::En => format!("{name}: Sold out"),
        };
    }
    let availability = match language {
        Language::Ar => format!("متوفر: {} قطعة", product.current_stock),
        Language::En => format!("Available: {} pcs", product.current_stock),
    };
    let price = if product.discount > 0 {
        match language {
            Language::Ar => format!(
                "السعر بعد الخصم: {} (بدلاً من {}، خصم {}%)",
                product.sale_price().display(language),
                product.price.display(language),
                product.discount
            ),
            Language::En => format!(
                "Price after discount: {} (was {}, {}% off)",
                product.sale_price().display(language),
                product.price.display(language),
                product.discount
            ),
        }
    } else {
        match language {
            Language::Ar => format!("السعر: {}", product.price.display(language)),
            Language::En => format!("Price: {}", product.price.display(language)),
        }
    };
    format!("{name}\n{availability}\n{price}")
}

fn sold_out(language: Language) -> &'static str {
    match language {
        Language::Ar => "نفذت الكمية",
        Language::En => "Sold out",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::seed_products;

    fn catalog() -> Vec<Product> {
        seed_products()
    }

    #[test]
    fn test_stock_keyword_wins_over_product_mention() {
        let reply = respond("هل عباية سوداء كلاسيكية متوفر؟", &catalog(), Language::Ar);
        assert_eq!(reply.intent, Intent::Stock);
        assert!(reply.reply.contains("حالة المخزون"));
    }

    #[test]
    fn test_products_keyword_lists_catalog() {
        let reply = respond("show me your products", &catalog(), Language::En);
        assert_eq!(reply.intent, Intent::Products);
        assert!(reply.reply.contains("Classic Black Abaya"));
        assert!(reply.reply.contains("% off"));
    }

    #[test]
    fn test_product_mention_gives_detail() {
        let reply = respond("details for 3 please", &catalog(), Language::En);
        assert_eq!(reply.intent, Intent::ProductDetail);
        assert!(reply.reply.contains("Modern Navy Blue Abaya"));
        assert!(reply.reply.contains("SAR"));
    }

    #[test]
    fn test_fallback() {
        let reply = respond("what is the weather", &catalog(), Language::En);
        assert_eq!(reply.intent, Intent::Fallback);
    }

    #[test]
    fn test_empty_catalog_report() {
        let reply = respond("stock", &[], Language::En);
        assert_eq!(reply.reply, "Loading data...");
    }
}
