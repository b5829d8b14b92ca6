//! Invoice and contact email rendering.

use askama::Template;
use chrono::Utc;

use crate::config::Config;
use crate::domain::{Language, LineItem, Order, Totals};
use crate::error::Result;

/// One invoice line, formatted for both language renderings.
#[derive(Clone, Debug)]
pub struct InvoiceRow {
    pub name_ar: String,
    pub name_en: String,
    pub size: String,
    pub quantity: u32,
    pub price_ar: String,
    pub price_en: String,
    pub total_ar: String,
    pub total_en: String,
}

/// Everything the invoice templates need, preformatted.
#[derive(Clone, Debug)]
pub struct InvoiceData {
    pub order_number: String,
    pub order_date: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub address: String,
    pub city: String,
    pub zip_code: String,
    pub notes: String,
    pub rows: Vec<InvoiceRow>,
    pub vat_rate: u32,
    pub subtotal_ar: String,
    pub subtotal_en: String,
    pub vat_ar: String,
    pub vat_en: String,
    pub shipping_ar: String,
    pub shipping_en: String,
    pub total_ar: String,
    pub total_en: String,
    pub support_phone: String,
    pub support_email: String,
    pub business_name_ar: String,
    pub business_name_en: String,
    pub year: i32,
}

impl InvoiceData {
    pub fn from_order(order: &Order, config: &Config) -> Self {
        Self::build(&order.id, &order.customer.name, &order.customer.email,
            &order.customer.phone, &order.customer.address, &order.customer.city,
            &order.customer.zip_code, &order.customer.notes, &order.items,
            order.totals, config)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn build(
        order_id: &str,
        name: &str,
        email: &str,
        phone: &str,
        address: &str,
        city: &str,
        zip_code: &str,
        notes: &str,
        items: &[LineItem],
        totals: Totals,
        config: &Config,
    ) -> Self {
        let rows = items
            .iter()
            .map(|i| InvoiceRow {
                name_ar: i.name.ar.clone(),
                name_en: i.name.en.clone(),
                size: i.size.clone(),
                quantity: i.quantity,
                price_ar: i.unit_price.display(Language::Ar),
                price_en: i.unit_price.display(Language::En),
                total_ar: i.total.display(Language::Ar),
                total_en: i.total.display(Language::En),
            })
            .collect();
        Self {
            order_number: order_id.to_string(),
            order_date: Utc::now().format("%Y-%m-%d").to_string(),
            customer_name: name.to_string(),
            customer_email: email.to_string(),
            customer_phone: phone.to_string(),
            address: address.to_string(),
            city: city.to_string(),
            zip_code: zip_code.to_string(),
            notes: notes.to_string(),
            rows,
            vat_rate: totals.vat_rate,
            subtotal_ar: totals.subtotal.display(Language::Ar),
            subtotal_en: totals.subtotal.display(Language::En),
            vat_ar: totals.vat.display(Language::Ar),
            vat_en: totals.vat.display(Language::En),
            shipping_ar: totals.shipping.display(Language::Ar),
            shipping_en: totals.shipping.display(Language::En),
            total_ar: totals.total.display(Language::Ar),
            total_en: totals.total.display(Language::En),
            support_phone: config.support_phone.clone(),
            support_email: config.owner_email.clone(),
            business_name_ar: config.business_name.ar.clone(),
            business_name_en: config.business_name.en.clone(),
            year: Utc::now().format("%Y").to_string().parse().unwrap_or(2026),
        }
    }
}

/// Whether the invoice confirms a fresh order or a completed payment; the
/// subject lines differ.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InvoiceKind {
    OrderConfirmation,
    PaymentConfirmation,
}

pub fn customer_subject(kind: InvoiceKind, order_id: &str, language: Language) -> String {
    match (kind, language) {
        (InvoiceKind::OrderConfirmation, Language::Ar) => format!("تأكيد الطلب رقم {order_id}"),
        (InvoiceKind::OrderConfirmation, Language::En) => format!("Order Confirmation #{order_id}"),
        (InvoiceKind::PaymentConfirmation, Language::Ar) => {
            format!("تأكيد الدفع - طلب رقم {order_id}")
        }
        (InvoiceKind::PaymentConfirmation, Language::En) => {
            format!("Payment Confirmation - Order #{order_id}")
        }
    }
}

pub fn owner_subject(kind: InvoiceKind, order_id: &str, language: Language) -> String {
    match (kind, language) {
        (InvoiceKind::OrderConfirmation, Language::Ar) => format!("طلب جديد #{order_id}"),
        (InvoiceKind::OrderConfirmation, Language::En) => format!("New Order #{order_id}"),
        (InvoiceKind::PaymentConfirmation, Language::Ar) => {
            format!("تم الدفع - طلب رقم {order_id}")
        }
        (InvoiceKind::PaymentConfirmation, Language::En) => {
            format!("Payment Received - Order #{order_id}")
        }
    }
}

#[derive(Template)]
#[template(path = "order_customer_ar.html")]
struct CustomerInvoiceAr<'a> {
    order_number: &'a str,
    order_date: &'a str,
    customer_name: &'a str,
    customer_email: &'a str,
    customer_phone: &'a str,
    address: &'a str,
    city: &'a str,
    zip_code: &'a str,
    notes: &'a str,
    rows: &'a [InvoiceRow],
    vat_rate: u32,
    subtotal_ar: &'a str,
    vat_ar: &'a str,
    shipping_ar: &'a str,
    total_ar: &'a str,
    support_phone: &'a str,
    support_email: &'a str,
    business_name_ar: &'a str,
    year: i32,
}

#[derive(Template)]
#[template(path = "order_customer_en.html")]
struct CustomerInvoiceEn<'a> {
    order_number: &'a str,
    order_date: &'a str,
    customer_name: &'a str,
    customer_email: &'a str,
    customer_phone: &'a str,
    address: &'a str,
    city: &'a str,
    zip_code: &'a str,
    notes: &'a str,
    rows: &'a [InvoiceRow],
    vat_rate: u32,
    subtotal_en: &'a str,
    vat_en: &'a str,
    shipping_en: &'a str,
    total_en: &'a str,
    support_phone: &'a str,
    support_email: &'a str,
    business_name_en: &'a str,
    year: i32,
}

#[derive(Template)]
#[template(path = "order_owner.html")]
struct OwnerInvoice<'a> {
    order_number: &'a str,
    order_date: &'a str,
    customer_name: &'a str,
    customer_email: &'a str,
    customer_phone: &'a str,
    address: &'a str,
    city: &'a str,
    zip_code: &'a str,
    notes: &'a str,
    rows: &'a [InvoiceRow],
    vat_rate: u32,
    subtotal_en: &'a str,
    vat_en: &'a str,
    shipping_en: &'a str,
    total_en: &'a str,
    support_phone: &'a str,
    support_email: &'a str,
    business_name_en: &'a str,
    year: i32,
}

pub fn render_customer_invoice(data: &InvoiceData, language: Language) -> Result<String> {
    let html = match language {
        Language::Ar => CustomerInvoiceAr {
            order_number: &data.order_number,
            order_date: &data.order_date,
            customer_name: &data.customer_name,
            customer_email: &data.customer_email,
            customer_phone: &data.customer_phone,
            address: &data.address,
            city: &data.city,
            zip_code: &data.zip_code,
            notes: &data.notes,
            rows: &data.rows,
            vat_rate: data.vat_rate,
            subtotal_ar: &data.subtotal_ar,
            vat_ar: &data.vat_ar,
            shipping_ar: &data.shipping_ar,
            total_ar: &data.total_ar,
            support_phone: &data.support_phone,
            support_email: &data.support_email,
            business_name_ar: &data.business_name_ar,
            year: data.year,
        }
        .render()?,
        Language::En => CustomerInvoiceEn {
            order_number: &data.order_number,
            order_date: &data.order_date,
            customer_name: &data.customer_name,
            customer_email: &data.customer_email,
            customer_phone: &data.customer_phone,
            address: &data.address,
            city: &data.city,
            zip_code: &data.zip_code,
            notes: &data.notes,
            rows: &data.rows,
            vat_rate: data.vat_rate,
            subtotal_en: &data.subtotal_en,
            vat_en: &data.vat_en,
            shipping_en: &data.shipping_en,
            total_en: &data.total_en,
            support_phone: &data.support_phone,
            support_email: &data.support_email,
            business_name_en: &data.business_name_en,
            year: data.year,
        }
        .render()?,
    };
    Ok(html)
}

/// The owner notification is the same bilingual document whatever the
/// customer's language.
pub fn render_owner_invoice(data: &InvoiceData) -> Result<String> {
    Ok(OwnerInvoice {
        order_number: &data.order_number,
        order_date: &data.order_date,
        customer_name: &data.customer_name,
        customer_email: &data.customer_email,
        customer_phone: &data.customer_phone,
        address: &data.address,
        city: &data.city,
        zip_code: &data.zip_code,
        notes: &data.notes,
        rows: &data.rows,
        vat_rate: data.vat_rate,
        subtotal_en: &data.subtotal_en,
        vat_en: &data.vat_en,
        shipping_en: &data.shipping_en,
        total_en: &data.total_en,
        support_phone: &data.support_phone,
        support_email: &data.support_email,
        business_name_en: &data.business_name_en,
        year: data.year,
    }
    .render()?)
}

#[derive(Template)]
#[template(path = "contact_owner.html")]
struct ContactOwner<'a> {
    dir: &'a str,
    lang: &'a str,
    heading: String,
    label_name: &'a str,
    label_email: &'a str,
    label_phone: &'a str,
    label_subject: &'a str,
    label_message: &'a str,
    name: &'a str,
    email: &'a str,
    phone: &'a str,
    subject: &'a str,
    message: &'a str,
    footer: String,
}

#[derive(Template)]
#[template(path = "contact_ack.html")]
struct ContactAck<'a> {
    dir: &'a str,
    lang: &'a str,
    heading: String,
    intro: &'a str,
    label_details: &'a str,
    label_subject: &'a str,
    label_message: &'a str,
    subject: &'a str,
    message: &'a str,
    footer: String,
}

pub struct ContactMessage<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
    pub subject: &'a str,
    pub message: &'a str,
}

pub fn render_contact_owner(
    msg: &ContactMessage<'_>,
    language: Language,
    config: &Config,
) -> Result<String> {
    let business = config.business_name(language);
    let tpl = match language {
        Language::Ar => ContactOwner {
            dir: "rtl",
            lang: "ar",
            heading: format!("رسالة جديدة من موقع {business}"),
            label_name: "الاسم",
            label_email: "البريد الإلكتروني",
            label_phone: "رقم الهاتف",
            label_subject: "الموضوع",
            label_message: "الرسالة",
            name: msg.name,
            email: msg.email,
            phone: msg.phone,
            subject: msg.subject,
            message: msg.message,
            footer: format!("تم إرسال هذه الرسالة من نموذج الاتصال في موقع {business}"),
        },
        Language::En => ContactOwner {
            dir: "ltr",
            lang: "en",
            heading: format!("New Message from {business} Website"),
            label_name: "Name",
            label_email: "Email",
            label_phone: "Phone",
            label_subject: "Subject",
            label_message: "Message",
            name: msg.name,
            email: msg.email,
            phone: msg.phone,
            subject: msg.subject,
            message: msg.message,
            footer: format!("This message was sent from the contact form on the {business} website"),
        },
    };
    Ok(tpl.render()?)
}

pub fn render_contact_ack(
    msg: &ContactMessage<'_>,
    language: Language,
    config: &Config,
) -> Result<String> {
    let business = config.business_name(language);
    let tpl = match language {
        Language::Ar => ContactAck {
            dir: "rtl",
            lang: "ar",
            heading: format!("شكراً لك {}", msg.name),
            intro: "تم استلام رسالتك بنجاح وسنقوم بالرد عليك في أقرب وقت ممكن.",
            label_details: "تفاصيل رسالتك",
            label_subject: "الموضوع",
            label_message: "الرسالة",
            subject: msg.subject,
            message: msg.message,
            footer: format!("{business} - أناقة متجددة كل يوم"),
        },
        Language::En => ContactAck {
            dir: "ltr",
            lang: "en",
            heading: format!("Thank you {}", msg.name),
            intro: "Your message has been received successfully and we will respond to you as soon as possible.",
            label_details: "Your message details",
            label_subject: "Subject",
            label_message: "Message",
            subject: msg.subject,
            message: msg.message,
            footer: format!("{business} - Renewed Elegance Every Day"),
        },
    };
    Ok(tpl.render()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Bilingual, Money};

    fn config() -> Config {
        Config::from_env()
    }

    fn data() -> InvoiceData {
        let items = vec![LineItem::new(
            "1",
            Bilingual::new("عباية سوداء", "Black Abaya"),
            "M",
            2,
            Money::from_major(299),
        )];
        let totals = Totals::compute(&items);
        InvoiceData::build(
            "ORD123", "Sara", "sara@example.com", "0501234567", "King Fahd Rd", "Riyadh",
            "12345", "", &items, totals, &config(),
        )
    }

    #[test]
    fn test_customer_invoice_ar_is_rtl() {
        let html = render_customer_invoice(&data(), Language::Ar).unwrap();
        assert!(html.contains("dir=\"rtl\""));
        assert!(html.contains("ORD123"));
        assert!(html.contains("ر.س"));
    }

    #[test]
    fn test_customer_invoice_en_totals() {
        let html = render_customer_invoice(&data(), Language::En).unwrap();
        // 598 subtotal + 89.70 VAT, free shipping over 300.
        assert!(html.contains("598.00 SAR"));
        assert!(html.contains("687.70 SAR"));
        assert!(html.contains("VAT (15%)"));
    }

    #[test]
    fn test_owner_invoice_is_bilingual() {
        let html = render_owner_invoice(&data()).unwrap();
        assert!(html.contains("Black Abaya"));
        assert!(html.contains("عباية سوداء"));
    }

    #[test]
    fn test_subjects() {
        assert_eq!(
            customer_subject(InvoiceKind::OrderConfirmation, "ORD1", Language::En),
            "Order Confirmation #ORD1"
        );
        assert!(owner_subject(InvoiceKind::PaymentConfirmation, "ORD1", Language::Ar)
            .contains("ORD1"));
    }

    #[test]
    fn test_contact_rendering() {
        let msg = ContactMessage {
            name: "Noor",
            email: "noor@example.com",
            phone: "",
            subject: "Sizes",
            message: "Do you have size 58?",
        };
        let owner = render_contact_owner(&msg, Language::En, &config()).unwrap();
        assert!(owner.contains("Sizes"));
        // Empty phone row is omitted.
        assert!(!owner.contains("Phone:"));
        let ack = render_contact_ack(&msg, Language::Ar, &config()).unwrap();
        assert!(ack.contains("Noor"));
        assert!(ack.contains("dir=\"rtl\""));
    }
}
