//! Arabic/English string table for user-facing API messages.
//!
//! Every localized response in the service resolves through [`Msg::text`], so
//! a missing translation is a compile error, not a runtime gap.

use crate::domain::Language;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Msg {
    OrderReceived,
    EmptyCart,
    MissingCustomerFields,
    StockUnavailable,
    ContactMissingFields,
    ContactSent,
    ContactFailed,
    InvalidApiKey,
    InvalidAdminKey,
    WebhookMissingFields,
    MissingCustomerEmail,
    SessionFieldsRequired,
    ConsentMissing,
    InvalidSku,
    ProductNotFound,
    OrderNotFound,
    EmailDeliveryFailed,
    ChatFallback,
    ChatCatalogEmpty,
    Internal,
}

impl Msg {
    pub fn text(self, language: Language) -> &'static str {
        match language {
            Language::Ar => self.ar(),
            Language::En => self.en(),
        }
    }

    fn ar(self) -> &'static str {
        match self {
            Msg::OrderReceived => "تم استلام طلبك وجاري معالجته",
            Msg::EmptyCart => "سلة التسوق فارغة",
            Msg::MissingCustomerFields => "يرجى إدخال الاسم والبريد الإلكتروني ورقم الهاتف",
            Msg::StockUnavailable => "بعض المنتجات غير متوفرة بالكمية المطلوبة",
            Msg::ContactMissingFields => "يرجى ملء جميع الحقول المطلوبة",
            Msg::ContactSent => "تم إرسال رسالتك بنجاح",
            Msg::ContactFailed => "فشل في إرسال الرسالة. يرجى المحاولة مرة أخرى أو التواصل معنا.",
            Msg::InvalidApiKey => "مفتاح API غير صالح",
            Msg::InvalidAdminKey => "مفتاح الإدارة غير صالح",
            Msg::WebhookMissingFields => "حقول مطلوبة مفقودة",
            Msg::MissingCustomerEmail => "البريد الإلكتروني للعميل مفقود في بيانات الدفع",
            Msg::SessionFieldsRequired => "رقم الطلب والمبلغ مطلوبان",
            Msg::ConsentMissing => "بيانات الموافقة مفقودة",
            Msg::InvalidSku => "رمز المنتج غير صالح",
            Msg::ProductNotFound => "المنتج غير موجود",
            Msg::OrderNotFound => "الطلب غير موجود",
            Msg::EmailDeliveryFailed => "تعذر إرسال الفاتورة بالبريد الإلكتروني",
            Msg::ChatFallback => "عذراً، لم أفهم سؤالك. يمكنك السؤال عن المنتجات أو المخزون.",
            Msg::ChatCatalogEmpty => "جاري تحميل البيانات...",
            Msg::Internal => "حدث خطأ غير متوقع",
        }
    }

    fn en(self) -> &'static str {
        match self {
            Msg::OrderReceived => "Order received and being processed",
            Msg::EmptyCart => "Your cart is empty",
            Msg::MissingCustomerFields => "Please provide your name, email and phone number",
            Msg::StockUnavailable => "Some items are out of stock",
            Msg::ContactMissingFields => "Please fill in all required fields",
            Msg::ContactSent => "Your message has been sent successfully",
            Msg::ContactFailed => "Failed to send message. Please try again or contact us.",
            Msg::InvalidApiKey => "Invalid API key",
            Msg::InvalidAdminKey => "Invalid admin key",
            Msg::WebhookMissingFields => "Missing required fields",
            Msg::MissingCustomerEmail => "Missing customer email in payment/session data",
            Msg::SessionFieldsRequired => "order_id and amount required",
            Msg::ConsentMissing => "Missing consent payload",
            Msg::InvalidSku => "Invalid product SKU",
            Msg::ProductNotFound => "Product not found",
            Msg::OrderNotFound => "Order not found",
            Msg::EmailDeliveryFailed => "Email delivery failed",
            Msg::ChatFallback => "Sorry, I did not understand. You can ask about products or stock.",
            Msg::ChatCatalogEmpty => "Loading data...",
            Msg::Internal => "Unexpected error",
        }
    }
}
