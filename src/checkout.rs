//! Order placement and payment-webhook orchestration.
//!
//! Both flows end in the same place: render the invoice pair, write it to
//! disk, deliver to the customer and the owner. Responses never wait on
//! delivery for cash orders; webhook processing is synchronous so the
//! gateway gets an honest status back.

use serde::Deserialize;
use serde_json::json;

use crate::domain::{
    Bilingual, DraftItem, Language, LineItem, Money, Order, OrderDraft, PaymentMethod, Totals,
};
use crate::error::{Error, Result};
use crate::i18n::Msg;
use crate::mail::render::{self, ContactMessage, InvoiceData, InvoiceKind};
use crate::mail::{OutboundEmail, SendResult};
use crate::state::AppState;
use crate::store::{CatalogStore, PaymentRecord, PaymentState, ReserveOutcome};

/// Places a cash-on-delivery order: validate, reserve stock atomically,
/// persist, then deliver invoices in the background.
pub async fn place_order(state: &AppState, draft: OrderDraft) -> Result<Order> {
    let language = draft.language;
    // Zero-quantity lines are noise from stale carts; an order of only those
    // is an empty cart.
    let mut draft = draft;
    draft.items.retain(|i| i.quantity > 0);
    if draft.items.is_empty() {
        return Err(Error::Validation { msg: Msg::EmptyCart, language });
    }
    if draft.customer_name.trim().is_empty()
        || draft.customer_email.trim().is_empty()
        || draft.customer_phone.trim().is_empty()
        || !validator::validate_email(draft.customer_email.trim())
    {
        return Err(Error::Validation { msg: Msg::MissingCustomerFields, language });
    }

    let items = resolve_line_items(&state.catalog, &draft.items, true, language).await?;
    let lines: Vec<(String, u32)> =
        items.iter().map(|i| (i.product_id.clone(), i.quantity)).collect();
    if let ReserveOutcome::Short(shortages) = state.catalog.reserve(&lines).await? {
        return Err(Error::OutOfStock { shortages, language });
    }

    let order = Order::place(draft.customer(), items, PaymentMethod::CashOnDelivery, language);
    state.orders.insert(order.clone()).await?;
    tracing::info!(order_id = %order.id, total = %order.totals.total.amount(), "order placed");

    let bg_state = state.clone();
    let bg_order = order.clone();
    tokio::spawn(async move {
        if let Err(err) = deliver_order_invoices(&bg_state, &bg_order).await {
            tracing::error!(order_id = %bg_order.id, error = %err, "invoice delivery failed");
        }
    });
    Ok(order)
}

/// Renders and delivers the invoice pair for a placed order. A failed
/// delivery lands an `email_failed` ledger entry the retry worker picks up.
async fn deliver_order_invoices(state: &AppState, order: &Order) -> Result<()> {
    let data = InvoiceData::from_order(order, &state.config);
    let outcome =
        deliver_invoice_pair(state, &data, order.language, InvoiceKind::OrderConfirmation).await?;
    if let Some(failures) = outcome {
        record_email_failure(
            state,
            &order.id,
            None,
            order.totals.total,
            Some("cash_on_delivery"),
            None,
            &failures,
        )
        .await?;
    }
    Ok(())
}

/// Gateway webhook payload. `order_data` carries the checkout form fields;
/// anything missing is filled from the stored payment session.
#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub order_id: String,
    #[serde(default)]
    pub transaction_id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub amount: Option<Money>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub order_data: Option<OrderDraft>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// Transaction id already in the ledger; nothing done.
    Duplicate,
    /// Gateway reported a failure; recorded, no email sent.
    GatewayFailure,
    /// Invoices delivered to both the customer and the owner.
    Delivered { order_id: String },
}

pub async fn process_webhook(state: &AppState, payload: WebhookPayload) -> Result<WebhookOutcome> {
    if payload.order_id.trim().is_empty()
        || payload.transaction_id.trim().is_empty()
        || payload.status.trim().is_empty()
    {
        return Err(Error::Validation {
            msg: Msg::WebhookMissingFields,
            language: Language::default(),
        });
    }
    if state.payments.is_processed(&payload.transaction_id).await {
        tracing::info!(transaction_id = %payload.transaction_id, "duplicate webhook dropped");
        return Ok(WebhookOutcome::Duplicate);
    }

    let session = match payload.session_id.as_deref() {
        Some(id) => state.sessions.get(id).await,
        None => state.sessions.latest_for_order(&payload.order_id).await,
    };

    let gateway_state = PaymentState::from_gateway(&payload.status);
    if gateway_state != PaymentState::Success {
        let amount = payload
            .amount
            .or_else(|| session.as_ref().map(|s| s.amount))
            .unwrap_or(Money::ZERO);
        let record = PaymentRecord {
            order_id: payload.order_id.clone(),
            transaction_id: Some(payload.transaction_id.clone()),
            status: gateway_state,
            amount,
            payment_method: payload.payment_method.clone(),
            processed_at: chrono::Utc::now(),
            session_id: payload.session_id.clone(),
            note: Some(format!("gateway status: {}", payload.status)),
        };
        if let Some(audit) = &state.audit {
            audit.mirror_payment(&record).await;
        }
        state.payments.record(record).await?;
        return Ok(WebhookOutcome::GatewayFailure);
    }

    // Payload fields win; the session draft only fills the gaps.
    let mut draft = payload.order_data.unwrap_or_default();
    if let Some(stored) = session.as_ref().and_then(|s| s.order_data.as_ref()) {
        draft.merge_missing_from(stored);
        if draft.language == Language::default() {
            draft.language = stored.language;
        }
    }
    let language = draft.language;

    if draft.customer_email.trim().is_empty() {
        record_email_failure(
            state,
            &payload.order_id,
            Some(&payload.transaction_id),
            payload
                .amount
                .or_else(|| session.as_ref().map(|s| s.amount))
                .unwrap_or(Money::ZERO),
            payload.payment_method.as_deref(),
            payload.session_id.as_deref(),
            &json!({ "error": "missing customer email" }),
        )
        .await?;
        return Err(Error::MissingEmail { language });
    }

    let items = resolve_line_items(&state.catalog, &draft.items, false, language).await?;
    let totals = Totals::compute(&items);
    let amount = payload
        .amount
        .or_else(|| session.as_ref().map(|s| s.amount))
        .unwrap_or(totals.total);

    let data = InvoiceData::build(
        &payload.order_id,
        &draft.customer_name,
        &draft.customer_email,
        &draft.customer_phone,
        &draft.address,
        &draft.city,
        &draft.zip_code,
        &draft.notes,
        &items,
        totals,
        &state.config,
    );
    let outcome =
        deliver_invoice_pair(state, &data, language, InvoiceKind::PaymentConfirmation).await?;

    match outcome {
        None => {
            let record = PaymentRecord {
                order_id: payload.order_id.clone(),
                transaction_id: Some(payload.transaction_id.clone()),
                status: PaymentState::Success,
                amount,
                payment_method: payload.payment_method.clone(),
                processed_at: chrono::Utc::now(),
                session_id: payload.session_id.clone(),
                note: None,
            };
            if let Some(audit) = &state.audit {
                audit.mirror_payment(&record).await;
            }
            state.payments.record(record).await?;
            tracing::info!(order_id = %payload.order_id, "payment processed, invoices delivered");
            Ok(WebhookOutcome::Delivered { order_id: payload.order_id })
        }
        Some(failures) => {
            record_email_failure(
                state,
                &payload.order_id,
                Some(&payload.transaction_id),
                amount,
                payload.payment_method.as_deref(),
                payload.session_id.as_deref(),
                &failures,
            )
            .await?;
            Err(Error::EmailDelivery { language, detail: failures })
        }
    }
}

/// Re-sends the invoice pair for an order, rebuilding it from the order
/// store or the latest payment session. On success the ledger entry for the
/// order flips to `success`.
pub async fn resend_invoice(state: &AppState, order_id: &str) -> Result<()> {
    let latest = state.payments.latest_for_order(order_id).await;
    let (data, language, kind) = if let Some(order) = state.orders.get(order_id).await {
        let kind = match latest.as_ref().and_then(|r| r.transaction_id.as_deref()) {
            Some(_) => InvoiceKind::PaymentConfirmation,
            None => InvoiceKind::OrderConfirmation,
        };
        (InvoiceData::from_order(&order, &state.config), order.language, kind)
    } else if let Some(session) = state.sessions.latest_for_order(order_id).await {
        let draft = session.order_data.clone().unwrap_or_default();
        if draft.customer_email.trim().is_empty() {
            return Err(Error::MissingEmail { language: draft.language });
        }
        let items =
            resolve_line_items(&state.catalog, &draft.items, false, draft.language).await?;
        let totals = Totals::compute(&items);
        let data = InvoiceData::build(
            order_id,
            &draft.customer_name,
            &draft.customer_email,
            &draft.customer_phone,
            &draft.address,
            &draft.city,
            &draft.zip_code,
            &draft.notes,
            &items,
            totals,
            &state.config,
        );
        (data, draft.language, InvoiceKind::PaymentConfirmation)
    } else {
        return Err(Error::NotFound { msg: Msg::OrderNotFound, language: Language::default() });
    };

    match deliver_invoice_pair(state, &data, language, kind).await? {
        None => {
            let (txn, amount) = match &latest {
                Some(r) => (r.transaction_id.as_deref(), r.amount),
                None => (None, Money::ZERO),
            };
            state.payments.mark_delivered(order_id, txn, amount).await?;
            Ok(())
        }
        Some(failures) => Err(Error::EmailDelivery { language, detail: failures }),
    }
}

/// Renders, archives, and sends the customer and owner invoices. Returns
/// `None` when both deliveries landed, otherwise the failure detail.
async fn deliver_invoice_pair(
    state: &AppState,
    data: &InvoiceData,
    language: Language,
    kind: InvoiceKind,
) -> Result<Option<serde_json::Value>> {
    let customer_html = render::render_customer_invoice(data, language)?;
    let owner_html = render::render_owner_invoice(data)?;
    state
        .mail
        .save_invoice_files(&data.order_number, &customer_html, &owner_html)
        .await?;

    let customer = state
        .mail
        .send_with_retry(&OutboundEmail {
            to: data.customer_email.clone(),
            from_name: state.config.business_name(language).to_string(),
            subject: render::customer_subject(kind, &data.order_number, language),
            html: customer_html,
        })
        .await;
    let owner = state
        .mail
        .send_with_retry(&OutboundEmail {
            to: state.mail.owner_email.clone(),
            from_name: state.config.business_name(Language::En).to_string(),
            subject: render::owner_subject(kind, &data.order_number, language),
            html: owner_html,
        })
        .await;

    if customer.success && owner.success {
        Ok(None)
    } else {
        let failures: Vec<&SendResult> =
            [&customer, &owner].into_iter().filter(|r| !r.success).collect();
        Ok(Some(serde_json::to_value(failures)?))
    }
}

async fn record_email_failure(
    state: &AppState,
    order_id: &str,
    transaction_id: Option<&str>,
    amount: Money,
    payment_method: Option<&str>,
    session_id: Option<&str>,
    detail: &serde_json::Value,
) -> Result<()> {
    let record = PaymentRecord {
        order_id: order_id.to_string(),
        transaction_id: transaction_id.map(str::to_string),
        status: PaymentState::EmailFailed,
        amount,
        payment_method: payment_method.map(str::to_string),
        processed_at: chrono::Utc::now(),
        session_id: session_id.map(str::to_string),
        note: Some(detail.to_string()),
    };
    if let Some(audit) = &state.audit {
        audit.mirror_payment(&record).await;
        audit
            .mirror_email_error(order_id, transaction_id, &detail.to_string())
            .await;
    }
    state.payments.record(record).await
}

/// Resolves draft lines against the catalog. Known products supply the
/// bilingual name and the discounted unit price; in strict mode an unknown
/// product without a client price is rejected.
async fn resolve_line_items(
    catalog: &CatalogStore,
    items: &[DraftItem],
    strict: bool,
    language: Language,
) -> Result<Vec<LineItem>> {
    let mut out = Vec::with_capacity(items.len());
    for draft in items {
        let size = draft.size.clone().unwrap_or_default();
        match catalog.get(&draft.product_id).await {
            Some(product) => out.push(LineItem::new(
                product.id.clone(),
                product.name.clone(),
                size,
                draft.quantity,
                product.sale_price(),
            )),
            None => {
                let price = match draft.price {
                    Some(price) => price,
                    None if strict => {
                        return Err(Error::NotFound {
                            msg: Msg::ProductNotFound,
                            language,
                        })
                    }
                    None => Money::ZERO,
                };
                let name = draft.name.clone().unwrap_or_else(|| draft.product_id.clone());
                out.push(LineItem::new(
                    draft.product_id.clone(),
                    Bilingual::new(name.clone(), name),
                    size,
                    draft.quantity,
                    price,
                ));
            }
        }
    }
    Ok(out)
}

/// Contact-form submission: acknowledge the sender, notify the owner.
pub async fn send_contact(
    state: &AppState,
    msg: &ContactMessage<'_>,
    language: Language,
) -> Result<()> {
    if msg.name.trim().is_empty()
        || msg.subject.trim().is_empty()
        || msg.message.trim().is_empty()
        || !validator::validate_email(msg.email.trim())
    {
        return Err(Error::Validation { msg: Msg::ContactMissingFields, language });
    }
    let owner_html = render::render_contact_owner(msg, language, &state.config)?;
    let ack_html = render::render_contact_ack(msg, language, &state.config)?;

    let business = state.config.business_name(language).to_string();
    let owner_subject = match language {
        Language::Ar => format!("رسالة تواصل جديدة: {}", msg.subject),
        Language::En => format!("New contact message: {}", msg.subject),
    };
    let ack_subject = match language {
        Language::Ar => format!("تم استلام رسالتك - {business}"),
        Language::En => format!("We received your message - {business}"),
    };

    let owner = state
        .mail
        .send_with_retry(&OutboundEmail {
            to: state.mail.owner_email.clone(),
            from_name: business.clone(),
            subject: owner_subject,
            html: owner_html,
        })
        .await;
    if !owner.success {
        return Err(Error::Delivery { msg: Msg::ContactFailed, language });
    }
    // The acknowledgement is best effort; the owner already has the message.
    let ack = state
        .mail
        .send_with_retry(&OutboundEmail {
            to: msg.email.to_string(),
            from_name: business,
            subject: ack_subject,
            html: ack_html,
        })
        .await;
    if !ack.success {
        tracing::warn!(to = %msg.email, "contact acknowledgement not delivered");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn draft(items: Vec<DraftItem>) -> OrderDraft {
        OrderDraft {
            customer_name: "Sara".into(),
            customer_email: "sara@example.com".into(),
            customer_phone: "0501234567".into(),
            address: "King Fahd Rd".into(),
            city: "Riyadh".into(),
            zip_code: "12345".into(),
            notes: String::new(),
            items,
            language: Language::En,
        }
    }

    fn line(product_id: &str, quantity: u32) -> DraftItem {
        DraftItem {
            product_id: product_id.into(),
            name: None,
            size: Some("M".into()),
            quantity,
            price: None,
        }
    }

    #[tokio::test]
    async fn test_place_order_reserves_stock_and_persists() {
        let dir = tempdir().unwrap();
        let state = AppState::outbox(dir.path()).await;
        let product = state.catalog.list().await.remove(0);

        let order = place_order(&state, draft(vec![line(&product.id, 2)])).await.unwrap();
        assert!(order.id.starts_with("ORD"));
        assert_eq!(order.items.len(), 1);
        assert_eq!(
            state.catalog.get(&product.id).await.unwrap().current_stock,
            product.current_stock - 2
        );
        assert!(state.orders.get(&order.id).await.is_some());
    }

    #[tokio::test]
    async fn test_place_order_rejects_empty_cart() {
        let dir = tempdir().unwrap();
        let state = AppState::outbox(dir.path()).await;
        let err = place_order(&state, draft(vec![])).await.unwrap_err();
        assert!(matches!(err, Error::Validation { msg: Msg::EmptyCart, .. }));
    }

    #[tokio::test]
    async fn test_place_order_rejects_oversell() {
        let dir = tempdir().unwrap();
        let state = AppState::outbox(dir.path()).await;
        let product = state.catalog.list().await.remove(0);
        let err = place_order(&state, draft(vec![line(&product.id, product.current_stock + 1)]))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::OutOfStock { .. }));
        // Nothing reserved on rejection.
        assert_eq!(
            state.catalog.get(&product.id).await.unwrap().current_stock,
            product.current_stock
        );
    }

    #[tokio::test]
    async fn test_webhook_is_idempotent_per_transaction() {
        let dir = tempdir().unwrap();
        let state = AppState::outbox(dir.path()).await;
        let product = state.catalog.list().await.remove(0);
        let payload = || WebhookPayload {
            order_id: "ORD9001".into(),
            transaction_id: "TXN-1".into(),
            status: "success".into(),
            amount: None,
            session_id: None,
            payment_method: Some("card".into()),
            order_data: Some(draft(vec![line(&product.id, 1)])),
        };

        let first = process_webhook(&state, payload()).await.unwrap();
        assert_eq!(first, WebhookOutcome::Delivered { order_id: "ORD9001".into() });
        let second = process_webhook(&state, payload()).await.unwrap();
        assert_eq!(second, WebhookOutcome::Duplicate);
        assert_eq!(state.payments.count().await, 1);
    }

    #[tokio::test]
    async fn test_webhook_failure_status_recorded_without_email() {
        let dir = tempdir().unwrap();
        let state = AppState::outbox(dir.path()).await;
        let payload = WebhookPayload {
            order_id: "ORD9002".into(),
            transaction_id: "TXN-2".into(),
            status: "failed".into(),
            amount: Some(Money::from_major(449)),
            session_id: None,
            payment_method: Some("card".into()),
            order_data: None,
        };
        assert_eq!(
            process_webhook(&state, payload).await.unwrap(),
            WebhookOutcome::GatewayFailure
        );
        let record = state.payments.latest_for_order("ORD9002").await.unwrap();
        assert_eq!(record.status, PaymentState::Failed);
        // No invoice files written for a failed payment.
        assert!(!dir.path().join("emails").join("ORD9002-customer.html").exists());
    }

    #[tokio::test]
    async fn test_webhook_missing_email_records_email_failed() {
        let dir = tempdir().unwrap();
        let state = AppState::outbox(dir.path()).await;
        let mut order_data = draft(vec![]);
        order_data.customer_email = String::new();
        let payload = WebhookPayload {
            order_id: "ORD9003".into(),
            transaction_id: "TXN-3".into(),
            status: "success".into(),
            amount: Some(Money::from_major(299)),
            session_id: None,
            payment_method: None,
            order_data: Some(order_data),
        };
        let err = process_webhook(&state, payload).await.unwrap_err();
        assert!(matches!(err, Error::MissingEmail { .. }));
        let record = state.payments.latest_for_order("ORD9003").await.unwrap();
        assert_eq!(record.status, PaymentState::EmailFailed);
    }

    #[tokio::test]
    async fn test_webhook_merges_session_draft() {
        let dir = tempdir().unwrap();
        let state = AppState::outbox(dir.path()).await;
        let product = state.catalog.list().await.remove(0);
        state
            .sessions
            .insert(crate::store::PaymentSession {
                session_id: "MSH-TEST".into(),
                order_id: "ORD9004".into(),
                amount: Money::from_major(299),
                return_url: None,
                order_data: Some(draft(vec![line(&product.id, 1)])),
                created_at: chrono::Utc::now(),
            })
            .await
            .unwrap();

        // Payload carries no order data at all; everything comes from the session.
        let payload = WebhookPayload {
            order_id: "ORD9004".into(),
            transaction_id: "TXN-4".into(),
            status: "success".into(),
            amount: None,
            session_id: Some("MSH-TEST".into()),
            payment_method: Some("card".into()),
            order_data: None,
        };
        let outcome = process_webhook(&state, payload).await.unwrap();
        assert_eq!(outcome, WebhookOutcome::Delivered { order_id: "ORD9004".into() });
        assert!(dir.path().join("emails").join("ORD9004-customer.html").exists());
    }

    #[tokio::test]
    async fn test_resend_invoice_marks_delivered() {
        let dir = tempdir().unwrap();
        let state = AppState::outbox(dir.path()).await;
        let product = state.catalog.list().await.remove(0);
        let order = place_order(&state, draft(vec![line(&product.id, 1)])).await.unwrap();
        state
            .payments
            .record(PaymentRecord {
                order_id: order.id.clone(),
                transaction_id: Some("TXN-5".into()),
                status: PaymentState::EmailFailed,
                amount: order.totals.total,
                payment_method: Some("card".into()),
                processed_at: chrono::Utc::now(),
                session_id: None,
                note: None,
            })
            .await
            .unwrap();

        resend_invoice(&state, &order.id).await.unwrap();
        let record = state.payments.latest_for_order(&order.id).await.unwrap();
        assert_eq!(record.status, PaymentState::Success);
    }

    #[tokio::test]
    async fn test_resend_keeps_failed_gateway_record() {
        let dir = tempdir().unwrap();
        let state = AppState::outbox(dir.path()).await;
        let product = state.catalog.list().await.remove(0);
        let order = place_order(&state, draft(vec![line(&product.id, 1)])).await.unwrap();
        state
            .payments
            .record(PaymentRecord {
                order_id: order.id.clone(),
                transaction_id: Some("TXN-6".into()),
                status: PaymentState::Failed,
                amount: order.totals.total,
                payment_method: Some("card".into()),
                processed_at: chrono::Utc::now(),
                session_id: None,
                note: None,
            })
            .await
            .unwrap();

        resend_invoice(&state, &order.id).await.unwrap();
        // The failed gateway record stays; the resend appends its own entry.
        assert_eq!(state.payments.count().await, 2);
        let latest = state.payments.latest_for_order(&order.id).await.unwrap();
        assert_eq!(latest.status, PaymentState::Success);
        assert!(state.payments.email_failed(10).await.is_empty());
    }

    #[tokio::test]
    async fn test_resend_invoice_unknown_order() {
        let dir = tempdir().unwrap();
        let state = AppState::outbox(dir.path()).await;
        let err = resend_invoice(&state, "ORD-MISSING").await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }
}
