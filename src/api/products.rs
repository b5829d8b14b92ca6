//! Catalog listing and admin product CRUD.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::api::require_admin;
use crate::domain::{Bilingual, Language, Money, Product, Sku};
use crate::error::{Error, Result};
use crate::i18n::Msg;
use crate::state::AppState;

pub async fn list(State(state): State<AppState>) -> Json<serde_json::Value> {
    let products = state.catalog.list().await;
    Json(json!({ "success": true, "products": products }))
}

pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>> {
    state.catalog.get(&id).await.map(Json).ok_or(Error::NotFound {
        msg: Msg::ProductNotFound,
        language: Language::default(),
    })
}

#[derive(Debug, Deserialize)]
pub struct ProductBody {
    pub name_ar: String,
    pub name_en: String,
    #[serde(default)]
    pub sku: Option<String>,
    pub price: Money,
    #[serde(default)]
    pub discount: u32,
    #[serde(default)]
    pub stock: Option<u32>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub badge: Option<String>,
    #[serde(default)]
    pub description_ar: Option<String>,
    #[serde(default)]
    pub description_en: Option<String>,
}

pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ProductBody>,
) -> Result<(StatusCode, Json<Product>)> {
    require_admin(&state, &headers)?;
    let sku = match body.sku.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => Sku::new(raw).map_err(|_| Error::Validation {
            msg: Msg::InvalidSku,
            language: Language::default(),
        })?,
        None => Sku::generate(),
    };
    let next_id = state
        .catalog
        .list()
        .await
        .iter()
        .filter_map(|p| p.id.parse::<u64>().ok())
        .max()
        .unwrap_or(0)
        + 1;
    let mut product = Product::new(
        next_id.to_string(),
        Bilingual::new(body.name_ar, body.name_en),
        sku,
        body.price,
        body.stock.unwrap_or_default(),
    );
    product.discount = body.discount.min(100);
    product.image = body.image.unwrap_or_default();
    product.category = body.category.unwrap_or_else(|| "abaya".to_string());
    product.badge = body.badge;
    product.description = Bilingual::new(
        body.description_ar.unwrap_or_default(),
        body.description_en.unwrap_or_default(),
    );
    state.catalog.insert(product.clone()).await?;
    tracing::info!(product_id = %product.id, sku = %product.sku, "product created");
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<ProductBody>,
) -> Result<Json<Product>> {
    require_admin(&state, &headers)?;
    let updated = state
        .catalog
        .update(&id, |product| {
            product.name = Bilingual::new(body.name_ar.clone(), body.name_en.clone());
            product.price = body.price;
            product.discount = body.discount.min(100);
            // Leave stock untouched when the update does not carry it.
            if let Some(stock) = body.stock {
                product.current_stock = stock;
            }
            if let Some(image) = &body.image {
                product.image = image.clone();
            }
            if let Some(category) = &body.category {
                product.category = category.clone();
            }
            product.badge = body.badge.clone();
        })
        .await?;
    updated.map(Json).ok_or(Error::NotFound {
        msg: Msg::ProductNotFound,
        language: Language::default(),
    })
}

pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode> {
    require_admin(&state, &headers)?;
    if state.catalog.delete(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::NotFound { msg: Msg::ProductNotFound, language: Language::default() })
    }
}
