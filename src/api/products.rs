use axum::{extract::{Multipart, Path, Query, RawQuery, State}, http::StatusCode, Json};
use serde::Deserialize;
use uuid::Uuid;
use super::{multipart::read_parts, ApiResponse, AppState};
use crate::domain::aggregates::Product;
use crate::editor::ProductSubmission;
use crate::service::{ProductView, SelectionAction};
use crate::store::{PriceSort, ProductQuery};
use crate::Result;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub search: Option<String>,
    pub category: Option<String>,
    pub price: Option<PriceSort>,
}

pub async fn list(State(s): State<AppState>, Query(p): Query<ListParams>) -> Result<Json<ApiResponse<Vec<Product>>>> {
    let query = ProductQuery { search: p.search, category: p.category, price: p.price, include_unlisted: false, subcategories: vec![] };
    Ok(ApiResponse::ok(s.catalog.list_products(&query).await?))
}

pub async fn create(State(s): State<AppState>, multipart: Multipart) -> Result<(StatusCode, Json<ApiResponse<Product>>)> {
    let submission = ProductSubmission::from_parts(read_parts(multipart).await?)?;
    let product = s.catalog.create_product(submission).await?;
    Ok(ApiResponse::created("Product created", product))
}

#[derive(Debug, Default, Deserialize)]
pub struct QuantityParam {
    pub quantity: Option<u32>,
}

pub async fn show(State(s): State<AppState>, Path(id): Path<Uuid>, RawQuery(raw): RawQuery) -> Result<Json<ApiResponse<ProductView>>> {
    Ok(ApiResponse::ok(s.catalog.product_view(id, raw.as_deref().unwrap_or(""), 1).await?))
}

pub async fn selection(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
    Query(q): Query<QuantityParam>,
    RawQuery(raw): RawQuery,
) -> Result<Json<ApiResponse<ProductView>>> {
    let view = s.catalog.product_view(id, raw.as_deref().unwrap_or(""), q.quantity.unwrap_or(1)).await?;
    Ok(ApiResponse::ok(view))
}

pub async fn select(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
    Query(q): Query<QuantityParam>,
    RawQuery(raw): RawQuery,
    Json(action): Json<SelectionAction>,
) -> Result<Json<ApiResponse<ProductView>>> {
    let view = s.catalog.select(id, raw.as_deref().unwrap_or(""), action, q.quantity.unwrap_or(1)).await?;
    Ok(ApiResponse::ok(view))
}
