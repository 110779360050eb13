use axum::{extract::{Path, State}, http::StatusCode, Json};
use serde::Serialize;
use super::{ApiResponse, AppState};
use crate::domain::aggregates::{Category, CategoryTree};
use crate::domain::sizing::{MeasurementSystem, SizeLabel};
use crate::service::{NewCategory, SizeVocabulary};
use crate::Result;

pub async fn list(State(s): State<AppState>) -> Result<Json<ApiResponse<Vec<Category>>>> {
    Ok(ApiResponse::ok(s.catalog.list_categories().await?))
}

pub async fn tree(State(s): State<AppState>) -> Result<Json<ApiResponse<CategoryTree>>> {
    Ok(ApiResponse::ok(s.catalog.category_tree().await?))
}

pub async fn create(State(s): State<AppState>, Json(req): Json<NewCategory>) -> Result<(StatusCode, Json<ApiResponse<Category>>)> {
    let category = s.catalog.create_category(req).await?;
    Ok(ApiResponse::created("Category created", category))
}

pub async fn sizes(State(s): State<AppState>, Path(slug): Path<String>) -> Result<Json<ApiResponse<SizeVocabulary>>> {
    Ok(ApiResponse::ok(s.catalog.size_vocabulary(&slug).await?))
}

#[derive(Debug, Serialize)]
pub struct MeasurementSystemInfo {
    pub tag: MeasurementSystem,
    pub label: &'static str,
    pub sizes: Vec<SizeLabel>,
}

pub async fn measurement_systems() -> Json<ApiResponse<Vec<MeasurementSystemInfo>>> {
    ApiResponse::ok(
        MeasurementSystem::ALL
            .iter()
            .map(|m| MeasurementSystemInfo { tag: *m, label: m.label(), sizes: m.sizes() })
            .collect(),
    )
}
