//! HTTP surface

pub mod categories;
pub mod multipart;
pub mod products;

use axum::{extract::DefaultBodyLimit, http::StatusCode, response::{IntoResponse, Response}, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use crate::{service::CatalogService, store::StoreError, CatalogError, Config};

#[derive(Clone)]
pub struct AppState {
    pub catalog: CatalogService,
    pub config: Arc<Config>,
}

/// Envelope shared by every endpoint.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self { success: true, message: "OK".into(), data: Some(data) })
    }

    pub fn created(message: impl Into<String>, data: T) -> (StatusCode, Json<Self>) {
        (StatusCode::CREATED, Json(Self { success: true, message: message.into(), data: Some(data) }))
    }
}

impl CatalogError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::ProductNotFound | Self::CategoryNotFound => StatusCode::NOT_FOUND,
            Self::DuplicateSlug(_) | Self::Storage(StoreError::Conflict(_)) => StatusCode::CONFLICT,
            Self::ParentCategoryNotFound(_)
            | Self::MissingMeasurementSystem(_)
            | Self::UnknownMeasurementSystem(_)
            | Self::InvalidCategory(_)
            | Self::Editor(_)
            | Self::Validation(_)
            | Self::Product(_) => StatusCode::BAD_REQUEST,
            Self::Media(crate::media::MediaError::Unreadable { .. }) => StatusCode::BAD_REQUEST,
            Self::Media(_) => StatusCode::BAD_GATEWAY,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, %status, "Request failed");
        } else {
            tracing::debug!(error = %self, %status, "Request rejected");
        }
        let body = ApiResponse::<()> { success: false, message: self.to_string(), data: None };
        (status, Json(body)).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    let media = ServeDir::new(&state.config.media_dir);
    let media_route = state.config.media_base_url.clone();
    let body_limit = state.config.max_upload_bytes;

    let api = Router::new()
        .route("/categories", get(categories::list).post(categories::create))
        .route("/categories/tree", get(categories::tree))
        .route("/categories/:slug/sizes", get(categories::sizes))
        .route("/measurement-systems", get(categories::measurement_systems))
        .route("/products", get(products::list).post(products::create))
        .route("/products/:id", get(products::show))
        .route("/products/:id/selection", get(products::selection).post(products::select));

    let app = Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "storefront-catalog"})) }))
        .nest("/api/v1", api);
    // Only serve uploads locally when the public base is a path on this host.
    let app = if media_route.len() > 1 && media_route.starts_with('/') { app.nest_service(&media_route, media) } else { app };

    app.layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
