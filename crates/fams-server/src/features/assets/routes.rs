//! Asset API routes
//!
//! - `GET /api/v1/assets` - List assets with pagination
//! - `POST /api/v1/assets/import` - Bulk import from CSV (SSE progress)
//! - `POST /api/v1/assets/import/error-report` - Error report download
//! - `GET /api/v1/assets/import/template` - Upload template download

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use sqlx::PgPool;

use super::pipeline::{AssetPipeline, SCHEMA};
use super::queries;
use crate::api::response::ApiResponse;
use crate::config::ImportConfig;
use crate::error::AppError;
use crate::features::imports::{import_routes, ImportState};
use crate::features::shared::PaginationParams;

pub fn assets_routes(pool: PgPool, import: ImportConfig) -> Result<Router, regex::Error> {
    let pipeline = AssetPipeline::new(pool.clone())?;
    let imports = import_routes(ImportState::new(pipeline, &SCHEMA, import));

    Ok(Router::new()
        .route("/", get(list_assets))
        .with_state(pool)
        .merge(imports))
}

#[tracing::instrument(skip(pool))]
async fn list_assets(
    State(pool): State<PgPool>,
    Query(params): Query<PaginationParams>,
) -> Result<Response, AppError> {
    params.validate()?;
    let page = queries::list::handle(&pool, &params).await?;
    let meta = serde_json::to_value(&page.pagination).map_err(fams_common::FamsError::from)?;

    Ok(ApiResponse::success_with_meta(page.items, meta).into_response())
}
