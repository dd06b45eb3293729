//! Facility API routes
//!
//! - `GET /api/v1/facilities` - List facilities with pagination
//! - `POST /api/v1/facilities/import` - Bulk import from CSV (SSE progress)
//! - `POST /api/v1/facilities/import/error-report` - Error report download
//! - `GET /api/v1/facilities/import/template` - Upload template download

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use sqlx::PgPool;

use super::pipeline::{FacilityPipeline, SCHEMA};
use super::queries;
use crate::api::response::ApiResponse;
use crate::config::ImportConfig;
use crate::error::AppError;
use crate::features::imports::{import_routes, ImportState};
use crate::features::shared::PaginationParams;

pub fn facilities_routes(pool: PgPool, import: ImportConfig) -> Router {
    let imports = import_routes(ImportState::new(
        FacilityPipeline::new(pool.clone()),
        &SCHEMA,
        import,
    ));

    Router::new()
        .route("/", get(list_facilities))
        .with_state(pool)
        .merge(imports)
}

#[tracing::instrument(skip(pool))]
async fn list_facilities(
    State(pool): State<PgPool>,
    Query(params): Query<PaginationParams>,
) -> Result<Response, AppError> {
    params.validate()?;
    let page = queries::list::handle(&pool, &params).await?;
    let meta = serde_json::to_value(&page.pagination).map_err(fams_common::FamsError::from)?;

    Ok(ApiResponse::success_with_meta(page.items, meta).into_response())
}
