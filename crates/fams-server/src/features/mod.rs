//! Feature slices of the FAMS API
//!
//! Each entity is a vertical slice with its own import pipeline, list query
//! and routes. The shared import endpoints live in `imports` and are mounted
//! by every slice with that slice's pipeline and column layout.
//!
//! # Features
//!
//! - **facilities**: sites that hold assets
//! - **vendors**: suppliers assets are bought from
//! - **assets**: tracked equipment, referencing a facility and a vendor

pub mod assets;
pub mod facilities;
pub mod imports;
pub mod shared;
pub mod vendors;

use axum::Router;

use crate::config::ImportConfig;

/// Shared state for all feature routes
#[derive(Clone)]
pub struct FeatureState {
    /// PostgreSQL connection pool for database operations
    pub db: sqlx::PgPool,
    /// Progress cadence, stream lifetime and upload limits
    pub import: ImportConfig,
}

/// Creates the API router with every feature mounted under its own prefix
///
/// - `/facilities`
/// - `/vendors`
/// - `/assets`
///
/// Fails only if a pipeline's format rules do not compile.
pub fn router(state: FeatureState) -> Result<Router<()>, regex::Error> {
    Ok(Router::new()
        .nest(
            "/facilities",
            facilities::facilities_routes(state.db.clone(), state.import.clone()),
        )
        .nest(
            "/vendors",
            vendors::vendors_routes(state.db.clone(), state.import.clone())?,
        )
        .nest("/assets", assets::assets_routes(state.db, state.import)?))
}
