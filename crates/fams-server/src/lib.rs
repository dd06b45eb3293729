//! FAMS Server Library
#![recursion_limit = "256"]
//!
//! HTTP server for the fixed-asset management system.
//!
//! # Overview
//!
//! - **Bulk import**: CSV uploads processed row by row with live progress over SSE
//! - **Entities**: facilities, vendors and assets, each with its own import pipeline
//! - **Database**: PostgreSQL through SQLx, with embedded migrations
//! - **Configuration**: environment-based, see [`config::Config::load`]
//!
//! # Architecture
//!
//! The [`import`] module is entity-agnostic. It drives any [`import::RowPipeline`]
//! through validation, duplicate detection, conversion and persistence, counting
//! every row exactly once and publishing progress snapshots as it goes.
//! Feature slices under [`features`] supply the pipelines and mount the
//! shared import endpoints next to their own list queries.
//!
//! # Example
//!
//! ```no_run
//! use fams_server::{api, config::Config, db};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let pool = db::create_pool(&config.database).await?;
//!     let app = api::create_router(api::AppState { db: pool, config })?;
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod features;
pub mod import;
pub mod middleware;

// Re-export commonly used types
pub use error::AppError;
