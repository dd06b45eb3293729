//! Bulk import endpoints, shared by every importable entity
//!
//! Mounted under each entity's prefix:
//! - `POST /import` - upload a CSV (`file` field), answered with an SSE progress stream
//! - `POST /import/error-report` - replay a terminal snapshot's errors as a CSV download
//! - `GET /import/template` - header-only CSV for the entity

pub mod routes;

pub use routes::{import_routes, ErrorReportRequest, ImportApiError, ImportState};
