//! Facilities: sites that hold assets

pub mod pipeline;
pub mod queries;
pub mod routes;

pub use pipeline::{FacilityPipeline, FacilityRow, NewFacility, SCHEMA};
pub use queries::FacilityListItem;
pub use routes::facilities_routes;
