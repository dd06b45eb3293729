//! Vendors: suppliers assets are purchased from

pub mod pipeline;
pub mod queries;
pub mod routes;

pub use pipeline::{NewVendor, VendorPipeline, VendorRow, SCHEMA};
pub use queries::VendorListItem;
pub use routes::vendors_routes;
