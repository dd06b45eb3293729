//! Assets: tracked equipment, located at a facility and optionally bought from a vendor

pub mod pipeline;
pub mod queries;
pub mod routes;

pub use pipeline::{AssetPipeline, AssetRow, NewAsset, SCHEMA};
pub use queries::AssetListItem;
pub use routes::assets_routes;
