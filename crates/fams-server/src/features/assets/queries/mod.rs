pub mod list;

pub use list::AssetListItem;
