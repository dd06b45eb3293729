pub mod list;

pub use list::VendorListItem;
