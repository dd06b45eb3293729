pub mod list;

pub use list::FacilityListItem;
