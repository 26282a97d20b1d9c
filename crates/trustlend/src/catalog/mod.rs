//! Item catalog — resources published by owners for rent.

pub mod item;
pub mod store;

pub use item::{GeoPoint, Item, ItemId, NewItem, PricePerDay};
pub use store::ItemCatalog;
