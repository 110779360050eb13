//! Catalog domain: products, variants, sizes, categories and the storefront read model
pub mod aggregates;
pub mod events;
pub mod inventory;
pub mod selection;
pub mod sizing;
pub mod value_objects;
