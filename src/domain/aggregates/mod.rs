//! Aggregates module
pub mod product;
pub mod category;

pub use product::{NewProduct, Product, ProductError, ProductImage, ProductVariant, SizeStock};
pub use category::{Category, CategoryNode, CategoryTree};
