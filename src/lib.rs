//! Storefront Catalog
//!
//! Product catalog service for a storefront and its admin console.
//!
//! ## Features
//! - Category tree with per-category size vocabularies
//! - Multi-variant, multi-size product authoring with image upload
//! - Ordered submission validation
//! - Variant/size inventory lookup and selection for the product page
//! - Product listing with category, search and price-sort filters

pub mod api;
pub mod config;
pub mod domain;
pub mod editor;
pub mod media;
pub mod service;
pub mod store;

use thiserror::Error;

pub use config::Config;
pub use domain::aggregates::{Category, CategoryTree, Product, ProductVariant, SizeStock};
pub use domain::inventory::InventoryIndex;
pub use domain::selection::{Selection, SelectionParams};
pub use domain::sizing::{MeasurementSystem, SizeLabel};
pub use editor::{ProductDraft, ProductSubmission, ValidationError, VariantEditor};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Product not found")]
    ProductNotFound,

    #[error("Category not found")]
    CategoryNotFound,

    #[error("Parent category {0} does not exist")]
    ParentCategoryNotFound(String),

    #[error("Category {0} has no measurement system; product variants cannot be created for it")]
    MissingMeasurementSystem(String),

    #[error("Unknown measurement system {0}")]
    UnknownMeasurementSystem(String),

    #[error("A category with slug {0} already exists")]
    DuplicateSlug(String),

    #[error("{0}")]
    InvalidCategory(String),

    #[error(transparent)]
    Editor(#[from] editor::EditorError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Product(#[from] domain::aggregates::ProductError),

    #[error("Image upload failed: {0}")]
    Media(#[from] media::MediaError),

    #[error("Storage error: {0}")]
    Storage(#[from] store::StoreError),
}

pub type Result<T> = std::result::Result<T, CatalogError>;
