//! Persistence sink for categories and products

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use serde::Deserialize;
use uuid::Uuid;
use crate::domain::aggregates::{Category, Product};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("{0} already exists")]
    Conflict(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceSort {
    /// Low to high
    Lth,
    /// High to low
    Htl,
}

/// Storefront listing filters. Results default to newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub price: Option<PriceSort>,
    pub include_unlisted: bool,
    /// Slugs beneath `category` that also match it. Filled in from the
    /// category tree before the query reaches a store.
    pub subcategories: Vec<String>,
}

impl ProductQuery {
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn category_slug(&self) -> Option<&str> {
        self.category.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn matches(&self, product: &Product) -> bool {
        (self.include_unlisted || product.is_listed())
            && self.category_slug().map_or(true, |c| {
                product.category_slug() == c || self.subcategories.iter().any(|s| s == product.category_slug())
            })
            && self.search_term().map_or(true, |s| product.matches_search(s))
    }

    /// Order by lowest size price when requested. Unpriced products go last;
    /// ties keep their incoming order.
    pub fn sort(&self, products: &mut [Product]) {
        let Some(order) = self.price else { return };
        products.sort_by(|a, b| match (a.lowest_price(), b.lowest_price()) {
            (Some(x), Some(y)) => match order {
                PriceSort::Lth => x.cmp(&y),
                PriceSort::Htl => y.cmp(&x),
            },
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
    }
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// All categories ordered by name.
    async fn list_categories(&self) -> Result<Vec<Category>, StoreError>;
    async fn find_category(&self, slug: &str) -> Result<Option<Category>, StoreError>;
    async fn insert_category(&self, category: &Category) -> Result<(), StoreError>;
    async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>, StoreError>;
    async fn find_product(&self, id: Uuid) -> Result<Option<Product>, StoreError>;
    /// Writes the product with all variants and sizes, or nothing.
    async fn insert_product(&self, product: &Product) -> Result<(), StoreError>;
}
