use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;
use crate::domain::aggregates::{Category, Product};
use super::{CatalogStore, ProductQuery, StoreError};

#[derive(Default)]
struct Inner {
    categories: Vec<Category>,
    products: Vec<Product>,
}

/// Process-local store used in tests and when no database is configured.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        let mut categories = self.inner.read().await.categories.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn find_category(&self, slug: &str) -> Result<Option<Category>, StoreError> {
        Ok(self.inner.read().await.categories.iter().find(|c| c.slug == slug).cloned())
    }

    async fn insert_category(&self, category: &Category) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if inner.categories.iter().any(|c| c.slug == category.slug) {
            return Err(StoreError::Conflict(format!("category {}", category.slug)));
        }
        inner.categories.push(category.clone());
        Ok(())
    }

    async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>, StoreError> {
        let inner = self.inner.read().await;
        let mut products: Vec<Product> = inner.products.iter().rev().filter(|p| query.matches(p)).cloned().collect();
        query.sort(&mut products);
        Ok(products)
    }

    async fn find_product(&self, id: Uuid) -> Result<Option<Product>, StoreError> {
        Ok(self.inner.read().await.products.iter().find(|p| p.id() == id).cloned())
    }

    async fn insert_product(&self, product: &Product) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if inner.products.iter().any(|p| p.id() == product.id()) {
            return Err(StoreError::Conflict(format!("product {}", product.id())));
        }
        inner.products.push(product.clone());
        Ok(())
    }
}
