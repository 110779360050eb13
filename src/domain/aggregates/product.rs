//! Product Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use uuid::Uuid;
use crate::domain::events::{DomainEvent, ProductEvent};
use crate::domain::value_objects::{Discount, Slug};

/// Hosted image reference as returned by the media host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImage {
    pub public_id: String,
    pub secure_url: String,
    pub width: u32,
    pub height: u32,
}

/// Stock, price and availability of one size within one variant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeStock {
    pub id: Uuid,
    pub size: String,
    pub sku: String,
    pub price: Decimal,
    pub stock: u32,
    pub availability: bool,
}

impl SizeStock {
    /// A size can be ordered only when it is flagged available and has stock.
    pub fn is_orderable(&self) -> bool { self.availability && self.stock > 0 }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariant {
    pub id: Uuid,
    pub color: String,
    pub images: Vec<ProductImage>,
    pub size_stocks: Vec<SizeStock>,
}

impl ProductVariant {
    pub fn new(id: Uuid, color: impl Into<String>, images: Vec<ProductImage>, size_stocks: Vec<SizeStock>) -> Result<Self, ProductError> {
        let color = color.into();
        let mut seen = HashSet::new();
        for s in &size_stocks {
            if !seen.insert(s.size.as_str()) {
                return Err(ProductError::DuplicateSize { color, size: s.size.clone() });
            }
        }
        Ok(Self { id, color, images, size_stocks })
    }

    pub fn size(&self, size_id: Uuid) -> Option<&SizeStock> {
        self.size_stocks.iter().find(|s| s.id == size_id)
    }
}

/// Scalar fields of a product about to be created.
#[derive(Clone, Debug)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub features: Vec<String>,
    pub materials: Vec<String>,
    pub images: Vec<ProductImage>,
    pub discount: Discount,
    pub listed: bool,
    pub category_slug: String,
    pub variants: Vec<ProductVariant>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    id: Uuid,
    name: String,
    slug: String,
    description: String,
    tags: BTreeSet<String>,
    features: Vec<String>,
    materials: BTreeSet<String>,
    images: Vec<ProductImage>,
    discount: Discount,
    listed: bool,
    category_slug: String,
    variants: Vec<ProductVariant>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(skip)]
    events: Vec<DomainEvent>,
}

impl Product {
    pub fn create(new: NewProduct) -> Result<Self, ProductError> {
        let name = new.name.trim().to_string();
        if name.is_empty() { return Err(ProductError::MissingName); }
        if new.variants.is_empty() { return Err(ProductError::NoVariants); }
        let id = Uuid::now_v7();
        let now = Utc::now();
        let slug = Slug::from_name(&name).into_inner();
        let mut product = Self {
            id, slug: slug.clone(), name, description: new.description.trim().to_string(),
            tags: clean_set(new.tags), features: clean_list(new.features), materials: clean_set(new.materials),
            images: new.images, discount: new.discount, listed: new.listed, category_slug: new.category_slug,
            variants: new.variants, created_at: now, updated_at: now, events: vec![],
        };
        product.raise_event(DomainEvent::Product(ProductEvent::Created {
            product_id: id,
            slug,
            category_slug: product.category_slug.clone(),
            variant_count: product.variants.len(),
        }));
        Ok(product)
    }

    /// Rebuild a stored product without raising events.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: Uuid, name: String, slug: String, description: String, tags: Vec<String>, features: Vec<String>,
        materials: Vec<String>, images: Vec<ProductImage>, discount: Discount, listed: bool, category_slug: String,
        variants: Vec<ProductVariant>, created_at: DateTime<Utc>, updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id, name, slug, description, tags: tags.into_iter().collect(), features,
            materials: materials.into_iter().collect(), images, discount, listed, category_slug, variants,
            created_at, updated_at, events: vec![],
        }
    }

    pub fn id(&self) -> Uuid { self.id }
    pub fn name(&self) -> &str { &self.name }
    pub fn slug(&self) -> &str { &self.slug }
    pub fn description(&self) -> &str { &self.description }
    pub fn tags(&self) -> &BTreeSet<String> { &self.tags }
    pub fn features(&self) -> &[String] { &self.features }
    pub fn materials(&self) -> &BTreeSet<String> { &self.materials }
    pub fn images(&self) -> &[ProductImage] { &self.images }
    pub fn discount(&self) -> Discount { self.discount }
    pub fn is_listed(&self) -> bool { self.listed }
    pub fn category_slug(&self) -> &str { &self.category_slug }
    pub fn variants(&self) -> &[ProductVariant] { &self.variants }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }

    pub fn variant(&self, variant_id: Uuid) -> Option<&ProductVariant> {
        self.variants.iter().find(|v| v.id == variant_id)
    }

    /// Cheapest size-stock price across all variants.
    pub fn lowest_price(&self) -> Option<Decimal> {
        self.variants.iter().flat_map(|v| v.size_stocks.iter().map(|s| s.price)).min()
    }

    pub fn final_price(&self) -> Option<Decimal> {
        self.lowest_price().map(|p| self.discount.apply(p))
    }

    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.name.to_lowercase().contains(&needle) || self.description.to_lowercase().contains(&needle)
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
}

fn clean_list(values: Vec<String>) -> Vec<String> {
    values.into_iter().map(|v| v.trim().to_string()).filter(|v| !v.is_empty()).collect()
}

fn clean_set(values: Vec<String>) -> BTreeSet<String> {
    clean_list(values).into_iter().collect()
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProductError {
    #[error("Product name is required.")]
    MissingName,
    #[error("Add at least one product variant.")]
    NoVariants,
    #[error("Variant {color} lists size {size} more than once.")]
    DuplicateSize { color: String, size: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size(label: &str, price: i64, stock: u32, availability: bool) -> SizeStock {
        SizeStock { id: Uuid::new_v4(), size: label.into(), sku: String::new(), price: Decimal::new(price, 0), stock, availability }
    }

    fn new_product(variants: Vec<ProductVariant>) -> NewProduct {
        NewProduct {
            name: "  Cool T-Shirt ".into(), description: "Everyday tee".into(),
            tags: vec!["new".into(), " new ".into(), "".into()], features: vec!["soft".into(), "".into()],
            materials: vec!["cotton".into()], images: vec![], discount: Discount::new(10), listed: true,
            category_slug: "men".into(), variants,
        }
    }

    #[test]
    fn test_duplicate_size_rejected() {
        let err = ProductVariant::new(Uuid::new_v4(), "red", vec![], vec![size("M", 1, 1, true), size("M", 1, 1, true)]).unwrap_err();
        assert_eq!(err, ProductError::DuplicateSize { color: "red".into(), size: "M".into() });
    }

    #[test]
    fn test_orderable_requires_stock_and_availability() {
        assert!(size("S", 1, 5, true).is_orderable());
        assert!(!size("S", 1, 0, true).is_orderable());
        assert!(!size("S", 1, 5, false).is_orderable());
    }

    #[test]
    fn test_product_create() {
        let v = ProductVariant::new(Uuid::new_v4(), "red", vec![], vec![size("S", 30, 1, true), size("M", 20, 1, true)]).unwrap();
        let mut p = Product::create(new_product(vec![v])).unwrap();
        assert_eq!(p.name(), "Cool T-Shirt");
        assert_eq!(p.slug(), "cool-t-shirt");
        assert_eq!(p.tags().len(), 1);
        assert_eq!(p.features(), ["soft"]);
        assert_eq!(p.lowest_price(), Some(Decimal::new(20, 0)));
        assert_eq!(p.final_price(), Some(Decimal::new(18, 0)));
        assert!(p.matches_search("COOL"));
        assert_eq!(p.take_events().len(), 1);
        assert!(p.take_events().is_empty());
    }

    #[test]
    fn test_product_requires_variants() {
        assert_eq!(Product::create(new_product(vec![])).unwrap_err(), ProductError::NoVariants);
    }
}
