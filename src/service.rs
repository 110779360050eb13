//! Catalog orchestration: category authoring, product creation, storefront views

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;
use crate::domain::aggregates::{Category, CategoryTree, NewProduct, Product, ProductImage, ProductVariant, SizeStock};
use crate::domain::events::DomainEvent;
use crate::domain::inventory::{AddToCart, InventoryIndex};
use crate::domain::selection::{QueryString, Selection, SelectionState, SizeOption};
use crate::domain::sizing::{MeasurementSystem, SizeLabel};
use crate::domain::value_objects::{Sku, Slug};
use crate::editor::{ProductSubmission, SizeStockDraft, ValidationError, VariantEditor, VariantPayload};
use crate::media::{MediaError, MediaHost};
use crate::store::{CatalogStore, ProductQuery, StoreError};
use crate::{CatalogError, Result};

/// Publishes domain events to NATS when a client is configured.
#[derive(Clone, Default)]
pub struct EventPublisher {
    nats: Option<async_nats::Client>,
}

impl EventPublisher {
    pub fn new(nats: Option<async_nats::Client>) -> Self { Self { nats } }

    pub async fn publish(&self, event: &DomainEvent) {
        let subject = event.subject();
        let Some(client) = &self.nats else {
            tracing::debug!(subject, "No event bus configured, dropping event");
            return;
        };
        let payload = match serde_json::to_vec(event) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(subject, error = %e, "Failed to encode event");
                return;
            }
        };
        if let Err(e) = client.publish(subject.to_string(), payload.into()).await {
            tracing::warn!(subject, error = %e, "Failed to publish event");
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewCategory {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub parent_slug: Option<String>,
    pub measurement_system: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeVocabulary {
    pub category_slug: String,
    pub measurement_system: Option<String>,
    pub sizes: Vec<SizeLabel>,
    /// Blank rows an editor seeds a new variant with.
    pub template: Vec<SizeStockDraft>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", tag = "action", content = "id")]
pub enum SelectionAction {
    SelectColor(Uuid),
    SelectSize(Uuid),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionView {
    pub state: SelectionState,
    pub variant_id: Option<Uuid>,
    pub size_id: Option<Uuid>,
    pub color: Option<String>,
    pub images: Vec<ProductImage>,
    pub sizes: Vec<SizeOption>,
    pub add_to_cart: AddToCart,
    pub changed: bool,
    /// Query string to write back so the selection survives navigation.
    pub query: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub product: Product,
    pub final_price: Option<rust_decimal::Decimal>,
    pub selection: SelectionView,
}

#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
    media: Arc<dyn MediaHost>,
    events: EventPublisher,
}

impl CatalogService {
    pub fn new(store: Arc<dyn CatalogStore>, media: Arc<dyn MediaHost>, events: EventPublisher) -> Self {
        Self { store, media, events }
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        Ok(self.store.list_categories().await?)
    }

    pub async fn category_tree(&self) -> Result<CategoryTree> {
        Ok(CategoryTree::build(&self.store.list_categories().await?))
    }

    pub async fn create_category(&self, new: NewCategory) -> Result<Category> {
        new.validate().map_err(|e| CatalogError::InvalidCategory(e.to_string()))?;
        let name = new.name.trim();
        if name.is_empty() {
            return Err(CatalogError::InvalidCategory("Category name is required.".into()));
        }
        let slug = Slug::from_name(name).into_inner();
        if self.store.find_category(&slug).await?.is_some() {
            return Err(CatalogError::DuplicateSlug(slug));
        }
        let parent_slug = new.parent_slug.as_deref().map(str::trim).filter(|p| !p.is_empty()).map(str::to_string);
        if let Some(parent) = &parent_slug {
            if self.store.find_category(parent).await?.is_none() {
                return Err(CatalogError::ParentCategoryNotFound(parent.clone()));
            }
        }
        let measurement_system = match new.measurement_system.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
            Some(tag) => Some(MeasurementSystem::parse(tag).ok_or_else(|| CatalogError::UnknownMeasurementSystem(tag.to_string()))?),
            None => None,
        };

        let (category, event) = Category::create(name, slug, parent_slug, measurement_system);
        self.store.insert_category(&category).await.map_err(|e| match e {
            StoreError::Conflict(_) => CatalogError::DuplicateSlug(category.slug.clone()),
            other => other.into(),
        })?;
        tracing::info!(slug = %category.slug, parent = ?category.parent_slug, "Category created");
        self.events.publish(&event).await;
        Ok(category)
    }

    pub async fn size_vocabulary(&self, category_slug: &str) -> Result<SizeVocabulary> {
        let category = self.store.find_category(category_slug).await?.ok_or(CatalogError::CategoryNotFound)?;
        let editor = VariantEditor::new(category.measurement_system().map(|m| m.as_str()));
        let template = editor.rows()?.first().map(|v| v.size_stocks.clone()).unwrap_or_default();
        Ok(SizeVocabulary {
            category_slug: category.slug.clone(),
            measurement_system: category.measurement_system.clone(),
            sizes: editor.sizes().to_vec(),
            template,
        })
    }

    /// A category filter also matches products filed under its subcategories.
    pub async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>> {
        let Some(slug) = query.category_slug() else {
            return Ok(self.store.list_products(query).await?);
        };
        let tree = self.category_tree().await?;
        let mut scoped = query.clone();
        scoped.subcategories = tree.descendants(slug).into_iter().filter(|s| s.as_str() != slug).collect();
        Ok(self.store.list_products(&scoped).await?)
    }

    pub async fn find_product(&self, id: Uuid) -> Result<Product> {
        self.store.find_product(id).await?.ok_or(CatalogError::ProductNotFound)
    }

    /// Validate, upload every image, then persist. Nothing is left behind on
    /// failure: uploaded media is deleted again if a later step fails.
    pub async fn create_product(&self, submission: ProductSubmission) -> Result<Product> {
        submission.validate()?;
        let category = self
            .store
            .find_category(&submission.category_slug)
            .await?
            .ok_or(CatalogError::CategoryNotFound)?;
        if !category.accepts_variants() {
            return Err(CatalogError::MissingMeasurementSystem(category.slug));
        }
        check_vocabulary(&submission.variants, &category.sizes())?;
        let mut variants = submission.variants.iter().map(build_variant).collect::<Result<Vec<_>>>()?;

        let (images, variant_images) = self.upload_all(&submission).await?;
        let uploaded: Vec<String> = images
            .iter()
            .chain(variant_images.iter().flatten())
            .map(|i| i.public_id.clone())
            .collect();
        for (variant, imgs) in variants.iter_mut().zip(variant_images) {
            variant.images = imgs;
        }

        let created = Product::create(NewProduct {
            name: submission.name,
            description: submission.description,
            tags: submission.tags,
            features: submission.features,
            materials: submission.materials,
            images,
            discount: submission.discount,
            listed: submission.listed,
            category_slug: category.slug,
            variants,
        });
        let mut product = match created {
            Ok(p) => p,
            Err(e) => {
                self.discard(&uploaded).await;
                return Err(e.into());
            }
        };
        if let Err(e) = self.store.insert_product(&product).await {
            tracing::error!(error = %e, product = %product.slug(), "Failed to persist product");
            self.discard(&uploaded).await;
            return Err(e.into());
        }

        tracing::info!(id = %product.id(), slug = %product.slug(), variants = product.variants().len(), "Product created");
        for event in product.take_events() {
            self.events.publish(&event).await;
        }
        Ok(product)
    }

    pub async fn product_view(&self, id: Uuid, query: &str, quantity: u32) -> Result<ProductView> {
        self.product_view_with(id, query, None, quantity).await
    }

    pub async fn select(&self, id: Uuid, query: &str, action: SelectionAction, quantity: u32) -> Result<ProductView> {
        self.product_view_with(id, query, Some(action), quantity).await
    }

    async fn product_view_with(&self, id: Uuid, query: &str, action: Option<SelectionAction>, quantity: u32) -> Result<ProductView> {
        let product = self.find_product(id).await?;
        let selection = selection_view(&product, query, action, quantity);
        Ok(ProductView { final_price: product.final_price(), selection, product })
    }

    async fn upload_all(&self, submission: &ProductSubmission) -> Result<(Vec<ProductImage>, Vec<Vec<ProductImage>>)> {
        let mut done: Vec<String> = Vec::new();
        let mut images = Vec::with_capacity(submission.images.len());
        let mut variant_images = Vec::with_capacity(submission.variant_images.len());

        let outcome: std::result::Result<(), MediaError> = async {
            for file in &submission.images {
                let img = self.media.upload(file).await?;
                done.push(img.public_id.clone());
                images.push(img);
            }
            for files in &submission.variant_images {
                let mut uploaded = Vec::with_capacity(files.len());
                for file in files {
                    let img = self.media.upload(file).await?;
                    done.push(img.public_id.clone());
                    uploaded.push(img);
                }
                variant_images.push(uploaded);
            }
            Ok(())
        }
        .await;

        if let Err(e) = outcome {
            tracing::warn!(error = %e, uploaded = done.len(), "Image upload failed, aborting product creation");
            self.discard(&done).await;
            return Err(e.into());
        }
        Ok((images, variant_images))
    }

    async fn discard(&self, public_ids: &[String]) {
        for id in public_ids {
            if let Err(e) = self.media.delete(id).await {
                tracing::warn!(public_id = %id, error = %e, "Failed to delete orphaned image");
            }
        }
    }
}

/// Every size row must use a label from the category's vocabulary.
fn check_vocabulary(variants: &[VariantPayload], vocabulary: &[SizeLabel]) -> std::result::Result<(), ValidationError> {
    let allowed: HashSet<String> = vocabulary.iter().map(SizeLabel::to_string).collect();
    for v in variants {
        if let Some(s) = v.size_stocks.iter().find(|s| !allowed.contains(s.size.trim())) {
            return Err(ValidationError::SizeNotInCategory { color: v.color.clone(), size: s.size.clone() });
        }
    }
    Ok(())
}

fn build_variant(payload: &VariantPayload) -> Result<ProductVariant> {
    let size_stocks = payload
        .size_stocks
        .iter()
        .map(|s| -> Result<SizeStock> {
            let sku = Sku::normalize_optional(&s.sku)
                .map_err(|e| ValidationError::InvalidSku { color: payload.color.clone(), reason: format!("size {}: {}", s.size, e) })?;
            Ok(SizeStock { id: Uuid::now_v7(), size: s.size.trim().to_string(), sku, price: s.price, stock: s.stock, availability: s.availability })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(ProductVariant::new(Uuid::now_v7(), payload.color.trim(), vec![], size_stocks)?)
}

fn selection_view(product: &Product, query: &str, action: Option<SelectionAction>, quantity: u32) -> SelectionView {
    use crate::domain::selection::SelectionCarrier;

    let mut carrier = QueryString::parse(query);
    let mut selection = Selection::restore(product.variants(), carrier.load());
    let changed = match action {
        Some(SelectionAction::SelectColor(id)) => selection.select_color(id),
        Some(SelectionAction::SelectSize(id)) => selection.select_size(id),
        None => false,
    };
    selection.sync(&mut carrier);

    let index = InventoryIndex::build(product.variants());
    let params = selection.params();
    SelectionView {
        state: selection.state(),
        variant_id: params.variant_id,
        size_id: params.size_id,
        color: selection.variant().map(|v| v.color.clone()),
        images: selection.variant().map(|v| v.images.clone()).unwrap_or_default(),
        sizes: selection.sizes(),
        add_to_cart: AddToCart::resolve(&index, params.variant_id, params.size_id, quantity),
        changed,
        query: carrier.to_query(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::SizeStockPayload;
    use rust_decimal::Decimal;

    fn variant(color: &str, sizes: &[&str]) -> VariantPayload {
        VariantPayload {
            color: color.into(),
            images: vec![],
            size_stocks: sizes
                .iter()
                .map(|s| SizeStockPayload { size: (*s).into(), sku: String::new(), price: Decimal::ONE, stock: 1, availability: true })
                .collect(),
        }
    }

    #[test]
    fn test_sizes_must_come_from_category_vocabulary() {
        let alpha = MeasurementSystem::ClothingAlpha.sizes();
        assert!(check_vocabulary(&[variant("red", &["XS", "M", "OneSize"])], &alpha).is_ok());
        assert_eq!(
            check_vocabulary(&[variant("red", &["M"]), variant("blue", &["S", "28AA"])], &alpha),
            Err(ValidationError::SizeNotInCategory { color: "blue".into(), size: "28AA".into() })
        );

        let numeric = MeasurementSystem::ClothingNumeric.sizes();
        assert!(check_vocabulary(&[variant("black", &["32", "46"])], &numeric).is_ok());
        assert!(check_vocabulary(&[variant("black", &["31"])], &numeric).is_err());
        assert!(check_vocabulary(&[variant("black", &["M"])], &[]).is_err());
    }
}
