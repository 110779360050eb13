use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use std::collections::HashMap;
use uuid::Uuid;
use crate::domain::aggregates::{Category, Product, ProductImage, ProductVariant, SizeStock};
use crate::domain::value_objects::Discount;
use super::{CatalogStore, ProductQuery, StoreError};

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow { id: Uuid, name: String, slug: String, parent_slug: Option<String>, measurement_system: Option<String>, created_at: DateTime<Utc> }

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: Uuid, name: String, slug: String, description: String,
    tags: Vec<String>, features: Vec<String>, materials: Vec<String>, images: Json<Vec<ProductImage>>,
    discount: Decimal, listed: bool, category_slug: String,
    created_at: DateTime<Utc>, updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct VariantRow { id: Uuid, product_id: Uuid, color: String, images: Json<Vec<ProductImage>> }

#[derive(Debug, sqlx::FromRow)]
struct SizeRow { id: Uuid, variant_id: Uuid, size: String, sku: String, price: Decimal, stock: i32, availability: bool }

impl From<CategoryRow> for Category {
    fn from(r: CategoryRow) -> Self {
        Category { id: r.id, name: r.name, slug: r.slug, parent_slug: r.parent_slug, measurement_system: r.measurement_system, created_at: r.created_at }
    }
}

/// Postgres-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new().max_connections(max_connections).connect(url).await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self { Self { pool } }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    async fn hydrate(&self, rows: Vec<ProductRow>) -> Result<Vec<Product>, StoreError> {
        if rows.is_empty() { return Ok(vec![]); }
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let variant_rows = sqlx::query_as::<_, VariantRow>("SELECT id, product_id, color, images FROM product_variants WHERE product_id = ANY($1) ORDER BY product_id, position")
            .bind(&ids).fetch_all(&self.pool).await?;
        let variant_ids: Vec<Uuid> = variant_rows.iter().map(|v| v.id).collect();
        let size_rows = sqlx::query_as::<_, SizeRow>("SELECT id, variant_id, size, sku, price, stock, availability FROM size_stocks WHERE variant_id = ANY($1) ORDER BY variant_id, position")
            .bind(&variant_ids).fetch_all(&self.pool).await?;

        let mut sizes: HashMap<Uuid, Vec<SizeStock>> = HashMap::new();
        for s in size_rows {
            sizes.entry(s.variant_id).or_default().push(SizeStock {
                id: s.id, size: s.size, sku: s.sku, price: s.price, stock: s.stock.max(0) as u32, availability: s.availability,
            });
        }
        let mut variants: HashMap<Uuid, Vec<ProductVariant>> = HashMap::new();
        for v in variant_rows {
            let size_stocks = sizes.remove(&v.id).unwrap_or_default();
            variants.entry(v.product_id).or_default().push(ProductVariant { id: v.id, color: v.color, images: v.images.0, size_stocks });
        }

        Ok(rows
            .into_iter()
            .map(|r| {
                let vs = variants.remove(&r.id).unwrap_or_default();
                Product::restore(
                    r.id, r.name, r.slug, r.description, r.tags, r.features, r.materials, r.images.0,
                    Discount::new(r.discount), r.listed, r.category_slug, vs, r.created_at, r.updated_at,
                )
            })
            .collect())
    }
}

fn conflict(e: sqlx::Error, what: String) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Conflict(what),
        _ => StoreError::Database(e),
    }
}

fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len() + 2);
    out.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') { out.push('\\'); }
        out.push(ch);
    }
    out.push('%');
    out
}

fn clamp_i32(v: u32) -> i32 { i32::try_from(v).unwrap_or(i32::MAX) }

#[async_trait]
impl CatalogStore for PgStore {
    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        let rows = sqlx::query_as::<_, CategoryRow>("SELECT id, name, slug, parent_slug, measurement_system, created_at FROM categories ORDER BY name")
            .fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    async fn find_category(&self, slug: &str) -> Result<Option<Category>, StoreError> {
        let row = sqlx::query_as::<_, CategoryRow>("SELECT id, name, slug, parent_slug, measurement_system, created_at FROM categories WHERE slug = $1")
            .bind(slug).fetch_optional(&self.pool).await?;
        Ok(row.map(Category::from))
    }

    async fn insert_category(&self, c: &Category) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO categories (id, name, slug, parent_slug, measurement_system, created_at) VALUES ($1, $2, $3, $4, $5, $6)")
            .bind(c.id).bind(&c.name).bind(&c.slug).bind(&c.parent_slug).bind(&c.measurement_system).bind(c.created_at)
            .execute(&self.pool).await.map_err(|e| conflict(e, format!("category {}", c.slug)))?;
        Ok(())
    }

    async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            "SELECT * FROM products \
             WHERE ($1 OR listed) \
               AND ($2::text IS NULL OR category_slug = $2 OR category_slug = ANY($4)) \
               AND ($3::text IS NULL OR name ILIKE $3 OR description ILIKE $3) \
             ORDER BY created_at DESC",
        )
        .bind(query.include_unlisted)
        .bind(query.category_slug())
        .bind(query.search_term().map(escape_like))
        .bind(&query.subcategories)
        .fetch_all(&self.pool).await?;
        let mut products = self.hydrate(rows).await?;
        query.sort(&mut products);
        Ok(products)
    }

    async fn find_product(&self, id: Uuid) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE id = $1").bind(id).fetch_optional(&self.pool).await?;
        Ok(self.hydrate(row.into_iter().collect()).await?.pop())
    }

    async fn insert_product(&self, p: &Product) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        let tags: Vec<String> = p.tags().iter().cloned().collect();
        let materials: Vec<String> = p.materials().iter().cloned().collect();
        sqlx::query("INSERT INTO products (id, name, slug, description, tags, features, materials, images, discount, listed, category_slug, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)")
            .bind(p.id()).bind(p.name()).bind(p.slug()).bind(p.description())
            .bind(&tags).bind(p.features()).bind(&materials).bind(Json(p.images()))
            .bind(p.discount().percent()).bind(p.is_listed()).bind(p.category_slug())
            .bind(p.created_at()).bind(p.updated_at())
            .execute(&mut *tx).await.map_err(|e| conflict(e, format!("product {}", p.id())))?;

        for (vi, v) in p.variants().iter().enumerate() {
            sqlx::query("INSERT INTO product_variants (id, product_id, position, color, images) VALUES ($1, $2, $3, $4, $5)")
                .bind(v.id).bind(p.id()).bind(vi as i32).bind(&v.color).bind(Json(&v.images))
                .execute(&mut *tx).await?;
            for (si, s) in v.size_stocks.iter().enumerate() {
                sqlx::query("INSERT INTO size_stocks (id, variant_id, position, size, sku, price, stock, availability) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)")
                    .bind(s.id).bind(v.id).bind(si as i32).bind(&s.size).bind(&s.sku).bind(s.price).bind(clamp_i32(s.stock)).bind(s.availability)
                    .execute(&mut *tx).await
                    .map_err(|e| conflict(e, format!("size {} of variant {}", s.size, v.color)))?;
            }
        }
        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "%50\\%\\_off\\\\%");
        assert_eq!(escape_like("tee"), "%tee%");
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp_i32(42), 42);
        assert_eq!(clamp_i32(u32::MAX), i32::MAX);
    }
}
