//! Inventory read model used on the storefront product page.
//!
//! [`InventoryIndex`] flattens a product's variants into a `(variant, size)`
//! lookup. It is rebuilt whenever the variant list changes and never mutated.

use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;
use crate::domain::aggregates::ProductVariant;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct StockEntry {
    pub stock: u32,
    pub availability: bool,
}

impl StockEntry {
    pub fn orderable_stock(&self) -> u32 {
        if self.availability { self.stock } else { 0 }
    }
}

#[derive(Clone, Debug, Default)]
pub struct InventoryIndex {
    entries: HashMap<(Uuid, Uuid), StockEntry>,
}

impl InventoryIndex {
    pub fn build(variants: &[ProductVariant]) -> Self {
        let entries = variants
            .iter()
            .flat_map(|v| {
                v.size_stocks
                    .iter()
                    .map(move |s| ((v.id, s.id), StockEntry { stock: s.stock, availability: s.availability }))
            })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn entry(&self, variant_id: Option<Uuid>, size_id: Option<Uuid>) -> Option<StockEntry> {
        match (variant_id, size_id) {
            (Some(v), Some(s)) => self.entries.get(&(v, s)).copied(),
            _ => None,
        }
    }

    /// Raw stock for the pair, 0 when either id is unset or the pair is unknown.
    pub fn stock(&self, variant_id: Option<Uuid>, size_id: Option<Uuid>) -> u32 {
        self.entry(variant_id, size_id).map(|e| e.stock).unwrap_or(0)
    }

    /// Stock that may actually be purchased: requires availability as well.
    pub fn orderable_stock(&self, variant_id: Option<Uuid>, size_id: Option<Uuid>) -> u32 {
        self.entry(variant_id, size_id).map(|e| e.orderable_stock()).unwrap_or(0)
    }
}

/// Quantity picker bound to the stock of the current selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuantitySelector {
    quantity: u32,
    max: u32,
}

impl QuantitySelector {
    pub fn new(stock: u32) -> Self { Self { quantity: 1, max: stock } }

    pub fn quantity(&self) -> u32 { self.quantity }
    pub fn max(&self) -> u32 { self.max }

    /// Clamp a requested quantity to `[1, stock]` (never below 1).
    pub fn set(mut self, requested: u32) -> Self {
        self.quantity = requested.min(self.max).max(1);
        self
    }

    pub fn increment(self) -> Self {
        if self.can_increase() { Self { quantity: self.quantity + 1, ..self } } else { self }
    }

    pub fn decrement(self) -> Self {
        if self.can_decrease() { Self { quantity: self.quantity - 1, ..self } } else { self }
    }

    pub fn can_increase(&self) -> bool { self.quantity < self.max }
    pub fn can_decrease(&self) -> bool { self.quantity > 1 }
}

/// Add-to-cart affordance state for the current selection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCart {
    pub enabled: bool,
    pub label: &'static str,
    pub stock: u32,
    pub quantity: QuantitySelector,
    pub stock_message: Option<String>,
}

impl AddToCart {
    pub fn resolve(index: &InventoryIndex, variant_id: Option<Uuid>, size_id: Option<Uuid>, requested: u32) -> Self {
        let stock = index.orderable_stock(variant_id, size_id);
        let quantity = QuantitySelector::new(stock).set(requested);
        let enabled = stock > 0 && quantity.quantity() <= stock;
        Self {
            enabled,
            label: if stock > 0 { "Add to Cart" } else { "Out of Stock" },
            stock,
            quantity,
            stock_message: (stock > 0).then(|| format!("{} in stock and ready to ship", stock)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::SizeStock;
    use rust_decimal::Decimal;

    fn size(stock: u32, availability: bool) -> SizeStock {
        SizeStock { id: Uuid::new_v4(), size: "M".into(), sku: String::new(), price: Decimal::ONE, stock, availability }
    }

    fn variant(sizes: Vec<SizeStock>) -> ProductVariant {
        ProductVariant { id: Uuid::new_v4(), color: "red".into(), images: vec![], size_stocks: sizes }
    }

    #[test]
    fn test_lookup_present_and_absent() {
        let v1 = variant(vec![size(5, true), size(0, false)]);
        let v2 = variant(vec![size(7, false)]);
        let index = InventoryIndex::build(&[v1.clone(), v2.clone()]);
        assert_eq!(index.len(), 3);
        assert_eq!(index.stock(Some(v1.id), Some(v1.size_stocks[0].id)), 5);
        assert_eq!(index.stock(Some(v2.id), Some(v2.size_stocks[0].id)), 7);
        assert_eq!(index.orderable_stock(Some(v2.id), Some(v2.size_stocks[0].id)), 0);
        // size belongs to a different variant
        assert_eq!(index.stock(Some(v1.id), Some(v2.size_stocks[0].id)), 0);
        assert_eq!(index.stock(None, Some(v1.size_stocks[0].id)), 0);
        assert_eq!(index.stock(Some(v1.id), None), 0);
    }

    #[test]
    fn test_quantity_clamp() {
        let q = QuantitySelector::new(5);
        assert_eq!(q.set(0).quantity(), 1);
        assert_eq!(q.set(9).quantity(), 5);
        let top = q.set(5);
        assert!(!top.can_increase());
        assert_eq!(top.increment().quantity(), 5);
        assert_eq!(q.decrement().quantity(), 1);
        assert!(!QuantitySelector::new(0).can_increase());
    }

    #[test]
    fn test_add_to_cart_states() {
        let v1 = variant(vec![size(5, true), size(0, false)]);
        let index = InventoryIndex::build(std::slice::from_ref(&v1));
        let ok = AddToCart::resolve(&index, Some(v1.id), Some(v1.size_stocks[0].id), 3);
        assert!(ok.enabled);
        assert_eq!(ok.quantity.max(), 5);
        assert_eq!(ok.stock_message.as_deref(), Some("5 in stock and ready to ship"));

        let blocked = AddToCart::resolve(&index, Some(v1.id), Some(v1.size_stocks[1].id), 1);
        assert!(!blocked.enabled);
        assert_eq!(blocked.label, "Out of Stock");
        assert!(blocked.stock_message.is_none());
    }

    #[test]
    fn test_available_flag_false_blocks_purchase() {
        let v = variant(vec![size(4, false)]);
        let index = InventoryIndex::build(std::slice::from_ref(&v));
        assert!(!AddToCart::resolve(&index, Some(v.id), Some(v.size_stocks[0].id), 1).enabled);
    }
}
