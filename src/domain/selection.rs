//! Color/size selection on the product page.
//!
//! The selection moves `NoColorSelected -> ColorSelected -> SizeSelected`.
//! It is externalized through a [`SelectionCarrier`] (query parameters on the
//! storefront) so it survives navigation and can be bookmarked.

use serde::{Deserialize, Serialize};
use url::form_urlencoded;
use uuid::Uuid;
use crate::domain::aggregates::ProductVariant;

pub const VARIANT_KEY: &str = "variantId";
pub const SIZE_KEY: &str = "sizeId";
const PAGE_KEY: &str = "page";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionParams {
    pub variant_id: Option<Uuid>,
    pub size_id: Option<Uuid>,
}

/// Host storage for the shareable selection state.
pub trait SelectionCarrier {
    fn load(&self) -> SelectionParams;
    fn store(&mut self, params: &SelectionParams);
}

/// Query-string carrier. Unrelated parameters are preserved in order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryString {
    pairs: Vec<(String, String)>,
}

impl QueryString {
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        Self { pairs: form_urlencoded::parse(query.as_bytes()).into_owned().collect() }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn set(&mut self, key: &str, value: String) {
        match self.pairs.iter().position(|(k, _)| k == key) {
            Some(i) => {
                self.pairs[i].1 = value;
                let mut seen = false;
                self.pairs.retain(|(k, _)| k != key || !std::mem::replace(&mut seen, true));
            }
            None => self.pairs.push((key.to_string(), value)),
        }
    }

    pub fn remove(&mut self, key: &str) {
        self.pairs.retain(|(k, _)| k != key);
    }

    pub fn to_query(&self) -> String {
        form_urlencoded::Serializer::new(String::new()).extend_pairs(&self.pairs).finish()
    }
}

impl SelectionCarrier for QueryString {
    /// Malformed ids read as absent.
    fn load(&self) -> SelectionParams {
        let id = |key| self.get(key).and_then(|v| Uuid::parse_str(v).ok());
        SelectionParams { variant_id: id(VARIANT_KEY), size_id: id(SIZE_KEY) }
    }

    fn store(&mut self, params: &SelectionParams) {
        if self.load().size_id != params.size_id {
            self.remove(PAGE_KEY);
        }
        for (key, value) in [(VARIANT_KEY, params.variant_id), (SIZE_KEY, params.size_id)] {
            match value {
                Some(id) => self.set(key, id.to_string()),
                None => self.remove(key),
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SelectionState {
    NoColorSelected,
    ColorSelected,
    SizeSelected,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeOption {
    pub id: Uuid,
    pub size: String,
    pub stock: u32,
    pub selectable: bool,
    pub selected: bool,
}

#[derive(Clone, Debug)]
pub struct Selection<'a> {
    variants: &'a [ProductVariant],
    variant: Option<&'a ProductVariant>,
    size_id: Option<Uuid>,
    state: SelectionState,
}

impl<'a> Selection<'a> {
    /// First variant with its first size, as on first render.
    pub fn initial(variants: &'a [ProductVariant]) -> Self {
        let mut selection = Self { variants, variant: None, size_id: None, state: SelectionState::NoColorSelected };
        if let Some(first) = variants.first() {
            selection.enter_color(first);
        }
        selection
    }

    /// Resume from carried parameters, falling back to defaults for anything
    /// missing, unknown, or no longer orderable.
    pub fn restore(variants: &'a [ProductVariant], params: SelectionParams) -> Self {
        let Some(variant) = params.variant_id.and_then(|id| variants.iter().find(|v| v.id == id)) else {
            return Self::initial(variants);
        };
        let mut selection = Self { variants, variant: None, size_id: None, state: SelectionState::NoColorSelected };
        selection.enter_color(variant);
        if let Some(size_id) = params.size_id {
            selection.select_size(size_id);
        }
        selection
    }

    pub fn state(&self) -> SelectionState { self.state }
    pub fn variant(&self) -> Option<&'a ProductVariant> { self.variant }
    pub fn size_id(&self) -> Option<Uuid> { self.size_id }

    pub fn params(&self) -> SelectionParams {
        SelectionParams { variant_id: self.variant.map(|v| v.id), size_id: self.size_id }
    }

    /// Switch color. The size always resets to the new variant's first entry.
    pub fn select_color(&mut self, variant_id: Uuid) -> bool {
        if self.variant.is_some_and(|v| v.id == variant_id) {
            return false;
        }
        match self.variants.iter().find(|v| v.id == variant_id) {
            Some(v) => {
                self.enter_color(v);
                true
            }
            None => false,
        }
    }

    /// Pick a size of the current variant. Sizes that are unavailable or out
    /// of stock are ignored.
    pub fn select_size(&mut self, size_id: Uuid) -> bool {
        let Some(size) = self.variant.and_then(|v| v.size(size_id)) else { return false };
        if !size.is_orderable() {
            return false;
        }
        let changed = self.size_id != Some(size_id) || self.state != SelectionState::SizeSelected;
        self.size_id = Some(size_id);
        self.state = SelectionState::SizeSelected;
        changed
    }

    pub fn sizes(&self) -> Vec<SizeOption> {
        self.variant
            .map(|v| {
                v.size_stocks
                    .iter()
                    .map(|s| SizeOption {
                        id: s.id,
                        size: s.size.clone(),
                        stock: s.stock,
                        selectable: s.is_orderable(),
                        selected: self.size_id == Some(s.id),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn sync(&self, carrier: &mut impl SelectionCarrier) {
        carrier.store(&self.params());
    }

    fn enter_color(&mut self, variant: &'a ProductVariant) {
        self.variant = Some(variant);
        self.size_id = variant.size_stocks.first().map(|s| s.id);
        self.state = SelectionState::ColorSelected;
    }
}
