//! Admin-side variant editor.
//!
//! [`VariantEditor`] holds the ordered variant drafts of one product being
//! authored. Every change goes through [`VariantEditor::apply`], which returns
//! a new editor value and leaves the previous one untouched.

pub mod submission;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::domain::sizing::{self, SizeLabel};

pub use submission::{FormPart, ProductDraft, ProductSubmission, SizeStockPayload, ValidationError, VariantPayload};

pub const NO_CATEGORY_MESSAGE: &str = "Please select a category to add Product variants and prices";

/// A locally selected file, not yet uploaded anywhere.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { file_name: file_name.into(), content_type: content_type.into(), bytes }
    }
}

impl std::fmt::Debug for ImageFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Size row as typed by the operator. Price and stock stay raw text until
/// submission so a blank field is distinguishable from zero.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeStockDraft {
    pub size: String,
    pub sku: String,
    pub price: String,
    pub stock: String,
    pub availability: bool,
}

impl SizeStockDraft {
    pub fn blank(size: &SizeLabel) -> Self {
        Self { size: size.to_string(), sku: String::new(), price: String::new(), stock: String::new(), availability: false }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VariantDraft {
    pub color: String,
    pub images: Vec<ImageFile>,
    /// Display-only references for the selected files.
    pub previews: Vec<String>,
    pub size_stocks: Vec<SizeStockDraft>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SizeField {
    Sku(String),
    Price(String),
    Stock(String),
    Availability(bool),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EditorMessage {
    AddVariant,
    RemoveVariant { variant: usize },
    SetColor { variant: usize, color: String },
    SetImages { variant: usize, files: Vec<ImageFile> },
    SetSizeField { variant: usize, size: usize, field: SizeField },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditorError {
    #[error("{}", NO_CATEGORY_MESSAGE)]
    NoMeasurementSystem,
    #[error("Variant {0} does not exist")]
    NoSuchVariant(usize),
    #[error("Variant {variant} has no size row {size}")]
    NoSuchSize { variant: usize, size: usize },
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VariantEditor {
    measurement_system: Option<String>,
    sizes: Vec<SizeLabel>,
    variants: Vec<VariantDraft>,
}

impl VariantEditor {
    /// Editor for a category's measurement system, seeded when sizes exist.
    pub fn new(measurement_system: Option<&str>) -> Self {
        let measurement_system = measurement_system.map(str::trim).filter(|m| !m.is_empty()).map(str::to_string);
        let sizes = measurement_system.as_deref().map(sizing::generate).unwrap_or_default();
        Self { measurement_system, sizes, variants: Vec::new() }.seed()
    }

    /// Switching category discards drafts built on the old vocabulary.
    pub fn with_measurement_system(&self, measurement_system: Option<&str>) -> Self {
        let next = Self::new(measurement_system);
        if next.measurement_system == self.measurement_system { self.clone() } else { next }
    }

    /// One blank variant when the list is empty and a vocabulary is known.
    pub fn seed(&self) -> Self {
        let mut next = self.clone();
        if next.variants.is_empty() && !next.sizes.is_empty() {
            next.variants.push(next.blank_variant());
        }
        next
    }

    pub fn measurement_system(&self) -> Option<&str> { self.measurement_system.as_deref() }
    pub fn sizes(&self) -> &[SizeLabel] { &self.sizes }

    /// Size rows to render; refused until a measurement system is chosen.
    pub fn rows(&self) -> Result<&[VariantDraft], EditorError> {
        match self.measurement_system {
            Some(_) => Ok(&self.variants),
            None => Err(EditorError::NoMeasurementSystem),
        }
    }

    pub fn variants(&self) -> &[VariantDraft] { &self.variants }
    pub fn into_variants(self) -> Vec<VariantDraft> { self.variants }

    pub fn apply(&self, message: EditorMessage) -> Result<Self, EditorError> {
        if self.measurement_system.is_none() {
            return Err(EditorError::NoMeasurementSystem);
        }
        let mut next = self.clone();
        match message {
            EditorMessage::AddVariant => {
                let blank = next.blank_variant();
                next.variants.push(blank);
            }
            EditorMessage::RemoveVariant { variant } => {
                next.variant_mut(variant)?;
                next.variants.remove(variant);
            }
            EditorMessage::SetColor { variant, color } => {
                next.variant_mut(variant)?.color = color;
            }
            EditorMessage::SetImages { variant, files } => {
                let draft = next.variant_mut(variant)?;
                draft.previews = files.iter().map(preview_ref).collect();
                draft.images = files;
            }
            EditorMessage::SetSizeField { variant, size, field } => {
                let row = next
                    .variant_mut(variant)?
                    .size_stocks
                    .get_mut(size)
                    .ok_or(EditorError::NoSuchSize { variant, size })?;
                match field {
                    SizeField::Sku(v) => row.sku = v,
                    SizeField::Price(v) => row.price = v,
                    SizeField::Stock(v) => row.stock = v,
                    SizeField::Availability(v) => row.availability = v,
                }
            }
        }
        Ok(next)
    }

    fn blank_variant(&self) -> VariantDraft {
        VariantDraft { size_stocks: self.sizes.iter().map(SizeStockDraft::blank).collect(), ..VariantDraft::default() }
    }

    fn variant_mut(&mut self, index: usize) -> Result<&mut VariantDraft, EditorError> {
        self.variants.get_mut(index).ok_or(EditorError::NoSuchVariant(index))
    }
}

fn preview_ref(file: &ImageFile) -> String {
    format!("preview://{}/{}", Uuid::new_v4(), file.file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(name: &str) -> ImageFile { ImageFile::new(name, "image/png", vec![1, 2, 3]) }

    #[test]
    fn test_seeds_one_blank_variant() {
        let editor = VariantEditor::new(Some("CLOTHING_ALPHA"));
        let rows = editor.rows().unwrap();
        assert_eq!(rows.len(), 1);
        let sizes: Vec<&str> = rows[0].size_stocks.iter().map(|s| s.size.as_str()).collect();
        assert_eq!(sizes, ["XS", "S", "M", "L", "XL", "XXL", "XXXL", "OneSize"]);
        assert!(rows[0].size_stocks.iter().all(|s| s.stock.is_empty() && s.price.is_empty() && !s.availability));
        assert!(rows[0].color.is_empty());
    }

    #[test]
    fn test_without_measurement_system() {
        let editor = VariantEditor::new(None);
        assert_eq!(editor.rows().unwrap_err(), EditorError::NoMeasurementSystem);
        assert_eq!(editor.rows().unwrap_err().to_string(), NO_CATEGORY_MESSAGE);
        assert_eq!(editor.apply(EditorMessage::AddVariant).unwrap_err(), EditorError::NoMeasurementSystem);
        assert!(VariantEditor::new(Some("  ")).rows().is_err());
    }

    #[test]
    fn test_unknown_system_has_no_seed() {
        let editor = VariantEditor::new(Some("SHOE_EU"));
        assert!(editor.rows().unwrap().is_empty());
        let editor = editor.apply(EditorMessage::AddVariant).unwrap();
        assert!(editor.variants()[0].size_stocks.is_empty());
    }

    #[test]
    fn test_mutations_are_copy_on_write() {
        let v0 = VariantEditor::new(Some("CUP_SIZE"));
        let v1 = v0.apply(EditorMessage::AddVariant).unwrap();
        let v2 = v1
            .apply(EditorMessage::SetSizeField { variant: 1, size: 2, field: SizeField::Stock("4".into()) })
            .unwrap();
        assert_eq!(v0.variants().len(), 1);
        assert_eq!(v1.variants()[1].size_stocks[2].stock, "");
        assert_eq!(v2.variants()[1].size_stocks[2].stock, "4");
        assert_eq!(v2.variants()[0], v1.variants()[0]);
        assert_eq!(v2.variants()[1].size_stocks[1], v1.variants()[1].size_stocks[1]);
    }

    #[test]
    fn test_remove_down_to_zero() {
        let editor = VariantEditor::new(Some("CUP_SIZE"))
            .apply(EditorMessage::RemoveVariant { variant: 0 })
            .unwrap();
        assert!(editor.variants().is_empty());
        assert_eq!(editor.apply(EditorMessage::RemoveVariant { variant: 0 }).unwrap_err(), EditorError::NoSuchVariant(0));
        assert_eq!(editor.seed().variants().len(), 1);
    }

    #[test]
    fn test_set_images_replaces_and_previews() {
        let editor = VariantEditor::new(Some("CUP_SIZE"))
            .apply(EditorMessage::SetImages { variant: 0, files: vec![png("a.png"), png("b.png")] })
            .unwrap()
            .apply(EditorMessage::SetImages { variant: 0, files: vec![png("c.png")] })
            .unwrap();
        let v = &editor.variants()[0];
        assert_eq!(v.images.len(), 1);
        assert_eq!(v.previews.len(), 1);
        assert!(v.previews[0].starts_with("preview://") && v.previews[0].ends_with("/c.png"));
    }

    #[test]
    fn test_out_of_range_size() {
        let editor = VariantEditor::new(Some("CUP_SIZE"));
        let err = editor
            .apply(EditorMessage::SetSizeField { variant: 0, size: 3, field: SizeField::Availability(true) })
            .unwrap_err();
        assert_eq!(err, EditorError::NoSuchSize { variant: 0, size: 3 });
    }

    #[test]
    fn test_category_switch_resets_drafts() {
        let editor = VariantEditor::new(Some("CUP_SIZE"))
            .apply(EditorMessage::SetColor { variant: 0, color: "red".into() })
            .unwrap();
        assert_eq!(editor.with_measurement_system(Some("CUP_SIZE")), editor);
        let switched = editor.with_measurement_system(Some("CLOTHING_NUMERIC"));
        assert_eq!(switched.variants()[0].size_stocks.len(), 10);
        assert!(switched.variants()[0].color.is_empty());
    }
}
