//! Product draft validation and the transport-neutral submission shape.
//!
//! A draft is checked in a fixed order and the first failure aborts. A valid
//! draft becomes a [`ProductSubmission`], which renders to named form parts:
//! scalar fields, JSON-encoded arrays, and one file part per image. Variant
//! images travel as `variantImages-{variant}-{image}` parts and are referenced
//! from the variants JSON by `variant-{variant}-{image}` tokens.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use crate::domain::value_objects::{Discount, Slug};
use super::{ImageFile, VariantDraft};

pub const PRODUCT_IMAGES_FIELD: &str = "images";
const VARIANT_IMAGE_FIELD_PREFIX: &str = "variantImages-";
const VARIANT_IMAGE_TOKEN_PREFIX: &str = "variant-";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Choose at least one product image.")]
    NoImages,
    #[error("Product name is required.")]
    MissingName,
    #[error("Product description is required.")]
    MissingDescription,
    #[error("Please select a category.")]
    MissingCategory,
    #[error("Add at least one product variant.")]
    NoVariants,
    #[error("Each variant must have a color.")]
    MissingColor,
    #[error("Variant {color} must have at least one size stock.")]
    NoSizeStocks { color: String },
    #[error("Variant {color}: size {size} needs a numeric, non-negative price and stock.")]
    InvalidSizeStock { color: String, size: String },
    #[error("Variant {color}: size {size} is not offered by this category.")]
    SizeNotInCategory { color: String, size: String },
    #[error("Variant {color} lists size {size} more than once.")]
    DuplicateSize { color: String, size: String },
    #[error("Variant {color}: {reason}")]
    InvalidSku { color: String, reason: String },
    #[error("Image reference {0} does not match an uploaded file.")]
    UnknownImage(String),
    #[error("Malformed field {field}: {reason}")]
    Malformed { field: String, reason: String },
}

/// Everything the admin form holds at submit time.
#[derive(Clone, Debug, Default)]
pub struct ProductDraft {
    pub images: Vec<ImageFile>,
    pub name: String,
    pub description: String,
    pub category_slug: Option<String>,
    /// Raw discount input; coerced, never rejected.
    pub discount: String,
    pub tags: Vec<String>,
    pub features: Vec<String>,
    pub materials: Vec<String>,
    pub listed: bool,
    pub variants: Vec<VariantDraft>,
}

impl ProductDraft {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.checked_variants().map(|_| ())
    }

    /// Validate, then serialize for transport. Nothing is produced on failure.
    pub fn submit(&self) -> Result<ProductSubmission, ValidationError> {
        let variants = self.checked_variants()?;
        let name = self.name.trim().to_string();
        Ok(ProductSubmission {
            slug: Slug::from_name(&name).into_inner(),
            name,
            description: self.description.trim().to_string(),
            category_slug: self.category_slug.clone().unwrap_or_default(),
            discount: Discount::coerce(&self.discount),
            listed: self.listed,
            tags: clean(&self.tags),
            features: clean(&self.features),
            materials: clean(&self.materials),
            variants,
            images: self.images.clone(),
            variant_images: self.variants.iter().map(|v| v.images.clone()).collect(),
        })
    }

    fn checked_variants(&self) -> Result<Vec<VariantPayload>, ValidationError> {
        check_scalars(self.images.len(), &self.name, &self.description, self.category_slug.as_deref(), self.variants.len())?;
        for v in &self.variants {
            check_variant_shape(&v.color, v.size_stocks.len())?;
        }
        self.variants
            .iter()
            .enumerate()
            .map(|(i, v)| -> Result<VariantPayload, ValidationError> {
                let size_stocks = v
                    .size_stocks
                    .iter()
                    .map(|s| -> Result<SizeStockPayload, ValidationError> {
                        let invalid = || ValidationError::InvalidSizeStock { color: v.color.clone(), size: s.size.clone() };
                        Ok(SizeStockPayload {
                            size: s.size.clone(),
                            sku: s.sku.trim().to_string(),
                            price: parse_price(&s.price).ok_or_else(invalid)?,
                            stock: parse_stock(&s.stock).ok_or_else(invalid)?,
                            availability: s.availability,
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(VariantPayload {
                    color: v.color.clone(),
                    images: (0..v.images.len()).map(|j| image_token(i, j)).collect(),
                    size_stocks,
                })
            })
            .collect()
    }
}

/// Checks 1 to 5, in order.
fn check_scalars(images: usize, name: &str, description: &str, category: Option<&str>, variants: usize) -> Result<(), ValidationError> {
    if images == 0 { return Err(ValidationError::NoImages); }
    if name.trim().is_empty() { return Err(ValidationError::MissingName); }
    if description.trim().is_empty() { return Err(ValidationError::MissingDescription); }
    if category.map_or(true, |c| c.trim().is_empty()) { return Err(ValidationError::MissingCategory); }
    if variants == 0 { return Err(ValidationError::NoVariants); }
    Ok(())
}

/// Checks 6 and 7 for one variant.
fn check_variant_shape(color: &str, size_stocks: usize) -> Result<(), ValidationError> {
    if color.trim().is_empty() { return Err(ValidationError::MissingColor); }
    if size_stocks == 0 { return Err(ValidationError::NoSizeStocks { color: color.to_string() }); }
    Ok(())
}

fn parse_price(raw: &str) -> Option<Decimal> {
    let raw = raw.trim();
    if raw.is_empty() { return Some(Decimal::ZERO); }
    raw.parse::<Decimal>().ok().filter(|p| !p.is_sign_negative())
}

fn parse_stock(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    if raw.is_empty() { return Some(0); }
    raw.parse().ok()
}

fn clean(values: &[String]) -> Vec<String> {
    values.iter().map(|v| v.trim().to_string()).filter(|v| !v.is_empty()).collect()
}

fn image_token(variant: usize, image: usize) -> String {
    format!("{}{}-{}", VARIANT_IMAGE_TOKEN_PREFIX, variant, image)
}

fn variant_image_field(variant: usize, image: usize) -> String {
    format!("{}{}-{}", VARIANT_IMAGE_FIELD_PREFIX, variant, image)
}

fn parse_pair(rest: &str) -> Option<(usize, usize)> {
    let (i, j) = rest.split_once('-')?;
    Some((i.parse().ok()?, j.parse().ok()?))
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeStockPayload {
    pub size: String,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub availability: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantPayload {
    #[serde(default)]
    pub color: String,
    /// Placeholder tokens standing in for the variant's image files.
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub size_stocks: Vec<SizeStockPayload>,
}

/// One named part of a submitted form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormPart {
    Text { name: String, value: String },
    File { name: String, file: ImageFile },
}

impl FormPart {
    pub fn text(name: &str, value: impl Into<String>) -> Self {
        Self::Text { name: name.to_string(), value: value.into() }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Text { name, .. } | Self::File { name, .. } => name,
        }
    }
}

/// A validated product ready for the persistence sink.
#[derive(Clone, Debug, PartialEq)]
pub struct ProductSubmission {
    pub name: String,
    pub slug: String,
    pub description: String,
    pub category_slug: String,
    pub discount: Discount,
    pub listed: bool,
    pub tags: Vec<String>,
    pub features: Vec<String>,
    pub materials: Vec<String>,
    pub variants: Vec<VariantPayload>,
    pub images: Vec<ImageFile>,
    /// Files per variant, index-aligned with `variants` and their tokens.
    pub variant_images: Vec<Vec<ImageFile>>,
}

impl ProductSubmission {
    pub fn to_parts(&self) -> Vec<FormPart> {
        let mut parts = vec![
            FormPart::text("name", self.name.clone()),
            FormPart::text("description", self.description.clone()),
            FormPart::text("slug", self.slug.clone()),
            FormPart::text("categorySlug", self.category_slug.clone()),
            FormPart::text("discount", self.discount.to_string()),
            FormPart::text("listed", if self.listed { "true" } else { "false" }),
            FormPart::text("tags", json(&self.tags)),
            FormPart::text("features", json(&self.features)),
            FormPart::text("materials", json(&self.materials)),
            FormPart::text("variants", json(&self.variants)),
        ];
        for (i, files) in self.variant_images.iter().enumerate() {
            for (j, file) in files.iter().enumerate() {
                parts.push(FormPart::File { name: variant_image_field(i, j), file: file.clone() });
            }
        }
        for file in &self.images {
            parts.push(FormPart::File { name: PRODUCT_IMAGES_FIELD.to_string(), file: file.clone() });
        }
        parts
    }

    /// Rebuild a submission from received parts. Shape errors are reported
    /// here; content rules are left to [`ProductSubmission::validate`].
    pub fn from_parts(parts: Vec<FormPart>) -> Result<Self, ValidationError> {
        let mut text: BTreeMap<String, String> = BTreeMap::new();
        let mut images = Vec::new();
        let mut files: BTreeMap<(usize, usize), ImageFile> = BTreeMap::new();

        for part in parts {
            match part {
                FormPart::Text { name, value } => {
                    text.entry(name).or_insert(value);
                }
                FormPart::File { name, file } if name == PRODUCT_IMAGES_FIELD => images.push(file),
                FormPart::File { name, file } => {
                    let key = name
                        .strip_prefix(VARIANT_IMAGE_FIELD_PREFIX)
                        .and_then(parse_pair)
                        .ok_or_else(|| ValidationError::Malformed { field: name.clone(), reason: "unexpected file field".into() })?;
                    files.insert(key, file);
                }
            }
        }

        let field = |key: &str| text.get(key).map(|v| v.trim().to_string()).unwrap_or_default();
        let variants: Vec<VariantPayload> = decode_json(&text, "variants")?;

        let mut variant_images = Vec::with_capacity(variants.len());
        for (i, v) in variants.iter().enumerate() {
            let mut resolved = Vec::with_capacity(v.images.len());
            for token in &v.images {
                let key = token
                    .strip_prefix(VARIANT_IMAGE_TOKEN_PREFIX)
                    .and_then(parse_pair)
                    .filter(|(vi, _)| *vi == i);
                let file = key
                    .and_then(|k| files.remove(&k))
                    .ok_or_else(|| ValidationError::UnknownImage(token.clone()))?;
                resolved.push(file);
            }
            variant_images.push(resolved);
        }
        if let Some(((i, j), _)) = files.into_iter().next() {
            return Err(ValidationError::UnknownImage(variant_image_field(i, j)));
        }

        let name = field("name");
        Ok(Self {
            slug: Slug::from_name(&name).into_inner(),
            name,
            description: field("description"),
            category_slug: field("categorySlug"),
            discount: Discount::coerce(&field("discount")),
            listed: field("listed") == "true",
            tags: clean(&decode_json::<Vec<String>>(&text, "tags")?),
            features: clean(&decode_json::<Vec<String>>(&text, "features")?),
            materials: clean(&decode_json::<Vec<String>>(&text, "materials")?),
            variants,
            images,
            variant_images,
        })
    }

    /// Same ordered checks as the admin form, plus size-label uniqueness.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let category = Some(self.category_slug.as_str());
        check_scalars(self.images.len(), &self.name, &self.description, category, self.variants.len())?;
        for v in &self.variants {
            check_variant_shape(&v.color, v.size_stocks.len())?;
        }
        for v in &self.variants {
            let mut seen = HashSet::new();
            for s in &v.size_stocks {
                if s.price.is_sign_negative() {
                    return Err(ValidationError::InvalidSizeStock { color: v.color.clone(), size: s.size.clone() });
                }
                if !seen.insert(s.size.as_str()) {
                    return Err(ValidationError::DuplicateSize { color: v.color.clone(), size: s.size.clone() });
                }
            }
        }
        Ok(())
    }

    /// Render as a `multipart/form-data` body delimited by `boundary`.
    pub fn encode_multipart(&self, boundary: &str) -> Vec<u8> {
        let mut body = Vec::new();
        for part in self.to_parts() {
            body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
            match part {
                FormPart::Text { name, value } => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", escape_header_value(&name)).as_bytes(),
                    );
                    body.extend_from_slice(value.as_bytes());
                }
                FormPart::File { name, file } => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                            escape_header_value(&name),
                            escape_header_value(&file.file_name),
                            file.content_type.replace(['\r', '\n'], "")
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(&file.bytes);
                }
            }
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());
        body
    }
}

/// Quoted `name` and `filename` parameters percent-encode `"`, CR and LF
/// (RFC 7578 section 4.2); everything else is sent as is.
fn escape_header_value(value: &str) -> String {
    value.replace('"', "%22").replace('\r', "%0D").replace('\n', "%0A")
}

/// Inverse of the header escaping applied by multipart senders.
pub fn unescape_header_value(value: &str) -> String {
    value.replace("%22", "\"").replace("%0D", "\r").replace("%0A", "\n")
}

fn decode_json<T: serde::de::DeserializeOwned + Default>(text: &BTreeMap<String, String>, key: &str) -> Result<T, ValidationError> {
    match text.get(key).map(|v| v.trim()).filter(|v| !v.is_empty()) {
        Some(raw) => serde_json::from_str(raw).map_err(|e| ValidationError::Malformed { field: key.to_string(), reason: e.to_string() }),
        None => Ok(T::default()),
    }
}

fn json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "[]".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::{EditorMessage, SizeField, VariantEditor};

    fn png(name: &str) -> ImageFile { ImageFile::new(name, "image/png", vec![137, 80, 78, 71]) }

    fn filled_draft() -> ProductDraft {
        let editor = VariantEditor::new(Some("CUP_SIZE"))
            .apply(EditorMessage::SetColor { variant: 0, color: "red".into() })
            .and_then(|e| e.apply(EditorMessage::SetImages { variant: 0, files: vec![png("red-1.png"), png("red-2.png")] }))
            .and_then(|e| e.apply(EditorMessage::SetSizeField { variant: 0, size: 0, field: SizeField::Price("19.99".into()) }))
            .and_then(|e| e.apply(EditorMessage::SetSizeField { variant: 0, size: 0, field: SizeField::Stock("5".into()) }))
            .and_then(|e| e.apply(EditorMessage::SetSizeField { variant: 0, size: 0, field: SizeField::Availability(true) }))
            .unwrap();
        ProductDraft {
            images: vec![png("main.png")],
            name: "Cool Tee".into(),
            description: "A tee".into(),
            category_slug: Some("men".into()),
            discount: "-5".into(),
            tags: vec!["new".into(), " ".into()],
            features: vec![],
            materials: vec!["cotton".into()],
            listed: true,
            variants: editor.into_variants(),
        }
    }

    #[test]
    fn test_checks_in_order() {
        let mut d = filled_draft();
        d.images.clear();
        d.name = "  ".into();
        assert_eq!(d.validate(), Err(ValidationError::NoImages));
        d.images.push(png("x.png"));
        assert_eq!(d.validate(), Err(ValidationError::MissingName));
        d.name = "Tee".into();
        d.description = "\n".into();
        assert_eq!(d.validate(), Err(ValidationError::MissingDescription));
        d.description = "desc".into();
        d.category_slug = None;
        assert_eq!(d.validate(), Err(ValidationError::MissingCategory));
        d.category_slug = Some("men".into());
        let variants = std::mem::take(&mut d.variants);
        assert_eq!(d.validate(), Err(ValidationError::NoVariants));
        d.variants = variants;
        d.variants[0].color.clear();
        assert_eq!(d.validate(), Err(ValidationError::MissingColor));
        d.variants[0].color = "red".into();
        d.variants[0].size_stocks.clear();
        assert_eq!(d.validate(), Err(ValidationError::NoSizeStocks { color: "red".into() }));
    }

    #[test]
    fn test_each_failure_has_distinct_message() {
        let messages: HashSet<String> = [
            ValidationError::NoImages,
            ValidationError::MissingName,
            ValidationError::MissingDescription,
            ValidationError::MissingCategory,
            ValidationError::NoVariants,
            ValidationError::MissingColor,
            ValidationError::NoSizeStocks { color: "red".into() },
        ]
        .iter()
        .map(|e| e.to_string())
        .collect();
        assert_eq!(messages.len(), 7);
    }

    #[test]
    fn test_non_numeric_stock_rejected() {
        let mut d = filled_draft();
        d.variants[0].size_stocks[1].stock = "lots".into();
        assert_eq!(d.validate(), Err(ValidationError::InvalidSizeStock { color: "red".into(), size: "M".into() }));
        d.variants[0].size_stocks[1].stock = "".into();
        d.variants[0].size_stocks[1].price = "-1".into();
        assert!(d.validate().is_err());
    }

    #[test]
    fn test_submit_serializes() {
        let s = filled_draft().submit().unwrap();
        assert_eq!(s.slug, "cool-tee");
        assert_eq!(s.discount, Discount::NONE);
        assert_eq!(s.tags, ["new"]);
        assert_eq!(s.variants[0].images, ["variant-0-0", "variant-0-1"]);
        assert_eq!(s.variants[0].size_stocks[0].price, Decimal::new(1999, 2));
        assert_eq!(s.variants[0].size_stocks[1].stock, 0);

        let parts = s.to_parts();
        let names: Vec<&str> = parts.iter().map(|p| p.name()).collect();
        assert!(names.contains(&"variantImages-0-1"));
        assert_eq!(names.iter().filter(|n| **n == "images").count(), 1);
        let variants = parts.iter().find(|p| p.name() == "variants").unwrap();
        match variants {
            FormPart::Text { value, .. } => assert!(value.contains("\"sizeStocks\"") && value.contains("variant-0-1")),
            FormPart::File { .. } => panic!("variants must be a text part"),
        }
    }

    #[test]
    fn test_multipart_escapes_quoted_names() {
        let mut s = filled_draft().submit().unwrap();
        s.images = vec![png("my \"best\" shot.png")];
        s.variant_images[0][0] = png("red\r\nfront.png");
        let body = String::from_utf8_lossy(&s.encode_multipart("b0undary")).into_owned();
        assert!(body.contains(r#"filename="my %22best%22 shot.png""#));
        assert!(body.contains(r#"filename="red%0D%0Afront.png""#));
        assert!(!body.contains("red\r\nfront"));
        assert_eq!(unescape_header_value("my %22best%22 shot.png"), "my \"best\" shot.png");
        assert_eq!(unescape_header_value("red%0D%0Afront.png"), "red\r\nfront.png");
    }

    #[test]
    fn test_discount_passes_through() {
        let mut d = filled_draft();
        d.discount = "42".into();
        assert_eq!(d.submit().unwrap().discount.percent(), Decimal::from(42));
        d.discount = "abc".into();
        assert_eq!(d.submit().unwrap().discount, Discount::NONE);
    }

    #[test]
    fn test_parts_decode_back() {
        let s = filled_draft().submit().unwrap();
        let back = ProductSubmission::from_parts(s.to_parts()).unwrap();
        assert_eq!(back, s);
        assert!(back.validate().is_ok());
    }

    #[test]
    fn test_unknown_token_and_stray_file() {
        let s = filled_draft().submit().unwrap();
        let mut parts = s.to_parts();
        parts.retain(|p| p.name() != "variantImages-0-1");
        assert_eq!(ProductSubmission::from_parts(parts).unwrap_err(), ValidationError::UnknownImage("variant-0-1".into()));

        let mut parts = s.to_parts();
        parts.push(FormPart::File { name: "variantImages-3-0".into(), file: png("stray.png") });
        assert_eq!(ProductSubmission::from_parts(parts).unwrap_err(), ValidationError::UnknownImage("variantImages-3-0".into()));

        let mut parts = s.to_parts();
        parts.push(FormPart::File { name: "avatar".into(), file: png("x.png") });
        assert!(matches!(ProductSubmission::from_parts(parts), Err(ValidationError::Malformed { .. })));
    }

    #[test]
    fn test_server_side_duplicate_sizes() {
        let mut s = filled_draft().submit().unwrap();
        let dup = s.variants[0].size_stocks[0].clone();
        s.variants[0].size_stocks.push(dup);
        assert_eq!(s.validate(), Err(ValidationError::DuplicateSize { color: "red".into(), size: "S".into() }));
    }

    #[test]
    fn test_multipart_body_layout() {
        let s = filled_draft().submit().unwrap();
        let body = String::from_utf8_lossy(&s.encode_multipart("XYZ")).to_string();
        assert!(body.starts_with("--XYZ\r\nContent-Disposition: form-data; name=\"name\"\r\n\r\nCool Tee\r\n"));
        assert!(body.contains("name=\"variantImages-0-0\"; filename=\"red-1.png\"\r\nContent-Type: image/png"));
        assert!(body.ends_with("--XYZ--\r\n"));
    }
}
