//! Size vocabularies per category measurement system

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category-level tag selecting which fixed size vocabulary applies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MeasurementSystem {
    ClothingAlpha,
    ClothingNumeric,
    UpperBodySize,
    CupSize,
    WeightKg,
    LengthCm,
}

impl MeasurementSystem {
    pub const ALL: [MeasurementSystem; 6] = [
        Self::ClothingAlpha,
        Self::ClothingNumeric,
        Self::UpperBodySize,
        Self::CupSize,
        Self::WeightKg,
        Self::LengthCm,
    ];

    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim() {
            "CLOTHING_ALPHA" => Some(Self::ClothingAlpha),
            "CLOTHING_NUMERIC" => Some(Self::ClothingNumeric),
            "UPPER_BODY_SIZE" => Some(Self::UpperBodySize),
            "CUP_SIZE" => Some(Self::CupSize),
            "WEIGHT_KG" => Some(Self::WeightKg),
            "LENGTH_CM" => Some(Self::LengthCm),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClothingAlpha => "CLOTHING_ALPHA",
            Self::ClothingNumeric => "CLOTHING_NUMERIC",
            Self::UpperBodySize => "UPPER_BODY_SIZE",
            Self::CupSize => "CUP_SIZE",
            Self::WeightKg => "WEIGHT_KG",
            Self::LengthCm => "LENGTH_CM",
        }
    }

    /// Operator-facing option label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::ClothingAlpha => "Clothing (M, L, XL)",
            Self::ClothingNumeric => "Clothing (32, 34, 36, 38, 40, 42, 44, 46)",
            Self::UpperBodySize => "Cup Size (28A, 30B, 32C, 34D)",
            Self::CupSize => "Cup Size (S, M, L)",
            Self::WeightKg => "Weight (kg)",
            Self::LengthCm => "Length (cm)",
        }
    }

    /// Ordered size labels for this system.
    pub fn sizes(&self) -> Vec<SizeLabel> {
        match self {
            Self::ClothingAlpha => text(&["XS", "S", "M", "L", "XL", "XXL", "XXXL", "OneSize"]),
            Self::ClothingNumeric => [28, 30, 32, 34, 36, 38, 40, 42, 44, 46]
                .into_iter()
                .map(SizeLabel::Number)
                .collect(),
            Self::UpperBodySize => text(&BANDED),
            Self::CupSize => text(&["S", "M", "L"]),
            Self::WeightKg | Self::LengthCm => (0..5).map(SizeLabel::Number).collect(),
        }
    }
}

impl fmt::Display for MeasurementSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

const BANDED: [&str; 35] = [
    "28AA", "28A", "28B", "28C", "28D",
    "30AA", "30A", "30B", "30C", "30D",
    "32AA", "32A", "32B", "32C", "32D",
    "34AA", "34A", "34B", "34C", "34D",
    "36AA", "36A", "36B", "36C", "36D",
    "38A", "38B", "38C", "38D",
    "40B", "40C", "40D",
    "42C", "42D",
    "44D",
];

fn text(labels: &[&str]) -> Vec<SizeLabel> {
    labels.iter().map(|l| SizeLabel::Text((*l).to_string())).collect()
}

/// A size drawn from a vocabulary. Unique only within one variant.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SizeLabel {
    Number(u32),
    Text(String),
}

impl fmt::Display for SizeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Vocabulary for a raw category tag. Unrecognized tags yield no sizes.
pub fn generate(tag: &str) -> Vec<SizeLabel> {
    MeasurementSystem::parse(tag).map(|m| m.sizes()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vocabulary_lengths() {
        assert_eq!(generate("CLOTHING_ALPHA").len(), 8);
        assert_eq!(generate("CLOTHING_NUMERIC").len(), 10);
        assert_eq!(generate("UPPER_BODY_SIZE").len(), 35);
        assert_eq!(generate("CUP_SIZE").len(), 3);
        assert_eq!(generate("WEIGHT_KG").len(), 5);
        assert_eq!(generate("LENGTH_CM").len(), 5);
    }

    #[test]
    fn unknown_tag_is_empty() {
        assert!(generate("SHOE_EU").is_empty());
        assert!(generate("").is_empty());
    }

    #[test]
    fn alpha_order_is_stable() {
        let labels: Vec<String> = generate("CLOTHING_ALPHA").iter().map(|s| s.to_string()).collect();
        assert_eq!(labels, ["XS", "S", "M", "L", "XL", "XXL", "XXXL", "OneSize"]);
        assert_eq!(generate("CLOTHING_ALPHA"), generate("CLOTHING_ALPHA"));
    }

    #[test]
    fn numeric_ranges_start_at_zero() {
        let labels: Vec<String> = generate("WEIGHT_KG").iter().map(|s| s.to_string()).collect();
        assert_eq!(labels, ["0", "1", "2", "3", "4"]);
    }

    #[test]
    fn tags_round_trip_through_parse() {
        for system in MeasurementSystem::ALL {
            assert_eq!(MeasurementSystem::parse(system.as_str()), Some(system));
        }
    }

    #[test]
    fn banded_labels_are_unique() {
        let mut labels = generate("UPPER_BODY_SIZE");
        labels.sort_by_key(|l| l.to_string());
        labels.dedup();
        assert_eq!(labels.len(), 35);
    }
}
