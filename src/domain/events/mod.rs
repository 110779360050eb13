//! Domain events
use serde::Serialize;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    Product(ProductEvent),
    Category(CategoryEvent),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductEvent {
    Created { product_id: Uuid, slug: String, category_slug: String, variant_count: usize },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryEvent {
    Created { category_id: Uuid, slug: String, parent_slug: Option<String> },
}

impl DomainEvent {
    /// Message-bus subject the event is published on.
    pub fn subject(&self) -> &'static str {
        match self {
            Self::Product(ProductEvent::Created { .. }) => "catalog.product.created",
            Self::Category(CategoryEvent::Created { .. }) => "catalog.category.created",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subjects() {
        let e = DomainEvent::Category(CategoryEvent::Created { category_id: Uuid::nil(), slug: "men".into(), parent_slug: None });
        assert_eq!(e.subject(), "catalog.category.created");
        let json = serde_json::to_string(&e).unwrap();
        assert!(json.contains(r#""type":"category""#));
        assert!(json.contains(r#""slug":"men""#));
    }
}
