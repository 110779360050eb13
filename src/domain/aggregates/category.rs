//! Category records and the category tree

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;
use crate::domain::events::{CategoryEvent, DomainEvent};
use crate::domain::sizing::{self, MeasurementSystem, SizeLabel};

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub parent_slug: Option<String>,
    /// Raw tag as stored; may be unrecognized.
    pub measurement_system: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Category {
    pub fn create(name: &str, slug: String, parent_slug: Option<String>, measurement_system: Option<MeasurementSystem>) -> (Self, DomainEvent) {
        let category = Self {
            id: Uuid::now_v7(),
            name: name.trim().to_string(),
            slug,
            parent_slug,
            measurement_system: measurement_system.map(|m| m.as_str().to_string()),
            created_at: Utc::now(),
        };
        let event = DomainEvent::Category(CategoryEvent::Created {
            category_id: category.id,
            slug: category.slug.clone(),
            parent_slug: category.parent_slug.clone(),
        });
        (category, event)
    }

    pub fn measurement_system(&self) -> Option<MeasurementSystem> {
        self.measurement_system.as_deref().and_then(MeasurementSystem::parse)
    }

    /// Whether product variants may be authored against this category.
    /// Only a recognized measurement system has a vocabulary to size against.
    pub fn accepts_variants(&self) -> bool {
        self.measurement_system().is_some()
    }

    pub fn sizes(&self) -> Vec<SizeLabel> {
        self.measurement_system.as_deref().map(sizing::generate).unwrap_or_default()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CategoryNode {
    #[serde(flatten)]
    pub category: Category,
    pub children: Vec<CategoryNode>,
}

/// Owned category forest assembled from a flat parent-slug list.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CategoryTree {
    roots: Vec<CategoryNode>,
}

impl CategoryTree {
    /// Categories whose parent is missing (or that sit on a parent cycle) become roots.
    pub fn build(categories: &[Category]) -> Self {
        let index: HashMap<&str, usize> = categories.iter().enumerate().map(|(i, c)| (c.slug.as_str(), i)).collect();

        let mut children: Vec<Vec<usize>> = vec![Vec::new(); categories.len()];
        let mut roots = Vec::new();
        for (i, c) in categories.iter().enumerate() {
            match c.parent_slug.as_deref().and_then(|p| index.get(p).copied()) {
                Some(parent) if parent != i => children[parent].push(i),
                _ => roots.push(i),
            }
        }

        let mut placed = HashSet::new();
        let mut tree: Vec<CategoryNode> = roots.into_iter().map(|i| assemble(i, categories, &children, &mut placed)).collect();
        for i in 0..categories.len() {
            if !placed.contains(&i) {
                tree.push(assemble(i, categories, &children, &mut placed));
            }
        }
        Self { roots: tree }
    }

    pub fn roots(&self) -> &[CategoryNode] { &self.roots }

    pub fn find(&self, slug: &str) -> Option<&CategoryNode> {
        fn walk<'a>(nodes: &'a [CategoryNode], slug: &str) -> Option<&'a CategoryNode> {
            nodes.iter().find_map(|n| if n.category.slug == slug { Some(n) } else { walk(&n.children, slug) })
        }
        walk(&self.roots, slug)
    }

    /// The slug itself followed by every slug beneath it.
    pub fn descendants(&self, slug: &str) -> Vec<String> {
        fn collect(node: &CategoryNode, out: &mut Vec<String>) {
            out.push(node.category.slug.clone());
            for c in &node.children { collect(c, out); }
        }
        let mut out = Vec::new();
        if let Some(node) = self.find(slug) { collect(node, &mut out); }
        out
    }
}

fn assemble(i: usize, categories: &[Category], children: &[Vec<usize>], placed: &mut HashSet<usize>) -> CategoryNode {
    placed.insert(i);
    let mut kids = Vec::with_capacity(children[i].len());
    for &c in &children[i] {
        if !placed.contains(&c) { kids.push(assemble(c, categories, children, placed)); }
    }
    CategoryNode { category: categories[i].clone(), children: kids }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cat(slug: &str, parent: Option<&str>) -> Category {
        Category { id: Uuid::new_v4(), name: slug.to_uppercase(), slug: slug.into(), parent_slug: parent.map(Into::into), measurement_system: None, created_at: Utc::now() }
    }

    #[test]
    fn test_tree_build() {
        let cats = vec![cat("men", Some("clothing")), cat("clothing", None), cat("women", Some("clothing")), cat("shoes", None)];
        let tree = CategoryTree::build(&cats);
        let roots: Vec<&str> = tree.roots().iter().map(|n| n.category.slug.as_str()).collect();
        assert_eq!(roots, ["clothing", "shoes"]);
        let kids: Vec<&str> = tree.roots()[0].children.iter().map(|n| n.category.slug.as_str()).collect();
        assert_eq!(kids, ["men", "women"]);
        assert_eq!(tree.descendants("clothing"), ["clothing", "men", "women"]);
        assert!(tree.descendants("missing").is_empty());
    }

    #[test]
    fn test_orphans_and_cycles_become_roots() {
        let cats = vec![cat("a", Some("b")), cat("b", Some("a")), cat("lost", Some("nowhere")), cat("self", Some("self"))];
        let tree = CategoryTree::build(&cats);
        let mut total = 0;
        fn count(n: &CategoryNode) -> usize { 1 + n.children.iter().map(count).sum::<usize>() }
        for r in tree.roots() { total += count(r); }
        assert_eq!(total, 4);
        assert!(tree.find("a").is_some());
        assert!(tree.find("self").is_some());
    }

    #[test]
    fn test_variants_need_measurement_system() {
        let mut c = cat("men", None);
        assert!(!c.accepts_variants());
        c.measurement_system = Some("CLOTHING_ALPHA".into());
        assert!(c.accepts_variants());
        assert_eq!(c.sizes().len(), 8);
        c.measurement_system = Some("BOGUS".into());
        assert!(!c.accepts_variants());
        assert!(c.sizes().is_empty());
    }
}
