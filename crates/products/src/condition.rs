//! Query conditions over products.
//!
//! A `ProductCondition` is opaque to callers that merely forward it: the only
//! contract is `matches`. Repositories may recognize the structured variants
//! and push them down (e.g. into SQL); `Predicate` always has to be evaluated
//! in memory.

use std::sync::Arc;

use crate::product::{Category, Product, ProductId};

#[derive(Clone)]
pub enum ProductCondition {
    All,
    IdEq(ProductId),
    /// Case-insensitive substring of the name or the category.
    Search(String),
    Category(Category),
    Predicate(Arc<dyn Fn(&Product) -> bool + Send + Sync>),
}

impl ProductCondition {
    pub fn all() -> Self {
        Self::All
    }

    pub fn id_eq(id: ProductId) -> Self {
        Self::IdEq(id)
    }

    pub fn search(term: impl Into<String>) -> Self {
        Self::Search(term.into())
    }

    pub fn category(category: Category) -> Self {
        Self::Category(category)
    }

    pub fn predicate(f: impl Fn(&Product) -> bool + Send + Sync + 'static) -> Self {
        Self::Predicate(Arc::new(f))
    }

    pub fn matches(&self, product: &Product) -> bool {
        match self {
            Self::All => true,
            Self::IdEq(id) => product.product_id == *id,
            Self::Search(term) => {
                let term = term.to_lowercase();
                product.product_name.to_lowercase().contains(&term)
                    || product.category.as_str().to_lowercase().contains(&term)
            }
            Self::Category(category) => product.category == *category,
            Self::Predicate(f) => f(product),
        }
    }
}

impl core::fmt::Debug for ProductCondition {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::All => f.write_str("All"),
            Self::IdEq(id) => f.debug_tuple("IdEq").field(id).finish(),
            Self::Search(term) => f.debug_tuple("Search").field(term).finish(),
            Self::Category(c) => f.debug_tuple("Category").field(c).finish(),
            Self::Predicate(_) => f.write_str("Predicate(<fn>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(name: &str, category: Category) -> Product {
        Product {
            product_id: ProductId::generate(),
            product_name: name.to_string(),
            category,
            unit_price: Some(5.0),
            quantity_in_stock: Some(1),
            is_available: true,
        }
    }

    #[test]
    fn search_matches_name_or_category_ignoring_case() {
        let lamp = product("Desk Lamp", Category::HomeAppliances);
        assert!(ProductCondition::search("lamp").matches(&lamp));
        assert!(ProductCondition::search("APPLIANCE").matches(&lamp));
        assert!(!ProductCondition::search("chair").matches(&lamp));
    }

    #[test]
    fn id_condition_matches_only_its_target() {
        let a = product("A", Category::Electronics);
        let b = product("B", Category::Electronics);
        let cond = ProductCondition::id_eq(a.product_id);
        assert!(cond.matches(&a));
        assert!(!cond.matches(&b));
    }

    #[test]
    fn predicate_is_evaluated_as_given() {
        let cheap = ProductCondition::predicate(|p| p.unit_price.is_some_and(|x| x < 10.0));
        assert!(cheap.matches(&product("Pen", Category::Accessories)));
        assert_eq!(format!("{cheap:?}"), "Predicate(<fn>)");
    }
}
