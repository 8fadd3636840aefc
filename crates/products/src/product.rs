use core::str::FromStr;

use serde::{Deserialize, Serialize};

use catalog_core::{DomainError, EntityId};

/// Product identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub EntityId);

impl ProductId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }

    /// Fresh identifier; only storage should call this.
    pub fn generate() -> Self {
        Self(EntityId::new())
    }

    pub fn nil() -> Self {
        Self(EntityId::nil())
    }

    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for ProductId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Catalog category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Electronics,
    HomeAppliances,
    Furniture,
    Accessories,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Electronics,
        Category::HomeAppliances,
        Category::Furniture,
        Category::Accessories,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Electronics => "Electronics",
            Category::HomeAppliances => "HomeAppliances",
            Category::Furniture => "Furniture",
            Category::Accessories => "Accessories",
        }
    }
}

impl core::fmt::Display for Category {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DomainError::invalid_argument(format!("unknown category '{s}'")))
    }
}

/// Stored product record.
///
/// `product_id` is assigned by storage at creation and never reassigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: ProductId,
    pub product_name: String,
    pub category: Category,
    pub unit_price: Option<f64>,
    pub quantity_in_stock: Option<i32>,
    pub is_available: bool,
}

/// Product attributes before storage has assigned an identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub product_name: String,
    pub category: Category,
    pub unit_price: Option<f64>,
    pub quantity_in_stock: Option<i32>,
    pub is_available: bool,
}

impl NewProduct {
    /// Attach the storage-assigned identifier.
    pub fn with_id(self, product_id: ProductId) -> Product {
        Product {
            product_id,
            product_name: self.product_name,
            category: self.category,
            unit_price: self.unit_price,
            quantity_in_stock: self.quantity_in_stock,
            is_available: self.is_available,
        }
    }
}
