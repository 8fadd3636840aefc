//! Request/response shapes and their mapping to the stored record.

use serde::{Deserialize, Serialize};

use crate::product::{Category, NewProduct, Product, ProductId};

fn available_by_default() -> bool {
    true
}

/// Request to add a product (no identifier yet).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductAddRequest {
    pub product_name: String,
    pub category: Category,
    #[serde(default)]
    pub unit_price: Option<f64>,
    #[serde(default)]
    pub quantity_in_stock: Option<i32>,
    #[serde(default = "available_by_default")]
    pub is_available: bool,
}

/// Request to replace the attributes of an existing product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdateRequest {
    pub product_id: ProductId,
    pub product_name: String,
    pub category: Category,
    #[serde(default)]
    pub unit_price: Option<f64>,
    #[serde(default)]
    pub quantity_in_stock: Option<i32>,
    #[serde(default = "available_by_default")]
    pub is_available: bool,
}

/// Outbound representation of a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub product_id: ProductId,
    pub product_name: String,
    pub category: Category,
    pub unit_price: Option<f64>,
    pub quantity_in_stock: Option<i32>,
    pub is_available: bool,
}

impl From<ProductAddRequest> for NewProduct {
    fn from(r: ProductAddRequest) -> Self {
        NewProduct {
            product_name: r.product_name,
            category: r.category,
            unit_price: r.unit_price,
            quantity_in_stock: r.quantity_in_stock,
            is_available: r.is_available,
        }
    }
}

impl From<ProductUpdateRequest> for Product {
    fn from(r: ProductUpdateRequest) -> Self {
        Product {
            product_id: r.product_id,
            product_name: r.product_name,
            category: r.category,
            unit_price: r.unit_price,
            quantity_in_stock: r.quantity_in_stock,
            is_available: r.is_available,
        }
    }
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        ProductResponse {
            product_id: p.product_id,
            product_name: p.product_name,
            category: p.category,
            unit_price: p.unit_price,
            quantity_in_stock: p.quantity_in_stock,
            is_available: p.is_available,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_request_uses_camel_case_and_defaults() {
        let req: ProductAddRequest = serde_json::from_str(
            r#"{"productName":"Lamp","category":"HomeAppliances","unitPrice":19.5}"#,
        )
        .unwrap();

        assert_eq!(req.product_name, "Lamp");
        assert_eq!(req.unit_price, Some(19.5));
        assert_eq!(req.quantity_in_stock, None);
        assert!(req.is_available);
    }

    #[test]
    fn update_request_maps_onto_its_target() {
        let id = ProductId::generate();
        let product: Product = ProductUpdateRequest {
            product_id: id,
            product_name: "Chair".to_string(),
            category: Category::Furniture,
            unit_price: Some(40.0),
            quantity_in_stock: Some(8),
            is_available: false,
        }
        .into();

        assert_eq!(product.product_id, id);
        assert!(!product.is_available);
    }

    #[test]
    fn response_serializes_every_attribute() {
        let id = ProductId::generate();
        let response = ProductResponse::from(Product {
            product_id: id,
            product_name: "Cable".to_string(),
            category: Category::Accessories,
            unit_price: None,
            quantity_in_stock: Some(0),
            is_available: true,
        });
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["productId"], id.to_string());
        assert_eq!(json["category"], "Accessories");
        assert!(json["unitPrice"].is_null());
        assert_eq!(json["quantityInStock"], 0);
    }
}
