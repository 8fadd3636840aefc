//! Field rules for product requests.

use catalog_core::{ValidationOutcome, Validator};

use crate::dto::{ProductAddRequest, ProductUpdateRequest};

pub const MAX_PRODUCT_NAME_LEN: usize = 100;

fn check_attributes(
    outcome: &mut ValidationOutcome,
    product_name: &str,
    unit_price: Option<f64>,
    quantity_in_stock: Option<i32>,
) {
    outcome
        .ensure(
            !product_name.trim().is_empty(),
            "ProductName",
            "Product Name can't be blank",
        )
        .ensure(
            product_name.chars().count() <= MAX_PRODUCT_NAME_LEN,
            "ProductName",
            format!("Product Name can't exceed {MAX_PRODUCT_NAME_LEN} characters"),
        )
        .ensure(
            unit_price.is_none_or(|p| p.is_finite() && p >= 0.0),
            "UnitPrice",
            "Unit Price should be between 0 and the maximum value",
        )
        .ensure(
            quantity_in_stock.is_none_or(|q| q >= 0),
            "QuantityInStock",
            "Quantity in Stock should be between 0 and the maximum value",
        );
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProductAddRequestValidator;

impl Validator<ProductAddRequest> for ProductAddRequestValidator {
    fn validate(&self, r: &ProductAddRequest) -> ValidationOutcome {
        let mut outcome = ValidationOutcome::new();
        check_attributes(&mut outcome, &r.product_name, r.unit_price, r.quantity_in_stock);
        outcome
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProductUpdateRequestValidator;

impl Validator<ProductUpdateRequest> for ProductUpdateRequestValidator {
    fn validate(&self, r: &ProductUpdateRequest) -> ValidationOutcome {
        let mut outcome = ValidationOutcome::new();
        outcome.ensure(!r.product_id.is_nil(), "ProductID", "Product ID can't be blank");
        check_attributes(&mut outcome, &r.product_name, r.unit_price, r.quantity_in_stock);
        outcome
    }
}
