//! Products domain module.
//!
//! This crate contains the catalog record, its request/response shapes, field
//! rules, query conditions and the notifications emitted on change. Pure domain
//! logic only (no IO, no HTTP, no storage).

pub mod condition;
pub mod dto;
pub mod messages;
pub mod product;
pub mod validation;

pub use condition::ProductCondition;
pub use dto::{ProductAddRequest, ProductResponse, ProductUpdateRequest};
pub use messages::{
    PRODUCT_DELETE_ROUTING_KEY, PRODUCT_NAME_UPDATE_ROUTING_KEY, ProductDeletionMessage,
    ProductMessage, ProductNameUpdateMessage,
};
pub use product::{Category, NewProduct, Product, ProductId};
pub use validation::{ProductAddRequestValidator, ProductUpdateRequestValidator};
