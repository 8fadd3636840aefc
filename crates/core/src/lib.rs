//! `catalog-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;
pub mod validation;

pub use error::DomainError;
pub use id::EntityId;
pub use validation::{FieldError, ValidationErrors, ValidationOutcome, Validator};
