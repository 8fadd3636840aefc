//! Product storage boundary.
//!
//! `ProductsRepository` is the record of truth for products. The mutation
//! pipeline only forwards conditions and entities through it; it never
//! interprets a condition itself.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryProductsRepository;
pub use postgres::PostgresProductsRepository;
pub use r#trait::{ProductsRepository, StorageError};
