use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use catalog_products::{NewProduct, Product, ProductCondition, ProductId};

/// Storage operation error.
///
/// These are **infrastructure errors**, propagated to callers unchanged; the
/// mutation pipeline does not interpret or retry them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid stored record: {0}")]
    InvalidRecord(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Product storage.
///
/// Implementations must:
/// - assign `product_id` on `add_product` (the caller never picks it)
/// - enforce identifier uniqueness
/// - return `None` from `update_product` when no record has the given id
/// - return `false` from `delete_product` when nothing was removed
///
/// Concurrent writers to the same id are ordered by the backend alone.
#[async_trait]
pub trait ProductsRepository: Send + Sync {
    async fn get_products(&self) -> Result<Vec<Product>, StorageError>;

    async fn get_products_by_condition(
        &self,
        condition: &ProductCondition,
    ) -> Result<Vec<Product>, StorageError>;

    /// First product matching `condition`, if any.
    async fn get_product_by_condition(
        &self,
        condition: &ProductCondition,
    ) -> Result<Option<Product>, StorageError>;

    async fn add_product(&self, product: NewProduct) -> Result<Option<Product>, StorageError>;

    /// Replace the attributes of the product with `product.product_id`.
    async fn update_product(&self, product: Product) -> Result<Option<Product>, StorageError>;

    async fn delete_product(&self, product_id: ProductId) -> Result<bool, StorageError>;
}

#[async_trait]
impl<R> ProductsRepository for Arc<R>
where
    R: ProductsRepository + ?Sized,
{
    async fn get_products(&self) -> Result<Vec<Product>, StorageError> {
        (**self).get_products().await
    }

    async fn get_products_by_condition(
        &self,
        condition: &ProductCondition,
    ) -> Result<Vec<Product>, StorageError> {
        (**self).get_products_by_condition(condition).await
    }

    async fn get_product_by_condition(
        &self,
        condition: &ProductCondition,
    ) -> Result<Option<Product>, StorageError> {
        (**self).get_product_by_condition(condition).await
    }

    async fn add_product(&self, product: NewProduct) -> Result<Option<Product>, StorageError> {
        (**self).add_product(product).await
    }

    async fn update_product(&self, product: Product) -> Result<Option<Product>, StorageError> {
        (**self).update_product(product).await
    }

    async fn delete_product(&self, product_id: ProductId) -> Result<bool, StorageError> {
        (**self).delete_product(product_id).await
    }
}
