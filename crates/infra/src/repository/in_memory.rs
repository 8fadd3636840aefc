use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use catalog_products::{NewProduct, Product, ProductCondition, ProductId};

use super::r#trait::{ProductsRepository, StorageError};

/// In-memory product storage.
///
/// Intended for tests/dev. Keeps insertion order; lookups are linear scans.
/// Can be switched unavailable to exercise storage-failure paths.
#[derive(Debug, Default)]
pub struct InMemoryProductsRepository {
    products: RwLock<Vec<Product>>,
    unavailable: AtomicBool,
}

impl InMemoryProductsRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StorageError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("in-memory store switched off".to_string()));
        }
        Ok(())
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Vec<Product>>, StorageError> {
        self.check_available()?;
        self.products
            .read()
            .map_err(|_| StorageError::Backend("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Vec<Product>>, StorageError> {
        self.check_available()?;
        self.products
            .write()
            .map_err(|_| StorageError::Backend("lock poisoned".to_string()))
    }
}

#[async_trait]
impl ProductsRepository for InMemoryProductsRepository {
    async fn get_products(&self) -> Result<Vec<Product>, StorageError> {
        Ok(self.read()?.clone())
    }

    async fn get_products_by_condition(
        &self,
        condition: &ProductCondition,
    ) -> Result<Vec<Product>, StorageError> {
        Ok(self
            .read()?
            .iter()
            .filter(|p| condition.matches(p))
            .cloned()
            .collect())
    }

    async fn get_product_by_condition(
        &self,
        condition: &ProductCondition,
    ) -> Result<Option<Product>, StorageError> {
        Ok(self.read()?.iter().find(|p| condition.matches(p)).cloned())
    }

    async fn add_product(&self, product: NewProduct) -> Result<Option<Product>, StorageError> {
        let mut products = self.write()?;

        let mut product_id = ProductId::generate();
        while products.iter().any(|p| p.product_id == product_id) {
            product_id = ProductId::generate();
        }

        let stored = product.with_id(product_id);
        products.push(stored.clone());
        Ok(Some(stored))
    }

    async fn update_product(&self, product: Product) -> Result<Option<Product>, StorageError> {
        let mut products = self.write()?;
        match products.iter_mut().find(|p| p.product_id == product.product_id) {
            Some(existing) => {
                *existing = product;
                Ok(Some(existing.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete_product(&self, product_id: ProductId) -> Result<bool, StorageError> {
        let mut products = self.write()?;
        let before = products.len();
        products.retain(|p| p.product_id != product_id);
        Ok(products.len() < before)
    }
}
