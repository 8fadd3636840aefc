//! Postgres-backed product storage.
//!
//! Structured conditions are translated to SQL; `ProductCondition::Predicate`
//! cannot be, so it loads all rows and filters in memory.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use catalog_core::EntityId;
use catalog_products::{Category, NewProduct, Product, ProductCondition, ProductId};

use super::r#trait::{ProductsRepository, StorageError};

const SELECT_COLUMNS: &str =
    "SELECT product_id, product_name, category, unit_price, quantity_in_stock, is_available FROM products";

pub struct PostgresProductsRepository {
    pool: Arc<PgPool>,
}

impl PostgresProductsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Create the `products` table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS products (
                product_id UUID PRIMARY KEY,
                product_name TEXT NOT NULL,
                category TEXT NOT NULL,
                unit_price DOUBLE PRECISION NULL,
                quantity_in_stock INTEGER NULL,
                is_available BOOLEAN NOT NULL DEFAULT TRUE
            )
            "#,
        )
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        Ok(())
    }

    async fn fetch_matching(
        &self,
        condition: &ProductCondition,
        operation: &str,
    ) -> Result<Vec<Product>, StorageError> {
        let rows = match condition {
            ProductCondition::IdEq(id) => {
                sqlx::query(&format!("{SELECT_COLUMNS} WHERE product_id = $1"))
                    .bind(*id.0.as_uuid())
                    .fetch_all(&*self.pool)
                    .await
            }
            ProductCondition::Category(category) => {
                sqlx::query(&format!(
                    "{SELECT_COLUMNS} WHERE category = $1 ORDER BY product_name"
                ))
                .bind(category.as_str())
                .fetch_all(&*self.pool)
                .await
            }
            ProductCondition::Search(term) => {
                sqlx::query(&format!(
                    "{SELECT_COLUMNS} WHERE product_name ILIKE $1 ESCAPE '\\' OR category ILIKE $1 ESCAPE '\\' ORDER BY product_name"
                ))
                .bind(like_pattern(term))
                .fetch_all(&*self.pool)
                .await
            }
            ProductCondition::All | ProductCondition::Predicate(_) => {
                sqlx::query(&format!("{SELECT_COLUMNS} ORDER BY product_name"))
                    .fetch_all(&*self.pool)
                    .await
            }
        }
        .map_err(|e| map_sqlx_error(operation, e))?;

        let mut products = Vec::with_capacity(rows.len());
        for row in &rows {
            let product = product_from_row(row)?;
            if let ProductCondition::Predicate(_) = condition {
                if !condition.matches(&product) {
                    continue;
                }
            }
            products.push(product);
        }
        Ok(products)
    }
}

#[async_trait]
impl ProductsRepository for PostgresProductsRepository {
    async fn get_products(&self) -> Result<Vec<Product>, StorageError> {
        self.fetch_matching(&ProductCondition::all(), "get_products").await
    }

    async fn get_products_by_condition(
        &self,
        condition: &ProductCondition,
    ) -> Result<Vec<Product>, StorageError> {
        self.fetch_matching(condition, "get_products_by_condition")
            .await
    }

    async fn get_product_by_condition(
        &self,
        condition: &ProductCondition,
    ) -> Result<Option<Product>, StorageError> {
        Ok(self
            .fetch_matching(condition, "get_product_by_condition")
            .await?
            .into_iter()
            .next())
    }

    async fn add_product(&self, product: NewProduct) -> Result<Option<Product>, StorageError> {
        let product_id = ProductId::generate();
        let row = sqlx::query(
            r#"
            INSERT INTO products
                (product_id, product_name, category, unit_price, quantity_in_stock, is_available)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING product_id, product_name, category, unit_price, quantity_in_stock, is_available
            "#,
        )
        .bind(*product_id.0.as_uuid())
        .bind(&product.product_name)
        .bind(product.category.as_str())
        .bind(product.unit_price)
        .bind(product.quantity_in_stock)
        .bind(product.is_available)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("add_product", e))?;

        row.as_ref().map(product_from_row).transpose()
    }

    async fn update_product(&self, product: Product) -> Result<Option<Product>, StorageError> {
        let row = sqlx::query(
            r#"
            UPDATE products SET
                product_name = $2,
                category = $3,
                unit_price = $4,
                quantity_in_stock = $5,
                is_available = $6
            WHERE product_id = $1
            RETURNING product_id, product_name, category, unit_price, quantity_in_stock, is_available
            "#,
        )
        .bind(*product.product_id.0.as_uuid())
        .bind(&product.product_name)
        .bind(product.category.as_str())
        .bind(product.unit_price)
        .bind(product.quantity_in_stock)
        .bind(product.is_available)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_product", e))?;

        row.as_ref().map(product_from_row).transpose()
    }

    async fn delete_product(&self, product_id: ProductId) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM products WHERE product_id = $1")
            .bind(*product_id.0.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_product", e))?;
        Ok(result.rows_affected() > 0)
    }
}

fn product_from_row(row: &PgRow) -> Result<Product, StorageError> {
    let invalid = |e: sqlx::Error| StorageError::InvalidRecord(e.to_string());

    let product_id: uuid::Uuid = row.try_get("product_id").map_err(invalid)?;
    let category: String = row.try_get("category").map_err(invalid)?;
    let category: Category = category
        .parse()
        .map_err(|e| StorageError::InvalidRecord(format!("{e}")))?;

    Ok(Product {
        product_id: ProductId::new(EntityId::from_uuid(product_id)),
        product_name: row.try_get("product_name").map_err(invalid)?,
        category,
        unit_price: row.try_get("unit_price").map_err(invalid)?,
        quantity_in_stock: row.try_get("quantity_in_stock").map_err(invalid)?,
        is_available: row.try_get("is_available").map_err(invalid)?,
    })
}

/// `%term%` with LIKE metacharacters escaped.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StorageError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                // Unique violation
                Some("23505") => StorageError::Conflict(msg),
                _ => StorageError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut => {
            StorageError::Unavailable(format!("connection pool unavailable in {}", operation))
        }
        sqlx::Error::Io(e) => StorageError::Unavailable(format!("io error in {}: {}", operation, e)),
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::ColumnNotFound(_) => {
            StorageError::InvalidRecord(format!("bad row in {}: {}", operation, err))
        }
        _ => StorageError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_wraps_and_escapes() {
        assert_eq!(like_pattern("desk"), "%desk%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn pool_closed_is_unavailable() {
        let err = map_sqlx_error("get_products", sqlx::Error::PoolClosed);
        assert!(matches!(err, StorageError::Unavailable(_)));
    }

    #[test]
    fn other_errors_are_backend_errors() {
        let err = map_sqlx_error("add_product", sqlx::Error::RowNotFound);
        assert!(matches!(err, StorageError::Backend(_)));
    }
}
