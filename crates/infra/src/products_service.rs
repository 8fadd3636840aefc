//! Product mutation pipeline (application-level orchestration).
//!
//! `ProductsService` sits between the HTTP layer and infrastructure. Every
//! mutation follows the same shape:
//!
//! ```text
//! request
//!   ↓
//! 1. Reject absent request / unknown target
//!   ↓
//! 2. Validate fields (ordered error list)
//!   ↓
//! 3. Mutate storage (awaited; errors propagate unchanged)
//!   ↓
//! 4. Decide whether a notification is due, publish it
//! ```
//!
//! Publication happens strictly after the storage call returned. A failed
//! publish is logged and counted; it never rolls back the mutation and never
//! changes the caller-visible result.
//!
//! Which mutations publish:
//!
//! | mutation                       | routing key           |
//! |--------------------------------|-----------------------|
//! | create                         | none                  |
//! | update, name unchanged         | none                  |
//! | update, name changed           | `product.update.name` |
//! | delete of an existing product  | `product.delete`      |
//!
//! There is no per-id locking: two concurrent updates of one product may both
//! read the same "existing" record.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;
use tracing::{debug, error, info, instrument};

use catalog_core::{ValidationErrors, Validator};
use catalog_events::{IntegrationEvent, MessagePublisher, PublishError};
use catalog_products::{
    NewProduct, Product, ProductAddRequest, ProductAddRequestValidator, ProductCondition,
    ProductId, ProductMessage, ProductResponse, ProductUpdateRequest,
    ProductUpdateRequestValidator,
};

use crate::repository::{ProductsRepository, StorageError};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ServiceError {
    /// Absent request, or an update targeting an unknown product.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("validation failed: {0}")]
    ValidationFailed(ValidationErrors),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<ValidationErrors> for ServiceError {
    fn from(value: ValidationErrors) -> Self {
        ServiceError::ValidationFailed(value)
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

pub struct ProductsService {
    repository: Arc<dyn ProductsRepository>,
    publisher: Arc<dyn MessagePublisher<ProductMessage>>,
    add_validator: Arc<dyn Validator<ProductAddRequest>>,
    update_validator: Arc<dyn Validator<ProductUpdateRequest>>,
    publish_failures: AtomicU64,
}

impl core::fmt::Debug for ProductsService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ProductsService")
            .field("publish_failures", &self.publish_failures())
            .finish_non_exhaustive()
    }
}

impl ProductsService {
    /// Service with the standard product validators.
    pub fn new(
        repository: Arc<dyn ProductsRepository>,
        publisher: Arc<dyn MessagePublisher<ProductMessage>>,
    ) -> Self {
        Self::with_validators(
            repository,
            publisher,
            Arc::new(ProductAddRequestValidator),
            Arc::new(ProductUpdateRequestValidator),
        )
    }

    pub fn with_validators(
        repository: Arc<dyn ProductsRepository>,
        publisher: Arc<dyn MessagePublisher<ProductMessage>>,
        add_validator: Arc<dyn Validator<ProductAddRequest>>,
        update_validator: Arc<dyn Validator<ProductUpdateRequest>>,
    ) -> Self {
        Self {
            repository,
            publisher,
            add_validator,
            update_validator,
            publish_failures: AtomicU64::new(0),
        }
    }

    /// Publishes that failed since the service was built.
    pub fn publish_failures(&self) -> u64 {
        self.publish_failures.load(Ordering::Relaxed)
    }

    /// Release the publisher's channel. Called once at process teardown.
    pub async fn shutdown(&self) -> Result<(), PublishError> {
        self.publisher.shutdown().await
    }

    #[instrument(skip(self, request), err)]
    pub async fn add_product(
        &self,
        request: Option<ProductAddRequest>,
    ) -> ServiceResult<Option<ProductResponse>> {
        let request = request
            .ok_or_else(|| ServiceError::InvalidArgument("product request is required".to_string()))?;

        // Create and update report failures alike: "validation failed: " followed
        // by every message, joined with ", ".
        self.add_validator.validate(&request).into_result()?;

        let product: NewProduct = request.into();
        let added = self.repository.add_product(product).await?;
        if let Some(added) = &added {
            debug!(product_id = %added.product_id, "product added");
        }
        Ok(added.map(ProductResponse::from))
    }

    #[instrument(skip(self, request), fields(product_id = %request.product_id), err)]
    pub async fn update_product(
        &self,
        request: ProductUpdateRequest,
    ) -> ServiceResult<Option<ProductResponse>> {
        let existing = self
            .repository
            .get_product_by_condition(&ProductCondition::id_eq(request.product_id))
            .await?
            .ok_or_else(|| ServiceError::InvalidArgument("Invalid Product ID".to_string()))?;

        self.update_validator.validate(&request).into_result()?;

        // Decided against the stored record, before it is overwritten.
        let name_changed = request.product_name != existing.product_name;

        let product: Product = request.into();
        let updated = self.repository.update_product(product).await?;

        match (&updated, name_changed) {
            (Some(updated), true) => self.publish(ProductMessage::name_updated(updated)).await,
            (None, true) => {
                debug!("storage reported no update; rename not published");
            }
            (_, false) => {}
        }

        Ok(updated.map(ProductResponse::from))
    }

    #[instrument(skip(self), err)]
    pub async fn delete_product(&self, product_id: ProductId) -> ServiceResult<bool> {
        let Some(existing) = self
            .repository
            .get_product_by_condition(&ProductCondition::id_eq(product_id))
            .await?
        else {
            return Ok(false);
        };

        // Captured before deletion; the record is gone afterwards.
        let message = ProductMessage::deleted(&existing);

        let deleted = self.repository.delete_product(product_id).await?;
        if deleted {
            self.publish(message).await;
        }
        Ok(deleted)
    }

    pub async fn get_product_by_condition(
        &self,
        condition: &ProductCondition,
    ) -> ServiceResult<Option<ProductResponse>> {
        Ok(self
            .repository
            .get_product_by_condition(condition)
            .await?
            .map(ProductResponse::from))
    }

    pub async fn get_products_by_condition(
        &self,
        condition: &ProductCondition,
    ) -> ServiceResult<Vec<ProductResponse>> {
        Ok(self
            .repository
            .get_products_by_condition(condition)
            .await?
            .into_iter()
            .map(ProductResponse::from)
            .collect())
    }

    pub async fn get_products(&self) -> ServiceResult<Vec<ProductResponse>> {
        Ok(self
            .repository
            .get_products()
            .await?
            .into_iter()
            .map(ProductResponse::from)
            .collect())
    }

    async fn publish(&self, message: ProductMessage) {
        let routing_key = message.routing_key();
        match self.publisher.publish(routing_key, &message).await {
            Ok(()) => info!(
                routing_key,
                event_type = message.event_type(),
                product_id = %message.product_id(),
                "product notification published"
            ),
            Err(err) => {
                self.publish_failures.fetch_add(1, Ordering::Relaxed);
                error!(
                    routing_key,
                    product_id = %message.product_id(),
                    error = %err,
                    "failed to publish product notification"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize};

    use async_trait::async_trait;
    use catalog_events::RecordingPublisher;
    use catalog_products::{
        Category, PRODUCT_DELETE_ROUTING_KEY, PRODUCT_NAME_UPDATE_ROUTING_KEY,
    };

    use crate::repository::InMemoryProductsRepository;

    /// Counts mutating calls reaching storage.
    #[derive(Default)]
    struct CountingRepository {
        inner: InMemoryProductsRepository,
        adds: AtomicUsize,
        updates: AtomicUsize,
        deletes: AtomicUsize,
        /// Lookups still succeed but writes match no row, as when another
        /// writer removes the record between the read and the write.
        stale_writes: AtomicBool,
    }

    impl CountingRepository {
        fn mutations(&self) -> usize {
            self.adds.load(Ordering::SeqCst)
                + self.updates.load(Ordering::SeqCst)
                + self.deletes.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ProductsRepository for CountingRepository {
        async fn get_products(&self) -> Result<Vec<Product>, StorageError> {
            self.inner.get_products().await
        }

        async fn get_products_by_condition(
            &self,
            condition: &ProductCondition,
        ) -> Result<Vec<Product>, StorageError> {
            self.inner.get_products_by_condition(condition).await
        }

        async fn get_product_by_condition(
            &self,
            condition: &ProductCondition,
        ) -> Result<Option<Product>, StorageError> {
            self.inner.get_product_by_condition(condition).await
        }

        async fn add_product(&self, product: NewProduct) -> Result<Option<Product>, StorageError> {
            self.adds.fetch_add(1, Ordering::SeqCst);
            self.inner.add_product(product).await
        }

        async fn update_product(&self, product: Product) -> Result<Option<Product>, StorageError> {
            self.updates.fetch_add(1, Ordering::SeqCst);
            if self.stale_writes.load(Ordering::SeqCst) {
                return Ok(None);
            }
            self.inner.update_product(product).await
        }

        async fn delete_product(&self, product_id: ProductId) -> Result<bool, StorageError> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            if self.stale_writes.load(Ordering::SeqCst) {
                return Ok(false);
            }
            self.inner.delete_product(product_id).await
        }
    }

    struct Harness {
        repo: Arc<CountingRepository>,
        publisher: Arc<RecordingPublisher<ProductMessage>>,
        service: ProductsService,
    }

    fn harness() -> Harness {
        let repo = Arc::new(CountingRepository::default());
        let publisher = Arc::new(RecordingPublisher::new());
        let service = ProductsService::new(repo.clone(), publisher.clone());
        Harness {
            repo,
            publisher,
            service,
        }
    }

    fn add_request(name: &str) -> ProductAddRequest {
        ProductAddRequest {
            product_name: name.to_string(),
            category: Category::Electronics,
            unit_price: Some(9.5),
            quantity_in_stock: Some(4),
            is_available: true,
        }
    }

    fn update_request(existing: &ProductResponse, name: &str) -> ProductUpdateRequest {
        ProductUpdateRequest {
            product_id: existing.product_id,
            product_name: name.to_string(),
            category: existing.category,
            unit_price: existing.unit_price,
            quantity_in_stock: existing.quantity_in_stock,
            is_available: existing.is_available,
        }
    }

    async fn seed(h: &Harness, name: &str) -> ProductResponse {
        h.service
            .add_product(Some(add_request(name)))
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn create_returns_storage_assigned_id_and_publishes_nothing() {
        let h = harness();
        let created = seed(&h, "Widget").await;

        assert!(!created.product_id.is_nil());
        assert_eq!(created.product_name, "Widget");
        assert!(h.publisher.is_empty());
    }

    #[tokio::test]
    async fn create_without_request_is_invalid_argument() {
        let h = harness();
        let err = h.service.add_product(None).await.unwrap_err();

        assert!(matches!(err, ServiceError::InvalidArgument(_)));
        assert_eq!(h.repo.mutations(), 0);
    }

    #[tokio::test]
    async fn invalid_create_never_reaches_storage() {
        let h = harness();
        let mut request = add_request("   ");
        request.unit_price = Some(-1.0);

        let err = h.service.add_product(Some(request)).await.unwrap_err();

        match &err {
            ServiceError::ValidationFailed(errors) => assert_eq!(
                errors.joined(", "),
                "Product Name can't be blank, Unit Price should be between 0 and the maximum value"
            ),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(
            err.to_string(),
            "validation failed: Product Name can't be blank, Unit Price should be between 0 and the maximum value"
        );
        assert_eq!(h.repo.adds.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn update_of_unknown_id_is_rejected_without_side_effects() {
        let h = harness();
        let ghost = ProductUpdateRequest {
            product_id: ProductId::generate(),
            product_name: "Ghost".to_string(),
            category: Category::Furniture,
            unit_price: None,
            quantity_in_stock: None,
            is_available: true,
        };

        let err = h.service.update_product(ghost).await.unwrap_err();

        assert_eq!(err, ServiceError::InvalidArgument("Invalid Product ID".to_string()));
        assert_eq!(h.repo.mutations(), 0);
        assert!(h.publisher.is_empty());
    }

    #[tokio::test]
    async fn invalid_update_leaves_record_untouched() {
        let h = harness();
        let created = seed(&h, "Widget").await;
        let mut request = update_request(&created, "Gadget");
        request.quantity_in_stock = Some(-3);

        let err = h.service.update_product(request).await.unwrap_err();

        assert!(matches!(err, ServiceError::ValidationFailed(_)));
        assert_eq!(h.repo.updates.load(Ordering::SeqCst), 0);
        assert!(h.publisher.is_empty());
    }

    #[tokio::test]
    async fn invalid_update_reports_every_message() {
        let h = harness();
        let created = seed(&h, "Widget").await;
        let mut request = update_request(&created, "");
        request.unit_price = Some(-1.0);

        let err = h.service.update_product(request).await.unwrap_err();

        assert_eq!(
            err.to_string(),
            "validation failed: Product Name can't be blank, Unit Price should be between 0 and the maximum value"
        );
    }

    #[tokio::test]
    async fn update_without_rename_publishes_nothing() {
        let h = harness();
        let created = seed(&h, "Widget").await;
        let mut request = update_request(&created, "Widget");
        request.unit_price = Some(99.0);
        request.quantity_in_stock = Some(0);
        request.is_available = false;

        let updated = h.service.update_product(request).await.unwrap().unwrap();

        assert_eq!(updated.unit_price, Some(99.0));
        assert!(!updated.is_available);
        assert!(h.publisher.is_empty());
    }

    #[tokio::test]
    async fn rename_publishes_post_update_name() {
        let h = harness();
        let created = seed(&h, "A").await;

        h.service
            .update_product(update_request(&created, "B"))
            .await
            .unwrap();

        let published = h.publisher.published();
        assert_eq!(published.len(), 1);
        let (routing_key, message) = &published[0];
        assert_eq!(routing_key, PRODUCT_NAME_UPDATE_ROUTING_KEY);
        assert_eq!(message.product_id(), created.product_id);
        assert_eq!(message.name(), "B");
    }

    #[tokio::test]
    async fn rename_compares_case_sensitively() {
        let h = harness();
        let created = seed(&h, "widget").await;

        h.service
            .update_product(update_request(&created, "Widget"))
            .await
            .unwrap();

        assert_eq!(h.publisher.len(), 1);
    }

    #[tokio::test]
    async fn delete_of_unknown_id_returns_false_without_publishing() {
        let h = harness();
        let deleted = h.service.delete_product(ProductId::generate()).await.unwrap();

        assert!(!deleted);
        assert_eq!(h.repo.deletes.load(Ordering::SeqCst), 0);
        assert!(h.publisher.is_empty());
    }

    #[tokio::test]
    async fn delete_that_removes_nothing_returns_false_without_publishing() {
        let h = harness();
        let created = seed(&h, "Shelf").await;
        h.repo.stale_writes.store(true, Ordering::SeqCst);

        let deleted = h.service.delete_product(created.product_id).await.unwrap();

        assert!(!deleted);
        assert_eq!(h.repo.deletes.load(Ordering::SeqCst), 1);
        assert!(h.publisher.is_empty());
    }

    #[tokio::test]
    async fn rename_that_updates_nothing_returns_none_without_publishing() {
        let h = harness();
        let created = seed(&h, "Shelf").await;
        h.repo.stale_writes.store(true, Ordering::SeqCst);

        let updated = h
            .service
            .update_product(update_request(&created, "Bookcase"))
            .await
            .unwrap();

        assert!(updated.is_none());
        assert_eq!(h.repo.updates.load(Ordering::SeqCst), 1);
        assert!(h.publisher.is_empty());
    }

    #[tokio::test]
    async fn delete_publishes_pre_deletion_snapshot() {
        let h = harness();
        let created = seed(&h, "Lamp").await;

        assert!(h.service.delete_product(created.product_id).await.unwrap());

        let published = h.publisher.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, PRODUCT_DELETE_ROUTING_KEY);
        assert_eq!(published[0].1.product_id(), created.product_id);
        assert_eq!(published[0].1.name(), "Lamp");
        assert!(
            h.service
                .get_product_by_condition(&ProductCondition::id_eq(created.product_id))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn publish_failure_does_not_change_results() {
        let h = harness();
        let created = seed(&h, "Chair").await;
        h.publisher.fail_with(PublishError::ChannelClosed);

        let renamed = h
            .service
            .update_product(update_request(&created, "Stool"))
            .await
            .unwrap();
        assert_eq!(renamed.unwrap().product_name, "Stool");

        assert!(h.service.delete_product(created.product_id).await.unwrap());
        assert_eq!(h.service.publish_failures(), 2);
        assert!(h.repo.inner.get_products().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn storage_errors_propagate_unchanged() {
        let h = harness();
        let created = seed(&h, "Desk").await;
        h.repo.inner.set_unavailable(true);

        let err = h.service.delete_product(created.product_id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Storage(StorageError::Unavailable(_))));

        let err = h.service.get_products().await.unwrap_err();
        assert!(matches!(err, ServiceError::Storage(StorageError::Unavailable(_))));
        assert!(h.publisher.is_empty());
    }

    #[tokio::test]
    async fn custom_validators_are_honored() {
        let repo = Arc::new(CountingRepository::default());
        let publisher = Arc::new(RecordingPublisher::<ProductMessage>::new());
        let no_lamps = |r: &ProductAddRequest| {
            let mut outcome = catalog_core::ValidationOutcome::new();
            outcome.ensure(r.product_name != "Lamp", "ProductName", "no lamps");
            outcome
        };
        let service = ProductsService::with_validators(
            repo.clone(),
            publisher,
            Arc::new(no_lamps),
            Arc::new(ProductUpdateRequestValidator),
        );

        let err = service.add_product(Some(add_request("Lamp"))).await.unwrap_err();
        assert_eq!(err.to_string(), "validation failed: no lamps");
        assert_eq!(repo.mutations(), 0);
    }

    #[tokio::test]
    async fn reads_map_through_conditions() {
        let h = harness();
        seed(&h, "Red Lamp").await;
        seed(&h, "Blue Chair").await;

        let all = h.service.get_products().await.unwrap();
        assert_eq!(all.len(), 2);

        let lamps = h
            .service
            .get_products_by_condition(&ProductCondition::search("lamp"))
            .await
            .unwrap();
        assert_eq!(lamps.len(), 1);
        assert_eq!(lamps[0].product_name, "Red Lamp");

        let expensive = h
            .service
            .get_products_by_condition(&ProductCondition::predicate(|p| {
                p.unit_price.is_some_and(|price| price > 100.0)
            }))
            .await
            .unwrap();
        assert!(expensive.is_empty());
        assert!(h.publisher.is_empty());
    }
}
